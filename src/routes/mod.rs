/// Router Module Index
///
/// Splits the gateway's routes by who answers them. Both groups sit behind the route guard,
/// which is applied once around the assembled router.

/// Endpoints the gateway answers itself (health, session status).
pub mod public;

/// The page fallback: everything else is forwarded to the page renderer.
pub mod pages;
