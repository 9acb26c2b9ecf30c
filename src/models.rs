use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// SessionStatus
///
/// What the gateway can see of the current browser session, read straight from its cookies.
/// The navbar uses it to greet the user and to decide whether to show the admin link.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SessionStatus {
    // A `token` cookie is present.
    pub authenticated: bool,
    // Display name from the `username` cookie. Unverified.
    pub username: Option<String>,
    // `isAdmin=true` was sent. Unverified.
    pub is_admin: bool,
    // Expiry from the token's `exp` claim, when the token is a JWT carrying one.
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}
