use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};

use crate::session::{self, RequestCookies};

/// Where an expired session is sent. The logout page shows the "Session Expired" notice.
pub const SESSION_EXPIRED_REDIRECT: &str = "/logout?message=session-expired";

/// AdminGate
///
/// Restricts a single path to browsers carrying `isAdmin=true`; everyone else goes to `fallback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    pub path: String,
    pub fallback: String,
}

/// GuardPolicy
///
/// The paths the route guard knows about. All matching is exact on the URL path; query
/// strings never take part. The default policy is the plain four-rule guard: home requires a
/// session, login/signup bounce logged-in users home, logout scrubs the session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    pub home_path: String,
    pub login_path: String,
    pub signup_path: String,
    pub logout_path: String,
    /// Paths that, like home, redirect to login without a session.
    pub protected_paths: Vec<String>,
    pub admin_gate: Option<AdminGate>,
    /// End sessions whose JWT `exp` has passed.
    pub expire_sessions: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            home_path: "/".to_string(),
            login_path: "/login".to_string(),
            signup_path: "/signup".to_string(),
            logout_path: "/logout".to_string(),
            protected_paths: Vec::new(),
            admin_gate: None,
            expire_sessions: false,
        }
    }
}

/// GuardDecision
///
/// The outcome for one request. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Hand the request on untouched.
    Allow,
    /// Hand the request on, then remove the session cookies from whatever comes back.
    AllowAndClearSession,
    /// Answer with a temporary redirect and never reach the page.
    Redirect {
        location: String,
        clear_session: bool,
    },
}

impl GuardDecision {
    fn redirect(location: &str) -> Self {
        GuardDecision::Redirect {
            location: location.to_string(),
            clear_session: false,
        }
    }

    /// apply
    ///
    /// Decorates a pass-through response according to the decision. Only
    /// `AllowAndClearSession` changes anything.
    pub fn apply(&self, mut response: Response) -> Response {
        if *self == GuardDecision::AllowAndClearSession {
            session::clear_session(response.headers_mut());
        }
        response
    }
}

impl IntoResponse for GuardDecision {
    /// Redirects become `307 Temporary Redirect`. The pass-through variants render as an
    /// empty 200 with their cookie edits applied; the middleware never takes that path.
    fn into_response(self) -> Response {
        match self {
            GuardDecision::Redirect {
                location,
                clear_session,
            } => {
                let mut response = Redirect::temporary(&location).into_response();
                if clear_session {
                    session::clear_session(response.headers_mut());
                }
                response
            }
            allow => allow.apply(().into_response()),
        }
    }
}

/// RouteGuard
///
/// Pre-navigation check applied to every incoming request.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    policy: GuardPolicy,
}

impl RouteGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    fn is_protected(&self, path: &str) -> bool {
        path == self.policy.home_path || self.policy.protected_paths.iter().any(|p| p == path)
    }

    /// decide
    ///
    /// Pure decision over the request path, its cookies and the current time. Rules run in
    /// order: session expiry, admin gate, protected paths, login/signup, logout.
    pub fn decide(&self, path: &str, cookies: &RequestCookies, now: DateTime<Utc>) -> GuardDecision {
        if self.policy.expire_sessions {
            let expired = cookies
                .token()
                .and_then(session::token_expiry)
                .is_some_and(|exp| session::is_expired(exp, now));
            if expired {
                return GuardDecision::Redirect {
                    location: SESSION_EXPIRED_REDIRECT.to_string(),
                    clear_session: true,
                };
            }
        }

        if let Some(gate) = &self.policy.admin_gate {
            if path == gate.path && !cookies.is_admin() {
                return GuardDecision::redirect(&gate.fallback);
            }
        }

        if self.is_protected(path) && !cookies.has_session() {
            return GuardDecision::redirect(&self.policy.login_path);
        }

        if (path == self.policy.login_path || path == self.policy.signup_path)
            && cookies.has_session()
        {
            return GuardDecision::redirect(&self.policy.home_path);
        }

        if path == self.policy.logout_path {
            return GuardDecision::AllowAndClearSession;
        }

        GuardDecision::Allow
    }
}

/// route_guard
///
/// Middleware wrapping every route (fallback included). Redirects short-circuit; everything
/// else reaches the inner service and has the decision applied to its response.
pub async fn route_guard(
    State(guard): State<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = RequestCookies::from_headers(request.headers());
    let decision = guard.decide(request.uri().path(), &cookies, Utc::now());

    tracing::debug!(path = %request.uri().path(), ?decision, "route guard");

    match decision {
        GuardDecision::Redirect { .. } => decision.into_response(),
        _ => {
            let response = next.run(request).await;
            decision.apply(response)
        }
    }
}
