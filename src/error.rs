//! Error types for the page pass-through

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Upstream page renderer unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Simulated page failure: {0}")]
    Mock(String),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PageError::RequestBody(_) => StatusCode::BAD_REQUEST,
            PageError::Upstream(_) | PageError::Mock(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "page pass-through failed");
        (self.status(), self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PageError::BodyTooLarge(16).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            PageError::RequestBody("connection reset".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PageError::Mock("offline".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
