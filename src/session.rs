use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

/// Cookie holding the opaque session token. Its presence alone means "logged in".
pub const TOKEN_COOKIE: &str = "token";
/// Cookie holding the display name shown in the navbar.
pub const USERNAME_COOKIE: &str = "username";
/// Cookie set to the literal `true` for admin sessions.
pub const ADMIN_COOKIE: &str = "isAdmin";

/// Cookies removed whenever a browser session ends (logout or expiry).
pub const SESSION_COOKIES: [&str; 2] = [TOKEN_COOKIE, USERNAME_COOKIE];

/// RequestCookies
///
/// The cookie set sent by the browser, parsed from every `Cookie` header on the request.
/// Nothing here is verified: values are exactly what the client sent.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    values: HashMap<String, String>,
}

impl RequestCookies {
    /// from_headers
    ///
    /// Splits `name=value; name2=value2` pairs. Pairs without `=` are skipped and the first
    /// occurrence of a name wins, matching how browsers order duplicate cookies. Non-ASCII
    /// bytes are decoded lossily so they only garble their own pair.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = HashMap::new();

        for cookie_header in headers.get_all(header::COOKIE) {
            let cookie_str = String::from_utf8_lossy(cookie_header.as_bytes());
            for pair in cookie_str.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    values
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().to_string());
                }
            }
        }

        Self { values }
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether a session token cookie is present. Emptiness is not checked.
    pub fn has_session(&self) -> bool {
        self.has(TOKEN_COOKIE)
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_COOKIE)
    }

    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME_COOKIE)
    }

    pub fn is_admin(&self) -> bool {
        self.get(ADMIN_COOKIE) == Some("true")
    }
}

/// removal_cookie
///
/// Builds a `Set-Cookie` value that makes the browser drop `name` immediately.
pub fn removal_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
    ))
    .ok()
}

/// clear_session
///
/// Appends removals for every session cookie to an outgoing header map.
pub fn clear_session(headers: &mut HeaderMap) {
    for name in SESSION_COOKIES {
        if let Some(value) = removal_cookie(name) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}

/// SessionClaims
///
/// The only claim the gateway reads from a session token. `exp` is a NumericDate and may
/// legally carry a fractional part.
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    pub exp: Option<f64>,
}

/// token_expiry
///
/// Reads the `exp` claim of a JWT session token **without verifying its signature**. The
/// backend that issued the token is the authority; the gateway only uses the claim to end
/// stale browser sessions early. Opaque (non-JWT) tokens and tokens without `exp` yield `None`.
pub fn token_expiry(token: &str) -> Option<f64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.exp)
}

/// Whether `exp` lies strictly before `now`.
pub fn is_expired(exp: f64, now: DateTime<Utc>) -> bool {
    exp < now.timestamp_millis() as f64 / 1000.0
}

/// Converts a NumericDate into a timestamp, dropping sub-second precision.
pub fn expiry_timestamp(exp: f64) -> Option<DateTime<Utc>> {
    if !exp.is_finite() {
        return None;
    }
    DateTime::from_timestamp(exp.trunc() as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
    }

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_parse_multiple_pairs() {
        let cookies = RequestCookies::from_headers(&headers_with(&["token=abc; username=ana"]));
        assert_eq!(cookies.token(), Some("abc"));
        assert_eq!(cookies.username(), Some("ana"));
        assert!(cookies.has_session());
        assert!(!cookies.is_admin());
    }

    #[test]
    fn test_parse_across_headers_first_wins() {
        let cookies =
            RequestCookies::from_headers(&headers_with(&["token=first", "token=second; isAdmin=true"]));
        assert_eq!(cookies.token(), Some("first"));
        assert!(cookies.is_admin());
    }

    #[test]
    fn test_malformed_pairs_ignored() {
        let cookies = RequestCookies::from_headers(&headers_with(&["garbage; =nameless; username="]));
        assert!(!cookies.has_session());
        assert!(!cookies.has("garbage"));
        // An empty value still counts as present.
        assert_eq!(cookies.username(), Some(""));
    }

    #[test]
    fn test_non_ascii_value_keeps_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes("token=abc; username=José".as_bytes()).unwrap(),
        );
        let cookies = RequestCookies::from_headers(&headers);
        assert!(cookies.has_session());
        assert_eq!(cookies.token(), Some("abc"));
        assert_eq!(cookies.username(), Some("José"));

        // Invalid UTF-8 only garbles its own pair.
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes(b"tracker=\xff\xfe; token=abc").unwrap(),
        );
        let cookies = RequestCookies::from_headers(&headers);
        assert_eq!(cookies.token(), Some("abc"));
        assert!(cookies.has("tracker"));
    }

    #[test]
    fn test_admin_flag_requires_literal_true() {
        let cookies = RequestCookies::from_headers(&headers_with(&["isAdmin=TRUE"]));
        assert!(!cookies.is_admin());
    }

    #[test]
    fn test_removal_cookie_format() {
        let value = removal_cookie(TOKEN_COOKIE).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Path=/"));
    }

    #[test]
    fn test_clear_session_appends_both() {
        let mut headers = HeaderMap::new();
        clear_session(&mut headers);
        let set: Vec<_> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set[0].starts_with("token="));
        assert!(set[1].starts_with("username="));
    }

    #[test]
    fn test_token_expiry_reads_unverified_jwt() {
        let claims = TestClaims {
            sub: "42".to_string(),
            exp: 1_700_000_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-backend-secret"),
        )
        .unwrap();

        assert_eq!(token_expiry(&token), Some(1_700_000_000.0));
    }

    #[test]
    fn test_token_expiry_opaque_token() {
        assert_eq!(token_expiry("not-a-jwt"), None);
        assert_eq!(token_expiry(""), None);
    }

    #[test]
    fn test_is_expired_is_strict() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        assert!(is_expired(999.5, now));
        assert!(!is_expired(1_000.0, now));
        assert!(!is_expired(1_001.0, now));
    }
}
