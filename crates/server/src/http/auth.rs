//! Optional HTTP Basic authentication.
//!
//! Credentials are configured as a single `user:password` string. When
//! set, every request passes through [`require_basic_auth`]; anything
//! without a matching `Authorization` header gets a 401 challenge.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::http::AppState;

/// A username/password pair for Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse a `user:password` string. Both parts must be non-empty;
    /// the password keeps any further colons.
    pub fn parse(raw: &str) -> Option<Self> {
        let (username, password) = raw.split_once(':')?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Middleware guarding all routes when credentials are configured.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = &state.credentials else {
        return next.run(request).await;
    };

    if let Some(provided) = decode_basic_header(request.headers()) {
        if provided == *expected {
            return next.run(request).await;
        }
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"webdir\"")],
    )
        .into_response()
}

fn decode_basic_header(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        assert_eq!(
            BasicCredentials::parse("alice:secret"),
            Some(BasicCredentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_keeps_colons_in_password() {
        let creds = BasicCredentials::parse("alice:a:b:c").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_parse_rejects_malformed_credentials() {
        assert_eq!(BasicCredentials::parse("alice"), None);
        assert_eq!(BasicCredentials::parse(":secret"), None);
        assert_eq!(BasicCredentials::parse("alice:"), None);
        assert_eq!(BasicCredentials::parse(""), None);
    }

    #[test]
    fn test_decode_basic_header() {
        let mut headers = HeaderMap::new();
        let token = BASE64_STANDARD.encode("alice:secret");
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {token}").parse().unwrap(),
        );

        let creds = decode_basic_header(&headers).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_decode_rejects_missing_header() {
        assert_eq!(decode_basic_header(&HeaderMap::new()), None);
    }

    #[test]
    fn test_decode_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(decode_basic_header(&headers), None);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic !!!".parse().unwrap());
        assert_eq!(decode_basic_header(&headers), None);
    }

    #[test]
    fn test_decode_rejects_token_without_colon() {
        let mut headers = HeaderMap::new();
        let token = BASE64_STANDARD.encode("no-colon-here");
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {token}").parse().unwrap(),
        );
        assert_eq!(decode_basic_header(&headers), None);
    }
}
