//! Per-request session context.
//!
//! Authentication happens upstream; the auth proxy forwards the signed-in user
//! as trusted headers. No header (or a blank one) means an anonymous session.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::Serialize;

use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        Self {
            user: header(USER_ID_HEADER).map(|id| SessionUser {
                id,
                name: header(USER_NAME_HEADER),
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session::from_headers(&parts.headers))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<SessionUser>,
    pub ai_available: bool,
    pub cache_backend: &'static str,
    pub asset_backend: Option<&'static str>,
}

/// GET /api/v1/session
pub async fn handle_session(State(state): State<AppState>, session: Session) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: session.is_authenticated(),
        user: session.user,
        ai_available: state.pipeline.ai_available(),
        cache_backend: state.cache.backend_name(),
        asset_backend: state.assets.backend_name(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_no_headers_is_anonymous() {
        let session = Session::from_headers(&HeaderMap::new());
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_user_headers_authenticate() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" user-42 "));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("jane"));
        let session = Session::from_headers(&headers);
        assert!(session.is_authenticated());
        let user = session.user.unwrap();
        assert_eq!(user.id, "user-42");
        assert_eq!(user.name.as_deref(), Some("jane"));
    }

    #[test]
    fn test_blank_user_id_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("jane"));
        assert!(!Session::from_headers(&headers).is_authenticated());
    }
}
