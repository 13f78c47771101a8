use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use crate::models::User;
use crate::AppState;

/// Pulls the opaque session token from either the `session` cookie
/// (browsers) or the Authorization header (API clients and tests).
pub(crate) fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// The resolved principal. Carries the whole user row because the access
/// evaluator needs role, tenant and approval state on every request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

type Rejection = (StatusCode, axum::Json<serde_json::Value>);

fn unauthorized(message: &str) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({ "error": message })),
    )
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = Rejection;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = token_from_headers(&parts.headers);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                unauthorized("Missing authentication: no session cookie or Authorization header")
            })?;

            let user_id = state
                .sessions
                .get(&token)
                .await
                .ok_or_else(|| unauthorized("Session expired or unknown"))?;

            let user = state
                .store
                .user(user_id)
                .await
                .ok_or_else(|| unauthorized("Session user no longer exists"))?;

            // Approval gate: rejection or deactivation cuts off live sessions
            // immediately, not just future logins.
            if !user.can_log_in() {
                tracing::debug!(user_id = %user.id, "request from unapproved or inactive account");
                return Err((
                    StatusCode::FORBIDDEN,
                    axum::Json(json!({ "error": "Account is not approved or inactive" })),
                ));
            }

            Ok(AuthenticatedUser { user })
        }
    }
}
