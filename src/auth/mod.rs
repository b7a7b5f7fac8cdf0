//! Authentication core: credential store, token service, brand guard and the
//! bearer-extraction middleware applied to every protected route.

pub mod credentials;
pub mod guard;
pub mod token;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::AppError;
use crate::AppState;
use token::TokenError;

/// Middleware: validates `Authorization: Bearer <token>` and attaches the
/// resulting [`token::AuthClaims`] to the request as an extension.
///
/// Missing header, malformed token, bad signature and expiry all surface as
/// the same 401 — no failure detail leaks to the caller.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::InvalidToken(TokenError::Malformed))?;

    let claims = state.tokens.validate(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
