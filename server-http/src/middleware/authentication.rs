use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use coinwatch::auth::AuthError;
use tracing::debug;

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    // Authorization: Bearer <token>
    let mut parts = auth_header.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Some(token),
        _ => None,
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer realm=\"coinwatch\"")],
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

/// Authentication middleware: resolves the bearer token through the auth
/// guard and attaches the `AuthenticatedUser` to request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = extract_bearer_token(auth_header)
        .ok_or_else(|| unauthorized("Invalid Authorization header format. Expected: Bearer <token>"))?;

    let user = match state.auth_guard.resolve(token).await {
        Ok(user) => user,
        Err(AuthError::Storage(e)) => {
            tracing::error!("Session lookup failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Authentication unavailable")),
            )
                .into_response());
        }
        Err(e) => {
            debug!("Rejected bearer token: {}", e);
            return Err(unauthorized("Invalid or expired token"));
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
