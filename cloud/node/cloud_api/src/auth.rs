use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use fogseal_basic_types::roles::ApiUser;

use crate::{error::ApiError, AppState};

/// Resolves the `X-API-Key` header to an [`ApiUser`] and stashes it in
/// the request extensions. Role checks happen per handler, because the
/// producer role implies the verifier one.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".into()))?;

    let user = state
        .api_users
        .get(api_key)
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Unknown API key".into()))?;

    tracing::debug!("Authenticated {} ({:?})", user.name, user.role);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn require_writer(user: &ApiUser) -> Result<(), ApiError> {
    if !user.role.can_write() {
        return Err(ApiError::Forbidden(format!(
            "{} cannot use write endpoints",
            user.name
        )));
    }
    Ok(())
}

pub fn require_verifier(user: &ApiUser) -> Result<(), ApiError> {
    if !user.role.can_verify() {
        return Err(ApiError::Forbidden(format!(
            "{} cannot use verification endpoints",
            user.name
        )));
    }
    Ok(())
}
