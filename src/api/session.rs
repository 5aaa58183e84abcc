//! Session probe endpoint.

use axum::{extract::State, http::HeaderMap};

use super::{current_revision, error, success, ApiResult};
use crate::auth;
use crate::models::SessionInfo;
use crate::AppState;

/// GET /api/session - Which role the presented key grants.
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SessionInfo> {
    let revision_id = current_revision(&state.repo).await;

    match auth::resolve_role(&headers, state.config.api_psk.as_deref()) {
        Ok(role) => success(SessionInfo { role }, revision_id),
        Err(e) => {
            tracing::warn!("Session probe with an invalid key");
            error(e, revision_id)
        }
    }
}
