//! Roster document API endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use super::{current_revision, error, success, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{RevisionInfo, Role, RosterSnapshot, RosterState};
use crate::totals::Totals;
use crate::view::{self, TableView};
use crate::AppState;

fn missing() -> AppError {
    AppError::NotFound("Roster document does not exist".to_string())
}

/// GET /api/roster - Get the roster document.
pub async fn get_roster(State(state): State<AppState>) -> ApiResult<RosterSnapshot> {
    let revision_id = current_revision(&state.repo).await;

    match state.repo.get_document().await {
        Ok(Some(snapshot)) => success(snapshot, revision_id),
        Ok(None) => error(missing(), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/roster - Overwrite the roster document.
pub async fn put_roster(
    State(state): State<AppState>,
    Json(snapshot): Json<RosterSnapshot>,
) -> ApiResult<RosterSnapshot> {
    let revision_id = current_revision(&state.repo).await;

    if let Err(e) = snapshot.validate() {
        tracing::warn!(error = %e, "Rejected roster document");
        return error(e, revision_id);
    }

    match state.repo.put_document(&snapshot).await {
        Ok(new_revision) => {
            tracing::info!(
                revision_id = new_revision,
                squads = snapshot.squads_data.len(),
                "Roster document replaced"
            );
            success(snapshot, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/roster/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info =
        state
            .repo
            .get_revision_info()
            .await
            .map_err(|e| crate::errors::AppErrorWithRevision {
                error: e,
                revision_id: 0,
            })?;

    success(revision_info.clone(), revision_info.revision_id)
}

/// GET /api/roster/totals - Global kill/death/mission totals.
pub async fn get_totals(State(state): State<AppState>) -> ApiResult<Totals> {
    let revision_id = current_revision(&state.repo).await;

    match state.repo.get_document().await {
        Ok(Some(snapshot)) => success(RosterState::from_snapshot(snapshot).totals(), revision_id),
        Ok(None) => error(missing(), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/roster/view - Table rows; editable only for the admin key.
pub async fn get_view(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<TableView> {
    let revision_id = current_revision(&state.repo).await;

    let role = match auth::resolve_role(&headers, state.config.api_psk.as_deref()) {
        Ok(role) => role,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.get_document().await {
        Ok(Some(snapshot)) => {
            let roster = RosterState::from_snapshot(snapshot);
            success(view::render(&roster, role == Role::Admin), revision_id)
        }
        Ok(None) => error(missing(), revision_id),
        Err(e) => error(e, revision_id),
    }
}
