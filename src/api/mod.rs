//! REST API module.
//!
//! Handlers for the roster document service. Every response carries the
//! current revision so polling clients can tell whether to refetch.

mod roster;
mod session;

pub use roster::*;
pub use session::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::Repository;
use crate::errors::{AppError, AppErrorWithRevision};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse {
        success: true,
        data,
        revision_id,
    })
}

pub fn error<T: Serialize>(error: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision { error, revision_id })
}

/// Revision to stamp on a response; 0 if the meta row cannot be read.
async fn current_revision(repo: &Repository) -> i64 {
    match repo.get_revision_id().await {
        Ok(revision_id) => revision_id,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read revision");
            0
        }
    }
}
