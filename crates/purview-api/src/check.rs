//! Handler for `POST /check` — visibility of stored rule text to one user.

use axum::{Json, extract::State};
use purview_core::{codec, directory::UserDirectory, eval::is_visible};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
  pub user_id:   Uuid,
  /// The rule exactly as persisted alongside the content row. Absent,
  /// blank, or unparsable text all read as visible to everyone.
  pub rule_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
  pub visible: bool,
}

/// `POST /check` — body: `{"user_id":"...","rule_text":"{\"type\":\"all\"}"}`
pub async fn handler<D>(
  State(state): State<ApiState<D>>,
  Json(body): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError>
where
  D: UserDirectory,
{
  let rule = codec::parse(body.rule_text.as_deref());

  let attrs = state
    .directory
    .snapshot(body.user_id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {} not found", body.user_id)))?;

  Ok(Json(CheckResponse { visible: is_visible(Some(&rule), &attrs) }))
}
