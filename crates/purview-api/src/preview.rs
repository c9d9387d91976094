//! Handler for `POST /preview` — audience estimation for a draft rule.

use axum::{Json, extract::State};
use purview_core::{directory::{AudiencePreview, UserDirectory}, rule::VisibilityRule};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
  /// The draft rule, in its wire shape. Content with no rule is visible to
  /// everyone, and the authoring surface may preview that state too.
  pub rule:         Option<VisibilityRule>,
  /// Optional override of the configured sample bound.
  pub sample_limit: Option<usize>,
}

/// `POST /preview` — body: `{"rule":{"type":...},"sample_limit":10}`
///
/// Runs under the configured wall-clock budget; a rule that cannot be
/// estimated in time answers `504` instead of holding the connection.
pub async fn handler<D>(
  State(state): State<ApiState<D>>,
  Json(body): Json<PreviewRequest>,
) -> Result<Json<AudiencePreview>, ApiError>
where
  D: UserDirectory,
{
  let rule = body.rule.unwrap_or(VisibilityRule::EVERYONE);
  let limit = body.sample_limit.unwrap_or(state.options.sample_limit);

  let preview = tokio::time::timeout(
    state.options.preview_timeout,
    state.directory.preview(&rule, limit),
  )
  .await
  .map_err(|_| {
    tracing::warn!(
      timeout_ms = state.options.preview_timeout.as_millis() as u64,
      "audience preview timed out"
    );
    ApiError::Timeout("audience preview timed out".into())
  })?
  .map_err(|e| ApiError::Directory(Box::new(e)))?;

  Ok(Json(preview))
}
