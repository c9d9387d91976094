//! Handlers for `/groups` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/groups` | All groups, name order |
//! | `POST`   | `/groups` | Body: `{"group_id":"...","name":"..."}`; upserts |
//! | `GET`    | `/groups/{id}` | 404 if not found |
//! | `GET`    | `/groups/{id}/members` | Member ids |
//! | `PUT`    | `/groups/{id}/members/{user_id}` | Idempotent add |
//! | `DELETE` | `/groups/{id}/members/{user_id}` | Idempotent remove |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use purview_core::{
  directory::UserDirectory,
  user::{Group, NewGroup},
};
use serde_json::json;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Resolve a group or answer 404. Membership routes go through this so an
/// unknown group id never surfaces as a 500.
async fn require_group<D>(state: &ApiState<D>, id: Uuid) -> Result<Group, ApiError>
where
  D: UserDirectory,
{
  state
    .directory
    .get_group(id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /groups`
pub async fn list<D>(
  State(state): State<ApiState<D>>,
) -> Result<Json<Vec<Group>>, ApiError>
where
  D: UserDirectory,
{
  let groups = state
    .directory
    .list_groups()
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok(Json(groups))
}

// ─── Sync ────────────────────────────────────────────────────────────────────

/// `POST /groups` — upsert one group from the platform sync feed.
pub async fn sync<D>(
  State(state): State<ApiState<D>>,
  Json(group): Json<NewGroup>,
) -> Result<impl IntoResponse, ApiError>
where
  D: UserDirectory,
{
  let group = state
    .directory
    .upsert_group(group)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(group)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /groups/{id}`
pub async fn get_one<D>(
  State(state): State<ApiState<D>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError>
where
  D: UserDirectory,
{
  let group = require_group(&state, id).await?;
  Ok(Json(group))
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// `GET /groups/{id}/members`
pub async fn members<D>(
  State(state): State<ApiState<D>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Uuid>>, ApiError>
where
  D: UserDirectory,
{
  let group = require_group(&state, id).await?;
  let members = state
    .directory
    .group_members(group.group_id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok(Json(members))
}

/// `PUT /groups/{id}/members/{user_id}` — answers `{"added":false}` when the
/// membership already existed.
pub async fn add_member<D>(
  State(state): State<ApiState<D>>,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  D: UserDirectory,
{
  require_group(&state, id).await?;
  state
    .directory
    .get_user(user_id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

  let added = state
    .directory
    .add_member(id, user_id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok(Json(json!({ "added": added })))
}

/// `DELETE /groups/{id}/members/{user_id}` — answers `{"removed":false}` when
/// there was nothing to remove.
pub async fn remove_member<D>(
  State(state): State<ApiState<D>>,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  D: UserDirectory,
{
  require_group(&state, id).await?;
  let removed = state
    .directory
    .remove_member(id, user_id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok(Json(json!({ "removed": removed })))
}
