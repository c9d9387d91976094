//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Optional `?active=true` |
//! | `POST` | `/users` | Body: a full user profile; upserts |
//! | `GET`  | `/users/{id}` | 404 if not found |
//! | `GET`  | `/users/{id}/attributes` | Evaluation snapshot, memberships included |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use purview_core::{
  directory::UserDirectory,
  user::{UserAttributes, UserProfile, UserRecord},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub active: Option<bool>,
}

/// `GET /users[?active=true]`
pub async fn list<D>(
  State(state): State<ApiState<D>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserRecord>>, ApiError>
where
  D: UserDirectory,
{
  let users = state
    .directory
    .list_users(params.active.unwrap_or(false))
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok(Json(users))
}

// ─── Sync ────────────────────────────────────────────────────────────────────

/// `POST /users` — upsert one profile from the platform sync feed.
pub async fn sync<D>(
  State(state): State<ApiState<D>>,
  Json(profile): Json<UserProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  D: UserDirectory,
{
  let record = state
    .directory
    .upsert_user(profile)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<D>(
  State(state): State<ApiState<D>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserRecord>, ApiError>
where
  D: UserDirectory,
{
  let user = state
    .directory
    .get_user(id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// `GET /users/{id}/attributes` — the snapshot rules evaluate against.
pub async fn attributes<D>(
  State(state): State<ApiState<D>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserAttributes>, ApiError>
where
  D: UserDirectory,
{
  let attrs = state
    .directory
    .snapshot(id)
    .await
    .map_err(|e| ApiError::Directory(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(attrs))
}
