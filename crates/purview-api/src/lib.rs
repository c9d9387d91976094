//! JSON REST API for Purview.
//!
//! Exposes an axum [`Router`] backed by any
//! [`purview_core::directory::UserDirectory`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", purview_api::api_router(state))
//! ```

pub mod check;
pub mod error;
pub mod groups;
pub mod preview;
pub mod users;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post, put},
};
use purview_core::directory::{DEFAULT_SAMPLE_LIMIT, UserDirectory};

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Handler knobs that are policy, not data.
#[derive(Debug, Clone)]
pub struct ApiOptions {
  /// Wall-clock budget for one audience preview. Rules over large
  /// populations are cut off rather than left to hold the connection.
  pub preview_timeout: Duration,
  /// Sample bound applied when a preview request does not choose one.
  pub sample_limit:    usize,
}

impl Default for ApiOptions {
  fn default() -> Self {
    Self {
      preview_timeout: Duration::from_secs(2),
      sample_limit:    DEFAULT_SAMPLE_LIMIT,
    }
  }
}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct ApiState<D: UserDirectory> {
  pub directory: Arc<D>,
  pub options:   ApiOptions,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<D>(state: ApiState<D>) -> Router<()>
where
  D: UserDirectory + Clone + 'static,
{
  Router::new()
    // Rule engine
    .route("/preview", post(preview::handler::<D>))
    .route("/check", post(check::handler::<D>))
    // Users
    .route("/users", get(users::list::<D>).post(users::sync::<D>))
    .route("/users/{id}", get(users::get_one::<D>))
    .route("/users/{id}/attributes", get(users::attributes::<D>))
    // Groups
    .route("/groups", get(groups::list::<D>).post(groups::sync::<D>))
    .route("/groups/{id}", get(groups::get_one::<D>))
    .route("/groups/{id}/members", get(groups::members::<D>))
    .route(
      "/groups/{id}/members/{user_id}",
      put(groups::add_member::<D>).delete(groups::remove_member::<D>),
    )
    .with_state(state)
}
