//! HTTP server assembly for Purview.
//!
//! Exposes [`ServerConfig`] and [`app`], the fully-wired router; the binary
//! in `main.rs` is a thin shell around them.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use purview_api::{ApiOptions, ApiState, api_router};
use purview_core::directory::{DEFAULT_SAMPLE_LIMIT, UserDirectory};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`. Every
/// field has a default, so a missing file yields a runnable local server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default = "default_preview_timeout_ms")]
  pub preview_timeout_ms: u64,
  #[serde(default = "default_sample_limit")]
  pub sample_limit:       usize,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8087
}

fn default_store_path() -> PathBuf {
  PathBuf::from("purview.db")
}

fn default_preview_timeout_ms() -> u64 {
  2_000
}

fn default_sample_limit() -> usize {
  DEFAULT_SAMPLE_LIMIT
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               default_host(),
      port:               default_port(),
      store_path:         default_store_path(),
      preview_timeout_ms: default_preview_timeout_ms(),
      sample_limit:       default_sample_limit(),
    }
  }
}

impl ServerConfig {
  /// The option block handed to the API layer.
  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      preview_timeout: Duration::from_millis(self.preview_timeout_ms),
      sample_limit:    self.sample_limit,
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// Assemble the HTTP application: the JSON API nested under `/api`, with
/// request tracing.
pub fn app<D>(directory: D, options: ApiOptions) -> Router
where
  D: UserDirectory + Clone + 'static,
{
  let state = ApiState { directory: Arc::new(directory), options };
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
