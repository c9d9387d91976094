//! The `UserDirectory` trait and the preview aggregate.
//!
//! The trait is implemented by storage backends (e.g.
//! `purview-store-sqlite`). Higher layers depend on this abstraction, not
//! on any concrete backend. The rule engine only ever reads through it;
//! the write methods exist for platform sync (HR / identity import).

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  rule::VisibilityRule,
  user::{Group, NewGroup, UserAttributes, UserProfile, UserRecord, UserSummary},
};

// ─── Preview aggregate ───────────────────────────────────────────────────────

/// Sample bound applied when the caller does not choose one.
pub const DEFAULT_SAMPLE_LIMIT: usize = 20;

/// The audience estimate returned by [`UserDirectory::preview`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudiencePreview {
  /// Number of active users the rule matches.
  pub total_count: u64,
  /// Bounded sample of matching users, in display-name order.
  pub sample:      Vec<UserSummary>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Purview user-directory backend.
///
/// Preview is computed inside the backend as a query-level predicate —
/// never by materialising the whole population and running the in-memory
/// evaluator row by row. Populations reach tens of thousands of users and
/// preview backs an interactive authoring surface.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert or fully replace a user row. `updated_at` is set by the store.
  fn upsert_user(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// List users, optionally restricted to active ones.
  fn list_users(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Insert a group or rename an existing one. `created_at` is set by the
  /// store on first insert and preserved afterwards.
  fn upsert_group(
    &self,
    group: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  /// Retrieve a group by id. Returns `None` if not found.
  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// List all groups.
  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Add a user to a group. Returns `false` if the membership already
  /// existed. Errors if the group or the user is unknown.
  fn add_member(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove a user from a group. Returns `false` if there was no such
  /// membership. Errors if the group is unknown.
  fn remove_member(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Ids of every user in a group. Errors if the group is unknown.
  fn group_members(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Evaluation support ────────────────────────────────────────────────

  /// The attribute snapshot for one user, memberships included. Returns
  /// `None` if the user is unknown.
  fn snapshot(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserAttributes>, Self::Error>> + Send + '_;

  /// Count the active users `rule` matches and return a bounded sample of
  /// them. The predicate is pushed down to the backing query.
  fn preview<'a>(
    &'a self,
    rule: &'a VisibilityRule,
    sample_limit: usize,
  ) -> impl Future<Output = Result<AudiencePreview, Self::Error>> + Send + 'a;
}
