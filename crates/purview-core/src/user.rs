//! Subject types — the user-directory side of rule evaluation.
//!
//! [`UserAttributes`] is the read-only snapshot a rule is evaluated against.
//! The richer records exist for directory sync and preview sampling; the
//! rule engine itself never mutates them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rule::RuleField;

// ─── Evaluation snapshot ─────────────────────────────────────────────────────

/// A read-only attribute snapshot for one subject, as supplied by the user
/// directory. Every attribute is optional; evaluation resolves absent
/// values per operator rather than erroring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
  pub department:         Option<String>,
  pub location:           Option<String>,
  pub job_title:          Option<String>,
  pub role:               Option<String>,
  pub preferred_language: Option<String>,
  /// Ids of every group the subject belongs to.
  pub group_ids:          HashSet<Uuid>,
}

impl UserAttributes {
  /// Resolve the string value a condition on `field` compares against.
  ///
  /// `Group` has no string value of its own; the membership operators
  /// consult [`UserAttributes::group_ids`] instead.
  pub fn attribute(&self, field: RuleField) -> Option<&str> {
    match field {
      RuleField::Department => self.department.as_deref(),
      RuleField::Location => self.location.as_deref(),
      RuleField::JobTitle => self.job_title.as_deref(),
      RuleField::Role => self.role.as_deref(),
      RuleField::PreferredLanguage => self.preferred_language.as_deref(),
      RuleField::Group => None,
    }
  }
}

// ─── Directory records ───────────────────────────────────────────────────────

/// Input to [`crate::directory::UserDirectory::upsert_user`].
/// `updated_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:            Uuid,
  pub display_name:       String,
  pub email:              Option<String>,
  pub department:         Option<String>,
  pub location:           Option<String>,
  pub job_title:          Option<String>,
  pub role:               Option<String>,
  pub preferred_language: Option<String>,
  /// Deactivated users stay in the directory but never count toward any
  /// audience. Sync payloads may omit this; it defaults to active.
  #[serde(default = "default_active")]
  pub active:             bool,
}

fn default_active() -> bool {
  true
}

impl UserProfile {
  /// Convenience constructor with every attribute unset and `active` true.
  pub fn new(user_id: Uuid, display_name: impl Into<String>) -> Self {
    Self {
      user_id,
      display_name: display_name.into(),
      email: None,
      department: None,
      location: None,
      job_title: None,
      role: None,
      preferred_language: None,
      active: true,
    }
  }
}

/// A persisted directory row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
  pub user_id:            Uuid,
  pub display_name:       String,
  pub email:              Option<String>,
  pub department:         Option<String>,
  pub location:           Option<String>,
  pub job_title:          Option<String>,
  pub role:               Option<String>,
  pub preferred_language: Option<String>,
  pub active:             bool,
  /// Server-assigned timestamp of the last upsert.
  pub updated_at:         DateTime<Utc>,
}

impl UserRecord {
  /// Assemble the evaluation snapshot for this row together with the
  /// subject's group memberships.
  pub fn into_attributes(self, group_ids: HashSet<Uuid>) -> UserAttributes {
    UserAttributes {
      department: self.department,
      location: self.location,
      job_title: self.job_title,
      role: self.role,
      preferred_language: self.preferred_language,
      group_ids,
    }
  }
}

/// The abbreviated row returned in a preview sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub user_id:      Uuid,
  pub display_name: String,
  pub email:        Option<String>,
  pub department:   Option<String>,
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// A targeting group. Membership lives in the directory's membership
/// relation, not on the group itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:   Uuid,
  pub name:       String,
  /// Server-assigned on first upsert; preserved by later upserts.
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::directory::UserDirectory::upsert_group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
  pub group_id: Uuid,
  pub name:     String,
}
