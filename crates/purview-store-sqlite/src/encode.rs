//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use purview_core::user::{Group, UserRecord, UserSummary};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:            String,
  pub display_name:       String,
  pub email:              Option<String>,
  pub department:         Option<String>,
  pub location:           Option<String>,
  pub job_title:          Option<String>,
  pub role:               Option<String>,
  pub preferred_language: Option<String>,
  pub active:             bool,
  pub updated_at:         String,
}

impl RawUser {
  pub fn into_record(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:            decode_uuid(&self.user_id)?,
      display_name:       self.display_name,
      email:              self.email,
      department:         self.department,
      location:           self.location,
      job_title:          self.job_title,
      role:               self.role,
      preferred_language: self.preferred_language,
      active:             self.active,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `groups` row.
pub struct RawGroup {
  pub group_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawGroup {
  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:   decode_uuid(&self.group_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings for the abbreviated preview-sample projection.
pub struct RawUserSummary {
  pub user_id:      String,
  pub display_name: String,
  pub email:        Option<String>,
  pub department:   Option<String>,
}

impl RawUserSummary {
  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(UserSummary {
      user_id:      decode_uuid(&self.user_id)?,
      display_name: self.display_name,
      email:        self.email,
      department:   self.department,
    })
  }
}
