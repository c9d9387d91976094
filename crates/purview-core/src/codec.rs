//! Parsing and serialization of the stored rule text.
//!
//! Rules persist as compact JSON in a text column owned by the content row.
//! Parsing is fail-soft by policy: an absent, blank, or unparsable value is
//! read as [`VisibilityRule::EVERYONE`] rather than an error, so a storage
//! glitch can never hide content. The inverse risk — corruption silently
//! widening an audience — is accepted, and logged at the single point where
//! it can happen.

use crate::{Result, rule::VisibilityRule};

impl VisibilityRule {
  /// The fail-soft default: an absent, blank, or unparsable stored rule
  /// resolves to this.
  pub const EVERYONE: Self = Self::All;
}

/// Parse a stored rule value. Never fails; see the module docs.
pub fn parse(stored: Option<&str>) -> VisibilityRule {
  let Some(text) = stored else {
    return VisibilityRule::EVERYONE;
  };
  if text.trim().is_empty() {
    return VisibilityRule::EVERYONE;
  }
  match serde_json::from_str(text) {
    Ok(rule) => rule,
    Err(err) => {
      tracing::warn!(%err, "unparsable visibility rule; reading as visible to everyone");
      VisibilityRule::EVERYONE
    }
  }
}

/// Serialize a rule to its compact stored form. Absent optional fields are
/// omitted entirely rather than written as `null`.
pub fn serialize(rule: &VisibilityRule) -> Result<String> {
  Ok(serde_json::to_string(rule)?)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
