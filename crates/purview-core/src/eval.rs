//! Rule evaluation — the pure membership predicate.
//!
//! Evaluation is synchronous, side-effect-free, and total: a structurally
//! valid rule never errors and never panics. Missing subject data resolves
//! per operator — `false` for every positive operator, and therefore `true`
//! for the negated ones, which are implemented as exact complements.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::{
  rule::{RuleCondition, RuleLogic, RuleOperator, RuleSet, VisibilityRule},
  user::UserAttributes,
};

/// Whether `subject` may see content guarded by `rule`.
///
/// A content row with no rule at all is visible to everyone.
pub fn is_visible(rule: Option<&VisibilityRule>, subject: &UserAttributes) -> bool {
  rule.is_none_or(|r| r.allows(subject))
}

impl VisibilityRule {
  /// Evaluate this rule against one subject snapshot.
  pub fn allows(&self, subject: &UserAttributes) -> bool {
    match self {
      Self::All => true,
      Self::Groups { group_ids } => {
        group_ids.iter().any(|id| subject.group_ids.contains(id))
      }
      Self::Rules { rules } => rules.matches(subject),
    }
  }
}

impl RuleSet {
  /// Evaluate the condition list under this set's combinator.
  ///
  /// An empty list follows the boolean identities: vacuously true under
  /// `AND`, vacuously false under `OR`.
  pub fn matches(&self, subject: &UserAttributes) -> bool {
    match self.logic {
      RuleLogic::And => self.conditions.iter().all(|c| c.matches(subject)),
      RuleLogic::Or => self.conditions.iter().any(|c| c.matches(subject)),
    }
  }
}

impl RuleCondition {
  /// Evaluate one condition against the subject.
  pub fn matches(&self, subject: &UserAttributes) -> bool {
    match self.operator {
      RuleOperator::Equals => self.equals(subject),
      RuleOperator::NotEquals => !self.equals(subject),
      RuleOperator::In => self.is_in(subject),
      RuleOperator::NotIn => !self.is_in(subject),
      RuleOperator::Contains => self.contains(subject),
      RuleOperator::StartsWith => self.starts_with(subject),
      RuleOperator::Gte => self.compares(subject, Ordering::is_ge),
      RuleOperator::Lte => self.compares(subject, Ordering::is_le),
      RuleOperator::MemberOf => self.member_of(subject),
      RuleOperator::NotMemberOf => !self.member_of(subject),
    }
  }

  /// Case-sensitive equality. Absent subject value or absent operand is a
  /// non-match.
  fn equals(&self, subject: &UserAttributes) -> bool {
    match (subject.attribute(self.field), self.value.as_deref()) {
      (Some(have), Some(want)) => have == want,
      _ => false,
    }
  }

  fn is_in(&self, subject: &UserAttributes) -> bool {
    match (subject.attribute(self.field), self.values.as_deref()) {
      (Some(have), Some(wanted)) => wanted.iter().any(|w| w.as_str() == have),
      _ => false,
    }
  }

  // Case folding is ASCII-only so the in-memory result stays in lockstep
  // with the store-side LIKE predicate, which is blind to ASCII case and
  // nothing else.

  fn contains(&self, subject: &UserAttributes) -> bool {
    match (subject.attribute(self.field), self.value.as_deref()) {
      (Some(have), Some(want)) => {
        have.to_ascii_lowercase().contains(&want.to_ascii_lowercase())
      }
      _ => false,
    }
  }

  fn starts_with(&self, subject: &UserAttributes) -> bool {
    match (subject.attribute(self.field), self.value.as_deref()) {
      (Some(have), Some(want)) => {
        have.to_ascii_lowercase().starts_with(&want.to_ascii_lowercase())
      }
      _ => false,
    }
  }

  /// Byte-wise ordinal comparison — not numeric, not locale-aware. This is
  /// what the authoring surface has always stored, and it matches SQLite's
  /// BINARY collation.
  fn compares(&self, subject: &UserAttributes, pred: fn(Ordering) -> bool) -> bool {
    match (subject.attribute(self.field), self.value.as_deref()) {
      (Some(have), Some(want)) => pred(have.cmp(want)),
      _ => false,
    }
  }

  /// Membership of `value` (a group id) in the subject's group set. An
  /// operand that is absent or not a UUID is a non-match. The check runs
  /// regardless of `field`; the operator alone selects it.
  fn member_of(&self, subject: &UserAttributes) -> bool {
    self
      .value
      .as_deref()
      .and_then(|v| Uuid::parse_str(v).ok())
      .is_some_and(|id| subject.group_ids.contains(&id))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
