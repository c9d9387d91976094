//! Visibility-rule types — the targeting language attached to content.
//!
//! A rule is stored serialized alongside the content row it guards and is
//! parsed again on every read. The string tokens on the wire (`type`,
//! `logic`, `field`, and `operator` values) are shared verbatim with the
//! authoring frontend and sibling services; they are a compatibility
//! contract and must never be renamed.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─── Leaf enums ──────────────────────────────────────────────────────────────

/// Combinator applied across the conditions of a [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleLogic {
  And,
  Or,
}

/// The subject attribute a condition reads.
///
/// `Group` carries no string value of its own; it pairs with the membership
/// operators, which test the subject's group-id set instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleField {
  Department,
  Location,
  JobTitle,
  Role,
  PreferredLanguage,
  Group,
}

/// Comparison applied between the resolved subject attribute and the
/// condition operand(s). Operators are field-agnostic: any operator may be
/// stored against any field, and missing data resolves per the vacuous
/// truth table in [`crate::eval`] rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
  Equals,
  NotEquals,
  In,
  NotIn,
  Contains,
  StartsWith,
  Gte,
  Lte,
  MemberOf,
  NotMemberOf,
}

// ─── RuleCondition ───────────────────────────────────────────────────────────

/// A single field/operator/value predicate.
///
/// `value` carries the operand for the single-valued operators, `values`
/// the list operand for `in`/`not_in`. Both are optional on the wire;
/// serialization omits them when absent, and explicit `null`s are accepted
/// on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCondition {
  pub field:    RuleField,
  pub operator: RuleOperator,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub values:   Option<Vec<String>>,
}

impl RuleCondition {
  /// Condition with a single operand.
  pub fn new(
    field: RuleField,
    operator: RuleOperator,
    value: impl Into<String>,
  ) -> Self {
    Self {
      field,
      operator,
      value: Some(value.into()),
      values: None,
    }
  }

  /// Condition with a list operand (`in` / `not_in`).
  pub fn with_values<I>(field: RuleField, operator: RuleOperator, values: I) -> Self
  where
    I: IntoIterator,
    I::Item: Into<String>,
  {
    Self {
      field,
      operator,
      value: None,
      values: Some(values.into_iter().map(Into::into).collect()),
    }
  }
}

// ─── RuleSet ─────────────────────────────────────────────────────────────────

/// An ordered list of conditions under one combinator.
///
/// Order never affects the evaluation result; it is preserved because the
/// authoring frontend round-trips the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
  pub logic:      RuleLogic,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub conditions: Vec<RuleCondition>,
}

// ─── VisibilityRule ──────────────────────────────────────────────────────────

/// The persisted targeting predicate, one per content item.
///
/// The serialized form is internally tagged on `type`. A content row may
/// also carry no rule at all; that case is handled by
/// [`crate::codec::parse`] and [`crate::eval::is_visible`], not by an enum
/// variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisibilityRule {
  /// Visible to everyone.
  All,
  /// Visible to any member of any listed group (OR across groups).
  Groups {
    #[serde(rename = "groupIds", default, deserialize_with = "null_as_empty")]
    group_ids: Vec<Uuid>,
  },
  /// Visible to subjects matching the condition set.
  Rules { rules: RuleSet },
}

// ─── Wire helpers ────────────────────────────────────────────────────────────

/// Accept an explicit `null` where a list is expected, reading it as empty.
/// Authoring clients have historically serialized absent lists both ways.
fn null_as_empty<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(de)?.unwrap_or_default())
}
