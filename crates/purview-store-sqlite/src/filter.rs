//! Translation of a [`VisibilityRule`] into a SQL predicate over `users u`.
//!
//! Preview has to stay interactive against tens of thousands of users, so
//! the rule is pushed down as one compound WHERE fragment rather than
//! materialising the population and evaluating it row by row. Every
//! fragment mirrors the in-memory evaluator's vacuous-truth table exactly;
//! the integration tests pin that symmetry operator by operator.
//!
//! SQL/evaluator alignment notes:
//! - negated operators use explicit `(col IS NULL OR …)` forms because a
//!   bare `NOT (col = ?)` drops NULL rows under three-valued logic, while
//!   the evaluator treats an absent attribute as a vacuous match;
//! - `LIKE` is ASCII-case-insensitive, which the evaluator matches with
//!   ASCII folding;
//! - `>=`/`<=` under the BINARY collation are byte-wise, which the
//!   evaluator matches with `str::cmp`.

use purview_core::rule::{
  RuleCondition, RuleField, RuleLogic, RuleOperator, RuleSet, VisibilityRule,
};
use uuid::Uuid;

use crate::encode::encode_uuid;

/// Predicate that matches no row.
const NEVER: &str = "0=1";
/// Predicate that matches every row.
const ALWAYS: &str = "1=1";

const MEMBERSHIP_SUBQUERY: &str =
  "SELECT gm.user_id FROM group_members gm WHERE gm.group_id = ?";

/// A compiled WHERE fragment plus its positional parameters.
///
/// `where_sql` uses unnumbered `?` placeholders; bind `params` in order
/// with [`rusqlite::params_from_iter`].
#[derive(Debug, Clone)]
pub struct RuleFilter {
  pub where_sql: String,
  pub params:    Vec<String>,
}

/// Compile `rule` into a predicate over the `users` table (aliased `u`).
/// Total, like the evaluator: structurally valid rules always compile.
pub fn compile(rule: &VisibilityRule) -> RuleFilter {
  let mut params = Vec::new();
  let where_sql = match rule {
    VisibilityRule::All => ALWAYS.to_string(),
    VisibilityRule::Groups { group_ids } => groups_sql(group_ids, &mut params),
    VisibilityRule::Rules { rules } => rule_set_sql(rules, &mut params),
  };
  RuleFilter { where_sql, params }
}

fn groups_sql(group_ids: &[Uuid], params: &mut Vec<String>) -> String {
  if group_ids.is_empty() {
    return NEVER.to_string();
  }
  let marks = placeholders(group_ids.len());
  params.extend(group_ids.iter().copied().map(encode_uuid));
  format!(
    "u.user_id IN (SELECT gm.user_id FROM group_members gm WHERE gm.group_id IN ({marks}))"
  )
}

fn rule_set_sql(rules: &RuleSet, params: &mut Vec<String>) -> String {
  if rules.conditions.is_empty() {
    // Same boolean identities as the evaluator: AND over nothing is true,
    // OR over nothing is false.
    return match rules.logic {
      RuleLogic::And => ALWAYS.to_string(),
      RuleLogic::Or => NEVER.to_string(),
    };
  }
  let joiner = match rules.logic {
    RuleLogic::And => " AND ",
    RuleLogic::Or => " OR ",
  };
  let fragments: Vec<String> = rules
    .conditions
    .iter()
    .map(|c| condition_sql(c, params))
    .collect();
  format!("({})", fragments.join(joiner))
}

fn condition_sql(cond: &RuleCondition, params: &mut Vec<String>) -> String {
  match cond.operator {
    RuleOperator::Equals => match operands(cond) {
      Some((col, v)) => {
        params.push(v.to_owned());
        format!("{col} = ?")
      }
      None => NEVER.to_string(),
    },
    RuleOperator::NotEquals => match operands(cond) {
      Some((col, v)) => {
        params.push(v.to_owned());
        format!("({col} IS NULL OR {col} <> ?)")
      }
      None => ALWAYS.to_string(),
    },
    RuleOperator::In => match list_operands(cond) {
      Some((col, vs)) => {
        let marks = placeholders(vs.len());
        params.extend(vs.iter().cloned());
        format!("{col} IN ({marks})")
      }
      None => NEVER.to_string(),
    },
    RuleOperator::NotIn => match list_operands(cond) {
      Some((col, vs)) => {
        let marks = placeholders(vs.len());
        params.extend(vs.iter().cloned());
        format!("({col} IS NULL OR {col} NOT IN ({marks}))")
      }
      None => ALWAYS.to_string(),
    },
    RuleOperator::Contains => like_sql(cond, params, |esc| format!("%{esc}%")),
    RuleOperator::StartsWith => like_sql(cond, params, |esc| format!("{esc}%")),
    RuleOperator::Gte => comparison_sql(cond, params, ">="),
    RuleOperator::Lte => comparison_sql(cond, params, "<="),
    RuleOperator::MemberOf => match group_operand(cond) {
      Some(id) => {
        params.push(id);
        format!("u.user_id IN ({MEMBERSHIP_SUBQUERY})")
      }
      None => NEVER.to_string(),
    },
    RuleOperator::NotMemberOf => match group_operand(cond) {
      Some(id) => {
        params.push(id);
        format!("u.user_id NOT IN ({MEMBERSHIP_SUBQUERY})")
      }
      None => ALWAYS.to_string(),
    },
  }
}

fn like_sql(
  cond: &RuleCondition,
  params: &mut Vec<String>,
  pattern: impl FnOnce(String) -> String,
) -> String {
  match operands(cond) {
    Some((col, v)) => {
      params.push(pattern(escape_like(v)));
      format!(r"{col} LIKE ? ESCAPE '\'")
    }
    None => NEVER.to_string(),
  }
}

fn comparison_sql(
  cond: &RuleCondition,
  params: &mut Vec<String>,
  op: &str,
) -> String {
  // NULL comparisons are NULL in SQL, so absent attributes drop out of the
  // positive match exactly as the evaluator's vacuous false does.
  match operands(cond) {
    Some((col, v)) => {
      params.push(v.to_owned());
      format!("{col} {op} ?")
    }
    None => NEVER.to_string(),
  }
}

/// Column + single operand, when both exist.
fn operands(cond: &RuleCondition) -> Option<(&'static str, &str)> {
  Some((column(cond.field)?, cond.value.as_deref()?))
}

/// Column + non-empty list operand, when both exist.
fn list_operands(cond: &RuleCondition) -> Option<(&'static str, &[String])> {
  let vs = cond.values.as_deref()?;
  if vs.is_empty() {
    return None;
  }
  Some((column(cond.field)?, vs))
}

/// The operand parsed as a group id, when present and parsable.
fn group_operand(cond: &RuleCondition) -> Option<String> {
  let id = Uuid::parse_str(cond.value.as_deref()?).ok()?;
  Some(encode_uuid(id))
}

/// The `users` column a field reads, or `None` for `Group`, which has no
/// column and resolves through the membership relation instead.
fn column(field: RuleField) -> Option<&'static str> {
  match field {
    RuleField::Department => Some("u.department"),
    RuleField::Location => Some("u.location"),
    RuleField::JobTitle => Some("u.job_title"),
    RuleField::Role => Some("u.role"),
    RuleField::PreferredLanguage => Some("u.preferred_language"),
    RuleField::Group => None,
  }
}

/// Escape `%`, `_`, and the escape character itself for a LIKE pattern
/// bound under `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for ch in value.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}

fn placeholders(n: usize) -> String {
  vec!["?"; n].join(", ")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
