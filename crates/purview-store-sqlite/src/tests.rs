//! Integration tests for `SqliteDirectory` against an in-memory database.

use purview_core::{
  directory::{AudiencePreview, DEFAULT_SAMPLE_LIMIT, UserDirectory},
  eval::is_visible,
  rule::{RuleCondition, RuleField, RuleLogic, RuleOperator, RuleSet, VisibilityRule},
  user::{NewGroup, UserProfile},
};
use uuid::Uuid;

use crate::{Error, SqliteDirectory};

async fn dir() -> SqliteDirectory {
  SqliteDirectory::open_in_memory()
    .await
    .expect("in-memory directory")
}

fn rules(logic: RuleLogic, conditions: Vec<RuleCondition>) -> VisibilityRule {
  VisibilityRule::Rules { rules: RuleSet { logic, conditions } }
}

fn sample_names(preview: &AudiencePreview) -> Vec<&str> {
  preview.sample.iter().map(|u| u.display_name.as_str()).collect()
}

// ─── Fixture population ──────────────────────────────────────────────────────

const G1: Uuid = Uuid::from_u128(0xA1);
const G2: Uuid = Uuid::from_u128(0xA2);

const ALICE: Uuid = Uuid::from_u128(1);
const BOB: Uuid = Uuid::from_u128(2);
const CAROL: Uuid = Uuid::from_u128(3);
const DAVE: Uuid = Uuid::from_u128(4);
const ERIN: Uuid = Uuid::from_u128(5);
const FRANK: Uuid = Uuid::from_u128(6);

/// Six users exercising every attribute shape the rule language can meet:
/// mixed departments and locations, ASCII-case variants, a fully blank row
/// (Dave), and an inactive row (Frank) that must never appear in a preview.
async fn populated() -> SqliteDirectory {
  let d = dir().await;

  d.upsert_group(NewGroup { group_id: G1, name: "Engineering Guild".into() })
    .await
    .unwrap();
  d.upsert_group(NewGroup { group_id: G2, name: "Announcements".into() })
    .await
    .unwrap();

  let users = [
    (ALICE, "Alice Park", Some("Engineering"), Some("NYC"), Some("Staff Engineer"), Some("editor"), Some("en"), true),
    (BOB, "Bob Tran", Some("Engineering"), Some("SF"), Some("Engineer II"), None, Some("en"), true),
    (CAROL, "Carol Diaz", Some("Marketing"), Some("NYC"), Some("Designer"), Some("viewer"), Some("fr"), true),
    (DAVE, "Dave Singh", None, None, None, None, None, true),
    (ERIN, "Erin Cole", Some("engineering"), Some("LA"), Some("staff engineer"), Some("editor"), Some("de"), true),
    (FRANK, "Frank Mills", Some("Engineering"), Some("NYC"), Some("Engineer I"), None, Some("en"), false),
  ];

  for (id, name, dept, loc, title, role, lang, active) in users {
    d.upsert_user(UserProfile {
      user_id:            id,
      display_name:       name.into(),
      email:              None,
      department:         dept.map(Into::into),
      location:           loc.map(Into::into),
      job_title:          title.map(Into::into),
      role:               role.map(Into::into),
      preferred_language: lang.map(Into::into),
      active,
    })
    .await
    .unwrap();
  }

  for (group, user) in [(G1, ALICE), (G1, BOB), (G2, BOB), (G2, CAROL), (G1, FRANK)] {
    d.add_member(group, user).await.unwrap();
  }

  d
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_user() {
  let d = dir().await;

  let created = d
    .upsert_user(UserProfile {
      user_id:            ALICE,
      display_name:       "Alice Park".into(),
      email:              Some("alice@example.com".into()),
      department:         Some("Engineering".into()),
      location:           Some("NYC".into()),
      job_title:          Some("Staff Engineer".into()),
      role:               Some("editor".into()),
      preferred_language: Some("en".into()),
      active:             true,
    })
    .await
    .unwrap();

  let fetched = d.get_user(ALICE).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, ALICE);
  assert_eq!(fetched.display_name, "Alice Park");
  assert_eq!(fetched.email.as_deref(), Some("alice@example.com"));
  assert_eq!(fetched.department.as_deref(), Some("Engineering"));
  assert_eq!(fetched.preferred_language.as_deref(), Some("en"));
  assert!(fetched.active);
  assert_eq!(fetched.updated_at, created.updated_at);
}

#[tokio::test]
async fn upsert_replaces_every_attribute() {
  let d = dir().await;

  let mut profile = UserProfile::new(ALICE, "Alice Park");
  profile.department = Some("Engineering".into());
  d.upsert_user(profile.clone()).await.unwrap();

  profile.department = None;
  profile.location = Some("LA".into());
  d.upsert_user(profile).await.unwrap();

  let fetched = d.get_user(ALICE).await.unwrap().unwrap();
  assert_eq!(fetched.department, None);
  assert_eq!(fetched.location.as_deref(), Some("LA"));
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let d = dir().await;
  assert!(d.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_users_orders_by_name_and_honours_active_flag() {
  let d = populated().await;

  let all = d.list_users(false).await.unwrap();
  let names: Vec<&str> = all.iter().map(|u| u.display_name.as_str()).collect();
  assert_eq!(names, vec![
    "Alice Park",
    "Bob Tran",
    "Carol Diaz",
    "Dave Singh",
    "Erin Cole",
    "Frank Mills",
  ]);

  let active = d.list_users(true).await.unwrap();
  assert_eq!(active.len(), 5);
  assert!(active.iter().all(|u| u.active));
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_group_renames_but_preserves_created_at() {
  let d = dir().await;

  let first = d
    .upsert_group(NewGroup { group_id: G1, name: "Old Name".into() })
    .await
    .unwrap();
  let renamed = d
    .upsert_group(NewGroup { group_id: G1, name: "New Name".into() })
    .await
    .unwrap();

  assert_eq!(renamed.name, "New Name");
  assert_eq!(renamed.created_at, first.created_at);
}

#[tokio::test]
async fn get_group_missing_returns_none() {
  let d = dir().await;
  assert!(d.get_group(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_groups_orders_by_name() {
  let d = populated().await;

  let groups = d.list_groups().await.unwrap();
  let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
  assert_eq!(names, vec!["Announcements", "Engineering Guild"]);
}

#[tokio::test]
async fn add_member_reports_duplicates() {
  let d = populated().await;

  // Already added by the fixture.
  assert!(!d.add_member(G1, ALICE).await.unwrap());
  // Carol is new to G1.
  assert!(d.add_member(G1, CAROL).await.unwrap());
}

#[tokio::test]
async fn membership_requires_known_group_and_user() {
  let d = populated().await;
  let ghost = Uuid::new_v4();

  let err = d.add_member(ghost, ALICE).await.unwrap_err();
  assert!(matches!(err, Error::GroupNotFound(id) if id == ghost));

  let err = d.add_member(G1, ghost).await.unwrap_err();
  assert!(matches!(err, Error::UserNotFound(id) if id == ghost));

  let err = d.remove_member(ghost, ALICE).await.unwrap_err();
  assert!(matches!(err, Error::GroupNotFound(id) if id == ghost));

  let err = d.group_members(ghost).await.unwrap_err();
  assert!(matches!(err, Error::GroupNotFound(id) if id == ghost));
}

#[tokio::test]
async fn remove_member_reports_absence() {
  let d = populated().await;

  assert!(d.remove_member(G1, ALICE).await.unwrap());
  assert!(!d.remove_member(G1, ALICE).await.unwrap());
}

#[tokio::test]
async fn group_members_lists_every_member() {
  let d = populated().await;

  // Membership ignores the active flag; Frank is listed even though no
  // preview will ever count him.
  let members = d.group_members(G1).await.unwrap();
  assert_eq!(members, vec![ALICE, BOB, FRANK]);
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_merges_attributes_and_memberships() {
  let d = populated().await;

  let attrs = d.snapshot(BOB).await.unwrap().unwrap();
  assert_eq!(attrs.department.as_deref(), Some("Engineering"));
  assert_eq!(attrs.location.as_deref(), Some("SF"));
  assert_eq!(attrs.role, None);
  let expected: std::collections::HashSet<Uuid> = [G1, G2].into_iter().collect();
  assert_eq!(attrs.group_ids, expected);

  let blank = d.snapshot(DAVE).await.unwrap().unwrap();
  assert_eq!(blank.department, None);
  assert!(blank.group_ids.is_empty());
}

#[tokio::test]
async fn snapshot_unknown_user_returns_none() {
  let d = populated().await;
  assert!(d.snapshot(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Preview ─────────────────────────────────────────────────────────────────

async fn total(d: &SqliteDirectory, rule: &VisibilityRule) -> u64 {
  d.preview(rule, DEFAULT_SAMPLE_LIMIT).await.unwrap().total_count
}

#[tokio::test]
async fn preview_all_counts_active_users_only() {
  let d = populated().await;

  let preview = d.preview(&VisibilityRule::All, DEFAULT_SAMPLE_LIMIT).await.unwrap();
  assert_eq!(preview.total_count, 5);
  assert_eq!(sample_names(&preview), vec![
    "Alice Park",
    "Bob Tran",
    "Carol Diaz",
    "Dave Singh",
    "Erin Cole",
  ]);
}

#[tokio::test]
async fn preview_groups_rule() {
  let d = populated().await;

  assert_eq!(total(&d, &VisibilityRule::Groups { group_ids: vec![G1] }).await, 2);
  assert_eq!(total(&d, &VisibilityRule::Groups { group_ids: vec![G1, G2] }).await, 3);
  assert_eq!(total(&d, &VisibilityRule::Groups { group_ids: vec![] }).await, 0);
}

#[tokio::test]
async fn preview_equals_is_case_sensitive() {
  let d = populated().await;

  // Erin's lowercase "engineering" does not match under `equals`.
  let rule = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Department,
    RuleOperator::Equals,
    "Engineering",
  )]);
  assert_eq!(total(&d, &rule).await, 2);
}

#[tokio::test]
async fn preview_not_equals_keeps_attribute_less_users() {
  let d = populated().await;

  let rule = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Department,
    RuleOperator::NotEquals,
    "Engineering",
  )]);
  let preview = d.preview(&rule, DEFAULT_SAMPLE_LIMIT).await.unwrap();

  // Dave has no department at all and still belongs to the complement.
  assert_eq!(preview.total_count, 3);
  assert_eq!(sample_names(&preview), vec!["Carol Diaz", "Dave Singh", "Erin Cole"]);
}

#[tokio::test]
async fn preview_substring_operators_fold_ascii_case() {
  let d = populated().await;

  let contains = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Department,
    RuleOperator::Contains,
    "GINEER",
  )]);
  assert_eq!(total(&d, &contains).await, 3);

  let starts = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::JobTitle,
    RuleOperator::StartsWith,
    "staff",
  )]);
  assert_eq!(total(&d, &starts).await, 2);
}

#[tokio::test]
async fn preview_in_and_not_in() {
  let d = populated().await;

  let is_in = rules(RuleLogic::And, vec![RuleCondition::with_values(
    RuleField::Location,
    RuleOperator::In,
    ["NYC", "LA"],
  )]);
  assert_eq!(total(&d, &is_in).await, 3);

  let not_in = rules(RuleLogic::And, vec![RuleCondition::with_values(
    RuleField::Location,
    RuleOperator::NotIn,
    ["NYC", "LA"],
  )]);
  assert_eq!(total(&d, &not_in).await, 2);
}

#[tokio::test]
async fn preview_ordinal_comparisons_are_byte_wise() {
  let d = populated().await;

  // "SF" sorts above "NYC", "LA" below.
  let gte = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Location,
    RuleOperator::Gte,
    "NYC",
  )]);
  assert_eq!(total(&d, &gte).await, 3);

  let lte = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Location,
    RuleOperator::Lte,
    "NYC",
  )]);
  assert_eq!(total(&d, &lte).await, 3);
}

#[tokio::test]
async fn preview_membership_operators() {
  let d = populated().await;

  let member = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Group,
    RuleOperator::MemberOf,
    G1.to_string(),
  )]);
  let preview = d.preview(&member, DEFAULT_SAMPLE_LIMIT).await.unwrap();
  assert_eq!(preview.total_count, 2);
  assert_eq!(sample_names(&preview), vec!["Alice Park", "Bob Tran"]);

  let not_member = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Group,
    RuleOperator::NotMemberOf,
    G1.to_string(),
  )]);
  assert_eq!(total(&d, &not_member).await, 3);

  let unparsable = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Group,
    RuleOperator::MemberOf,
    "not-a-uuid",
  )]);
  assert_eq!(total(&d, &unparsable).await, 0);

  let not_unparsable = rules(RuleLogic::And, vec![RuleCondition::new(
    RuleField::Group,
    RuleOperator::NotMemberOf,
    "not-a-uuid",
  )]);
  assert_eq!(total(&d, &not_unparsable).await, 5);
}

#[tokio::test]
async fn preview_combinators() {
  let d = populated().await;

  let conditions = vec![
    RuleCondition::new(RuleField::Department, RuleOperator::Equals, "Engineering"),
    RuleCondition::new(RuleField::Location, RuleOperator::Equals, "NYC"),
  ];

  let and = rules(RuleLogic::And, conditions.clone());
  assert_eq!(total(&d, &and).await, 1);

  let or = rules(RuleLogic::Or, conditions);
  assert_eq!(total(&d, &or).await, 3);

  assert_eq!(total(&d, &rules(RuleLogic::And, vec![])).await, 5);
  assert_eq!(total(&d, &rules(RuleLogic::Or, vec![])).await, 0);
}

#[tokio::test]
async fn preview_sample_is_bounded_but_count_is_not() {
  let d = populated().await;

  let preview = d.preview(&VisibilityRule::All, 2).await.unwrap();
  assert_eq!(preview.total_count, 5);
  assert_eq!(sample_names(&preview), vec!["Alice Park", "Bob Tran"]);
}

// ─── Pushdown / evaluator symmetry ───────────────────────────────────────────

/// Count the active audience the slow way: snapshot every active user and
/// run the in-memory evaluator.
async fn evaluated_count(d: &SqliteDirectory, rule: &VisibilityRule) -> u64 {
  let mut n = 0;
  for user in d.list_users(true).await.unwrap() {
    let attrs = d.snapshot(user.user_id).await.unwrap().unwrap();
    if is_visible(Some(rule), &attrs) {
      n += 1;
    }
  }
  n
}

#[tokio::test]
async fn pushdown_matches_in_memory_evaluation() {
  let d = populated().await;

  let no_operand = RuleCondition {
    field:    RuleField::Location,
    operator: RuleOperator::In,
    value:    None,
    values:   None,
  };

  let battery = vec![
    VisibilityRule::All,
    VisibilityRule::Groups { group_ids: vec![] },
    VisibilityRule::Groups { group_ids: vec![G1] },
    VisibilityRule::Groups { group_ids: vec![G1, G2] },
    rules(RuleLogic::And, vec![]),
    rules(RuleLogic::Or, vec![]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Department,
      RuleOperator::Equals,
      "Engineering",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Department,
      RuleOperator::NotEquals,
      "Engineering",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::with_values(
      RuleField::Location,
      RuleOperator::In,
      ["NYC", "LA"],
    )]),
    rules(RuleLogic::And, vec![RuleCondition::with_values(
      RuleField::Location,
      RuleOperator::NotIn,
      ["NYC", "LA"],
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::JobTitle,
      RuleOperator::Contains,
      "engineer",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::JobTitle,
      RuleOperator::StartsWith,
      "Staff",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::PreferredLanguage,
      RuleOperator::Gte,
      "en",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::PreferredLanguage,
      RuleOperator::Lte,
      "en",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Group,
      RuleOperator::MemberOf,
      G2.to_string(),
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Group,
      RuleOperator::NotMemberOf,
      G2.to_string(),
    )]),
    // Operator-driven membership: the stored field is irrelevant.
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Department,
      RuleOperator::MemberOf,
      G1.to_string(),
    )]),
    // Degenerate conditions resolve identically on both sides.
    rules(RuleLogic::And, vec![no_operand.clone()]),
    rules(RuleLogic::And, vec![RuleCondition {
      operator: RuleOperator::NotIn,
      ..no_operand.clone()
    }]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Group,
      RuleOperator::Equals,
      "anything",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Group,
      RuleOperator::NotEquals,
      "anything",
    )]),
    rules(RuleLogic::And, vec![RuleCondition::new(
      RuleField::Group,
      RuleOperator::MemberOf,
      "not-a-uuid",
    )]),
    rules(RuleLogic::Or, vec![
      RuleCondition::new(RuleField::Department, RuleOperator::Equals, "Marketing"),
      RuleCondition::new(RuleField::Group, RuleOperator::MemberOf, G1.to_string()),
      RuleCondition::new(RuleField::Location, RuleOperator::StartsWith, "L"),
    ]),
    rules(RuleLogic::And, vec![
      RuleCondition::new(RuleField::Department, RuleOperator::Contains, "eng"),
      RuleCondition::with_values(RuleField::Location, RuleOperator::NotIn, ["SF"]),
      RuleCondition::new(RuleField::Group, RuleOperator::NotMemberOf, G2.to_string()),
    ]),
  ];

  for rule in battery {
    let pushed = total(&d, &rule).await;
    let evaluated = evaluated_count(&d, &rule).await;
    assert_eq!(
      pushed, evaluated,
      "pushdown and in-memory evaluation disagree for {rule:?}",
    );
  }
}
