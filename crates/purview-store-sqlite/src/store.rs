//! [`SqliteDirectory`] — the SQLite implementation of [`UserDirectory`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use purview_core::{
  directory::{AudiencePreview, UserDirectory},
  rule::VisibilityRule,
  user::{Group, NewGroup, UserAttributes, UserProfile, UserRecord},
};

use crate::{
  encode::{decode_uuid, encode_dt, encode_uuid, RawGroup, RawUser, RawUserSummary},
  filter::compile,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Purview user directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  /// Open an in-memory directory — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── UserDirectory impl ──────────────────────────────────────────────────────

impl UserDirectory for SqliteDirectory {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, profile: UserProfile) -> Result<UserRecord> {
    let record = UserRecord {
      user_id:            profile.user_id,
      display_name:       profile.display_name,
      email:              profile.email,
      department:         profile.department,
      location:           profile.location,
      job_title:          profile.job_title,
      role:               profile.role,
      preferred_language: profile.preferred_language,
      active:             profile.active,
      updated_at:         Utc::now(),
    };

    let id_str             = encode_uuid(record.user_id);
    let display_name       = record.display_name.clone();
    let email              = record.email.clone();
    let department         = record.department.clone();
    let location           = record.location.clone();
    let job_title          = record.job_title.clone();
    let role               = record.role.clone();
    let preferred_language = record.preferred_language.clone();
    let active             = record.active;
    let updated_at_str     = encode_dt(record.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, display_name, email, department, location,
             job_title, role, preferred_language, active, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(user_id) DO UPDATE SET
             display_name       = excluded.display_name,
             email              = excluded.email,
             department         = excluded.department,
             location           = excluded.location,
             job_title          = excluded.job_title,
             role               = excluded.role,
             preferred_language = excluded.preferred_language,
             active             = excluded.active,
             updated_at         = excluded.updated_at",
          rusqlite::params![
            id_str,
            display_name,
            email,
            department,
            location,
            job_title,
            role,
            preferred_language,
            active,
            updated_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, display_name, email, department, location,
                    job_title, role, preferred_language, active, updated_at
             FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawUser {
                user_id:            row.get(0)?,
                display_name:       row.get(1)?,
                email:              row.get(2)?,
                department:         row.get(3)?,
                location:           row.get(4)?,
                job_title:          row.get(5)?,
                role:               row.get(6)?,
                preferred_language: row.get(7)?,
                active:             row.get(8)?,
                updated_at:         row.get(9)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_record).transpose()
  }

  async fn list_users(&self, active_only: bool) -> Result<Vec<UserRecord>> {
    let sql = if active_only {
      "SELECT user_id, display_name, email, department, location,
              job_title, role, preferred_language, active, updated_at
       FROM users WHERE active = 1
       ORDER BY display_name, user_id"
    } else {
      "SELECT user_id, display_name, email, department, location,
              job_title, role, preferred_language, active, updated_at
       FROM users
       ORDER BY display_name, user_id"
    };

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawUser {
              user_id:            row.get(0)?,
              display_name:       row.get(1)?,
              email:              row.get(2)?,
              department:         row.get(3)?,
              location:           row.get(4)?,
              job_title:          row.get(5)?,
              role:               row.get(6)?,
              preferred_language: row.get(7)?,
              active:             row.get(8)?,
              updated_at:         row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_record).collect()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn upsert_group(&self, group: NewGroup) -> Result<Group> {
    let id_str  = encode_uuid(group.group_id);
    let name    = group.name;
    let now_str = encode_dt(Utc::now());

    // created_at is written on first insert only; the conflict arm leaves
    // it untouched so renames keep the original timestamp.
    let raw: RawGroup = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, name, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(group_id) DO UPDATE SET name = excluded.name",
          rusqlite::params![id_str, name, now_str],
        )?;
        Ok(conn.query_row(
          "SELECT group_id, name, created_at FROM groups WHERE group_id = ?1",
          rusqlite::params![id_str],
          |row| {
            Ok(RawGroup {
              group_id:   row.get(0)?,
              name:       row.get(1)?,
              created_at: row.get(2)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_group()
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT group_id, name, created_at FROM groups WHERE group_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawGroup {
                group_id:   row.get(0)?,
                name:       row.get(1)?,
                created_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    let raws: Vec<RawGroup> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT group_id, name, created_at FROM groups ORDER BY name, group_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawGroup {
              group_id:   row.get(0)?,
              name:       row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let gid_str = encode_uuid(group_id);
    let uid_str = encode_uuid(user_id);
    let at_str  = encode_dt(Utc::now());

    let (group_exists, user_exists, inserted): (bool, bool, bool) = self
      .conn
      .call(move |conn| {
        let group_exists: bool = conn
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            rusqlite::params![gid_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !group_exists {
          return Ok((false, false, false));
        }

        let user_exists: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![uid_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !user_exists {
          return Ok((true, false, false));
        }

        let n = conn.execute(
          "INSERT OR IGNORE INTO group_members (group_id, user_id, added_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![gid_str, uid_str, at_str],
        )?;

        Ok((true, true, n > 0))
      })
      .await?;

    if !group_exists {
      return Err(Error::GroupNotFound(group_id));
    }
    if !user_exists {
      return Err(Error::UserNotFound(user_id));
    }

    Ok(inserted)
  }

  async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let gid_str = encode_uuid(group_id);
    let uid_str = encode_uuid(user_id);

    let (group_exists, removed): (bool, bool) = self
      .conn
      .call(move |conn| {
        let group_exists: bool = conn
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            rusqlite::params![gid_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !group_exists {
          return Ok((false, false));
        }

        let n = conn.execute(
          "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
          rusqlite::params![gid_str, uid_str],
        )?;

        Ok((true, n > 0))
      })
      .await?;

    if !group_exists {
      return Err(Error::GroupNotFound(group_id));
    }

    Ok(removed)
  }

  async fn group_members(&self, group_id: Uuid) -> Result<Vec<Uuid>> {
    let gid_str = encode_uuid(group_id);

    let (group_exists, id_strs): (bool, Vec<String>) = self
      .conn
      .call(move |conn| {
        let group_exists: bool = conn
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            rusqlite::params![gid_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !group_exists {
          return Ok((false, vec![]));
        }

        let mut stmt = conn.prepare(
          "SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![gid_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok((true, rows))
      })
      .await?;

    if !group_exists {
      return Err(Error::GroupNotFound(group_id));
    }

    id_strs.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Evaluation support ────────────────────────────────────────────────────

  async fn snapshot(&self, user_id: Uuid) -> Result<Option<UserAttributes>> {
    let record = match self.get_user(user_id).await? {
      Some(r) => r,
      None    => return Ok(None),
    };

    let uid_str = encode_uuid(user_id);

    let id_strs: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT group_id FROM group_members WHERE user_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![uid_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    let group_ids = id_strs
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<HashSet<Uuid>>>()?;

    Ok(Some(record.into_attributes(group_ids)))
  }

  async fn preview(
    &self,
    rule: &VisibilityRule,
    sample_limit: usize,
  ) -> Result<AudiencePreview> {
    let filter = compile(rule);

    // Count and sample share one compiled predicate and one parameter
    // vector. LIMIT is embedded rather than bound so the placeholder list
    // stays exactly the filter's.
    let limit = i64::try_from(sample_limit).unwrap_or(i64::MAX);

    let count_sql = format!(
      "SELECT COUNT(*) FROM users u WHERE u.active = 1 AND ({})",
      filter.where_sql
    );
    let sample_sql = format!(
      "SELECT u.user_id, u.display_name, u.email, u.department
       FROM users u
       WHERE u.active = 1 AND ({})
       ORDER BY u.display_name, u.user_id
       LIMIT {limit}",
      filter.where_sql
    );
    let params = filter.params;

    let (total, raws): (i64, Vec<RawUserSummary>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&sample_sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawUserSummary {
              user_id:      row.get(0)?,
              display_name: row.get(1)?,
              email:        row.get(2)?,
              department:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let sample = raws
      .into_iter()
      .map(RawUserSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(AudiencePreview { total_count: total as u64, sample })
  }
}
