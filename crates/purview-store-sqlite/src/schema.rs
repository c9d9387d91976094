//! SQL schema for the Purview SQLite directory.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per directory user. Attribute columns are nullable on purpose:
-- rule evaluation resolves absent values per operator.
CREATE TABLE IF NOT EXISTS users (
    user_id            TEXT PRIMARY KEY,
    display_name       TEXT NOT NULL,
    email              TEXT,
    department         TEXT,
    location           TEXT,
    job_title          TEXT,
    role               TEXT,
    preferred_language TEXT,
    active             INTEGER NOT NULL DEFAULT 1,
    updated_at         TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS groups (
    group_id   TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL            -- set on first insert, never updated
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id TEXT NOT NULL REFERENCES groups(group_id),
    user_id  TEXT NOT NULL REFERENCES users(user_id),
    added_at TEXT NOT NULL,
    UNIQUE (group_id, user_id)
);

-- Preview predicates filter on attribute columns and on membership.
CREATE INDEX IF NOT EXISTS users_department_idx ON users(department);
CREATE INDEX IF NOT EXISTS users_location_idx   ON users(location);
CREATE INDEX IF NOT EXISTS users_active_idx     ON users(active);
CREATE INDEX IF NOT EXISTS members_group_idx    ON group_members(group_id);
CREATE INDEX IF NOT EXISTS members_user_idx     ON group_members(user_id);

PRAGMA user_version = 1;
";
