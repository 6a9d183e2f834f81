//! SQL schema for the Roster SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per student aggregate. `seq` preserves first-insertion order and is
-- never rewritten by an upsert.
CREATE TABLE IF NOT EXISTS students (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id  TEXT NOT NULL UNIQUE,
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC
    document    TEXT NOT NULL    -- JSON-encoded Student
);
";
