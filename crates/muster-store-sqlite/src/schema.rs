//! SQL schema for the muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Mirrored from the identity provider. Documents are not unique here: the
-- provider can hand us duplicates, which the consolidation pass merges.
CREATE TABLE IF NOT EXISTS identities (
    identity_id  TEXT PRIMARY KEY,
    document     TEXT,
    display_name TEXT NOT NULL,
    phone        TEXT,
    roles        TEXT NOT NULL DEFAULT '[]',   -- JSON array of role names
    manager_id   TEXT REFERENCES identities(identity_id) ON DELETE SET NULL,
    is_seed      INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meetings (
    meeting_id      TEXT PRIMARY KEY,
    code            TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    scheduled_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    region          TEXT,
    locality        TEXT,
    district        TEXT,
    neighborhood    TEXT,
    leader_id       TEXT NOT NULL REFERENCES identities(identity_id) ON DELETE RESTRICT,
    -- Owner snapshot taken at creation; rewritten only on consolidation.
    leader_name     TEXT NOT NULL,
    leader_document TEXT,
    leader_phone    TEXT,
    created_at      TEXT NOT NULL
);

-- Append-only. Rows leave only by cascade from their meeting.
CREATE TABLE IF NOT EXISTS attendees (
    attendee_id TEXT PRIMARY KEY,
    meeting_id  TEXT NOT NULL REFERENCES meetings(meeting_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    surname     TEXT NOT NULL,
    document    TEXT NOT NULL,
    phone       TEXT NOT NULL,
    email       TEXT,
    address     TEXT,
    consent     INTEGER NOT NULL,
    signature   TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (meeting_id, document)
);

CREATE TABLE IF NOT EXISTS voters (
    voter_id     TEXT PRIMARY KEY,
    leader_id    TEXT NOT NULL REFERENCES identities(identity_id) ON DELETE RESTRICT,
    name         TEXT NOT NULL,
    surname      TEXT NOT NULL,
    document     TEXT NOT NULL,
    phone        TEXT,
    email        TEXT,
    address      TEXT,
    region       TEXT,
    locality     TEXT,
    district     TEXT,
    voting_site  TEXT,
    voting_table TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (leader_id, document)
);

CREATE INDEX IF NOT EXISTS identities_document_idx ON identities(document);
CREATE INDEX IF NOT EXISTS identities_manager_idx  ON identities(manager_id);
CREATE INDEX IF NOT EXISTS meetings_leader_idx     ON meetings(leader_id);
CREATE INDEX IF NOT EXISTS meetings_scheduled_idx  ON meetings(scheduled_at);
CREATE INDEX IF NOT EXISTS attendees_document_idx  ON attendees(document);

PRAGMA user_version = 1;
";
