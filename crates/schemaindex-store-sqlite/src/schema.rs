//! SQL schema for the registry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organizations (
    organization_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    slug            TEXT NOT NULL UNIQUE,
    created_by      TEXT NOT NULL REFERENCES users(user_id),
    created_at      TEXT NOT NULL
);

-- One row per user, created on first change.
CREATE TABLE IF NOT EXISTS profiles (
    user_id         TEXT PRIMARY KEY REFERENCES users(user_id),
    organization_id TEXT REFERENCES organizations(organization_id)
);

CREATE TABLE IF NOT EXISTS schemas (
    schema_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    created_by   TEXT NOT NULL REFERENCES users(user_id),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    published_at TEXT              -- NULL until published
);

CREATE TABLE IF NOT EXISTS schema_refs (
    ref_id     TEXT PRIMARY KEY,
    schema_id  TEXT NOT NULL REFERENCES schemas(schema_id) ON DELETE CASCADE,
    url        TEXT NOT NULL,
    name       TEXT,
    format     TEXT,               -- FormatTag, lowercase
    created_by TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documentation_items (
    item_id     TEXT PRIMARY KEY,
    schema_id   TEXT NOT NULL REFERENCES schemas(schema_id) ON DELETE CASCADE,
    url         TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    role        TEXT,              -- 'readme' | 'license' | 'rfc' | 'w3c'
    format      TEXT,              -- 'markdown' | 'plaintext'
    created_by  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS permanent_urls (
    permanent_url_id TEXT PRIMARY KEY,
    url              TEXT NOT NULL UNIQUE,
    schema_id        TEXT NOT NULL REFERENCES schemas(schema_id) ON DELETE CASCADE,
    target_kind      TEXT NOT NULL,   -- 'schema' | 'schema_ref'
    target_id        TEXT NOT NULL,
    created_by       TEXT NOT NULL REFERENCES users(user_id),
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS schemas_published_idx   ON schemas(published_at);
CREATE INDEX IF NOT EXISTS schemas_owner_idx       ON schemas(created_by);
CREATE INDEX IF NOT EXISTS schema_refs_schema_idx  ON schema_refs(schema_id);
CREATE INDEX IF NOT EXISTS doc_items_schema_idx    ON documentation_items(schema_id);
CREATE INDEX IF NOT EXISTS permanent_urls_target_idx ON permanent_urls(target_id);

PRAGMA user_version = 1;
";
