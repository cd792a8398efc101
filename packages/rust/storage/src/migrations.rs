//! SQL migration definitions for the GuideVault database.
//!
//! Migrations are applied in order on database open. Table names come from
//! the `[stores]` config section, so the SQL is rendered per migration.

/// A database migration with a version and rendered SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: String,
}

/// All migrations, in ascending version order, rendered for the configured
/// table names.
pub(crate) fn all_migrations(questions_table: &str, records_table: &str) -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: question lookup + answer records",
        sql: format!(
            r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Question lookup table: one row per distinct (name, label) pair
CREATE TABLE IF NOT EXISTS {questions_table} (
    name                 TEXT NOT NULL,
    label                TEXT NOT NULL,
    template_id          TEXT NOT NULL,
    template_name        TEXT,
    template_status      TEXT,
    template_description TEXT,
    created_at           TEXT NOT NULL,
    PRIMARY KEY (name, label)
);

CREATE INDEX IF NOT EXISTS idx_{questions_table}_name ON {questions_table}(name);

-- Answer records: one row per completed guide submission
CREATE TABLE IF NOT EXISTS {records_table} (
    origin_id   TEXT PRIMARY KEY,
    record_json TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    expires_at  INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{records_table}_expires ON {records_table}(expires_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#
        ),
    }]
}
