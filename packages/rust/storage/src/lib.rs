//! libSQL storage layer for the two GuideVault tables.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the question
//! lookup table (written by the extractor, read by the enricher) and the
//! answer record table (written once per submission, evicted by TTL).
//!
//! Table names come from the `[stores]` config section; all access is
//! independent keyed reads/writes with no multi-row transactions.

mod migrations;

use std::collections::BTreeMap;

use chrono::Utc;
use guidevault_shared::{GuideVaultError, QuestionEntry, Result, StoresConfig, expand_home};
use libsql::{Connection, Database, params};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    questions_table: String,
    records_table: String,
}

impl Storage {
    /// Open or create the database described by the `[stores]` config.
    pub async fn open(stores: &StoresConfig) -> Result<Self> {
        let path = expand_home(&stores.db_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GuideVaultError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            questions_table: stores.questions_table.clone(),
            records_table: stores.records_table.clone(),
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations(&self.questions_table, &self.records_table) {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(&migration.sql)
                    .await
                    .map_err(|e| {
                        GuideVaultError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Question lookup operations
    // -----------------------------------------------------------------------

    /// Upsert one `(name, label)` pair.
    ///
    /// Re-running with unchanged template data leaves the row byte-identical:
    /// `created_at` keeps its original value on conflict.
    pub async fn upsert_question(&self, entry: &QuestionEntry) -> Result<()> {
        let sql = format!(
            "INSERT INTO {t} (name, label, template_id, template_name, template_status, template_description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(name, label) DO UPDATE SET
               template_id = excluded.template_id,
               template_name = excluded.template_name,
               template_status = excluded.template_status,
               template_description = excluded.template_description",
            t = self.questions_table
        );
        self.conn
            .execute(
                &sql,
                params![
                    entry.name.as_str(),
                    entry.label.as_str(),
                    entry.template_id.as_str(),
                    entry.template_name.as_deref(),
                    entry.template_status.as_deref(),
                    entry.template_description.as_deref(),
                    entry.created_at.as_str(),
                ],
            )
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Look up the display label for a question name.
    ///
    /// When a name maps to multiple labels the lexicographically first label
    /// wins, so repeated lookups are deterministic.
    pub async fn get_label(&self, name: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT label FROM {t} WHERE name = ?1 ORDER BY label ASC LIMIT 1",
            t = self.questions_table
        );
        let mut rows = self
            .conn
            .query(&sql, params![name])
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let label: String = row
                    .get(0)
                    .map_err(|e| GuideVaultError::Storage(e.to_string()))?;
                Ok(Some(label))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(GuideVaultError::Storage(e.to_string())),
        }
    }

    /// List the full lookup table, ordered by `(name, label)`.
    pub async fn list_questions(&self) -> Result<Vec<QuestionEntry>> {
        let sql = format!(
            "SELECT name, label, template_id, template_name, template_status, template_description, created_at
             FROM {t} ORDER BY name, label",
            t = self.questions_table
        );
        let mut rows = self
            .conn
            .query(&sql, params![])
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_question(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Answer record operations
    // -----------------------------------------------------------------------

    /// Write one enriched answer record keyed by the originating session id.
    ///
    /// `expires_at` is the TTL horizon in epoch seconds; the record is
    /// eligible for [`Storage::purge_expired`] after that instant.
    pub async fn put_record(
        &self,
        origin_id: &str,
        record: &BTreeMap<String, String>,
        expires_at: i64,
    ) -> Result<()> {
        let record_json = serde_json::to_string(record)
            .map_err(|e| GuideVaultError::Storage(format!("record serialization: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let sql = format!(
            "INSERT INTO {t} (origin_id, record_json, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(origin_id) DO UPDATE SET
               record_json = excluded.record_json,
               created_at = excluded.created_at,
               expires_at = excluded.expires_at",
            t = self.records_table
        );
        self.conn
            .execute(
                &sql,
                params![origin_id, record_json.as_str(), now.as_str(), expires_at],
            )
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Read back an answer record by origin session id.
    pub async fn get_record(&self, origin_id: &str) -> Result<Option<BTreeMap<String, String>>> {
        let sql = format!(
            "SELECT record_json FROM {t} WHERE origin_id = ?1",
            t = self.records_table
        );
        let mut rows = self
            .conn
            .query(&sql, params![origin_id])
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| GuideVaultError::Storage(e.to_string()))?;
                let record = serde_json::from_str(&json)
                    .map_err(|e| GuideVaultError::Storage(format!("record decode: {e}")))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(GuideVaultError::Storage(e.to_string())),
        }
    }

    /// Delete records whose TTL horizon has passed. Returns rows removed.
    pub async fn purge_expired(&self, now_epoch: i64) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {t} WHERE expires_at <= ?1",
            t = self.records_table
        );
        let removed = self
            .conn
            .execute(&sql, params![now_epoch])
            .await
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?;
        if removed > 0 {
            tracing::info!(removed, "purged expired answer records");
        }
        Ok(removed)
    }
}

/// Convert a database row to a [`QuestionEntry`].
fn row_to_question(row: &libsql::Row) -> Result<QuestionEntry> {
    Ok(QuestionEntry {
        name: row
            .get::<String>(0)
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?,
        label: row
            .get::<String>(1)
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?,
        template_id: row
            .get::<String>(2)
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?,
        template_name: row.get::<String>(3).ok(),
        template_status: row.get::<String>(4).ok(),
        template_description: row.get::<String>(5).ok(),
        created_at: row
            .get::<String>(6)
            .map_err(|e| GuideVaultError::Storage(e.to_string()))?,
    })
}
