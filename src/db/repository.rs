//! Database repository for the roster document.
//!
//! The whole roster is one JSON document; every write replaces it and bumps
//! the revision in the same transaction.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{RevisionInfo, RosterSnapshot};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    // ==================== DOCUMENT OPERATIONS ====================

    /// Get the roster document, `None` if it has never been written.
    pub async fn get_document(&self) -> Result<Option<RosterSnapshot>, AppError> {
        let row = sqlx::query("SELECT body FROM roster_document WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// Overwrite the roster document and return the new revision.
    pub async fn put_document(&self, snapshot: &RosterSnapshot) -> Result<i64, AppError> {
        let body = serde_json::to_string(snapshot)?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO roster_document (id, body, updated_at) VALUES (1, ?, ?)
               ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at"#,
        )
        .bind(&body)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?;
        let revision_id: i64 = row.get("revision_id");

        tx.commit().await?;

        tracing::debug!(revision_id, "Roster document written");
        Ok(revision_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::RosterState;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    #[tokio::test]
    async fn test_empty_store_has_no_document() {
        let (repo, _dir) = repo().await;
        assert_eq!(repo.get_document().await.unwrap(), None);
        assert_eq!(repo.get_revision_id().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_bumps_revision() {
        let (repo, _dir) = repo().await;
        let mut state = RosterState::seeded();
        let first = state.to_snapshot(Utc::now());

        assert_eq!(repo.put_document(&first).await.unwrap(), 1);
        assert_eq!(repo.get_document().await.unwrap(), Some(first));

        state.squads.clear();
        let second = state.to_snapshot(Utc::now());
        assert_eq!(repo.put_document(&second).await.unwrap(), 2);
        assert_eq!(repo.get_document().await.unwrap(), Some(second));

        let info = repo.get_revision_info().await.unwrap();
        assert_eq!(info.revision_id, 2);
    }
}
