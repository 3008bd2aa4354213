use crate::error::CoreError;
use crate::models::{checkpoint_key, SeriesCheckpoint};
use crate::repository::tasks::parse_id;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct CheckpointRecord {
    parent_id: String,
    last_occurrence: NaiveDate,
    rule: String,
}

impl TryFrom<CheckpointRecord> for SeriesCheckpoint {
    type Error = CoreError;

    fn try_from(record: CheckpointRecord) -> Result<Self, Self::Error> {
        Ok(SeriesCheckpoint {
            parent_id: parse_id(&record.parent_id)?,
            last_occurrence: record.last_occurrence,
            rule: serde_json::from_str(&record.rule)?,
        })
    }
}

#[async_trait]
impl super::CheckpointRepository for SqliteRepository {
    async fn save_checkpoint(&self, checkpoint: &SeriesCheckpoint) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO series_checkpoints (key, parent_id, last_occurrence, rule, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(key) DO UPDATE SET
                last_occurrence = excluded.last_occurrence,
                rule = excluded.rule,
                updated_at = excluded.updated_at"#,
        )
        .bind(checkpoint.key())
        .bind(checkpoint.parent_id.to_string())
        .bind(checkpoint.last_occurrence)
        .bind(serde_json::to_string(&checkpoint.rule)?)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn load_checkpoint(&self, parent_id: Uuid) -> Result<Option<SeriesCheckpoint>, CoreError> {
        let record: Option<CheckpointRecord> = sqlx::query_as(
            "SELECT parent_id, last_occurrence, rule FROM series_checkpoints WHERE key = $1",
        )
        .bind(checkpoint_key(parent_id))
        .fetch_optional(self.pool())
        .await?;
        record.map(SeriesCheckpoint::try_from).transpose()
    }

    async fn delete_checkpoint(&self, parent_id: Uuid) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM series_checkpoints WHERE key = $1")
            .bind(checkpoint_key(parent_id))
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn list_checkpoints(&self) -> Result<Vec<SeriesCheckpoint>, CoreError> {
        let records: Vec<CheckpointRecord> = sqlx::query_as(
            "SELECT parent_id, last_occurrence, rule FROM series_checkpoints ORDER BY last_occurrence",
        )
        .fetch_all(self.pool())
        .await?;
        records.into_iter().map(SeriesCheckpoint::try_from).collect()
    }
}
