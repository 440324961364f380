use chrono::{NaiveDate, Utc};

use moveline_core::domain::schedule::Slot;

use super::{RepositoryError, ScheduleStore};
use crate::DbPool;

/// Crew calendar backed by the shared `schedule_entries` table, partitioned
/// by store name.
pub struct SqlScheduleStore {
    name: String,
    pool: DbPool,
}

impl SqlScheduleStore {
    pub fn new(name: impl Into<String>, pool: DbPool) -> Self {
        Self { name: name.into(), pool }
    }
}

#[async_trait::async_trait]
impl ScheduleStore for SqlScheduleStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_booked(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM schedule_entries \
             WHERE store = ?1 AND move_date = ?2 AND slot = ?3",
        )
        .bind(&self.name)
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(slot.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn add_entry(
        &self,
        date: NaiveDate,
        slot: Slot,
        title: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO schedule_entries (store, move_date, slot, title, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&self.name)
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(slot.as_str())
        .bind(title)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                Err(RepositoryError::Duplicate(format!(
                    "store {} already has an entry for {} {}",
                    self.name,
                    date,
                    slot.as_str()
                )))
            }
            Err(error) => Err(RepositoryError::Database(error)),
        }
    }
}
