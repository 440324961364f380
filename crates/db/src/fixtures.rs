use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use moveline_core::domain::schedule::Slot;

use crate::repositories::{RepositoryError, ScheduleStore, SqlScheduleStore};
use crate::DbPool;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub stores: Vec<String>,
    pub entries_created: u32,
    pub entries_skipped: u32,
}

/// Deterministic demo calendar: each store gets a handful of taken slots in
/// the near horizon so the conflict and single-slot paths can be exercised
/// locally. Re-running skips entries that already exist.
pub async fn seed_demo_schedule(
    pool: &DbPool,
    stores: &[String],
) -> Result<SeedResult, RepositoryError> {
    let today = Utc::now().date_naive();
    let mut result = SeedResult { stores: stores.to_vec(), ..SeedResult::default() };

    for (store_index, store_name) in stores.iter().enumerate() {
        let store = SqlScheduleStore::new(store_name.clone(), pool.clone());
        for (date, slot) in demo_entries(today, store_index) {
            match store.add_entry(date, slot, "seeded demo move").await {
                Ok(()) => result.entries_created += 1,
                Err(RepositoryError::Duplicate(_)) => result.entries_skipped += 1,
                Err(error) => return Err(error),
            }
        }
    }

    Ok(result)
}

fn demo_entries(today: NaiveDate, store_index: usize) -> Vec<(NaiveDate, Slot)> {
    let offset = store_index as i64;
    vec![
        // Shared conflict: every store is busy three days out in the morning.
        (today + Duration::days(3), Slot::Morning),
        // Staggered conflicts so some dates have exactly one open slot.
        (today + Duration::days(5 + offset), Slot::Afternoon),
        (today + Duration::days(9 + offset * 2), Slot::Morning),
    ]
}
