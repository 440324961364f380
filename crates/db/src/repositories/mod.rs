use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use moveline_core::domain::booking::{Booking, BookingId};
use moveline_core::domain::schedule::Slot;

pub mod booking;
pub mod memory;
pub mod schedule;

pub use booking::SqlBookingRepository;
pub use memory::{InMemoryBookingRepository, InMemoryScheduleStore};
pub use schedule::SqlScheduleStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

/// Durable store of confirmed bookings. `insert` is the single write that
/// defines "booking exists"; a `(move_date, slot)` collision surfaces as
/// `RepositoryError::Duplicate`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    async fn holds_slot(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError>;
    async fn set_calendar_synced(
        &self,
        id: &BookingId,
        synced: bool,
    ) -> Result<(), RepositoryError>;
}

/// One independent crew calendar. A slot is offered to callers only when it
/// is free in every configured store.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    fn name(&self) -> &str;
    async fn is_booked(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError>;
    async fn add_entry(
        &self,
        date: NaiveDate,
        slot: Slot,
        title: &str,
    ) -> Result<(), RepositoryError>;
}
