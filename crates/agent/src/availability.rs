use std::sync::Arc;

use chrono::NaiveDate;

use moveline_core::domain::schedule::{Slot, SlotOffer};
use moveline_db::repositories::{BookingRepository, RepositoryError, ScheduleStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotStatus {
    pub slot: Slot,
    pub available: bool,
    /// Name of the store holding the conflict (or failing to answer).
    pub reason: Option<String>,
}

/// Conjunction over every configured schedule store: a slot is offered only
/// when free in all of them. A store that cannot be read counts as a
/// conflict; offering a slot we cannot verify risks a double booking.
pub struct AvailabilityChecker {
    stores: Vec<Arc<dyn ScheduleStore>>,
}

impl AvailabilityChecker {
    pub fn new(stores: Vec<Arc<dyn ScheduleStore>>) -> Self {
        Self { stores }
    }

    pub async fn check_slot(&self, date: NaiveDate, slot: Slot) -> SlotStatus {
        for store in &self.stores {
            match store.is_booked(date, slot).await {
                Ok(false) => continue,
                Ok(true) => {
                    return SlotStatus {
                        slot,
                        available: false,
                        reason: Some(store.name().to_owned()),
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        event_name = "scheduling.store.unreadable",
                        store = store.name(),
                        date = %date,
                        slot = slot.as_str(),
                        error = %error,
                        "schedule store read failed; treating slot as unavailable"
                    );
                    return SlotStatus {
                        slot,
                        available: false,
                        reason: Some(store.name().to_owned()),
                    };
                }
            }
        }
        SlotStatus { slot, available: true, reason: None }
    }

    /// Both slots' status in one call, shaped for the "morning or afternoon"
    /// prompt. `None` means nothing is open that day.
    pub async fn available_slots(&self, date: NaiveDate) -> Option<SlotOffer> {
        let morning = self.check_slot(date, Slot::Morning).await;
        let afternoon = self.check_slot(date, Slot::Afternoon).await;

        match (morning.available, afternoon.available) {
            (true, true) => Some(SlotOffer::Both),
            (true, false) => Some(SlotOffer::Only(Slot::Morning)),
            (false, true) => Some(SlotOffer::Only(Slot::Afternoon)),
            (false, false) => None,
        }
    }
}

/// Presents the booking table itself as a schedule store, so confirmed
/// bookings make their slot unavailable even before any calendar mirror
/// lands. Entries are added through the repository insert, never here.
pub struct BookingLedgerStore {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLedgerStore {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }
}

#[async_trait::async_trait]
impl ScheduleStore for BookingLedgerStore {
    fn name(&self) -> &str {
        "booking-ledger"
    }

    async fn is_booked(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError> {
        self.bookings.holds_slot(date, slot).await
    }

    async fn add_entry(
        &self,
        _date: NaiveDate,
        _slot: Slot,
        _title: &str,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }
}
