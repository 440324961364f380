use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use moveline_core::domain::booking::{Booking, BookingId, BookingStatus};
use moveline_core::domain::schedule::Slot;

use super::{BookingRepository, RepositoryError, ScheduleStore};

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<String, Booking>>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        let collision = bookings.values().any(|existing| {
            existing.status == BookingStatus::Confirmed
                && existing.schedule.date == booking.schedule.date
                && existing.schedule.slot == booking.schedule.slot
        });
        if collision {
            return Err(RepositoryError::Duplicate(format!(
                "slot {} on {} already holds a confirmed booking",
                booking.schedule.slot.as_str(),
                booking.schedule.date
            )));
        }
        bookings.insert(booking.id.0.clone(), booking);
        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id.0).cloned())
    }

    async fn holds_slot(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().any(|booking| {
            booking.status == BookingStatus::Confirmed
                && booking.schedule.date == date
                && booking.schedule.slot == slot
        }))
    }

    async fn set_calendar_synced(
        &self,
        id: &BookingId,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        if let Some(booking) = bookings.get_mut(&id.0) {
            booking.calendar_synced = synced;
        }
        Ok(())
    }
}

pub struct InMemoryScheduleStore {
    name: String,
    entries: RwLock<BTreeSet<(NaiveDate, Slot)>>,
}

impl InMemoryScheduleStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: RwLock::new(BTreeSet::new()) }
    }

    pub fn with_entries(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (NaiveDate, Slot)>,
    ) -> Self {
        Self { name: name.into(), entries: RwLock::new(entries.into_iter().collect()) }
    }
}

#[async_trait::async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_booked(&self, date: NaiveDate, slot: Slot) -> Result<bool, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.contains(&(date, slot)))
    }

    async fn add_entry(
        &self,
        date: NaiveDate,
        slot: Slot,
        _title: &str,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        if !entries.insert((date, slot)) {
            return Err(RepositoryError::Duplicate(format!(
                "store {} already has an entry for {} {}",
                self.name,
                date,
                slot.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use moveline_core::domain::booking::{
        Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
    };
    use moveline_core::domain::schedule::Slot;
    use moveline_core::domain::service::{Route, ServiceCategory};
    use moveline_core::domain::session::CallId;
    use moveline_core::pricing::{price_move, QuoteInput};

    use crate::repositories::{
        BookingRepository, InMemoryBookingRepository, InMemoryScheduleStore, RepositoryError,
        ScheduleStore,
    };

    fn booking_fixture(reference: &str, date: NaiveDate, slot: Slot) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId(reference.to_owned()),
            customer: CustomerDetails {
                name: "Riley Chen".to_owned(),
                phone: "+15125550177".to_owned(),
                email: "riley@example.com".to_owned(),
            },
            schedule: BookingSchedule { date, slot },
            service: ServiceDescriptor::new(ServiceCategory::LaborOnly, 2),
            route: Route {
                pickup: "1 A St".to_owned(),
                delivery: "2 B St".to_owned(),
                distance_miles: Decimal::from(10),
                drive_time_minutes: 20,
            },
            price: price_move(&QuoteInput {
                category: ServiceCategory::LaborOnly,
                distance_miles: Decimal::from(10),
                crew_size: 2,
                hours: 3,
            }),
            status: BookingStatus::Confirmed,
            source: "voice".to_owned(),
            originating_call_id: CallId("CA-9".to_owned()),
            calendar_synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn in_memory_booking_repo_round_trip_and_slot_hold() {
        let repo = InMemoryBookingRepository::default();
        let date = NaiveDate::from_ymd_opt(2026, 5, 4).expect("valid date");
        let booking = booking_fixture("MB-MEM111", date, Slot::Morning);

        repo.insert(booking.clone()).await.expect("insert");
        let found = repo.find_by_id(&booking.id).await.expect("find");

        assert_eq!(found, Some(booking));
        assert!(repo.holds_slot(date, Slot::Morning).await.expect("holds"));
        assert!(!repo.holds_slot(date, Slot::Afternoon).await.expect("holds"));
    }

    #[tokio::test]
    async fn in_memory_booking_repo_rejects_slot_collisions() {
        let repo = InMemoryBookingRepository::default();
        let date = NaiveDate::from_ymd_opt(2026, 5, 5).expect("valid date");

        repo.insert(booking_fixture("MB-MEM222", date, Slot::Afternoon)).await.expect("first");
        let error = repo
            .insert(booking_fixture("MB-MEM333", date, Slot::Afternoon))
            .await
            .expect_err("collision");

        assert!(matches!(error, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn in_memory_schedule_store_tracks_entries() {
        let store = InMemoryScheduleStore::with_entries(
            "crew-alpha",
            [(NaiveDate::from_ymd_opt(2026, 5, 6).expect("valid date"), Slot::Morning)],
        );
        let date = NaiveDate::from_ymd_opt(2026, 5, 6).expect("valid date");

        assert_eq!(store.name(), "crew-alpha");
        assert!(store.is_booked(date, Slot::Morning).await.expect("check"));
        assert!(!store.is_booked(date, Slot::Afternoon).await.expect("check"));

        store.add_entry(date, Slot::Afternoon, "MB-MEM444").await.expect("add");
        assert!(store.is_booked(date, Slot::Afternoon).await.expect("check"));
    }
}
