//! Booking-coordination behavior against the real SQLite stack: the
//! uniqueness constraint, not the availability re-check, decides who wins a
//! contested slot.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use moveline_agent::availability::{AvailabilityChecker, BookingLedgerStore};
use moveline_agent::booking::BookingCoordinator;
use moveline_core::domain::booking::{
    Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
};
use moveline_core::domain::schedule::{Slot, SlotOffer};
use moveline_core::domain::service::{Route, ServiceCategory};
use moveline_core::domain::session::CallId;
use moveline_core::errors::BookingError;
use moveline_core::pricing::{price_move, QuoteInput};
use moveline_db::repositories::{BookingRepository, ScheduleStore, SqlScheduleStore};
use moveline_db::{connect_with_settings, migrations, DbPool, SqlBookingRepository};
use moveline_notify::{
    NotificationDispatcher, RecordingEmailChannel, RecordingSmsChannel, Templates,
};

async fn pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

fn dispatcher() -> Arc<NotificationDispatcher> {
    Arc::new(NotificationDispatcher::new(
        Arc::new(RecordingEmailChannel::default()),
        Arc::new(RecordingSmsChannel::default()),
        Templates::new().expect("templates compile"),
        "ops@moveline.example",
        "https://book.moveline.example",
    ))
}

fn booking(reference: &str, call: &str, date: NaiveDate, slot: Slot) -> Booking {
    let now = Utc::now();
    Booking {
        id: BookingId(reference.to_owned()),
        customer: CustomerDetails {
            name: "Jordan Avery".to_owned(),
            phone: "+15125550123".to_owned(),
            email: "jordan@example.com".to_owned(),
        },
        schedule: BookingSchedule { date, slot },
        service: ServiceDescriptor::new(ServiceCategory::FullService, 2),
        route: Route {
            pickup: "100 Elm St, Austin".to_owned(),
            delivery: "200 Oak St, Round Rock".to_owned(),
            distance_miles: Decimal::from(18),
            drive_time_minutes: 25,
        },
        price: price_move(&QuoteInput {
            category: ServiceCategory::FullService,
            distance_miles: Decimal::from(18),
            crew_size: 2,
            hours: 4,
        }),
        status: BookingStatus::Confirmed,
        source: "voice".to_owned(),
        originating_call_id: CallId(call.to_owned()),
        calendar_synced: false,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn concurrent_callers_race_and_exactly_one_wins() {
    let pool = pool().await;
    let bookings: Arc<dyn BookingRepository> = Arc::new(SqlBookingRepository::new(pool.clone()));

    // A checker with no stores always says yes, so both callers pass the
    // pre-insert re-check and the unique index settles it.
    let coordinator = Arc::new(BookingCoordinator::new(
        bookings,
        AvailabilityChecker::new(Vec::new()),
        Vec::new(),
        dispatcher(),
    ));

    let date = NaiveDate::from_ymd_opt(2026, 6, 12).expect("valid date");
    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator.create_booking(booking("MB-RACE0A", "CA-A", date, Slot::Morning)).await
        })
    };
    let second = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator.create_booking(booking("MB-RACE0B", "CA-B", date, Slot::Morning)).await
        })
    };

    let outcomes = [first.await.expect("task"), second.await.expect("task")];
    let wins = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let losses = outcomes
        .iter()
        .filter(|outcome| {
            matches!(outcome, Err(BookingError::SlotNoLongerAvailable { .. }))
        })
        .count();

    assert_eq!(wins, 1, "exactly one caller may hold the slot");
    assert_eq!(losses, 1, "the loser sees the slot as no longer available");
}

#[tokio::test]
async fn winning_booking_closes_the_slot_for_later_checks() {
    let pool = pool().await;
    let bookings: Arc<dyn BookingRepository> = Arc::new(SqlBookingRepository::new(pool.clone()));
    let crew: Arc<dyn ScheduleStore> =
        Arc::new(SqlScheduleStore::new("crew-alpha", pool.clone()));
    let stores: Vec<Arc<dyn ScheduleStore>> =
        vec![Arc::new(BookingLedgerStore::new(bookings.clone())), crew.clone()];

    let coordinator = BookingCoordinator::new(
        bookings,
        AvailabilityChecker::new(stores.clone()),
        vec![crew],
        dispatcher(),
    );

    let date = NaiveDate::from_ymd_opt(2026, 6, 13).expect("valid date");
    coordinator
        .create_booking(booking("MB-POST0A", "CA-C", date, Slot::Afternoon))
        .await
        .expect("booking succeeds");

    let checker = AvailabilityChecker::new(stores);
    let status = checker.check_slot(date, Slot::Afternoon).await;
    assert!(!status.available);

    // The other window stays open, so a follow-up caller gets a single-slot
    // offer rather than a transfer.
    assert_eq!(checker.available_slots(date).await, Some(SlotOffer::Only(Slot::Morning)));
}

#[tokio::test]
async fn crew_calendar_conflict_blocks_the_slot_before_any_booking_exists() {
    let pool = pool().await;
    let bookings: Arc<dyn BookingRepository> = Arc::new(SqlBookingRepository::new(pool.clone()));
    let crew: Arc<dyn ScheduleStore> =
        Arc::new(SqlScheduleStore::new("crew-alpha", pool.clone()));
    let stores: Vec<Arc<dyn ScheduleStore>> =
        vec![Arc::new(BookingLedgerStore::new(bookings.clone())), crew.clone()];

    let date = NaiveDate::from_ymd_opt(2026, 6, 14).expect("valid date");
    crew.add_entry(date, Slot::Morning, "maintenance hold").await.expect("add entry");

    let coordinator = BookingCoordinator::new(
        bookings,
        AvailabilityChecker::new(stores),
        vec![crew],
        dispatcher(),
    );

    let error = coordinator
        .create_booking(booking("MB-HOLD0A", "CA-D", date, Slot::Morning))
        .await
        .expect_err("held slot must be rejected");

    assert!(matches!(
        error,
        BookingError::SlotNoLongerAvailable { ref store, .. } if store == "crew-alpha"
    ));
}
