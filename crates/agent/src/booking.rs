use std::sync::Arc;

use tracing::{info, warn};

use moveline_core::domain::booking::{Booking, BookingId};
use moveline_core::errors::BookingError;
use moveline_db::repositories::{BookingRepository, RepositoryError, ScheduleStore};
use moveline_notify::NotificationDispatcher;

use crate::availability::AvailabilityChecker;

/// Turns an accepted quote + slot into a durable, notified booking.
///
/// The repository insert is the single point that defines "booking exists";
/// its (date, slot) uniqueness constraint settles races between concurrent
/// callers. Calendar mirroring and notifications are best-effort mirrors
/// that never roll the booking back.
pub struct BookingCoordinator {
    bookings: Arc<dyn BookingRepository>,
    checker: AvailabilityChecker,
    mirrors: Vec<Arc<dyn ScheduleStore>>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl BookingCoordinator {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        checker: AvailabilityChecker,
        mirrors: Vec<Arc<dyn ScheduleStore>>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self { bookings, checker, mirrors, dispatcher }
    }

    pub async fn create_booking(&self, booking: Booking) -> Result<BookingId, BookingError> {
        let date = booking.schedule.date;
        let slot = booking.schedule.slot;
        let call_id = booking.originating_call_id.0.clone();

        // Defense against staleness since the slot was first offered. The
        // insert below still decides the race.
        let status = self.checker.check_slot(date, slot).await;
        if !status.available {
            return Err(BookingError::SlotNoLongerAvailable {
                date,
                slot,
                store: status.reason.unwrap_or_else(|| "unknown".to_owned()),
            });
        }

        match self.bookings.insert(booking.clone()).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate(_)) => {
                return Err(BookingError::SlotNoLongerAvailable {
                    date,
                    slot,
                    store: "booking-ledger".to_owned(),
                });
            }
            Err(error) => return Err(BookingError::Persistence(error.to_string())),
        }

        info!(
            event_name = "booking.record.created",
            correlation_id = %call_id,
            call_id = %call_id,
            booking_id = %booking.id.0,
            date = %date,
            slot = slot.as_str(),
            total = %booking.price.total,
            "booking durably recorded"
        );

        let synced = self.mirror_to_calendars(&booking).await;
        if synced {
            if let Err(error) = self.bookings.set_calendar_synced(&booking.id, true).await {
                warn!(
                    event_name = "booking.calendar_flag.update_failed",
                    correlation_id = %call_id,
                    call_id = %call_id,
                    booking_id = %booking.id.0,
                    error = %error,
                    "could not record calendar sync state"
                );
            }
        }

        let report = self.dispatcher.booking_confirmation(&booking).await;
        if !report.all_sent() {
            warn!(
                event_name = "booking.notifications.partial",
                correlation_id = %call_id,
                call_id = %call_id,
                booking_id = %booking.id.0,
                failed = report.failed.join(","),
                "some confirmation notifications failed; booking stands"
            );
        }

        Ok(booking.id)
    }

    /// Mirrors the booking into each crew calendar. Failures flag the
    /// booking as calendar-unsynced; they never fail the booking.
    async fn mirror_to_calendars(&self, booking: &Booking) -> bool {
        let mut synced = true;
        for mirror in &self.mirrors {
            let result = mirror
                .add_entry(booking.schedule.date, booking.schedule.slot, &booking.id.0)
                .await;
            match result {
                Ok(()) | Err(RepositoryError::Duplicate(_)) => {}
                Err(error) => {
                    synced = false;
                    warn!(
                        event_name = "booking.calendar_mirror.failed",
                        correlation_id = %booking.originating_call_id.0,
                        call_id = %booking.originating_call_id.0,
                        booking_id = %booking.id.0,
                        store = mirror.name(),
                        error = %error,
                        "calendar mirror failed; booking flagged unsynced"
                    );
                }
            }
        }
        synced
    }
}
