use std::sync::Arc;

use tracing::{debug, warn};

use moveline_core::domain::booking::Booking;
use moveline_core::domain::session::CallSession;
use moveline_core::pricing::QuoteBreakdown;

use crate::channels::{ChannelError, EmailChannel, OutboundMessage, SmsChannel};
use crate::templates::Templates;

/// Per-dispatch accounting, returned so operators can see what went out.
/// Failures never propagate past the dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: Vec<String>,
    pub failed: Vec<String>,
}

impl DispatchReport {
    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct NotificationDispatcher {
    email: Arc<dyn EmailChannel>,
    sms: Arc<dyn SmsChannel>,
    templates: Templates,
    operations_email: String,
    booking_link_base_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn EmailChannel>,
        sms: Arc<dyn SmsChannel>,
        templates: Templates,
        operations_email: impl Into<String>,
        booking_link_base_url: impl Into<String>,
    ) -> Self {
        Self {
            email,
            sms,
            templates,
            operations_email: operations_email.into(),
            booking_link_base_url: booking_link_base_url.into(),
        }
    }

    /// Confirmation fan-out after a booking write: email + SMS confirmation
    /// and the payment-link text. Fire-and-forget per channel.
    pub async fn booking_confirmation(&self, booking: &Booking) -> DispatchReport {
        let mut report = DispatchReport::default();
        let call_id = booking.originating_call_id.0.as_str();
        let booking_id = booking.id.0.as_str();

        match self.templates.booking_confirmation_email(booking) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: booking.customer.email.clone(),
                    subject: Some(format!("Your Moveline booking {}", booking.id.0)),
                    body,
                };
                self.send_email("booking_confirmation", call_id, booking_id, &message, &mut report)
                    .await;
            }
            Err(error) => self.record_render_failure(
                "booking_confirmation_email",
                call_id,
                booking_id,
                &error,
                &mut report,
            ),
        }

        match self.templates.booking_confirmation_sms(booking) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: booking.customer.phone.clone(),
                    subject: None,
                    body,
                };
                self.send_sms("booking_confirmation", call_id, booking_id, &message, &mut report)
                    .await;
            }
            Err(error) => self.record_render_failure(
                "booking_confirmation_sms",
                call_id,
                booking_id,
                &error,
                &mut report,
            ),
        }

        let payment_url = format!("{}/pay/{}", self.booking_link_base_url, booking.id.0);
        match self.templates.payment_link_sms(booking, &payment_url) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: booking.customer.phone.clone(),
                    subject: None,
                    body,
                };
                self.send_sms("payment_link", call_id, booking_id, &message, &mut report).await;
            }
            Err(error) => self.record_render_failure(
                "payment_link_sms",
                call_id,
                booking_id,
                &error,
                &mut report,
            ),
        }

        report
    }

    pub async fn quote_email(
        &self,
        to: &str,
        quote: &QuoteBreakdown,
        call_id: &str,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        match self.templates.quote_email(quote) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: to.to_owned(),
                    subject: Some("Your Moveline moving estimate".to_owned()),
                    body,
                };
                self.send_email("quote_email", call_id, "unknown", &message, &mut report).await;
            }
            Err(error) => {
                self.record_render_failure("quote_email", call_id, "unknown", &error, &mut report)
            }
        }
        report
    }

    pub async fn booking_link(&self, to_phone: &str, call_id: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        let booking_url = format!("{}/book", self.booking_link_base_url);
        match self.templates.booking_link_sms(&booking_url) {
            Ok(body) => {
                let message =
                    OutboundMessage { to: to_phone.to_owned(), subject: None, body };
                self.send_sms("booking_link", call_id, "unknown", &message, &mut report).await;
            }
            Err(error) => {
                self.record_render_failure("booking_link_sms", call_id, "unknown", &error, &mut report)
            }
        }
        report
    }

    pub async fn cancellation(&self, booking: &Booking) -> DispatchReport {
        let mut report = DispatchReport::default();
        let call_id = booking.originating_call_id.0.as_str();
        match self.templates.cancellation_email(booking) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: booking.customer.email.clone(),
                    subject: Some(format!("Moveline booking {} cancelled", booking.id.0)),
                    body,
                };
                self.send_email("cancellation", call_id, &booking.id.0, &message, &mut report)
                    .await;
            }
            Err(error) => self.record_render_failure(
                "cancellation_email",
                call_id,
                &booking.id.0,
                &error,
                &mut report,
            ),
        }
        report
    }

    pub async fn reschedule(&self, booking: &Booking) -> DispatchReport {
        let mut report = DispatchReport::default();
        let call_id = booking.originating_call_id.0.as_str();
        match self.templates.reschedule_email(booking) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: booking.customer.email.clone(),
                    subject: Some(format!("Moveline booking {} rescheduled", booking.id.0)),
                    body,
                };
                self.send_email("reschedule", call_id, &booking.id.0, &message, &mut report).await;
            }
            Err(error) => self.record_render_failure(
                "reschedule_email",
                call_id,
                &booking.id.0,
                &error,
                &mut report,
            ),
        }
        report
    }

    /// Operator-facing transcript, sent when a session reaches a terminal
    /// stage.
    pub async fn call_transcript(&self, session: &CallSession) -> DispatchReport {
        let mut report = DispatchReport::default();
        let call_id = session.call_id.0.as_str();
        match self.templates.transcript_email(session) {
            Ok(body) => {
                let message = OutboundMessage {
                    to: self.operations_email.clone(),
                    subject: Some(format!("Call transcript {call_id}")),
                    body,
                };
                self.send_email("transcript", call_id, "unknown", &message, &mut report).await;
            }
            Err(error) => {
                self.record_render_failure("transcript_email", call_id, "unknown", &error, &mut report)
            }
        }
        report
    }

    async fn send_email(
        &self,
        template: &str,
        call_id: &str,
        booking_id: &str,
        message: &OutboundMessage,
        report: &mut DispatchReport,
    ) {
        match self.email.send_email(message).await {
            Ok(()) => {
                debug!(
                    event_name = "notify.email.sent",
                    template,
                    correlation_id = call_id,
                    call_id,
                    booking_id,
                    "notification email sent"
                );
                report.sent.push(format!("email:{template}"));
            }
            Err(error) => {
                self.log_channel_failure("email", template, call_id, booking_id, &error);
                report.failed.push(format!("email:{template}"));
            }
        }
    }

    async fn send_sms(
        &self,
        template: &str,
        call_id: &str,
        booking_id: &str,
        message: &OutboundMessage,
        report: &mut DispatchReport,
    ) {
        match self.sms.send_sms(message).await {
            Ok(()) => {
                debug!(
                    event_name = "notify.sms.sent",
                    template,
                    correlation_id = call_id,
                    call_id,
                    booking_id,
                    "notification sms sent"
                );
                report.sent.push(format!("sms:{template}"));
            }
            Err(error) => {
                self.log_channel_failure("sms", template, call_id, booking_id, &error);
                report.failed.push(format!("sms:{template}"));
            }
        }
    }

    fn log_channel_failure(
        &self,
        channel: &str,
        template: &str,
        call_id: &str,
        booking_id: &str,
        error: &ChannelError,
    ) {
        warn!(
            event_name = "notify.channel.failed",
            channel,
            template,
            correlation_id = call_id,
            call_id,
            booking_id,
            error = %error,
            "notification send failed; booking outcome is unaffected"
        );
    }

    fn record_render_failure(
        &self,
        template: &str,
        call_id: &str,
        booking_id: &str,
        error: &tera::Error,
        report: &mut DispatchReport,
    ) {
        warn!(
            event_name = "notify.template.render_failed",
            template,
            correlation_id = call_id,
            call_id,
            booking_id,
            error = %error,
            "notification template failed to render"
        );
        report.failed.push(format!("render:{template}"));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use moveline_core::domain::booking::{
        Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
    };
    use moveline_core::domain::schedule::Slot;
    use moveline_core::domain::service::{Route, ServiceCategory};
    use moveline_core::domain::session::CallId;
    use moveline_core::pricing::{price_move, QuoteInput};

    use crate::channels::{RecordingEmailChannel, RecordingSmsChannel};
    use crate::templates::Templates;

    use super::NotificationDispatcher;

    fn booking_fixture() -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId("MB-7KQ2XN".to_owned()),
            customer: CustomerDetails {
                name: "Jordan Avery".to_owned(),
                phone: "+15125550123".to_owned(),
                email: "jordan@example.com".to_owned(),
            },
            schedule: BookingSchedule {
                date: NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date"),
                slot: Slot::Morning,
            },
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
            originating_call_id: CallId("CA-1".to_owned()),
            calendar_synced: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn dispatcher(
        email: RecordingEmailChannel,
        sms: RecordingSmsChannel,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::new(email),
            Arc::new(sms),
            Templates::new().expect("templates compile"),
            "ops@moveline.example",
            "https://book.moveline.example",
        )
    }

    #[tokio::test]
    async fn confirmation_fans_out_to_email_and_sms() {
        let email = RecordingEmailChannel::default();
        let sms = RecordingSmsChannel::default();
        let dispatcher = dispatcher(email.clone(), sms.clone());

        let report = dispatcher.booking_confirmation(&booking_fixture()).await;

        assert!(report.all_sent());
        assert_eq!(email.sent().len(), 1);
        assert_eq!(sms.sent().len(), 2, "confirmation and payment link texts");
        assert!(sms.sent()[1].body.contains("/pay/MB-7KQ2XN"));
    }

    #[tokio::test]
    async fn failing_channel_is_reported_but_not_fatal() {
        let email = RecordingEmailChannel::failing();
        let sms = RecordingSmsChannel::default();
        let dispatcher = dispatcher(email, sms.clone());

        let report = dispatcher.booking_confirmation(&booking_fixture()).await;

        assert!(!report.all_sent());
        assert_eq!(report.failed, vec!["email:booking_confirmation".to_owned()]);
        assert_eq!(sms.sent().len(), 2, "sms sends proceed despite email failure");
    }

    #[tokio::test]
    async fn cancellation_and_reschedule_notices_go_to_the_customer() {
        let email = RecordingEmailChannel::default();
        let sms = RecordingSmsChannel::default();
        let dispatcher = dispatcher(email.clone(), sms);
        let booking = booking_fixture();

        assert!(dispatcher.cancellation(&booking).await.all_sent());
        assert!(dispatcher.reschedule(&booking).await.all_sent());

        let sent = email.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "jordan@example.com");
        assert!(sent[0].body.contains("cancelled"));
        assert!(sent[1].body.contains("has moved to March 20, 2026"));
    }

    #[tokio::test]
    async fn booking_link_goes_out_by_sms() {
        let email = RecordingEmailChannel::default();
        let sms = RecordingSmsChannel::default();
        let dispatcher = dispatcher(email, sms.clone());

        let report = dispatcher.booking_link("+15125550123", "CA-2").await;

        assert!(report.all_sent());
        assert_eq!(sms.sent().len(), 1);
        assert!(sms.sent()[0].body.contains("https://book.moveline.example/book"));
    }
}
