use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use moveline_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use moveline_core::domain::booking::{
    Booking, BookingId, BookingSchedule, BookingStatus, CustomerDetails, ServiceDescriptor,
};
use moveline_core::domain::service::{Route, ServiceCategory};
use moveline_core::domain::session::{CallId, CallSession, ExtractionTier};
use moveline_core::errors::BookingError;
use moveline_core::pricing::{crew_for, estimated_hours, PricingEngine, QuoteInput};
use moveline_core::script::engine::ScriptEngine;
use moveline_core::script::states::{
    CallStage, Effect, EffectOutcome, FieldKey, InputExpectation, Reply, ScriptInput,
};
use moveline_notify::NotificationDispatcher;

use crate::availability::AvailabilityChecker;
use crate::booking::BookingCoordinator;
use crate::distance::{resolve_route, DistanceService};
use crate::extractor::{match_menu, FieldExtractor};
use crate::session::SessionStore;

/// Discrete event from the telephony gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundEvent {
    CallStart { call_id: String, caller: String },
    Turn { call_id: String, input: String },
    CallEnd { call_id: String },
}

/// What the gateway should render next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutputAction {
    Say { text: String, gather: bool },
    Transfer { text: String, number: String },
    Hangup { text: String },
}

pub struct RuntimeDeps {
    pub engine: ScriptEngine,
    pub extractor: FieldExtractor,
    pub distance: Arc<dyn DistanceService>,
    pub pricing: Arc<dyn PricingEngine>,
    pub checker: AvailabilityChecker,
    pub coordinator: BookingCoordinator,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub audit: Arc<dyn AuditSink>,
    pub transfer_number: String,
    pub distance_timeout: Duration,
    pub idle_timeout: Duration,
}

/// Turn driver: resolves raw input, applies the script engine, executes
/// requested effects, and commits exactly one session mutation per inbound
/// event. No lock is held across any external call.
pub struct AgentRuntime {
    deps: RuntimeDeps,
    store: SessionStore,
}

// A turn chains at most a handful of system stages (distance, pricing,
// availability, booking); anything past this is a script defect.
const MAX_EFFECT_HOPS: usize = 8;

impl AgentRuntime {
    pub fn new(deps: RuntimeDeps) -> Self {
        Self { deps, store: SessionStore::default() }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn handle_event(&self, event: InboundEvent) -> OutputAction {
        match event {
            InboundEvent::CallStart { call_id, caller } => {
                let call_id = CallId(call_id);
                info!(
                    event_name = "ingress.call.started",
                    correlation_id = %call_id.0,
                    call_id = %call_id.0,
                    booking_id = "unknown",
                    "inbound call started"
                );
                self.deps.audit.emit(AuditEvent::new(
                    Some(call_id.clone()),
                    None,
                    call_id.0.clone(),
                    "call.started",
                    AuditCategory::Ingress,
                    "telephony-gateway",
                    AuditOutcome::Success,
                ));
                let session = self.store.create(&call_id, &caller, Utc::now()).await;
                self.process(session, ScriptInput::CallStart, None).await
            }

            InboundEvent::Turn { call_id, input } => {
                let call_id = CallId(call_id);
                let session = match self.store.snapshot(&call_id).await {
                    Some(session) => session,
                    None => {
                        // First inbound event for this call id; greet as if
                        // the call just started.
                        warn!(
                            event_name = "ingress.turn.unknown_call",
                            correlation_id = %call_id.0,
                            call_id = %call_id.0,
                            booking_id = "unknown",
                            "turn for unknown call id; starting a fresh session"
                        );
                        let session = self.store.create(&call_id, "unknown", Utc::now()).await;
                        return self.process(session, ScriptInput::CallStart, None).await;
                    }
                };

                let today = Utc::now().date_naive();
                let (script_input, tier) = self.resolve_turn_input(&session, &input, today).await;
                self.process(session, script_input, tier).await
            }

            InboundEvent::CallEnd { call_id } => {
                let call_id = CallId(call_id);
                if let Some(session) = self.store.remove(&call_id).await {
                    self.teardown(session, "call-end").await;
                }
                OutputAction::Hangup { text: String::new() }
            }
        }
    }

    /// Expires idle sessions. Abandoned calls get no compensating action;
    /// their partial data is simply dropped.
    pub async fn expire_idle_sessions(&self) -> usize {
        let max_idle = chrono::Duration::from_std(self.deps.idle_timeout)
            .unwrap_or_else(|_| chrono::Duration::seconds(600));
        let expired = self.store.expire_idle(Utc::now(), max_idle).await;
        for session in &expired {
            info!(
                event_name = "session.idle.expired",
                correlation_id = %session.call_id.0,
                call_id = %session.call_id.0,
                booking_id = "unknown",
                stage = session.stage.as_str(),
                "idle session expired"
            );
        }
        expired.len()
    }

    async fn resolve_turn_input(
        &self,
        session: &CallSession,
        raw: &str,
        today: NaiveDate,
    ) -> (ScriptInput, Option<ExtractionTier>) {
        match session.stage.expectation() {
            InputExpectation::Menu(kind) => match match_menu(kind, raw) {
                Some(selection) => (ScriptInput::Menu(selection), Some(ExtractionTier::Rules)),
                None => (ScriptInput::Unrecognized { raw: raw.to_owned() }, None),
            },
            InputExpectation::Field(request) => {
                let Some(key) = session.stage.owned_field() else {
                    return (ScriptInput::Unrecognized { raw: raw.to_owned() }, None);
                };
                match self.deps.extractor.extract(request, raw, today).await.into_value() {
                    Some((value, tier, _confidence)) => {
                        (ScriptInput::Field { key, value, tier }, Some(tier))
                    }
                    None => (ScriptInput::Unrecognized { raw: raw.to_owned() }, None),
                }
            }
            InputExpectation::System | InputExpectation::None => {
                (ScriptInput::Unrecognized { raw: raw.to_owned() }, None)
            }
        }
    }

    async fn process(
        &self,
        mut session: CallSession,
        first_input: ScriptInput,
        tier: Option<ExtractionTier>,
    ) -> OutputAction {
        let today = Utc::now().date_naive();
        let call_id = session.call_id.clone();
        let mut input = first_input;
        let mut input_tier = tier;
        let mut reply: Option<Reply> = None;

        for _hop in 0..MAX_EFFECT_HOPS {
            let outcome = match self.deps.engine.apply(&session, &input, today) {
                Ok(outcome) => outcome,
                Err(script_error) => {
                    error!(
                        event_name = "script.transition.rejected",
                        correlation_id = %call_id.0,
                        call_id = %call_id.0,
                        booking_id = "unknown",
                        stage = session.stage.as_str(),
                        error = %script_error,
                        "script engine rejected input; transferring caller"
                    );
                    self.deps.audit.emit(
                        AuditEvent::new(
                            Some(call_id.clone()),
                            None,
                            call_id.0.clone(),
                            "script.transition_rejected",
                            AuditCategory::Script,
                            "call-runtime",
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("error", script_error.to_string()),
                    );
                    return self.safety_transfer();
                }
            };

            let summary = input_summary(&input);
            if let Err(domain_error) =
                session.apply_outcome(&outcome, summary, input_tier.take(), Utc::now())
            {
                error!(
                    event_name = "session.mutation.rejected",
                    correlation_id = %call_id.0,
                    call_id = %call_id.0,
                    booking_id = "unknown",
                    error = %domain_error,
                    "session rejected transition outcome; transferring caller"
                );
                return self.safety_transfer();
            }

            self.deps.audit.emit(
                AuditEvent::new(
                    Some(call_id.clone()),
                    None,
                    call_id.0.clone(),
                    "script.transition_applied",
                    AuditCategory::Script,
                    "call-runtime",
                    AuditOutcome::Success,
                )
                .with_metadata("from", outcome.from.as_str())
                .with_metadata("to", outcome.to.as_str()),
            );

            if outcome.reply.is_some() {
                reply = outcome.reply.clone();
            }

            match outcome.effect {
                Some(effect) => {
                    let effect_outcome = self.execute_effect(&session, effect).await;
                    input = ScriptInput::Effect(effect_outcome);
                }
                None => break,
            }
        }

        if session.is_terminal() {
            self.store.remove(&session.call_id).await;
            self.teardown(session, "terminal-stage").await;
        } else {
            self.store.commit(session).await;
        }

        match reply {
            Some(Reply::Prompt { text }) => OutputAction::Say { text, gather: true },
            Some(Reply::Complete { text }) => OutputAction::Hangup { text },
            Some(Reply::Handoff { text, .. }) => {
                OutputAction::Transfer { text, number: self.deps.transfer_number.clone() }
            }
            None => {
                warn!(
                    event_name = "script.turn.no_reply",
                    correlation_id = %call_id.0,
                    call_id = %call_id.0,
                    booking_id = "unknown",
                    "turn produced no reply; transferring caller"
                );
                self.safety_transfer()
            }
        }
    }

    async fn execute_effect(&self, session: &CallSession, effect: Effect) -> EffectOutcome {
        match effect {
            Effect::ResolveDistance { pickup, delivery } => {
                let (estimate, source) = resolve_route(
                    self.deps.distance.as_ref(),
                    &pickup,
                    &delivery,
                    self.deps.distance_timeout,
                )
                .await;
                info!(
                    event_name = "distance.route.resolved",
                    correlation_id = %session.call_id.0,
                    call_id = %session.call_id.0,
                    booking_id = "unknown",
                    miles = %estimate.miles,
                    source = ?source,
                    "route estimate resolved"
                );
                EffectOutcome::DistanceResolved {
                    miles: estimate.miles,
                    drive_minutes: estimate.drive_minutes,
                    source,
                }
            }

            Effect::PriceQuote => {
                let quote = self.price_from_session(session);
                self.deps.audit.emit(
                    AuditEvent::new(
                        Some(session.call_id.clone()),
                        None,
                        session.call_id.0.clone(),
                        "quote.priced",
                        AuditCategory::Pricing,
                        "quote-engine",
                        AuditOutcome::Success,
                    )
                    .with_metadata("total", quote.total.to_string()),
                );
                EffectOutcome::QuotePriced { quote }
            }

            Effect::CheckSlots { date } => {
                let offer = self.deps.checker.available_slots(date).await;
                EffectOutcome::SlotsChecked { date, offer }
            }

            Effect::CreateBooking { date, slot } => {
                let Some(booking) = self.booking_from_session(session, date, slot) else {
                    return EffectOutcome::BookingPersistenceFailed {
                        detail: "session reached booking-create without a quote".to_owned(),
                    };
                };
                match self.deps.coordinator.create_booking(booking).await {
                    Ok(reference) => EffectOutcome::BookingCreated { reference: reference.0 },
                    Err(BookingError::SlotNoLongerAvailable { date, slot, store }) => {
                        EffectOutcome::SlotTaken { date, slot, store }
                    }
                    Err(BookingError::Persistence(detail)) => {
                        EffectOutcome::BookingPersistenceFailed { detail }
                    }
                }
            }

            Effect::SendBookingLink => {
                let report = self
                    .deps
                    .dispatcher
                    .booking_link(&session.caller_contact, &session.call_id.0)
                    .await;
                EffectOutcome::LinkSent { delivered: report.all_sent() }
            }

            Effect::EmailQuote => {
                let to = session
                    .field(FieldKey::QuoteEmail)
                    .or_else(|| session.field(FieldKey::CustomerEmail))
                    .unwrap_or_default()
                    .to_owned();
                let Some(quote) = &session.quote else {
                    return EffectOutcome::QuoteEmailed { delivered: false };
                };
                let report =
                    self.deps.dispatcher.quote_email(&to, quote, &session.call_id.0).await;
                EffectOutcome::QuoteEmailed { delivered: report.all_sent() }
            }
        }
    }

    fn price_from_session(&self, session: &CallSession) -> moveline_core::pricing::QuoteBreakdown {
        let category = session
            .field(FieldKey::ServiceCategory)
            .and_then(ServiceCategory::parse)
            .unwrap_or(ServiceCategory::FullService);
        let distance_miles = session
            .field(FieldKey::DistanceMiles)
            .and_then(|value| value.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::from(15));
        let bedrooms = session
            .field(FieldKey::PickupBedrooms)
            .and_then(|value| value.parse::<u32>().ok())
            .max(
                session
                    .field(FieldKey::DeliveryBedrooms)
                    .and_then(|value| value.parse::<u32>().ok()),
            )
            .unwrap_or(2);
        let heavy_items = session.field(FieldKey::HeavyItems) == Some("yes");

        let hours = estimated_hours(category, distance_miles);
        let crew_size = crew_for(bedrooms, heavy_items);
        self.deps.pricing.price(&QuoteInput { category, distance_miles, crew_size, hours })
    }

    fn booking_from_session(
        &self,
        session: &CallSession,
        date: chrono::NaiveDate,
        slot: moveline_core::domain::schedule::Slot,
    ) -> Option<Booking> {
        let quote = session.quote.clone()?;
        let now = Utc::now();
        Some(Booking {
            id: BookingId::generate(),
            customer: CustomerDetails {
                name: session.field(FieldKey::CustomerName).unwrap_or("unknown").to_owned(),
                phone: session.caller_contact.clone(),
                email: session.field(FieldKey::CustomerEmail).unwrap_or_default().to_owned(),
            },
            schedule: BookingSchedule { date, slot },
            service: ServiceDescriptor::new(quote.category, quote.crew_size),
            route: Route {
                pickup: session.field(FieldKey::PickupAddress).unwrap_or_default().to_owned(),
                delivery: session.field(FieldKey::DeliveryAddress).unwrap_or_default().to_owned(),
                distance_miles: quote.distance_miles,
                drive_time_minutes: session
                    .field(FieldKey::DriveTimeMinutes)
                    .and_then(|value| value.parse::<i64>().ok())
                    .unwrap_or_default(),
            },
            price: quote,
            status: BookingStatus::Confirmed,
            source: "voice".to_owned(),
            originating_call_id: session.call_id.clone(),
            calendar_synced: false,
            created_at: now,
            updated_at: now,
        })
    }

    async fn teardown(&self, session: CallSession, cause: &str) {
        info!(
            event_name = "session.closed",
            correlation_id = %session.call_id.0,
            call_id = %session.call_id.0,
            booking_id = "unknown",
            cause,
            stage = session.stage.as_str(),
            turns = session.history.len(),
            "call session closed"
        );
        self.deps.audit.emit(
            AuditEvent::new(
                Some(session.call_id.clone()),
                None,
                session.call_id.0.clone(),
                "call.closed",
                AuditCategory::Ingress,
                "call-runtime",
                AuditOutcome::Success,
            )
            .with_metadata("cause", cause)
            .with_metadata("stage", session.stage.as_str()),
        );

        if !session.history.is_empty() {
            let report = self.deps.dispatcher.call_transcript(&session).await;
            if !report.all_sent() {
                warn!(
                    event_name = "session.transcript.undelivered",
                    correlation_id = %session.call_id.0,
                    call_id = %session.call_id.0,
                    booking_id = "unknown",
                    "transcript email failed; continuing teardown"
                );
            }
        }
    }

    fn safety_transfer(&self) -> OutputAction {
        OutputAction::Transfer {
            text: "Let me connect you with one of our moving specialists. One moment please."
                .to_owned(),
            number: self.deps.transfer_number.clone(),
        }
    }
}

fn input_summary(input: &ScriptInput) -> String {
    match input {
        ScriptInput::CallStart => "call-start".to_owned(),
        ScriptInput::Menu(selection) => format!("menu:{selection:?}"),
        ScriptInput::Field { value, .. } => value.clone(),
        ScriptInput::Unrecognized { raw } => format!("unrecognized:{raw}"),
        ScriptInput::Effect(outcome) => match outcome {
            EffectOutcome::DistanceResolved { miles, .. } => format!("effect:distance={miles}mi"),
            EffectOutcome::QuotePriced { quote } => format!("effect:quote={}", quote.total),
            EffectOutcome::SlotsChecked { .. } => "effect:slots-checked".to_owned(),
            EffectOutcome::BookingCreated { reference } => format!("effect:booked={reference}"),
            EffectOutcome::SlotTaken { .. } => "effect:slot-taken".to_owned(),
            EffectOutcome::BookingPersistenceFailed { .. } => {
                "effect:booking-failed".to_owned()
            }
            EffectOutcome::LinkSent { .. } => "effect:link-sent".to_owned(),
            EffectOutcome::QuoteEmailed { .. } => "effect:quote-emailed".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use moveline_core::audit::InMemoryAuditSink;
    use moveline_core::pricing::DeterministicPricingEngine;
    use moveline_core::script::engine::{ScriptEngine, ScriptPolicy};
    use moveline_db::repositories::{
        BookingRepository, InMemoryBookingRepository, InMemoryScheduleStore, ScheduleStore,
    };
    use moveline_notify::{
        NotificationDispatcher, RecordingEmailChannel, RecordingSmsChannel, Templates,
    };

    use crate::availability::{AvailabilityChecker, BookingLedgerStore};
    use crate::booking::BookingCoordinator;
    use crate::distance::UnavailableDistanceService;
    use crate::extractor::FieldExtractor;
    use crate::nlu::NluClient;

    use super::{AgentRuntime, InboundEvent, OutputAction, RuntimeDeps};

    struct OfflineNlu;

    #[async_trait]
    impl NluClient for OfflineNlu {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("nlu offline"))
        }
    }

    struct Fixture {
        runtime: AgentRuntime,
        bookings: Arc<InMemoryBookingRepository>,
        email: RecordingEmailChannel,
        sms: RecordingSmsChannel,
    }

    fn fixture() -> Fixture {
        let bookings = Arc::new(InMemoryBookingRepository::default());
        let crew: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new("crew-alpha"));
        let ledger: Arc<dyn ScheduleStore> =
            Arc::new(BookingLedgerStore::new(bookings.clone() as Arc<dyn BookingRepository>));
        let stores = vec![ledger, crew.clone()];

        let email = RecordingEmailChannel::default();
        let sms = RecordingSmsChannel::default();
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(email.clone()),
            Arc::new(sms.clone()),
            Templates::new().expect("templates compile"),
            "ops@moveline.example",
            "https://book.moveline.example",
        ));

        let coordinator = BookingCoordinator::new(
            bookings.clone() as Arc<dyn BookingRepository>,
            AvailabilityChecker::new(stores.clone()),
            vec![crew],
            dispatcher.clone(),
        );

        let runtime = AgentRuntime::new(RuntimeDeps {
            engine: ScriptEngine::new(ScriptPolicy { retry_budget: 2 }),
            extractor: FieldExtractor::new(Arc::new(OfflineNlu), Duration::from_millis(100)),
            distance: Arc::new(UnavailableDistanceService),
            pricing: Arc::new(DeterministicPricingEngine),
            checker: AvailabilityChecker::new(stores),
            coordinator,
            dispatcher,
            audit: Arc::new(InMemoryAuditSink::default()),
            transfer_number: "+15125550199".to_owned(),
            distance_timeout: Duration::from_millis(100),
            idle_timeout: Duration::from_secs(600),
        });

        Fixture { runtime, bookings, email, sms }
    }

    async fn turn(fixture: &Fixture, input: &str) -> OutputAction {
        fixture
            .runtime
            .handle_event(InboundEvent::Turn {
                call_id: "CA-1".to_owned(),
                input: input.to_owned(),
            })
            .await
    }

    fn say_text(action: &OutputAction) -> &str {
        match action {
            OutputAction::Say { text, .. } => text,
            other => panic!("expected say action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_booking_conversation_runs_end_to_end() {
        let fixture = fixture();

        let greeting = fixture
            .runtime
            .handle_event(InboundEvent::CallStart {
                call_id: "CA-1".to_owned(),
                caller: "+15125550123".to_owned(),
            })
            .await;
        assert!(say_text(&greeting).contains("Moveline"));

        assert!(say_text(&turn(&fixture, "1").await).contains("full-service"));
        assert!(say_text(&turn(&fixture, "1").await).contains("pickup address"));
        assert!(say_text(&turn(&fixture, "100 Elm St, Austin").await).contains("house"));
        assert!(say_text(&turn(&fixture, "1").await).contains("bedrooms"));
        assert!(say_text(&turn(&fixture, "3").await).contains("stairs"));
        assert!(say_text(&turn(&fixture, "no").await).contains("delivery address"));
        assert!(say_text(&turn(&fixture, "200 Oak St, Round Rock").await).contains("house"));
        assert!(say_text(&turn(&fixture, "2").await).contains("bedrooms"));
        assert!(say_text(&turn(&fixture, "2").await).contains("stairs"));
        assert!(say_text(&turn(&fixture, "no").await).contains("appliances"));
        assert!(say_text(&turn(&fixture, "no").await).contains("heavy"));
        assert!(say_text(&turn(&fixture, "no").await).contains("packing"));

        // The packing answer chains distance lookup (fallback table:
        // Austin to Round Rock is 20 miles) and pricing into one turn.
        let quote_prompt = turn(&fixture, "no").await;
        let text = say_text(&quote_prompt).to_owned();
        assert!(text.contains("946 dollars"), "unexpected quote readback: {text}");

        assert!(say_text(&turn(&fixture, "book").await).contains("name"));
        assert!(say_text(&turn(&fixture, "jordan avery").await).contains("email"));
        assert!(say_text(&turn(&fixture, "jordan at example dot com").await).contains("date"));

        let slot_prompt = turn(&fixture, "tomorrow").await;
        assert!(say_text(&slot_prompt).contains("morning"));

        let confirmation = turn(&fixture, "morning").await;
        let OutputAction::Hangup { text } = confirmation else {
            panic!("expected hangup after booking, got {confirmation:?}");
        };
        assert!(text.contains("MB-"), "confirmation should read the reference: {text}");

        assert_eq!(fixture.email.sent().len(), 2, "confirmation email and transcript email");
        assert_eq!(fixture.sms.sent().len(), 2, "confirmation and payment link texts");
        assert_eq!(fixture.runtime.store().active_count().await, 0, "terminal session removed");

        let tomorrow = chrono::Utc::now().date_naive() + chrono::Duration::days(1);
        assert!(fixture
            .bookings
            .holds_slot(tomorrow, moveline_core::domain::schedule::Slot::Morning)
            .await
            .expect("slot check"));
    }

    #[tokio::test]
    async fn booking_link_path_completes_in_two_events() {
        let fixture = fixture();
        fixture
            .runtime
            .handle_event(InboundEvent::CallStart {
                call_id: "CA-1".to_owned(),
                caller: "+15125550123".to_owned(),
            })
            .await;

        let action = turn(&fixture, "2").await;
        let OutputAction::Hangup { text } = action else {
            panic!("expected hangup after link send, got {action:?}");
        };
        assert!(text.contains("booking link"));
        assert_eq!(fixture.sms.sent().len(), 1);
        assert!(fixture.sms.sent()[0].body.contains("/book"));
    }

    #[tokio::test]
    async fn turn_for_unknown_call_id_starts_a_session() {
        let fixture = fixture();

        let action = turn(&fixture, "hello?").await;
        assert!(say_text(&action).contains("Thanks for calling"));
        assert_eq!(fixture.runtime.store().active_count().await, 1);
    }

    #[tokio::test]
    async fn call_end_drops_the_session_and_sends_a_transcript() {
        let fixture = fixture();
        fixture
            .runtime
            .handle_event(InboundEvent::CallStart {
                call_id: "CA-1".to_owned(),
                caller: "+15125550123".to_owned(),
            })
            .await;
        turn(&fixture, "1").await;

        let action = fixture
            .runtime
            .handle_event(InboundEvent::CallEnd { call_id: "CA-1".to_owned() })
            .await;

        assert_eq!(action, OutputAction::Hangup { text: String::new() });
        assert_eq!(fixture.runtime.store().active_count().await, 0);
        assert_eq!(fixture.email.sent().len(), 1, "abandoned call still emails a transcript");
    }
}
