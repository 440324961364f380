use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::schedule::{within_horizon, Slot, SlotOffer};
use crate::domain::service::{HomeType, ServiceCategory};
use crate::domain::session::CallSession;
use crate::errors::DomainError;
use crate::script::prompts;
use crate::script::states::{
    AttemptBump, CallStage, Effect, EffectOutcome, FieldKey, HandoffReason, MenuSelection, Reply,
    ScriptInput, TransitionOutcome,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPolicy {
    /// How many unusable inputs a stage tolerates before handing off.
    pub retry_budget: u8,
}

impl Default for ScriptPolicy {
    fn default() -> Self {
        Self { retry_budget: 2 }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("stage {stage:?} cannot process {input_kind} input")]
    UnexpectedInput { stage: CallStage, input_kind: &'static str },
    #[error("stage {stage:?} requires field {field:?} which was never collected")]
    MissingField { stage: CallStage, field: FieldKey },
}

impl From<ScriptError> for DomainError {
    fn from(value: ScriptError) -> Self {
        match value {
            ScriptError::UnexpectedInput { stage, input_kind } => {
                DomainError::InvalidScriptTransition { stage, input_kind }
            }
            ScriptError::MissingField { stage, field } => DomainError::InvariantViolation(format!(
                "stage {} reached without field {}",
                stage.as_str(),
                field.as_str()
            )),
        }
    }
}

/// The call-script state machine. Pure: reads the session, never mutates it;
/// the runtime commits the returned outcome and executes its effect.
#[derive(Clone, Debug, Default)]
pub struct ScriptEngine {
    policy: ScriptPolicy,
}

impl ScriptEngine {
    pub fn new(policy: ScriptPolicy) -> Self {
        Self { policy }
    }

    pub fn initial_stage(&self) -> CallStage {
        CallStage::Greeting
    }

    pub fn apply(
        &self,
        session: &CallSession,
        input: &ScriptInput,
        today: NaiveDate,
    ) -> Result<TransitionOutcome, ScriptError> {
        let stage = session.stage;
        match (stage, input) {
            (CallStage::Greeting, ScriptInput::CallStart) => {
                Ok(TransitionOutcome::advance(stage, CallStage::MainMenu)
                    .with_reply(Reply::Prompt { text: prompts::greeting() }))
            }

            (CallStage::MainMenu, ScriptInput::Menu(selection)) => {
                Ok(self.main_menu(session, *selection))
            }

            (CallStage::ServiceType, ScriptInput::Menu(selection)) => {
                let category = match selection {
                    MenuSelection::ServiceFull => ServiceCategory::FullService,
                    MenuSelection::ServiceLabor => ServiceCategory::LaborOnly,
                    _ => return Ok(self.unrecognized(session)),
                };
                Ok(self
                    .gathered(session, CallStage::PickupAddress)
                    .with_write(FieldKey::ServiceCategory, category.as_str()))
            }

            (
                CallStage::PickupAddress
                | CallStage::PickupBedrooms
                | CallStage::DeliveryAddress
                | CallStage::DeliveryBedrooms
                | CallStage::AppliancesDetails
                | CallStage::HeavyItemsDetails
                | CallStage::BookingStart
                | CallStage::BookingContact,
                ScriptInput::Field { key, value, .. },
            ) => {
                let next = match stage {
                    CallStage::PickupAddress => CallStage::PickupHomeType,
                    CallStage::PickupBedrooms => CallStage::PickupStairs,
                    CallStage::DeliveryAddress => CallStage::DeliveryHomeType,
                    CallStage::DeliveryBedrooms => CallStage::DeliveryStairs,
                    CallStage::AppliancesDetails => CallStage::HeavyItems,
                    CallStage::HeavyItemsDetails => CallStage::PackingServices,
                    CallStage::BookingStart => CallStage::BookingContact,
                    _ => CallStage::BookingDate,
                };
                Ok(self.gathered(session, next).with_write(*key, value.clone()))
            }

            (
                CallStage::PickupHomeType | CallStage::DeliveryHomeType,
                ScriptInput::Menu(selection),
            ) => {
                let home = match selection {
                    MenuSelection::HomeHouse => HomeType::House,
                    MenuSelection::HomeApartment => HomeType::Apartment,
                    MenuSelection::HomeStorage => HomeType::StorageUnit,
                    _ => return Ok(self.unrecognized(session)),
                };
                let (key, next) = if stage == CallStage::PickupHomeType {
                    (FieldKey::PickupHomeType, CallStage::PickupBedrooms)
                } else {
                    (FieldKey::DeliveryHomeType, CallStage::DeliveryBedrooms)
                };
                Ok(self.gathered(session, next).with_write(key, home.as_str()))
            }

            (
                CallStage::PickupStairs
                | CallStage::DeliveryStairs
                | CallStage::Appliances
                | CallStage::HeavyItems
                | CallStage::PackingServices,
                ScriptInput::Menu(selection),
            ) => self.yes_no(session, *selection),

            (CallStage::CalculateDistance, ScriptInput::Effect(outcome)) => {
                let EffectOutcome::DistanceResolved { miles, drive_minutes, .. } = outcome else {
                    return Err(ScriptError::UnexpectedInput { stage, input_kind: "effect" });
                };
                Ok(TransitionOutcome::advance(stage, CallStage::FinalizeQuote)
                    .with_write(FieldKey::DistanceMiles, miles.to_string())
                    .with_write(FieldKey::DriveTimeMinutes, drive_minutes.to_string())
                    .with_effect(Effect::PriceQuote))
            }

            (CallStage::FinalizeQuote, ScriptInput::Effect(outcome)) => {
                let EffectOutcome::QuotePriced { quote } = outcome else {
                    return Err(ScriptError::UnexpectedInput { stage, input_kind: "effect" });
                };
                let text = prompts::quote_readback(quote);
                let mut transition = TransitionOutcome::advance(stage, CallStage::Decision)
                    .with_reply(Reply::Prompt { text });
                transition.set_quote = Some(quote.clone());
                Ok(transition)
            }

            (CallStage::Decision, ScriptInput::Menu(selection)) => match selection {
                MenuSelection::DecisionBook => Ok(self.gathered(session, CallStage::BookingStart)),
                MenuSelection::DecisionEmail => Ok(self.gathered(session, CallStage::EmailQuote)),
                MenuSelection::DecisionRestart => {
                    let mut transition = self.gathered(session, CallStage::ServiceType);
                    transition.clear_quote = true;
                    Ok(transition)
                }
                MenuSelection::DecisionTransfer => {
                    Ok(self.handoff(stage, HandoffReason::CallerRequested))
                }
                _ => Ok(self.unrecognized(session)),
            },

            (CallStage::BookingDate, ScriptInput::Field { value, .. }) => {
                let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
                    return Ok(self.unrecognized(session));
                };
                if !within_horizon(today, date) {
                    return Ok(self.unrecognized(session));
                }
                Ok(TransitionOutcome::advance(stage, CallStage::BookingDate)
                    .with_write(FieldKey::MoveDate, date.format("%Y-%m-%d").to_string())
                    .with_effect(Effect::CheckSlots { date }))
            }

            (CallStage::BookingDate, ScriptInput::Effect(outcome)) => {
                let EffectOutcome::SlotsChecked { date, offer } = outcome else {
                    return Err(ScriptError::UnexpectedInput { stage, input_kind: "effect" });
                };
                match offer {
                    Some(offer) => {
                        let mut transition =
                            TransitionOutcome::advance(stage, CallStage::BookingSlot).with_reply(
                                Reply::Prompt { text: prompts::slot_offer_prompt(Some(*offer)) },
                            );
                        transition.slot_offer = Some(*offer);
                        Ok(transition)
                    }
                    None => {
                        if session.attempts.availability_misses >= self.policy.retry_budget {
                            return Ok(self.handoff(stage, HandoffReason::NoAvailability));
                        }
                        Ok(TransitionOutcome::advance(stage, CallStage::BookingDate)
                            .with_bump(AttemptBump::AvailabilityMiss)
                            .with_reply(Reply::Prompt { text: prompts::no_slots_available(*date) }))
                    }
                }
            }

            (CallStage::BookingSlot, ScriptInput::Menu(selection)) => {
                let slot = match selection {
                    MenuSelection::SlotMorning => Slot::Morning,
                    MenuSelection::SlotAfternoon => Slot::Afternoon,
                    _ => return Ok(self.unrecognized(session)),
                };
                let permitted =
                    session.slot_offer.map(|offer| offer.permits(slot)).unwrap_or(false);
                if !permitted {
                    return Ok(self.unrecognized(session));
                }
                let date = self.move_date(session)?;
                Ok(TransitionOutcome::advance(stage, CallStage::BookingCreate)
                    .with_write(FieldKey::MoveSlot, slot.as_str())
                    .with_effect(Effect::CreateBooking { date, slot }))
            }

            (CallStage::BookingCreate, ScriptInput::Effect(outcome)) => match outcome {
                EffectOutcome::BookingCreated { reference } => {
                    let date = self.move_date(session)?;
                    let slot = session
                        .field(FieldKey::MoveSlot)
                        .and_then(Slot::parse)
                        .ok_or(ScriptError::MissingField { stage, field: FieldKey::MoveSlot })?;
                    Ok(TransitionOutcome::advance(stage, CallStage::Done).with_reply(
                        Reply::Complete { text: prompts::booking_confirmed(reference, date, slot) },
                    ))
                }
                EffectOutcome::SlotTaken { date, slot, .. } => {
                    if session.attempts.availability_misses >= self.policy.retry_budget {
                        return Ok(self.handoff(stage, HandoffReason::NoAvailability));
                    }
                    Ok(TransitionOutcome::advance(stage, CallStage::BookingDate)
                        .with_bump(AttemptBump::AvailabilityMiss)
                        .with_reply(Reply::Prompt {
                            text: prompts::slot_taken_apology(*date, *slot),
                        }))
                }
                EffectOutcome::BookingPersistenceFailed { .. } => {
                    Ok(self.handoff(stage, HandoffReason::PersistenceFailure))
                }
                _ => Err(ScriptError::UnexpectedInput { stage, input_kind: "effect" }),
            },

            (CallStage::EmailQuote, ScriptInput::Field { key, value, .. }) => {
                Ok(TransitionOutcome::advance(stage, CallStage::EmailQuote)
                    .with_write(*key, value.clone())
                    .with_effect(Effect::EmailQuote))
            }

            (CallStage::EmailQuote, ScriptInput::Effect(EffectOutcome::QuoteEmailed { .. })) => {
                Ok(TransitionOutcome::advance(stage, CallStage::Done).with_reply(Reply::Complete {
                    text: prompts::quote_emailed(session.quote.as_ref()),
                }))
            }

            (CallStage::SendBookingLink, ScriptInput::Effect(EffectOutcome::LinkSent { .. })) => {
                Ok(TransitionOutcome::advance(stage, CallStage::Done)
                    .with_reply(Reply::Complete { text: prompts::booking_link_sent() }))
            }

            (_, ScriptInput::Unrecognized { .. }) => Ok(self.unrecognized(session)),

            (stage, input) => {
                Err(ScriptError::UnexpectedInput { stage, input_kind: input.kind() })
            }
        }
    }

    fn main_menu(&self, session: &CallSession, selection: MenuSelection) -> TransitionOutcome {
        let stage = session.stage;
        match selection {
            MenuSelection::MainMenuQuote => self.gathered(session, CallStage::ServiceType),
            MenuSelection::MainMenuBookingLink => {
                TransitionOutcome::advance(stage, CallStage::SendBookingLink)
                    .with_effect(Effect::SendBookingLink)
            }
            // Hidden escape digit: deflect once, transfer on the second use.
            MenuSelection::MainMenuOperator => {
                if session.attempts.operator_escapes == 0 {
                    TransitionOutcome::advance(stage, stage)
                        .with_bump(AttemptBump::OperatorEscape)
                        .with_reply(Reply::Prompt { text: prompts::escape_deflection() })
                } else {
                    self.handoff(stage, HandoffReason::CallerRequested)
                }
            }
            _ => self.unrecognized(session),
        }
    }

    fn yes_no(
        &self,
        session: &CallSession,
        selection: MenuSelection,
    ) -> Result<TransitionOutcome, ScriptError> {
        let stage = session.stage;
        let answer = match selection {
            MenuSelection::Yes => "yes",
            MenuSelection::No => "no",
            _ => return Ok(self.unrecognized(session)),
        };
        let key = stage
            .owned_field()
            .ok_or(ScriptError::UnexpectedInput { stage, input_kind: "menu" })?;

        let next = match (stage, selection) {
            (CallStage::PickupStairs, _) => CallStage::DeliveryAddress,
            (CallStage::DeliveryStairs, _) => CallStage::Appliances,
            (CallStage::Appliances, MenuSelection::Yes) => CallStage::AppliancesDetails,
            (CallStage::Appliances, _) => CallStage::HeavyItems,
            (CallStage::HeavyItems, MenuSelection::Yes) => CallStage::HeavyItemsDetails,
            (CallStage::HeavyItems, _) => CallStage::PackingServices,
            (CallStage::PackingServices, _) => CallStage::CalculateDistance,
            _ => return Err(ScriptError::UnexpectedInput { stage, input_kind: "menu" }),
        };

        let mut transition = if next == CallStage::CalculateDistance {
            let pickup = self.required(session, FieldKey::PickupAddress)?;
            let delivery = self.required(session, FieldKey::DeliveryAddress)?;
            TransitionOutcome::advance(stage, next)
                .with_effect(Effect::ResolveDistance { pickup, delivery })
        } else {
            self.gathered(session, next)
        };
        transition = transition.with_write(key, answer);
        Ok(transition)
    }

    /// Advance to a gather stage, prompting for it.
    fn gathered(&self, session: &CallSession, next: CallStage) -> TransitionOutcome {
        TransitionOutcome::advance(session.stage, next)
            .with_reply(Reply::Prompt { text: prompts::prompt_for(next, session) })
    }

    fn unrecognized(&self, session: &CallSession) -> TransitionOutcome {
        let stage = session.stage;
        if session.attempts.unrecognized >= self.policy.retry_budget {
            return self.handoff(stage, HandoffReason::RetriesExhausted);
        }
        TransitionOutcome::advance(stage, stage)
            .with_bump(AttemptBump::Unrecognized)
            .with_reply(Reply::Prompt { text: prompts::reprompt(stage, session) })
    }

    fn handoff(&self, stage: CallStage, reason: HandoffReason) -> TransitionOutcome {
        TransitionOutcome::advance(stage, CallStage::Transfer)
            .with_reply(Reply::Handoff { text: prompts::transfer_text(), reason })
    }

    fn required(&self, session: &CallSession, field: FieldKey) -> Result<String, ScriptError> {
        session
            .field(field)
            .map(str::to_owned)
            .ok_or(ScriptError::MissingField { stage: session.stage, field })
    }

    fn move_date(&self, session: &CallSession) -> Result<NaiveDate, ScriptError> {
        let raw = self.required(session, FieldKey::MoveDate)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| ScriptError::MissingField { stage: session.stage, field: FieldKey::MoveDate })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::domain::schedule::{Slot, SlotOffer};
    use crate::domain::service::ServiceCategory;
    use crate::domain::session::{CallId, CallSession, ExtractionTier};
    use crate::pricing::{price_move, QuoteInput};
    use crate::script::states::{
        CallStage, Effect, EffectOutcome, FieldKey, HandoffReason, MenuSelection, Reply, RouteSource,
        ScriptInput,
    };

    use super::{ScriptEngine, ScriptError, ScriptPolicy};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    fn new_session() -> CallSession {
        CallSession::start(CallId("CA-1".to_owned()), "+15125550123", Utc::now())
    }

    /// Applies one input, commits the outcome, and returns it.
    fn step(engine: &ScriptEngine, session: &mut CallSession, input: ScriptInput) -> super::TransitionOutcome {
        let outcome = engine.apply(session, &input, today()).expect("transition should apply");
        session
            .apply_outcome(&outcome, input.kind(), Some(ExtractionTier::Rules), Utc::now())
            .expect("outcome should commit");
        outcome
    }

    fn drive_to_decision(engine: &ScriptEngine, session: &mut CallSession) {
        step(engine, session, ScriptInput::CallStart);
        step(engine, session, ScriptInput::Menu(MenuSelection::MainMenuQuote));
        step(engine, session, ScriptInput::Menu(MenuSelection::ServiceFull));
        step(
            engine,
            session,
            ScriptInput::Field {
                key: FieldKey::PickupAddress,
                value: "100 Elm St, Austin".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        step(engine, session, ScriptInput::Menu(MenuSelection::HomeHouse));
        step(
            engine,
            session,
            ScriptInput::Field {
                key: FieldKey::PickupBedrooms,
                value: "3".to_owned(),
                tier: ExtractionTier::Rules,
            },
        );
        step(engine, session, ScriptInput::Menu(MenuSelection::No));
        step(
            engine,
            session,
            ScriptInput::Field {
                key: FieldKey::DeliveryAddress,
                value: "200 Oak St, Round Rock".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        step(engine, session, ScriptInput::Menu(MenuSelection::HomeApartment));
        step(
            engine,
            session,
            ScriptInput::Field {
                key: FieldKey::DeliveryBedrooms,
                value: "2".to_owned(),
                tier: ExtractionTier::Rules,
            },
        );
        step(engine, session, ScriptInput::Menu(MenuSelection::Yes));
        step(engine, session, ScriptInput::Menu(MenuSelection::No));
        step(engine, session, ScriptInput::Menu(MenuSelection::No));

        let distance_request = step(engine, session, ScriptInput::Menu(MenuSelection::No));
        assert!(matches!(distance_request.effect, Some(Effect::ResolveDistance { .. })));
        assert_eq!(session.stage, CallStage::CalculateDistance);

        let price_request = step(
            engine,
            session,
            ScriptInput::Effect(EffectOutcome::DistanceResolved {
                miles: Decimal::from(18),
                drive_minutes: 25,
                source: RouteSource::Service,
            }),
        );
        assert!(matches!(price_request.effect, Some(Effect::PriceQuote)));

        let quote = price_move(&QuoteInput {
            category: ServiceCategory::FullService,
            distance_miles: Decimal::from(18),
            crew_size: 2,
            hours: 4,
        });
        step(engine, session, ScriptInput::Effect(EffectOutcome::QuotePriced { quote }));
        assert_eq!(session.stage, CallStage::Decision);
        assert!(session.quote.is_some());
    }

    #[test]
    fn quote_flow_reaches_decision_with_collected_fields() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);

        assert_eq!(session.field(FieldKey::ServiceCategory), Some("full_service"));
        assert_eq!(session.field(FieldKey::PickupStairs), Some("no"));
        assert_eq!(session.field(FieldKey::DeliveryStairs), Some("yes"));
        assert_eq!(session.field(FieldKey::Appliances), Some("no"));
        assert_eq!(session.field(FieldKey::DistanceMiles), Some("18"));
    }

    #[test]
    fn booking_path_creates_booking_and_completes() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);

        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::DecisionBook));
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerName,
                value: "Jordan Avery".to_owned(),
                tier: ExtractionTier::Fallback,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerEmail,
                value: "jordan@example.com".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );

        let check = step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::MoveDate,
                value: "2026-03-20".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        assert!(matches!(check.effect, Some(Effect::CheckSlots { .. })));

        step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::SlotsChecked {
                date: NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date"),
                offer: Some(SlotOffer::Both),
            }),
        );
        assert_eq!(session.stage, CallStage::BookingSlot);

        let create = step(&engine, &mut session, ScriptInput::Menu(MenuSelection::SlotMorning));
        assert!(matches!(create.effect, Some(Effect::CreateBooking { slot: Slot::Morning, .. })));

        let done = step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::BookingCreated { reference: "MB-7KQ2XN".to_owned() }),
        );
        assert_eq!(session.stage, CallStage::Done);
        match done.reply {
            Some(Reply::Complete { text }) => assert!(text.contains("MB-7KQ2XN")),
            other => panic!("expected completion reply, got {other:?}"),
        }
    }

    #[test]
    fn history_stages_form_a_subsequence_of_protocol_order() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);

        let mut last_index = 0usize;
        for record in &session.history {
            let index = record.stage_after.protocol_index();
            assert!(
                index >= last_index || record.stage_after == record.stage_before,
                "stage {:?} moved backwards",
                record.stage_after
            );
            last_index = index.max(last_index);
        }
    }

    #[test]
    fn unrecognized_input_reprompts_within_budget_then_transfers() {
        let engine = ScriptEngine::new(ScriptPolicy { retry_budget: 2 });
        let mut session = new_session();
        step(&engine, &mut session, ScriptInput::CallStart);
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::MainMenuQuote));
        assert_eq!(session.stage, CallStage::ServiceType);

        for attempt in 1..=2 {
            let outcome = step(
                &engine,
                &mut session,
                ScriptInput::Unrecognized { raw: "mumble".to_owned() },
            );
            assert_eq!(session.stage, CallStage::ServiceType, "attempt {attempt} should stay");
            match outcome.reply {
                Some(Reply::Prompt { text }) => assert!(text.starts_with("Sorry")),
                other => panic!("expected reprompt, got {other:?}"),
            }
        }

        let outcome =
            step(&engine, &mut session, ScriptInput::Unrecognized { raw: "mumble".to_owned() });
        assert_eq!(session.stage, CallStage::Transfer);
        assert!(matches!(
            outcome.reply,
            Some(Reply::Handoff { reason: HandoffReason::RetriesExhausted, .. })
        ));
    }

    #[test]
    fn escape_digit_deflects_once_then_transfers() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        step(&engine, &mut session, ScriptInput::CallStart);

        let first = step(&engine, &mut session, ScriptInput::Menu(MenuSelection::MainMenuOperator));
        assert_eq!(session.stage, CallStage::MainMenu);
        assert!(matches!(first.reply, Some(Reply::Prompt { .. })));
        assert_eq!(session.attempts.operator_escapes, 1);

        let second =
            step(&engine, &mut session, ScriptInput::Menu(MenuSelection::MainMenuOperator));
        assert_eq!(session.stage, CallStage::Transfer);
        assert!(matches!(
            second.reply,
            Some(Reply::Handoff { reason: HandoffReason::CallerRequested, .. })
        ));
    }

    #[test]
    fn booking_link_request_fires_effect_and_completes() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        step(&engine, &mut session, ScriptInput::CallStart);

        let outcome =
            step(&engine, &mut session, ScriptInput::Menu(MenuSelection::MainMenuBookingLink));
        assert_eq!(session.stage, CallStage::SendBookingLink);
        assert!(matches!(outcome.effect, Some(Effect::SendBookingLink)));

        let done = step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::LinkSent { delivered: true }),
        );
        assert_eq!(session.stage, CallStage::Done);
        assert!(matches!(done.reply, Some(Reply::Complete { .. })));
    }

    #[test]
    fn out_of_horizon_dates_are_reprompted() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::DecisionBook));
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerName,
                value: "Sam Lee".to_owned(),
                tier: ExtractionTier::Fallback,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerEmail,
                value: "sam@example.com".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );

        let outcome = step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::MoveDate,
                value: "2026-09-01".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        assert_eq!(session.stage, CallStage::BookingDate);
        assert!(outcome.effect.is_none());
        assert_eq!(session.attempts.unrecognized, 1);
    }

    #[test]
    fn single_free_slot_restricts_the_choice() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::DecisionBook));
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerName,
                value: "Sam Lee".to_owned(),
                tier: ExtractionTier::Fallback,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerEmail,
                value: "sam@example.com".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::MoveDate,
                value: "2026-03-21".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::SlotsChecked {
                date: NaiveDate::from_ymd_opt(2026, 3, 21).expect("valid date"),
                offer: Some(SlotOffer::Only(Slot::Afternoon)),
            }),
        );

        let rejected = step(&engine, &mut session, ScriptInput::Menu(MenuSelection::SlotMorning));
        assert_eq!(session.stage, CallStage::BookingSlot);
        assert!(rejected.effect.is_none());

        let accepted =
            step(&engine, &mut session, ScriptInput::Menu(MenuSelection::SlotAfternoon));
        assert!(matches!(
            accepted.effect,
            Some(Effect::CreateBooking { slot: Slot::Afternoon, .. })
        ));
    }

    #[test]
    fn lost_slot_returns_to_date_and_persistence_failure_transfers() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::DecisionBook));
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerName,
                value: "Sam Lee".to_owned(),
                tier: ExtractionTier::Fallback,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::CustomerEmail,
                value: "sam@example.com".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::MoveDate,
                value: "2026-03-21".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        let date = NaiveDate::from_ymd_opt(2026, 3, 21).expect("valid date");
        step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::SlotsChecked {
                date,
                offer: Some(SlotOffer::Both),
            }),
        );
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::SlotMorning));

        let retry = step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::SlotTaken {
                date,
                slot: Slot::Morning,
                store: "crew-alpha".to_owned(),
            }),
        );
        assert_eq!(session.stage, CallStage::BookingDate);
        assert!(matches!(retry.reply, Some(Reply::Prompt { .. })));

        step(
            &engine,
            &mut session,
            ScriptInput::Field {
                key: FieldKey::MoveDate,
                value: "2026-03-22".to_owned(),
                tier: ExtractionTier::Nlu,
            },
        );
        let date = NaiveDate::from_ymd_opt(2026, 3, 22).expect("valid date");
        step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::SlotsChecked {
                date,
                offer: Some(SlotOffer::Both),
            }),
        );
        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::SlotAfternoon));

        let transfer = step(
            &engine,
            &mut session,
            ScriptInput::Effect(EffectOutcome::BookingPersistenceFailed {
                detail: "disk full".to_owned(),
            }),
        );
        assert_eq!(session.stage, CallStage::Transfer);
        assert!(matches!(
            transfer.reply,
            Some(Reply::Handoff { reason: HandoffReason::PersistenceFailure, .. })
        ));
    }

    #[test]
    fn restart_from_decision_clears_the_quote() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        drive_to_decision(&engine, &mut session);
        assert!(session.quote.is_some());

        step(&engine, &mut session, ScriptInput::Menu(MenuSelection::DecisionRestart));
        assert_eq!(session.stage, CallStage::ServiceType);
        assert!(session.quote.is_none());
    }

    #[test]
    fn effect_outcomes_are_rejected_outside_system_stages() {
        let engine = ScriptEngine::default();
        let mut session = new_session();
        step(&engine, &mut session, ScriptInput::CallStart);

        let error = engine
            .apply(
                &session,
                &ScriptInput::Effect(EffectOutcome::LinkSent { delivered: true }),
                today(),
            )
            .expect_err("main-menu cannot take effect outcomes");
        assert!(matches!(error, ScriptError::UnexpectedInput { .. }));
    }
}
