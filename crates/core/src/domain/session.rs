use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::schedule::SlotOffer;
use crate::errors::DomainError;
use crate::pricing::QuoteBreakdown;
use crate::script::states::{AttemptBump, CallStage, FieldKey, TransitionOutcome};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

/// How a field value was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Rules,
    Nlu,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptClass {
    UnrecognizedInput,
    AvailabilityMiss,
    OperatorEscape,
}

/// Small per-failure-class counters used to decide when to stop re-prompting
/// and hand the caller to a human.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptCounters {
    pub unrecognized: u8,
    pub availability_misses: u8,
    pub operator_escapes: u8,
}

/// One processed caller interaction, recorded for audit and the transcript
/// email. Never mutated after append.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub stage_before: CallStage,
    pub stage_after: CallStage,
    pub input: String,
    pub tier: Option<ExtractionTier>,
    pub occurred_at: DateTime<Utc>,
}

/// Live state of one in-progress phone interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallSession {
    pub call_id: CallId,
    pub caller_contact: String,
    pub stage: CallStage,
    pub collected: BTreeMap<FieldKey, String>,
    pub quote: Option<QuoteBreakdown>,
    pub slot_offer: Option<SlotOffer>,
    pub attempts: AttemptCounters,
    pub history: Vec<TurnRecord>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl CallSession {
    pub fn start(call_id: CallId, caller_contact: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            call_id,
            caller_contact: caller_contact.into(),
            stage: CallStage::Greeting,
            collected: BTreeMap::new(),
            quote: None,
            slot_offer: None,
            attempts: AttemptCounters::default(),
            history: Vec::new(),
            started_at: now,
            last_activity_at: now,
        }
    }

    pub fn field(&self, key: FieldKey) -> Option<&str> {
        self.collected.get(&key).map(String::as_str)
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Applies one transition. Each collected field may only be written by
    /// its owning stage; a recomputed quote must be cleared before it is set
    /// again.
    pub fn apply_outcome(
        &mut self,
        outcome: &TransitionOutcome,
        input_summary: impl Into<String>,
        tier: Option<ExtractionTier>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if outcome.from != self.stage {
            return Err(DomainError::InvariantViolation(format!(
                "outcome for stage {} applied while session is at {}",
                outcome.from.as_str(),
                self.stage.as_str()
            )));
        }

        for write in &outcome.writes {
            if write.key.owning_stage() != outcome.from {
                return Err(DomainError::FieldOwnership {
                    stage: outcome.from,
                    field: write.key,
                });
            }
        }

        if outcome.set_quote.is_some() && self.quote.is_some() && !outcome.clear_quote {
            return Err(DomainError::InvariantViolation(
                "quote recomputed without an explicit clear".to_owned(),
            ));
        }

        for write in &outcome.writes {
            self.collected.insert(write.key, write.value.clone());
        }

        if outcome.clear_quote {
            self.quote = None;
        }
        if let Some(quote) = &outcome.set_quote {
            self.quote = Some(quote.clone());
        }
        if let Some(offer) = outcome.slot_offer {
            self.slot_offer = Some(offer);
        }

        match outcome.bump {
            Some(AttemptBump::Unrecognized) => {
                self.attempts.unrecognized = self.attempts.unrecognized.saturating_add(1);
            }
            Some(AttemptBump::AvailabilityMiss) => {
                self.attempts.availability_misses =
                    self.attempts.availability_misses.saturating_add(1);
            }
            Some(AttemptBump::OperatorEscape) => {
                self.attempts.operator_escapes = self.attempts.operator_escapes.saturating_add(1);
            }
            None => {}
        }
        if outcome.to != outcome.from {
            self.attempts.unrecognized = 0;
        }

        self.history.push(TurnRecord {
            turn: self.history.len() as u32 + 1,
            stage_before: outcome.from,
            stage_after: outcome.to,
            input: input_summary.into(),
            tier,
            occurred_at: now,
        });

        self.stage = outcome.to;
        self.last_activity_at = now;
        Ok(())
    }

    pub fn idle_since(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity_at
    }
}
