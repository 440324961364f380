use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::schedule::Slot;
use crate::domain::service::{Route, ServiceCategory};
use crate::domain::session::CallId;
use crate::pricing::QuoteBreakdown;

/// Human-shareable booking reference, e.g. `MB-7KQ2XN`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

// Excludes 0/O and 1/I so the reference survives being read over the phone.
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

impl BookingId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..6)
            .map(|_| {
                let index = rng.gen_range(0..REFERENCE_ALPHABET.len());
                REFERENCE_ALPHABET[index] as char
            })
            .collect();
        Self(format!("MB-{suffix}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSchedule {
    pub date: NaiveDate,
    pub slot: Slot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub category: ServiceCategory,
    pub crew_size: u32,
    pub label: String,
}

impl ServiceDescriptor {
    pub fn new(category: ServiceCategory, crew_size: u32) -> Self {
        Self { category, crew_size, label: format!("{} ({crew_size} movers)", category.label()) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Durable record of a confirmed move. Created only after the target slot
/// passed an availability check; the persistence layer's uniqueness
/// constraint on (date, slot) decides races between concurrent callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer: CustomerDetails,
    pub schedule: BookingSchedule,
    pub service: ServiceDescriptor,
    pub route: Route,
    pub price: QuoteBreakdown,
    pub status: BookingStatus,
    pub source: String,
    pub originating_call_id: CallId,
    pub calendar_synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
