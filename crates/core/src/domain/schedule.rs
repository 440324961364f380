use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Civil timezone used for all wall-clock interpretation of slot windows.
pub const BUSINESS_TIMEZONE: &str = "America/Chicago";

/// Bookings are accepted from today through today + this many days.
pub const BOOKING_HORIZON_DAYS: i64 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Morning,
    Afternoon,
}

impl Slot {
    pub fn start_time(&self) -> NaiveTime {
        match self {
            Self::Morning => NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            Self::Afternoon => NaiveTime::from_hms_opt(13, 0, 0).unwrap_or_default(),
        }
    }

    /// Arrival window as read to the caller.
    pub fn display_window(&self) -> &'static str {
        match self {
            Self::Morning => "8-9 AM",
            Self::Afternoon => "1-2 PM",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            _ => None,
        }
    }
}

/// Which of the two daily slots the caller may still choose for a date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotOffer {
    Both,
    Only(Slot),
}

impl SlotOffer {
    pub fn permits(&self, slot: Slot) -> bool {
        match self {
            Self::Both => true,
            Self::Only(only) => *only == slot,
        }
    }
}

pub fn within_horizon(today: NaiveDate, date: NaiveDate) -> bool {
    date >= today && (date - today).num_days() <= BOOKING_HORIZON_DAYS
}
