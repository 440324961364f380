use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    FullService,
    LaborOnly,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullService => "full_service",
            Self::LaborOnly => "labor_only",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullService => "Full-Service Moving",
            Self::LaborOnly => "Labor-Only Moving",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full_service" => Some(Self::FullService),
            "labor_only" => Some(Self::LaborOnly),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeType {
    House,
    Apartment,
    StorageUnit,
}

impl HomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::StorageUnit => "storage_unit",
        }
    }
}

/// Pickup/delivery pair with the resolved travel estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub pickup: String,
    pub delivery: String,
    pub distance_miles: Decimal,
    pub drive_time_minutes: i64,
}
