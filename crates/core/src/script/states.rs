use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::schedule::{Slot, SlotOffer};
use crate::domain::session::ExtractionTier;
use crate::pricing::QuoteBreakdown;

/// Position in the scripted dialogue. The declaration order is the protocol
/// order; `protocol_index` relies on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStage {
    Greeting,
    MainMenu,
    ServiceType,
    PickupAddress,
    PickupHomeType,
    PickupBedrooms,
    PickupStairs,
    DeliveryAddress,
    DeliveryHomeType,
    DeliveryBedrooms,
    DeliveryStairs,
    Appliances,
    AppliancesDetails,
    HeavyItems,
    HeavyItemsDetails,
    PackingServices,
    CalculateDistance,
    FinalizeQuote,
    Decision,
    BookingStart,
    BookingContact,
    BookingDate,
    BookingSlot,
    BookingCreate,
    SendBookingLink,
    EmailQuote,
    Transfer,
    Done,
}

impl CallStage {
    pub fn protocol_index(&self) -> usize {
        *self as usize
    }

    /// Stages at which the session has finished and may be torn down.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Transfer)
    }

    /// Stages that run a side effect instead of waiting for caller input.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            Self::CalculateDistance | Self::FinalizeQuote | Self::BookingCreate | Self::SendBookingLink
        )
    }

    /// What kind of caller input the stage gathers, if any.
    pub fn expectation(&self) -> InputExpectation {
        match self {
            Self::MainMenu => InputExpectation::Menu(MenuKind::MainMenu),
            Self::ServiceType => InputExpectation::Menu(MenuKind::ServiceType),
            Self::PickupHomeType | Self::DeliveryHomeType => {
                InputExpectation::Menu(MenuKind::HomeType)
            }
            Self::PickupStairs
            | Self::DeliveryStairs
            | Self::Appliances
            | Self::HeavyItems
            | Self::PackingServices => InputExpectation::Menu(MenuKind::YesNo),
            Self::Decision => InputExpectation::Menu(MenuKind::Decision),
            Self::BookingSlot => InputExpectation::Menu(MenuKind::SlotChoice),
            Self::PickupAddress | Self::DeliveryAddress => {
                InputExpectation::Field(FieldRequest::Address)
            }
            Self::PickupBedrooms | Self::DeliveryBedrooms => {
                InputExpectation::Field(FieldRequest::Bedrooms)
            }
            Self::AppliancesDetails | Self::HeavyItemsDetails => {
                InputExpectation::Field(FieldRequest::FreeText)
            }
            Self::BookingStart => InputExpectation::Field(FieldRequest::PersonName),
            Self::BookingContact | Self::EmailQuote => InputExpectation::Field(FieldRequest::Email),
            Self::BookingDate => InputExpectation::Field(FieldRequest::MoveDate),
            Self::Greeting => InputExpectation::None,
            _ => {
                if self.is_system() {
                    InputExpectation::System
                } else {
                    InputExpectation::None
                }
            }
        }
    }

    /// The collected field this stage is allowed to write, if any. Distance
    /// and quote derivation stages own their computed fields.
    pub fn owned_field(&self) -> Option<FieldKey> {
        match self {
            Self::ServiceType => Some(FieldKey::ServiceCategory),
            Self::PickupAddress => Some(FieldKey::PickupAddress),
            Self::PickupHomeType => Some(FieldKey::PickupHomeType),
            Self::PickupBedrooms => Some(FieldKey::PickupBedrooms),
            Self::PickupStairs => Some(FieldKey::PickupStairs),
            Self::DeliveryAddress => Some(FieldKey::DeliveryAddress),
            Self::DeliveryHomeType => Some(FieldKey::DeliveryHomeType),
            Self::DeliveryBedrooms => Some(FieldKey::DeliveryBedrooms),
            Self::DeliveryStairs => Some(FieldKey::DeliveryStairs),
            Self::Appliances => Some(FieldKey::Appliances),
            Self::AppliancesDetails => Some(FieldKey::AppliancesDetails),
            Self::HeavyItems => Some(FieldKey::HeavyItems),
            Self::HeavyItemsDetails => Some(FieldKey::HeavyItemsDetails),
            Self::PackingServices => Some(FieldKey::PackingServices),
            Self::BookingStart => Some(FieldKey::CustomerName),
            Self::BookingContact => Some(FieldKey::CustomerEmail),
            Self::BookingDate => Some(FieldKey::MoveDate),
            Self::BookingSlot => Some(FieldKey::MoveSlot),
            Self::EmailQuote => Some(FieldKey::QuoteEmail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::MainMenu => "main-menu",
            Self::ServiceType => "service-type",
            Self::PickupAddress => "pickup-address",
            Self::PickupHomeType => "pickup-home-type",
            Self::PickupBedrooms => "pickup-bedrooms",
            Self::PickupStairs => "pickup-stairs",
            Self::DeliveryAddress => "delivery-address",
            Self::DeliveryHomeType => "delivery-home-type",
            Self::DeliveryBedrooms => "delivery-bedrooms",
            Self::DeliveryStairs => "delivery-stairs",
            Self::Appliances => "appliances",
            Self::AppliancesDetails => "appliances-details",
            Self::HeavyItems => "heavy-items",
            Self::HeavyItemsDetails => "heavy-items-details",
            Self::PackingServices => "packing-services",
            Self::CalculateDistance => "calculate-distance",
            Self::FinalizeQuote => "finalize-quote",
            Self::Decision => "decision",
            Self::BookingStart => "booking-start",
            Self::BookingContact => "booking-contact",
            Self::BookingDate => "booking-date",
            Self::BookingSlot => "booking-slot",
            Self::BookingCreate => "booking-create",
            Self::SendBookingLink => "send-booking-link",
            Self::EmailQuote => "email-quote",
            Self::Transfer => "transfer",
            Self::Done => "done",
        }
    }
}

/// How the runtime should resolve the next raw caller input for a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputExpectation {
    Menu(MenuKind),
    Field(FieldRequest),
    System,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    MainMenu,
    ServiceType,
    HomeType,
    YesNo,
    Decision,
    SlotChoice,
}

/// Free-text field kinds routed through the extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRequest {
    Address,
    PersonName,
    Email,
    MoveDate,
    Bedrooms,
    FreeText,
}

/// Collected session fields, keyed and ordered by protocol position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    ServiceCategory,
    PickupAddress,
    PickupHomeType,
    PickupBedrooms,
    PickupStairs,
    DeliveryAddress,
    DeliveryHomeType,
    DeliveryBedrooms,
    DeliveryStairs,
    Appliances,
    AppliancesDetails,
    HeavyItems,
    HeavyItemsDetails,
    PackingServices,
    DistanceMiles,
    DriveTimeMinutes,
    CustomerName,
    CustomerEmail,
    MoveDate,
    MoveSlot,
    QuoteEmail,
}

impl FieldKey {
    /// The stage permitted to write this field.
    pub fn owning_stage(&self) -> CallStage {
        match self {
            Self::ServiceCategory => CallStage::ServiceType,
            Self::PickupAddress => CallStage::PickupAddress,
            Self::PickupHomeType => CallStage::PickupHomeType,
            Self::PickupBedrooms => CallStage::PickupBedrooms,
            Self::PickupStairs => CallStage::PickupStairs,
            Self::DeliveryAddress => CallStage::DeliveryAddress,
            Self::DeliveryHomeType => CallStage::DeliveryHomeType,
            Self::DeliveryBedrooms => CallStage::DeliveryBedrooms,
            Self::DeliveryStairs => CallStage::DeliveryStairs,
            Self::Appliances => CallStage::Appliances,
            Self::AppliancesDetails => CallStage::AppliancesDetails,
            Self::HeavyItems => CallStage::HeavyItems,
            Self::HeavyItemsDetails => CallStage::HeavyItemsDetails,
            Self::PackingServices => CallStage::PackingServices,
            Self::DistanceMiles | Self::DriveTimeMinutes => CallStage::CalculateDistance,
            Self::CustomerName => CallStage::BookingStart,
            Self::CustomerEmail => CallStage::BookingContact,
            Self::MoveDate => CallStage::BookingDate,
            Self::MoveSlot => CallStage::BookingSlot,
            Self::QuoteEmail => CallStage::EmailQuote,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceCategory => "service_category",
            Self::PickupAddress => "pickup_address",
            Self::PickupHomeType => "pickup_home_type",
            Self::PickupBedrooms => "pickup_bedrooms",
            Self::PickupStairs => "pickup_stairs",
            Self::DeliveryAddress => "delivery_address",
            Self::DeliveryHomeType => "delivery_home_type",
            Self::DeliveryBedrooms => "delivery_bedrooms",
            Self::DeliveryStairs => "delivery_stairs",
            Self::Appliances => "appliances",
            Self::AppliancesDetails => "appliances_details",
            Self::HeavyItems => "heavy_items",
            Self::HeavyItemsDetails => "heavy_items_details",
            Self::PackingServices => "packing_services",
            Self::DistanceMiles => "distance_miles",
            Self::DriveTimeMinutes => "drive_time_minutes",
            Self::CustomerName => "customer_name",
            Self::CustomerEmail => "customer_email",
            Self::MoveDate => "move_date",
            Self::MoveSlot => "move_slot",
            Self::QuoteEmail => "quote_email",
        }
    }
}

/// Resolved menu choices. The extractor maps digits/keywords onto these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuSelection {
    MainMenuQuote,
    MainMenuBookingLink,
    MainMenuOperator,
    ServiceFull,
    ServiceLabor,
    HomeHouse,
    HomeApartment,
    HomeStorage,
    Yes,
    No,
    DecisionBook,
    DecisionEmail,
    DecisionRestart,
    DecisionTransfer,
    SlotMorning,
    SlotAfternoon,
}

/// A single resolved caller interaction fed to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScriptInput {
    CallStart,
    Menu(MenuSelection),
    Field { key: FieldKey, value: String, tier: ExtractionTier },
    Unrecognized { raw: String },
    Effect(EffectOutcome),
}

impl ScriptInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallStart => "call-start",
            Self::Menu(_) => "menu",
            Self::Field { .. } => "field",
            Self::Unrecognized { .. } => "unrecognized",
            Self::Effect(_) => "effect",
        }
    }
}

/// Side effect requested by a system stage; executed by the runtime, whose
/// result comes back as `ScriptInput::Effect`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    ResolveDistance { pickup: String, delivery: String },
    PriceQuote,
    CheckSlots { date: NaiveDate },
    CreateBooking { date: NaiveDate, slot: Slot },
    SendBookingLink,
    EmailQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Service,
    FallbackTable,
    Default,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EffectOutcome {
    DistanceResolved { miles: Decimal, drive_minutes: i64, source: RouteSource },
    QuotePriced { quote: QuoteBreakdown },
    SlotsChecked { date: NaiveDate, offer: Option<SlotOffer> },
    BookingCreated { reference: String },
    SlotTaken { date: NaiveDate, slot: Slot, store: String },
    BookingPersistenceFailed { detail: String },
    LinkSent { delivered: bool },
    QuoteEmailed { delivered: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffReason {
    CallerRequested,
    RetriesExhausted,
    NoAvailability,
    PersistenceFailure,
}

/// What the gateway should do next: speak and gather, speak and hang up,
/// or transfer to a human.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    Prompt { text: String },
    Complete { text: String },
    Handoff { text: String, reason: HandoffReason },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub key: FieldKey,
    pub value: String,
}

/// Attempt counter the runtime should bump when applying an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptBump {
    Unrecognized,
    AvailabilityMiss,
    OperatorEscape,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: CallStage,
    pub to: CallStage,
    pub writes: Vec<FieldWrite>,
    pub set_quote: Option<QuoteBreakdown>,
    pub clear_quote: bool,
    pub slot_offer: Option<SlotOffer>,
    pub effect: Option<Effect>,
    pub reply: Option<Reply>,
    pub bump: Option<AttemptBump>,
}

impl TransitionOutcome {
    pub fn advance(from: CallStage, to: CallStage) -> Self {
        Self {
            from,
            to,
            writes: Vec::new(),
            set_quote: None,
            clear_quote: false,
            slot_offer: None,
            effect: None,
            reply: None,
            bump: None,
        }
    }

    pub fn with_write(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.writes.push(FieldWrite { key, value: value.into() });
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn with_bump(mut self, bump: AttemptBump) -> Self {
        self.bump = Some(bump);
        self
    }
}
