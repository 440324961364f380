pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod script;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use domain::booking::{
    Booking, BookingId, BookingStatus, CustomerDetails, ServiceDescriptor,
};
pub use domain::schedule::{Slot, SlotOffer, BOOKING_HORIZON_DAYS, BUSINESS_TIMEZONE};
pub use domain::service::{HomeType, Route, ServiceCategory};
pub use domain::session::{
    AttemptClass, AttemptCounters, CallId, CallSession, ExtractionTier, TurnRecord,
};
pub use errors::{ApplicationError, BookingError, DomainError, InterfaceError};
pub use pricing::{DeterministicPricingEngine, PricingEngine, QuoteBreakdown, QuoteInput};
pub use script::engine::{ScriptEngine, ScriptError, ScriptPolicy};
pub use script::states::{
    CallStage, Effect, EffectOutcome, FieldKey, HandoffReason, MenuKind, MenuSelection, Reply,
    RouteSource, ScriptInput, TransitionOutcome,
};
