pub mod availability;
pub mod booking;
pub mod distance;
pub mod extractor;
pub mod nlu;
pub mod runtime;
pub mod session;

pub use availability::{AvailabilityChecker, BookingLedgerStore, SlotStatus};
pub use booking::BookingCoordinator;
pub use distance::{
    fallback_route, DistanceService, HttpDistanceService, RouteEstimate, UnavailableDistanceService,
};
pub use extractor::{match_menu, Extraction, FieldExtractor};
pub use nlu::{HttpNluClient, NluClient};
pub use runtime::{AgentRuntime, InboundEvent, OutputAction, RuntimeDeps};
pub use session::SessionStore;
