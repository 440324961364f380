pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_demo_schedule, SeedResult};
pub use repositories::{
    BookingRepository, InMemoryBookingRepository, InMemoryScheduleStore, RepositoryError,
    ScheduleStore, SqlBookingRepository, SqlScheduleStore,
};
