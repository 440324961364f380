pub mod booking;
pub mod schedule;
pub mod service;
pub mod session;
