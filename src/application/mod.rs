//! Application layer containing the parking registry and billing core.
//!
//! `Parking` serialises client operations and the trigger-driven billing sweep
//! and status snapshot through a single lock.

pub mod parking;
