//! Domain layer: vehicles, the fee policy, transaction records and the ports
//! the parking core talks to.

pub mod ports;
pub mod tariff;
pub mod transaction;
pub mod vehicle;
