use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParkingError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Parking is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },
    #[error("Vehicle {0} is already parked")]
    DuplicateId(String),
    #[error("Vehicle {0} not found")]
    NotFound(String),
    #[error("Vehicle {id} cannot leave with a negative balance ({balance})")]
    NegativeBalance { id: String, balance: Decimal },
    #[error("{0} has been shut down")]
    Disposed(&'static str),
    #[error("Log file {} does not exist", .0.display())]
    ResourceNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ParkingError>;
