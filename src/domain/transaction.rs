use super::vehicle::VehicleType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Charge,
    PenaltyCharge,
    TopUp,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::Charge => "charge",
            TransactionKind::PenaltyCharge => "penalty-charge",
            TransactionKind::TopUp => "top-up",
        })
    }
}

/// One billing or top-up event. Records are never modified once appended.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub kind: TransactionKind,
    pub sum: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(
        vehicle_id: impl Into<String>,
        vehicle_type: VehicleType,
        kind: TransactionKind,
        sum: Decimal,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            kind,
            sum,
            timestamp: Utc::now(),
        }
    }

    /// Whether the record contributes to the parking's aggregate balance.
    pub fn is_charge(&self) -> bool {
        matches!(
            self.kind,
            TransactionKind::Charge | TransactionKind::PenaltyCharge
        )
    }
}
