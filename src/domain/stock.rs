use crate::error::DepotError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Cylinder size carried by the depot.
///
/// The canonical names are the short forms (`3kg`, `5kg`, `12kg`). The
/// branch-facing endpoints of the previous system used a parallel vocabulary
/// (`elpiji_3kg`, `bluegas_5kg`, `elpiji_12kg`); those spellings are accepted
/// as input aliases and normalized here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum GasType {
    #[serde(rename = "3kg", alias = "elpiji_3kg")]
    Kg3,
    #[serde(rename = "5kg", alias = "bluegas_5kg")]
    Kg5,
    #[serde(rename = "12kg", alias = "elpiji_12kg")]
    Kg12,
}

impl fmt::Display for GasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kg3 => "3kg",
            Self::Kg5 => "5kg",
            Self::Kg12 => "12kg",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GasType {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3kg" | "elpiji_3kg" => Ok(Self::Kg3),
            "5kg" | "bluegas_5kg" => Ok(Self::Kg5),
            "12kg" | "elpiji_12kg" => Ok(Self::Kg12),
            other => Err(DepotError::Validation(format!(
                "unknown gas type: {other}"
            ))),
        }
    }
}

/// Per-branch, per-type inventory counter.
///
/// Unique per `(branch_id, gas_type)`. The quantity is a plain non-negative
/// count; all mutation goes through `StockStore::adjust`, which rejects any
/// delta that would take it below zero before applying anything.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct StockEntry {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub gas_type: GasType,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StockEntry {
    pub fn new(branch_id: Uuid, gas_type: GasType, quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            branch_id,
            gas_type,
            quantity,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
