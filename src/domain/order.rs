use crate::domain::stock::GasType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a customer order.
///
/// Transitions only move forward: `Pending` may become `Approved`,
/// `Rejected` or `Completed`; `Approved` may become `Completed`.
/// `Rejected` and `Completed` are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Completed)
                | (Self::Approved, Self::Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// How the order total is determined at placement time.
///
/// `Quoted` trusts the caller-supplied total (the back-office path);
/// `PerUnit` computes `quantity * DepotConfig::unit_price` (the customer
/// path). Both policies existed in the previous system; they are kept as one
/// explicit enum instead of two divergent code paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricing {
    Quoted(Decimal),
    PerUnit,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub branch_id: Uuid,
    pub gas_type: GasType,
    pub quantity: u32,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub pickup_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(
        user_id: Uuid,
        branch_id: Uuid,
        gas_type: GasType,
        quantity: u32,
        total_price: Decimal,
        pickup_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            branch_id,
            gas_type,
            quantity,
            total_price,
            status: OrderStatus::Pending,
            pickup_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
