use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Ewallet,
    Gateway,
}

impl PaymentMethod {
    /// Direct methods settle immediately at the counter; only `Gateway`
    /// goes through the asynchronous token/webhook flow.
    pub fn is_direct(&self) -> bool {
        !matches!(self, Self::Gateway)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Ewallet => "ewallet",
            Self::Gateway => "gateway",
        };
        write!(f, "{}", name)
    }
}

/// Payment state. `Paid` and `Failed` are terminal: a transaction that has
/// reached either never reverts to `Pending`, which is what makes webhook
/// re-delivery and out-of-order delivery safe to ignore.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// A payment attempt against an order.
///
/// `gateway_reference` is present only for gateway-mediated payments; it is
/// unique across all transactions and is the join key webhook notifications
/// are reconciled by.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount_paid: Decimal,
    pub gateway_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn direct(order_id: Uuid, user_id: Uuid, method: PaymentMethod, amount_paid: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            user_id,
            method,
            status: PaymentStatus::Paid,
            amount_paid,
            gateway_reference: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Mints a fresh reference for a gateway attempt. One order may be
    /// retried after a failed attempt, so the reference embeds a nonce next
    /// to the order id.
    pub fn new_gateway_reference(order_id: Uuid) -> String {
        format!("ORDER-{}-{}", order_id, Uuid::new_v4().simple())
    }

    /// A gateway attempt starts out `Pending` and carries the unique
    /// reference webhook callbacks will be matched by.
    pub fn gateway(order_id: Uuid, user_id: Uuid, amount_due: Decimal, reference: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            user_id,
            method: PaymentMethod::Gateway,
            status: PaymentStatus::Pending,
            amount_paid: amount_due,
            gateway_reference: Some(reference),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
