use crate::domain::order::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DepotError>;

/// Error taxonomy for the distribution backend.
///
/// Business-rule and validation variants never leave partial state behind:
/// every workflow returning one of them leaves the stores exactly as they
/// were before the call.
#[derive(Error, Debug)]
pub enum DepotError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not allowed: {0}")]
    Authorization(&'static str),
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("amount paid {paid} is less than total order price {due}")]
    InsufficientPayment { paid: Decimal, due: Decimal },
    #[error("payment has already been processed")]
    AlreadyProcessed,
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("invalid webhook signature")]
    SignatureMismatch,
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Persistence(String),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for DepotError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
