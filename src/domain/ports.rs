use crate::domain::order::Order;
use crate::domain::party::{Branch, User};
use crate::domain::stock::{GasType, StockEntry};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

pub type StockStoreBox = Box<dyn StockStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type BranchStoreBox = Box<dyn BranchStore>;
pub type UserStoreBox = Box<dyn UserStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// Storage port for stock entries.
///
/// Reads exclude soft-deleted rows. `adjust` is the single mutation path for
/// quantities and must apply the check-then-write as one atomic unit against
/// the currently persisted value; concurrent adjustments to the same
/// `(branch_id, gas_type)` key serialize inside the implementation.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Applies `delta` to the live entry for the key, creating it when a
    /// positive delta targets a missing entry. A negative delta that would
    /// drop the quantity below zero fails with `InsufficientStock` and
    /// leaves the entry untouched.
    async fn adjust(&self, branch_id: Uuid, gas_type: GasType, delta: i64) -> Result<StockEntry>;
    async fn get(&self, branch_id: Uuid, gas_type: GasType) -> Result<Option<StockEntry>>;
    async fn all(&self) -> Result<Vec<StockEntry>>;
    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<StockEntry>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn restore(&self, id: Uuid) -> Result<StockEntry>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>>;
    async fn update(&self, order: Order) -> Result<()>;
    async fn all(&self) -> Result<Vec<Order>>;
    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<Order>>;
    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn restore(&self, id: Uuid) -> Result<Order>;
}

/// Storage port for payment transactions.
///
/// `insert` enforces uniqueness of `gateway_reference` across all rows,
/// deleted or not; the reference is the join key for webhook reconciliation.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Transaction>>;
    async fn update(&self, tx: Transaction) -> Result<()>;
    async fn all(&self) -> Result<Vec<Transaction>>;
    async fn by_order(&self, order_id: Uuid) -> Result<Vec<Transaction>>;
    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>>;
    async fn by_gateway_reference(&self, reference: &str) -> Result<Option<Transaction>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn restore(&self, id: Uuid) -> Result<Transaction>;
}

#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn insert(&self, branch: Branch) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Branch>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn restore(&self, id: Uuid) -> Result<Branch>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn restore(&self, id: Uuid) -> Result<User>;
}

/// What the external gateway needs to mint a client-facing payment token.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub reference: String,
    pub gross_amount: Decimal,
    pub customer_name: String,
    pub customer_email: String,
}

/// The third-party payment processor.
///
/// Token issuance may fail; the error surfaces to the caller as
/// `DepotError::Gateway` rather than being retried here. Status updates come
/// back later through the signed webhook path, not through this trait.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_token(&self, request: CheckoutRequest) -> Result<String>;
}
