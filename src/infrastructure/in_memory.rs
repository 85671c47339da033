use crate::domain::order::Order;
use crate::domain::party::{Branch, User};
use crate::domain::ports::{BranchStore, OrderStore, StockStore, TransactionStore, UserStore};
use crate::domain::stock::{GasType, StockEntry};
use crate::domain::transaction::Transaction;
use crate::error::{DepotError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory stock store.
///
/// All rows live in one `Arc<RwLock<HashMap>>`; taking the write lock for
/// `adjust` is what serializes concurrent check-then-apply mutations on the
/// same `(branch_id, gas_type)` key.
#[derive(Default, Clone)]
pub struct InMemoryStockStore {
    entries: Arc<RwLock<HashMap<Uuid, StockEntry>>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn adjust(&self, branch_id: Uuid, gas_type: GasType, delta: i64) -> Result<StockEntry> {
        let mut entries = self.entries.write().await;
        let current = entries
            .values()
            .find(|e| e.branch_id == branch_id && e.gas_type == gas_type && !e.is_deleted())
            .map(|e| (e.id, e.quantity));

        match current {
            Some((id, quantity)) => {
                let next = i64::from(quantity) + delta;
                if next < 0 {
                    return Err(DepotError::InsufficientStock {
                        requested: delta.unsigned_abs() as u32,
                        available: quantity,
                    });
                }
                let entry = entries.get_mut(&id).ok_or_else(|| {
                    DepotError::Persistence("stock entry vanished under lock".to_string())
                })?;
                entry.quantity = next as u32;
                entry.updated_at = Utc::now();
                Ok(entry.clone())
            }
            None if delta >= 0 => {
                let entry = StockEntry::new(branch_id, gas_type, delta as u32);
                entries.insert(entry.id, entry.clone());
                Ok(entry)
            }
            None => Err(DepotError::InsufficientStock {
                requested: delta.unsigned_abs() as u32,
                available: 0,
            }),
        }
    }

    async fn get(&self, branch_id: Uuid, gas_type: GasType) -> Result<Option<StockEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.branch_id == branch_id && e.gas_type == gas_type && !e.is_deleted())
            .cloned())
    }

    async fn all(&self) -> Result<Vec<StockEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|e| !e.is_deleted()).cloned().collect())
    }

    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<StockEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| e.branch_id == branch_id && !e.is_deleted())
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .filter(|e| !e.is_deleted())
            .ok_or(DepotError::NotFound("stock entry"))?;
        entry.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<StockEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .filter(|e| e.is_deleted())
            .ok_or(DepotError::NotFound("stock entry"))?;
        entry.deleted_at = None;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}

/// A thread-safe in-memory order store.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).filter(|o| !o.is_deleted()).cloned())
    }

    async fn update(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(DepotError::NotFound("order"));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|o| !o.is_deleted()).cloned().collect())
    }

    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.branch_id == branch_id && !o.is_deleted())
            .cloned()
            .collect())
    }

    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.user_id == user_id && !o.is_deleted())
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .filter(|o| !o.is_deleted())
            .ok_or(DepotError::NotFound("order"))?;
        order.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .filter(|o| o.is_deleted())
            .ok_or(DepotError::NotFound("order"))?;
        order.deleted_at = None;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

/// A thread-safe in-memory transaction store.
///
/// `insert` rejects a duplicate `gateway_reference` the way the relational
/// schema's unique index would, deleted rows included.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<Uuid, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if let Some(reference) = &tx.gateway_reference
            && transactions
                .values()
                .any(|t| t.gateway_reference.as_deref() == Some(reference.as_str()))
        {
            return Err(DepotError::Persistence(format!(
                "duplicate gateway reference: {reference}"
            )));
        }
        transactions.insert(tx.id, tx);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if !transactions.contains_key(&tx.id) {
            return Err(DepotError::NotFound("transaction"));
        }
        transactions.insert(tx.id, tx);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| !t.is_deleted())
            .cloned()
            .collect())
    }

    async fn by_order(&self, order_id: Uuid) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.order_id == order_id && !t.is_deleted())
            .cloned()
            .collect())
    }

    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.user_id == user_id && !t.is_deleted())
            .cloned()
            .collect())
    }

    async fn by_gateway_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .find(|t| t.gateway_reference.as_deref() == Some(reference) && !t.is_deleted())
            .cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(&id)
            .filter(|t| !t.is_deleted())
            .ok_or(DepotError::NotFound("transaction"))?;
        tx.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<Transaction> {
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(&id)
            .filter(|t| t.is_deleted())
            .ok_or(DepotError::NotFound("transaction"))?;
        tx.deleted_at = None;
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryBranchStore {
    branches: Arc<RwLock<HashMap<Uuid, Branch>>>,
}

impl InMemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BranchStore for InMemoryBranchStore {
    async fn insert(&self, branch: Branch) -> Result<()> {
        let mut branches = self.branches.write().await;
        branches.insert(branch.id, branch);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Branch>> {
        let branches = self.branches.read().await;
        Ok(branches.get(&id).filter(|b| !b.is_deleted()).cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut branches = self.branches.write().await;
        let branch = branches
            .get_mut(&id)
            .filter(|b| !b.is_deleted())
            .ok_or(DepotError::NotFound("branch"))?;
        branch.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<Branch> {
        let mut branches = self.branches.write().await;
        let branch = branches
            .get_mut(&id)
            .filter(|b| b.is_deleted())
            .ok_or(DepotError::NotFound("branch"))?;
        branch.deleted_at = None;
        Ok(branch.clone())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or(DepotError::NotFound("user"))?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|u| u.is_deleted())
            .ok_or(DepotError::NotFound("user"))?;
        user.deleted_at = None;
        Ok(user.clone())
    }
}
