use crate::domain::order::Order;
use crate::domain::party::{Branch, User};
use crate::domain::ports::{BranchStore, OrderStore, StockStore, TransactionStore, UserStore};
use crate::domain::stock::{GasType, StockEntry};
use crate::domain::transaction::Transaction;
use crate::error::{DepotError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for stock entries.
pub const CF_STOCKS: &str = "stocks";
/// Column Family for orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for payment transactions.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for branches.
pub const CF_BRANCHES: &str = "branches";
/// Column Family for users.
pub const CF_USERS: &str = "users";

/// A persistent store backed by RocksDB.
///
/// Each entity lives in its own Column Family, keyed by its UUID and encoded
/// as JSON. `Clone` shares the underlying `Arc<DB>`, so one opened store can
/// back every port at once. The `write_guard` mutex serializes stock
/// read-modify-write cycles, standing in for the row lock a relational
/// store would take.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring all
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_STOCKS, CF_ORDERS, CF_TRANSACTIONS, CF_BRANCHES, CF_USERS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DepotError::Persistence(format!("column family missing: {name}")))
    }

    fn put<T: Serialize>(&self, cf: &'static str, id: Uuid, value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|err| DepotError::Persistence(format!("encode error: {err}")))?;
        self.db.put_cf(&cf, id.as_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &'static str, id: Uuid) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(&cf, id.as_bytes())? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|err| DepotError::Persistence(format!("decode error: {err}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_, bytes) = item?;
            let value = serde_json::from_slice(&bytes)
                .map_err(|err| DepotError::Persistence(format!("decode error: {err}")))?;
            values.push(value);
        }
        Ok(values)
    }
}

#[async_trait]
impl StockStore for RocksDbStore {
    async fn adjust(&self, branch_id: Uuid, gas_type: GasType, delta: i64) -> Result<StockEntry> {
        // Serialize the whole check-then-apply cycle.
        let _guard = self.write_guard.lock().await;
        let existing = self
            .scan::<StockEntry>(CF_STOCKS)?
            .into_iter()
            .find(|e| e.branch_id == branch_id && e.gas_type == gas_type && !e.is_deleted());

        match existing {
            Some(mut entry) => {
                let next = i64::from(entry.quantity) + delta;
                if next < 0 {
                    return Err(DepotError::InsufficientStock {
                        requested: delta.unsigned_abs() as u32,
                        available: entry.quantity,
                    });
                }
                entry.quantity = next as u32;
                entry.updated_at = Utc::now();
                self.put(CF_STOCKS, entry.id, &entry)?;
                Ok(entry)
            }
            None if delta >= 0 => {
                let entry = StockEntry::new(branch_id, gas_type, delta as u32);
                self.put(CF_STOCKS, entry.id, &entry)?;
                Ok(entry)
            }
            None => Err(DepotError::InsufficientStock {
                requested: delta.unsigned_abs() as u32,
                available: 0,
            }),
        }
    }

    async fn get(&self, branch_id: Uuid, gas_type: GasType) -> Result<Option<StockEntry>> {
        Ok(self
            .scan::<StockEntry>(CF_STOCKS)?
            .into_iter()
            .find(|e| e.branch_id == branch_id && e.gas_type == gas_type && !e.is_deleted()))
    }

    async fn all(&self) -> Result<Vec<StockEntry>> {
        Ok(self
            .scan::<StockEntry>(CF_STOCKS)?
            .into_iter()
            .filter(|e| !e.is_deleted())
            .collect())
    }

    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<StockEntry>> {
        Ok(self
            .scan::<StockEntry>(CF_STOCKS)?
            .into_iter()
            .filter(|e| e.branch_id == branch_id && !e.is_deleted())
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let mut entry = self
            .fetch::<StockEntry>(CF_STOCKS, id)?
            .filter(|e| !e.is_deleted())
            .ok_or(DepotError::NotFound("stock entry"))?;
        entry.deleted_at = Some(Utc::now());
        self.put(CF_STOCKS, id, &entry)
    }

    async fn restore(&self, id: Uuid) -> Result<StockEntry> {
        let _guard = self.write_guard.lock().await;
        let mut entry = self
            .fetch::<StockEntry>(CF_STOCKS, id)?
            .filter(|e| e.is_deleted())
            .ok_or(DepotError::NotFound("stock entry"))?;
        entry.deleted_at = None;
        entry.updated_at = Utc::now();
        self.put(CF_STOCKS, id, &entry)?;
        Ok(entry)
    }
}

#[async_trait]
impl OrderStore for RocksDbStore {
    async fn insert(&self, order: Order) -> Result<()> {
        self.put(CF_ORDERS, order.id, &order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self
            .fetch::<Order>(CF_ORDERS, id)?
            .filter(|o| !o.is_deleted()))
    }

    async fn update(&self, order: Order) -> Result<()> {
        if self.fetch::<Order>(CF_ORDERS, order.id)?.is_none() {
            return Err(DepotError::NotFound("order"));
        }
        self.put(CF_ORDERS, order.id, &order)
    }

    async fn all(&self) -> Result<Vec<Order>> {
        Ok(self
            .scan::<Order>(CF_ORDERS)?
            .into_iter()
            .filter(|o| !o.is_deleted())
            .collect())
    }

    async fn by_branch(&self, branch_id: Uuid) -> Result<Vec<Order>> {
        Ok(self
            .scan::<Order>(CF_ORDERS)?
            .into_iter()
            .filter(|o| o.branch_id == branch_id && !o.is_deleted())
            .collect())
    }

    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        Ok(self
            .scan::<Order>(CF_ORDERS)?
            .into_iter()
            .filter(|o| o.user_id == user_id && !o.is_deleted())
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut order = self
            .fetch::<Order>(CF_ORDERS, id)?
            .filter(|o| !o.is_deleted())
            .ok_or(DepotError::NotFound("order"))?;
        order.deleted_at = Some(Utc::now());
        self.put(CF_ORDERS, id, &order)
    }

    async fn restore(&self, id: Uuid) -> Result<Order> {
        let mut order = self
            .fetch::<Order>(CF_ORDERS, id)?
            .filter(|o| o.is_deleted())
            .ok_or(DepotError::NotFound("order"))?;
        order.deleted_at = None;
        order.updated_at = Utc::now();
        self.put(CF_ORDERS, id, &order)?;
        Ok(order)
    }
}

#[async_trait]
impl TransactionStore for RocksDbStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        if let Some(reference) = &tx.gateway_reference
            && self
                .scan::<Transaction>(CF_TRANSACTIONS)?
                .iter()
                .any(|t| t.gateway_reference.as_deref() == Some(reference.as_str()))
        {
            return Err(DepotError::Persistence(format!(
                "duplicate gateway reference: {reference}"
            )));
        }
        self.put(CF_TRANSACTIONS, tx.id, &tx)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self
            .fetch::<Transaction>(CF_TRANSACTIONS, id)?
            .filter(|t| !t.is_deleted()))
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        if self.fetch::<Transaction>(CF_TRANSACTIONS, tx.id)?.is_none() {
            return Err(DepotError::NotFound("transaction"));
        }
        self.put(CF_TRANSACTIONS, tx.id, &tx)
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|t| !t.is_deleted())
            .collect())
    }

    async fn by_order(&self, order_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|t| t.order_id == order_id && !t.is_deleted())
            .collect())
    }

    async fn by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|t| t.user_id == user_id && !t.is_deleted())
            .collect())
    }

    async fn by_gateway_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        Ok(self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .find(|t| t.gateway_reference.as_deref() == Some(reference) && !t.is_deleted()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self
            .fetch::<Transaction>(CF_TRANSACTIONS, id)?
            .filter(|t| !t.is_deleted())
            .ok_or(DepotError::NotFound("transaction"))?;
        tx.deleted_at = Some(Utc::now());
        self.put(CF_TRANSACTIONS, id, &tx)
    }

    async fn restore(&self, id: Uuid) -> Result<Transaction> {
        let mut tx = self
            .fetch::<Transaction>(CF_TRANSACTIONS, id)?
            .filter(|t| t.is_deleted())
            .ok_or(DepotError::NotFound("transaction"))?;
        tx.deleted_at = None;
        tx.updated_at = Utc::now();
        self.put(CF_TRANSACTIONS, id, &tx)?;
        Ok(tx)
    }
}

#[async_trait]
impl BranchStore for RocksDbStore {
    async fn insert(&self, branch: Branch) -> Result<()> {
        self.put(CF_BRANCHES, branch.id, &branch)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Branch>> {
        Ok(self
            .fetch::<Branch>(CF_BRANCHES, id)?
            .filter(|b| !b.is_deleted()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut branch = self
            .fetch::<Branch>(CF_BRANCHES, id)?
            .filter(|b| !b.is_deleted())
            .ok_or(DepotError::NotFound("branch"))?;
        branch.deleted_at = Some(Utc::now());
        self.put(CF_BRANCHES, id, &branch)
    }

    async fn restore(&self, id: Uuid) -> Result<Branch> {
        let mut branch = self
            .fetch::<Branch>(CF_BRANCHES, id)?
            .filter(|b| b.is_deleted())
            .ok_or(DepotError::NotFound("branch"))?;
        branch.deleted_at = None;
        self.put(CF_BRANCHES, id, &branch)?;
        Ok(branch)
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn insert(&self, user: User) -> Result<()> {
        self.put(CF_USERS, user.id, &user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .fetch::<User>(CF_USERS, id)?
            .filter(|u| !u.is_deleted()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut user = self
            .fetch::<User>(CF_USERS, id)?
            .filter(|u| !u.is_deleted())
            .ok_or(DepotError::NotFound("user"))?;
        user.deleted_at = Some(Utc::now());
        self.put(CF_USERS, id, &user)
    }

    async fn restore(&self, id: Uuid) -> Result<User> {
        let mut user = self
            .fetch::<User>(CF_USERS, id)?
            .filter(|u| u.is_deleted())
            .ok_or(DepotError::NotFound("user"))?;
        user.deleted_at = None;
        self.put(CF_USERS, id, &user)?;
        Ok(user)
    }
}
