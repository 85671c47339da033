use crate::domain::party::{Principal, Role};
use crate::domain::ports::{BranchStoreBox, StockStoreBox};
use crate::domain::stock::{GasType, StockEntry};
use crate::error::{DepotError, Result};
use tracing::info;
use uuid::Uuid;

/// Branch inventory service.
///
/// All quantity changes funnel through `StockStore::adjust`, so the
/// non-negativity check cannot be bypassed from here or from the order
/// workflow.
pub struct StockLedger {
    stocks: StockStoreBox,
    branches: BranchStoreBox,
}

impl StockLedger {
    pub fn new(stocks: StockStoreBox, branches: BranchStoreBox) -> Self {
        Self { stocks, branches }
    }

    /// Books cylinders into a branch, creating the entry on first intake.
    ///
    /// Super admins may target any branch; branch admins only their own.
    pub async fn stock_in(
        &self,
        principal: &Principal,
        branch_id: Uuid,
        gas_type: GasType,
        quantity: u32,
    ) -> Result<StockEntry> {
        if quantity < 1 {
            return Err(DepotError::Validation(
                "stock quantity must be at least 1".to_string(),
            ));
        }
        if !principal.covers_branch(branch_id) {
            return Err(DepotError::Authorization("stock intake is branch-scoped"));
        }
        self.branches
            .get(branch_id)
            .await?
            .ok_or(DepotError::NotFound("branch"))?;

        let entry = self.stocks.adjust(branch_id, gas_type, i64::from(quantity)).await?;
        info!(%branch_id, %gas_type, quantity, level = entry.quantity, "stock booked in");
        Ok(entry)
    }

    /// Takes `quantity` cylinders out of a branch for an order, atomically
    /// checked against the current level.
    pub(crate) async fn reserve(
        &self,
        branch_id: Uuid,
        gas_type: GasType,
        quantity: u32,
    ) -> Result<StockEntry> {
        self.stocks
            .adjust(branch_id, gas_type, -i64::from(quantity))
            .await
    }

    /// Puts a reservation back, compensating a failed order insert.
    pub(crate) async fn release(
        &self,
        branch_id: Uuid,
        gas_type: GasType,
        quantity: u32,
    ) -> Result<StockEntry> {
        self.stocks.adjust(branch_id, gas_type, i64::from(quantity)).await
    }

    /// Role-scoped listing: super admins see every branch, branch admins
    /// their own.
    pub async fn levels(&self, principal: &Principal) -> Result<Vec<StockEntry>> {
        match (principal.role, principal.branch_id) {
            (Role::SuperAdmin, _) => self.stocks.all().await,
            (Role::BranchAdmin, Some(branch_id)) => self.stocks.by_branch(branch_id).await,
            _ => Err(DepotError::Authorization("stock levels are admin-only")),
        }
    }

    pub async fn remove(&self, principal: &Principal, id: Uuid) -> Result<()> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("stock removal is admin-only"));
        }
        self.stocks.soft_delete(id).await
    }

    pub async fn restore(&self, principal: &Principal, id: Uuid) -> Result<StockEntry> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("stock restore is admin-only"));
        }
        self.stocks.restore(id).await
    }
}
