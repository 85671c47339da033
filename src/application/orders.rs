use crate::application::ledger::StockLedger;
use crate::config::DepotConfig;
use crate::domain::order::{Order, OrderStatus, Pricing};
use crate::domain::party::{Principal, Role};
use crate::domain::ports::{BranchStoreBox, OrderStoreBox, UserStoreBox};
use crate::domain::stock::GasType;
use crate::error::{DepotError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: Uuid,
    pub branch_id: Uuid,
    pub gas_type: GasType,
    pub quantity: u32,
    pub pricing: Pricing,
    pub pickup_date: Option<DateTime<Utc>>,
}

/// Order lifecycle service.
///
/// Placement is the one spot where stock and orders move together: the
/// reservation against the ledger and the order insert form one unit, with
/// the reservation released again if the insert fails.
pub struct OrderWorkflow {
    ledger: StockLedger,
    orders: OrderStoreBox,
    branches: BranchStoreBox,
    users: UserStoreBox,
    config: DepotConfig,
}

impl OrderWorkflow {
    pub fn new(
        ledger: StockLedger,
        orders: OrderStoreBox,
        branches: BranchStoreBox,
        users: UserStoreBox,
        config: DepotConfig,
    ) -> Self {
        Self {
            ledger,
            orders,
            branches,
            users,
            config,
        }
    }

    pub async fn place_order(&self, principal: &Principal, request: PlaceOrder) -> Result<Order> {
        if request.quantity < 1 {
            return Err(DepotError::Validation(
                "order quantity must be at least 1".to_string(),
            ));
        }
        if let Some(pickup) = request.pickup_date
            && pickup <= Utc::now()
        {
            return Err(DepotError::Validation(
                "pickup date must be in the future".to_string(),
            ));
        }
        // Customers order for themselves; admins may order on a customer's
        // behalf.
        if principal.role == Role::User && request.user_id != principal.user_id {
            return Err(DepotError::Authorization(
                "customers may only place their own orders",
            ));
        }

        self.users
            .get(request.user_id)
            .await?
            .ok_or(DepotError::NotFound("user"))?;
        self.branches
            .get(request.branch_id)
            .await?
            .ok_or(DepotError::NotFound("branch"))?;

        let total_price = match request.pricing {
            Pricing::Quoted(total) => {
                if total < Decimal::ZERO {
                    return Err(DepotError::Validation(
                        "total price must not be negative".to_string(),
                    ));
                }
                total
            }
            Pricing::PerUnit => Decimal::from(request.quantity) * self.config.unit_price,
        };

        // Check-and-decrement happens inside the ledger; an insufficient
        // level aborts here with no order row written.
        self.ledger
            .reserve(request.branch_id, request.gas_type, request.quantity)
            .await?;

        let order = Order::new(
            request.user_id,
            request.branch_id,
            request.gas_type,
            request.quantity,
            total_price,
            request.pickup_date,
        );
        if let Err(err) = self.orders.insert(order.clone()).await {
            // Put the cylinders back before surfacing the fault.
            if let Err(release_err) = self
                .ledger
                .release(request.branch_id, request.gas_type, request.quantity)
                .await
            {
                error!(%release_err, order_id = %order.id, "stock release after failed insert also failed");
            }
            return Err(err);
        }

        info!(order_id = %order.id, branch_id = %order.branch_id, gas_type = %order.gas_type,
              quantity = order.quantity, "order placed");
        Ok(order)
    }

    /// Moves an order along its lifecycle, enforcing the forward-only state
    /// machine and the actor's branch scope.
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(DepotError::NotFound("order"))?;

        if !principal.covers_branch(order.branch_id) {
            return Err(DepotError::Authorization(
                "order status updates are limited to the order's branch",
            ));
        }
        if !order.status.can_transition_to(new_status) {
            return Err(DepotError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        order.status = new_status;
        order.updated_at = Utc::now();
        self.orders.update(order.clone()).await?;
        info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }

    /// Role-scoped listing: customers see their own orders, branch admins
    /// their branch's, super admins everything.
    pub async fn orders_for(&self, principal: &Principal) -> Result<Vec<Order>> {
        match (principal.role, principal.branch_id) {
            (Role::SuperAdmin, _) => self.orders.all().await,
            (Role::BranchAdmin, Some(branch_id)) => self.orders.by_branch(branch_id).await,
            (Role::User, _) => self.orders.by_user(principal.user_id).await,
            (Role::BranchAdmin, None) => Err(DepotError::Authorization(
                "branch admin without a branch",
            )),
        }
    }

    pub async fn order_for(&self, principal: &Principal, order_id: Uuid) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(DepotError::NotFound("order"))?;
        let visible = match principal.role {
            Role::SuperAdmin => true,
            Role::BranchAdmin => principal.covers_branch(order.branch_id),
            Role::User => order.user_id == principal.user_id,
        };
        if !visible {
            return Err(DepotError::NotFound("order"));
        }
        Ok(order)
    }

    pub async fn cancel(&self, principal: &Principal, order_id: Uuid) -> Result<()> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("order removal is admin-only"));
        }
        self.orders.soft_delete(order_id).await
    }

    pub async fn restore(&self, principal: &Principal, order_id: Uuid) -> Result<Order> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("order restore is admin-only"));
        }
        self.orders.restore(order_id).await
    }
}
