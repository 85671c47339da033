use crate::domain::order::OrderStatus;
use crate::domain::party::{Principal, Role};
use crate::domain::ports::{
    CheckoutRequest, OrderStoreBox, PaymentGatewayBox, TransactionStoreBox, UserStoreBox,
};
use crate::domain::transaction::{PaymentMethod, PaymentStatus, Transaction};
use crate::error::{DepotError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How a payment against an order is to be made.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentInstruction {
    /// Settles immediately at the counter. `method` must be a direct method.
    Direct {
        method: PaymentMethod,
        amount_paid: Decimal,
    },
    /// Defers settlement to the external gateway; the caller receives a
    /// client-facing token and the webhook finishes the job later.
    Gateway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub transaction: Transaction,
    pub gateway_token: Option<String>,
}

/// Records payment attempts and reconciles them with their order.
///
/// Two rules hold throughout: a transaction that reached `Paid` or `Failed`
/// never moves again, and `Paid` always drags the owning order to
/// `Completed` in the same unit (with compensation if the second write
/// fails).
pub struct PaymentReconciler {
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
    users: UserStoreBox,
    gateway: PaymentGatewayBox,
}

impl PaymentReconciler {
    pub fn new(
        orders: OrderStoreBox,
        transactions: TransactionStoreBox,
        users: UserStoreBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            orders,
            transactions,
            users,
            gateway,
        }
    }

    pub async fn initiate_payment(
        &self,
        principal: &Principal,
        order_id: Uuid,
        instruction: PaymentInstruction,
    ) -> Result<PaymentOutcome> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(DepotError::NotFound("order"))?;

        let allowed = match principal.role {
            Role::SuperAdmin => true,
            Role::BranchAdmin => principal.covers_branch(order.branch_id),
            Role::User => order.user_id == principal.user_id,
        };
        if !allowed {
            return Err(DepotError::Authorization(
                "payment initiation is limited to the order's owner or branch",
            ));
        }

        match order.status {
            OrderStatus::Completed => return Err(DepotError::AlreadyProcessed),
            OrderStatus::Rejected => {
                return Err(DepotError::InvalidTransition {
                    from: OrderStatus::Rejected,
                    to: OrderStatus::Completed,
                });
            }
            OrderStatus::Pending | OrderStatus::Approved => {}
        }

        // One active payment per order: a new attempt is only legal once
        // every earlier one has failed.
        let attempts = self.transactions.by_order(order.id).await?;
        if attempts.iter().any(|t| t.status != PaymentStatus::Failed) {
            return Err(DepotError::AlreadyProcessed);
        }

        match instruction {
            PaymentInstruction::Direct {
                method,
                amount_paid,
            } => {
                if !method.is_direct() {
                    return Err(DepotError::Validation(
                        "direct payment requires a direct method".to_string(),
                    ));
                }
                if amount_paid < order.total_price {
                    return Err(DepotError::InsufficientPayment {
                        paid: amount_paid,
                        due: order.total_price,
                    });
                }

                let tx = Transaction::direct(order.id, order.user_id, method, amount_paid);
                self.transactions.insert(tx.clone()).await?;
                if let Err(err) = self.complete_order(order.id).await {
                    self.discard_transaction(tx.id).await;
                    return Err(err);
                }
                info!(transaction_id = %tx.id, order_id = %order.id, %method, "direct payment settled");
                Ok(PaymentOutcome {
                    transaction: tx,
                    gateway_token: None,
                })
            }
            PaymentInstruction::Gateway => {
                let customer = self
                    .users
                    .get(order.user_id)
                    .await?
                    .ok_or(DepotError::NotFound("user"))?;

                let reference = Transaction::new_gateway_reference(order.id);
                let tx = Transaction::gateway(
                    order.id,
                    order.user_id,
                    order.total_price,
                    reference.clone(),
                );
                self.transactions.insert(tx.clone()).await?;

                let request = CheckoutRequest {
                    reference: reference.clone(),
                    gross_amount: order.total_price,
                    customer_name: customer.name,
                    customer_email: customer.email,
                };
                match self.gateway.create_token(request).await {
                    Ok(token) => {
                        info!(transaction_id = %tx.id, %reference, "gateway payment initiated");
                        Ok(PaymentOutcome {
                            transaction: tx,
                            gateway_token: Some(token),
                        })
                    }
                    Err(err) => {
                        // Token issuance failed; the pending attempt must not
                        // stay behind blocking future retries.
                        self.discard_transaction(tx.id).await;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Settles a previously initiated, still-pending transaction with a
    /// direct method.
    pub async fn pay_existing(
        &self,
        principal: &Principal,
        transaction_id: Uuid,
        method: PaymentMethod,
        amount_paid: Decimal,
    ) -> Result<Transaction> {
        let mut tx = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or(DepotError::NotFound("transaction"))?;
        if principal.role == Role::User && tx.user_id != principal.user_id {
            return Err(DepotError::NotFound("transaction"));
        }
        if tx.status != PaymentStatus::Pending {
            return Err(DepotError::AlreadyProcessed);
        }
        if !method.is_direct() {
            return Err(DepotError::Validation(
                "settling an existing transaction requires a direct method".to_string(),
            ));
        }

        let order = self
            .orders
            .get(tx.order_id)
            .await?
            .ok_or(DepotError::NotFound("order"))?;
        if amount_paid < order.total_price {
            return Err(DepotError::InsufficientPayment {
                paid: amount_paid,
                due: order.total_price,
            });
        }

        let previous = tx.clone();
        tx.method = method;
        tx.amount_paid = amount_paid;
        tx.status = PaymentStatus::Paid;
        tx.updated_at = Utc::now();
        self.transactions.update(tx.clone()).await?;

        if let Err(err) = self.complete_order(tx.order_id).await {
            if let Err(revert_err) = self.transactions.update(previous).await {
                error!(%revert_err, transaction_id = %tx.id, "revert after failed order cascade also failed");
            }
            return Err(err);
        }
        info!(transaction_id = %tx.id, order_id = %tx.order_id, "pending payment settled");
        Ok(tx)
    }

    /// Applies a verified gateway status callback.
    ///
    /// Only the webhook verifier calls this. Terminal transactions are left
    /// untouched, which is what makes duplicate and out-of-order deliveries
    /// safe: a late `pending` after a `settlement` cannot regress anything.
    pub async fn confirm_from_gateway(&self, reference: &str, gateway_status: &str) -> Result<()> {
        let mut tx = self
            .transactions
            .by_gateway_reference(reference)
            .await?
            .ok_or(DepotError::NotFound("transaction"))?;

        if tx.status.is_terminal() {
            info!(%reference, status = %tx.status, "gateway callback replay ignored");
            return Ok(());
        }

        match gateway_status {
            "settlement" => {
                let previous = tx.clone();
                tx.status = PaymentStatus::Paid;
                tx.updated_at = Utc::now();
                self.transactions.update(tx.clone()).await?;
                if let Err(err) = self.complete_order(tx.order_id).await {
                    if let Err(revert_err) = self.transactions.update(previous).await {
                        error!(%revert_err, %reference, "revert after failed order cascade also failed");
                    }
                    return Err(err);
                }
                info!(%reference, "gateway settlement applied");
            }
            "cancel" | "expire" | "failure" => {
                tx.status = PaymentStatus::Failed;
                tx.updated_at = Utc::now();
                self.transactions.update(tx).await?;
                info!(%reference, gateway_status, "gateway payment marked failed");
            }
            "pending" => {}
            other => {
                warn!(%reference, gateway_status = other, "unrecognized gateway status ignored");
            }
        }
        Ok(())
    }

    pub async fn transactions_for(&self, principal: &Principal) -> Result<Vec<Transaction>> {
        match (principal.role, principal.branch_id) {
            (Role::SuperAdmin, _) => self.transactions.all().await,
            (Role::BranchAdmin, Some(branch_id)) => {
                let branch_orders = self.orders.by_branch(branch_id).await?;
                let order_ids: Vec<Uuid> = branch_orders.iter().map(|o| o.id).collect();
                let all = self.transactions.all().await?;
                Ok(all
                    .into_iter()
                    .filter(|t| order_ids.contains(&t.order_id))
                    .collect())
            }
            (Role::User, _) => self.transactions.by_user(principal.user_id).await,
            (Role::BranchAdmin, None) => Err(DepotError::Authorization(
                "branch admin without a branch",
            )),
        }
    }

    pub async fn transaction_for(
        &self,
        principal: &Principal,
        transaction_id: Uuid,
    ) -> Result<Transaction> {
        let tx = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or(DepotError::NotFound("transaction"))?;
        if principal.role == Role::User && tx.user_id != principal.user_id {
            return Err(DepotError::NotFound("transaction"));
        }
        Ok(tx)
    }

    pub async fn remove(&self, principal: &Principal, transaction_id: Uuid) -> Result<()> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("transaction removal is admin-only"));
        }
        self.transactions.soft_delete(transaction_id).await
    }

    pub async fn restore(&self, principal: &Principal, transaction_id: Uuid) -> Result<Transaction> {
        if principal.role != Role::SuperAdmin {
            return Err(DepotError::Authorization("transaction restore is admin-only"));
        }
        self.transactions.restore(transaction_id).await
    }

    /// Drags the owning order to `Completed`; already-completed orders are a
    /// no-op so the cascade stays idempotent.
    async fn complete_order(&self, order_id: Uuid) -> Result<()> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(DepotError::NotFound("order"))?;
        if order.status == OrderStatus::Completed {
            return Ok(());
        }
        if !order.status.can_transition_to(OrderStatus::Completed) {
            return Err(DepotError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Completed,
            });
        }
        order.status = OrderStatus::Completed;
        order.updated_at = Utc::now();
        self.orders.update(order).await
    }

    /// Best-effort removal of a transaction whose enclosing unit failed.
    async fn discard_transaction(&self, transaction_id: Uuid) {
        if let Err(err) = self.transactions.soft_delete(transaction_id).await {
            error!(%err, %transaction_id, "discard of orphaned transaction failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Order;
    use crate::domain::party::User;
    use crate::domain::ports::{OrderStore, PaymentGateway, TransactionStore, UserStore};
    use crate::domain::stock::GasType;
    use crate::infrastructure::gateway::OfflineGateway;
    use crate::infrastructure::in_memory::{
        InMemoryOrderStore, InMemoryTransactionStore, InMemoryUserStore,
    };
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct RefusingGateway;

    #[async_trait]
    impl PaymentGateway for RefusingGateway {
        async fn create_token(&self, _request: CheckoutRequest) -> Result<String> {
            Err(DepotError::Gateway("token endpoint unavailable".to_string()))
        }
    }

    struct Fixture {
        reconciler: PaymentReconciler,
        transactions: InMemoryTransactionStore,
        orders: InMemoryOrderStore,
        order_id: Uuid,
        user_id: Uuid,
    }

    async fn fixture_with_gateway(gateway: PaymentGatewayBox) -> Fixture {
        let orders = InMemoryOrderStore::new();
        let transactions = InMemoryTransactionStore::new();
        let users = InMemoryUserStore::new();

        let user = User::new("Rina", "rina@mail.test", Role::User);
        let user_id = user.id;
        users.insert(user).await.unwrap();

        let order = Order::new(user_id, Uuid::new_v4(), GasType::Kg3, 2, dec!(40000), None);
        let order_id = order.id;
        orders.insert(order).await.unwrap();

        let reconciler = PaymentReconciler::new(
            Box::new(orders.clone()),
            Box::new(transactions.clone()),
            Box::new(users),
            gateway,
        );
        Fixture {
            reconciler,
            transactions,
            orders,
            order_id,
            user_id,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_gateway(Box::new(OfflineGateway::new())).await
    }

    #[tokio::test]
    async fn test_direct_payment_completes_order() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let outcome = f
            .reconciler
            .initiate_payment(
                &principal,
                f.order_id,
                PaymentInstruction::Direct {
                    method: PaymentMethod::Cash,
                    amount_paid: dec!(40000),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.transaction.status, PaymentStatus::Paid);
        assert!(outcome.gateway_token.is_none());
        let order = f.orders.get(f.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_underpayment_changes_nothing() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let err = f
            .reconciler
            .initiate_payment(
                &principal,
                f.order_id,
                PaymentInstruction::Direct {
                    method: PaymentMethod::Cash,
                    amount_paid: dec!(39999),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::InsufficientPayment { .. }));

        assert!(f.transactions.all().await.unwrap().is_empty());
        let order = f.orders.get(f.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_attempt_blocked_while_pending() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        f.reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();

        let err = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::AlreadyProcessed));
    }

    #[tokio::test]
    async fn test_retry_allowed_after_failure() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let outcome = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();
        let reference = outcome.transaction.gateway_reference.unwrap();

        f.reconciler
            .confirm_from_gateway(&reference, "expire")
            .await
            .unwrap();

        // The failed attempt no longer blocks a new one.
        let second = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();
        assert_ne!(second.transaction.gateway_reference, Some(reference));
    }

    #[tokio::test]
    async fn test_gateway_token_failure_leaves_no_row() {
        let f = fixture_with_gateway(Box::new(RefusingGateway)).await;
        let principal = Principal::customer(f.user_id);

        let err = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::Gateway(_)));
        assert!(f.transactions.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pay_existing_only_from_pending() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let outcome = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();
        let tx_id = outcome.transaction.id;

        let tx = f
            .reconciler
            .pay_existing(&principal, tx_id, PaymentMethod::BankTransfer, dec!(40000))
            .await
            .unwrap();
        assert_eq!(tx.status, PaymentStatus::Paid);
        assert_eq!(tx.method, PaymentMethod::BankTransfer);

        let order = f.orders.get(f.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        let err = f
            .reconciler
            .pay_existing(&principal, tx_id, PaymentMethod::Cash, dec!(40000))
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::AlreadyProcessed));
    }

    #[tokio::test]
    async fn test_unknown_gateway_status_is_ignored() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let outcome = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();
        let reference = outcome.transaction.gateway_reference.unwrap();

        f.reconciler
            .confirm_from_gateway(&reference, "refund_chargeback")
            .await
            .unwrap();

        let tx = f.transactions.get(outcome.transaction.id).await.unwrap().unwrap();
        assert_eq!(tx.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_pending_after_settlement_does_not_regress() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let outcome = f
            .reconciler
            .initiate_payment(&principal, f.order_id, PaymentInstruction::Gateway)
            .await
            .unwrap();
        let reference = outcome.transaction.gateway_reference.unwrap();

        f.reconciler
            .confirm_from_gateway(&reference, "settlement")
            .await
            .unwrap();
        f.reconciler
            .confirm_from_gateway(&reference, "pending")
            .await
            .unwrap();

        let tx = f.transactions.get(outcome.transaction.id).await.unwrap().unwrap();
        assert_eq!(tx.status, PaymentStatus::Paid);
        let order = f.orders.get(f.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_reference_not_found() {
        let f = fixture().await;
        let err = f
            .reconciler
            .confirm_from_gateway("ORDER-missing", "settlement")
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::NotFound("transaction")));
    }

    #[tokio::test]
    async fn test_paying_rejected_order_is_invalid() {
        let f = fixture().await;
        let principal = Principal::customer(f.user_id);

        let mut order = f.orders.get(f.order_id).await.unwrap().unwrap();
        order.status = OrderStatus::Rejected;
        f.orders.update(order).await.unwrap();

        let err = f
            .reconciler
            .initiate_payment(
                &principal,
                f.order_id,
                PaymentInstruction::Direct {
                    method: PaymentMethod::Cash,
                    amount_paid: dec!(40000),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::InvalidTransition { .. }));
    }
}
