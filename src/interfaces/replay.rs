use crate::application::ledger::StockLedger;
use crate::application::orders::{OrderWorkflow, PlaceOrder};
use crate::application::payments::{PaymentInstruction, PaymentReconciler};
use crate::application::webhook::{GatewayNotification, WebhookVerifier, notification_signature};
use crate::config::DepotConfig;
use crate::domain::order::Pricing;
use crate::domain::party::{Branch, Principal, Role, User};
use crate::domain::ports::{
    BranchStore, BranchStoreBox, OrderStore, StockStore, TransactionStore, UserStore,
};
use crate::domain::transaction::PaymentMethod;
use crate::error::{DepotError, Result};
use crate::infrastructure::gateway::OfflineGateway;
use crate::infrastructure::in_memory::{
    InMemoryBranchStore, InMemoryOrderStore, InMemoryStockStore, InMemoryTransactionStore,
    InMemoryUserStore,
};
use crate::interfaces::csv::ops_reader::{OpKind, OpRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

struct OrderHandle {
    order_id: Uuid,
    total: Decimal,
    gateway_reference: Option<String>,
}

/// Feeds a replay script through the full service stack.
///
/// Branches are created on first mention and addressed by their script tag;
/// orders get a script tag too so later `pay` and `webhook` rows can find
/// them. Webhook rows are signed with the configured server key and pushed
/// through the verifier, so the run exercises the same path a live gateway
/// callback would.
pub struct ReplayDriver {
    principal: Principal,
    customer_id: Uuid,
    ledger: StockLedger,
    workflow: OrderWorkflow,
    payments: PaymentReconciler,
    verifier: WebhookVerifier,
    branches: BranchStoreBox,
    server_key: String,
    branch_tags: HashMap<String, Uuid>,
    tag_names: HashMap<Uuid, String>,
    order_tags: HashMap<String, OrderHandle>,
}

impl ReplayDriver {
    /// Builds a driver over fresh in-memory stores.
    pub async fn in_memory(config: DepotConfig) -> Result<Self> {
        Self::assemble(
            config,
            InMemoryStockStore::new(),
            InMemoryOrderStore::new(),
            InMemoryTransactionStore::new(),
            InMemoryBranchStore::new(),
            InMemoryUserStore::new(),
        )
        .await
    }

    /// Builds a driver over a persistent RocksDB store at `path`.
    #[cfg(feature = "storage-rocksdb")]
    pub async fn with_rocksdb<P: AsRef<std::path::Path>>(
        config: DepotConfig,
        path: P,
    ) -> Result<Self> {
        let store = crate::infrastructure::rocksdb::RocksDbStore::open(path)?;
        Self::assemble(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
        .await
    }

    async fn assemble<SS, OS, TS, BS, US>(
        config: DepotConfig,
        stocks: SS,
        orders: OS,
        transactions: TS,
        branches: BS,
        users: US,
    ) -> Result<Self>
    where
        SS: StockStore + Clone + 'static,
        OS: OrderStore + Clone + 'static,
        TS: TransactionStore + Clone + 'static,
        BS: BranchStore + Clone + 'static,
        US: UserStore + Clone + 'static,
    {
        let customer = User::new("Replay Customer", "customer@depot.test", Role::User);
        let customer_id = customer.id;
        users.insert(customer).await?;

        let operator = User::new("Replay Operator", "ops@depot.test", Role::SuperAdmin);
        let principal = Principal::super_admin(operator.id);
        users.insert(operator).await?;

        let ledger = StockLedger::new(Box::new(stocks.clone()), Box::new(branches.clone()));
        let workflow = OrderWorkflow::new(
            StockLedger::new(Box::new(stocks), Box::new(branches.clone())),
            Box::new(orders.clone()),
            Box::new(branches.clone()),
            Box::new(users.clone()),
            config.clone(),
        );
        let payments = PaymentReconciler::new(
            Box::new(orders.clone()),
            Box::new(transactions.clone()),
            Box::new(users.clone()),
            Box::new(OfflineGateway::new()),
        );
        let verifier = WebhookVerifier::new(
            PaymentReconciler::new(
                Box::new(orders),
                Box::new(transactions),
                Box::new(users),
                Box::new(OfflineGateway::new()),
            ),
            config.gateway_server_key.clone(),
        );

        Ok(Self {
            principal,
            customer_id,
            ledger,
            workflow,
            payments,
            verifier,
            branches: Box::new(branches),
            server_key: config.gateway_server_key,
            branch_tags: HashMap::new(),
            tag_names: HashMap::new(),
            order_tags: HashMap::new(),
        })
    }

    pub async fn apply(&mut self, record: OpRecord) -> Result<()> {
        match record.op {
            OpKind::Stockin => {
                let branch_id = self.branch_id(record.branch).await?;
                let gas_type = record.gas_type.ok_or_else(|| {
                    DepotError::Validation("stockin row requires a gas type".to_string())
                })?;
                let quantity = record.quantity.ok_or_else(|| {
                    DepotError::Validation("stockin row requires a quantity".to_string())
                })?;
                self.ledger
                    .stock_in(&self.principal, branch_id, gas_type, quantity)
                    .await?;
            }
            OpKind::Order => {
                let tag = record.tag.ok_or_else(|| {
                    DepotError::Validation("order row requires a tag".to_string())
                })?;
                let branch_id = self.branch_id(record.branch).await?;
                let gas_type = record.gas_type.ok_or_else(|| {
                    DepotError::Validation("order row requires a gas type".to_string())
                })?;
                let quantity = record.quantity.ok_or_else(|| {
                    DepotError::Validation("order row requires a quantity".to_string())
                })?;
                let pricing = match record.amount {
                    Some(total) => Pricing::Quoted(total),
                    None => Pricing::PerUnit,
                };

                let order = self
                    .workflow
                    .place_order(
                        &self.principal,
                        PlaceOrder {
                            user_id: self.customer_id,
                            branch_id,
                            gas_type,
                            quantity,
                            pricing,
                            pickup_date: None,
                        },
                    )
                    .await?;
                self.order_tags.insert(
                    tag,
                    OrderHandle {
                        order_id: order.id,
                        total: order.total_price,
                        gateway_reference: None,
                    },
                );
            }
            OpKind::Pay => {
                let tag = record.tag.ok_or_else(|| {
                    DepotError::Validation("pay row requires an order tag".to_string())
                })?;
                let handle = self.order_tags.get_mut(&tag).ok_or_else(|| {
                    DepotError::Validation(format!("unknown order tag: {tag}"))
                })?;

                match record.method.unwrap_or(PaymentMethod::Cash) {
                    PaymentMethod::Gateway => {
                        let outcome = self
                            .payments
                            .initiate_payment(
                                &self.principal,
                                handle.order_id,
                                PaymentInstruction::Gateway,
                            )
                            .await?;
                        handle.gateway_reference = outcome.transaction.gateway_reference;
                    }
                    method => {
                        let amount_paid = record.amount.ok_or_else(|| {
                            DepotError::Validation(
                                "direct payment requires an amount".to_string(),
                            )
                        })?;
                        self.payments
                            .initiate_payment(
                                &self.principal,
                                handle.order_id,
                                PaymentInstruction::Direct {
                                    method,
                                    amount_paid,
                                },
                            )
                            .await?;
                    }
                }
            }
            OpKind::Webhook => {
                let tag = record.tag.ok_or_else(|| {
                    DepotError::Validation("webhook row requires an order tag".to_string())
                })?;
                let handle = self.order_tags.get(&tag).ok_or_else(|| {
                    DepotError::Validation(format!("unknown order tag: {tag}"))
                })?;
                let reference = handle.gateway_reference.clone().ok_or_else(|| {
                    DepotError::Validation(
                        "webhook rows need a prior gateway payment".to_string(),
                    )
                })?;
                let status = record.status.ok_or_else(|| {
                    DepotError::Validation("webhook row requires a status".to_string())
                })?;

                let gross_amount = handle.total.to_string();
                let signature_key =
                    notification_signature(&reference, "200", &gross_amount, &self.server_key);
                let notification = GatewayNotification {
                    order_id: reference,
                    status_code: "200".to_string(),
                    gross_amount,
                    signature_key,
                    transaction_status: status,
                };
                let payload = serde_json::to_vec(&notification)
                    .map_err(|err| DepotError::Persistence(err.to_string()))?;
                self.verifier.verify_and_dispatch(&payload).await?;
            }
        }
        Ok(())
    }

    /// Final stock levels addressed by script tag, sorted for stable output.
    pub async fn levels(&self) -> Result<Vec<(String, crate::domain::stock::GasType, u32)>> {
        let mut rows: Vec<_> = self
            .ledger
            .levels(&self.principal)
            .await?
            .into_iter()
            .map(|entry| {
                let tag = self
                    .tag_names
                    .get(&entry.branch_id)
                    .cloned()
                    .unwrap_or_else(|| entry.branch_id.to_string());
                (tag, entry.gas_type, entry.quantity)
            })
            .collect();
        rows.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.to_string().cmp(&b.1.to_string()))
        });
        Ok(rows)
    }

    async fn branch_id(&mut self, tag: Option<String>) -> Result<Uuid> {
        let tag = tag
            .ok_or_else(|| DepotError::Validation("row requires a branch".to_string()))?;
        if let Some(id) = self.branch_tags.get(&tag) {
            return Ok(*id);
        }
        let branch = Branch::new(tag.clone(), "created by replay");
        let id = branch.id;
        self.branches.insert(branch).await?;
        self.branch_tags.insert(tag.clone(), id);
        self.tag_names.insert(id, tag);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::GasType;
    use rust_decimal_macros::dec;

    fn record(op: OpKind) -> OpRecord {
        OpRecord {
            op,
            tag: None,
            branch: None,
            gas_type: None,
            quantity: None,
            amount: None,
            method: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_stockin_then_order_reduces_level() {
        let mut driver = ReplayDriver::in_memory(DepotConfig::default()).await.unwrap();

        let mut stockin = record(OpKind::Stockin);
        stockin.branch = Some("B1".to_string());
        stockin.gas_type = Some(GasType::Kg3);
        stockin.quantity = Some(10);
        driver.apply(stockin).await.unwrap();

        let mut order = record(OpKind::Order);
        order.tag = Some("o1".to_string());
        order.branch = Some("B1".to_string());
        order.gas_type = Some(GasType::Kg3);
        order.quantity = Some(4);
        order.amount = Some(dec!(80000));
        driver.apply(order).await.unwrap();

        let levels = driver.levels().await.unwrap();
        assert_eq!(levels, vec![("B1".to_string(), GasType::Kg3, 6)]);
    }

    #[tokio::test]
    async fn test_gateway_payment_and_webhook_settlement() {
        let mut driver = ReplayDriver::in_memory(DepotConfig::default()).await.unwrap();

        let mut stockin = record(OpKind::Stockin);
        stockin.branch = Some("B1".to_string());
        stockin.gas_type = Some(GasType::Kg3);
        stockin.quantity = Some(5);
        driver.apply(stockin).await.unwrap();

        let mut order = record(OpKind::Order);
        order.tag = Some("o1".to_string());
        order.branch = Some("B1".to_string());
        order.gas_type = Some(GasType::Kg3);
        order.quantity = Some(2);
        driver.apply(order).await.unwrap();

        let mut pay = record(OpKind::Pay);
        pay.tag = Some("o1".to_string());
        pay.method = Some(PaymentMethod::Gateway);
        driver.apply(pay).await.unwrap();

        let mut webhook = record(OpKind::Webhook);
        webhook.tag = Some("o1".to_string());
        webhook.status = Some("settlement".to_string());
        driver.apply(webhook).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_order_tag_fails() {
        let mut driver = ReplayDriver::in_memory(DepotConfig::default()).await.unwrap();
        let mut pay = record(OpKind::Pay);
        pay.tag = Some("ghost".to_string());
        pay.amount = Some(dec!(1000));
        let err = driver.apply(pay).await.unwrap_err();
        assert!(matches!(err, DepotError::Validation(_)));
    }
}
