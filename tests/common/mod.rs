use gasdepot::application::ledger::StockLedger;
use gasdepot::application::orders::{OrderWorkflow, PlaceOrder};
use gasdepot::application::payments::PaymentReconciler;
use gasdepot::application::webhook::{GatewayNotification, WebhookVerifier, notification_signature};
use gasdepot::config::DepotConfig;
use gasdepot::domain::order::Pricing;
use gasdepot::domain::party::{Branch, Principal, Role, User};
use gasdepot::domain::ports::{BranchStore, UserStore};
use gasdepot::domain::stock::GasType;
use gasdepot::infrastructure::gateway::OfflineGateway;
use gasdepot::infrastructure::in_memory::{
    InMemoryBranchStore, InMemoryOrderStore, InMemoryStockStore, InMemoryTransactionStore,
    InMemoryUserStore,
};
use uuid::Uuid;

/// Fully wired service stack over shared in-memory stores, with one branch
/// and one customer seeded.
pub struct Depot {
    pub ledger: StockLedger,
    pub workflow: OrderWorkflow,
    pub payments: PaymentReconciler,
    pub verifier: WebhookVerifier,
    pub stocks: InMemoryStockStore,
    pub orders: InMemoryOrderStore,
    pub transactions: InMemoryTransactionStore,
    pub config: DepotConfig,
    pub branch_id: Uuid,
    pub customer: Principal,
    pub root: Principal,
}

pub async fn depot() -> Depot {
    let config = DepotConfig::default();
    let stocks = InMemoryStockStore::new();
    let orders = InMemoryOrderStore::new();
    let transactions = InMemoryTransactionStore::new();
    let branches = InMemoryBranchStore::new();
    let users = InMemoryUserStore::new();

    let branch = Branch::new("Depo Timur", "Jl. Melati 1");
    let branch_id = branch.id;
    branches.insert(branch).await.unwrap();

    let customer_user = User::new("Rina", "rina@mail.test", Role::User);
    let customer = Principal::customer(customer_user.id);
    users.insert(customer_user).await.unwrap();

    let ledger = StockLedger::new(Box::new(stocks.clone()), Box::new(branches.clone()));
    let workflow = OrderWorkflow::new(
        StockLedger::new(Box::new(stocks.clone()), Box::new(branches.clone())),
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
            Box::new(orders.clone()),
            Box::new(transactions.clone()),
            Box::new(users.clone()),
            Box::new(OfflineGateway::new()),
        ),
        config.gateway_server_key.clone(),
    );

    Depot {
        ledger,
        workflow,
        payments,
        verifier,
        stocks,
        orders,
        transactions,
        config,
        branch_id,
        customer,
        root: Principal::super_admin(Uuid::new_v4()),
    }
}

pub fn order_request(depot: &Depot, quantity: u32, pricing: Pricing) -> PlaceOrder {
    PlaceOrder {
        user_id: depot.customer.user_id,
        branch_id: depot.branch_id,
        gas_type: GasType::Kg3,
        quantity,
        pricing,
        pickup_date: None,
    }
}

/// A correctly signed gateway callback for the given reference.
pub fn signed_payload(
    reference: &str,
    gross_amount: &str,
    transaction_status: &str,
    server_key: &str,
) -> Vec<u8> {
    let notification = GatewayNotification {
        order_id: reference.to_string(),
        status_code: "200".to_string(),
        gross_amount: gross_amount.to_string(),
        signature_key: notification_signature(reference, "200", gross_amount, server_key),
        transaction_status: transaction_status.to_string(),
    };
    serde_json::to_vec(&notification).unwrap()
}
