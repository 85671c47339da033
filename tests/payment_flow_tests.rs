mod common;

use common::{depot, order_request};
use gasdepot::application::payments::PaymentInstruction;
use gasdepot::domain::order::{Order, OrderStatus, Pricing};
use gasdepot::domain::ports::OrderStore;
use gasdepot::domain::stock::GasType;
use gasdepot::domain::transaction::{PaymentMethod, PaymentStatus};
use gasdepot::error::DepotError;
use rust_decimal_macros::dec;

async fn placed_order(d: &common::Depot) -> Order {
    d.ledger
        .stock_in(&d.root, d.branch_id, GasType::Kg3, 10)
        .await
        .unwrap();
    d.workflow
        .place_order(&d.customer, order_request(d, 2, Pricing::PerUnit))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_exact_direct_payment_settles_and_completes() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.transaction.status, PaymentStatus::Paid);
    assert_eq!(outcome.transaction.amount_paid, dec!(40000));

    let order = d.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_underpayment_rejected_without_side_effects() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let err = d
        .payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Ewallet,
                amount_paid: dec!(30000),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DepotError::InsufficientPayment {
            paid,
            due
        } if paid == dec!(30000) && due == dec!(40000)
    ));

    assert!(d.payments.transactions_for(&d.root).await.unwrap().is_empty());
    let order = d.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_gateway_initiation_returns_token_and_pending_transaction() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(&d.customer, order.id, PaymentInstruction::Gateway)
        .await
        .unwrap();

    assert!(outcome.gateway_token.is_some());
    assert_eq!(outcome.transaction.status, PaymentStatus::Pending);
    let reference = outcome.transaction.gateway_reference.unwrap();
    assert!(reference.starts_with(&format!("ORDER-{}-", order.id)));

    // Order untouched until the webhook lands.
    let order = d.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_gateway_reference_round_trip() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(&d.customer, order.id, PaymentInstruction::Gateway)
        .await
        .unwrap();
    let reference = outcome.transaction.gateway_reference.clone().unwrap();

    use gasdepot::domain::ports::TransactionStore;
    let found = d
        .transactions
        .by_gateway_reference(&reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, outcome.transaction.id);
}

#[tokio::test]
async fn test_second_payment_blocked_until_first_fails() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(&d.customer, order.id, PaymentInstruction::Gateway)
        .await
        .unwrap();

    let err = d
        .payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DepotError::AlreadyProcessed));

    // Once the gateway reports failure the order is payable again.
    let reference = outcome.transaction.gateway_reference.unwrap();
    d.payments
        .confirm_from_gateway(&reference, "cancel")
        .await
        .unwrap();

    d.payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pay_existing_settles_pending_transaction() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(&d.customer, order.id, PaymentInstruction::Gateway)
        .await
        .unwrap();

    let tx = d
        .payments
        .pay_existing(
            &d.customer,
            outcome.transaction.id,
            PaymentMethod::BankTransfer,
            dec!(45000),
        )
        .await
        .unwrap();
    assert_eq!(tx.status, PaymentStatus::Paid);
    assert_eq!(tx.method, PaymentMethod::BankTransfer);
    assert_eq!(tx.amount_paid, dec!(45000));

    let order = d.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_pay_existing_refuses_settled_transaction() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let outcome = d
        .payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap();

    let err = d
        .payments
        .pay_existing(
            &d.customer,
            outcome.transaction.id,
            PaymentMethod::Cash,
            dec!(40000),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DepotError::AlreadyProcessed));
}

#[tokio::test]
async fn test_completed_order_refuses_new_payment() {
    let d = depot().await;
    let order = placed_order(&d).await;

    d.payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap();

    let err = d
        .payments
        .initiate_payment(
            &d.customer,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DepotError::AlreadyProcessed));
}

#[tokio::test]
async fn test_stranger_cannot_pay_someone_elses_order() {
    let d = depot().await;
    let order = placed_order(&d).await;

    let stranger = gasdepot::domain::party::Principal::customer(uuid::Uuid::new_v4());
    let err = d
        .payments
        .initiate_payment(
            &stranger,
            order.id,
            PaymentInstruction::Direct {
                method: PaymentMethod::Cash,
                amount_paid: dec!(40000),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DepotError::Authorization(_)));
}
