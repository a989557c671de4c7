//! End-to-end tests of the checkout protocol: payment initiation, the verification coordinator, and their behaviour
//! under repeated and concurrent calls.

mod support;

use std::time::Duration;

use kirana_payment_engine::{
    db_types::{CartStatus, PaymentStatus, UserId},
    traits::{CheckoutDatabase, GatewayPaymentStatus},
    CheckoutFlowError,
    VerificationOutcome,
};
use kps_common::Paisa;
use support::{contact, setup};

fn asha() -> UserId {
    UserId::from("user-asha")
}

fn bimal() -> UserId {
    UserId::from("user-bimal")
}

#[tokio::test]
async fn initiating_twice_returns_the_same_payment_reference() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 2).await;
    let amount = cart.cart.total_price;

    let first = ctx.checkout.initiate_payment(&user, cart.cart.id, amount, &contact()).await.unwrap();
    let second = ctx.checkout.initiate_payment(&user, cart.cart.id, amount, &contact()).await.unwrap();

    assert_eq!(first.pidx, second.pidx);
    assert_eq!(first.payment_id, second.payment_id);
    // Only the first call reached the gateway
    assert_eq!(ctx.gateway.intent_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    // The cart is frozen while the payment is open
    let cart = ctx.checkout.db().fetch_cart(cart.cart.id).await.unwrap().unwrap();
    assert_eq!(cart.status, CartStatus::Pending);
}

#[tokio::test]
async fn initiation_validates_amount_and_ownership() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 2).await;

    let err = ctx.checkout.initiate_payment(&user, cart.cart.id, Paisa::from(0), &contact()).await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::ValidationError(_)));

    let err = ctx.checkout.initiate_payment(&user, cart.cart.id, Paisa::from_rupees(1), &contact()).await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::ValidationError(_)), "amount must match the cart total");

    let err =
        ctx.checkout.initiate_payment(&bimal(), cart.cart.id, cart.cart.total_price, &contact()).await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::Unauthorized));

    let err = ctx.checkout.initiate_payment(&user, 9999, cart.cart.total_price, &contact()).await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::CartNotFound(9999)));

    // None of the failures created a payment
    assert_eq!(ctx.gateway.intent_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

/// The full settlement scenario: a pending Rs.50.00 cart whose gateway lookup reports Completed.
#[tokio::test]
async fn settlement_creates_exactly_one_order_and_is_idempotent() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 2).await;
    assert_eq!(cart.cart.total_price, Paisa::from_rupees(50));

    ctx.gateway.override_next_pidx("ABC123");
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();
    assert_eq!(intent.pidx, "ABC123");

    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN1"));
    let outcome = ctx.checkout.verify_payment(&user, "ABC123").await.unwrap();
    let (payment, order) = match outcome {
        VerificationOutcome::Confirmed { payment, order } => (payment, order),
        other => panic!("Expected settlement, got {other:?}"),
    };
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.transaction_id.as_deref(), Some("TXN1"));
    assert!(payment.paid_at.is_some());
    assert_eq!(order.order.cart_id, cart.cart.id);
    assert_eq!(order.order.total_price, Paisa::from_rupees(50));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].unit_price, Paisa::from_rupees(25));

    let cart_after = ctx.checkout.db().fetch_cart(cart.cart.id).await.unwrap().unwrap();
    assert_eq!(cart_after.status, CartStatus::Purchased);

    // Repeated verification returns the same order without consulting the gateway again
    let lookups_after_first = ctx.gateway.lookups();
    for _ in 0..3 {
        let outcome = ctx.checkout.verify_payment(&user, "ABC123").await.unwrap();
        match outcome {
            VerificationOutcome::Confirmed { order: repeat, .. } => assert_eq!(repeat.order.id, order.order.id),
            other => panic!("Expected settlement, got {other:?}"),
        }
    }
    assert_eq!(ctx.gateway.lookups(), lookups_after_first);
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 1);
}

#[tokio::test]
async fn a_pending_gateway_status_changes_nothing() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 1).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Pending, None);
    let outcome = ctx.checkout.verify_payment(&user, &intent.pidx).await.unwrap();
    match outcome {
        VerificationOutcome::StillPending { payment } => assert_eq!(payment.status, PaymentStatus::Pending),
        other => panic!("Expected still-pending, got {other:?}"),
    }
    let cart_after = ctx.checkout.db().fetch_cart(cart.cart.id).await.unwrap().unwrap();
    assert_eq!(cart_after.status, CartStatus::Pending);
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 0);
}

#[tokio::test]
async fn a_failed_payment_reopens_the_cart() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 1).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Other("Expired".to_string()), None);
    let outcome = ctx.checkout.verify_payment(&user, &intent.pidx).await.unwrap();
    match outcome {
        VerificationOutcome::Declined { payment } => assert_eq!(payment.status, PaymentStatus::Failed),
        other => panic!("Expected declined, got {other:?}"),
    }
    let cart_after = ctx.checkout.db().fetch_cart(cart.cart.id).await.unwrap().unwrap();
    assert_eq!(cart_after.status, CartStatus::Active);
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 0);

    // The reopened cart can go through checkout again, under a fresh reference
    let retry = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();
    assert_ne!(retry.pidx, intent.pidx);
}

#[tokio::test]
async fn verification_is_denied_for_the_wrong_user() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 1).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN1"));
    let err = ctx.checkout.verify_payment(&bimal(), &intent.pidx).await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::Unauthorized));

    // Zero mutations and zero gateway traffic
    assert_eq!(ctx.gateway.lookups(), 0);
    let payment = ctx.checkout.db().fetch_payment_by_pidx(&intent.pidx).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 0);
}

#[tokio::test]
async fn verifying_an_unknown_reference_fails() {
    let ctx = setup().await;
    let err = ctx.checkout.verify_payment(&asha(), "NO-SUCH-PIDX").await.unwrap_err();
    assert!(matches!(err, CheckoutFlowError::PaymentNotFound(_)));
}

/// Two concurrent calls within one process: the single-flight registry admits one attempt; the other is told to come
/// back later. Either way, exactly one order exists afterwards.
#[tokio::test]
async fn concurrent_verification_in_one_process_yields_one_order() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 2).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN1"));
    ctx.gateway.set_lookup_delay(Duration::from_millis(200));

    let (a, b) = tokio::join!(
        ctx.checkout.verify_payment(&user, &intent.pidx),
        ctx.checkout.verify_payment(&user, &intent.pidx),
    );
    let confirmed = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Ok(VerificationOutcome::Confirmed { .. })))
        .count();
    let in_progress = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(CheckoutFlowError::VerificationInProgress(_))))
        .count();
    assert_eq!(confirmed + in_progress, 2, "unexpected outcomes: {a:?} / {b:?}");
    assert!(confirmed >= 1, "at least one caller must settle the payment");

    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 1);

    // A caller that was turned away succeeds on its next poll, with the same order
    ctx.gateway.set_lookup_delay(Duration::ZERO);
    let retry = ctx.checkout.verify_payment(&user, &intent.pidx).await.unwrap();
    assert!(matches!(retry, VerificationOutcome::Confirmed { .. }));
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 1);
}

/// Two coordinators with independent single-flight registries stand in for two server instances. The registry cannot
/// help here; the order-per-cart uniqueness constraint and the duplicate-key fallback must keep the order count at
/// one.
#[tokio::test]
async fn concurrent_verification_across_instances_yields_one_order() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 2).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN1"));
    ctx.gateway.set_lookup_delay(Duration::from_millis(100));
    let other_instance = ctx.second_instance();

    let (a, b) = tokio::join!(
        ctx.checkout.verify_payment(&user, &intent.pidx),
        other_instance.verify_payment(&user, &intent.pidx),
    );
    let order_a = match a.unwrap() {
        VerificationOutcome::Confirmed { order, .. } => order.order.id,
        other => panic!("Expected settlement, got {other:?}"),
    };
    let order_b = match b.unwrap() {
        VerificationOutcome::Confirmed { order, .. } => order.order.id,
        other => panic!("Expected settlement, got {other:?}"),
    };
    assert_eq!(order_a, order_b, "both instances must observe the same order");
    assert_eq!(ctx.order_count_for_cart(cart.cart.id).await, 1);
}

#[tokio::test]
async fn an_in_flight_reference_is_reported_as_in_progress() {
    let ctx = setup().await;
    let user = asha();
    let cart = ctx.cart_with_tea(&user, 1).await;
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();

    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN1"));
    ctx.gateway.set_lookup_delay(Duration::from_millis(300));

    let checkout = &ctx.checkout;
    let pidx = intent.pidx.clone();
    let first = checkout.verify_payment(&user, &pidx);
    let second = async {
        // Give the first call time to claim the reference
        tokio::time::sleep(Duration::from_millis(50)).await;
        checkout.verify_payment(&user, &pidx).await
    };
    let (first, second) = tokio::join!(first, second);
    assert!(matches!(first, Ok(VerificationOutcome::Confirmed { .. })));
    assert!(matches!(second, Err(CheckoutFlowError::VerificationInProgress(_))));
}
