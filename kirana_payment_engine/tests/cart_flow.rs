//! Tests of the cart operations: line-item mutations, stock reservation and total-price maintenance.

mod support;

use kirana_payment_engine::{
    db_types::{CartStatus, UserId},
    traits::GatewayPaymentStatus,
    CartApiError,
};
use kps_common::Paisa;
use support::{contact, setup};

fn asha() -> UserId {
    UserId::from("user-asha")
}

#[tokio::test]
async fn adding_an_item_creates_the_cart_and_reserves_stock() {
    let ctx = setup().await;
    let user = asha();

    let snapshot = ctx.carts.add_item(&user, ctx.products[0].id, 3).await.unwrap();
    assert_eq!(snapshot.cart.status, CartStatus::Active);
    assert_eq!(snapshot.cart.total_price, Paisa::from_rupees(75));
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].quantity, 3);

    // Adding the same product again folds into the existing line
    let snapshot = ctx.carts.add_item(&user, ctx.products[0].id, 1).await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].quantity, 4);
    assert_eq!(snapshot.cart.total_price, Paisa::from_rupees(100));

    // Stock went down by what the cart holds
    let tea = ctx.carts.cart_for_user(&user).await.unwrap().unwrap();
    assert_eq!(tea.items[0].quantity, 4);
}

#[tokio::test]
async fn stock_limits_are_enforced() {
    let ctx = setup().await;
    let user = asha();
    // Only 10 diyos in stock
    let diyo = ctx.products[1].id;
    let err = ctx.carts.add_item(&user, diyo, 11).await.unwrap_err();
    assert!(matches!(err, CartApiError::InsufficientStock(id) if id == diyo));

    let snapshot = ctx.carts.add_item(&user, diyo, 10).await.unwrap();
    assert_eq!(snapshot.items[0].quantity, 10);

    // The shelf is now empty; one more is refused
    let err = ctx.carts.add_item(&user, diyo, 1).await.unwrap_err();
    assert!(matches!(err, CartApiError::InsufficientStock(_)));
}

#[tokio::test]
async fn removing_an_item_returns_its_stock() {
    let ctx = setup().await;
    let user = asha();
    let diyo = ctx.products[1].id;
    ctx.carts.add_item(&user, diyo, 10).await.unwrap();
    let snapshot = ctx.carts.remove_item(&user, diyo).await.unwrap();
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.cart.total_price, Paisa::from(0));

    // All ten units are back on the shelf
    let snapshot = ctx.carts.add_item(&user, diyo, 10).await.unwrap();
    assert_eq!(snapshot.items[0].quantity, 10);
}

#[tokio::test]
async fn quantity_updates_apply_the_difference() {
    let ctx = setup().await;
    let user = asha();
    let tea = ctx.products[0].id;
    ctx.carts.add_item(&user, tea, 2).await.unwrap();

    let snapshot = ctx.carts.update_quantity(&user, tea, 5).await.unwrap();
    assert_eq!(snapshot.items[0].quantity, 5);
    assert_eq!(snapshot.cart.total_price, Paisa::from_rupees(125));

    let snapshot = ctx.carts.update_quantity(&user, tea, 1).await.unwrap();
    assert_eq!(snapshot.items[0].quantity, 1);
    assert_eq!(snapshot.cart.total_price, Paisa::from_rupees(25));

    let err = ctx.carts.update_quantity(&user, tea, 0).await.unwrap_err();
    assert!(matches!(err, CartApiError::ValidationError(_)));
}

#[tokio::test]
async fn unknown_products_and_missing_lines_are_rejected() {
    let ctx = setup().await;
    let user = asha();
    let err = ctx.carts.add_item(&user, 9999, 1).await.unwrap_err();
    assert!(matches!(err, CartApiError::ProductNotFound(9999)));

    ctx.carts.add_item(&user, ctx.products[0].id, 1).await.unwrap();
    let err = ctx.carts.remove_item(&user, ctx.products[1].id).await.unwrap_err();
    assert!(matches!(err, CartApiError::ItemNotInCart(_)));

    let err = ctx.carts.remove_item(&UserId::from("user-without-cart"), ctx.products[0].id).await.unwrap_err();
    assert!(matches!(err, CartApiError::CartNotFound));
}

#[tokio::test]
async fn a_cart_with_a_payment_in_flight_rejects_mutation() {
    let ctx = setup().await;
    let user = asha();
    let snapshot = ctx.carts.add_item(&user, ctx.products[0].id, 2).await.unwrap();
    ctx.checkout.initiate_payment(&user, snapshot.cart.id, snapshot.cart.total_price, &contact()).await.unwrap();

    let err = ctx.carts.add_item(&user, ctx.products[0].id, 1).await.unwrap_err();
    assert!(matches!(err, CartApiError::CartLocked));
    let err = ctx.carts.remove_item(&user, ctx.products[0].id).await.unwrap_err();
    assert!(matches!(err, CartApiError::CartLocked));
    let err = ctx.carts.update_quantity(&user, ctx.products[0].id, 3).await.unwrap_err();
    assert!(matches!(err, CartApiError::CartLocked));
}

#[tokio::test]
async fn purchase_history_is_newest_first_and_owner_scoped() {
    let ctx = setup().await;
    let user = asha();

    // First purchase
    let cart = ctx.carts.add_item(&user, ctx.products[0].id, 1).await.unwrap();
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();
    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN-A"));
    ctx.checkout.verify_payment(&user, &intent.pidx).await.unwrap();

    // Second purchase with a fresh cart
    let cart = ctx.carts.add_item(&user, ctx.products[1].id, 1).await.unwrap();
    let intent = ctx.checkout.initiate_payment(&user, cart.cart.id, cart.cart.total_price, &contact()).await.unwrap();
    ctx.gateway.set_lookup(GatewayPaymentStatus::Completed, Some("TXN-B"));
    ctx.checkout.verify_payment(&user, &intent.pidx).await.unwrap();

    let history = ctx.orders.orders_for_user(&user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].order.id > history[1].order.id, "newest order first");

    // Another user sees nothing, and cannot read the order by id either
    let stranger = UserId::from("user-bimal");
    assert!(ctx.orders.orders_for_user(&stranger).await.unwrap().is_empty());
    assert!(ctx.orders.order_for_user(&stranger, history[0].order.id).await.unwrap().is_none());
    assert!(ctx.orders.order_for_user(&user, history[0].order.id).await.unwrap().is_some());
}
