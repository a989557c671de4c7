use actix_web::{test, web, App};
use kirana_payment_engine::{
    db_types::{CartStatus, PaymentStatus},
    events::EventProducers,
    traits::ReconcileOutcome,
    CheckoutFlowApi,
    InFlightVerifications,
};
use kps_common::Paisa;

use crate::{
    auth::AUTH_HEADER,
    endpoint_tests::{
        helpers::{sample_cart, sample_order, sample_payment, test_auth_config, token_for},
        mocks::{MockCheckoutDb, MockGateway},
    },
    routes::{InitiatePaymentRoute, VerifyPaymentRoute},
};

type TestApi = CheckoutFlowApi<MockCheckoutDb, MockGateway>;

fn checkout_api(db: MockCheckoutDb, gateway: MockGateway, in_flight: InFlightVerifications) -> web::Data<TestApi> {
    web::Data::new(CheckoutFlowApi::new(db, gateway, in_flight, EventProducers::default()))
}

#[actix_web::test]
async fn repeated_initiation_returns_the_existing_intent() {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_cart()
        .returning(|id| Ok(Some(sample_cart(id, "user-asha", Paisa::from_rupees(50), CartStatus::Pending))));
    db.expect_fetch_pending_payment_for_cart()
        .returning(|cart_id| Ok(Some(sample_payment(7, "user-asha", cart_id, "ABC123", PaymentStatus::Pending))));
    // No create_intent expectation on the gateway: touching it would fail the test
    let gateway = MockGateway::new();
    let app = test::init_service(
        App::new()
            .app_data(checkout_api(db, gateway, InFlightVerifications::new()))
            .app_data(web::Data::new(test_auth_config()))
            .service(InitiatePaymentRoute::<MockCheckoutDb, MockGateway>::new()),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/payments/initiate")
        .insert_header((AUTH_HEADER, token_for("user-asha")))
        .set_json(serde_json::json!({"cart_id": 3, "amount": "50.00"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["pidx"], "ABC123");
}

#[actix_web::test]
async fn verifying_a_settled_payment_returns_the_order_without_a_lookup() {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_payment_by_pidx()
        .returning(|pidx| Ok(Some(sample_payment(7, "user-asha", 3, pidx, PaymentStatus::Completed))));
    db.expect_fetch_order_for_cart()
        .returning(|cart_id| Ok(Some(sample_order(11, "user-asha", cart_id, Paisa::from_rupees(50)))));
    // No lookup expectation on the gateway: the settled short-circuit must not call it
    let gateway = MockGateway::new();
    let app = test::init_service(
        App::new()
            .app_data(checkout_api(db, gateway, InFlightVerifications::new()))
            .app_data(web::Data::new(test_auth_config()))
            .service(VerifyPaymentRoute::<MockCheckoutDb, MockGateway>::new()),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/payments/verify")
        .insert_header((AUTH_HEADER, token_for("user-asha")))
        .set_json(serde_json::json!({"pidx": "ABC123"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["order"]["order"]["id"], 11);
}

#[actix_web::test]
async fn a_fresh_settlement_reports_the_new_order() {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_payment_by_pidx()
        .returning(|pidx| Ok(Some(sample_payment(7, "user-asha", 3, pidx, PaymentStatus::Pending))));
    db.expect_reconcile_payment().returning(|pidx, _| {
        let mut payment = sample_payment(7, "user-asha", 3, pidx, PaymentStatus::Completed);
        payment.transaction_id = Some("TXN1".to_string());
        Ok(ReconcileOutcome::Settled { payment, order: sample_order(11, "user-asha", 3, Paisa::from_rupees(50)) })
    });
    let mut gateway = MockGateway::new();
    gateway.expect_lookup().returning(|_| {
        Ok(kirana_payment_engine::traits::GatewayLookup {
            status: kirana_payment_engine::traits::GatewayPaymentStatus::Completed,
            transaction_id: Some("TXN1".to_string()),
        })
    });
    let app = test::init_service(
        App::new()
            .app_data(checkout_api(db, gateway, InFlightVerifications::new()))
            .app_data(web::Data::new(test_auth_config()))
            .service(VerifyPaymentRoute::<MockCheckoutDb, MockGateway>::new()),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/payments/verify")
        .insert_header((AUTH_HEADER, token_for("user-asha")))
        .set_json(serde_json::json!({"pidx": "ABC123"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["transaction_id"], "TXN1");
    assert_eq!(body["order"]["order"]["id"], 11);
}

#[actix_web::test]
async fn verifying_someone_elses_payment_is_forbidden() {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_payment_by_pidx()
        .returning(|pidx| Ok(Some(sample_payment(7, "user-bimal", 3, pidx, PaymentStatus::Pending))));
    let gateway = MockGateway::new();
    let app = test::init_service(
        App::new()
            .app_data(checkout_api(db, gateway, InFlightVerifications::new()))
            .app_data(web::Data::new(test_auth_config()))
            .service(VerifyPaymentRoute::<MockCheckoutDb, MockGateway>::new()),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/payments/verify")
        .insert_header((AUTH_HEADER, token_for("user-asha")))
        .set_json(serde_json::json!({"pidx": "ABC123"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 403);
}

#[actix_web::test]
async fn a_duplicate_in_flight_verification_conflicts() {
    let db = MockCheckoutDb::new();
    let gateway = MockGateway::new();
    let in_flight = InFlightVerifications::new();
    // Another task is already verifying this reference
    let _claim = in_flight.try_claim("ABC123").expect("claim must succeed");
    let app = test::init_service(
        App::new()
            .app_data(checkout_api(db, gateway, in_flight))
            .app_data(web::Data::new(test_auth_config()))
            .service(VerifyPaymentRoute::<MockCheckoutDb, MockGateway>::new()),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/payments/verify")
        .insert_header((AUTH_HEADER, token_for("user-asha")))
        .set_json(serde_json::json!({"pidx": "ABC123"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 409);
}
