use actix_web::{test, web, App};

use crate::{
    auth::AUTH_HEADER,
    endpoint_tests::{
        helpers::{test_auth_config, token_for},
        mocks::MockCartDb,
    },
    routes::MyCartRoute,
};
use kirana_payment_engine::CartApi;

fn cart_db_returning_no_cart() -> MockCartDb {
    let mut db = MockCartDb::new();
    db.expect_cart_for_user().returning(|_| Ok(None));
    db
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(CartApi::new(cart_db_returning_no_cart())))
            .app_data(web::Data::new(test_auth_config()))
            .service(MyCartRoute::<MockCartDb>::new()),
    )
    .await;
    let req = test::TestRequest::get().uri("/cart").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);
}

#[actix_web::test]
async fn requests_with_a_forged_token_are_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(CartApi::new(cart_db_returning_no_cart())))
            .app_data(web::Data::new(test_auth_config()))
            .service(MyCartRoute::<MockCartDb>::new()),
    )
    .await;
    // Signed with a different secret than the server's
    let issuer = crate::auth::TokenIssuer::new(jwt_compact::alg::Hs256Key::new(b"not-the-server-secret-0123456789x"));
    let claims = crate::auth::JwtClaims {
        user_id: kirana_payment_engine::db_types::UserId::from("user-asha"),
        name: String::new(),
        email: String::new(),
        phone: String::new(),
    };
    let token = issuer.issue_token(claims, None).unwrap();
    let req = test::TestRequest::get().uri("/cart").insert_header((AUTH_HEADER, token)).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_web::test]
async fn a_valid_token_reaches_the_handler() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(CartApi::new(cart_db_returning_no_cart())))
            .app_data(web::Data::new(test_auth_config()))
            .service(MyCartRoute::<MockCartDb>::new()),
    )
    .await;
    let req = test::TestRequest::get().uri("/cart").insert_header((AUTH_HEADER, token_for("user-asha"))).to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "No open cart found");
}
