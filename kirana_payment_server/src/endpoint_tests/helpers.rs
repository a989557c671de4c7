use chrono::Utc;
use jwt_compact::alg::Hs256Key;
use kirana_payment_engine::db_types::{
    Cart,
    CartStatus,
    Order,
    OrderItem,
    OrderSnapshot,
    OrderStatus,
    Payment,
    PaymentStatus,
    UserId,
};
use kps_common::Paisa;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
};

pub const TEST_SECRET: &[u8] = b"an-endpoint-test-secret-0123456789";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig { jwt_verification_key: Hs256Key::new(TEST_SECRET) }
}

pub fn token_for(user_id: &str) -> String {
    let claims = JwtClaims {
        user_id: UserId::from(user_id),
        name: "Asha Gurung".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9800000001".to_string(),
    };
    TokenIssuer::new(Hs256Key::new(TEST_SECRET)).issue_token(claims, None).expect("Error issuing test token")
}

pub fn sample_cart(id: i64, user_id: &str, total: Paisa, status: CartStatus) -> Cart {
    let now = Utc::now();
    Cart { id, user_id: UserId::from(user_id), total_price: total, status, created_at: now, updated_at: now }
}

pub fn sample_payment(id: i64, user_id: &str, cart_id: i64, pidx: &str, status: PaymentStatus) -> Payment {
    let now = Utc::now();
    Payment {
        id,
        user_id: UserId::from(user_id),
        cart_id,
        amount: Paisa::from_rupees(50),
        pidx: pidx.to_string(),
        payment_url: format!("https://gateway.test/pay/{pidx}"),
        transaction_id: None,
        status,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_order(id: i64, user_id: &str, cart_id: i64, total: Paisa) -> OrderSnapshot {
    let order = Order {
        id,
        user_id: UserId::from(user_id),
        cart_id,
        total_price: total,
        status: OrderStatus::Purchased,
        created_at: Utc::now(),
    };
    let items = vec![OrderItem { id: 1, order_id: id, product_id: 1, quantity: 2, unit_price: Paisa::from_rupees(25) }];
    OrderSnapshot { order, items }
}
