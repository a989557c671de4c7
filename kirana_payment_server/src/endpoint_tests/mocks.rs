use kirana_payment_engine::{
    db_types::{Cart, CartSnapshot, NewPaymentIntent, OrderSnapshot, Payment, UserId},
    traits::{
        CartManagement,
        CheckoutDatabase,
        CheckoutDbError,
        ContactInfo,
        GatewayError,
        GatewayIntent,
        GatewayLookup,
        OrderManagement,
        PaymentGateway,
        ReconcileOutcome,
    },
};
use kps_common::Paisa;
use mockall::mock;

mock! {
    pub CheckoutDb {}
    impl CheckoutDatabase for CheckoutDb {
        fn url(&self) -> &str;
        async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CheckoutDbError>;
        async fn fetch_payment_by_pidx(&self, pidx: &str) -> Result<Option<Payment>, CheckoutDbError>;
        async fn fetch_pending_payment_for_cart(&self, cart_id: i64) -> Result<Option<Payment>, CheckoutDbError>;
        async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<Payment, CheckoutDbError>;
        async fn fetch_order_for_cart(&self, cart_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError>;
        async fn reconcile_payment(&self, pidx: &str, lookup: &GatewayLookup) -> Result<ReconcileOutcome, CheckoutDbError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_intent(&self, reference: &str, amount: Paisa, contact: &ContactInfo) -> Result<GatewayIntent, GatewayError>;
        async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError>;
    }
}

mock! {
    pub CartDb {}
    impl CartManagement for CartDb {
        async fn cart_for_user(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, CheckoutDbError>;
        async fn add_item_to_cart(&self, user_id: &UserId, product_id: i64, quantity: i64) -> Result<CartSnapshot, CheckoutDbError>;
        async fn remove_item_from_cart(&self, user_id: &UserId, product_id: i64) -> Result<CartSnapshot, CheckoutDbError>;
        async fn update_item_quantity(&self, user_id: &UserId, product_id: i64, quantity: i64) -> Result<CartSnapshot, CheckoutDbError>;
    }
}

mock! {
    pub OrderDb {}
    impl OrderManagement for OrderDb {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderSnapshot>, CheckoutDbError>;
        async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSnapshot>, CheckoutDbError>;
    }
}
