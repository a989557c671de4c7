//! Shared fixtures for the engine integration tests: a scriptable in-memory gateway and a fully wired test context
//! over a throwaway SQLite database.
#![allow(dead_code)] // not every test binary uses every fixture

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
        Mutex,
        PoisonError,
    },
    time::Duration,
};

use kirana_payment_engine::{
    db_types::{CartSnapshot, Product, UserId},
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_url},
        seed::seed_products,
    },
    traits::{ContactInfo, GatewayError, GatewayIntent, GatewayLookup, GatewayPaymentStatus, PaymentGateway},
    CartApi,
    CheckoutFlowApi,
    InFlightVerifications,
    OrderApi,
    SqliteDatabase,
};
use kps_common::Paisa;

/// A `PaymentGateway` whose lookup answer is scripted by the test. Records call counts so tests can assert that the
/// gateway was (or was not) consulted.
#[derive(Clone)]
pub struct MockGateway {
    lookup_response: Arc<Mutex<GatewayLookup>>,
    pidx_override: Arc<Mutex<Option<String>>>,
    lookup_delay: Arc<Mutex<Duration>>,
    pub intent_calls: Arc<AtomicU32>,
    pub lookup_calls: Arc<AtomicU32>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            lookup_response: Arc::new(Mutex::new(GatewayLookup {
                status: GatewayPaymentStatus::Pending,
                transaction_id: None,
            })),
            pidx_override: Arc::new(Mutex::new(None)),
            lookup_delay: Arc::new(Mutex::new(Duration::ZERO)),
            intent_calls: Arc::new(AtomicU32::new(0)),
            lookup_calls: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the answer every subsequent lookup call returns.
    pub fn set_lookup(&self, status: GatewayPaymentStatus, transaction_id: Option<&str>) {
        let mut response = self.lookup_response.lock().unwrap_or_else(PoisonError::into_inner);
        *response = GatewayLookup { status, transaction_id: transaction_id.map(String::from) };
    }

    /// Forces the next created intent to use the given reference instead of a generated one.
    pub fn override_next_pidx(&self, pidx: &str) {
        *self.pidx_override.lock().unwrap_or_else(PoisonError::into_inner) = Some(pidx.to_string());
    }

    /// Makes every lookup call stall, so tests can force two verifications to overlap.
    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    pub fn lookups(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        _reference: &str,
        _amount: Paisa,
        _contact: &ContactInfo,
    ) -> Result<GatewayIntent, GatewayError> {
        let n = self.intent_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let pidx = self
            .pidx_override
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| format!("PIDX-{n}"));
        let payment_url = format!("https://gateway.test/pay/{pidx}");
        Ok(GatewayIntent { pidx, payment_url })
    }

    async fn lookup(&self, _pidx: &str) -> Result<GatewayLookup, GatewayError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.lookup_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lookup_response.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

pub struct TestContext {
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub checkout: CheckoutFlowApi<SqliteDatabase, MockGateway>,
    pub carts: CartApi<SqliteDatabase>,
    pub orders: OrderApi<SqliteDatabase>,
    pub products: Vec<Product>,
}

/// Spins up a throwaway database with two seeded products and fully wired APIs.
pub async fn setup() -> TestContext {
    let url = random_db_url();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let products = seed_products(
        &db,
        &[("Himalayan tea", Paisa::from_rupees(25), 100), ("Copper diyo", Paisa::from_rupees(120), 10)],
    )
    .await;
    let gateway = MockGateway::new();
    let checkout =
        CheckoutFlowApi::new(db.clone(), gateway.clone(), InFlightVerifications::new(), EventProducers::default());
    let carts = CartApi::new(db.clone());
    let orders = OrderApi::new(db.clone());
    TestContext { db, gateway, checkout, carts, orders, products }
}

impl TestContext {
    /// A second coordinator over the same database with its own single-flight registry, standing in for another
    /// server instance.
    pub fn second_instance(&self) -> CheckoutFlowApi<SqliteDatabase, MockGateway> {
        CheckoutFlowApi::new(
            self.db.clone(),
            self.gateway.clone(),
            InFlightVerifications::new(),
            EventProducers::default(),
        )
    }

    /// Builds a cart for `user` containing `quantity` of the first seeded product, and returns its snapshot.
    pub async fn cart_with_tea(&self, user: &UserId, quantity: i64) -> CartSnapshot {
        self.carts.add_item(user, self.products[0].id, quantity).await.expect("Error building cart")
    }

    pub async fn order_count_for_cart(&self, cart_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE cart_id = $1")
            .bind(cart_id)
            .fetch_one(self.db.pool())
            .await
            .expect("Error counting orders")
    }
}

pub fn contact() -> ContactInfo {
    ContactInfo { name: "Asha Gurung".to_string(), email: "asha@example.com".to_string(), phone: "9800000001".to_string() }
}
