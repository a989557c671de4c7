use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use actix_web::dev::Server;
use khalti_tools::KhaltiApi;
use kirana_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderPaidEvent, PaymentDeclinedEvent},
    CartApi,
    CheckoutFlowApi,
    InFlightVerifications,
    OrderApi,
    RetryPolicy,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::khalti::KhaltiGateway,
    routes::{
        health,
        AddCartItemRoute,
        InitiatePaymentRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        RemoveCartItemRoute,
        UpdateCartItemRoute,
        VerifyPaymentRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = KhaltiGateway::new(
        KhaltiApi::new(config.khalti_config.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?,
    );
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let in_flight = InFlightVerifications::new();
    let srv = create_server_instance(config, db, gateway, in_flight, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The default event subscribers: structured log lines for settled and declined payments. Notification channels
/// (confirmation mail, fulfilment kicks) hang off these same hooks.
fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|event: OrderPaidEvent| {
        Box::pin(async move {
            info!(
                "📦️ Order #{} confirmed for user {}: {} line(s), {}",
                event.order.order.id,
                event.order.order.user_id,
                event.order.items.len(),
                event.order.order.total_price
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_payment_declined(|event: PaymentDeclinedEvent| {
        Box::pin(async move {
            info!("❌️ Payment {} declined for cart #{}", event.payment.pidx, event.payment.cart_id);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: KhaltiGateway,
    in_flight: InFlightVerifications,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let checkout_api =
            CheckoutFlowApi::new(db.clone(), gateway.clone(), in_flight.clone(), producers.clone())
                .with_retry_policy(RetryPolicy::new(config.verify_retry_attempts));
        let cart_api = CartApi::new(db.clone());
        let order_api = OrderApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kps::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(config.auth.clone()));
        // Identity is checked per-handler by the JwtClaims extractor; every /api route requires it
        let api_scope = web::scope("/api")
            .service(InitiatePaymentRoute::<SqliteDatabase, KhaltiGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, KhaltiGateway>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
