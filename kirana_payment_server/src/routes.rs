//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend traits, so the mock backends in the endpoint tests and the SQLite backend in
//! production register through the same code path. Actix cannot register generic handlers directly, so each route gets
//! a tiny `HttpServiceFactory` type generated by the `route!` macro below.

use actix_web::{get, web, HttpResponse, Responder};
use kirana_payment_engine::{
    traits::{CartManagement, CheckoutDatabase, OrderManagement, PaymentGateway},
    CartApi,
    CheckoutFlowApi,
    OrderApi,
    VerificationOutcome,
};
use kps_common::Paisa;
use log::*;
use serde_json::json;

use crate::{
    auth::JwtClaims,
    data_objects::{
        AddItemParams,
        CartResponse,
        InitiatePaymentParams,
        InitiatePaymentResponse,
        OrdersResponse,
        RemoveItemParams,
        UpdateItemParams,
        VerifyPaymentParams,
        VerifyPaymentResponse,
    },
    errors::ServerError,
};

// Actix cannot handle generics in handlers, so the registration glue is generated with the `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  -----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------------
route!(initiate_payment => Post "/payments/initiate" impl CheckoutDatabase, PaymentGateway);
/// Route handler for initiating a payment against the caller's cart.
///
/// The amount arrives in rupees and is converted to paisa here; everything past this boundary works in minor units.
/// Repeating the call for the same cart returns the intent created the first time.
pub async fn initiate_payment<B, G>(
    claims: JwtClaims,
    api: web::Data<CheckoutFlowApi<B, G>>,
    body: web::Json<InitiatePaymentParams>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase + 'static,
    G: PaymentGateway + 'static,
{
    trace!("💻️ Received initiate payment request for cart #{}", body.cart_id);
    let params = body.into_inner();
    let amount = Paisa::try_from(params.amount).map_err(|e| ServerError::ValidationError(e.to_string()))?;
    let contact = claims.contact_info();
    let payment = api.initiate_payment(&claims.user_id, params.cart_id, amount, &contact).await?;
    Ok(HttpResponse::Ok().json(InitiatePaymentResponse {
        success: true,
        message: "Payment initiated successfully".to_string(),
        payment,
    }))
}

route!(verify_payment => Post "/payments/verify" impl CheckoutDatabase, PaymentGateway);
/// Route handler for verifying a payment by its gateway reference.
///
/// Safe to call repeatedly and concurrently; a duplicate in-flight request is answered with 409 and should be retried
/// after a short delay. The three protocol outcomes all map onto a 200 response whose `success` flag and `order`
/// field tell the client where the payment stands.
pub async fn verify_payment<B, G>(
    claims: JwtClaims,
    api: web::Data<CheckoutFlowApi<B, G>>,
    body: web::Json<VerifyPaymentParams>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase + 'static,
    G: PaymentGateway + 'static,
{
    trace!("💻️ Received verify payment request for {}", body.pidx);
    let outcome = api.verify_payment(&claims.user_id, &body.pidx).await?;
    let response = match outcome {
        VerificationOutcome::Confirmed { payment, order } => VerifyPaymentResponse {
            success: true,
            message: "Payment verified successfully".to_string(),
            payment,
            order: Some(order),
        },
        VerificationOutcome::StillPending { payment } => VerifyPaymentResponse {
            success: false,
            message: "Payment is still pending".to_string(),
            payment,
            order: None,
        },
        VerificationOutcome::Declined { payment } => {
            VerifyPaymentResponse { success: false, message: "Payment failed".to_string(), payment, order: None }
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------     Cart    ----------------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement);
pub async fn my_cart<B>(claims: JwtClaims, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CartManagement + 'static {
    trace!("💻️ Received view cart request");
    let cart = api.cart_for_user(&claims.user_id).await?;
    let message = if cart.is_some() { "Cart retrieved successfully" } else { "No open cart found" };
    Ok(HttpResponse::Ok().json(CartResponse { success: true, message: message.to_string(), cart }))
}

route!(add_cart_item => Post "/cart/add" impl CartManagement);
pub async fn add_cart_item<B>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
    body: web::Json<AddItemParams>,
) -> Result<HttpResponse, ServerError>
where B: CartManagement + 'static {
    trace!("💻️ Received add to cart request for product #{}", body.product_id);
    let cart = api.add_item(&claims.user_id, body.product_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(CartResponse {
        success: true,
        message: "Product added to cart".to_string(),
        cart: Some(cart),
    }))
}

route!(remove_cart_item => Post "/cart/remove" impl CartManagement);
pub async fn remove_cart_item<B>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
    body: web::Json<RemoveItemParams>,
) -> Result<HttpResponse, ServerError>
where B: CartManagement + 'static {
    trace!("💻️ Received remove from cart request for product #{}", body.product_id);
    let cart = api.remove_item(&claims.user_id, body.product_id).await?;
    Ok(HttpResponse::Ok().json(CartResponse {
        success: true,
        message: "Product removed from cart".to_string(),
        cart: Some(cart),
    }))
}

route!(update_cart_item => Post "/cart/update" impl CartManagement);
pub async fn update_cart_item<B>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
    body: web::Json<UpdateItemParams>,
) -> Result<HttpResponse, ServerError>
where B: CartManagement + 'static {
    trace!("💻️ Received update cart request for product #{}", body.product_id);
    let cart = api.update_quantity(&claims.user_id, body.product_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(CartResponse {
        success: true,
        message: "Cart updated successfully".to_string(),
        cart: Some(cart),
    }))
}

//----------------------------------------------    Orders   ----------------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B>(claims: JwtClaims, api: web::Data<OrderApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + 'static {
    trace!("💻️ Received order history request");
    let orders = api.orders_for_user(&claims.user_id).await?;
    let message = if orders.is_empty() { "No purchased orders found" } else { "Orders retrieved successfully" };
    Ok(HttpResponse::Ok().json(OrdersResponse { success: true, message: message.to_string(), orders }))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
pub async fn order_by_id<B>(
    claims: JwtClaims,
    api: web::Data<OrderApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError>
where B: OrderManagement + 'static {
    let order_id = path.into_inner();
    trace!("💻️ Received order request for order #{order_id}");
    let order = api
        .order_for_user(&claims.user_id, order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Order retrieved successfully",
        "order": order,
    })))
}
