//! Behaviour contracts for the payment engine.
//!
//! The engine core is written against these traits rather than a concrete database or gateway, so that backends can be
//! swapped and tests can substitute scriptable fakes.
//!
//! * [`CheckoutDatabase`] is the transactional core: payment-intent persistence and the reconciliation transaction
//!   that settles, holds or declines a payment.
//! * [`CartManagement`] covers the cart mutations (add / remove / change quantity) and cart reads.
//! * [`OrderManagement`] provides read access to materialized orders.
//! * [`PaymentGateway`] abstracts the external payment provider down to the two calls the engine needs: create an
//!   intent, and look one up.

mod cart_management;
mod checkout_database;
mod order_management;
mod payment_gateway;

mod data_objects;

pub use cart_management::CartManagement;
pub use checkout_database::{CheckoutDatabase, CheckoutDbError};
pub use data_objects::{InsertOrderOutcome, ReconcileOutcome};
pub use order_management::OrderManagement;
pub use payment_gateway::{ContactInfo, GatewayError, GatewayIntent, GatewayLookup, GatewayPaymentStatus, PaymentGateway};
