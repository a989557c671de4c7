//! # Kirana payment engine public API
//!
//! The `kpe_api` module exposes the programmatic API of the payment engine. An API instance is created by supplying
//! collaborators that implement the backend traits it needs:
//!
//! * [`checkout_flow_api`] drives the checkout protocol: payment initiation and the verification coordinator that
//!   reconciles gateway state into local payment, cart and order state.
//! * [`cart_api`] provides the cart operations (add, remove, change quantity, view).
//! * [`orders_api`] provides read access to materialized orders.
//!
//! The remaining submodules are the support pieces the checkout flow is assembled from: the in-process
//! [`in_flight::InFlightVerifications`] single-flight registry and the [`retry::RetryPolicy`] that wraps the
//! reconciliation transaction.

pub mod cart_api;
pub mod checkout_flow_api;
pub mod checkout_objects;
pub mod errors;
pub mod in_flight;
pub mod orders_api;
pub mod retry;
