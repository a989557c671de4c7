//! Kirana Payment Engine
//!
//! The engine is the core of the Kirana payment server: it owns the cart, payment and order state, and the protocol
//! that reconciles the external payment gateway's verdicts into that state. It is provider-agnostic; the concrete
//! gateway client lives in a sibling crate and is adapted onto the [`traits::PaymentGateway`] trait by the embedding
//! application.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly; use the public API instead. The exception is the record types, which are defined in
//!    [`db_types`] and are public.
//! 2. The engine public API (`kpe_api`). [`CheckoutFlowApi`] drives payment initiation and verification,
//!    [`CartApi`] the cart operations, and [`OrderApi`] the order queries. Backends implement the traits in
//!    [`traits`] to power these APIs.
//! 3. Events ([`events`]). When verification settles or declines a payment, the engine publishes an event. A small
//!    hook system lets the embedding application react (send a confirmation mail, kick off fulfilment) without
//!    coupling the engine to those concerns.

mod db;

pub mod db_types;
pub mod events;
mod kpe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use kpe_api::{
    cart_api::CartApi,
    checkout_flow_api::CheckoutFlowApi,
    checkout_objects::{PaymentIntent, VerificationOutcome},
    errors::{CartApiError, CheckoutFlowError, OrderApiError},
    in_flight::{InFlightVerifications, VerificationClaim},
    orders_api::OrderApi,
    retry::{RetryError, RetryPolicy},
};
