//! Standalone client for the Khalti ePayment API.
//!
//! This crate only knows how to talk to Khalti: creating a payment intent (`epayment/initiate`) and looking up the
//! state of an existing one (`epayment/lookup`). It has no opinion about carts, orders, or what a lookup result
//! *means* — that is the payment engine's job.

mod api;
mod config;
mod error;

mod data_objects;

pub use api::KhaltiApi;
pub use config::KhaltiConfig;
pub use data_objects::{
    CustomerInfo,
    InitiateRequest,
    InitiateResponse,
    KhaltiPaymentStatus,
    LookupResponse,
};
pub use error::KhaltiApiError;
