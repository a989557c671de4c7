use std::fmt::Debug;

use kps_common::Paisa;
use log::*;

use crate::{
    db_types::{CartStatus, NewPaymentIntent, PaymentStatus, UserId},
    events::{EventProducers, OrderPaidEvent, PaymentDeclinedEvent},
    kpe_api::{
        checkout_objects::{PaymentIntent, VerificationOutcome},
        errors::CheckoutFlowError,
        in_flight::InFlightVerifications,
        retry::{RetryError, RetryPolicy},
    },
    traits::{CheckoutDatabase, CheckoutDbError, ContactInfo, PaymentGateway, ReconcileOutcome},
};

/// `CheckoutFlowApi` drives the checkout protocol: creating payment intents against the gateway and reconciling the
/// gateway's asynchronous verdicts into local payment, cart and order state.
///
/// Verification is safe to call concurrently and repeatedly for the same reference: duplicate in-process callers are
/// collapsed by the single-flight registry, lost transactional races are retried, and the one-order-per-cart
/// constraint guarantees that settlement materializes exactly one order no matter how attempts interleave.
pub struct CheckoutFlowApi<B, G> {
    db: B,
    gateway: G,
    in_flight: InFlightVerifications,
    retry: RetryPolicy,
    producers: EventProducers,
}

impl<B, G> Debug for CheckoutFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutFlowApi")
    }
}

impl<B, G> CheckoutFlowApi<B, G> {
    pub fn new(db: B, gateway: G, in_flight: InFlightVerifications, producers: EventProducers) -> Self {
        Self { db, gateway, in_flight, retry: RetryPolicy::default(), producers }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> CheckoutFlowApi<B, G>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    /// Creates a payment intent for the cart, or returns the one that already exists.
    ///
    /// Repeated checkout clicks are harmless: as long as the cart has an open payment, every call returns that same
    /// intent and the gateway is not contacted again. A new intent is only created for an `Active` cart whose `amount`
    /// matches the cart total, and the payment record and the cart's move to `Pending` commit atomically.
    pub async fn initiate_payment(
        &self,
        user_id: &UserId,
        cart_id: i64,
        amount: Paisa,
        contact: &ContactInfo,
    ) -> Result<PaymentIntent, CheckoutFlowError> {
        if amount <= Paisa::from(0) {
            return Err(CheckoutFlowError::ValidationError("Amount must be a positive number".to_string()));
        }
        let cart = self.db.fetch_cart(cart_id).await?.ok_or(CheckoutFlowError::CartNotFound(cart_id))?;
        if cart.user_id != *user_id {
            warn!("💳️ User {user_id} tried to initiate payment for cart #{cart_id}, which they do not own");
            return Err(CheckoutFlowError::Unauthorized);
        }
        if let Some(existing) = self.db.fetch_pending_payment_for_cart(cart_id).await? {
            debug!("💳️ Cart #{cart_id} already has payment intent {}. Returning it unchanged.", existing.pidx);
            return Ok(PaymentIntent::from(existing));
        }
        if cart.status != CartStatus::Active {
            return Err(CheckoutFlowError::ValidationError(format!(
                "Cart #{cart_id} is not open for checkout (status: {})",
                cart.status
            )));
        }
        if amount != cart.total_price {
            return Err(CheckoutFlowError::ValidationError(format!(
                "Amount {amount} does not match the cart total {}",
                cart.total_price
            )));
        }
        let reference = order_reference(cart_id);
        let intent = self.gateway.create_intent(&reference, amount, contact).await?;
        let new_intent = NewPaymentIntent {
            user_id: user_id.clone(),
            cart_id,
            amount,
            pidx: intent.pidx,
            payment_url: intent.payment_url,
        };
        let payment = match self.db.insert_payment_intent(new_intent).await {
            Ok(payment) => payment,
            Err(CheckoutDbError::UniqueViolation(_)) => {
                // Two first-time initiations raced past the pending-payment check. The store picked a winner;
                // return its intent.
                self.db
                    .fetch_pending_payment_for_cart(cart_id)
                    .await?
                    .ok_or(CheckoutFlowError::CartNotFound(cart_id))?
            },
            Err(e) => return Err(e.into()),
        };
        info!("💳️ Payment intent {} created for cart #{cart_id} ({})", payment.pidx, payment.amount);
        Ok(PaymentIntent::from(payment))
    }

    /// Determines the authoritative status of the payment identified by `pidx` and, exactly once per cart,
    /// materializes the corresponding order.
    ///
    /// The steps, in order:
    /// 1. Single-flight admission: a duplicate concurrent call for the same reference is answered with
    ///    [`CheckoutFlowError::VerificationInProgress`] without touching the store or the gateway.
    /// 2. Ownership check, before any gateway traffic.
    /// 3. Settled short-circuit: an already-`Completed` payment is answered from local state.
    /// 4. Otherwise, up to `retry` attempts of: fresh gateway lookup, then one reconciliation transaction.
    ///
    /// Any [`VerificationOutcome`] is a definitive answer; the caller may poll again after `StillPending`.
    pub async fn verify_payment(
        &self,
        user_id: &UserId,
        pidx: &str,
    ) -> Result<VerificationOutcome, CheckoutFlowError> {
        let Some(_claim) = self.in_flight.try_claim(pidx) else {
            debug!("🔄️ Verification of {pidx} is already in flight. Telling the caller to come back later.");
            return Err(CheckoutFlowError::VerificationInProgress(pidx.to_string()));
        };
        let payment =
            self.db.fetch_payment_by_pidx(pidx).await?.ok_or_else(|| CheckoutFlowError::PaymentNotFound(pidx.to_string()))?;
        if payment.user_id != *user_id {
            warn!("🔄️ User {user_id} tried to verify payment {pidx}, which they do not own");
            return Err(CheckoutFlowError::Unauthorized);
        }
        if payment.status == PaymentStatus::Completed {
            // Settled payments are answered from local state; the gateway is not consulted again.
            let order = self
                .db
                .fetch_order_for_cart(payment.cart_id)
                .await?
                .ok_or_else(|| CheckoutFlowError::OrderMissingForSettledPayment(pidx.to_string()))?;
            trace!("🔄️ Payment {pidx} was already settled. Returning order #{}.", order.order.id);
            return Ok(VerificationOutcome::Confirmed { payment, order });
        }
        let outcome = self
            .retry
            .run(CheckoutFlowError::is_transient, |attempt| self.reconcile_once(pidx, attempt))
            .await
            .map_err(|e| match e {
                RetryError::Terminal(e) => e,
                RetryError::Exhausted { attempts, last_error } => {
                    warn!("🔄️ Verification of {pidx} lost {attempts} transactions in a row. Last error: {last_error:?}");
                    CheckoutFlowError::RetriesExhausted(attempts)
                },
            })?;
        match &outcome {
            VerificationOutcome::Confirmed { order, .. } => {
                info!("🔄️✅️ Payment {pidx} verified. Order #{} stands for cart #{}.", order.order.id, order.order.cart_id);
                self.call_order_paid_hook(order).await;
            },
            VerificationOutcome::StillPending { .. } => {
                debug!("🔄️ Payment {pidx} is still pending at the gateway.");
            },
            VerificationOutcome::Declined { payment } => {
                info!("🔄️❌️ Payment {pidx} was declined by the gateway.");
                self.call_payment_declined_hook(payment.clone()).await;
            },
        }
        Ok(outcome)
    }

    /// One reconciliation attempt: a fresh gateway lookup followed by one store transaction. The transaction re-reads
    /// the payment and cart, so neither side of the comparison is stale.
    async fn reconcile_once(&self, pidx: &str, attempt: u32) -> Result<VerificationOutcome, CheckoutFlowError> {
        trace!("🔄️ Reconciliation attempt #{attempt} for {pidx}");
        let lookup = self.gateway.lookup(pidx).await?;
        let outcome = self.db.reconcile_payment(pidx, &lookup).await?;
        Ok(match outcome {
            ReconcileOutcome::Settled { payment, order } => VerificationOutcome::Confirmed { payment, order },
            ReconcileOutcome::StillPending { payment } => VerificationOutcome::StillPending { payment },
            ReconcileOutcome::Declined { payment } => VerificationOutcome::Declined { payment },
        })
    }

    async fn call_order_paid_hook(&self, order: &crate::db_types::OrderSnapshot) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent { order: order.clone() };
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_declined_hook(&self, payment: crate::db_types::Payment) {
        for emitter in &self.producers.payment_declined_producer {
            debug!("🔄️❌️ Notifying payment declined hook subscribers");
            let event = PaymentDeclinedEvent { payment: payment.clone() };
            emitter.publish_event(event).await;
        }
    }
}

/// The merchant-side purchase reference forwarded to the gateway. The random suffix keeps references unique when a
/// cart goes through checkout more than once (e.g. after a declined payment).
fn order_reference(cart_id: i64) -> String {
    format!("ORDER-{cart_id}-{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_references_embed_the_cart_id() {
        let reference = order_reference(42);
        assert!(reference.starts_with("ORDER-42-"));
        assert_ne!(order_reference(42), order_reference(42));
    }
}
