use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent, PaymentDeclinedEvent};

/// The producer ends of the configured event channels. Held by the checkout flow API, which publishes into every
/// registered producer.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub payment_declined_producer: Vec<EventProducer<PaymentDeclinedEvent>>,
}

/// The handler ends of the configured event channels. Call [`EventHandlers::start_handlers`] once during server
/// startup to spawn the consumer tasks.
pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_payment_declined: Option<EventHandler<PaymentDeclinedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_declined = hooks.on_payment_declined.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_payment_declined }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_declined {
            result.payment_declined_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_payment_declined {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// The hook callbacks an embedding application wants to run on checkout events.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_payment_declined: Option<Handler<PaymentDeclinedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_payment_declined<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentDeclinedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_declined = Some(Arc::new(f));
        self
    }
}
