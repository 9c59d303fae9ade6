use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PayoutEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payout_producer: Vec<EventProducer<PayoutEvent>>,
}

pub struct EventHandlers {
    pub on_payout: Option<EventHandler<PayoutEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payout = hooks.on_payout.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payout }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payout {
            result.payout_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payout {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payout: Option<Handler<PayoutEvent>>,
}

impl EventHooks {
    pub fn on_payout<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout = Some(Arc::new(f));
        self
    }
}
