use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, TicketIssuedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub ticket_issued_producer: Vec<EventProducer<TicketIssuedEvent>>,
}

pub struct EventHandlers {
    pub on_ticket_issued: Option<EventHandler<TicketIssuedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_ticket_issued = hooks.on_ticket_issued.map(|f| EventHandler::new(buffer_size, f));
        Self { on_ticket_issued }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_ticket_issued {
            result.ticket_issued_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_ticket_issued {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_ticket_issued: Option<Handler<TicketIssuedEvent>>,
}

impl EventHooks {
    pub fn on_ticket_issued<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TicketIssuedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_ticket_issued = Some(Arc::new(f));
        self
    }
}
