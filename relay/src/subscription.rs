use crate::adapter::{EventKind, RelayClient, RelayEvent};
use futures::StreamExt;
use log::*;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub trait RelayEventHandler: Send + Sync + 'static {
    fn handle(&self, event: RelayEvent) -> impl Future<Output = ()> + Send;
}

/// A live subscription to a relay client's events.
///
/// Events are handed to the handler one at a time, in the order the client delivered them. Dropping the subscription
/// stops the pump and releases the client-side receiver, so replacing a client never leads to duplicate delivery.
/// The pump only stops between events: an event that is already being handled is handled to the end.
pub struct EventSubscription {
    kinds: Vec<EventKind>,
    stop: Option<oneshot::Sender<()>>,
    pump: JoinHandle<()>,
}

impl EventSubscription {
    pub fn attach<C: RelayClient, H: RelayEventHandler>(client: &C, kinds: &[EventKind], handler: H) -> Self {
        let mut events = client.subscribe(kinds);
        let (stop, mut stopped) = oneshot::channel::<()>();
        debug!("Subscribing to {} relay event kinds", kinds.len());
        let pump = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = &mut stopped => {
                        debug!("Relay event subscription released");
                        break;
                    }
                    event = events.next() => match event {
                        Some(event) => event,
                        None => {
                            debug!("Relay event stream closed");
                            break;
                        }
                    },
                };
                trace!("Relay event received: {}", event.kind());
                handler.handle(event).await;
            }
        });
        Self { kinds: kinds.to_vec(), stop: Some(stop), pump }
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    pub fn is_active(&self) -> bool {
        !self.pump.is_finished()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        trace!("Releasing relay event subscription");
        // Dropping the sender wakes the pump the next time it waits for an event.
        self.stop.take();
    }
}
