//! One worker task per independent flow.
//!
//! The event pump only routes events to these workers, so a slow transaction build never holds up a proposal and an
//! API call never waits for a signing request. Each worker handles its events in arrival order. Session deletions go
//! to the request worker, so that they are seen after the requests that arrived before them on the same topic.
//!
//! Workers hold the coordinator weakly. Their channels belong to the coordinator, so they stop once it is dropped.
use super::{Inner, SessionCoordinator};
use crate::adapter::{RelayConnector, RelayEvent};
use crate::delegates::WalletDelegate;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use libwalletconnect::RelayMethod;
use log::*;
use std::sync::Weak;

pub(super) struct FlowWorkers {
    proposals: UnboundedSender<RelayEvent>,
    requests: UnboundedSender<RelayEvent>,
    api_calls: UnboundedSender<RelayEvent>,
    sessions: UnboundedSender<RelayEvent>,
}

impl FlowWorkers {
    pub(super) fn spawn<C: RelayConnector, D: WalletDelegate>(inner: Weak<Inner<C, D>>) -> Self {
        debug!("Starting flow workers");
        Self {
            proposals: spawn_worker("proposal", inner.clone()),
            requests: spawn_worker("request", inner.clone()),
            api_calls: spawn_worker("API call", inner.clone()),
            sessions: spawn_worker("session", inner),
        }
    }

    /// Hands `event` to the worker of the flow it belongs to. Never waits.
    pub(super) fn route(&self, event: RelayEvent) {
        let worker = match &event {
            RelayEvent::SessionProposal(_) | RelayEvent::ProposalExpire { .. } => &self.proposals,
            RelayEvent::SessionRequest(request) => match request.method {
                RelayMethod::RequestNodeApi | RelayMethod::RequestExplorerApi => &self.api_calls,
                _ => &self.requests,
            },
            RelayEvent::SessionDelete { .. } | RelayEvent::SessionExpire { .. } => &self.requests,
            RelayEvent::SessionUpdate { .. }
            | RelayEvent::SessionExtend { .. }
            | RelayEvent::SessionEvent { .. }
            | RelayEvent::SessionPing { .. } => &self.sessions,
        };
        if let Err(e) = worker.unbounded_send(event) {
            warn!("Flow worker is gone. Dropping {} event", e.into_inner().kind());
        }
    }
}

fn spawn_worker<C: RelayConnector, D: WalletDelegate>(
    name: &'static str,
    inner: Weak<Inner<C, D>>,
) -> UnboundedSender<RelayEvent> {
    let (tx, mut rx) = unbounded::<RelayEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.next().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            SessionCoordinator { inner }.handle_event(event).await;
        }
        debug!("The {name} worker has stopped");
    });
    tx
}
