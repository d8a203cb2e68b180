//! The session coordinator.
//!
//! [`SessionCoordinator`] owns the relay client handle, the proposal flow, the request flow and the list of active
//! sessions. It is cheap to clone; clones share the same state.
//!
//! Locks are never held across a relay or delegate call, with one exception: the client slot stays locked while a
//! client is being initialized, so that concurrent callers wait for it instead of creating a second one. When several
//! locks are needed they are taken in the order `requests`/`proposal` before `client` before `sessions`.
//!
//! Events from the relay client are routed to one worker task per flow, so flows never wait on each other.
mod proposals;
mod requests;
mod workers;

use crate::adapter::{EventKind, RelayClient, RelayConnector, RelayEvent};
use crate::config::RelayConfig;
use crate::delegates::{DecisionSurface, Notification, WalletDelegate};
use crate::errors::{ConnectionError, CoordinatorError, PairingError, RelayError};
use crate::subscription::{EventSubscription, RelayEventHandler};
use libwalletconnect::state_machine::{ClientStage, ProposalFlow, ProposalStage, RequestQueue, RequestStage};
use libwalletconnect::{ActiveSession, ErrorReason, PairingUri, PeerMetadata};
use log::*;
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::{Mutex, RwLock};
use workers::FlowWorkers;

struct ClientSlot<T> {
    stage: ClientStage,
    client: Option<T>,
    subscription: Option<EventSubscription>,
}

impl<T> Default for ClientSlot<T> {
    fn default() -> Self {
        Self { stage: ClientStage::Uninitialized, client: None, subscription: None }
    }
}

struct Inner<C: RelayConnector, D: WalletDelegate> {
    config: RelayConfig,
    connector: C,
    delegate: D,
    client: Mutex<ClientSlot<C::Client>>,
    proposal: Mutex<ProposalFlow>,
    requests: Mutex<RequestQueue>,
    sessions: RwLock<Vec<ActiveSession>>,
    workers: OnceLock<FlowWorkers>,
}

pub struct SessionCoordinator<C: RelayConnector, D: WalletDelegate> {
    inner: Arc<Inner<C, D>>,
}

impl<C: RelayConnector, D: WalletDelegate> Clone for SessionCoordinator<C, D> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// Shows a busy indicator on the decision surface for as long as it lives.
pub(crate) struct BusyGuard<'a, S: DecisionSurface> {
    surface: &'a S,
}

impl<'a, S: DecisionSurface> BusyGuard<'a, S> {
    fn new(surface: &'a S, message: &str) -> Self {
        surface.set_busy(Some(message));
        Self { surface }
    }
}

impl<S: DecisionSurface> Drop for BusyGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.set_busy(None);
    }
}

/// Feeds relay events to the coordinator's flow workers without keeping the coordinator alive.
struct EventRouter<C: RelayConnector, D: WalletDelegate> {
    inner: Weak<Inner<C, D>>,
}

impl<C: RelayConnector, D: WalletDelegate> RelayEventHandler for EventRouter<C, D> {
    async fn handle(&self, event: RelayEvent) {
        let Some(inner) = self.inner.upgrade() else {
            debug!("Coordinator is gone. Dropping {} event", event.kind());
            return;
        };
        match inner.workers.get() {
            Some(workers) => workers.route(event),
            None => SessionCoordinator { inner }.handle_event(event).await,
        }
    }
}

impl<C: RelayConnector, D: WalletDelegate> SessionCoordinator<C, D> {
    pub fn new(config: RelayConfig, connector: C, delegate: D) -> Self {
        let inner = Inner {
            config,
            connector,
            delegate,
            client: Mutex::new(ClientSlot::default()),
            proposal: Mutex::new(ProposalFlow::default()),
            requests: Mutex::new(RequestQueue::default()),
            sessions: RwLock::new(Vec::new()),
            workers: OnceLock::new(),
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn delegate(&self) -> &D {
        &self.inner.delegate
    }

    pub async fn client_stage(&self) -> ClientStage {
        self.inner.client.lock().await.stage
    }

    pub async fn proposal_stage(&self) -> ProposalStage {
        self.inner.proposal.lock().await.stage()
    }

    pub async fn request_stage(&self) -> RequestStage {
        self.inner.requests.lock().await.flow.stage()
    }

    fn busy(&self, message: &str) -> BusyGuard<'_, D> {
        BusyGuard::new(&self.inner.delegate, message)
    }

    fn notify(&self, notification: Notification) {
        self.inner.delegate.notify(notification);
    }

    //------------------------------------------   Client lifecycle   --------------------------------------------------

    /// Returns the relay client, creating it (and subscribing to its events) if there is none yet.
    ///
    /// A failed initialization leaves the coordinator uninitialized. It is not retried until the next call that needs
    /// a client.
    pub async fn ensure_client(&self) -> Result<C::Client, ConnectionError> {
        let client = {
            let mut slot = self.inner.client.lock().await;
            if let Some(client) = &slot.client {
                return Ok(client.clone());
            }
            if self.inner.config.project_id.is_none() {
                error!("Cannot create a relay client without a project id");
                return Err(ConnectionError::MissingProjectId);
            }
            slot.stage = ClientStage::Initializing;
            info!("Initializing relay client for {}", self.inner.config.relay_url);
            let client = match self.inner.connector.initialize(&self.inner.config).await {
                Ok(client) => client,
                Err(e) => {
                    slot.stage = ClientStage::Uninitialized;
                    error!("Could not initialize the relay client. {e}");
                    return Err(e);
                }
            };
            self.inner.workers.get_or_init(|| FlowWorkers::spawn(Arc::downgrade(&self.inner)));
            let router = EventRouter { inner: Arc::downgrade(&self.inner) };
            // Replacing the subscription drops the old one, which stops its pump.
            slot.subscription = Some(EventSubscription::attach(&client, &EventKind::ALL, router));
            slot.client = Some(client.clone());
            slot.stage = ClientStage::Ready;
            client
        };
        if let Err(e) = self.refresh_sessions_from(&client).await {
            warn!("Could not load active sessions from the new client. {e}");
        }
        Ok(client)
    }

    /// Drops the current client and its subscriptions and creates a new one.
    pub async fn reconnect(&self) -> Result<C::Client, ConnectionError> {
        self.release_client().await;
        self.ensure_client().await
    }

    /// Releases the client handle and its event subscriptions.
    pub async fn shutdown(&self) {
        self.release_client().await;
        self.inner.sessions.write().await.clear();
        info!("Session coordinator shut down");
    }

    async fn release_client(&self) {
        let mut slot = self.inner.client.lock().await;
        if slot.client.take().is_some() {
            debug!("Releasing relay client");
        }
        slot.subscription = None;
        slot.stage = ClientStage::Uninitialized;
    }

    //------------------------------------------   Pairing   -----------------------------------------------------------

    /// Pairs with a dApp using a `wc:` URI.
    ///
    /// If the wallet is already paired on the URI's topic, the pairing is reactivated when necessary and any proposal
    /// still waiting in the client's history is dispatched locally, since the relay will not deliver it again.
    /// Otherwise a fresh handshake is performed and the proposal arrives through the event stream.
    pub async fn pair(&self, uri: &str) -> Result<(), CoordinatorError> {
        let result = self.try_pair(uri).await;
        if let Err(e) = &result {
            self.notify(Notification::error(format!("Could not pair with the dApp. {e}")));
        }
        result
    }

    async fn try_pair(&self, uri: &str) -> Result<(), CoordinatorError> {
        let uri = uri.parse::<PairingUri>().map_err(PairingError::from)?;
        let _busy = self.busy("Connecting to the dApp");
        let client = self.ensure_client().await?;
        let existing = client.list_pairings().await?.into_iter().find(|p| p.topic == uri.topic);
        match existing {
            Some(pairing) => {
                if !pairing.active {
                    info!("Reactivating pairing {}", pairing.topic);
                    client.activate_pairing(&pairing.topic).await?;
                }
                match client.find_pending_proposal(&pairing.topic).await? {
                    Some(params) => {
                        info!("Found unanswered proposal {} on pairing {}", params.id, pairing.topic);
                        self.on_session_proposal(params).await;
                    }
                    None => debug!("No pending proposal on pairing {}", pairing.topic),
                }
            }
            None => {
                info!("Pairing with new topic {}", uri.topic);
                client.pair(&uri).await?;
            }
        }
        Ok(())
    }

    /// Ends the session on `topic` and reloads the active sessions.
    pub async fn unpair(&self, topic: &str) -> Result<(), CoordinatorError> {
        let _busy = self.busy("Disconnecting");
        let client = self.ensure_client().await?;
        let disconnected = client.disconnect(topic, ErrorReason::user_disconnected()).await;
        let refreshed = self.refresh_sessions_from(&client).await;
        match (disconnected, refreshed) {
            (Ok(()), Ok(())) => {
                info!("Disconnected session {topic}");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Could not disconnect session {topic}. {e}");
                self.notify(Notification::error(format!("Could not disconnect. {e}")));
                Err(e.into())
            }
        }
    }

    //------------------------------------------   Sessions   ----------------------------------------------------------

    /// Replaces the active-session list with the client's current view.
    pub async fn refresh_sessions(&self) -> Result<(), CoordinatorError> {
        let client = self.ensure_client().await?;
        Ok(self.refresh_sessions_from(&client).await?)
    }

    async fn refresh_sessions_from(&self, client: &C::Client) -> Result<(), RelayError> {
        let sessions = client.active_sessions().await?;
        debug!("{} active sessions", sessions.len());
        *self.inner.sessions.write().await = sessions;
        Ok(())
    }

    pub async fn active_sessions(&self) -> Vec<ActiveSession> {
        self.inner.sessions.read().await.clone()
    }

    /// The metadata of the dApp behind the pending request, if it is known.
    pub async fn request_peer_metadata(&self) -> Option<PeerMetadata> {
        let topic = self.inner.requests.lock().await.flow.pending().map(|r| r.event.topic.clone())?;
        let sessions = self.inner.sessions.read().await;
        sessions.iter().find(|s| s.topic == topic).map(|s| s.peer.clone())
    }

    //------------------------------------------   Events   ------------------------------------------------------------

    /// Handles one relay event to completion. Events delivered by the client reach this through the flow workers, in
    /// arrival order within each flow.
    pub async fn handle_event(&self, event: RelayEvent) {
        trace!("Handling {} event", event.kind());
        match event {
            RelayEvent::SessionProposal(params) => self.on_session_proposal(params).await,
            RelayEvent::SessionRequest(request) => self.on_session_request(request).await,
            RelayEvent::SessionDelete { topic } => {
                info!("The dApp deleted session {topic}");
                self.on_session_gone(&topic).await;
            }
            RelayEvent::SessionExpire { topic } => {
                info!("Session {topic} expired");
                self.on_session_gone(&topic).await;
            }
            RelayEvent::SessionUpdate { topic, .. } | RelayEvent::SessionExtend { topic } => {
                debug!("Session {topic} changed");
                self.refresh_after_event().await;
            }
            RelayEvent::ProposalExpire { id } => self.on_proposal_expired(id).await,
            RelayEvent::SessionEvent { topic, name, .. } => debug!("Session event {name} on {topic}"),
            RelayEvent::SessionPing { topic } => trace!("Ping on {topic}"),
        }
    }

    async fn refresh_after_event(&self) {
        let client = self.inner.client.lock().await.client.clone();
        if let Some(client) = client {
            if let Err(e) = self.refresh_sessions_from(&client).await {
                warn!("Could not refresh active sessions. {e}");
            }
        }
    }
}

#[cfg(test)]
impl<C: RelayConnector, D: WalletDelegate> SessionCoordinator<C, D> {
    pub(crate) async fn has_subscription(&self) -> bool {
        self.inner.client.lock().await.subscription.as_ref().map(|s| s.is_active()).unwrap_or(false)
    }
}
