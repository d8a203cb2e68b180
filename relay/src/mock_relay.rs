//! An in-memory relay for tests and offline tooling.
//!
//! [`MockRelay`] is both the connector and the client. Every outbound call is recorded as a [`RelayCall`], events
//! can be injected with [`MockRelay::emit`], and failures and acknowledgement outcomes can be scripted.
use crate::adapter::{EventKind, ProposalApproval, RelayClient, RelayConnector, RelayEvent};
use crate::config::RelayConfig;
use crate::errors::{ConnectionError, PairingError, RelayError};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::FutureExt;
use libwalletconnect::{
    ActiveSession, ErrorReason, Namespaces, Pairing, PairingUri, PeerMetadata, ProposalParams, RpcResponse,
    SessionRequestEvent,
};
use log::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub enum RelayCall {
    Initialize,
    Pair { topic: String },
    ActivatePairing { topic: String },
    ApproveProposal { id: u64, relay_protocol: String, namespaces: Namespaces },
    RejectProposal { id: u64, reason: ErrorReason },
    Respond { topic: String, response: RpcResponse },
    Disconnect { topic: String, reason: ErrorReason },
}

/// How the peer reacts to a proposal approval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AckBehaviour {
    #[default]
    Acknowledge,
    /// The approval is sent, but the acknowledgement fails.
    Fail(String),
    /// The approval call itself fails.
    Refuse(String),
}

#[derive(Default)]
struct MockState {
    calls: Vec<RelayCall>,
    pairings: Vec<Pairing>,
    proposal_history: Vec<ProposalParams>,
    proposal_on_pair: Option<ProposalParams>,
    sessions: Vec<ActiveSession>,
    pending_requests: Vec<SessionRequestEvent>,
    subscribers: Vec<(Vec<EventKind>, UnboundedSender<RelayEvent>)>,
    ack: AckBehaviour,
    init_failures: usize,
    fail_responses: bool,
    fail_disconnects: bool,
    fail_pairing: bool,
    initializations: usize,
}

#[derive(Clone, Default)]
pub struct MockRelay {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRelay").finish_non_exhaustive()
    }
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    //------------------------------------------   Scripting   ---------------------------------------------------------

    pub fn add_pairing(&self, pairing: Pairing) {
        self.state().pairings.push(pairing);
    }

    /// Records an unanswered proposal in the client's request history.
    pub fn add_proposal_history(&self, params: ProposalParams) {
        self.state().proposal_history.push(params);
    }

    /// Makes the next fresh pairing deliver `params` as a `session_proposal` event.
    pub fn propose_on_pair(&self, params: ProposalParams) {
        self.state().proposal_on_pair = Some(params);
    }

    pub fn add_session(&self, session: ActiveSession) {
        self.state().sessions.push(session);
    }

    pub fn add_pending_request(&self, request: SessionRequestEvent) {
        self.state().pending_requests.push(request);
    }

    pub fn set_ack_behaviour(&self, ack: AckBehaviour) {
        self.state().ack = ack;
    }

    /// The next `count` initializations fail.
    pub fn fail_initializations(&self, count: usize) {
        self.state().init_failures = count;
    }

    pub fn fail_responses(&self, fail: bool) {
        self.state().fail_responses = fail;
    }

    pub fn fail_disconnects(&self, fail: bool) {
        self.state().fail_disconnects = fail;
    }

    pub fn fail_pairing(&self, fail: bool) {
        self.state().fail_pairing = fail;
    }

    //------------------------------------------   Inspection   --------------------------------------------------------

    pub fn calls(&self) -> Vec<RelayCall> {
        self.state().calls.clone()
    }

    pub fn responses(&self) -> Vec<(String, RpcResponse)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                RelayCall::Respond { topic, response } => Some((topic.clone(), response.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn responses_for(&self, topic: &str, id: u64) -> Vec<RpcResponse> {
        self.responses().into_iter().filter(|(t, r)| t == topic && r.id == id).map(|(_, r)| r).collect()
    }

    pub fn initializations(&self) -> usize {
        self.state().initializations
    }

    pub fn pairings(&self) -> Vec<Pairing> {
        self.state().pairings.clone()
    }

    /// The number of subscribers whose receiving end is still alive.
    pub fn live_subscribers(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        state.subscribers.len()
    }

    /// Delivers `event` to every live subscriber interested in its kind. Returns how many received it.
    pub fn emit(&self, event: RelayEvent) -> usize {
        let mut state = self.state();
        let kind = event.kind();
        state.subscribers.retain(|(_, tx)| !tx.is_closed());
        let mut delivered = 0;
        for (kinds, tx) in &state.subscribers {
            if kinds.contains(&kind) && tx.unbounded_send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!("MockRelay: {kind} delivered to {delivered} subscribers");
        delivered
    }

    fn record(&self, call: RelayCall) {
        self.state().calls.push(call);
    }
}

impl RelayConnector for MockRelay {
    type Client = MockRelay;

    async fn initialize(&self, config: &RelayConfig) -> Result<Self::Client, ConnectionError> {
        let mut state = self.state();
        state.calls.push(RelayCall::Initialize);
        if state.init_failures > 0 {
            state.init_failures -= 1;
            return Err(ConnectionError::ConnectFailed {
                url: config.relay_url.clone(),
                reason: "mock relay is unreachable".to_string(),
            });
        }
        state.initializations += 1;
        Ok(self.clone())
    }
}

impl RelayClient for MockRelay {
    async fn pair(&self, uri: &PairingUri) -> Result<(), PairingError> {
        self.record(RelayCall::Pair { topic: uri.topic.clone() });
        let proposal = {
            let mut state = self.state();
            if state.fail_pairing {
                return Err(PairingError::HandshakeFailed("mock handshake refused".into()));
            }
            state.pairings.push(Pairing::new(uri.topic.clone(), true));
            let proposal = state.proposal_on_pair.take();
            state.proposal_history.extend(proposal.clone());
            proposal
        };
        if let Some(params) = proposal {
            self.emit(RelayEvent::SessionProposal(params));
        }
        Ok(())
    }

    async fn list_pairings(&self) -> Result<Vec<Pairing>, RelayError> {
        Ok(self.state().pairings.clone())
    }

    async fn activate_pairing(&self, topic: &str) -> Result<(), PairingError> {
        self.record(RelayCall::ActivatePairing { topic: topic.to_string() });
        let mut state = self.state();
        match state.pairings.iter_mut().find(|p| p.topic == topic) {
            Some(pairing) => {
                pairing.active = true;
                Ok(())
            }
            None => Err(PairingError::ActivationFailed(topic.to_string())),
        }
    }

    async fn find_pending_proposal(&self, topic: &str) -> Result<Option<ProposalParams>, RelayError> {
        Ok(self.state().proposal_history.iter().find(|p| p.pairing_topic == topic).cloned())
    }

    async fn approve_proposal(
        &self,
        id: u64,
        relay_protocol: &str,
        namespaces: Namespaces,
    ) -> Result<ProposalApproval, RelayError> {
        let mut state = self.state();
        state.calls.push(RelayCall::ApproveProposal {
            id,
            relay_protocol: relay_protocol.to_string(),
            namespaces: namespaces.clone(),
        });
        let peer = state
            .proposal_history
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.proposer.metadata.clone())
            .unwrap_or_else(|| PeerMetadata { name: format!("dApp {id}"), ..Default::default() });
        state.proposal_history.retain(|p| p.id != id);
        let topic = format!("session-{id}");
        let acknowledged = match state.ack.clone() {
            AckBehaviour::Refuse(reason) => return Err(RelayError::failed(reason)),
            AckBehaviour::Fail(reason) => futures::future::ready(Err(RelayError::NotAcknowledged(reason))).boxed(),
            AckBehaviour::Acknowledge => {
                state.sessions.push(ActiveSession { topic: topic.clone(), peer, namespaces, expiry: None });
                futures::future::ready(Ok(())).boxed()
            }
        };
        Ok(ProposalApproval { topic, acknowledged })
    }

    async fn reject_proposal(&self, id: u64, reason: ErrorReason) -> Result<(), RelayError> {
        let mut state = self.state();
        state.calls.push(RelayCall::RejectProposal { id, reason });
        state.proposal_history.retain(|p| p.id != id);
        Ok(())
    }

    async fn respond(&self, topic: &str, response: RpcResponse) -> Result<(), RelayError> {
        let mut state = self.state();
        let id = response.id;
        state.calls.push(RelayCall::Respond { topic: topic.to_string(), response });
        if state.fail_responses {
            return Err(RelayError::failed("mock relay dropped the response"));
        }
        state.pending_requests.retain(|r| !(r.topic == topic && r.id == id));
        Ok(())
    }

    async fn disconnect(&self, topic: &str, reason: ErrorReason) -> Result<(), RelayError> {
        let mut state = self.state();
        state.calls.push(RelayCall::Disconnect { topic: topic.to_string(), reason });
        if state.fail_disconnects {
            return Err(RelayError::failed("mock relay could not disconnect"));
        }
        state.sessions.retain(|s| s.topic != topic);
        Ok(())
    }

    async fn active_sessions(&self) -> Result<Vec<ActiveSession>, RelayError> {
        Ok(self.state().sessions.clone())
    }

    async fn pending_requests(&self) -> Result<Vec<SessionRequestEvent>, RelayError> {
        Ok(self.state().pending_requests.clone())
    }

    fn subscribe(&self, kinds: &[EventKind]) -> UnboundedReceiver<RelayEvent> {
        let (tx, rx) = unbounded();
        self.state().subscribers.push((kinds.to_vec(), tx));
        rx
    }
}
