//! The contract the coordinator expects from a relay-protocol client.
//!
//! Connection handling, encryption and transport all live behind these traits. [`RelayConnector`] creates clients
//! from a [`RelayConfig`], and a [`RelayClient`] is a cheap, cloneable handle onto one live connection.
use crate::config::RelayConfig;
use crate::errors::{ConnectionError, PairingError, RelayError};
use futures::channel::mpsc::UnboundedReceiver;
use futures::future::BoxFuture;
use libwalletconnect::{
    ActiveSession, ErrorReason, Namespaces, Pairing, PairingUri, ProposalParams, RpcResponse, SessionRequestEvent,
};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::future::Future;

/// The kinds of events a relay client can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionProposal,
    SessionRequest,
    SessionDelete,
    SessionUpdate,
    SessionEvent,
    SessionPing,
    SessionExpire,
    SessionExtend,
    ProposalExpire,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::SessionProposal,
        EventKind::SessionRequest,
        EventKind::SessionDelete,
        EventKind::SessionUpdate,
        EventKind::SessionEvent,
        EventKind::SessionPing,
        EventKind::SessionExpire,
        EventKind::SessionExtend,
        EventKind::ProposalExpire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SessionProposal => "session_proposal",
            EventKind::SessionRequest => "session_request",
            EventKind::SessionDelete => "session_delete",
            EventKind::SessionUpdate => "session_update",
            EventKind::SessionEvent => "session_event",
            EventKind::SessionPing => "session_ping",
            EventKind::SessionExpire => "session_expire",
            EventKind::SessionExtend => "session_extend",
            EventKind::ProposalExpire => "proposal_expire",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound event from the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    SessionProposal(ProposalParams),
    SessionRequest(SessionRequestEvent),
    SessionDelete { topic: String },
    SessionUpdate { topic: String, namespaces: Namespaces },
    SessionEvent { topic: String, name: String, data: Value },
    SessionPing { topic: String },
    SessionExpire { topic: String },
    SessionExtend { topic: String },
    ProposalExpire { id: u64 },
}

impl RelayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RelayEvent::SessionProposal(_) => EventKind::SessionProposal,
            RelayEvent::SessionRequest(_) => EventKind::SessionRequest,
            RelayEvent::SessionDelete { .. } => EventKind::SessionDelete,
            RelayEvent::SessionUpdate { .. } => EventKind::SessionUpdate,
            RelayEvent::SessionEvent { .. } => EventKind::SessionEvent,
            RelayEvent::SessionPing { .. } => EventKind::SessionPing,
            RelayEvent::SessionExpire { .. } => EventKind::SessionExpire,
            RelayEvent::SessionExtend { .. } => EventKind::SessionExtend,
            RelayEvent::ProposalExpire { .. } => EventKind::ProposalExpire,
        }
    }
}

/// The outcome of sending a proposal approval. The session only exists once `acknowledged` resolves successfully.
pub struct ProposalApproval {
    pub topic: String,
    pub acknowledged: BoxFuture<'static, Result<(), RelayError>>,
}

pub trait RelayConnector: Send + Sync + 'static {
    type Client: RelayClient;

    fn initialize(&self, config: &RelayConfig) -> impl Future<Output = Result<Self::Client, ConnectionError>> + Send;
}

pub trait RelayClient: Clone + Send + Sync + 'static {
    /// Performs a fresh pairing handshake. A `session_proposal` is expected to follow through the event stream.
    fn pair(&self, uri: &PairingUri) -> impl Future<Output = Result<(), PairingError>> + Send;

    fn list_pairings(&self) -> impl Future<Output = Result<Vec<Pairing>, RelayError>> + Send;

    fn activate_pairing(&self, topic: &str) -> impl Future<Output = Result<(), PairingError>> + Send;

    /// Searches the client's request history for an unanswered `wc_sessionPropose` on the pairing `topic`.
    fn find_pending_proposal(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Option<ProposalParams>, RelayError>> + Send;

    fn approve_proposal(
        &self,
        id: u64,
        relay_protocol: &str,
        namespaces: Namespaces,
    ) -> impl Future<Output = Result<ProposalApproval, RelayError>> + Send;

    fn reject_proposal(&self, id: u64, reason: ErrorReason) -> impl Future<Output = Result<(), RelayError>> + Send;

    fn respond(&self, topic: &str, response: RpcResponse) -> impl Future<Output = Result<(), RelayError>> + Send;

    fn disconnect(&self, topic: &str, reason: ErrorReason) -> impl Future<Output = Result<(), RelayError>> + Send;

    fn active_sessions(&self) -> impl Future<Output = Result<Vec<ActiveSession>, RelayError>> + Send;

    fn pending_requests(&self) -> impl Future<Output = Result<Vec<SessionRequestEvent>, RelayError>> + Send;

    /// Opens a stream of events of the given kinds. The subscription ends when the receiver is dropped.
    fn subscribe(&self, kinds: &[EventKind]) -> UnboundedReceiver<RelayEvent>;
}
