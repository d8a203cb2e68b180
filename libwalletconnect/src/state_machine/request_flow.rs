use crate::intent::SigningIntent;
use crate::request::{RequestKey, SessionRequestEvent};
use crate::state_machine::error::FlowError;
use crate::transaction::UnsignedTransaction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

const FLOW: &str = "request";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStage {
    Idle,
    Preparing,
    Pending,
    Responding,
}

impl Display for RequestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStage::Idle => write!(f, "Idle"),
            RequestStage::Preparing => write!(f, "Preparing"),
            RequestStage::Pending => write!(f, "RequestPending"),
            RequestStage::Responding => write!(f, "Responding"),
        }
    }
}

/// A signing request waiting for the user, together with everything that was derived from it on receipt.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRequest {
    pub event: SessionRequestEvent,
    pub intent: SigningIntent,
    pub unsigned_tx: UnsignedTransaction,
}

impl PendingRequest {
    pub fn key(&self) -> RequestKey {
        self.event.key()
    }
}

/// The request sub-machine: `Idle -> Preparing -> Pending -> Responding -> Idle`.
///
/// `Preparing` covers the time between admitting a signing request and surfacing it (signer lookup and transaction
/// building). A request leaves the machine through [`RequestFlow::finish`] once its one response has been sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestFlow {
    #[default]
    Idle,
    Preparing(RequestKey),
    Pending(Box<PendingRequest>),
    Responding(RequestKey),
}

impl RequestFlow {
    pub fn stage(&self) -> RequestStage {
        match self {
            RequestFlow::Idle => RequestStage::Idle,
            RequestFlow::Preparing(_) => RequestStage::Preparing,
            RequestFlow::Pending(_) => RequestStage::Pending,
            RequestFlow::Responding(_) => RequestStage::Responding,
        }
    }

    pub fn key(&self) -> Option<RequestKey> {
        match self {
            RequestFlow::Idle => None,
            RequestFlow::Preparing(key) | RequestFlow::Responding(key) => Some(key.clone()),
            RequestFlow::Pending(request) => Some(request.key()),
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        match self {
            RequestFlow::Pending(request) => Some(request),
            _ => None,
        }
    }

    /// Moves a prepared request into `Pending`, where it waits for the user.
    pub fn surface(&mut self, request: PendingRequest) -> Result<(), FlowError> {
        match self {
            RequestFlow::Preparing(key) if *key != request.key() => {
                Err(FlowError::UnknownRequest(request.key().to_string()))
            }
            RequestFlow::Preparing(_) => {
                *self = RequestFlow::Pending(Box::new(request));
                Ok(())
            }
            other => Err(FlowError::invalid(FLOW, "surface", other.stage())),
        }
    }

    /// Takes the pending request out so that it can be answered. The flow stays in `Responding` until
    /// [`RequestFlow::finish`] is called.
    pub fn take_for_response(&mut self) -> Result<PendingRequest, FlowError> {
        match std::mem::take(self) {
            RequestFlow::Pending(request) => {
                *self = RequestFlow::Responding(request.key());
                Ok(*request)
            }
            RequestFlow::Idle => Err(FlowError::NothingPending(FLOW)),
            other => {
                let err = FlowError::invalid(FLOW, "respond", other.stage());
                *self = other;
                Err(err)
            }
        }
    }

    /// Returns to `Idle` if `key` is the request being prepared or answered.
    pub fn finish(&mut self, key: &RequestKey) -> Result<(), FlowError> {
        let in_flight = matches!(&*self, RequestFlow::Preparing(k) | RequestFlow::Responding(k) if k == key);
        if !in_flight {
            return Err(FlowError::UnknownRequest(key.to_string()));
        }
        *self = RequestFlow::Idle;
        Ok(())
    }

    /// Drops the request for `topic` if it is still being prepared or waiting for the user, since it can no longer be
    /// answered. Returns the dropped state, or `Idle` if there was nothing to drop.
    ///
    /// A request that is already being answered is left alone. Its response is on the way.
    pub fn discard_topic(&mut self, topic: &str) -> RequestFlow {
        let on_topic = match &*self {
            RequestFlow::Preparing(key) => key.topic == topic,
            RequestFlow::Pending(request) => request.event.topic == topic,
            RequestFlow::Idle | RequestFlow::Responding(_) => false,
        };
        if on_topic {
            std::mem::take(self)
        } else {
            RequestFlow::Idle
        }
    }
}

/// What happened to a signing request offered to the [`RequestQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The request is now being prepared and should be processed immediately.
    Dispatch,
    /// Another request is in flight. This one was queued behind it.
    Deferred,
    /// The same topic and id is already in flight or queued.
    Duplicate,
}

/// Everything [`RequestQueue::discard_topic`] removed for a topic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiscardedRequests {
    /// The request that was waiting for the user.
    pub pending: Option<PendingRequest>,
    /// A request that was still being prepared. It will not be surfaced once its preparation completes.
    pub preparing: Option<RequestKey>,
    pub queued: Vec<SessionRequestEvent>,
}

/// The request flow plus the signing requests that arrived while it was busy, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RequestQueue {
    pub flow: RequestFlow,
    deferred: VecDeque<SessionRequestEvent>,
}

impl RequestQueue {
    pub fn is_known(&self, key: &RequestKey) -> bool {
        self.flow.key().as_ref() == Some(key) || self.deferred.iter().any(|e| e.key() == *key)
    }

    pub fn admit(&mut self, event: &SessionRequestEvent) -> Admission {
        let key = event.key();
        if self.is_known(&key) {
            return Admission::Duplicate;
        }
        match self.flow {
            RequestFlow::Idle => {
                self.flow = RequestFlow::Preparing(key);
                Admission::Dispatch
            }
            _ => {
                self.deferred.push_back(event.clone());
                Admission::Deferred
            }
        }
    }

    /// When the flow is idle, takes the oldest queued request and marks it as being prepared.
    pub fn next_deferred(&mut self) -> Option<SessionRequestEvent> {
        if self.flow != RequestFlow::Idle {
            return None;
        }
        let event = self.deferred.pop_front()?;
        self.flow = RequestFlow::Preparing(event.key());
        Some(event)
    }

    /// Removes everything belonging to `topic`: the request in flight (unless it is already being answered) and
    /// queued requests.
    pub fn discard_topic(&mut self, topic: &str) -> DiscardedRequests {
        let mut discarded = DiscardedRequests::default();
        match self.flow.discard_topic(topic) {
            RequestFlow::Pending(request) => discarded.pending = Some(*request),
            RequestFlow::Preparing(key) => discarded.preparing = Some(key),
            _ => {}
        }
        let (dropped, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.deferred).into_iter().partition(|e| e.topic == topic);
        self.deferred = kept.into();
        discarded.queued = dropped;
        discarded
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::Address;
    use crate::amount::{AssetAmount, AttoAmount};
    use crate::intent::ExecuteScriptIntent;
    use serde_json::json;

    fn event(topic: &str, id: u64) -> SessionRequestEvent {
        SessionRequestEvent::new(topic, id, "alph_signAndSubmitExecuteScriptTx", json!({}))
    }

    fn pending(event: SessionRequestEvent) -> PendingRequest {
        let intent = SigningIntent::ExecuteScript(ExecuteScriptIntent {
            from_address: Address::new("a", "pk", 0),
            bytecode: "00".into(),
            asset_amounts: vec![AssetAmount::native(AttoAmount::from(1))],
            gas_amount: None,
            gas_price: None,
        });
        let unsigned_tx =
            UnsignedTransaction { tx_id: "tx".into(), unsigned_tx: "utx".into(), gas_amount: None, gas_price: None };
        PendingRequest { event, intent, unsigned_tx }
    }

    #[test]
    fn full_cycle() {
        let mut queue = RequestQueue::default();
        let e = event("t", 1);
        assert_eq!(queue.admit(&e), Admission::Dispatch);
        assert_eq!(queue.flow.stage(), RequestStage::Preparing);
        queue.flow.surface(pending(e.clone())).unwrap();
        assert_eq!(queue.flow.pending().map(|p| p.event.id), Some(1));
        let taken = queue.flow.take_for_response().unwrap();
        assert_eq!(queue.flow.stage(), RequestStage::Responding);
        // Taking twice is not possible, so there is only ever one response
        assert!(matches!(queue.flow.take_for_response(), Err(FlowError::InvalidTransition { .. })));
        queue.flow.finish(&taken.key()).unwrap();
        assert_eq!(queue.flow, RequestFlow::Idle);
    }

    #[test]
    fn duplicates_and_deferral() {
        let mut queue = RequestQueue::default();
        assert_eq!(queue.admit(&event("t", 1)), Admission::Dispatch);
        assert_eq!(queue.admit(&event("t", 1)), Admission::Duplicate);
        assert_eq!(queue.admit(&event("t", 2)), Admission::Deferred);
        assert_eq!(queue.admit(&event("u", 1)), Admission::Deferred);
        assert_eq!(queue.admit(&event("t", 2)), Admission::Duplicate);
        assert_eq!(queue.deferred_len(), 2);
        // Nothing is released while the first request is in flight
        assert!(queue.next_deferred().is_none());
        queue.flow.finish(&event("t", 1).key()).unwrap();
        let next = queue.next_deferred().unwrap();
        assert_eq!(next.key(), event("t", 2).key());
        assert_eq!(queue.flow.stage(), RequestStage::Preparing);
    }

    #[test]
    fn finish_checks_the_key() {
        let mut flow = RequestFlow::Preparing(event("t", 1).key());
        assert!(matches!(flow.finish(&event("t", 2).key()), Err(FlowError::UnknownRequest(_))));
        assert!(flow.finish(&event("t", 1).key()).is_ok());
        assert!(flow.finish(&event("t", 1).key()).is_err());
    }

    #[test]
    fn surface_requires_matching_preparation() {
        let mut flow = RequestFlow::default();
        assert!(flow.surface(pending(event("t", 1))).is_err());
        flow = RequestFlow::Preparing(event("t", 2).key());
        assert!(matches!(flow.surface(pending(event("t", 1))), Err(FlowError::UnknownRequest(_))));
    }

    #[test]
    fn discard_by_topic() {
        let mut queue = RequestQueue::default();
        let first = event("gone", 1);
        queue.admit(&first);
        queue.flow.surface(pending(first)).unwrap();
        queue.admit(&event("gone", 2));
        queue.admit(&event("kept", 3));
        let discarded = queue.discard_topic("gone");
        assert_eq!(discarded.pending.map(|p| p.event.id), Some(1));
        assert!(discarded.preparing.is_none());
        assert_eq!(discarded.queued.len(), 1);
        assert_eq!(queue.flow, RequestFlow::Idle);
        assert_eq!(queue.next_deferred().map(|e| e.topic), Some("kept".to_string()));
    }

    #[test]
    fn discarding_a_request_in_preparation() {
        let mut queue = RequestQueue::default();
        let first = event("gone", 1);
        queue.admit(&first);
        queue.admit(&event("kept", 2));
        let discarded = queue.discard_topic("gone");
        assert_eq!(discarded.preparing, Some(first.key()));
        assert_eq!(queue.flow, RequestFlow::Idle);
        // The next request may start while the discarded one is still being built
        let next = queue.next_deferred().unwrap();
        assert_eq!(next.topic, "kept");
        // Once its build completes, the discarded request can neither be surfaced nor finish someone else's flow
        assert!(matches!(queue.flow.surface(pending(first.clone())), Err(FlowError::UnknownRequest(_))));
        assert!(queue.flow.finish(&first.key()).is_err());
        assert_eq!(queue.flow, RequestFlow::Preparing(next.key()));
    }

    #[test]
    fn requests_being_answered_are_not_discarded() {
        let mut queue = RequestQueue::default();
        let first = event("gone", 1);
        queue.admit(&first);
        queue.flow.surface(pending(first.clone())).unwrap();
        queue.flow.take_for_response().unwrap();
        assert_eq!(queue.discard_topic("gone"), DiscardedRequests::default());
        assert_eq!(queue.flow, RequestFlow::Responding(first.key()));
    }
}
