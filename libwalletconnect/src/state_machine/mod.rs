//! Single-flight state machines for the coordinator.
//!
//! The client lifecycle is `Uninitialized -> Initializing -> Ready`. Once ready, the proposal flow and the request
//! flow run independently of each other, and each admits at most one item at a time.
pub mod error;
pub mod proposal_flow;
pub mod request_flow;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub use error::FlowError;
pub use proposal_flow::{ProposalFlow, ProposalStage};
pub use request_flow::{Admission, DiscardedRequests, PendingRequest, RequestFlow, RequestQueue, RequestStage};

/// Lifecycle of the relay client handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStage {
    /// No client has been created yet, or the last attempt failed.
    #[default]
    Uninitialized,
    /// A client is being created.
    Initializing,
    /// A client exists and its event subscriptions are attached.
    Ready,
}

impl Display for ClientStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientStage::Uninitialized => write!(f, "Uninitialized"),
            ClientStage::Initializing => write!(f, "Initializing"),
            ClientStage::Ready => write!(f, "Ready"),
        }
    }
}
