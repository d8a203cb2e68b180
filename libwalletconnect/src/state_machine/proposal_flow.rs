use crate::proposal::SessionProposal;
use crate::state_machine::error::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const FLOW: &str = "proposal";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStage {
    Idle,
    Pending,
    Approving,
    Rejecting,
}

impl Display for ProposalStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStage::Idle => write!(f, "Idle"),
            ProposalStage::Pending => write!(f, "ProposalPending"),
            ProposalStage::Approving => write!(f, "Approving"),
            ProposalStage::Rejecting => write!(f, "Rejecting"),
        }
    }
}

/// The proposal sub-machine: `Idle -> Pending -> {Approving | Rejecting} -> Idle`.
///
/// Only a `Pending` proposal can be acted on by the user. Once approval or rejection has begun, the proposal can only
/// be cleared with [`ProposalFlow::finish`], whatever the outcome of the relay call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProposalFlow {
    #[default]
    Idle,
    Pending(SessionProposal),
    Approving(SessionProposal),
    Rejecting(SessionProposal),
}

impl ProposalFlow {
    pub fn stage(&self) -> ProposalStage {
        match self {
            ProposalFlow::Idle => ProposalStage::Idle,
            ProposalFlow::Pending(_) => ProposalStage::Pending,
            ProposalFlow::Approving(_) => ProposalStage::Approving,
            ProposalFlow::Rejecting(_) => ProposalStage::Rejecting,
        }
    }

    /// The proposal in flight, whatever stage it is in.
    pub fn current(&self) -> Option<&SessionProposal> {
        match self {
            ProposalFlow::Idle => None,
            ProposalFlow::Pending(p) | ProposalFlow::Approving(p) | ProposalFlow::Rejecting(p) => Some(p),
        }
    }

    /// The proposal awaiting a user decision, if any.
    pub fn pending(&self) -> Option<&SessionProposal> {
        match self {
            ProposalFlow::Pending(p) => Some(p),
            _ => None,
        }
    }

    pub fn receive(&mut self, proposal: SessionProposal) -> Result<(), FlowError> {
        match self {
            ProposalFlow::Idle => {
                *self = ProposalFlow::Pending(proposal);
                Ok(())
            }
            other => {
                let current = format!("{} is {}", proposal_id(other), other.stage());
                Err(FlowError::Busy { flow: FLOW, current })
            }
        }
    }

    pub fn begin_approval(&mut self) -> Result<SessionProposal, FlowError> {
        match std::mem::take(self) {
            ProposalFlow::Pending(p) => {
                *self = ProposalFlow::Approving(p.clone());
                Ok(p)
            }
            other => Err(self.restore(other, "approve")),
        }
    }

    pub fn begin_rejection(&mut self) -> Result<SessionProposal, FlowError> {
        match std::mem::take(self) {
            ProposalFlow::Pending(p) => {
                *self = ProposalFlow::Rejecting(p.clone());
                Ok(p)
            }
            other => Err(self.restore(other, "reject")),
        }
    }

    /// Clears the flow, returning whatever proposal was in it.
    pub fn finish(&mut self) -> Option<SessionProposal> {
        match std::mem::take(self) {
            ProposalFlow::Idle => None,
            ProposalFlow::Pending(p) | ProposalFlow::Approving(p) | ProposalFlow::Rejecting(p) => Some(p),
        }
    }

    /// Clears a pending proposal with the given id. Proposals that are already being answered are left alone.
    pub fn expire(&mut self, id: u64) -> Option<SessionProposal> {
        if self.pending().is_some_and(|p| p.id == id) {
            self.finish()
        } else {
            None
        }
    }

    fn restore(&mut self, previous: ProposalFlow, action: &'static str) -> FlowError {
        let err = match &previous {
            ProposalFlow::Idle => FlowError::NothingPending(FLOW),
            other => FlowError::invalid(FLOW, action, other.stage()),
        };
        *self = previous;
        err
    }
}

fn proposal_id(flow: &ProposalFlow) -> String {
    flow.current().map(|p| format!("proposal {}", p.id)).unwrap_or_default()
}
