use crate::address::Address;
use crate::chain::{AddressGroup, ChainRef, PROVIDER_NAMESPACE};
use crate::proposal::{Namespace, Namespaces, SessionProposal};
use thiserror::Error;

/// The reasons a session proposal can be incompatible with the wallet's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncompatibleProposal {
    #[error("unsupported multi-chain proposal ({0} chains requested)")]
    MultiChain(usize),
    #[error("network mismatch: the dApp requires {required}, the wallet is on {current}")]
    NetworkMismatch { required: String, current: String },
    #[error("address-group mismatch: the dApp requires {required}, the address is in group {actual}")]
    AddressGroupMismatch { required: AddressGroup, actual: u8 },
}

impl IncompatibleProposal {
    /// The short, stable reason string for this rejection.
    pub fn reason(&self) -> &'static str {
        match self {
            IncompatibleProposal::MultiChain(_) => "unsupported multi-chain proposal",
            IncompatibleProposal::NetworkMismatch { .. } => "network mismatch",
            IncompatibleProposal::AddressGroupMismatch { .. } => "address-group mismatch",
        }
    }
}

/// Everything needed to build the approval namespace for a proposal that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleProposal {
    pub methods: Vec<String>,
    pub events: Vec<String>,
    /// The formatted chain identifier, e.g. `alephium:mainnet/2`.
    pub chain: String,
    pub public_key: String,
}

impl CompatibleProposal {
    pub fn account(&self) -> String {
        format!("{}:{}/default", self.chain, self.public_key)
    }

    pub fn namespaces(&self) -> Namespaces {
        let namespace =
            Namespace { methods: self.methods.clone(), events: self.events.clone(), accounts: vec![self.account()] };
        Namespaces::from([(PROVIDER_NAMESPACE.to_string(), namespace)])
    }
}

/// Decides whether `proposal` can be approved with `candidate` while the wallet is on `current_network`.
///
/// The rules run in order and the first one that fails decides the outcome:
/// 1. exactly one chain must be required,
/// 2. its network must be the wallet's current network,
/// 3. its address group must be the candidate's group, unless any group is acceptable.
pub fn validate(
    proposal: &SessionProposal,
    current_network: &str,
    candidate: &Address,
) -> Result<CompatibleProposal, IncompatibleProposal> {
    let chain: &ChainRef = match proposal.required_chains.as_slice() {
        [chain] => chain,
        chains => return Err(IncompatibleProposal::MultiChain(chains.len())),
    };
    if chain.network_id != current_network {
        return Err(IncompatibleProposal::NetworkMismatch {
            required: chain.network_id.clone(),
            current: current_network.to_string(),
        });
    }
    if !chain.address_group.accepts(candidate.group) {
        return Err(IncompatibleProposal::AddressGroupMismatch {
            required: chain.address_group,
            actual: candidate.group,
        });
    }
    Ok(CompatibleProposal {
        methods: proposal.required_methods.clone(),
        events: proposal.required_events.clone(),
        chain: chain.format(),
        public_key: candidate.public_key.clone(),
    })
}
