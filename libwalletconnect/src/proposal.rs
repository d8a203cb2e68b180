use crate::chain::{ChainParseError, ChainRef, PROVIDER_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Self-description of a relay peer (a dApp, or the wallet itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposer {
    pub public_key: String,
    pub metadata: PeerMetadata,
}

/// A namespace as requested by a proposer: which chains, methods and events it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeNamespace {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// A namespace as granted by the wallet on approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub methods: Vec<String>,
    pub events: Vec<String>,
    pub accounts: Vec<String>,
}

pub type Namespaces = BTreeMap<String, Namespace>;

/// The raw parameters of a `session_proposal` as the relay delivers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalParams {
    pub id: u64,
    pub pairing_topic: String,
    #[serde(default)]
    pub relays: Vec<Relay>,
    pub proposer: Proposer,
    #[serde(default)]
    pub required_namespaces: BTreeMap<String, ProposeNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// A session proposal, reduced to what the wallet needs to decide on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    pub id: u64,
    pub pairing_topic: String,
    pub relay_protocol: String,
    pub proposer: PeerMetadata,
    pub required_chains: Vec<ChainRef>,
    pub required_methods: Vec<String>,
    pub required_events: Vec<String>,
}

impl SessionProposal {
    pub const DEFAULT_RELAY_PROTOCOL: &'static str = "irn";

    /// Reduces raw proposal parameters to a [`SessionProposal`].
    ///
    /// Only the wallet's own namespace is considered. A proposal that does not mention it at all yields an empty
    /// chain list, which the compatibility rules then reject. Chain ids that cannot be parsed fail the conversion.
    pub fn from_params(params: &ProposalParams) -> Result<Self, ChainParseError> {
        let namespace = params.required_namespaces.get(PROVIDER_NAMESPACE).cloned().unwrap_or_default();
        let required_chains = namespace.chains.iter().map(|c| c.parse()).collect::<Result<Vec<ChainRef>, _>>()?;
        let relay_protocol = params
            .relays
            .first()
            .map(|r| r.protocol.clone())
            .unwrap_or_else(|| Self::DEFAULT_RELAY_PROTOCOL.to_string());
        Ok(Self {
            id: params.id,
            pairing_topic: params.pairing_topic.clone(),
            relay_protocol,
            proposer: params.proposer.metadata.clone(),
            required_chains,
            required_methods: namespace.methods,
            required_events: namespace.events,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chain::AddressGroup;

    const PROPOSAL: &str = r#"{
        "id": 1700000000000001,
        "pairingTopic": "7f6e504bfad60b485450578e05678ed3e8e8c4751d3c6160be17160d63ec90f9",
        "relays": [{ "protocol": "irn" }],
        "proposer": {
            "publicKey": "a3ad5e26070ddb2809200c6f56e739333512015bceeadbb8ea1731c4c7ddb207",
            "metadata": { "name": "Swap", "description": "A dex", "url": "https://dex.example", "icons": [] }
        },
        "requiredNamespaces": {
            "alephium": {
                "chains": ["alephium:mainnet/2"],
                "methods": ["alph_signAndSubmitTransferTx"],
                "events": ["accountChanged"]
            }
        }
    }"#;

    #[test]
    fn reduce_proposal_params() {
        let params: ProposalParams = serde_json::from_str(PROPOSAL).unwrap();
        let proposal = SessionProposal::from_params(&params).unwrap();
        assert_eq!(proposal.id, 1700000000000001);
        assert_eq!(proposal.relay_protocol, "irn");
        assert_eq!(proposal.proposer.name, "Swap");
        assert_eq!(proposal.required_chains, vec![ChainRef::new("mainnet", AddressGroup::Group(2))]);
        assert_eq!(proposal.required_methods, vec!["alph_signAndSubmitTransferTx".to_string()]);
        assert_eq!(proposal.required_events, vec!["accountChanged".to_string()]);
    }

    #[test]
    fn foreign_namespace_only_gives_no_chains() {
        let mut params: ProposalParams = serde_json::from_str(PROPOSAL).unwrap();
        let ns = params.required_namespaces.remove("alephium").unwrap();
        params.required_namespaces.insert("eip155".into(), ns);
        params.relays.clear();
        let proposal = SessionProposal::from_params(&params).unwrap();
        assert!(proposal.required_chains.is_empty());
        assert_eq!(proposal.relay_protocol, SessionProposal::DEFAULT_RELAY_PROTOCOL);
    }

    #[test]
    fn bad_chain_fails_the_reduction() {
        let mut params: ProposalParams = serde_json::from_str(PROPOSAL).unwrap();
        params.required_namespaces.get_mut("alephium").unwrap().chains = vec!["alephium:mainnet".into()];
        assert!(SessionProposal::from_params(&params).is_err());
    }
}
