//! Coordinator scenarios, run against the in-memory relay and the dummy wallet.
mod lifecycle;
mod pairing;

use crate::config::RelayConfig;
use crate::coordinator::SessionCoordinator;
use crate::delegates::dummy_delegate::DummyDelegate;
use crate::mock_relay::MockRelay;
use libwalletconnect::proposal::{ProposeNamespace, Proposer, Relay};
use libwalletconnect::{Address, PeerMetadata, ProposalParams, SessionRequestEvent};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub type TestCoordinator = SessionCoordinator<MockRelay, DummyDelegate>;

pub const SESSION_TOPIC: &str = "session-topic";

pub fn config() -> RelayConfig {
    RelayConfig { project_id: Some("test-project".to_string()), ..RelayConfig::default() }
}

pub fn alice() -> Address {
    Address::new("1AliceHash", "02a11ce", 2).with_label("Alice")
}

pub fn bob() -> Address {
    Address::new("1BobHash", "03b0b", 0)
}

pub fn setup() -> (TestCoordinator, MockRelay, DummyDelegate) {
    env_logger::try_init().ok();
    let relay = MockRelay::new();
    let delegate = DummyDelegate::new(vec![alice(), bob()]);
    let coordinator = SessionCoordinator::new(config(), relay.clone(), delegate.clone());
    (coordinator, relay, delegate)
}

pub fn proposal_params(id: u64, pairing_topic: &str, chains: &[&str]) -> ProposalParams {
    let namespace = ProposeNamespace {
        chains: chains.iter().map(|c| c.to_string()).collect(),
        methods: vec!["alph_signAndSubmitTransferTx".to_string()],
        events: vec!["accountChanged".to_string()],
    };
    ProposalParams {
        id,
        pairing_topic: pairing_topic.to_string(),
        relays: vec![Relay { protocol: "irn".to_string(), data: None }],
        proposer: Proposer {
            public_key: format!("proposer-{id}"),
            metadata: PeerMetadata {
                name: format!("dApp {id}"),
                description: "A test dApp".to_string(),
                url: "https://dapp.example".to_string(),
                icons: vec![],
            },
        },
        required_namespaces: BTreeMap::from([("alephium".to_string(), namespace)]),
        expiry: None,
    }
}

pub fn transfer_request(id: u64, signer: &str) -> SessionRequestEvent {
    let params = json!({
        "signerAddress": signer,
        "destinations": [{ "address": "1DestinationHash", "attoAlphAmount": "1000000000000000000" }]
    });
    SessionRequestEvent::new(SESSION_TOPIC, id, "alph_signAndSubmitTransferTx", params)
}

pub fn request(id: u64, method: &str, params: Value) -> SessionRequestEvent {
    SessionRequestEvent::new(SESSION_TOPIC, id, method, params)
}

/// Polls `check` until it holds, giving spawned event pumps a chance to run.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
