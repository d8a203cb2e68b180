use super::*;
use crate::errors::{CoordinatorError, PairingError};
use crate::mock_relay::RelayCall;
use libwalletconnect::pairing::PairingUriError;
use libwalletconnect::{ActiveSession, ErrorReason, Namespaces, Pairing};

const TOPIC: &str = "7f6e504bfad60b485450578e05678ed3";
const URI: &str = "wc:7f6e504bfad60b485450578e05678ed3@2?relay-protocol=irn&symKey=587d5484ce2a2a6ee3ba1962fdd7e858";

fn count(relay: &MockRelay, matcher: impl Fn(&RelayCall) -> bool) -> usize {
    relay.calls().iter().filter(|c| matcher(c)).count()
}

fn session(topic: &str) -> ActiveSession {
    ActiveSession {
        topic: topic.to_string(),
        peer: PeerMetadata::default(),
        namespaces: Namespaces::new(),
        expiry: None,
    }
}

#[tokio::test]
async fn fresh_pairing_delivers_the_proposal_through_events() {
    let (coordinator, relay, delegate) = setup();
    relay.propose_on_pair(proposal_params(1, TOPIC, &["alephium:mainnet/2"]));

    coordinator.pair(URI).await.expect("pairing to succeed");
    assert_eq!(relay.calls()[0], RelayCall::Initialize);
    assert_eq!(count(&relay, |c| matches!(c, RelayCall::Pair { topic } if topic == TOPIC)), 1);
    assert!(eventually(|| delegate.surfaced_proposals().len() == 1).await);
    assert_eq!(delegate.surfaced_proposals()[0].pairing_topic, TOPIC);
    assert!(delegate.is_idle());
    assert!(delegate.state().busy.contains(&Some("Connecting to the dApp".to_string())));
}

#[tokio::test]
async fn inactive_pairing_is_reactivated_and_its_proposal_recovered() {
    let (coordinator, relay, delegate) = setup();
    relay.add_pairing(Pairing::new(TOPIC, false));
    relay.add_proposal_history(proposal_params(2, TOPIC, &["alephium:mainnet/2"]));
    relay.add_proposal_history(proposal_params(3, "another-pairing", &["alephium:mainnet/2"]));

    coordinator.pair(URI).await.expect("pairing to succeed");
    assert_eq!(count(&relay, |c| matches!(c, RelayCall::ActivatePairing { topic } if topic == TOPIC)), 1);
    assert_eq!(count(&relay, |c| matches!(c, RelayCall::Pair { .. })), 0);
    assert!(relay.pairings().iter().all(|p| p.active));

    // Exactly one proposal, and only the one recorded for this pairing
    let proposals = delegate.surfaced_proposals();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].id, 2);
    assert_eq!(coordinator.pending_proposal().await.map(|p| p.id), Some(2));

    // The recovered proposal can be approved like any other
    assert_eq!(coordinator.approve_proposal(&alice()).await.unwrap(), "session-2");
    let sessions = coordinator.active_sessions().await;
    assert_eq!(sessions[0].peer.name, "dApp 2");
}

#[tokio::test]
async fn active_pairing_without_history_does_nothing_more() {
    let (coordinator, relay, delegate) = setup();
    relay.add_pairing(Pairing::new(TOPIC, true));

    coordinator.pair(URI).await.expect("pairing to succeed");
    assert_eq!(count(&relay, |c| matches!(c, RelayCall::ActivatePairing { .. } | RelayCall::Pair { .. })), 0);
    assert!(delegate.surfaced_proposals().is_empty());
    assert!(delegate.errors().is_empty());
}

#[tokio::test]
async fn malformed_uri_is_refused_before_connecting() {
    let (coordinator, relay, delegate) = setup();
    let err = coordinator.pair("https://example.com").await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Pairing(PairingError::InvalidUri(PairingUriError::MissingScheme))));
    let err = coordinator.pair("wc:abc@1?symKey=00").await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Pairing(PairingError::InvalidUri(PairingUriError::UnsupportedVersion(_)))));
    assert!(relay.calls().is_empty());
    assert_eq!(delegate.errors().len(), 2);
}

#[tokio::test]
async fn failed_handshake_is_reported() {
    let (coordinator, relay, delegate) = setup();
    relay.fail_pairing(true);
    let err = coordinator.pair(URI).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Pairing(PairingError::HandshakeFailed(_))));
    assert_eq!(delegate.errors().len(), 1);
    assert!(delegate.is_idle());
}

#[tokio::test]
async fn unpair_disconnects_and_refreshes_sessions() {
    let (coordinator, relay, _delegate) = setup();
    relay.add_session(session("session-a"));
    relay.add_session(session("session-b"));
    coordinator.refresh_sessions().await.unwrap();
    assert_eq!(coordinator.active_sessions().await.len(), 2);

    coordinator.unpair("session-a").await.unwrap();
    let disconnect =
        RelayCall::Disconnect { topic: "session-a".to_string(), reason: ErrorReason::user_disconnected() };
    assert!(relay.calls().contains(&disconnect));
    let topics = coordinator.active_sessions().await.into_iter().map(|s| s.topic).collect::<Vec<_>>();
    assert_eq!(topics, vec!["session-b".to_string()]);
}

#[tokio::test]
async fn failed_unpair_still_refreshes_sessions() {
    let (coordinator, relay, delegate) = setup();
    coordinator.refresh_sessions().await.unwrap();
    relay.add_session(session("session-c"));
    relay.fail_disconnects(true);

    assert!(matches!(coordinator.unpair("session-c").await, Err(CoordinatorError::Relay(_))));
    assert_eq!(coordinator.active_sessions().await.len(), 1);
    assert_eq!(delegate.errors().len(), 1);
}
