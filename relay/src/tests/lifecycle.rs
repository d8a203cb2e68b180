use super::*;
use crate::adapter::RelayEvent;
use crate::errors::{ConnectionError, CoordinatorError};
use crate::mock_relay::RelayCall;
use libwalletconnect::state_machine::{ClientStage, RequestStage};
use libwalletconnect::{ActiveSession, Namespaces};
use std::sync::Arc;
use tokio::sync::Semaphore;

const URI: &str = "wc:lifecycle-topic@2?relay-protocol=irn&symKey=00";

#[tokio::test]
async fn client_is_created_lazily_and_once() {
    let (coordinator, relay, _delegate) = setup();
    assert_eq!(coordinator.client_stage().await, ClientStage::Uninitialized);
    assert_eq!(relay.initializations(), 0);

    coordinator.refresh_sessions().await.unwrap();
    coordinator.refresh_sessions().await.unwrap();
    assert_eq!(coordinator.client_stage().await, ClientStage::Ready);
    assert_eq!(relay.initializations(), 1);
    assert!(coordinator.has_subscription().await);
    assert_eq!(relay.live_subscribers(), 1);
}

#[tokio::test]
async fn new_client_loads_existing_sessions() {
    let (coordinator, relay, _delegate) = setup();
    relay.add_session(ActiveSession {
        topic: "restored".to_string(),
        peer: PeerMetadata::default(),
        namespaces: Namespaces::new(),
        expiry: Some(1_900_000_000),
    });
    coordinator.ensure_client().await.unwrap();
    assert_eq!(coordinator.active_sessions().await[0].topic, "restored");
}

#[tokio::test]
async fn failed_initialization_is_retried_on_the_next_pairing() {
    let (coordinator, relay, delegate) = setup();
    relay.fail_initializations(1);

    let err = coordinator.pair(URI).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Connection(ConnectionError::ConnectFailed { .. })));
    assert_eq!(coordinator.client_stage().await, ClientStage::Uninitialized);
    assert_eq!(delegate.errors().len(), 1);
    // Nothing retries in the background
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(relay.calls(), vec![RelayCall::Initialize]);

    coordinator.pair(URI).await.expect("second attempt to succeed");
    assert_eq!(coordinator.client_stage().await, ClientStage::Ready);
    assert_eq!(relay.initializations(), 1);
    assert_eq!(relay.calls().iter().filter(|c| **c == RelayCall::Initialize).count(), 2);
}

#[tokio::test]
async fn missing_project_id_never_reaches_the_relay() {
    env_logger::try_init().ok();
    let relay = MockRelay::new();
    let delegate = DummyDelegate::new(vec![alice()]);
    let coordinator = SessionCoordinator::new(RelayConfig::default(), relay.clone(), delegate);

    let err = coordinator.ensure_client().await.unwrap_err();
    assert!(matches!(err, ConnectionError::MissingProjectId));
    assert!(relay.calls().is_empty());
    assert_eq!(coordinator.client_stage().await, ClientStage::Uninitialized);
}

#[tokio::test]
async fn reconnecting_replaces_the_subscription() {
    let (coordinator, relay, delegate) = setup();
    coordinator.ensure_client().await.unwrap();
    coordinator.reconnect().await.unwrap();
    coordinator.reconnect().await.unwrap();
    assert_eq!(relay.initializations(), 3);
    assert!(eventually(|| relay.live_subscribers() == 1).await);

    let delivered = relay.emit(RelayEvent::SessionProposal(proposal_params(1, "pairing", &["alephium:mainnet/2"])));
    assert_eq!(delivered, 1);
    assert!(eventually(|| delegate.surfaced_proposals().len() == 1).await);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(delegate.surfaced_proposals().len(), 1);
}

#[tokio::test]
async fn events_are_pumped_into_the_flows() {
    let (coordinator, relay, delegate) = setup();
    coordinator.ensure_client().await.unwrap();

    relay.emit(RelayEvent::SessionRequest(transfer_request(1, "1AliceHash")));
    assert!(eventually(|| delegate.surfaced_requests().len() == 1).await);
    assert_eq!(coordinator.request_stage().await, RequestStage::Pending);

    relay.emit(RelayEvent::SessionDelete { topic: SESSION_TOPIC.to_string() });
    assert!(eventually(|| !delegate.state().closed_requests.is_empty()).await);
    assert_eq!(coordinator.request_stage().await, RequestStage::Idle);
    assert!(relay.responses().is_empty());
}

#[tokio::test]
async fn session_update_refreshes_the_session_list() {
    let (coordinator, relay, _delegate) = setup();
    coordinator.ensure_client().await.unwrap();
    assert!(coordinator.active_sessions().await.is_empty());

    relay.add_session(ActiveSession {
        topic: "updated".to_string(),
        peer: PeerMetadata::default(),
        namespaces: Namespaces::new(),
        expiry: None,
    });
    let update = RelayEvent::SessionUpdate { topic: "updated".to_string(), namespaces: Namespaces::new() };
    coordinator.handle_event(update).await;
    assert_eq!(coordinator.active_sessions().await.len(), 1);

    // Pings and custom events leave everything as it is
    coordinator.handle_event(RelayEvent::SessionPing { topic: "updated".to_string() }).await;
    let event =
        RelayEvent::SessionEvent { topic: "updated".to_string(), name: "accountChanged".into(), data: json!({}) };
    coordinator.handle_event(event).await;
    assert_eq!(coordinator.active_sessions().await.len(), 1);
    assert!(relay.responses().is_empty());
}

#[tokio::test]
async fn shutdown_releases_the_client() {
    let (coordinator, relay, _delegate) = setup();
    coordinator.ensure_client().await.unwrap();
    coordinator.shutdown().await;
    assert_eq!(coordinator.client_stage().await, ClientStage::Uninitialized);
    assert!(!coordinator.has_subscription().await);
    assert!(eventually(|| relay.live_subscribers() == 0).await);
    assert!(coordinator.active_sessions().await.is_empty());
}

#[tokio::test]
async fn dropping_the_coordinator_stops_the_event_pump() {
    let (coordinator, relay, _delegate) = setup();
    coordinator.ensure_client().await.unwrap();
    assert_eq!(relay.live_subscribers(), 1);
    drop(coordinator);
    assert!(eventually(|| relay.live_subscribers() == 0).await);
}

#[tokio::test]
async fn reconnecting_does_not_strand_a_request_being_prepared() {
    let (coordinator, relay, delegate) = setup();
    let gate = Arc::new(Semaphore::new(0));
    delegate.gate_builds(Some(gate.clone()));
    coordinator.ensure_client().await.unwrap();

    relay.emit(RelayEvent::SessionRequest(transfer_request(60, "1AliceHash")));
    assert!(eventually(|| delegate.state().builds_started == 1).await);
    coordinator.reconnect().await.unwrap();
    assert!(eventually(|| relay.live_subscribers() == 1).await);
    gate.add_permits(1);

    // The build completes after the reconnect and the request reaches the user
    assert!(eventually(|| delegate.surfaced_requests().len() == 1).await);
    assert_eq!(coordinator.request_stage().await, RequestStage::Pending);
    assert!(relay.responses_for(SESSION_TOPIC, 60).is_empty());

    // Later requests queue behind it instead of getting stuck
    delegate.gate_builds(None);
    relay.emit(RelayEvent::SessionRequest(transfer_request(61, "1BobHash")));
    coordinator.reject_request().await.unwrap();
    assert!(eventually(|| delegate.surfaced_requests().len() == 2).await);
    assert_eq!(coordinator.pending_request().await.map(|r| r.event.id), Some(61));
    assert_eq!(relay.responses_for(SESSION_TOPIC, 60).len(), 1);
    assert!(relay.responses_for(SESSION_TOPIC, 61).is_empty());
}

#[tokio::test]
async fn flows_do_not_wait_for_a_slow_build() {
    let (coordinator, relay, delegate) = setup();
    let gate = Arc::new(Semaphore::new(0));
    delegate.gate_builds(Some(gate.clone()));
    coordinator.ensure_client().await.unwrap();

    relay.emit(RelayEvent::SessionRequest(transfer_request(62, "1AliceHash")));
    assert!(eventually(|| delegate.state().builds_started == 1).await);

    relay.emit(RelayEvent::SessionProposal(proposal_params(7, "pairing", &["alephium:mainnet/2"])));
    assert!(eventually(|| delegate.surfaced_proposals().len() == 1).await);
    let params = json!({ "path": "/infos/node", "method": "GET" });
    relay.emit(RelayEvent::SessionRequest(request(63, "alph_requestNodeApi", params)));
    assert!(eventually(|| relay.responses_for(SESSION_TOPIC, 63).len() == 1).await);
    assert_eq!(coordinator.request_stage().await, RequestStage::Preparing);
    assert!(delegate.surfaced_requests().is_empty());

    gate.add_permits(1);
    assert!(eventually(|| delegate.surfaced_requests().len() == 1).await);
    assert_eq!(coordinator.request_stage().await, RequestStage::Pending);
}
