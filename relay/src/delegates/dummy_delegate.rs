//----------------------------------------   Dummy Delegate ------------------------------------------------------------

use crate::delegates::error::DelegateError;
use crate::delegates::traits::{
    AddressStore, ApiPassthrough, DecisionSurface, Notification, NotificationLevel, TransactionBuilder,
    TransactionSigner, WalletDelegate,
};
use crate::errors::ApiError;
use libwalletconnect::intent::{DeployContractIntent, ExecuteScriptIntent, IntentKind, TransferIntent};
use libwalletconnect::request::{ApiRequest, RequestKey};
use libwalletconnect::state_machine::PendingRequest;
use libwalletconnect::{Address, SessionProposal, SignResult, UnsignedTransaction};
use log::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// What [`DummyDelegate::sign_and_submit`] does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignBehaviour {
    #[default]
    Sign,
    NothingSent,
    Fail(String),
}

#[derive(Debug, Default)]
pub struct DummyState {
    pub addresses: Vec<Address>,
    pub build_failure: Option<String>,
    /// When set, every build waits for a permit from this semaphore before it starts.
    pub build_gate: Option<Arc<Semaphore>>,
    pub builds_started: usize,
    pub sign_behaviour: SignBehaviour,
    pub api_failure: Option<ApiError>,
    pub built: Vec<IntentKind>,
    pub signed: Vec<(String, String)>,
    pub api_calls: Vec<(String, ApiRequest)>,
    pub proposals: Vec<SessionProposal>,
    pub requests: Vec<PendingRequest>,
    pub closed_proposals: Vec<u64>,
    pub closed_requests: Vec<RequestKey>,
    pub notifications: Vec<Notification>,
    pub busy: Vec<Option<String>>,
}

/// A scriptable wallet that records everything the coordinator asks of it.
#[derive(Debug, Clone, Default)]
pub struct DummyDelegate {
    state: Arc<Mutex<DummyState>>,
}

impl DummyDelegate {
    pub fn new(addresses: Vec<Address>) -> Self {
        let delegate = Self::default();
        delegate.state().addresses = addresses;
        delegate
    }

    /// Access to the recorded calls and the script.
    pub fn state(&self) -> MutexGuard<'_, DummyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_addresses(&self, addresses: Vec<Address>) {
        self.state().addresses = addresses;
    }

    pub fn fail_builds(&self, reason: Option<&str>) {
        self.state().build_failure = reason.map(str::to_string);
    }

    /// Holds every build until `gate` hands out a permit for it. `None` lets builds run straight through.
    pub fn gate_builds(&self, gate: Option<Arc<Semaphore>>) {
        self.state().build_gate = gate;
    }

    pub fn set_sign_behaviour(&self, behaviour: SignBehaviour) {
        self.state().sign_behaviour = behaviour;
    }

    pub fn fail_api_calls(&self, error: Option<ApiError>) {
        self.state().api_failure = error;
    }

    pub fn surfaced_proposals(&self) -> Vec<SessionProposal> {
        self.state().proposals.clone()
    }

    pub fn surfaced_requests(&self) -> Vec<PendingRequest> {
        self.state().requests.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.state()
            .notifications
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }

    /// True if every busy indicator that was shown has been cleared again.
    pub fn is_idle(&self) -> bool {
        self.state().busy.last().map(|b| b.is_none()).unwrap_or(true)
    }

    async fn wait_for_gate(&self) {
        let gate = {
            let mut state = self.state();
            state.builds_started += 1;
            state.build_gate.clone()
        };
        if let Some(gate) = gate {
            debug!("DummyDelegate: Build is waiting for the gate");
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }

    fn build(&self, kind: IntentKind, from: &Address, gas_amount: Option<u64>, gas_price: Option<&str>) -> BuildResult {
        let mut state = self.state();
        if let Some(reason) = &state.build_failure {
            return Err(DelegateError(reason.clone()));
        }
        state.built.push(kind);
        let n = state.built.len();
        info!("DummyDelegate: Building {kind} transaction #{n} from {}", from.hash);
        Ok(UnsignedTransaction {
            tx_id: format!("{kind}-tx-{n}"),
            unsigned_tx: format!("unsigned-{kind}-{n}"),
            gas_amount: gas_amount.or(Some(20_000)),
            gas_price: gas_price.map(str::to_string).or_else(|| Some("100000000000".to_string())),
        })
    }
}

type BuildResult = Result<UnsignedTransaction, DelegateError>;

impl TransactionBuilder for DummyDelegate {
    async fn build_transfer(&self, intent: &TransferIntent) -> BuildResult {
        self.wait_for_gate().await;
        self.build(IntentKind::Transfer, &intent.from_address, intent.gas_amount, intent.gas_price.as_deref())
    }

    async fn build_deploy_contract(&self, intent: &DeployContractIntent) -> BuildResult {
        self.wait_for_gate().await;
        self.build(IntentKind::DeployContract, &intent.from_address, intent.gas_amount, intent.gas_price.as_deref())
    }

    async fn build_call_contract(&self, intent: &ExecuteScriptIntent) -> BuildResult {
        self.wait_for_gate().await;
        self.build(IntentKind::ExecuteScript, &intent.from_address, intent.gas_amount, intent.gas_price.as_deref())
    }
}

impl TransactionSigner for DummyDelegate {
    async fn sign_and_submit(
        &self,
        tx: &UnsignedTransaction,
        address: &Address,
    ) -> Result<Option<SignResult>, DelegateError> {
        let mut state = self.state();
        match &state.sign_behaviour {
            SignBehaviour::Sign => {
                info!("DummyDelegate: Signing {} with {}", tx.tx_id, address.hash);
                state.signed.push((tx.tx_id.clone(), address.hash.clone()));
                Ok(Some(SignResult::new(tx, format!("signature-of-{}", tx.tx_id))))
            }
            SignBehaviour::NothingSent => Ok(None),
            SignBehaviour::Fail(reason) => Err(DelegateError(reason.clone())),
        }
    }
}

impl ApiPassthrough for DummyDelegate {
    async fn node_request(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut state = self.state();
        state.api_calls.push(("node".to_string(), request.clone()));
        match &state.api_failure {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "source": "node", "path": request.path, "method": request.method })),
        }
    }

    async fn explorer_request(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut state = self.state();
        state.api_calls.push(("explorer".to_string(), request.clone()));
        match &state.api_failure {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "source": "explorer", "path": request.path, "method": request.method })),
        }
    }
}

impl AddressStore for DummyDelegate {
    async fn addresses(&self) -> Vec<Address> {
        self.state().addresses.clone()
    }
}

impl DecisionSurface for DummyDelegate {
    fn on_proposal(&self, proposal: &SessionProposal) {
        info!("DummyDelegate: Showing proposal {} from {}", proposal.id, proposal.proposer.name);
        self.state().proposals.push(proposal.clone());
    }

    fn on_request(&self, request: &PendingRequest) {
        info!("DummyDelegate: Showing {} request {}", request.intent.kind(), request.key());
        self.state().requests.push(request.clone());
    }

    fn close_proposal(&self, id: u64) {
        self.state().closed_proposals.push(id);
    }

    fn close_request(&self, key: &RequestKey) {
        self.state().closed_requests.push(key.clone());
    }

    fn notify(&self, notification: Notification) {
        info!("DummyDelegate: {notification}");
        self.state().notifications.push(notification);
    }

    fn set_busy(&self, message: Option<&str>) {
        self.state().busy.push(message.map(str::to_string));
    }
}

impl WalletDelegate for DummyDelegate {}
