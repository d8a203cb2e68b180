use crate::delegates::error::DelegateError;
use crate::errors::ApiError;
use libwalletconnect::intent::{DeployContractIntent, ExecuteScriptIntent, TransferIntent};
use libwalletconnect::request::{ApiRequest, RequestKey};
use libwalletconnect::state_machine::PendingRequest;
use libwalletconnect::{Address, SessionProposal, SignResult, UnsignedTransaction};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::future::Future;

//--------------------------------------   Transaction building   ------------------------------------------------------

pub trait TransactionBuilder {
    fn build_transfer(
        &self,
        intent: &TransferIntent,
    ) -> impl Future<Output = Result<UnsignedTransaction, DelegateError>> + Send;

    fn build_deploy_contract(
        &self,
        intent: &DeployContractIntent,
    ) -> impl Future<Output = Result<UnsignedTransaction, DelegateError>> + Send;

    fn build_call_contract(
        &self,
        intent: &ExecuteScriptIntent,
    ) -> impl Future<Output = Result<UnsignedTransaction, DelegateError>> + Send;
}

//--------------------------------------   Signing and submission   ----------------------------------------------------

pub trait TransactionSigner {
    /// Signs the transaction with the key of `address` and submits it. `Ok(None)` means nothing was sent.
    fn sign_and_submit(
        &self,
        tx: &UnsignedTransaction,
        address: &Address,
    ) -> impl Future<Output = Result<Option<SignResult>, DelegateError>> + Send;
}

//--------------------------------------   Node and explorer passthrough   ---------------------------------------------

pub trait ApiPassthrough {
    fn node_request(&self, request: &ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn explorer_request(&self, request: &ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

//--------------------------------------   Address store   -------------------------------------------------------------

pub trait AddressStore {
    /// A snapshot of the addresses the wallet currently holds keys for.
    fn addresses(&self) -> impl Future<Output = Vec<Address>> + Send;
}

//--------------------------------------   Decision surface   ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A short-lived message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.level {
            NotificationLevel::Info => write!(f, "{}", self.message),
            NotificationLevel::Error => write!(f, "Error: {}", self.message),
        }
    }
}

/// Where decisions are put in front of the user.
///
/// The surface only displays things. Decisions come back through the coordinator's `approve_*`, `reject_*` and
/// `dismiss_*` calls.
pub trait DecisionSurface {
    fn on_proposal(&self, proposal: &SessionProposal);

    fn on_request(&self, request: &PendingRequest);

    /// The proposal with this id has left the flow and should no longer be shown.
    fn close_proposal(&self, id: u64);

    /// The request has left the flow and should no longer be shown.
    fn close_request(&self, key: &RequestKey);

    fn notify(&self, notification: Notification);

    /// Shows (`Some`) or clears (`None`) a busy indicator.
    fn set_busy(&self, message: Option<&str>);
}

/// Everything the coordinator needs from the wallet, in one bound.
pub trait WalletDelegate:
    TransactionBuilder + TransactionSigner + ApiPassthrough + AddressStore + DecisionSurface
    + Clone
    + Send
    + Sync
    + 'static
{
}
