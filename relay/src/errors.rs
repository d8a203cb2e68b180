use crate::delegates::error::DelegateError;
use libwalletconnect::chain::ChainParseError;
use libwalletconnect::pairing::PairingUriError;
use libwalletconnect::state_machine::FlowError;
use libwalletconnect::{ErrorReason, IncompatibleProposal};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    #[error("No relay project id has been configured.")]
    MissingProjectId,
    #[error("Could not connect to the relay at {url}. {reason}")]
    ConnectFailed { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum PairingError {
    #[error("Invalid pairing URI. {0}")]
    InvalidUri(#[from] PairingUriError),
    #[error("The pairing handshake failed. {0}")]
    HandshakeFailed(String),
    #[error("Pairing {0} could not be activated.")]
    ActivationFailed(String),
    #[error("Relay error during pairing. {0}")]
    Relay(#[from] RelayError),
}

#[derive(Error, Debug, Clone)]
pub enum RelayError {
    #[error("The relay call failed. {0}")]
    CallFailed(String),
    #[error("The peer did not acknowledge the session. {0}")]
    NotAcknowledged(String),
}

impl RelayError {
    pub fn failed(msg: impl Into<String>) -> Self {
        RelayError::CallFailed(msg.into())
    }
}

/// A failed node or explorer passthrough call. The reason is relayed to the dApp as-is.
#[derive(Error, Debug, Clone)]
#[error("API request failed. {reason}")]
pub struct ApiError {
    pub reason: ErrorReason,
}

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { reason: ErrorReason::new(code, message) }
    }
}

impl From<ApiError> for ErrorReason {
    fn from(error: ApiError) -> Self {
        error.reason
    }
}

/// Errors returned to the caller of a coordinator action. Whatever the error, the coordinator has already sent any
/// protocol response that was due.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Relay connection error. {0}")]
    Connection(#[from] ConnectionError),
    #[error("Pairing error. {0}")]
    Pairing(#[from] PairingError),
    #[error("Relay error. {0}")]
    Relay(#[from] RelayError),
    #[error("{0}")]
    Flow(#[from] FlowError),
    #[error("The proposal is not compatible with this wallet: {0}")]
    Incompatible(#[from] IncompatibleProposal),
    #[error("The proposal lists chains this wallet does not understand. {0}")]
    UnsupportedChains(#[from] ChainParseError),
    #[error("Signer address {0} is no longer held by this wallet.")]
    SignerMissing(String),
    #[error("The transaction could not be built. {0}")]
    BuildFailed(String),
    #[error("The transaction was not sent. {0}")]
    SendFailed(String),
    #[error("An error occurred while delegating work. {0}")]
    Delegate(#[from] DelegateError),
    #[error("Could not encode the response. {0}")]
    Encoding(#[from] serde_json::Error),
}

impl CoordinatorError {
    /// The reason sent to the dApp when this error ends a signing request.
    pub fn protocol_reason(&self) -> ErrorReason {
        match self {
            CoordinatorError::SignerMissing(_) => ErrorReason::signer_address_not_found(),
            CoordinatorError::BuildFailed(msg) => {
                ErrorReason::send_failed().with_message(format!("Could not build transaction: {msg}"))
            }
            _ => ErrorReason::send_failed(),
        }
    }
}
