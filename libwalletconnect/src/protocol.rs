use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// The error payload carried by protocol-level rejections and error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReason {
    pub code: i64,
    pub message: String,
}

impl ErrorReason {
    pub const USER_REJECTED: i64 = 5000;
    pub const UNSUPPORTED_CHAINS: i64 = 5100;
    pub const USER_DISCONNECTED: i64 = 6000;
    pub const UNSUPPORTED_METHOD: i64 = 10001;
    pub const TRANSACTION_SEND_FAILED: i64 = -32000;
    pub const SIGNER_ADDRESS_DOESNT_EXIST: i64 = -37000;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected.")
    }

    pub fn user_disconnected() -> Self {
        Self::new(Self::USER_DISCONNECTED, "User disconnected.")
    }

    pub fn unsupported_method() -> Self {
        Self::new(Self::UNSUPPORTED_METHOD, "Unsupported wc_ method.")
    }

    pub fn unsupported_chains() -> Self {
        Self::new(Self::UNSUPPORTED_CHAINS, "Unsupported chains.")
    }

    pub fn signer_address_not_found() -> Self {
        Self::new(Self::SIGNER_ADDRESS_DOESNT_EXIST, "Signer address doesn't exist")
    }

    pub fn send_failed() -> Self {
        Self::new(Self::TRANSACTION_SEND_FAILED, "Sending transaction failed")
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Display for ErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Value),
    Error(ErrorReason),
}

/// A JSON-RPC response to a session request. Exactly one of `result` or `error` is present on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self { id, jsonrpc: "2.0".to_string(), outcome: RpcOutcome::Result(result) }
    }

    pub fn error(id: u64, reason: ErrorReason) -> Self {
        Self { id, jsonrpc: "2.0".to_string(), outcome: RpcOutcome::Error(reason) }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RpcOutcome::Error(_))
    }

    pub fn error_reason(&self) -> Option<&ErrorReason> {
        match &self.outcome {
            RpcOutcome::Error(reason) => Some(reason),
            RpcOutcome::Result(_) => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            RpcOutcome::Result(value) => Some(value),
            RpcOutcome::Error(_) => None,
        }
    }
}
