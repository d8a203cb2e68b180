use crate::amount::{AssetAmount, AttoAmount};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// The methods a dApp may invoke within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelayMethod {
    SignAndSubmitTransferTx,
    SignAndSubmitDeployContractTx,
    SignAndSubmitExecuteScriptTx,
    RequestNodeApi,
    RequestExplorerApi,
    Unsupported(String),
}

impl RelayMethod {
    /// The methods the wallet advertises. Anything else is answered with an unsupported-method error.
    pub const SUPPORTED: [&'static str; 5] = [
        "alph_signAndSubmitTransferTx",
        "alph_signAndSubmitDeployContractTx",
        "alph_signAndSubmitExecuteScriptTx",
        "alph_requestNodeApi",
        "alph_requestExplorerApi",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RelayMethod::SignAndSubmitTransferTx => Self::SUPPORTED[0],
            RelayMethod::SignAndSubmitDeployContractTx => Self::SUPPORTED[1],
            RelayMethod::SignAndSubmitExecuteScriptTx => Self::SUPPORTED[2],
            RelayMethod::RequestNodeApi => Self::SUPPORTED[3],
            RelayMethod::RequestExplorerApi => Self::SUPPORTED[4],
            RelayMethod::Unsupported(method) => method,
        }
    }

    /// True for methods that require a user decision and a signature.
    pub fn is_signing(&self) -> bool {
        matches!(
            self,
            RelayMethod::SignAndSubmitTransferTx
                | RelayMethod::SignAndSubmitDeployContractTx
                | RelayMethod::SignAndSubmitExecuteScriptTx
        )
    }
}

impl From<&str> for RelayMethod {
    fn from(value: &str) -> Self {
        match value {
            "alph_signAndSubmitTransferTx" => RelayMethod::SignAndSubmitTransferTx,
            "alph_signAndSubmitDeployContractTx" => RelayMethod::SignAndSubmitDeployContractTx,
            "alph_signAndSubmitExecuteScriptTx" => RelayMethod::SignAndSubmitExecuteScriptTx,
            "alph_requestNodeApi" => RelayMethod::RequestNodeApi,
            "alph_requestExplorerApi" => RelayMethod::RequestExplorerApi,
            other => RelayMethod::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for RelayMethod {
    fn from(value: String) -> Self {
        RelayMethod::from(value.as_str())
    }
}

impl From<RelayMethod> for String {
    fn from(value: RelayMethod) -> Self {
        value.as_str().to_string()
    }
}

impl Display for RelayMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a session request. Responses are correlated by this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub topic: String,
    pub id: u64,
}

impl Display for RequestKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.topic, self.id)
    }
}

/// An inbound `session_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestEvent {
    pub topic: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    pub method: RelayMethod,
    #[serde(default)]
    pub params: Value,
}

impl SessionRequestEvent {
    pub fn new(topic: impl Into<String>, id: u64, method: impl Into<RelayMethod>, params: Value) -> Self {
        Self { topic: topic.into(), id, chain_id: None, method: method.into(), params }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey { topic: self.topic.clone(), id: self.id }
    }

    /// Decodes the request parameters into the shape expected for its method.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }
}

/// Reads gas prices that arrive either as JSON numbers or as strings, keeping them as opaque strings.
fn opaque_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Opaque {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(Option::<Opaque>::deserialize(deserializer)?.map(|v| match v {
        Opaque::Text(s) => s,
        Opaque::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub address: String,
    pub atto_alph_amount: AttoAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<AssetAmount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransferTxParams {
    pub signer_address: String,
    pub destinations: Vec<Destination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_amount: Option<u64>,
    #[serde(default, deserialize_with = "opaque_string", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDeployContractTxParams {
    pub signer_address: String,
    pub bytecode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_atto_alph_amount: Option<AttoAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_token_amount: Option<AttoAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_amount: Option<u64>,
    #[serde(default, deserialize_with = "opaque_string", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignExecuteScriptTxParams {
    pub signer_address: String,
    pub bytecode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atto_alph_amount: Option<AttoAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<AssetAmount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_amount: Option<u64>,
    #[serde(default, deserialize_with = "opaque_string", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

/// Arguments of a node or explorer API passthrough call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}
