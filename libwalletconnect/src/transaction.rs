use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An unsigned transaction produced by the transaction builder, ready to be shown to the user and signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub tx_id: String,
    pub unsigned_tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

/// The result of signing and submitting a transaction. This is what the dApp receives on success.
///
/// Kind-specific fields (such as a deployed contract's address) are carried in `details` and flattened into the
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    pub tx_id: String,
    pub unsigned_tx: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl SignResult {
    pub fn new(tx: &UnsignedTransaction, signature: impl Into<String>) -> Self {
        Self {
            tx_id: tx.tx_id.clone(),
            unsigned_tx: tx.unsigned_tx.clone(),
            signature: signature.into(),
            gas_amount: tx.gas_amount,
            gas_price: tx.gas_price.clone(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}
