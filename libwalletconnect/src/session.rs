use crate::proposal::{Namespaces, PeerMetadata};
use serde::{Deserialize, Serialize};

/// An established session with a dApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub topic: String,
    pub peer: PeerMetadata,
    pub namespaces: Namespaces,
    /// Unix timestamp (seconds) at which the relay will expire the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl ActiveSession {
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.namespaces.values().flat_map(|ns| ns.accounts.iter().map(String::as_str))
    }
}
