use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An address held by the wallet.
///
/// Only addresses whose key material lives in the wallet are ever handed to the session layer, so being present in
/// the address set is what makes an address capable of signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// The public hash of the address. This is the identity used by requesters.
    pub hash: String,
    /// Hex-encoded public key, advertised in the session namespace.
    pub public_key: String,
    /// The address group (shard) the address belongs to.
    pub group: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Address {
    pub fn new(hash: impl Into<String>, public_key: impl Into<String>, group: u8) -> Self {
        Self { hash: hash.into(), public_key: public_key.into(), group, label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label} ({}, group {})", self.hash, self.group),
            None => write!(f, "{} (group {})", self.hash, self.group),
        }
    }
}

/// Looks up the locally held address whose public hash is exactly `signer`.
pub fn resolve_signer<'a>(signer: &str, addresses: &'a [Address]) -> Option<&'a Address> {
    addresses.iter().find(|address| address.hash == signer)
}
