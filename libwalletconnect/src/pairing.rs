use crate::proposal::PeerMetadata;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingUriError {
    #[error("Pairing URI must start with 'wc:'")]
    MissingScheme,
    #[error("Pairing URI has no version marker")]
    MissingVersion,
    #[error("Pairing URI has an empty topic")]
    EmptyTopic,
    #[error("Unsupported pairing URI version '{0}'")]
    UnsupportedVersion(String),
}

/// A parsed `wc:{topic}@{version}?{query}` pairing URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    pub topic: String,
    pub version: u32,
    pub relay_protocol: Option<String>,
    pub sym_key: Option<String>,
    uri: String,
}

impl PairingUri {
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl FromStr for PairingUri {
    type Err = PairingUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s.strip_prefix("wc:").ok_or(PairingUriError::MissingScheme)?;
        let (topic, rest) = rest.split_once('@').ok_or(PairingUriError::MissingVersion)?;
        if topic.is_empty() {
            return Err(PairingUriError::EmptyTopic);
        }
        let (version, query) = rest.split_once('?').unwrap_or((rest, ""));
        let version = version.parse::<u32>().map_err(|_| PairingUriError::UnsupportedVersion(version.to_string()))?;
        if version != 2 {
            return Err(PairingUriError::UnsupportedVersion(version.to_string()));
        }
        let mut relay_protocol = None;
        let mut sym_key = None;
        for (key, value) in query.split('&').filter_map(|kv| kv.split_once('=')) {
            match key {
                "relay-protocol" => relay_protocol = Some(value.to_string()),
                "symKey" => sym_key = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(PairingUri { topic: topic.to_string(), version, relay_protocol, sym_key, uri: s.to_string() })
    }
}

impl Display for PairingUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

/// A durable trust channel with one dApp endpoint, as reported by the relay client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub topic: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<PeerMetadata>,
}

impl Pairing {
    pub fn new(topic: impl Into<String>, active: bool) -> Self {
        Self { topic: topic.into(), active, peer: None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const URI: &str = "wc:7f6e504bfad60b485450578e05678ed3e8e8c4751d3c6160be17160d63ec90f9@2?relay-protocol=irn&symKey=587d5484ce2a2a6ee3ba1962fdd7e8588e06200c46823bd18fbd67def96ad303";

    #[test]
    fn parse_uri() {
        let uri: PairingUri = URI.parse().unwrap();
        assert_eq!(uri.topic, "7f6e504bfad60b485450578e05678ed3e8e8c4751d3c6160be17160d63ec90f9");
        assert_eq!(uri.version, 2);
        assert_eq!(uri.relay_protocol.as_deref(), Some("irn"));
        assert_eq!(uri.sym_key.as_deref(), Some("587d5484ce2a2a6ee3ba1962fdd7e8588e06200c46823bd18fbd67def96ad303"));
        assert_eq!(uri.to_string(), URI);
    }

    #[test]
    fn reject_malformed_uris() {
        assert_eq!("https://example.com".parse::<PairingUri>(), Err(PairingUriError::MissingScheme));
        assert_eq!("wc:abcdef".parse::<PairingUri>(), Err(PairingUriError::MissingVersion));
        assert_eq!("wc:@2?x=1".parse::<PairingUri>(), Err(PairingUriError::EmptyTopic));
        assert_eq!("wc:abc@1?bridge=x".parse::<PairingUri>(), Err(PairingUriError::UnsupportedVersion("1".into())));
    }

    #[test]
    fn query_is_optional() {
        let uri: PairingUri = "wc:abc@2".parse().unwrap();
        assert_eq!(uri.topic, "abc");
        assert!(uri.relay_protocol.is_none());
        assert!(uri.sym_key.is_none());
    }
}
