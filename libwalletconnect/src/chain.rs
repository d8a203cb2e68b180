use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// The namespace under which the wallet advertises its chains, methods and accounts.
pub const PROVIDER_NAMESPACE: &str = "alephium";

/// Number of address groups (shards) on every network.
pub const TOTAL_NUMBER_OF_GROUPS: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainParseError {
    #[error("Chain id '{0}' is not in the {PROVIDER_NAMESPACE} namespace")]
    WrongNamespace(String),
    #[error("Chain id '{0}' is missing the address group")]
    MissingGroup(String),
    #[error("Chain id '{0}' has an empty network id")]
    EmptyNetwork(String),
    #[error("Invalid address group '{0}'")]
    InvalidGroup(String),
}

/// The address group part of a chain reference. `-1` on the wire means that any group is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AddressGroup {
    Any,
    Group(u8),
}

impl AddressGroup {
    /// True if an address in `group` satisfies this requirement.
    pub fn accepts(&self, group: u8) -> bool {
        match self {
            AddressGroup::Any => true,
            AddressGroup::Group(g) => *g == group,
        }
    }
}

impl TryFrom<i32> for AddressGroup {
    type Error = ChainParseError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(AddressGroup::Any),
            g if (0..TOTAL_NUMBER_OF_GROUPS as i32).contains(&g) => Ok(AddressGroup::Group(g as u8)),
            g => Err(ChainParseError::InvalidGroup(g.to_string())),
        }
    }
}

impl From<AddressGroup> for i32 {
    fn from(value: AddressGroup) -> Self {
        match value {
            AddressGroup::Any => -1,
            AddressGroup::Group(g) => g as i32,
        }
    }
}

impl Display for AddressGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressGroup::Any => write!(f, "any group"),
            AddressGroup::Group(g) => write!(f, "group {g}"),
        }
    }
}

/// A reference to a network and an address group on it, written `alephium:{networkId}/{group}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRef {
    pub network_id: String,
    pub address_group: AddressGroup,
}

impl ChainRef {
    pub fn new(network_id: impl Into<String>, address_group: AddressGroup) -> Self {
        Self { network_id: network_id.into(), address_group }
    }

    /// The wire form of the chain identifier.
    pub fn format(&self) -> String {
        format!("{PROVIDER_NAMESPACE}:{}/{}", self.network_id, i32::from(self.address_group))
    }
}

impl Display for ChainRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for ChainRef {
    type Err = ChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(PROVIDER_NAMESPACE)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| ChainParseError::WrongNamespace(s.to_string()))?;
        let (network_id, group) = rest.rsplit_once('/').ok_or_else(|| ChainParseError::MissingGroup(s.to_string()))?;
        if network_id.is_empty() {
            return Err(ChainParseError::EmptyNetwork(s.to_string()));
        }
        let group = group.parse::<i32>().map_err(|_| ChainParseError::InvalidGroup(group.to_string()))?;
        Ok(ChainRef::new(network_id, AddressGroup::try_from(group)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_and_parse() {
        let chain = ChainRef::new("mainnet", AddressGroup::Group(2));
        assert_eq!(chain.format(), "alephium:mainnet/2");
        assert_eq!("alephium:mainnet/2".parse::<ChainRef>().unwrap(), chain);

        let any = ChainRef::new("testnet", AddressGroup::Any);
        assert_eq!(any.to_string(), "alephium:testnet/-1");
        assert_eq!("alephium:testnet/-1".parse::<ChainRef>().unwrap(), any);
    }

    #[test]
    fn bad_chain_ids() {
        assert!(matches!("eip155:1".parse::<ChainRef>(), Err(ChainParseError::WrongNamespace(_))));
        assert!(matches!("alephium:mainnet".parse::<ChainRef>(), Err(ChainParseError::MissingGroup(_))));
        assert!(matches!("alephium:/1".parse::<ChainRef>(), Err(ChainParseError::EmptyNetwork(_))));
        assert!(matches!("alephium:mainnet/4".parse::<ChainRef>(), Err(ChainParseError::InvalidGroup(_))));
        assert!(matches!("alephium:mainnet/x".parse::<ChainRef>(), Err(ChainParseError::InvalidGroup(_))));
    }

    #[test]
    fn any_group_accepts_everything() {
        assert!((0..TOTAL_NUMBER_OF_GROUPS).all(|g| AddressGroup::Any.accepts(g)));
        assert!(AddressGroup::Group(1).accepts(1));
        assert!(!AddressGroup::Group(1).accepts(0));
    }
}
