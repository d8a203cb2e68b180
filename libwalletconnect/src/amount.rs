use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Number of atto units in one whole unit of the native asset.
pub const ATTO_PER_UNIT: u128 = 1_000_000_000_000_000_000;

/// Token identifier of the chain's native asset.
pub const NATIVE_TOKEN_ID: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    #[error("Amount overflow")]
    Overflow,
}

/// An amount of some asset, expressed in its smallest (atto) unit.
///
/// Amounts travel over the wire either as decimal strings or as JSON numbers; both are accepted when deserializing,
/// and amounts are always serialized as decimal strings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
pub struct AttoAmount {
    amount: u128,
}

impl AttoAmount {
    pub const ZERO: AttoAmount = AttoAmount { amount: 0 };

    pub fn from_atto(amount: u128) -> Self {
        AttoAmount { amount }
    }

    pub fn to_atto(&self) -> u128 {
        self.amount
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn checked_add(self, other: AttoAmount) -> Option<AttoAmount> {
        self.amount.checked_add(other.amount).map(AttoAmount::from_atto)
    }

    /// Creates an amount from a string representing whole units, e.g. "1.25".
    /// Returns `None` if the string is not a valid number representation.
    pub fn from_units(units: &str) -> Option<Self> {
        let mut parts = units.split('.');
        let whole = parts.next()?.parse::<u128>().ok()?;
        let fraction = if let Some(frac_str) = parts.next() {
            if parts.next().is_some() || frac_str.is_empty() || frac_str.len() > 18 {
                return None;
            }
            let padded = format!("{frac_str:0<18}");
            padded.parse::<u128>().ok()?
        } else {
            0
        };
        let amount = whole.checked_mul(ATTO_PER_UNIT)?.checked_add(fraction)?;
        Some(AttoAmount { amount })
    }

    /// Returns the amount as (whole units, atto remainder).
    pub fn to_units(&self) -> (u128, u128) {
        (self.amount / ATTO_PER_UNIT, self.amount % ATTO_PER_UNIT)
    }
}

impl From<u64> for AttoAmount {
    fn from(amount: u64) -> Self {
        AttoAmount::from_atto(amount as u128)
    }
}

impl FromStr for AttoAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        s.parse::<u128>().map(AttoAmount::from_atto).map_err(|_| AmountError::Overflow)
    }
}

impl Display for AttoAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.amount)
    }
}

impl From<AttoAmount> for String {
    fn from(amount: AttoAmount) -> Self {
        amount.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<AmountRepr> for AttoAmount {
    type Error = AmountError;

    fn try_from(value: AmountRepr) -> Result<Self, Self::Error> {
        match value {
            AmountRepr::Text(s) => s.parse(),
            AmountRepr::Number(n) => Ok(AttoAmount::from(n)),
        }
    }
}

/// An amount of a specific asset. Token lists in requests use exactly this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub id: String,
    pub amount: AttoAmount,
}

impl AssetAmount {
    pub fn new(id: impl Into<String>, amount: AttoAmount) -> Self {
        Self { id: id.into(), amount }
    }

    pub fn native(amount: AttoAmount) -> Self {
        Self::new(NATIVE_TOKEN_ID, amount)
    }

    pub fn is_native(&self) -> bool {
        self.id == NATIVE_TOKEN_ID
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_unit_strings() {
        let val = AttoAmount::from_units("1.0").unwrap();
        assert_eq!(val.to_atto(), ATTO_PER_UNIT);

        let val = AttoAmount::from_units("1.25").unwrap();
        assert_eq!(val.to_atto(), 1_250_000_000_000_000_000);

        let val = AttoAmount::from_units("0.000000000000000001").unwrap();
        assert_eq!(val.to_atto(), 1);
        assert_eq!(val.to_units(), (0, 1));

        assert!(AttoAmount::from_units("1.0000000000000000001").is_none());
        assert!(AttoAmount::from_units("1.000.1").is_none());
        assert!(AttoAmount::from_units("one").is_none());
        assert!(AttoAmount::from_units(".5").is_none());
        assert!(AttoAmount::from_units("5.").is_none());
    }

    #[test]
    fn parses_decimal_strings_only() {
        assert_eq!("1000".parse::<AttoAmount>().unwrap().to_atto(), 1000);
        assert!(matches!("-1".parse::<AttoAmount>(), Err(AmountError::Invalid(_))));
        assert!(matches!("1e18".parse::<AttoAmount>(), Err(AmountError::Invalid(_))));
        assert!(matches!("".parse::<AttoAmount>(), Err(AmountError::Invalid(_))));
        let too_big = format!("{}0", u128::MAX);
        assert_eq!(too_big.parse::<AttoAmount>(), Err(AmountError::Overflow));
    }

    #[test]
    fn accepts_strings_and_numbers_on_the_wire() {
        let a: AssetAmount = serde_json::from_str(r#"{"id":"abc","amount":"2000000000000000000000"}"#).unwrap();
        assert_eq!(a.amount.to_atto(), 2_000 * ATTO_PER_UNIT);
        let b: AssetAmount = serde_json::from_str(r#"{"id":"abc","amount":42}"#).unwrap();
        assert_eq!(b.amount, AttoAmount::from(42));
        assert!(serde_json::from_str::<AssetAmount>(r#"{"id":"abc","amount":"4x"}"#).is_err());
        assert_eq!(serde_json::to_string(&b).unwrap(), r#"{"id":"abc","amount":"42"}"#);
    }

    #[test]
    fn checked_addition() {
        let max = AttoAmount::from_atto(u128::MAX);
        assert!(max.checked_add(AttoAmount::from(1)).is_none());
        assert_eq!(AttoAmount::from(3).checked_add(AttoAmount::from(5)), Some(AttoAmount::from(8)));
    }
}
