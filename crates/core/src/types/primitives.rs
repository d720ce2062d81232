use std::{fmt, str::FromStr};

use alloy::{
    primitives::{B256, U256},
    rpc::types::Log,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One block back, clamped at genesis.
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn blocks_until(&self, later: BlockNumber) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for BlockNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Q96 fixed point price, currency per token in raw units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriceQ96(U256);

impl PriceQ96 {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

/// Settlement currency amount in its native precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CurrencyAmount(U256);

impl CurrencyAmount {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<u128> for CurrencyAmount {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BidId(U256);

impl BidId {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a log across re-queries of the same block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogId {
    pub tx_hash: B256,
    pub log_index: u64,
}

impl LogId {
    pub fn new(tx_hash: B256, log_index: u64) -> Self {
        Self { tx_hash, log_index }
    }

    /// `None` for pending logs, which carry no transaction hash yet.
    pub fn of(log: &Log) -> Option<Self> {
        let tx_hash = log.transaction_hash?;
        Some(Self::new(tx_hash, log.log_index.unwrap_or_default()))
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.log_index)
    }
}

/// Integer quantity as returned by HTTP services: a JSON number, a decimal
/// string or a `0x` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub struct Quantity(U256);

impl Quantity {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn to_u64(&self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("empty quantity".to_string());
        }
        U256::from_str(trimmed)
            .map(Self)
            .map_err(|err| format!("invalid quantity {trimmed:?}: {err}"))
    }
}

/// Integer quantity exactly as an HTTP service sent it, parsed on use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Number(serde_json::Number),
    Text(String),
}

impl RawQuantity {
    pub fn parse(&self) -> Result<Quantity, String> {
        match self {
            RawQuantity::Number(number) => number
                .as_u64()
                .map(|value| Quantity(U256::from(value)))
                .ok_or_else(|| format!("invalid quantity {number}")),
            RawQuantity::Text(text) => text.parse(),
        }
    }
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = String;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_accepts_numbers_and_strings() {
        let parsed: Vec<Quantity> =
            serde_json::from_str(r#"[21000, "21000", "0x5208", " 7 "]"#).unwrap();
        assert_eq!(parsed[0], parsed[1]);
        assert_eq!(parsed[1], parsed[2]);
        assert_eq!(parsed[3].to_u64(), Some(7));

        assert!(serde_json::from_str::<Quantity>(r#""twelve""#).is_err());
        assert!(serde_json::from_str::<Quantity>(r#""""#).is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
        assert!(serde_json::from_str::<Quantity>("1.5").is_err());
    }

    #[test]
    fn quantity_keeps_values_beyond_u64() {
        let parsed: Quantity = serde_json::from_str(r#""340282366920938463463374607431768211456""#).unwrap();
        assert_eq!(parsed.as_u256(), U256::from(1u64) << 128);
        assert_eq!(parsed.to_u64(), None);
    }

    #[test]
    fn block_numbers_clamp_at_genesis() {
        assert_eq!(BlockNumber::ZERO.prev(), BlockNumber::ZERO);
        assert_eq!(BlockNumber::new(10).prev(), BlockNumber::new(9));
        assert_eq!(BlockNumber::new(10).blocks_until(BlockNumber::new(4)), 0);
    }
}
