use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{
    phase::Phase,
    primitives::{BidId, BlockNumber, CurrencyAmount, LogId, PriceQ96},
};

/// A competing bid observed on chain.
///
/// The USD projections are `None` when the raw value is too large for a
/// [`Decimal`]; the raw fields are always set.
#[derive(Debug, Clone, PartialEq)]
pub struct BidEvent {
    pub observed_at: DateTime<Utc>,
    pub block: BlockNumber,
    pub tx_hash: B256,
    pub log_index: u64,
    pub bidder: Address,
    pub bid_id: BidId,
    pub amount: CurrencyAmount,
    pub amount_usd: Option<Decimal>,
    pub max_price: PriceQ96,
    pub max_fdv_usd: Option<Decimal>,
    pub phase: Phase,
}

impl BidEvent {
    pub fn log_id(&self) -> LogId {
        LogId::new(self.tx_hash, self.log_index)
    }
}
