use alloy::primitives::Address;
use rust_decimal::Decimal;

use crate::{constants::PRE_BID_BLOCKS, error::MathError, math};

use super::{
    phase::Phase,
    primitives::{BlockNumber, PriceQ96, TokenAmount},
};

/// Launch parameters as reported by the auction service at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionLaunch {
    pub auction: Address,
    pub currency: Address,
    pub token_symbol: Option<String>,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub claim_block: BlockNumber,
    pub total_supply: TokenAmount,
    pub floor_price: Option<PriceQ96>,
}

impl AuctionLaunch {
    pub fn phase_at(&self, block: BlockNumber) -> Phase {
        Phase::at(block, self.start_block, self.end_block, PRE_BID_BLOCKS)
    }

    pub fn fdv_usd(&self, price: PriceQ96) -> Result<Decimal, MathError> {
        math::price_q96_to_fdv_usd(price.as_u256(), self.total_supply.as_u256())
    }

    pub fn floor_fdv_usd(&self) -> Result<Option<Decimal>, MathError> {
        self.floor_price.map(|price| self.fdv_usd(price)).transpose()
    }

    pub fn is_settled_in(&self, currency: Address) -> bool {
        self.currency == currency
    }
}
