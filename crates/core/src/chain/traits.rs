use alloy::{
    primitives::{Address, B256, U256},
    rpc::types::Log,
};
use async_trait::async_trait;

use crate::{error::ChainError, types::primitives::BlockNumber};

/// Range query for `BidSubmitted` logs of one auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidLogFilter {
    pub manager: Address,
    pub auction: Address,
    pub from_block: BlockNumber,
    pub to_block: BlockNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub status: bool,
    pub logs: Vec<Log>,
}

/// Read-only chain access shared by the monitor and the bid submitter.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn block_number(&self) -> Result<BlockNumber, ChainError>;

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn bid_logs(&self, filter: &BidLogFilter) -> Result<Vec<Log>, ChainError>;

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError>;
}
