use alloy::{
    contract,
    primitives::{Address, B256},
    transports::{RpcError, TransportError},
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    monitor::retry::is_recoverable_message,
    types::primitives::BlockNumber,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Math(#[from] MathError),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("contract call failed: {0}")]
    Contract(#[from] contract::Error),

    #[error("receipt for {0} has no consensus body")]
    MalformedReceipt(B256),

    #[error("no rpc endpoints configured")]
    NoEndpoints,
}

impl ChainError {
    /// Rate limiting, unavailable backends, timeouts and dropped connections.
    /// Everything else is treated as permanent for the current request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChainError::Transport(RpcError::ErrorResp(payload)) => {
                payload.code == 429 || is_recoverable_message(&payload.message)
            }
            ChainError::Transport(err) => is_recoverable_message(&err.to_string()),
            ChainError::Contract(contract::Error::TransportError(err)) => {
                is_recoverable_message(&err.to_string())
            }
            ChainError::Contract(_) | ChainError::MalformedReceipt(_) | ChainError::NoEndpoints => {
                false
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to read chain head: {0}")]
    Head(#[source] ChainError),

    #[error("bid log query for blocks {from}..={to} failed: {source}")]
    Query {
        from: BlockNumber,
        to: BlockNumber,
        #[source]
        source: ChainError,
    },

    #[error("bid log query for blocks {from}..={to} gave up after {retries} retries: {source}")]
    RetriesExhausted {
        from: BlockNumber,
        to: BlockNumber,
        retries: u32,
        #[source]
        source: ChainError,
    },
}

impl PollError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            PollError::Head(source) | PollError::RetriesExhausted { source, .. } => {
                source.is_recoverable()
            }
            PollError::Query { .. } => false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("bid amount must be greater than zero")]
    AmountTooSmall,

    #[error("max valuation must be greater than zero")]
    MaxValuationTooSmall,

    #[error("auction has not started: current block {current_block}, start block {start_block}")]
    AuctionNotStarted {
        current_block: BlockNumber,
        start_block: BlockNumber,
    },

    #[error("auction is over: current block {current_block}, end block {end_block}")]
    AuctionEnded {
        current_block: BlockNumber,
        end_block: BlockNumber,
    },

    #[error("insufficient USDC: need {required}, available {available} (short {shortfall})")]
    InsufficientCurrency {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    #[error("insufficient ETH for gas: need at least {required}, available {available} (short {shortfall})")]
    InsufficientNative {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("auction service returned no transaction plan")]
    Missing,

    #[error("auction service returned an empty transaction plan")]
    Empty,

    #[error("tx {step}/{total} in plan is malformed: {reason}")]
    MalformedStep {
        step: usize,
        total: usize,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("relay returned an unexpected result for tx {step}/{total}")]
    Protocol { step: usize, total: usize },

    #[error("relay request for tx {step}/{total} failed: {source}")]
    Relay {
        step: usize,
        total: usize,
        #[source]
        source: ServiceError,
    },

    #[error("bid transaction {tx_hash} confirmed but its receipt could not be read: {source}")]
    Receipt {
        tx_hash: B256,
        #[source]
        source: ChainError,
    },

    #[error("bid transaction {tx_hash} confirmed but no receipt was found")]
    MissingReceipt { tx_hash: B256 },

    #[error("transaction reverted: {tx_hash}")]
    Reverted { tx_hash: B256 },
}

/// Failures talking to the custody relay or the auction service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{method} {url} failed with status {status}: {message}")]
    Status {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    #[error("{method} {url} failed: {source}")]
    Request {
        method: String,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("no {chain} wallet returned for this api key")]
    MissingWallet { chain: String },

    #[error("launch {auction} is missing field `{field}`")]
    IncompleteLaunch { auction: Address, field: &'static str },
}

#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("value {0} does not fit a decimal")]
    Overflow(String),

    #[error("scale {0} exceeds decimal precision")]
    ScaleTooLarge(u32),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a BidSubmitted event: {0}")]
    Abi(alloy::sol_types::Error),

    #[error("no block number")]
    MissingBlock,
}
