use std::fmt;

use alloy::primitives::B256;

use crate::types::{
    phase::Phase,
    primitives::{BidId, BlockNumber},
};

/// Whether the bid id could be read back from the final receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    Detected(BidId),
    /// The transactions confirmed but no matching `BidSubmitted` log was found.
    Undetermined,
}

impl fmt::Display for BidOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidOutcome::Detected(bid_id) => write!(f, "bid id {bid_id}"),
            BidOutcome::Undetermined => f.write_str("bid id not found in receipt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub block: BlockNumber,
    pub phase: Phase,
    pub tx_hashes: Vec<B256>,
    pub final_tx_hash: B256,
    pub bid: BidOutcome,
}
