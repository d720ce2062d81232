pub mod chain;
pub mod constants;
pub mod error;
pub mod math;
pub mod monitor;
pub mod services;
pub mod submission;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{BidLogFilter, ChainReader, FallbackChain, Receipt, RpcChain};
pub use error::*;
pub use monitor::{EventPoller, MonitorConfig, MonitorSignal, RetryPolicy};
pub use services::{AuctionService, BidRequest, CustodyRelay, RelayReceipt};
pub use submission::{BidOutcome, BidSubmitter, SubmissionResult};
pub use types::*;
pub use validation::Balances;
