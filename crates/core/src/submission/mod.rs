pub mod core;
pub mod result;

pub use self::core::BidSubmitter;
pub use result::{BidOutcome, SubmissionResult};
