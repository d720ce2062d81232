use std::{fmt, time::Duration};

use crate::types::{
    event::BidEvent,
    primitives::{BlockNumber, LogId},
};

/// Everything the monitor reports to its subscribers.
#[derive(Debug, Clone)]
pub enum MonitorSignal {
    Started { from_block: BlockNumber },
    Bid(BidEvent),
    Warning(Diagnostic),
    CycleFailed(CycleFailure),
    Synced {
        from_block: BlockNumber,
        to_block: BlockNumber,
        logs: usize,
    },
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RetryScheduled {
        attempt: u32,
        max_retries: u32,
        delay: Duration,
        from_block: BlockNumber,
        to_block: BlockNumber,
        reason: String,
    },
    UndecodableLog { log: Option<LogId>, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RetryScheduled {
                attempt,
                max_retries,
                delay,
                from_block,
                to_block,
                reason,
            } => write!(
                f,
                "getLogs {from_block}..{to_block} failed (retry {attempt}/{max_retries} in {}ms): {}",
                delay.as_millis(),
                first_line(reason)
            ),
            Diagnostic::UndecodableLog { log: Some(id), reason } => {
                write!(f, "skipped log {id}: {reason}")
            }
            Diagnostic::UndecodableLog { log: None, reason } => {
                write!(f, "skipped pending log: {reason}")
            }
        }
    }
}

/// A poll cycle that aborted without advancing the processed block.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleFailure {
    pub message: String,
    pub recoverable: bool,
}

impl fmt::Display for CycleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
