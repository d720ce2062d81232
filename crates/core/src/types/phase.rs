use std::fmt;

use super::primitives::BlockNumber;

/// Auction phase at a given block.
///
/// Ordered by time: a fixed launch never moves back to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    BeforeStart,
    PreBid,
    Clearing,
    Ended,
}

impl Phase {
    /// Classifies `block` against `[start, end]`, where the first
    /// `pre_bid_blocks` blocks from `start` form the pre-bid window.
    pub fn at(
        block: BlockNumber,
        start: BlockNumber,
        end: BlockNumber,
        pre_bid_blocks: u64,
    ) -> Self {
        if block < start {
            Phase::BeforeStart
        } else if block > end {
            Phase::Ended
        } else if start.blocks_until(block) < pre_bid_blocks {
            Phase::PreBid
        } else {
            Phase::Clearing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BeforeStart => "before_start",
            Phase::PreBid => "pre_bid",
            Phase::Clearing => "clearing",
            Phase::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u64 = 42_673_326;
    const END: u64 = 42_673_596;

    fn phase(block: u64) -> Phase {
        Phase::at(
            BlockNumber::new(block),
            BlockNumber::new(START),
            BlockNumber::new(END),
            150,
        )
    }

    #[test]
    fn classifies_launch_boundaries() {
        assert_eq!(phase(START - 1), Phase::BeforeStart);
        assert_eq!(phase(START), Phase::PreBid);
        assert_eq!(phase(START + 149), Phase::PreBid);
        assert_eq!(phase(START + 150), Phase::Clearing);
        assert_eq!(phase(END), Phase::Clearing);
        assert_eq!(phase(END + 1), Phase::Ended);
    }

    #[test]
    fn phases_never_move_backwards() {
        let mut previous = phase(START - 10);
        for block in START - 10..=END + 10 {
            let current = phase(block);
            assert!(current >= previous, "block {block}: {current} after {previous}");
            previous = current;
        }
        assert_eq!(previous, Phase::Ended);
    }

    #[test]
    fn pre_bid_window_longer_than_auction_still_ends() {
        let start = BlockNumber::new(100);
        let end = BlockNumber::new(120);
        assert_eq!(Phase::at(BlockNumber::new(120), start, end, 150), Phase::PreBid);
        assert_eq!(Phase::at(BlockNumber::new(121), start, end, 150), Phase::Ended);
    }

    #[test]
    fn renders_snake_case() {
        assert_eq!(Phase::BeforeStart.to_string(), "before_start");
        assert_eq!(Phase::PreBid.to_string(), "pre_bid");
        assert_eq!(Phase::Clearing.to_string(), "clearing");
        assert_eq!(Phase::Ended.to_string(), "ended");
    }
}
