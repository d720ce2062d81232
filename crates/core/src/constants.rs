use alloy::primitives::{Address, U256, address};

/// 2^96, scale of Q96 fixed point prices.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// Manager contract that emits `BidSubmitted` for every hosted auction.
pub const AUCTION_MANAGER_ADDRESS: Address = address!("0xF762AC1553c29Ef36904F9E7F71C627766D878b4");

pub const DEFAULT_AUCTION_ADDRESS: Address = address!("0x942967af43ab0001dbb43eab2456a2a0daea45b6");

/// Native USDC on Base.
pub const USDC_BASE_ADDRESS: Address = address!("0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");

pub const USDC_DECIMALS: u32 = 6;
pub const NATIVE_DECIMALS: u32 = 18;

/// Length of the pre-bid window, counted from the start block.
pub const PRE_BID_BLOCKS: u64 = 150;

pub const BASE_BLOCK_SECONDS: u64 = 2;
