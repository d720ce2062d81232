pub mod erc20;
pub mod manager;

pub use erc20::IERC20Minimal;
pub use manager::IFlowAuctionManager;
