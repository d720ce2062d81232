pub mod traits;

pub use traits::{AuctionService, BidRequest, CustodyRelay, RelayReceipt};
