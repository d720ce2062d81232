pub mod fallback;
pub mod rpc;
pub mod traits;

pub use fallback::FallbackChain;
pub use rpc::RpcChain;
pub use traits::{BidLogFilter, ChainReader, Receipt};
