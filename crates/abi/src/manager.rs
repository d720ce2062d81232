use alloy::sol;

sol! {
    /// Auction manager that records bids for every launch it hosts.
    ///
    /// Only the bid event is bound: the agent never calls the manager directly,
    /// transactions come pre-built from the auction service.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IFlowAuctionManager {
        event BidSubmitted(
            address indexed auction,
            address indexed user,
            uint256 indexed bidId,
            uint256 maxPrice,
            uint128 amount
        );
    }
}
