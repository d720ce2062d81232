use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20Minimal {
        function balanceOf(address account) external view returns (uint256);
    }
}
