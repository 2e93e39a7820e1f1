use alloy_sol_types::sol;

sol! {
    /// Emitted by a V4-style singleton pool manager on every swap
    #[derive(Debug)]
    event Swap(
        address sender,
        bytes32 poolId,
        int128 amount0,
        int128 amount1,
        uint160 sqrtPriceX96,
        int24 tick
    );
}
