use alloy_sol_types::sol;

sol! {
    /// Emitted by a concentrated-liquidity pool on every swap
    #[derive(Debug)]
    event Swap(
        address indexed sender,
        address indexed recipient,
        int256 amount0,
        int256 amount1,
        uint160 sqrtPriceX96,
        uint128 liquidity,
        int24 tick
    );
}
