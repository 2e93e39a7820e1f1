use alloy_sol_types::sol;

sol! {
    /// Emitted by a constant-product pair on every swap
    #[derive(Debug)]
    event Swap(
        address indexed sender,
        uint256 amount0In,
        uint256 amount1In,
        uint256 amount0Out,
        uint256 amount1Out,
        address indexed to
    );
}
