use alloy_sol_types::sol;

sol! {
    /// Emitted by a V1-style exchange when ETH is sold for tokens
    #[derive(Debug)]
    event TokenPurchase(
        address indexed buyer,
        uint256 indexed tokens_sold,
        uint256 indexed eth_bought
    );

    /// Emitted by a V1-style exchange when tokens are sold for ETH
    #[derive(Debug)]
    event EthPurchase(
        address indexed buyer,
        uint256 indexed eth_sold,
        uint256 indexed tokens_bought
    );
}
