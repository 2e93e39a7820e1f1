pub mod block;
pub mod opportunity;
pub mod pool;

pub use block::BlockEvent;
pub use opportunity::{ArbitrageOpportunity, ArbitrageStep};
pub use pool::{PoolDetail, Protocol};
