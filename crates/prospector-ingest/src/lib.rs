pub mod discoverer;
pub mod subscriber;

pub use discoverer::PoolDiscoverer;
pub use subscriber::BlockSubscriber;

use prospector_core::types::BlockEvent;
use prospector_core::BoundedQueue;

/// Bounded, drop-oldest queue between the header subscription and the
/// pool discoverer.
pub type BlockQueue = BoundedQueue<BlockEvent>;
