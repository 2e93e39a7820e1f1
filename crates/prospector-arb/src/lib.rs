pub mod calculator;
pub mod finder;
pub mod graph;
pub mod sim;

pub use calculator::ArbitrageCalculator;
pub use finder::ArbitrageFinder;

use prospector_core::types::ArbitrageOpportunity;
use prospector_core::BoundedQueue;

/// Bounded, drop-oldest queue between the finder and the calculator.
pub type OpportunityQueue = BoundedQueue<ArbitrageOpportunity>;
