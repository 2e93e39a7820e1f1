pub mod pool;

pub use pool::PoolRepository;
