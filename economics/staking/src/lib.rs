pub mod pool;
pub mod tiers;
pub mod rewards;
pub mod types;

pub use pool::StakingPool;
pub use tiers::LockTier;
pub use types::*;
