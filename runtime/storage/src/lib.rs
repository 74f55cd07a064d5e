pub mod tiered;
pub mod lru_cache;
pub mod nvme;
pub mod archive;
pub mod types;

pub use tiered::TieredStorage;
pub use types::*;
