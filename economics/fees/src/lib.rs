pub mod eip1559;
pub mod split;
pub mod types;

pub use eip1559::FeeMarket;
pub use split::FeeSplit;
pub use types::*;
