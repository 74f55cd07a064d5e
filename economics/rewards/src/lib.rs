pub mod developer;
pub mod types;

pub use developer::DeveloperRewards;
pub use types::*;
