pub mod pool;
pub mod types;
pub mod validation;

pub use pool::TransactionPool;
pub use types::{MempoolConfig, MempoolError, PendingTransaction};
