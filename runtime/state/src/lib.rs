pub mod accounts;
pub mod state_db;
pub mod types;

pub use accounts::AccountState;
pub use state_db::StateDB;
pub use types::*;
