pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::{MeridianApi, MeridianApiServer};
pub use server::{RpcServer, RpcState};
pub use types::*;
