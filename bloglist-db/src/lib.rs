pub mod client;
pub mod memory;
mod record;
pub mod store;

pub use client::DbClient;
pub use memory::MemoryStore;
pub use store::{BlogStore, DbError};
