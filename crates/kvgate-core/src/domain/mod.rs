//! Core domain entities

mod endpoint;
mod entry;

pub use endpoint::{ServiceEndpoint, Visibility};
pub use entry::{Ack, Key, StoreEntry, Value};
