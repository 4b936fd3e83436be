#![forbid(unsafe_code)]

pub mod error;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use snapshot::{Session, Snapshot};
pub use store::ClientStore;
