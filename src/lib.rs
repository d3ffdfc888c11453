pub mod cipher;
pub mod codec;
pub mod keystore;
pub mod record;
pub mod store;
pub mod link;
pub mod model;

pub use link::{Entity, Link, Resolver};
pub use record::{Record, Value};
pub use store::{Store, StoreConfig, StoreError};
