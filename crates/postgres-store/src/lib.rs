pub mod error;
pub mod settings;
pub mod store;


pub use error::{Result, StoreError};
pub use settings::DatabaseSettings;
pub use store::{PostgresStore, SCHEMA};
