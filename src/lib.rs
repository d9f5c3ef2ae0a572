//! Connects to a MongoDB cluster holding an Airbnb listings dataset and runs
//! a few filter and count queries against it.
//!
//! [`driver::Driver`] owns the client, database and collection handles. It
//! is generic over a [`store::Connector`], so the same queries run against
//! a live cluster ([`store::MongoConnector`]) or an in-process one
//! ([`store::MemoryCluster`]).

pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod import;
pub mod listings;
pub mod logger;
pub mod names;
pub mod query;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::{AppConfig, ConnectionConfig};
pub use driver::{Driver, DriverState};
pub use errors::DbError;
pub use listings::{CountCriteria, ScanInput, ZipcodeRange};
