//! Handle traits for the three remote resources the driver owns, and the
//! backends that implement them.
//!
//! `mongo` talks to a real cluster through the `mongodb` crate; `memory`
//! keeps collections in process and evaluates the same filter, sort and
//! projection documents with [`crate::query`].

pub mod memory;
pub mod mongo;

use crate::errors::DbError;
use bson::Document as BsonDocument;

pub use memory::{MemoryCluster, MemoryCollection, MemoryDatabase};
pub use mongo::{MongoClient, MongoCollection, MongoConnector, MongoDatabase};

/// Options for [`CollectionHandle::find_each`], expressed as Mongo-style documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub projection: Option<BsonDocument>,
    pub sort: Option<BsonDocument>,
}

/// Turns a connection string into a client handle.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Client: ClusterClient;

    /// # Errors
    /// Returns `Configuration` when `uri` cannot be parsed into client options.
    async fn connect(&self, uri: &str) -> Result<Self::Client, DbError>;
}

/// An open connection context to a cluster.
pub trait ClusterClient {
    type Database: DatabaseHandle;

    /// Selects a logical database. Never touches the network.
    fn database(&self, name: &str) -> Self::Database;
}

#[allow(async_fn_in_trait)]
pub trait DatabaseHandle {
    type Collection: CollectionHandle;

    fn name(&self) -> &str;

    /// Lists collection names, restricted to an exact `name` when given.
    async fn list_collection_names(&self, name: Option<&str>) -> Result<Vec<String>, DbError>;

    /// Binds a collection handle. Never touches the network.
    fn collection(&self, name: &str) -> Self::Collection;

    async fn drop_collection(&self, name: &str) -> Result<(), DbError>;
}

#[allow(async_fn_in_trait)]
pub trait CollectionHandle {
    fn name(&self) -> &str;

    /// Hands each matching document to `f` in cursor order as it arrives and
    /// returns how many were visited. An error from `f` closes the cursor
    /// and is returned as is.
    async fn find_each<F>(
        &self,
        filter: BsonDocument,
        spec: FindSpec,
        f: F,
    ) -> Result<u64, DbError>
    where
        F: FnMut(BsonDocument) -> Result<(), DbError>;

    /// Runs a find to completion and returns every matching document in
    /// cursor order.
    async fn find(
        &self,
        filter: BsonDocument,
        spec: FindSpec,
    ) -> Result<Vec<BsonDocument>, DbError> {
        let mut docs = Vec::new();
        self.find_each(filter, spec, |d| {
            docs.push(d);
            Ok(())
        })
        .await?;
        Ok(docs)
    }

    async fn count_documents(&self, filter: BsonDocument) -> Result<u64, DbError>;

    /// Inserts `docs` and returns how many were written.
    async fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<u64, DbError>;
}
