//! `mongodb`-backed handles.

use bson::{Document as BsonDocument, doc};
use futures::stream::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions};

use super::{ClusterClient, CollectionHandle, Connector, DatabaseHandle, FindSpec};
use crate::errors::DbError;

/// Builds a [`MongoClient`] from a `mongodb://` or `mongodb+srv://` URI.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector {
    pub app_name: Option<String>,
}

impl Connector for MongoConnector {
    type Client = MongoClient;

    async fn connect(&self, uri: &str) -> Result<MongoClient, DbError> {
        if uri.trim().is_empty() {
            return Err(DbError::Configuration("connection string is empty".into()));
        }
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DbError::Configuration(e.to_string()))?;
        if options.app_name.is_none() {
            options.app_name.clone_from(&self.app_name);
        }
        let client = mongodb::Client::with_options(options)
            .map_err(|e| DbError::Configuration(e.to_string()))?;
        log::debug!("client created for {}", redact_uri(uri));
        Ok(MongoClient { inner: client })
    }
}

/// Strips the `user:password@` part of a connection string for logging.
#[must_use]
pub fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &uri[..scheme_end], &uri[at + 1..])
        }
        _ => uri.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct MongoClient {
    inner: mongodb::Client,
}

impl ClusterClient for MongoClient {
    type Database = MongoDatabase;

    fn database(&self, name: &str) -> MongoDatabase {
        MongoDatabase { name: name.to_string(), inner: self.inner.database(name) }
    }
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    name: String,
    inner: mongodb::Database,
}

impl DatabaseHandle for MongoDatabase {
    type Collection = MongoCollection;

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_collection_names(&self, name: Option<&str>) -> Result<Vec<String>, DbError> {
        let action = self.inner.list_collection_names();
        let names = match name {
            Some(n) => action.filter(doc! { "name": n }).await?,
            None => action.await?,
        };
        Ok(names)
    }

    fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection {
            name: name.to_string(),
            inner: self.inner.collection::<BsonDocument>(name),
        }
    }

    async fn drop_collection(&self, name: &str) -> Result<(), DbError> {
        self.inner.collection::<BsonDocument>(name).drop().await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    inner: mongodb::Collection<BsonDocument>,
}

impl CollectionHandle for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_each<F>(
        &self,
        filter: BsonDocument,
        spec: FindSpec,
        mut f: F,
    ) -> Result<u64, DbError>
    where
        F: FnMut(BsonDocument) -> Result<(), DbError>,
    {
        let mut options = FindOptions::default();
        options.projection = spec.projection;
        options.sort = spec.sort;
        let mut cursor = self.inner.find(filter).with_options(options).await?;
        let mut seen = 0;
        while let Some(doc) = cursor.try_next().await? {
            f(doc)?;
            seen += 1;
        }
        Ok(seen)
    }

    async fn count_documents(&self, filter: BsonDocument) -> Result<u64, DbError> {
        Ok(self.inner.count_documents(filter).await?)
    }

    async fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<u64, DbError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let result = self.inner.insert_many(docs).await?;
        Ok(result.inserted_ids.len() as u64)
    }
}
