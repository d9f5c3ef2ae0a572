//! In-process cluster: databases and collections live in a shared map and
//! queries are answered by [`crate::query`].
//!
//! Cloned handles share state, so a test can seed a [`MemoryCluster`],
//! hand a clone to the driver, and observe the same collections.

use bson::{Document as BsonDocument, oid::ObjectId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{ClusterClient, CollectionHandle, Connector, DatabaseHandle, FindSpec};
use crate::errors::DbError;
use crate::query::{compare_docs, eval_filter, parse_filter, parse_projection, parse_sort};

pub const MEMORY_SCHEME: &str = "memory://";

type Collections = BTreeMap<String, Vec<BsonDocument>>;
type Databases = HashMap<String, Collections>;

#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    databases: Arc<RwLock<Databases>>,
}

impl MemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection if it does not exist yet.
    pub fn create_collection(&self, db: &str, collection: &str) {
        self.databases
            .write()
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
    }

    /// Appends `docs` to a collection (creating it), assigning an `_id` to
    /// documents that lack one. Returns the number of documents added.
    pub fn seed<I>(&self, db: &str, collection: &str, docs: I) -> usize
    where
        I: IntoIterator<Item = BsonDocument>,
    {
        let mut guard = self.databases.write();
        let target = guard.entry(db.to_string()).or_default().entry(collection.to_string()).or_default();
        let before = target.len();
        target.extend(docs.into_iter().map(with_object_id));
        target.len() - before
    }

    /// Number of documents currently stored in a collection, if it exists.
    #[must_use]
    pub fn len(&self, db: &str, collection: &str) -> Option<usize> {
        self.databases.read().get(db).and_then(|c| c.get(collection)).map(Vec::len)
    }
}

fn with_object_id(mut doc: BsonDocument) -> BsonDocument {
    if !doc.contains_key("_id") {
        let mut out = BsonDocument::new();
        out.insert("_id", ObjectId::new());
        out.extend(doc);
        doc = out;
    }
    doc
}

impl Connector for MemoryCluster {
    type Client = Self;

    async fn connect(&self, uri: &str) -> Result<Self, DbError> {
        if !uri.starts_with(MEMORY_SCHEME) {
            return Err(DbError::Configuration(format!(
                "in-memory cluster expects a {MEMORY_SCHEME} URI, got '{uri}'"
            )));
        }
        Ok(self.clone())
    }
}

impl ClusterClient for MemoryCluster {
    type Database = MemoryDatabase;

    fn database(&self, name: &str) -> MemoryDatabase {
        MemoryDatabase { name: name.to_string(), databases: Arc::clone(&self.databases) }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: String,
    databases: Arc<RwLock<Databases>>,
}

impl DatabaseHandle for MemoryDatabase {
    type Collection = MemoryCollection;

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_collection_names(&self, name: Option<&str>) -> Result<Vec<String>, DbError> {
        let guard = self.databases.read();
        let Some(collections) = guard.get(&self.name) else {
            return Ok(Vec::new());
        };
        Ok(collections.keys().filter(|k| name.is_none_or(|n| n == k.as_str())).cloned().collect())
    }

    fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            db: self.name.clone(),
            name: name.to_string(),
            databases: Arc::clone(&self.databases),
        }
    }

    async fn drop_collection(&self, name: &str) -> Result<(), DbError> {
        if let Some(collections) = self.databases.write().get_mut(&self.name) {
            collections.remove(name);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCollection {
    db: String,
    name: String,
    databases: Arc<RwLock<Databases>>,
}

impl MemoryCollection {
    fn matching(&self, filter: &BsonDocument) -> Result<Vec<BsonDocument>, DbError> {
        let filter = parse_filter(filter)?;
        let guard = self.databases.read();
        let docs = guard.get(&self.db).and_then(|c| c.get(&self.name));
        Ok(docs
            .into_iter()
            .flatten()
            .filter(|d| eval_filter(d, &filter))
            .cloned()
            .collect())
    }
}

impl CollectionHandle for MemoryCollection {
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
        let sort = spec.sort.as_ref().map(parse_sort).transpose()?;
        let projection = spec.projection.as_ref().map(parse_projection).transpose()?;
        let mut docs = self.matching(&filter)?;
        if let Some(sort) = sort {
            // stable: ties keep insertion order
            docs.sort_by(|a, b| compare_docs(a, b, &sort));
        }
        let mut seen = 0;
        for doc in docs {
            f(match &projection {
                Some(p) => p.apply(&doc),
                None => doc,
            })?;
            seen += 1;
        }
        Ok(seen)
    }

    async fn count_documents(&self, filter: BsonDocument) -> Result<u64, DbError> {
        Ok(self.matching(&filter)?.len() as u64)
    }

    async fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<u64, DbError> {
        let n = docs.len() as u64;
        let mut guard = self.databases.write();
        guard
            .entry(self.db.clone())
            .or_default()
            .entry(self.name.clone())
            .or_default()
            .extend(docs.into_iter().map(with_object_id));
        Ok(n)
    }
}
