//! The database access component: owns the client, database and collection
//! handles and runs the listings queries against the selected collection.

use bson::doc;
use std::io::Write;

use crate::config::ConnectionConfig;
use crate::errors::DbError;
use crate::listings::{self, CountCriteria, ScanInput};
use crate::names::{validate_collection_name, validate_database_name};
use crate::store::{ClusterClient, CollectionHandle, Connector, DatabaseHandle, FindSpec};

type DatabaseOf<C> = <<C as Connector>::Client as ClusterClient>::Database;
type CollectionOf<C> = <DatabaseOf<C> as DatabaseHandle>::Collection;

/// Where the driver is in its `Unconnected → Connected → CollectionSelected`
/// progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unconnected,
    Connected,
    CollectionSelected,
}

pub struct Driver<C: Connector> {
    config: ConnectionConfig,
    connector: C,
    client: Option<C::Client>,
    db: Option<DatabaseOf<C>>,
    collection: Option<CollectionOf<C>>,
}

impl<C: Connector> std::fmt::Debug for Driver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("database", &self.config.database_name)
            .field("state", &self.state())
            .field("collection", &self.collection_name())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Driver<C> {
    pub const fn new(config: ConnectionConfig, connector: C) -> Self {
        Self { config, connector, client: None, db: None, collection: None }
    }

    pub fn state(&self) -> DriverState {
        match (&self.db, &self.collection) {
            (Some(_), Some(_)) => DriverState::CollectionSelected,
            (Some(_), None) => DriverState::Connected,
            _ => DriverState::Unconnected,
        }
    }

    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn database_name(&self) -> Option<&str> {
        self.db.as_ref().map(DatabaseHandle::name)
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection.as_ref().map(CollectionHandle::name)
    }

    /// Establishes the client and selects the configured database.
    ///
    /// # Errors
    /// `Configuration` for a malformed connection string, `InvalidName` for a
    /// bad database name. Nothing is retried.
    pub async fn connect(&mut self) -> Result<(), DbError> {
        self.establish_connection().await?;
        let name = self.config.database_name.clone();
        self.select_database(&name)
    }

    /// # Errors
    /// `Configuration` when the connection string is rejected.
    pub async fn establish_connection(&mut self) -> Result<(), DbError> {
        let client = self.connector.connect(&self.config.connection_string).await?;
        self.client = Some(client);
        log::debug!("client handle established");
        Ok(())
    }

    /// Binds (or re-binds) the database handle. Any selected collection
    /// belonged to the previous database and is released.
    ///
    /// # Errors
    /// `NotConnected` before [`Self::establish_connection`], `InvalidName`
    /// for a bad name.
    pub fn select_database(&mut self, name: &str) -> Result<(), DbError> {
        let client = self.client.as_ref().ok_or(DbError::NotConnected)?;
        validate_database_name(name)?;
        self.db = Some(client.database(name));
        self.collection = None;
        log::info!("selected database '{name}'");
        Ok(())
    }

    fn db(&self) -> Result<&DatabaseOf<C>, DbError> {
        self.db.as_ref().ok_or(DbError::NotConnected)
    }

    fn selected(&self) -> Result<&CollectionOf<C>, DbError> {
        self.collection.as_ref().ok_or(DbError::NoCollectionSelected)
    }

    /// One catalog round trip; true when a collection called exactly `name`
    /// exists.
    ///
    /// # Errors
    /// `NotConnected` without a database handle, or a backend failure.
    pub async fn collection_exists(&self, name: &str) -> Result<bool, DbError> {
        let names = self.db()?.list_collection_names(Some(name)).await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Binds the collection handle if the collection exists. Returns
    /// `Ok(false)` for an absent collection, leaving the current handle
    /// untouched.
    ///
    /// # Errors
    /// `NotConnected`, `InvalidName`, or a backend failure.
    pub async fn select_collection(&mut self, name: &str) -> Result<bool, DbError> {
        if !self.collection_exists(name).await? {
            log::warn!("collection '{name}' does not exist");
            return Ok(false);
        }
        validate_collection_name(name)?;
        let handle = self.db()?.collection(name);
        self.collection = Some(handle);
        log::debug!("selected collection '{name}'");
        Ok(true)
    }

    /// Lists every collection of the selected database.
    ///
    /// # Errors
    /// `NotConnected` or a backend failure.
    pub async fn collection_names(&self) -> Result<Vec<String>, DbError> {
        self.db()?.list_collection_names(None).await
    }

    /// Counts every document in the selected collection.
    ///
    /// # Errors
    /// `NoCollectionSelected` or a backend failure.
    pub async fn count_all(&self) -> Result<u64, DbError> {
        self.selected()?.count_documents(doc! {}).await
    }

    /// Lists the listings priced at most `price_limit` whose average minimum
    /// stay equals `min_nights_limit`, cheapest first, writing one line per
    /// record to `out` as the cursor yields it. Returns the number of records.
    ///
    /// # Errors
    /// `NoCollectionSelected`, a backend failure, or a write failure on `out`.
    pub async fn run_scan_query<W: Write>(
        &self,
        price_limit: i32,
        min_nights_limit: i32,
        out: &mut W,
    ) -> Result<u64, DbError> {
        let collection = self.selected()?;
        let input = ScanInput::new(price_limit, min_nights_limit);
        log::debug!(
            "scan query on '{}' with price_limit={price_limit} min_nights_limit={min_nights_limit}",
            collection.name()
        );
        let spec = FindSpec {
            projection: Some(listings::scan_projection()),
            sort: Some(listings::scan_sort()),
        };
        writeln!(out, "{}", listings::scan_header(input))?;
        collection
            .find_each(listings::scan_filter(price_limit, min_nights_limit), spec, |d| {
                writeln!(out, "{}", listings::format_listing(&d))?;
                Ok(())
            })
            .await
    }

    /// Counts listings with more than `bedroom_limit` bedrooms, narrowed by
    /// either a zipcode range or a city.
    ///
    /// # Errors
    /// `InvalidArgument` when `criteria` selects no strategy (or both),
    /// `NoCollectionSelected`, or a backend failure.
    pub async fn run_count_query(
        &self,
        bedroom_limit: i32,
        criteria: &CountCriteria,
    ) -> Result<u64, DbError> {
        let filter = criteria.filter(bedroom_limit)?;
        let collection = self.selected()?;
        log::debug!("count query on '{}': {filter}", collection.name());
        collection.count_documents(filter).await
    }

    /// Drops every collection in the selected database and returns the
    /// names dropped. Failures on individual collections are logged and
    /// skipped.
    ///
    /// # Errors
    /// `NotConnected` or a failure listing the collections.
    pub async fn drop_all(&mut self) -> Result<Vec<String>, DbError> {
        let names = self.collection_names().await?;
        let db = self.db()?;
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            match db.drop_collection(&name).await {
                Ok(()) => {
                    log::info!("dropped collection '{name}'");
                    dropped.push(name);
                }
                Err(e) => log::error!("failed to drop collection '{name}': {e}"),
            }
        }
        self.collection = None;
        Ok(dropped)
    }

    /// Handle for an arbitrary collection of the selected database, whether
    /// or not it exists yet. Used by import, which creates collections.
    ///
    /// # Errors
    /// `NotConnected` or `InvalidName`.
    pub fn collection_handle(&self, name: &str) -> Result<CollectionOf<C>, DbError> {
        validate_collection_name(name)?;
        Ok(self.db()?.collection(name))
    }
}
