use thiserror::Error;

/// What kind of identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Database,
    Collection,
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => f.write_str("database"),
            Self::Collection => f.write_str("collection"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName { kind: NameKind, name: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Collection '{0}' has no documents; queries are not working as expected")]
    EmptyCollection(String),

    #[error("Not connected to a cluster")]
    NotConnected,

    #[error("No collection selected")]
    NoCollectionSelected,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("MongoDB: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// True for failures that end the program during connection setup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidName { .. } | Self::NotConnected)
    }
}
