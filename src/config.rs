//! Application configuration.
//!
//! Precedence, highest first: command-line overrides, environment
//! variables, the first TOML file found, built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DbError;
use crate::listings::{CountCriteria, ScanInput, ZipcodeRange};

pub const ENV_CONFIG: &str = "LISTINGS_CONFIG";
pub const ENV_CONNECTION_STRING: &str = "LISTINGS_CONNECTION_STRING";
pub const ENV_DATABASE: &str = "LISTINGS_DATABASE";
pub const ENV_LOG_LEVEL: &str = "LISTINGS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LISTINGS_LOG_DIR";

const APP_DIR: &str = "listings-cluster";
const LOCAL_FILE: &str = "listings.toml";

/// What the driver needs to reach the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub connection_string: String,
    pub database_name: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_string: "mongodb://localhost:27017".to_string(),
            database_name: "airbnb".to_string(),
        }
    }
}

/// Inputs for the queries of the default run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub scan: Vec<ScanInput>,
    pub bedroom_limit: i32,
    pub zipcode_start: Option<i32>,
    pub zipcode_end: Option<i32>,
    pub city: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scan: vec![ScanInput::new(20, 1), ScanInput::new(100, 7), ScanInput::new(700, 31)],
            bedroom_limit: 2,
            zipcode_start: Some(97201),
            zipcode_end: Some(97210),
            city: Some("Portland".to_string()),
        }
    }
}

impl QueryConfig {
    /// Count criteria for the zipcode strategy, when both bounds are set.
    #[must_use]
    pub fn zipcode_criteria(&self) -> Option<CountCriteria> {
        let (start, end) = (self.zipcode_start?, self.zipcode_end?);
        ZipcodeRange { start, end }.is_usable().then(|| CountCriteria::zipcodes(start, end))
    }

    /// Count criteria for the city strategy, when a city is set.
    #[must_use]
    pub fn city_criteria(&self) -> Option<CountCriteria> {
        self.city.as_deref().filter(|c| !c.is_empty()).map(CountCriteria::city)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    pub listings_collection: String,
    pub reviews_collection: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub queries: QueryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            listings_collection: "listings".to_string(),
            reviews_collection: "reviews".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            queries: QueryConfig::default(),
        }
    }
}

/// Values given on the command line; `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub connection_string: Option<String>,
    pub database_name: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// # Errors
    /// `Configuration` when the TOML is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        toml::from_str(s).map_err(|e| DbError::Configuration(e.to_string()))
    }

    /// Loads configuration from the process environment and config files.
    ///
    /// # Errors
    /// `Configuration` for an unreadable explicit config file or malformed TOML.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, DbError> {
        Self::load_with_env(overrides, |k| std::env::var(k).ok())
    }

    /// [`Self::load`] with an injectable environment lookup.
    ///
    /// # Errors
    /// See [`Self::load`].
    pub fn load_with_env<F>(overrides: &ConfigOverrides, env: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = overrides.config_path.clone().or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        let mut cfg = match &explicit {
            Some(path) => Self::from_file(path)?,
            None => match search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        if let Some(v) = env(ENV_CONNECTION_STRING) {
            cfg.connection.connection_string = v;
        }
        if let Some(v) = env(ENV_DATABASE) {
            cfg.connection.database_name = v;
        }
        if let Some(v) = env(ENV_LOG_LEVEL) {
            cfg.log_level = v;
        }
        if let Some(v) = env(ENV_LOG_DIR) {
            cfg.log_dir = Some(PathBuf::from(v));
        }

        if let Some(v) = &overrides.connection_string {
            cfg.connection.connection_string.clone_from(v);
        }
        if let Some(v) = &overrides.database_name {
            cfg.connection.database_name.clone_from(v);
        }
        if let Some(v) = &overrides.log_level {
            cfg.log_level.clone_from(v);
        }
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            DbError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let cfg = Self::from_toml_str(&s)
            .map_err(|e| DbError::Configuration(format!("{}: {e}", path.display())))?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(cfg)
    }
}

/// Implicit config file locations, in lookup order.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join(APP_DIR).join("config.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(LOCAL_FILE));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            connection_string = "mongodb+srv://u:p@cluster0.example.net/test"
            [queries]
            bedroom_limit = 3
            scan = [{ price_limit = 50, min_nights_limit = 2 }]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.connection.connection_string, "mongodb+srv://u:p@cluster0.example.net/test");
        assert_eq!(cfg.connection.database_name, "airbnb");
        assert_eq!(cfg.listings_collection, "listings");
        assert_eq!(cfg.queries.bedroom_limit, 3);
        assert_eq!(cfg.queries.scan, vec![ScanInput::new(50, 2)]);
        assert_eq!(cfg.queries.city.as_deref(), Some("Portland"));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = AppConfig::from_toml_str("database_name = [").unwrap_err();
        assert!(matches!(err, DbError::Configuration(_)));
    }

    #[test]
    fn precedence_cli_over_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "database_name = \"from_file\"\nlog_level = \"warn\"\n").unwrap();

        let overrides = ConfigOverrides { config_path: Some(path.clone()), ..Default::default() };
        let cfg = AppConfig::load_with_env(&overrides, env_of(&[])).unwrap();
        assert_eq!(cfg.connection.database_name, "from_file");

        let env = env_of(&[(ENV_DATABASE, "from_env"), (ENV_CONNECTION_STRING, "memory://x")]);
        let cfg = AppConfig::load_with_env(&overrides, &env).unwrap();
        assert_eq!(cfg.connection.database_name, "from_env");
        assert_eq!(cfg.connection.connection_string, "memory://x");
        assert_eq!(cfg.log_level, "warn");

        let overrides = ConfigOverrides {
            config_path: Some(path),
            database_name: Some("from_cli".into()),
            ..Default::default()
        };
        let cfg = AppConfig::load_with_env(&overrides, &env).unwrap();
        assert_eq!(cfg.connection.database_name, "from_cli");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let overrides = ConfigOverrides {
            config_path: Some(PathBuf::from("/nonexistent/listings.toml")),
            ..Default::default()
        };
        assert!(matches!(
            AppConfig::load_with_env(&overrides, env_of(&[])),
            Err(DbError::Configuration(_))
        ));
    }

    #[test]
    fn count_criteria_from_query_config() {
        let q = QueryConfig::default();
        assert_eq!(q.zipcode_criteria(), Some(CountCriteria::zipcodes(97201, 97210)));
        assert_eq!(q.city_criteria(), Some(CountCriteria::city("Portland")));
        let q = QueryConfig { zipcode_start: Some(-1), city: Some(String::new()), ..q };
        assert_eq!(q.zipcode_criteria(), None);
        assert_eq!(q.city_criteria(), None);
    }
}
