//! Connection configuration.

use std::env;
use std::time::Duration;

use mongodb::options::{
    ClientOptions, ReadPreference as DriverReadPreference, ReadPreferenceOptions,
    SelectionCriteria,
};

use crate::error::{MongoError, MongoResult};

/// Environment variable holding the connection URI.
pub const URI_ENV: &str = "PIPEWRIGHT_MONGODB_URI";
/// Environment variable holding the database name.
pub const DATABASE_ENV: &str = "PIPEWRIGHT_MONGODB_DATABASE";

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_APP_NAME: &str = "pipewright";

/// MongoDB connection configuration.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    pub min_pool_size: Option<u32>,
    pub max_pool_size: Option<u32>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
    /// Read preference for aggregations.
    pub read_preference: Option<ReadPreference>,
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

/// MongoDB read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl ReadPreference {
    fn to_selection_criteria(self) -> SelectionCriteria {
        let options = ReadPreferenceOptions::default();
        let pref = match self {
            Self::Primary => DriverReadPreference::Primary,
            Self::PrimaryPreferred => DriverReadPreference::PrimaryPreferred { options },
            Self::Secondary => DriverReadPreference::Secondary { options },
            Self::SecondaryPreferred => DriverReadPreference::SecondaryPreferred { options },
            Self::Nearest => DriverReadPreference::Nearest { options },
        };
        SelectionCriteria::ReadPreference(pref)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: String::new(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            read_preference: Some(ReadPreference::Primary),
            retry_reads: Some(true),
            direct_connection: None,
        }
    }
}

impl MongoConfig {
    /// Create a configuration from a MongoDB URI.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Load from `PIPEWRIGHT_MONGODB_URI` and `PIPEWRIGHT_MONGODB_DATABASE`.
    ///
    /// The URI defaults to `mongodb://localhost:27017`; the database is
    /// required.
    pub fn from_env() -> MongoResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MongoResult<Self> {
        let mut builder = Self::builder();
        if let Some(uri) = lookup(URI_ENV) {
            builder = builder.uri(uri);
        }
        if let Some(database) = lookup(DATABASE_ENV) {
            builder = builder.database(database);
        }
        builder.build()
    }

    /// Create a builder for configuration.
    pub fn builder() -> MongoConfigBuilder {
        MongoConfigBuilder::new()
    }

    /// Convert to driver client options.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;
        self.apply(&mut options);
        Ok(options)
    }

    /// Overlay the explicitly configured settings onto parsed options.
    fn apply(&self, options: &mut ClientOptions) {
        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if self.min_pool_size.is_some() {
            options.min_pool_size = self.min_pool_size;
        }
        if self.max_pool_size.is_some() {
            options.max_pool_size = self.max_pool_size;
        }
        if self.connect_timeout.is_some() {
            options.connect_timeout = self.connect_timeout;
        }
        if self.server_selection_timeout.is_some() {
            options.server_selection_timeout = self.server_selection_timeout;
        }
        if let Some(pref) = self.read_preference {
            options.selection_criteria = Some(pref.to_selection_criteria());
        }
        if self.retry_reads.is_some() {
            options.retry_reads = self.retry_reads;
        }
        if self.direct_connection.is_some() {
            options.direct_connection = self.direct_connection;
        }
    }
}

/// Builder for MongoDB configuration.
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    read_preference: Option<ReadPreference>,
    retry_reads: Option<bool>,
    direct_connection: Option<bool>,
}

impl MongoConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.read_preference = Some(pref);
        self
    }

    pub fn retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration; the database name is required.
    pub fn build(self) -> MongoResult<MongoConfig> {
        let database = self
            .database
            .filter(|d| !d.is_empty())
            .ok_or_else(|| MongoError::config("database name is required"))?;
        let defaults = MongoConfig::default();

        Ok(MongoConfig {
            uri: self.uri.unwrap_or(defaults.uri),
            database,
            app_name: self.app_name.or(defaults.app_name),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            server_selection_timeout: self
                .server_selection_timeout
                .or(defaults.server_selection_timeout),
            read_preference: self.read_preference.or(defaults.read_preference),
            retry_reads: self.retry_reads.or(defaults.retry_reads),
            direct_connection: self.direct_connection,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_config_from_uri() {
        let config = MongoConfig::from_uri("mongodb://db.internal:27017", "shop");
        assert_eq!(config.uri, "mongodb://db.internal:27017");
        assert_eq!(config.database, "shop");
        assert_eq!(config.app_name.as_deref(), Some("pipewright"));
    }

    #[test]
    fn test_config_builder() {
        let config = MongoConfig::builder()
            .uri("mongodb://localhost:27017")
            .database("shop")
            .app_name("reports")
            .max_pool_size(20)
            .read_preference(ReadPreference::SecondaryPreferred)
            .build()
            .unwrap();

        assert_eq!(config.database, "shop");
        assert_eq!(config.app_name, Some("reports".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
        assert_eq!(config.read_preference, Some(ReadPreference::SecondaryPreferred));
        assert_eq!(config.retry_reads, Some(true));
    }

    #[test]
    fn test_config_builder_requires_database() {
        assert!(MongoConfig::builder().build().is_err());
        assert!(MongoConfig::builder().database("").build().is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (URI_ENV, "mongodb://replica:27017"),
            (DATABASE_ENV, "analytics"),
        ]
        .into_iter()
        .collect();
        let config = MongoConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.uri, "mongodb://replica:27017");
        assert_eq!(config.database, "analytics");

        let config =
            MongoConfig::from_lookup(|k| (k == DATABASE_ENV).then(|| "local".to_string())).unwrap();
        assert_eq!(config.uri, "mongodb://localhost:27017");

        assert!(MongoConfig::from_lookup(|_| None).is_err());
    }

    #[test]
    fn test_apply_overrides_parsed_options() {
        let config = MongoConfig::builder()
            .database("shop")
            .max_pool_size(3)
            .direct_connection(true)
            .read_preference(ReadPreference::Nearest)
            .build()
            .unwrap();
        let mut options = ClientOptions::builder().build();
        config.apply(&mut options);
        assert_eq!(options.max_pool_size, Some(3));
        assert_eq!(options.direct_connection, Some(true));
        assert_eq!(options.app_name.as_deref(), Some("pipewright"));
        assert!(matches!(
            options.selection_criteria,
            Some(SelectionCriteria::ReadPreference(DriverReadPreference::Nearest { .. }))
        ));
    }

    #[test]
    fn test_to_client_options_parses_uri() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", "shop");
        let options = tokio_test::block_on(config.to_client_options()).unwrap();
        assert_eq!(options.app_name.as_deref(), Some("pipewright"));

        let bad = MongoConfig::from_uri("not-a-uri", "shop");
        assert!(matches!(
            tokio_test::block_on(bad.to_client_options()).unwrap_err(),
            MongoError::Config(_)
        ));
    }
}
