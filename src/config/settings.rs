use super::ShardConfig;
use crate::connection::config::DataSourceConfig;
use crate::core::{Result, RouterError, data_source_name, format_db_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Key prefix used by properties-style settings.
pub const PROPERTY_PREFIX: &str = "mini-db-router.jdbc.datasource.";

/// Router settings as loaded from external configuration
///
/// ```json
/// {
///   "dbCount": 2,
///   "tbCount": 4,
///   "routerKey": "userId",
///   "list": ["db01", "db02"],
///   "default": "db00",
///   "dataSources": {
///     "db00": { "url": "jdbc:mysql://127.0.0.1:3306/main", "username": "root", "password": "pw" },
///     "db01": { "url": "jdbc:mysql://127.0.0.1:3306/db01", "username": "root", "password": "pw" },
///     "db02": { "url": "jdbc:mysql://127.0.0.1:3306/db02", "username": "root", "password": "pw" }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    pub db_count: u32,
    pub tb_count: u32,
    #[serde(default)]
    pub router_key: String,
    /// Names of the sharded sources
    pub list: Vec<String>,
    /// Name of the source used when no routing decision is present
    pub default: String,
    pub data_sources: BTreeMap<String, DataSourceConfig>,
}

impl RouterSettings {
    /// Parse and validate a JSON settings document.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file; `.properties` files use the properties
    /// format, anything else is read as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Io(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("properties") => Self::from_properties(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Parse and validate `key=value` lines under [`PROPERTY_PREFIX`].
    ///
    /// ```text
    /// mini-db-router.jdbc.datasource.dbCount=2
    /// mini-db-router.jdbc.datasource.tbCount=4
    /// mini-db-router.jdbc.datasource.routerKey=userId
    /// mini-db-router.jdbc.datasource.list=db01,db02
    /// mini-db-router.jdbc.datasource.default=db00
    /// mini-db-router.jdbc.datasource.db01.url=jdbc:mysql://127.0.0.1:3306/db01
    /// mini-db-router.jdbc.datasource.db01.username=root
    /// mini-db-router.jdbc.datasource.db01.password=pw
    /// ```
    ///
    /// Lines starting with `#` or `!` are comments; keys outside the prefix are ignored.
    pub fn from_properties(text: &str) -> Result<Self> {
        let mut props: BTreeMap<&str, &str> = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
                return Err(RouterError::Config(format!("malformed property line '{}'", line)));
            };
            if let Some(key) = key.trim().strip_prefix(PROPERTY_PREFIX) {
                props.insert(key, value.trim());
            }
        }

        let db_count = count(&props, "dbCount")?;
        let tb_count = count(&props, "tbCount")?;
        let router_key = props.get("routerKey").copied().unwrap_or_default().to_string();
        let list: Vec<String> = required(&props, "list")?
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        let default = required(&props, "default")?.to_string();

        let mut data_sources = BTreeMap::new();
        for name in list.iter().chain(std::iter::once(&default)) {
            if data_sources.contains_key(name) {
                continue;
            }
            let url = required(&props, &format!("{}.url", name))?;
            let username = required(&props, &format!("{}.username", name))?;
            let password = props
                .get(format!("{}.password", name).as_str())
                .copied()
                .unwrap_or_default();

            let mut config = DataSourceConfig::new(url, username, password);
            if let Some(max) = props.get(format!("{}.maxConnections", name).as_str()) {
                config.max_connections = max.parse().map_err(|_| {
                    RouterError::Config(format!("invalid maxConnections for '{}'", name))
                })?;
            }
            if let Some(min) = props.get(format!("{}.minConnections", name).as_str()) {
                config.min_connections = min.parse().map_err(|_| {
                    RouterError::Config(format!("invalid minConnections for '{}'", name))
                })?;
            }
            data_sources.insert(name.clone(), config);
        }

        let settings = Self {
            db_count,
            tb_count,
            router_key,
            list,
            default,
            data_sources,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Build the immutable shard topology.
    pub fn shard_config(&self) -> Result<ShardConfig> {
        ShardConfig::new(self.db_count, self.tb_count, &self.router_key)
    }

    /// Definition of a named source.
    pub fn data_source(&self, name: &str) -> Option<&DataSourceConfig> {
        self.data_sources.get(name)
    }

    /// Definition of the default source.
    pub fn default_data_source(&self) -> Result<&DataSourceConfig> {
        self.data_source(&self.default).ok_or_else(|| {
            RouterError::Config(format!("default data source '{}' is not defined", self.default))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.shard_config()?;

        if self.list.is_empty() {
            return Err(RouterError::Config("data source list cannot be empty".into()));
        }

        if self.default.trim().is_empty() {
            return Err(RouterError::Config("default data source is required".into()));
        }

        for name in self.list.iter().chain(std::iter::once(&self.default)) {
            let config = self.data_source(name).ok_or_else(|| {
                RouterError::Config(format!("data source '{}' has no definition", name))
            })?;
            config.validate().map_err(|e| match e {
                RouterError::Config(reason) => {
                    RouterError::Config(format!("data source '{}': {}", name, reason))
                }
                other => other,
            })?;
        }

        for db_index in 1..=self.db_count {
            let name = data_source_name(&format_db_key(db_index));
            if !self.list.contains(&name) {
                return Err(RouterError::Config(format!(
                    "dbCount is {} but '{}' is not in the data source list",
                    self.db_count, name
                )));
            }
        }

        Ok(())
    }
}

fn required<'a>(props: &BTreeMap<&str, &'a str>, key: &str) -> Result<&'a str> {
    props
        .get(key)
        .copied()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            RouterError::Config(format!("missing property '{}{}'", PROPERTY_PREFIX, key))
        })
}

fn count(props: &BTreeMap<&str, &str>, key: &str) -> Result<u32> {
    let raw = required(props, key)?;
    raw.parse::<u32>().map_err(|_| {
        RouterError::Config(format!(
            "property '{}{}' is not a count: '{}'",
            PROPERTY_PREFIX, key, raw
        ))
    })
}
