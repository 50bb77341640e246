use super::config::DataSourceConfig;
use crate::config::RouterSettings;
use crate::core::{Result, RouterError};
use crate::router::{ConnectionSelector, RoutingContext};
use log::debug;
use std::collections::HashMap;

/// Data source that picks its physical target from the routing decision.
///
/// Targets are registered under their source names (`db01`, `db02`, ...).
/// Calls without a decision use the default target. `S` is whatever the
/// application uses as a physical source, typically a connection pool.
pub struct DynamicDataSource<S> {
    targets: HashMap<String, S>,
    default_target: S,
    selector: ConnectionSelector,
}

impl<S> DynamicDataSource<S> {
    pub fn new(default_target: S) -> Self {
        Self {
            targets: HashMap::new(),
            default_target,
            selector: ConnectionSelector::new(),
        }
    }

    /// Register a named target
    pub fn with_target(mut self, name: &str, target: S) -> Self {
        self.add_target(name, target);
        self
    }

    pub fn add_target(&mut self, name: &str, target: S) {
        self.targets.insert(name.to_string(), target);
    }

    /// Build every listed source and the default source from settings.
    ///
    /// `factory` receives the source name and its definition.
    pub fn from_settings<F>(settings: &RouterSettings, mut factory: F) -> Result<Self>
    where
        F: FnMut(&str, &DataSourceConfig) -> Result<S>,
    {
        let default_config = settings.default_data_source()?;
        let default_target = factory(&settings.default, default_config)?;
        let mut source = Self::new(default_target);

        for name in &settings.list {
            let config = settings.data_source(name).ok_or_else(|| {
                RouterError::Config(format!("data source '{}' has no definition", name))
            })?;
            source.add_target(name, factory(name, config)?);
        }

        Ok(source)
    }

    /// Source name of the running call's decision.
    pub fn lookup_key(&self) -> Option<String> {
        self.selector.resolve_current()
    }

    /// Target for the running call.
    pub fn current(&self) -> Result<&S> {
        self.select(self.lookup_key())
    }

    /// Target for an explicitly carried context.
    pub fn resolve(&self, ctx: &RoutingContext) -> Result<&S> {
        self.select(self.selector.resolve(ctx))
    }

    fn select(&self, key: Option<String>) -> Result<&S> {
        match key {
            None => Ok(&self.default_target),
            Some(name) => {
                debug!("selected data source {}", name);
                self.targets
                    .get(&name)
                    .ok_or(RouterError::UnknownDataSource(name))
            }
        }
    }

    pub fn target(&self, name: &str) -> Option<&S> {
        self.targets.get(name)
    }

    pub fn default_target(&self) -> &S {
        &self.default_target
    }

    /// Registered target names, sorted.
    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::context;

    fn source() -> DynamicDataSource<&'static str> {
        DynamicDataSource::new("main")
            .with_target("db01", "shard-1")
            .with_target("db02", "shard-2")
    }

    #[test]
    fn test_default_without_decision() {
        let source = source();
        assert_eq!(source.lookup_key(), None);
        assert_eq!(*source.current().unwrap(), "main");
        assert_eq!(*source.resolve(&RoutingContext::new()).unwrap(), "main");
    }

    #[test]
    fn test_routes_by_db_key() {
        let source = source();
        let mut ctx = RoutingContext::new();
        ctx.set("02", "000");
        assert_eq!(*source.resolve(&ctx).unwrap(), "shard-2");

        context::sync_scope(|| {
            context::with_current(|ctx| ctx.set_db_key("01"));
            assert_eq!(source.lookup_key().as_deref(), Some("db01"));
            assert_eq!(*source.current().unwrap(), "shard-1");
        });
    }

    #[test]
    fn test_unknown_source() {
        let source = source();
        let mut ctx = RoutingContext::new();
        ctx.set_db_key("07");

        let err = source.resolve(&ctx).unwrap_err();
        assert!(matches!(err, RouterError::UnknownDataSource(ref name) if name == "db07"));
    }

    #[test]
    fn test_target_names() {
        assert_eq!(source().target_names(), vec!["db01", "db02"]);
        assert_eq!(source().target("db02"), Some(&"shard-2"));
        assert_eq!(*source().default_target(), "main");
    }

    #[test]
    fn test_from_settings() {
        let settings = RouterSettings::from_json(
            r#"{
                "dbCount": 2, "tbCount": 2, "routerKey": "userId",
                "list": ["db01", "db02"], "default": "db00",
                "dataSources": {
                    "db00": { "url": "mysql://h:3306/main", "username": "u", "password": "p" },
                    "db01": { "url": "mysql://h:3306/d1", "username": "u", "password": "p" },
                    "db02": { "url": "mysql://h:3306/d2", "username": "u", "password": "p" }
                }
            }"#,
        )
        .unwrap();

        let source = DynamicDataSource::from_settings(&settings, |name, config| {
            Ok(format!("{}@{}", name, config.endpoint()?.database))
        })
        .unwrap();

        assert_eq!(source.default_target(), "db00@main");
        assert_eq!(source.target("db02").map(String::as_str), Some("db02@d2"));
    }
}
