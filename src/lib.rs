// ============================================================================
// db-router Library
// ============================================================================

pub mod config;
pub mod connection;
pub mod core;
pub mod router;

// Re-export main types for convenience
pub use config::{RouterSettings, ShardConfig};
pub use connection::{DataSourceConfig, DynamicDataSource, Endpoint};
pub use core::{Result, RouterError, RoutingDecision};
pub use router::{
    AttributeExtractor, ConnectionSelector, HashRouterStrategy, MissingAttributePolicy,
    RouteArgument, RouteRegistry, RouteSpec, RouterStrategy, RoutingContext,
    RoutingInterceptor, StatementRewriter, TableShardInterceptor, context,
};

use std::future::Future;
use std::sync::Arc;

// ============================================================================
// High-level Router API
// ============================================================================

/// Sharding router for a set of marked calls
///
/// This is the recommended entry point: it wires the shard topology, hash
/// routing, the call-site registry and both interceptors together.
///
/// # Examples
///
/// ```
/// use db_router::{RouteSpec, ShardConfig, ShardRouter};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut router = ShardRouter::new(ShardConfig::new(2, 4, "userId")?);
/// router.register("app.UserDao", RouteSpec::default_key().split_table(true));
///
/// let sql = router.call_blocking("app.UserDao.queryUser", &[&"user:1001"], || {
///     assert_eq!(router.current_source_key().as_deref(), Some("db01"));
///     router.prepare_statement("app.UserDao.queryUser", "select * from user where id = ?")
/// })?;
///
/// assert_eq!(sql, "select * from user_003 where id = ?");
/// # Ok(())
/// # }
/// ```
pub struct ShardRouter {
    config: Arc<ShardConfig>,
    strategy: Arc<HashRouterStrategy>,
    registry: Arc<RouteRegistry>,
    interceptor: RoutingInterceptor,
    tables: TableShardInterceptor,
}

impl ShardRouter {
    /// Create a router over a validated topology
    pub fn new(config: ShardConfig) -> Self {
        let config = Arc::new(config);
        let strategy = Arc::new(HashRouterStrategy::new(Arc::clone(&config)));
        let registry = Arc::new(RouteRegistry::new());
        let interceptor = RoutingInterceptor::new(Arc::clone(&config), strategy.clone());
        let tables = TableShardInterceptor::new(Arc::clone(&registry));

        Self {
            config,
            strategy,
            registry,
            interceptor,
            tables,
        }
    }

    /// Create a router from loaded settings
    pub fn from_settings(settings: &RouterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings.shard_config()?))
    }

    /// Set the policy for calls whose routing attribute is missing
    pub fn missing_attribute_policy(mut self, policy: MissingAttributePolicy) -> Self {
        self.interceptor = self.interceptor.missing_attribute_policy(policy);
        self
    }

    /// Register the routing marker of a call or of a whole namespace
    pub fn register(&mut self, call_id: &str, spec: RouteSpec) -> &mut Self {
        Arc::make_mut(&mut self.registry).register(call_id, spec);
        self.tables = TableShardInterceptor::new(Arc::clone(&self.registry));
        self
    }

    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Decision for a routing value, without recording it anywhere
    pub fn decide(&self, key_value: &str) -> RoutingDecision {
        self.strategy.decide(key_value)
    }

    /// Run an async call under its routing decision
    ///
    /// Calls without a registered marker run unrouted, against the default
    /// data source.
    ///
    /// ```
    /// use db_router::{RouteSpec, ShardConfig, ShardRouter, context};
    ///
    /// # tokio_test::block_on(async {
    /// let mut router = ShardRouter::new(ShardConfig::new(4, 4, "userId").unwrap());
    /// router.register("app.UserDao.queryUser", RouteSpec::default_key());
    ///
    /// let db = router
    ///     .call("app.UserDao.queryUser", &[&"alice"], || async { Ok(context::current_db_key()) })
    ///     .await
    ///     .unwrap();
    /// assert_eq!(db.as_deref(), Some("03"));
    /// # });
    /// ```
    pub fn call<F, Fut, T>(
        &self,
        call_id: &str,
        args: &[&dyn RouteArgument],
        f: F,
    ) -> impl Future<Output = Result<T>> + use<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let prepared = match self.registry.lookup(call_id) {
            Some(spec) => self.interceptor.prepare_context(call_id, spec, args),
            None => Ok(RoutingContext::new()),
        };
        async move {
            let ctx = prepared?;
            context::scope_with(ctx, async move { f().await }).await
        }
    }

    /// Run a blocking call under its routing decision
    pub fn call_blocking<F, T>(&self, call_id: &str, args: &[&dyn RouteArgument], f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        match self.registry.lookup(call_id) {
            Some(spec) => self.interceptor.route_blocking(call_id, spec, args, f),
            None => context::sync_scope(f),
        }
    }

    /// Run an async call against a manually chosen shard
    pub async fn call_manual<F, Fut, T>(&self, db_index: i64, tb_index: i64, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.interceptor.route_manual(db_index, tb_index, f).await
    }

    /// Run a blocking call against a manually chosen shard
    pub fn call_manual_blocking<F, T>(&self, db_index: i64, tb_index: i64, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.interceptor.route_manual_blocking(db_index, tb_index, f)
    }

    /// Statement to execute for `call_id` in the running call
    pub fn prepare_statement(&self, call_id: &str, statement: &str) -> Result<String> {
        self.tables.prepare(call_id, statement)
    }

    /// Data source name of the running call, `None` for the default source
    pub fn current_source_key(&self) -> Option<String> {
        ConnectionSelector::new().resolve_current()
    }
}
