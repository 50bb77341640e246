use super::context::{self, RoutingContext};
use super::extractor::{AttributeExtractor, RouteArgument};
use super::registry::RouteSpec;
use super::strategy::RouterStrategy;
use crate::config::ShardConfig;
use crate::core::{Result, RouterError};
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;

/// What to do when the routing attribute is absent from a call's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingAttributePolicy {
    /// Fail the call with [`RouterError::AttributeNotFound`].
    #[default]
    Reject,
    /// Route the call to database 1, table 0.
    DefaultShard,
}

/// Wraps marked calls with routing: resolve the routing value, record the
/// decision for the duration of the call, and drop it afterwards.
pub struct RoutingInterceptor {
    config: Arc<ShardConfig>,
    strategy: Arc<dyn RouterStrategy>,
    extractor: AttributeExtractor,
    missing_attribute: MissingAttributePolicy,
}

impl RoutingInterceptor {
    pub fn new(config: Arc<ShardConfig>, strategy: Arc<dyn RouterStrategy>) -> Self {
        Self {
            config,
            strategy,
            extractor: AttributeExtractor::new(),
            missing_attribute: MissingAttributePolicy::default(),
        }
    }

    /// Set the policy for calls whose routing attribute cannot be found
    pub fn missing_attribute_policy(mut self, policy: MissingAttributePolicy) -> Self {
        self.missing_attribute = policy;
        self
    }

    pub fn strategy(&self) -> &Arc<dyn RouterStrategy> {
        &self.strategy
    }

    /// Attribute name a call routes by: the call-site key when given,
    /// otherwise the configured default.
    pub fn resolve_key_name(&self, call_id: &str, spec: &RouteSpec) -> Result<String> {
        let declared = spec.routing_key.trim();
        if !declared.is_empty() {
            return Ok(declared.to_string());
        }

        self.config
            .routing_key()
            .map(str::to_string)
            .ok_or_else(|| RouterError::MissingRoutingKey(call_id.to_string()))
    }

    /// Compute the routing context of a call without installing it anywhere.
    pub fn prepare_context(
        &self,
        call_id: &str,
        spec: &RouteSpec,
        args: &[&dyn RouteArgument],
    ) -> Result<RoutingContext> {
        let key_name = self.resolve_key_name(call_id, spec)?;
        let mut ctx = RoutingContext::new();

        match self.extractor.extract(&key_name, args) {
            Ok(value) => {
                self.strategy.route_by_hash(&mut ctx, &value);
            }
            Err(err)
                if err.is_recoverable()
                    && self.missing_attribute == MissingAttributePolicy::DefaultShard =>
            {
                warn!(
                    "call '{}' has no value for '{}', routing to the default shard",
                    call_id, key_name
                );
                self.strategy.set_db_key(&mut ctx, 1);
                self.strategy.set_tb_key(&mut ctx, 0);
            }
            Err(err) => return Err(err),
        }

        info!(
            "routing result for '{}': db={} tb={}",
            call_id,
            ctx.db_key().unwrap_or("-"),
            ctx.tb_key().unwrap_or("-")
        );
        Ok(ctx)
    }

    /// Run an async call under its routing decision.
    ///
    /// The routing value is resolved before the returned future is created,
    /// so the future does not borrow `args`. The decision is visible through
    /// [`context`] while `call` runs and is gone once the future completes,
    /// whether `call` succeeded, failed or panicked.
    pub fn route<F, Fut, T>(
        &self,
        call_id: &str,
        spec: &RouteSpec,
        args: &[&dyn RouteArgument],
        call: F,
    ) -> impl Future<Output = Result<T>> + use<F, Fut, T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let prepared = self.prepare_context(call_id, spec, args);
        async move {
            let ctx = prepared?;
            context::scope_with(ctx, async move { call().await }).await
        }
    }

    /// Synchronous counterpart of [`route`](Self::route).
    pub fn route_blocking<F, T>(
        &self,
        call_id: &str,
        spec: &RouteSpec,
        args: &[&dyn RouteArgument],
        call: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let ctx = self.prepare_context(call_id, spec, args)?;
        context::sync_scope_with(ctx, call)
    }

    /// Context for a manually chosen shard; out-of-range indices are clamped.
    pub fn manual_context(&self, db_index: i64, tb_index: i64) -> RoutingContext {
        let mut ctx = RoutingContext::new();
        self.strategy.set_db_key(&mut ctx, db_index);
        self.strategy.set_tb_key(&mut ctx, tb_index);
        ctx
    }

    /// Run an async call against a manually chosen shard.
    pub async fn route_manual<F, Fut, T>(&self, db_index: i64, tb_index: i64, call: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let ctx = self.manual_context(db_index, tb_index);
        context::scope_with(ctx, async move { call().await }).await
    }

    /// Synchronous counterpart of [`route_manual`](Self::route_manual).
    pub fn route_manual_blocking<F, T>(&self, db_index: i64, tb_index: i64, call: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let ctx = self.manual_context(db_index, tb_index);
        context::sync_scope_with(ctx, call)
    }
}
