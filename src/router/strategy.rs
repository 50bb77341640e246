use super::context::RoutingContext;
use crate::config::ShardConfig;
use crate::core::{RoutingDecision, format_db_key, format_tb_key};
use log::{debug, warn};
use std::sync::Arc;

/// Shard selection strategy
///
/// Computes (or accepts) a routing decision and records it in the call's
/// [`RoutingContext`].
pub trait RouterStrategy: Send + Sync {
    /// Route by the value of the routing attribute.
    fn route_by_hash(&self, ctx: &mut RoutingContext, key_value: &str) -> RoutingDecision;

    /// Set the database index manually; out-of-range values fall back to `1`.
    fn set_db_key(&self, ctx: &mut RoutingContext, db_index: i64);

    /// Set the table index manually; out-of-range values fall back to `0`.
    fn set_tb_key(&self, ctx: &mut RoutingContext, tb_index: i64);

    fn db_count(&self) -> u32;

    fn tb_count(&self) -> u32;

    fn db_key<'a>(&self, ctx: &'a RoutingContext) -> Option<&'a str> {
        ctx.db_key()
    }

    fn tb_key<'a>(&self, ctx: &'a RoutingContext) -> Option<&'a str> {
        ctx.tb_key()
    }

    fn clear(&self, ctx: &mut RoutingContext) {
        ctx.clear();
    }
}

/// Hash the key the way string hash codes are classically computed:
/// `h = 31 * h + unit` over UTF-16 code units with wrapping arithmetic.
///
/// Stable across processes and platforms, unlike `std`'s randomized hashers.
pub fn string_hash(key: &str) -> u32 {
    key.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Fold the upper 16 bits into the lower 16 so a power-of-two mask sees them.
#[inline]
pub fn spread(hash: u32) -> u32 {
    hash ^ (hash >> 16)
}

/// Hash routing over a `db_count * tb_count` power-of-two space.
#[derive(Debug, Clone)]
pub struct HashRouterStrategy {
    config: Arc<ShardConfig>,
}

impl HashRouterStrategy {
    pub fn new(config: Arc<ShardConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    /// The decision for `key_value` without touching any context.
    pub fn decide(&self, key_value: &str) -> RoutingDecision {
        let size = self.config.size();
        let tb_count = self.config.tb_count();

        let idx = spread(string_hash(key_value)) & (size - 1);

        let db_index = idx / tb_count + 1;
        let tb_index = idx - tb_count * (db_index - 1);

        RoutingDecision::new(db_index, tb_index)
    }
}

impl RouterStrategy for HashRouterStrategy {
    fn route_by_hash(&self, ctx: &mut RoutingContext, key_value: &str) -> RoutingDecision {
        let decision = self.decide(key_value);
        ctx.set_decision(decision);
        debug!(
            "db router decision: db_index={} tb_index={}",
            decision.db_index, decision.tb_index
        );
        decision
    }

    fn set_db_key(&self, ctx: &mut RoutingContext, db_index: i64) {
        if db_index >= 1 && db_index <= i64::from(self.db_count()) {
            ctx.set_db_key(format_db_key(db_index as u32));
        } else {
            warn!(
                "db index {} outside [1, {}], using database 1",
                db_index,
                self.db_count()
            );
            ctx.set_db_key(format_db_key(1));
        }
    }

    fn set_tb_key(&self, ctx: &mut RoutingContext, tb_index: i64) {
        if tb_index >= 0 && tb_index < i64::from(self.tb_count()) {
            ctx.set_tb_key(format_tb_key(tb_index as u32));
        } else {
            warn!(
                "table index {} outside [0, {}), using table 0",
                tb_index,
                self.tb_count()
            );
            ctx.set_tb_key(format_tb_key(0));
        }
    }

    fn db_count(&self) -> u32 {
        self.config.db_count()
    }

    fn tb_count(&self) -> u32 {
        self.config.tb_count()
    }
}
