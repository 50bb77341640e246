use super::context;
use super::registry::RouteRegistry;
use super::rewriter::StatementRewriter;
use crate::core::{Result, RouterError};
use log::debug;
use std::sync::Arc;

/// Statement-preparation hook for split tables.
///
/// Statements of calls whose marker sets `split_table` get the current
/// call's table suffix appended to their table name; all other statements
/// pass through untouched.
#[derive(Debug, Clone)]
pub struct TableShardInterceptor {
    registry: Arc<RouteRegistry>,
    rewriter: StatementRewriter,
}

impl TableShardInterceptor {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self {
            registry,
            rewriter: StatementRewriter::new(),
        }
    }

    /// Statement to execute for `call_id`, using the task-local table key.
    pub fn prepare(&self, call_id: &str, statement: &str) -> Result<String> {
        self.prepare_with(call_id, statement, context::current_tb_key().as_deref())
    }

    /// Statement to execute for `call_id` with an explicit table key.
    pub fn prepare_with(
        &self,
        call_id: &str,
        statement: &str,
        tb_key: Option<&str>,
    ) -> Result<String> {
        if !self.registry.is_split_table(call_id) {
            return Ok(statement.to_string());
        }

        let tb_key = tb_key.ok_or_else(|| {
            RouterError::Rewrite(format!(
                "call '{}' targets a split table but has no table decision",
                call_id
            ))
        })?;

        let rewritten = self.rewriter.rewrite(statement, tb_key)?;
        debug!("rewrote statement for '{}': {}", call_id, rewritten);
        Ok(rewritten)
    }
}
