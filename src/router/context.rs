//! Per-call routing context.
//!
//! [`RoutingContext`] is a plain value owned by one call. To let layers that
//! never see the call's arguments (connection selection, statement
//! preparation) read the decision, a context can be installed into a
//! task-local slot with [`scope`] or [`sync_scope`]. The slot exists only for
//! the duration of the scope and is dropped on every exit path, so a pooled
//! worker never observes the previous call's decision.

use crate::core::{RoutingDecision, format_db_key, format_tb_key};
use std::cell::RefCell;
use std::future::Future;

tokio::task_local! {
    static CURRENT_ROUTE: RefCell<RoutingContext>;
}

/// Routing decision of the current call, stored as zero-padded keys
/// (`dbKey` two digits, `tbKey` three digits).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingContext {
    db_key: Option<String>,
    tb_key: Option<String>,
}

impl RoutingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, db_key: impl Into<String>, tb_key: impl Into<String>) {
        self.db_key = Some(db_key.into());
        self.tb_key = Some(tb_key.into());
    }

    pub fn set_decision(&mut self, decision: RoutingDecision) {
        self.set(decision.db_key(), decision.tb_key());
    }

    pub fn set_db_key(&mut self, db_key: impl Into<String>) {
        self.db_key = Some(db_key.into());
    }

    pub fn set_tb_key(&mut self, tb_key: impl Into<String>) {
        self.tb_key = Some(tb_key.into());
    }

    pub fn db_key(&self) -> Option<&str> {
        self.db_key.as_deref()
    }

    pub fn tb_key(&self) -> Option<&str> {
        self.tb_key.as_deref()
    }

    /// Both keys parsed back into a decision, if both are set.
    pub fn decision(&self) -> Option<RoutingDecision> {
        let db_index = self.db_key.as_deref()?.parse().ok()?;
        let tb_index = self.tb_key.as_deref()?.parse().ok()?;
        Some(RoutingDecision::new(db_index, tb_index))
    }

    pub fn is_empty(&self) -> bool {
        self.db_key.is_none() && self.tb_key.is_none()
    }

    pub fn clear(&mut self) {
        self.db_key = None;
        self.tb_key = None;
    }
}

impl From<RoutingDecision> for RoutingContext {
    fn from(decision: RoutingDecision) -> Self {
        Self {
            db_key: Some(format_db_key(decision.db_index)),
            tb_key: Some(format_tb_key(decision.tb_index)),
        }
    }
}

/// Run `future` with a fresh, empty task-local routing context.
pub async fn scope<F>(future: F) -> F::Output
where
    F: Future,
{
    scope_with(RoutingContext::new(), future).await
}

/// Run `future` with `ctx` installed as the task-local routing context.
pub async fn scope_with<F>(ctx: RoutingContext, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_ROUTE.scope(RefCell::new(ctx), future).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    sync_scope_with(RoutingContext::new(), f)
}

/// Synchronous counterpart of [`scope_with`].
pub fn sync_scope_with<F, R>(ctx: RoutingContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_ROUTE.sync_scope(RefCell::new(ctx), f)
}

/// Access the current context mutably. Returns `None` outside a scope.
pub fn with_current<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut RoutingContext) -> R,
{
    CURRENT_ROUTE
        .try_with(|cell| f(&mut cell.borrow_mut()))
        .ok()
}

/// Snapshot of the current context, `None` outside a scope.
pub fn current() -> Option<RoutingContext> {
    CURRENT_ROUTE.try_with(|cell| cell.borrow().clone()).ok()
}

pub fn current_db_key() -> Option<String> {
    current().and_then(|ctx| ctx.db_key)
}

pub fn current_tb_key() -> Option<String> {
    current().and_then(|ctx| ctx.tb_key)
}

/// Whether the caller runs inside a routing scope.
pub fn in_scope() -> bool {
    CURRENT_ROUTE.try_with(|_| ()).is_ok()
}
