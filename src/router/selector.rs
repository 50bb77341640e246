use super::context::{self, RoutingContext};
use crate::core::data_source_name;

/// Maps a routing decision to the name of the physical data source.
///
/// Source `i` is named `db` + two-digit `i` (`db01`). `None` means no
/// decision was made and the default source applies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectionSelector;

impl ConnectionSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, ctx: &RoutingContext) -> Option<String> {
        ctx.db_key().map(data_source_name)
    }

    /// Resolve against the task-local context of the running call.
    pub fn resolve_current(&self) -> Option<String> {
        context::current_db_key().map(|key| data_source_name(&key))
    }
}
