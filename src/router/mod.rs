pub mod context;
pub mod extractor;
pub mod join_point;
pub mod plugin;
pub mod registry;
pub mod rewriter;
pub mod selector;
pub mod strategy;

pub use context::RoutingContext;
pub use extractor::{AttributeExtractor, RouteArgument};
pub use join_point::{MissingAttributePolicy, RoutingInterceptor};
pub use plugin::TableShardInterceptor;
pub use registry::{RouteRegistry, RouteSpec};
pub use rewriter::StatementRewriter;
pub use selector::ConnectionSelector;
pub use strategy::{HashRouterStrategy, RouterStrategy, spread, string_hash};
