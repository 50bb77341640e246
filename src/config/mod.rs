pub mod settings;
pub mod shard;

pub use settings::{PROPERTY_PREFIX, RouterSettings};
pub use shard::ShardConfig;
