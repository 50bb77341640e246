pub mod config;
pub mod dynamic;

pub use config::{DataSourceConfig, Endpoint};
pub use dynamic::DynamicDataSource;
