pub mod error;
pub mod types;

pub use error::{Result, RouterError};
pub use types::{
    DB_KEY_WIDTH, DB_SOURCE_PREFIX, RoutingDecision, TB_KEY_WIDTH, data_source_name,
    format_db_key, format_tb_key,
};
