use std::fmt;

/// Width of the zero-padded database index in source names (`db01`).
pub const DB_KEY_WIDTH: usize = 2;

/// Width of the zero-padded table suffix (`user_007`).
pub const TB_KEY_WIDTH: usize = 3;

/// Prefix of every physical data source name.
pub const DB_SOURCE_PREFIX: &str = "db";

/// Format a 1-based database index as a routing key (`3` -> `"03"`).
pub fn format_db_key(db_index: u32) -> String {
    format!("{:0width$}", db_index, width = DB_KEY_WIDTH)
}

/// Format a 0-based table index as a table suffix (`7` -> `"007"`).
pub fn format_tb_key(tb_index: u32) -> String {
    format!("{:0width$}", tb_index, width = TB_KEY_WIDTH)
}

/// Name of the physical data source for a database key (`"03"` -> `"db03"`).
pub fn data_source_name(db_key: &str) -> String {
    format!("{}{}", DB_SOURCE_PREFIX, db_key)
}

/// The physical location a call is routed to.
///
/// `db_index` is 1-based, `tb_index` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutingDecision {
    pub db_index: u32,
    pub tb_index: u32,
}

impl RoutingDecision {
    pub fn new(db_index: u32, tb_index: u32) -> Self {
        Self { db_index, tb_index }
    }

    /// Decision used when nothing better is known: first database, first table.
    pub fn fallback() -> Self {
        Self::new(1, 0)
    }

    pub fn db_key(&self) -> String {
        format_db_key(self.db_index)
    }

    pub fn tb_key(&self) -> String {
        format_tb_key(self.tb_index)
    }

    pub fn source_name(&self) -> String {
        data_source_name(&self.db_key())
    }

    /// Position of this decision in the flattened `db_count * tb_count` space.
    ///
    /// A `db_index` of `0` counts as database 1.
    pub fn flat_index(&self, tb_count: u32) -> u32 {
        self.db_index.saturating_sub(1) * tb_count + self.tb_index
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source_name(), self.tb_key())
    }
}
