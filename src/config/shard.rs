use crate::core::{Result, RouterError};

/// Shard topology: how many databases, how many tables per database,
/// and which argument attribute routes a call by default.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardConfig {
    db_count: u32,
    tb_count: u32,
    routing_key: String,
}

impl ShardConfig {
    /// Create a validated topology.
    ///
    /// Fails when either count is zero or when `db_count * tb_count` is not a
    /// power of two, since hash routing reduces with a bit mask.
    pub fn new(db_count: u32, tb_count: u32, routing_key: &str) -> Result<Self> {
        let config = Self {
            db_count,
            tb_count,
            routing_key: routing_key.trim().to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the default routing key
    pub fn with_routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = routing_key.trim().to_string();
        self
    }

    pub fn db_count(&self) -> u32 {
        self.db_count
    }

    pub fn tb_count(&self) -> u32 {
        self.tb_count
    }

    /// Total number of physical tables (`db_count * tb_count`).
    pub fn size(&self) -> u32 {
        self.db_count * self.tb_count
    }

    /// Default routing key, `None` when not configured.
    pub fn routing_key(&self) -> Option<&str> {
        if self.routing_key.is_empty() {
            None
        } else {
            Some(&self.routing_key)
        }
    }

    /// Validate topology
    pub fn validate(&self) -> Result<()> {
        if self.db_count == 0 {
            return Err(RouterError::Config("dbCount must be >= 1".into()));
        }

        if self.tb_count == 0 {
            return Err(RouterError::Config("tbCount must be >= 1".into()));
        }

        let size = self.db_count.checked_mul(self.tb_count).ok_or_else(|| {
            RouterError::Config(format!(
                "dbCount * tbCount overflows ({} * {})",
                self.db_count, self.tb_count
            ))
        })?;

        if !size.is_power_of_two() {
            return Err(RouterError::Config(format!(
                "dbCount * tbCount must be a power of two, got {} * {} = {}",
                self.db_count, self.tb_count, size
            )));
        }

        Ok(())
    }
}
