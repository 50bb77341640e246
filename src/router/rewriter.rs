use crate::core::{Result, RouterError};
use lazy_static::lazy_static;
use log::error;
use regex::{NoExpand, Regex};

lazy_static! {
    static ref TABLE_CLAUSE: Regex =
        Regex::new(r"(?i)\b(from|into|update)\s+(\w+)").expect("table clause pattern is valid");
}

/// Rewrites the table of a single-table statement to its physical shard.
///
/// Only the first `FROM`/`INTO`/`UPDATE` clause determines the table. Joins
/// and subqueries over other tables keep their original names; multi-table
/// statements are not supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatementRewriter;

impl StatementRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Logical table name referenced by the statement's first table clause.
    pub fn table_name<'a>(&self, statement: &'a str) -> Option<&'a str> {
        TABLE_CLAUSE
            .captures(statement)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
    }

    /// Append `_<table_suffix>` to the statement's table.
    ///
    /// Every occurrence of the matched clause text (e.g. `from user`) is
    /// rewritten, as long as it stands as whole words.
    ///
    /// # Examples
    ///
    /// ```
    /// use db_router::StatementRewriter;
    ///
    /// let sql = StatementRewriter::new()
    ///     .rewrite("select * from user where id = ?", "007")
    ///     .unwrap();
    /// assert_eq!(sql, "select * from user_007 where id = ?");
    /// ```
    pub fn rewrite(&self, statement: &str, table_suffix: &str) -> Result<String> {
        let Some(clause) = TABLE_CLAUSE.find(statement) else {
            error!("no table found in sharded statement: {}", statement);
            return Err(RouterError::Rewrite(format!(
                "no FROM/INTO/UPDATE table found in statement '{}'",
                statement
            )));
        };

        let matched = clause.as_str();
        let replacement = format!("{}_{}", matched, table_suffix);
        let whole_words = Regex::new(&format!(r"\b{}\b", regex::escape(matched)))
            .map_err(|e| {
                RouterError::Rewrite(format!("cannot match table clause '{}': {}", matched, e))
            })?;

        Ok(whole_words
            .replace_all(statement, NoExpand(&replacement))
            .into_owned())
    }
}
