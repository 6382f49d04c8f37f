//! INSERT 语句生成

use super::query_builder::{Operation, Statement};
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::BindValue;

impl Statement {
    pub(crate) fn render_insert(&self, dialect: Dialect) -> Result<(String, Vec<BindValue>)> {
        if self.data.is_empty() {
            return Err(QueryError::NoDataProvided(Operation::Insert));
        }

        let mut columns = Vec::with_capacity(self.data.len());
        let mut placeholders = Vec::with_capacity(self.data.len());
        let mut args = Vec::with_capacity(self.data.len());
        for (i, (column, value)) in self.data.iter().enumerate() {
            columns.push(column.as_str());
            placeholders.push(dialect.placeholder(i + 1));
            args.push(value.clone());
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        if let Some(returning) = self.returning.as_deref() {
            if dialect.uses_numbered_placeholders() {
                sql.push_str(" RETURNING ");
                sql.push_str(returning);
            }
        }
        Ok((sql, args))
    }
}
