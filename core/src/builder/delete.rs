//! DELETE 语句生成

use super::query_builder::Statement;
use crate::dialect::Dialect;
use crate::value::BindValue;

impl Statement {
    pub(crate) fn render_delete(&self, dialect: Dialect) -> (String, Vec<BindValue>) {
        let mut sql = format!("DELETE FROM {}", self.table);
        if let Some(clause) = self.where_clause(dialect, 0) {
            sql.push_str(&clause);
        }
        (sql, self.args.clone())
    }
}
