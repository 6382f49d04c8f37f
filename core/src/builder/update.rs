//! UPDATE 语句生成
//!
//! `SET` 的占位符从 1 开始编号，`WHERE` 的占位符紧随其后，
//! 因此 `SET a = $1, b = $2 WHERE id = $3` 绑定 `[a, b, id]`。

use super::query_builder::{Operation, Statement};
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::BindValue;

impl Statement {
    pub(crate) fn render_update(&self, dialect: Dialect) -> Result<(String, Vec<BindValue>)> {
        if self.data.is_empty() {
            return Err(QueryError::NoDataProvided(Operation::Update));
        }

        let mut assignments = Vec::with_capacity(self.data.len());
        let mut args = Vec::with_capacity(self.data.len() + self.args.len());
        for (i, (column, value)) in self.data.iter().enumerate() {
            assignments.push(format!("{} = {}", column, dialect.placeholder(i + 1)));
            args.push(value.clone());
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        if let Some(clause) = self.where_clause(dialect, self.data.len()) {
            sql.push_str(&clause);
        }
        args.extend(self.args.iter().cloned());
        Ok((sql, args))
    }
}

#[cfg(test)]
mod tests {
    use crate::{binds, update, BindValue, Dialect, Operation, QueryError};

    #[test]
    fn test_update_postgres_numbers_set_then_where() {
        let (sql, args) = update(Dialect::Postgres, "users")
            .set([("name", BindValue::from("alice")), ("age", BindValue::from(31))])
            .and_where("id = ?", binds![7])
            .and_where("tenant = ?", binds!["acme"])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET name = $1, age = $2 WHERE id = $3 AND tenant = $4"
        );
        assert_eq!(args, binds!["alice", 31, 7, "acme"]);
    }

    #[test]
    fn test_update_set_after_where() {
        let (sql, args) = update(Dialect::Postgres, "users")
            .and_where("id = ?", binds![7])
            .set([("name", "alice")])
            .build()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET name = $1 WHERE id = $2");
        assert_eq!(args, binds!["alice", 7]);
    }

    #[test]
    fn test_update_anonymous() {
        let (sql, args) = update(Dialect::MariaDb, "users")
            .set([("status", "inactive")])
            .and_where("last_login < ?", binds!["2024-01-01"])
            .or_where("banned = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET status = ? WHERE (last_login < ? OR banned = ?)"
        );
        assert_eq!(args, binds!["inactive", "2024-01-01", true]);
    }

    #[test]
    fn test_update_without_where() {
        let (sql, args) = update(Dialect::Sqlite, "flags")
            .set([("enabled", false)])
            .build()
            .unwrap();
        assert_eq!(sql, "UPDATE flags SET enabled = ?");
        assert_eq!(args, binds![false]);
    }

    #[test]
    fn test_update_without_data() {
        for dialect in Dialect::ALL {
            let result = update(dialect, "users").and_where("id = ?", binds![1]).build();
            assert_eq!(result, Err(QueryError::NoDataProvided(Operation::Update)));
        }
    }

    #[test]
    fn test_update_rejects_values_and_returning() {
        let result = update(Dialect::Postgres, "users").values([("a", 1)]).build();
        assert!(matches!(
            result,
            Err(QueryError::WrongOperation { method: "values", expected: Operation::Insert })
        ));

        let result = update(Dialect::Postgres, "users")
            .set([("a", 1)])
            .returning("id")
            .build();
        assert!(matches!(
            result,
            Err(QueryError::WrongOperation { method: "returning", .. })
        ));
    }
}
