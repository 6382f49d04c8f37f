//! SELECT 语句生成

use std::fmt::Write;

use super::fragment::render_joined;
use super::query_builder::Statement;
use crate::dialect::Dialect;
use crate::value::BindValue;

impl Statement {
    /// `WHERE c1 AND c2 ...`，占位符整体后移 `shift`
    pub(crate) fn where_clause(&self, dialect: Dialect, shift: usize) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        Some(format!(
            " WHERE {}",
            render_joined(&self.conditions, " AND ", dialect, shift)
        ))
    }

    pub(crate) fn render_select(&self, dialect: Dialect) -> (String, Vec<BindValue>) {
        let mut args = self.args.clone();
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.columns.join(", "));
        let _ = write!(sql, " FROM {}", self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if let Some(clause) = self.where_clause(dialect, 0) {
            sql.push_str(&clause);
        }
        if !self.group_by.is_empty() {
            let _ = write!(sql, " GROUP BY {}", self.group_by.join(", "));
        }
        if !self.having.is_empty() {
            let _ = write!(
                sql,
                " HAVING {}",
                render_joined(&self.having, " AND ", dialect, 0)
            );
        }
        if let Some(order) = &self.order_by {
            let _ = write!(sql, " ORDER BY {}", order);
        }
        if self.limit > 0 {
            args.push(BindValue::Int64(self.limit));
            let _ = write!(sql, " LIMIT {}", dialect.placeholder(args.len()));
        }
        if self.offset > 0 {
            args.push(BindValue::Int64(self.offset));
            let _ = write!(sql, " OFFSET {}", dialect.placeholder(args.len()));
        }
        (sql, args)
    }
}

#[cfg(test)]
mod tests {
    use crate::{binds, count, select, select_columns, BindValue, Dialect, Flavor, QueryError};

    // ========== 基础 ==========

    #[test]
    fn test_select_all_columns() {
        for dialect in Dialect::ALL {
            let (sql, args) = select(dialect, "t").build().unwrap();
            assert_eq!(sql, "SELECT * FROM t");
            assert!(args.is_empty());
        }
    }

    #[test]
    fn test_select_where_numbered() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where("age > ?", binds![18])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE age > $1");
        assert_eq!(args, binds![18]);
    }

    #[test]
    fn test_select_where_anonymous() {
        for dialect in [Dialect::MariaDb, Dialect::MySql, Dialect::Sqlite] {
            let (sql, args) = select(dialect, "users")
                .and_where("age > ?", binds![18])
                .build()
                .unwrap();
            assert_eq!(sql, "SELECT * FROM users WHERE age > ?");
            assert_eq!(args, binds![18]);
        }
    }

    #[test]
    fn test_select_columns_factory() {
        let (sql, _) = select_columns(Dialect::MySql, "users", ["id", "name"])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT id, name FROM users");

        let (sql, _) = select_columns(Dialect::MySql, "users", Vec::<&str>::new())
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_select_appends_to_default_star() {
        let (sql, _) = select(Dialect::Postgres, "users u")
            .select(["u.name", "p.title"])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *, u.name, p.title FROM users u");
    }

    #[test]
    fn test_distinct() {
        let (sql, _) = select_columns(Dialect::Sqlite, "users", ["city"])
            .distinct()
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT DISTINCT city FROM users");
    }

    #[test]
    fn test_quoted_identifiers() {
        let flavor = Flavor::quoted(Dialect::Postgres);
        let (sql, args) = select_columns(flavor, "public.users u", ["u.id", "u.*"])
            .and_where("u.id = ?", binds![1])
            .order_by("u.id", "desc", None)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT "u"."id", "u".* FROM "public"."users" "u" WHERE u.id = $1 ORDER BY "u"."id" DESC"#
        );
        assert_eq!(args, binds![1]);

        let (sql, _) = select_columns(Flavor::quoted(Dialect::MySql), "users", ["id"])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT `id` FROM `users`");
    }

    // ========== 条件 ==========

    #[test]
    fn test_or_where() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where("age > ?", binds![18])
            .or_where("vip = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE (age > $1 OR vip = $2)");
        assert_eq!(args, binds![18, true]);

        let (sql, args) = select(Dialect::MySql, "users")
            .and_where("age > ?", binds![18])
            .or_where("vip = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE (age > ? OR vip = ?)");
        assert_eq!(args, binds![18, true]);
    }

    #[test]
    fn test_or_where_only_wraps_last_condition() {
        let (sql, _) = select(Dialect::Postgres, "users")
            .and_where("active = ?", binds![true])
            .and_where("age > ?", binds![18])
            .or_where("vip = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE active = $1 AND (age > $2 OR vip = $3)"
        );
    }

    #[test]
    fn test_or_where_without_previous_condition() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .or_where("vip = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE vip = $1");
        assert_eq!(args, binds![true]);
    }

    #[test]
    fn test_where_without_args() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where("deleted_at IS NULL", binds![])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE deleted_at IS NULL");
        assert!(args.is_empty());
    }

    #[test]
    fn test_where_grows_args_by_marker_count() {
        for dialect in Dialect::ALL {
            let (sql, args) = select(dialect, "t")
                .and_where("a = ?", binds![1])
                .and_where("b BETWEEN ? AND ?", binds![2, 3])
                .having("COUNT(*) > ?", binds![4])
                .build()
                .unwrap();
            assert_eq!(args, binds![1, 2, 3, 4]);
            let expected = if dialect.uses_numbered_placeholders() {
                "SELECT * FROM t WHERE a = $1 AND b BETWEEN $2 AND $3 HAVING COUNT(*) > $4"
            } else {
                "SELECT * FROM t WHERE a = ? AND b BETWEEN ? AND ? HAVING COUNT(*) > ?"
            };
            assert_eq!(sql, expected);
        }
    }

    #[test]
    fn test_where_if_not_empty() {
        let name: Option<&str> = None;
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where_if_not_empty("name = ?", name)
            .and_where_if_not_empty("city = ?", "")
            .and_where_if_not_empty("status = ?", "active")
            .and_where_if_not_empty("age = ?", 0)
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE status = $1 AND age = $2");
        assert_eq!(args, binds!["active", 0]);
    }

    #[test]
    fn test_where_in() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where("active = ?", binds![true])
            .where_in("id", [1, 2, 3])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE active = $1 AND id IN ($2, $3, $4)"
        );
        assert_eq!(args, binds![true, 1, 2, 3]);

        let (sql, _) = select(Dialect::Sqlite, "users")
            .where_in("id", [1, 2])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id IN (?, ?)");
    }

    #[test]
    fn test_where_between() {
        let (sql, args) = select(Dialect::Postgres, "orders")
            .and_where("status = ?", binds!["paid"])
            .where_between("total", 10, 100)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM orders WHERE status = $1 AND total BETWEEN $2 AND $3"
        );
        assert_eq!(args, binds!["paid", 10, 100]);
    }

    #[test]
    fn test_empty_condition() {
        let result = select(Dialect::MySql, "users")
            .and_where("", binds![1])
            .build();
        assert_eq!(result, Err(QueryError::EmptyCondition));

        let result = select(Dialect::MySql, "users")
            .having("", binds![])
            .build();
        assert_eq!(result, Err(QueryError::EmptyCondition));
    }

    #[test]
    fn test_blank_condition_is_not_empty() {
        let (sql, args) = select(Dialect::MySql, "users")
            .and_where(" ", binds![])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE  ");
        assert!(args.is_empty());
    }

    // ========== JOIN / GROUP BY / ORDER BY / 分页 ==========

    #[test]
    fn test_joins() {
        let (sql, _) = select_columns(Dialect::MySql, "users u", ["u.id"])
            .left_join("posts p", "p.user_id = u.id")
            .inner_join("teams t", "t.id = u.team_id")
            .right_join("roles r", "r.id = u.role_id")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT u.id FROM users u LEFT JOIN posts p ON p.user_id = u.id \
             INNER JOIN teams t ON t.id = u.team_id RIGHT JOIN roles r ON r.id = u.role_id"
        );
    }

    #[test]
    fn test_order_by_allow_list() {
        let allowed = ["name", "created_at"];
        let (sql, _) = select(Dialect::MySql, "users")
            .order_by("password", "DESC", Some(&allowed[..]))
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY id DESC");

        let (sql, _) = select(Dialect::MySql, "users")
            .order_by("name", "sideways", Some(&allowed[..]))
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY name ASC");
    }

    #[test]
    fn test_order_by_last_call_wins() {
        let (sql, _) = select(Dialect::MySql, "users")
            .order_by("name", "asc", None)
            .order_by("age", "desc", None)
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY age DESC");
    }

    #[test]
    fn test_limit_offset() {
        let (sql, args) = select(Dialect::Postgres, "users")
            .and_where("age > ?", binds![18])
            .limit(10)
            .offset(20)
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE age > $1 LIMIT $2 OFFSET $3");
        assert_eq!(args, binds![18, 10i64, 20i64]);

        let (sql, args) = select(Dialect::MariaDb, "users")
            .limit(0)
            .offset(-5)
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(args.is_empty());

        let (sql, args) = select(Dialect::Sqlite, "users").offset(5).build().unwrap();
        assert_eq!(sql, "SELECT * FROM users OFFSET ?");
        assert_eq!(args, vec![BindValue::Int64(5)]);
    }

    #[test]
    fn test_complex_query() {
        let (sql, args) = select_columns(
            Dialect::Postgres,
            "users u",
            ["u.id", "u.name", "COUNT(p.id) AS post_count"],
        )
        .left_join("posts p", "p.user_id = u.id")
        .and_where("u.age > ?", binds![18])
        .and_where("u.status = ?", binds!["active"])
        .or_where("u.role = ?", binds!["admin"])
        .group_by(["u.id", "u.name"])
        .having("COUNT(p.id) > ?", binds![5])
        .order_by("post_count", "DESC", None)
        .limit(10)
        .offset(20)
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "SELECT u.id, u.name, COUNT(p.id) AS post_count FROM users u \
             LEFT JOIN posts p ON p.user_id = u.id \
             WHERE u.age > $1 AND (u.status = $2 OR u.role = $3) \
             GROUP BY u.id, u.name HAVING COUNT(p.id) > $4 \
             ORDER BY post_count DESC LIMIT $5 OFFSET $6"
        );
        assert_eq!(args, binds![18, "active", "admin", 5, 10i64, 20i64]);
    }

    // ========== 聚合 ==========

    #[test]
    fn test_aggregate() {
        let (sql, _) = select_columns(Dialect::MySql, "orders", ["user_id"])
            .aggregate("SUM", "total")
            .aggregate("COUNT", "*")
            .group_by(["user_id"])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT user_id, SUM(total), COUNT(*) FROM orders GROUP BY user_id"
        );

        let result = select(Dialect::MySql, "orders").aggregate("", "total").build();
        assert_eq!(result, Err(QueryError::EmptyIdentifier));
    }

    #[test]
    fn test_count() {
        let (sql, args) = count(Dialect::Postgres, "users", "")
            .and_where("active = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE active = $1");
        assert_eq!(args, binds![true]);

        let (sql, _) = count(Dialect::MySql, "users", "id").build().unwrap();
        assert_eq!(sql, "SELECT COUNT(id) FROM users");
    }

    // ========== 子查询 ==========

    #[test]
    fn test_subquery() {
        let inner = select_columns(Dialect::MySql, "orders", ["user_id"])
            .and_where("total > ?", binds![100]);
        let mut outer = select(Dialect::MySql, "users");
        let sub = outer.subquery(&inner, "big_spenders");
        assert_eq!(sub, "(SELECT user_id FROM orders WHERE total > ?) AS big_spenders");

        let (sql, args) = outer
            .inner_join(&sub, "big_spenders.user_id = users.id")
            .and_where("users.active = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users INNER JOIN (SELECT user_id FROM orders WHERE total > ?) AS big_spenders \
             ON big_spenders.user_id = users.id WHERE users.active = ?"
        );
        assert_eq!(args, binds![100, true]);
    }

    #[test]
    fn test_subquery_postgres_spliced_first() {
        let inner = select_columns(Dialect::Postgres, "orders", ["user_id"])
            .and_where("total > ?", binds![100]);
        let mut outer = select(Dialect::Postgres, "users");
        let sub = outer.subquery(&inner, "o");
        assert_eq!(sub, "(SELECT user_id FROM orders WHERE total > $1) AS o");

        let (sql, args) = outer
            .inner_join(&sub, "o.user_id = users.id")
            .and_where("users.active = ?", binds![true])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users INNER JOIN (SELECT user_id FROM orders WHERE total > $1) AS o \
             ON o.user_id = users.id WHERE users.active = $2"
        );
        assert_eq!(args, binds![100, true]);
    }

    #[test]
    fn test_subquery_postgres_spliced_after_outer_args() {
        let inner = select_columns(Dialect::Postgres, "orders", ["user_id"])
            .and_where("total > ?", binds![100]);
        let mut outer = select(Dialect::Postgres, "users").and_where("active = ?", binds![true]);
        let sub = outer.subquery(&inner, "o");
        assert_eq!(sub, "(SELECT user_id FROM orders WHERE total > $1) AS o");

        let (sql, args) = outer
            .inner_join(&sub, "o.user_id = users.id")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users INNER JOIN (SELECT user_id FROM orders WHERE total > $1) AS o \
             ON o.user_id = users.id WHERE active = $1"
        );
        assert_eq!(args, binds![true, 100]);
    }

    #[test]
    fn test_subquery_error_propagates() {
        let inner = select(Dialect::MySql, "orders").and_where("", binds![]);
        let mut outer = select(Dialect::MySql, "users");
        assert_eq!(outer.subquery(&inner, "o"), "");
        assert_eq!(outer.build(), Err(QueryError::EmptyCondition));
    }

    #[test]
    fn test_subquery_on_failed_builder_keeps_first_error() {
        let inner = select(Dialect::MySql, "orders").and_where("", binds![]);
        let mut outer = select(Dialect::MySql, "users").values([("a", 1)]);
        assert_eq!(outer.subquery(&inner, "o"), "");
        assert!(matches!(
            outer.build(),
            Err(QueryError::WrongOperation { method: "values", .. })
        ));
    }
}
