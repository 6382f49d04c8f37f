//! SQL 语句构建器
//!
//! 工厂函数创建绑定到某个方言和某种 [`Operation`] 的 [`QueryBuilder`]，
//! 链式调用累积子句，最后由 `build()` 生成 SQL 与参数。

mod delete;
pub(crate) mod fragment;
mod insert;
mod query_builder;
mod select;
mod update;

pub use query_builder::{Operation, QueryBuilder};

use crate::dialect::Flavor;

/// 创建 SELECT 构建器：`SELECT * FROM table`
///
/// # 参数
///
/// * `flavor` - 目标方言（可直接传入 [`Dialect`](crate::Dialect)）
/// * `table` - 表名，可带别名
///
/// # 示例
///
/// ```
/// use polysql::{binds, select, Dialect};
///
/// let (sql, args) = select(Dialect::MySql, "users")
///     .and_where("age > ?", binds![18])
///     .build()
///     .unwrap();
/// assert_eq!(sql, "SELECT * FROM users WHERE age > ?");
/// assert_eq!(args.len(), 1);
/// ```
pub fn select(flavor: impl Into<Flavor>, table: &str) -> QueryBuilder {
    QueryBuilder::new(Operation::Select, flavor, table)
}

/// `SELECT columns FROM table`，空列表时查询 `*`
pub fn select_columns<I, S>(flavor: impl Into<Flavor>, table: &str, columns: I) -> QueryBuilder
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    select(flavor, table).replace_columns(columns)
}

/// `SELECT COUNT(column) FROM table`，`column` 为空时为 `COUNT(*)`
pub fn count(flavor: impl Into<Flavor>, table: &str, column: &str) -> QueryBuilder {
    select(flavor, table).count_column(column)
}

/// 创建 INSERT 构建器，需要再调用 [`QueryBuilder::values`]
///
/// # 示例
///
/// ```
/// use polysql::{insert, Dialect};
///
/// let (sql, _) = insert(Dialect::Postgres, "users")
///     .values([("name", "alice")])
///     .returning("id")
///     .build()
///     .unwrap();
/// assert_eq!(sql, "INSERT INTO users (name) VALUES ($1) RETURNING id");
/// ```
pub fn insert(flavor: impl Into<Flavor>, table: &str) -> QueryBuilder {
    QueryBuilder::new(Operation::Insert, flavor, table)
}

/// 创建 UPDATE 构建器，需要再调用 [`QueryBuilder::set`]
///
/// `SET` 的占位符在前，`WHERE` 的占位符在后，与调用顺序无关。
pub fn update(flavor: impl Into<Flavor>, table: &str) -> QueryBuilder {
    QueryBuilder::new(Operation::Update, flavor, table)
}

/// 创建 DELETE 构建器
pub fn delete(flavor: impl Into<Flavor>, table: &str) -> QueryBuilder {
    QueryBuilder::new(Operation::Delete, flavor, table)
}
