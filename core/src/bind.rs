//! 将生成的语句绑定到 sqlx 查询
//!
//! 这里不访问任何连接，返回的查询交给调用方自己的执行器。

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::{Database, Encode, Type};

use crate::database_info::DatabaseInfo;
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::BindValue;

/// 按顺序把 `args` 绑定到 `query`，`Null` 以文本类型的 `NULL` 绑定
pub fn bind_values<'q, DB>(
    mut query: Query<'q, DB, DB::Arguments<'q>>,
    args: Vec<BindValue>,
) -> Query<'q, DB, DB::Arguments<'q>>
where
    DB: Database,
    String: Type<DB> + for<'b> Encode<'b, DB>,
    i64: Type<DB> + for<'b> Encode<'b, DB>,
    f64: Type<DB> + for<'b> Encode<'b, DB>,
    bool: Type<DB> + for<'b> Encode<'b, DB>,
    Vec<u8>: Type<DB> + for<'b> Encode<'b, DB>,
    DateTime<Utc>: Type<DB> + for<'b> Encode<'b, DB>,
    Option<String>: Type<DB> + for<'b> Encode<'b, DB>,
{
    for value in args {
        query = match value {
            BindValue::Null => query.bind(None::<String>),
            BindValue::Bool(b) => query.bind(b),
            BindValue::Int64(i) => query.bind(i),
            BindValue::Float64(f) => query.bind(f),
            BindValue::String(s) => query.bind(s),
            BindValue::Timestamp(ts) => query.bind(ts),
            BindValue::Bytes(bytes) => query.bind(bytes),
        };
    }
    query
}

/// 为 `sql` 创建查询并绑定所有参数
///
/// # 参数
///
/// * `dialect` - 生成 `sql` 时使用的方言
/// * `sql` - [`QueryBuilder::build`](crate::QueryBuilder::build) 生成的 SQL
/// * `args` - 与 `sql` 对应的参数
///
/// # 返回值
///
/// `DB` 无法执行该方言时返回 [`QueryError::InvalidDialect`]
pub fn prepare<'q, DB>(
    dialect: Dialect,
    sql: &'q str,
    args: Vec<BindValue>,
) -> Result<Query<'q, DB, DB::Arguments<'q>>>
where
    DB: DatabaseInfo,
    String: Type<DB> + for<'b> Encode<'b, DB>,
    i64: Type<DB> + for<'b> Encode<'b, DB>,
    f64: Type<DB> + for<'b> Encode<'b, DB>,
    bool: Type<DB> + for<'b> Encode<'b, DB>,
    Vec<u8>: Type<DB> + for<'b> Encode<'b, DB>,
    DateTime<Utc>: Type<DB> + for<'b> Encode<'b, DB>,
    Option<String>: Type<DB> + for<'b> Encode<'b, DB>,
{
    if !DB::accepts(dialect) {
        return Err(QueryError::InvalidDialect(format!(
            "{} statements cannot run on {}",
            dialect,
            DB::NAME
        )));
    }
    Ok(bind_values(sqlx::query::<DB>(sql), args))
}
