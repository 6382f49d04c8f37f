//! 数据库信息抽象层
//!
//! 建立 sqlx 数据库类型与 SQL 方言之间的对应关系。

use sqlx::Database;

use crate::dialect::Dialect;

/// 数据库信息 trait
///
/// 说明某个 sqlx 数据库类型能执行哪些方言生成的语句。
///
/// # 实现要求
///
/// 通过 cargo feature 启用的每个数据库类型（`sqlx::MySql`, `sqlx::Postgres`,
/// `sqlx::Sqlite`）都实现此 trait。
pub trait DatabaseInfo: Database {
    /// 该数据库类型可执行的方言
    ///
    /// # 返回值
    ///
    /// * MySQL: `[MySql, MariaDb]`
    /// * PostgreSQL: `[Postgres]`
    /// * SQLite: `[Sqlite]`
    fn dialects() -> &'static [Dialect];

    /// 是否可以执行 `dialect` 生成的语句
    fn accepts(dialect: Dialect) -> bool {
        Self::dialects().contains(&dialect)
    }
}

// ========== MySQL 实现 ==========

#[cfg(feature = "mysql")]
impl DatabaseInfo for sqlx::MySql {
    fn dialects() -> &'static [Dialect] {
        // MariaDB 使用同一个驱动
        &[Dialect::MySql, Dialect::MariaDb]
    }
}

// ========== PostgreSQL 实现 ==========

#[cfg(feature = "postgres")]
impl DatabaseInfo for sqlx::Postgres {
    fn dialects() -> &'static [Dialect] {
        &[Dialect::Postgres]
    }
}

// ========== SQLite 实现 ==========

#[cfg(feature = "sqlite")]
impl DatabaseInfo for sqlx::Sqlite {
    fn dialects() -> &'static [Dialect] {
        &[Dialect::Sqlite]
    }
}
