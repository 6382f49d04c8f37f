//! SQL 方言及其占位符语法
//!
//! 条件模板一律使用匿名的 `?` 占位符，最终文本中每个占位符的形式由方言决定。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::builder::fragment::Fragment;
use crate::error::{QueryError, Result};
use crate::ident::{self, IdentPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "postgres", alias = "postgresql")]
    Postgres,
    #[serde(rename = "mariadb")]
    MariaDb,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "sqlite3", alias = "sqlite")]
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MariaDb,
        Dialect::MySql,
        Dialect::Sqlite,
    ];

    /// 根据连接 URL 的 scheme 推断方言
    ///
    /// # 参数
    ///
    /// * `url` - 连接 URL，如 `postgres://...`、`mysql://...`、`sqlite://...`
    ///
    /// # 返回值
    ///
    /// 无法识别的 scheme 返回 `InvalidDialect`
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("mariadb://") {
            Ok(Dialect::MariaDb)
        } else if url.starts_with("mysql://") {
            Ok(Dialect::MySql)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            Err(QueryError::InvalidDialect(url.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MariaDb => "mariadb",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite3",
        }
    }

    /// 是否使用编号占位符（`$1, $2, ...`）
    pub fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// 获取占位符字符串
    ///
    /// # 参数
    ///
    /// * `index` - 占位符位置（从 1 开始）
    ///
    /// # 返回值
    ///
    /// * PostgreSQL: `"$1"`, `"$2"`, ...
    /// * MySQL/MariaDB/SQLite: `"?"`
    pub fn placeholder(&self, index: usize) -> String {
        if self.uses_numbered_placeholders() {
            format!("${}", index)
        } else {
            "?".to_string()
        }
    }

    /// 从位置 `start`（从 1 开始）起生成 `count` 个占位符
    pub fn allocate_placeholders(&self, start: usize, count: usize) -> Vec<String> {
        (start..start + count).map(|i| self.placeholder(i)).collect()
    }

    /// 从左到右把 `text` 中的每个 `?` 替换为本方言的占位符，编号从 `start` 开始
    ///
    /// 所有 `?` 都视为占位符，包括字符串字面量中的和 PostgreSQL JSON 操作符。
    pub fn rewrite_condition(&self, text: &str, start: usize) -> String {
        Fragment::parse(text, start).render(*self, 0)
    }

    pub fn escape_identifier(&self, name: &str, policy: IdentPolicy) -> Result<String> {
        ident::escape_identifier(*self, policy, name)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mariadb" => Ok(Dialect::MariaDb),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(QueryError::InvalidDialect(s.to_string())),
        }
    }
}

/// 方言加上生成 SQL 时使用的标识符策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flavor {
    pub dialect: Dialect,
    pub ident_policy: IdentPolicy,
}

impl Flavor {
    pub fn new(dialect: Dialect, ident_policy: IdentPolicy) -> Self {
        Self {
            dialect,
            ident_policy,
        }
    }

    /// 使用方言的引号包裹所有标识符
    pub fn quoted(dialect: Dialect) -> Self {
        Self::new(dialect, IdentPolicy::Quoted)
    }

    pub fn escape(&self, name: &str) -> Result<String> {
        ident::escape_identifier(self.dialect, self.ident_policy, name)
    }
}

impl From<Dialect> for Flavor {
    fn from(dialect: Dialect) -> Self {
        Self::new(dialect, IdentPolicy::default())
    }
}
