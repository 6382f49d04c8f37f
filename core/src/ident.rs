//! 标识符转义
//!
//! 支持两种策略：
//!
//! - [`IdentPolicy::Verbatim`]：只检查是否为空，原样输出，
//!   因此可以传入 `COUNT(p.id) AS total` 这样的表达式。
//! - [`IdentPolicy::Quoted`]：普通名称的每个点分段都用方言的引号包裹
//!   （PostgreSQL/SQLite 为 `"`，MySQL/MariaDB 为 `` ` ``），
//!   结尾的别名（`users u`、`users AS u`）同样加引号，表达式保持不变。
//!
//! `*` 永远不加引号，无论单独出现还是作为最后一段（`t.*`）。

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdentPolicy {
    #[default]
    Verbatim,
    Quoted,
}

pub fn escape_identifier(dialect: Dialect, policy: IdentPolicy, name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(QueryError::EmptyIdentifier);
    }
    if name == "*" {
        return Ok(name.to_string());
    }
    match policy {
        IdentPolicy::Verbatim => Ok(name.to_string()),
        IdentPolicy::Quoted => quote_with_alias(dialect, name),
    }
}

fn quote_char(dialect: Dialect) -> char {
    match dialect {
        Dialect::MySql | Dialect::MariaDb => '`',
        Dialect::Postgres | Dialect::Sqlite => '"',
    }
}

fn quote_with_alias(dialect: Dialect, name: &str) -> Result<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let (ident, alias, with_as) = match words.as_slice() {
        [] => return Err(QueryError::EmptyIdentifier),
        [ident] => (*ident, None, false),
        [ident, alias] if is_plain(alias) => (*ident, Some(*alias), false),
        [ident, kw, alias] if kw.eq_ignore_ascii_case("AS") && is_plain(alias) => {
            (*ident, Some(*alias), true)
        }
        _ => return Ok(name.to_string()),
    };

    let Some(ident) = quote_dotted(dialect, ident)? else {
        return Ok(name.to_string());
    };
    Ok(match alias {
        Some(alias) if with_as => format!("{} AS {}", ident, quote_segment(dialect, alias)),
        Some(alias) => format!("{} {}", ident, quote_segment(dialect, alias)),
        None => ident,
    })
}

/// 为 `schema.table.column` 加引号；`ident` 是表达式而非点分名称时返回 `None`
fn quote_dotted(dialect: Dialect, ident: &str) -> Result<Option<String>> {
    let segments: Vec<&str> = ident.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(QueryError::EmptyIdentifier);
    }

    let last = segments.len() - 1;
    let plain = segments
        .iter()
        .enumerate()
        .all(|(i, s)| is_plain(s) || (i == last && *s == "*"));
    if !plain {
        return Ok(None);
    }

    let quoted: Vec<String> = segments
        .iter()
        .map(|s| {
            if *s == "*" {
                s.to_string()
            } else {
                quote_segment(dialect, s)
            }
        })
        .collect();
    Ok(Some(quoted.join(".")))
}

fn quote_segment(dialect: Dialect, segment: &str) -> String {
    let q = quote_char(dialect);
    let doubled = format!("{q}{q}");
    format!("{q}{}{q}", segment.replace(q, &doubled))
}

fn is_plain(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}
