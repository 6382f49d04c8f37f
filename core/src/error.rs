use thiserror::Error;

use crate::builder::Operation;

/// 构建或生成语句时产生的错误
///
/// 构建器只记录第一个错误，见 [`crate::QueryBuilder`]。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid dialect: {0}")]
    InvalidDialect(String),
    #[error("Empty identifier not allowed")]
    EmptyIdentifier,
    #[error("Condition cannot be empty")]
    EmptyCondition,
    #[error("{method} can only be used with {expected} queries")]
    WrongOperation {
        method: &'static str,
        expected: Operation,
    },
    #[error("No data provided for {0}")]
    NoDataProvided(Operation),
    /// 生成的占位符数量与预期不符
    #[error("Failed to generate placeholders for {0}")]
    InternalPlaceholderError(&'static str),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
