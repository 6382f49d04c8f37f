use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

/// 绑定值，每个值对应一个占位符
///
/// 值原样传递，生成 SQL 时不做任何转换。序列化为普通 JSON 值，
/// 时间戳为 RFC 3339 字符串，字节为数字数组。
///
/// 反序列化时，能按 RFC 3339 解析的字符串还原为 `Timestamp`，
/// 数字数组还原为 `Bytes`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }

    /// 是否为 `Null` 或空字符串
    pub fn is_empty(&self) -> bool {
        match self {
            BindValue::Null => true,
            BindValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

struct BindValueVisitor;

impl<'de> Visitor<'de> for BindValueVisitor {
    type Value = BindValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("null, a boolean, a number, a string or an array of bytes")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(BindValue::Null)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(BindValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(BindValue::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BindValue::Int64(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        i64::try_from(v)
            .map(BindValue::Int64)
            .map_err(|_| E::custom(format!("integer {} is out of range for i64", v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(BindValue::Float64(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        match DateTime::parse_from_rfc3339(v) {
            Ok(ts) => Ok(BindValue::Timestamp(ts.with_timezone(&Utc))),
            Err(_) => Ok(BindValue::String(v.to_string())),
        }
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(BindValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(BindValue::Bytes(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(BindValue::Bytes(bytes))
    }
}

impl<'de> Deserialize<'de> for BindValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BindValueVisitor)
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::String(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::String(s.to_string())
    }
}

impl From<&String> for BindValue {
    fn from(s: &String) -> Self {
        BindValue::String(s.clone())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BindValue {
                fn from(i: $t) -> Self {
                    BindValue::Int64(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i64, i32, i16, i8, u32, u16, u8);

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Float64(f)
    }
}

impl From<f32> for BindValue {
    fn from(f: f32) -> Self {
        BindValue::Float64(f64::from(f))
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl From<Vec<u8>> for BindValue {
    fn from(bytes: Vec<u8>) -> Self {
        BindValue::Bytes(bytes)
    }
}

impl From<&[u8]> for BindValue {
    fn from(bytes: &[u8]) -> Self {
        BindValue::Bytes(bytes.to_vec())
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(ts: DateTime<Utc>) -> Self {
        BindValue::Timestamp(ts)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}

/// 将不同类型的值收集为 `Vec<BindValue>`
///
/// # 示例
///
/// ```
/// use polysql::{binds, BindValue};
///
/// let args = binds![18, "active", None::<i64>];
/// assert_eq!(args[2], BindValue::Null);
/// ```
#[macro_export]
macro_rules! binds {
    () => {
        ::std::vec::Vec::<$crate::BindValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::BindValue::from($value)),+]
    };
}
