//! Cell and parameter values

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// A single nullable SQL value, as read from a result set or bound to a
/// parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric kept in its textual form (e.g. `"120.50"`).
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Exact numeric from its textual form.
    pub fn decimal(text: impl Into<String>) -> Self {
        SqlValue::Decimal(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short type label used in error messages and column metadata.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
        }
    }

    /// Borrow the text of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into `T`, mapping SQL NULL to `T::default()`.
    pub fn get_or_default<T: FromSqlValue + Default>(&self) -> CoreResult<T> {
        if self.is_null() {
            Ok(T::default())
        } else {
            T::from_sql_value(self)
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(n) => write!(f, "{n}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Decimal(d) => f.write_str(d),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bytes(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(f64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Conversion from a non-null [`SqlValue`] into a Rust type.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self>;
}

fn mismatch(expected: &'static str, value: &SqlValue) -> CoreError {
    CoreError::ValueConversion {
        expected,
        found: value.type_name(),
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        Ok(value.clone())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Int(n) => Ok(*n),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            SqlValue::Decimal(d) => d.parse::<i64>().map_err(|_| mismatch("i64", value)),
            _ => Err(mismatch("i64", value)),
        }
    }
}

macro_rules! impl_from_sql_narrow_int {
    ($($t:ty),*) => {
        $(
            impl FromSqlValue for $t {
                fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
                    let wide = i64::from_sql_value(value)
                        .map_err(|_| mismatch(stringify!($t), value))?;
                    <$t>::try_from(wide).map_err(|_| mismatch(stringify!($t), value))
                }
            }
        )*
    };
}

impl_from_sql_narrow_int!(i8, i16, i32, u8, u16, u32, u64);

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Float(x) => Ok(*x),
            SqlValue::Int(n) => Ok(*n as f64),
            SqlValue::Decimal(d) => d.parse::<f64>().map_err(|_| mismatch("f64", value)),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Null => Err(mismatch("String", value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch("bytes", value)),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> CoreResult<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}
