//! The in-memory value representation shared by every column codec.

use std::net::{Ipv4Addr, Ipv6Addr};

use rust_decimal::Decimal;
use uuid::Uuid;

/// A single cell of a Native column.
///
/// This is the discriminated union referenced by the design notes: every
/// scalar and composite codec reads and writes `Value`s, and a block's
/// decoded form is simply `Vec<Vec<Value>>` (columns of values).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL / the empty `Nothing` value.
    Null,
    /// `Bool`.
    Bool(bool),
    /// `UInt8`.
    UInt8(u8),
    /// `UInt16`.
    UInt16(u16),
    /// `UInt32`.
    UInt32(u32),
    /// `UInt64`.
    UInt64(u64),
    /// `UInt128`.
    UInt128(u128),
    /// `UInt256`, stored as 32 little-endian bytes (no native 256-bit integer in std).
    UInt256([u8; 32]),
    /// `Int8`.
    Int8(i8),
    /// `Int16`.
    Int16(i16),
    /// `Int32`.
    Int32(i32),
    /// `Int64`.
    Int64(i64),
    /// `Int128`.
    Int128(i128),
    /// `Int256`, stored as 32 little-endian bytes, two's complement.
    Int256([u8; 32]),
    /// `Float32`.
    Float32(f32),
    /// `Float64`.
    Float64(f64),
    /// `BFloat16`, widened to `f32` for convenient arithmetic.
    BFloat16(f32),
    /// `Decimal(P, S)`.
    Decimal(Decimal),
    /// `String`.
    String(String),
    /// `FixedString(N)`, the raw N-byte slice (NUL padding preserved).
    FixedString(Vec<u8>),
    /// `Date`: days since the Unix epoch.
    Date(chrono::NaiveDate),
    /// `Date32`: days since the Unix epoch, signed (can precede 1970).
    Date32(chrono::NaiveDate),
    /// `DateTime[(tz)]`: UTC instant at second resolution.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// `DateTime64(p[, tz])`: UTC instant at `10^-p` second resolution.
    DateTime64(chrono::DateTime<chrono::Utc>),
    /// `Enum8`/`Enum16`, decoded to its symbolic name.
    Enum(String),
    /// `UUID`.
    Uuid(Uuid),
    /// `IPv4`.
    Ipv4(Ipv4Addr),
    /// `IPv6`.
    Ipv6(Ipv6Addr),
    /// `Array(T)`.
    Array(Vec<Value>),
    /// `Interval*`: the raw tick count; the unit lives in the type descriptor.
    Interval(i64),
}

impl Value {
    /// `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as a string, if it holds `String`/`Enum`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as an `i64`, widening any integer variant that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int8(v) => Some(i64::from(v)),
            Self::Int16(v) => Some(i64::from(v)),
            Self::Int32(v) => Some(i64::from(v)),
            Self::Int64(v) => Some(v),
            Self::UInt8(v) => Some(i64::from(v)),
            Self::UInt16(v) => Some(i64::from(v)),
            Self::UInt32(v) => Some(i64::from(v)),
            Self::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The type name this value would decode as, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::UInt8(_) => "UInt8",
            Self::UInt16(_) => "UInt16",
            Self::UInt32(_) => "UInt32",
            Self::UInt64(_) => "UInt64",
            Self::UInt128(_) => "UInt128",
            Self::UInt256(_) => "UInt256",
            Self::Int8(_) => "Int8",
            Self::Int16(_) => "Int16",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::Int128(_) => "Int128",
            Self::Int256(_) => "Int256",
            Self::Float32(_) => "Float32",
            Self::Float64(_) => "Float64",
            Self::BFloat16(_) => "BFloat16",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::FixedString(_) => "FixedString",
            Self::Date(_) => "Date",
            Self::Date32(_) => "Date32",
            Self::DateTime(_) => "DateTime",
            Self::DateTime64(_) => "DateTime64",
            Self::Enum(_) => "Enum",
            Self::Uuid(_) => "UUID",
            Self::Ipv4(_) => "IPv4",
            Self::Ipv6(_) => "IPv6",
            Self::Array(_) => "Array",
            Self::Interval(_) => "Interval",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::UInt8(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
