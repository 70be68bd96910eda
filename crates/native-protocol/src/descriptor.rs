//! Parsing of textual Native type descriptors (`Name` or `Name(args)`) into
//! a [`TypeDescriptor`] tree.

use crate::error::ProtocolError;

/// A parsed Native type descriptor.
///
/// Scalar variants carry no payload beyond their own name; parametric and
/// composite variants carry their parsed arguments. [`TypeDescriptor::parse`]
/// builds one of these from the wire's type-name string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    Float32,
    Float64,
    BFloat16,
    Bool,
    Decimal { precision: u32, scale: u32 },
    String,
    FixedString(usize),
    Date,
    Date32,
    DateTime { tz: Option<String> },
    DateTime64 { precision: u32, tz: Option<String> },
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    Uuid,
    Ipv4,
    Ipv6,
    Nothing,
    Interval(IntervalUnit),
    Array(Box<TypeDescriptor>),
    Nullable(Box<TypeDescriptor>),
    LowCardinality(Box<TypeDescriptor>),
}

/// The unit of an `Interval*` type, carried for display purposes only; the
/// wire representation is always an `i64` tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl IntervalUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "Nanosecond" => Self::Nanosecond,
            "Microsecond" => Self::Microsecond,
            "Millisecond" => Self::Millisecond,
            "Second" => Self::Second,
            "Minute" => Self::Minute,
            "Hour" => Self::Hour,
            "Day" => Self::Day,
            "Week" => Self::Week,
            "Month" => Self::Month,
            "Quarter" => Self::Quarter,
            "Year" => Self::Year,
            _ => return None,
        })
    }
}

impl TypeDescriptor {
    /// Parse a wire type-name string (e.g. `"Array(Nullable(String))"`, `"Decimal(18, 4)"`).
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let input = input.trim();
        let (head, args) = split_head_args(input)?;

        match head {
            "UInt8" => Ok(Self::UInt8),
            "UInt16" => Ok(Self::UInt16),
            "UInt32" => Ok(Self::UInt32),
            "UInt64" => Ok(Self::UInt64),
            "UInt128" => Ok(Self::UInt128),
            "UInt256" => Ok(Self::UInt256),
            "Int8" => Ok(Self::Int8),
            "Int16" => Ok(Self::Int16),
            "Int32" => Ok(Self::Int32),
            "Int64" => Ok(Self::Int64),
            "Int128" => Ok(Self::Int128),
            "Int256" => Ok(Self::Int256),
            "Float32" => Ok(Self::Float32),
            "Float64" => Ok(Self::Float64),
            "BFloat16" => Ok(Self::BFloat16),
            "Bool" => Ok(Self::Bool),
            "String" => Ok(Self::String),
            "Date" => Ok(Self::Date),
            "Date32" => Ok(Self::Date32),
            "UUID" => Ok(Self::Uuid),
            "IPv4" => Ok(Self::Ipv4),
            "IPv6" => Ok(Self::Ipv6),
            "Nothing" => Ok(Self::Nothing),

            "FixedString" => {
                let args = require_args(head, args)?;
                let n: usize = args
                    .trim()
                    .parse()
                    .map_err(|_| ProtocolError::InvalidTypeDescriptor(input.to_owned()))?;
                Ok(Self::FixedString(n))
            }

            "DateTime" => match args {
                None => Ok(Self::DateTime { tz: None }),
                Some(args) => Ok(Self::DateTime {
                    tz: Some(unquote(args.trim())),
                }),
            },

            "DateTime64" => parse_datetime64(args.unwrap_or("").trim(), input),

            "Decimal" => parse_decimal(require_args(head, args)?, input),

            "Enum8" => parse_enum8(require_args(head, args)?, input),
            "Enum16" => parse_enum16(require_args(head, args)?, input),

            "Array" => {
                let inner = TypeDescriptor::parse(require_args(head, args)?)?;
                Ok(Self::Array(Box::new(inner)))
            }
            "Nullable" => {
                let inner = TypeDescriptor::parse(require_args(head, args)?)?;
                Ok(Self::Nullable(Box::new(inner)))
            }
            "LowCardinality" => {
                let inner = TypeDescriptor::parse(require_args(head, args)?)?;
                Ok(Self::LowCardinality(Box::new(inner)))
            }

            "Interval" => {
                // Bare `Interval` never appears on the wire; ClickHouse always
                // sends `IntervalSecond`, `IntervalDay`, etc.
                Err(ProtocolError::UnknownType(input.to_owned()))
            }

            other if other.starts_with("Interval") => {
                let suffix = &other["Interval".len()..];
                IntervalUnit::from_suffix(suffix)
                    .map(Self::Interval)
                    .ok_or_else(|| ProtocolError::UnknownIntervalUnit(input.to_owned()))
            }

            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                Err(ProtocolError::UnsupportedType(input.to_owned()))
            }

            _ => Err(ProtocolError::UnknownType(input.to_owned())),
        }
    }
}

/// Split `Name` or `Name(args)` into its head identifier and the raw,
/// unparsed argument string (the inner text between the outermost matching
/// parens, not further split on commas).
fn split_head_args(input: &str) -> Result<(&str, Option<&str>), ProtocolError> {
    match input.find('(') {
        None => Ok((input, None)),
        Some(open) => {
            if !input.ends_with(')') {
                return Err(ProtocolError::InvalidTypeDescriptor(input.to_owned()));
            }
            let head = &input[..open];
            let args = &input[open + 1..input.len() - 1];
            Ok((head, Some(args)))
        }
    }
}

fn require_args<'a>(head: &str, args: Option<&'a str>) -> Result<&'a str, ProtocolError> {
    args.ok_or_else(|| ProtocolError::InvalidTypeDescriptor(head.to_owned()))
}

/// Split a comma-separated argument list at top level only, ignoring commas
/// nested inside parens or quotes (needed for e.g. `LowCardinality(Nullable(String))`
/// arguments reused elsewhere, and for enum lists with quoted names containing commas).
fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0usize;
    let bytes = input.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => depth -= 1,
            b',' if !in_quotes && depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].to_owned()
    } else {
        s.to_owned()
    }
}

fn parse_decimal(args: &str, input: &str) -> Result<TypeDescriptor, ProtocolError> {
    let parts = split_top_level_commas(args);
    if parts.len() != 2 {
        return Err(ProtocolError::InvalidTypeDescriptor(input.to_owned()));
    }
    let precision: u32 = parts[0]
        .parse()
        .map_err(|_| ProtocolError::InvalidTypeDescriptor(input.to_owned()))?;
    let scale: u32 = parts[1]
        .parse()
        .map_err(|_| ProtocolError::InvalidTypeDescriptor(input.to_owned()))?;
    if precision < 1 || precision > 76 {
        return Err(ProtocolError::PrecisionOutOfRange(format!(
            "Decimal precision {precision} outside [1, 76]"
        )));
    }
    Ok(TypeDescriptor::Decimal { precision, scale })
}

/// `DateTime64(p[, 'tz'])`: the first character is the precision digit; any
/// trailing quoted text past the comma is the timezone name.
fn parse_datetime64(args: &str, input: &str) -> Result<TypeDescriptor, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::InvalidTypeDescriptor(input.to_owned()));
    }
    let parts = split_top_level_commas(args);
    let precision: u32 = parts[0]
        .parse()
        .map_err(|_| ProtocolError::InvalidTypeDescriptor(input.to_owned()))?;
    if precision < 1 || precision > 8 {
        return Err(ProtocolError::PrecisionOutOfRange(format!(
            "DateTime64 precision {precision} outside [1, 8]"
        )));
    }
    let tz = parts.get(1).map(|s| unquote(s));
    Ok(TypeDescriptor::DateTime64 { precision, tz })
}

/// `Enum8('a' = 1, 'b' = 2, ...)`: tolerant scan for `'name' = code` pairs,
/// supporting negative codes and unquoted names.
fn parse_enum_pairs(args: &str, input: &str) -> Result<Vec<(String, i32)>, ProtocolError> {
    let mut pairs = Vec::new();
    for part in split_top_level_commas(args) {
        if part.is_empty() {
            continue;
        }
        let eq = part
            .rfind('=')
            .ok_or_else(|| ProtocolError::InvalidEnumDescriptor(input.to_owned()))?;
        let name = unquote(part[..eq].trim());
        let code: i32 = part[eq + 1..]
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidEnumDescriptor(input.to_owned()))?;
        pairs.push((name, code));
    }
    if pairs.is_empty() {
        return Err(ProtocolError::InvalidEnumDescriptor(input.to_owned()));
    }
    Ok(pairs)
}

fn parse_enum8(args: &str, input: &str) -> Result<TypeDescriptor, ProtocolError> {
    let pairs = parse_enum_pairs(args, input)?;
    let mut out = Vec::with_capacity(pairs.len());
    for (name, code) in pairs {
        let code = i8::try_from(code)
            .map_err(|_| ProtocolError::InvalidEnumDescriptor(input.to_owned()))?;
        out.push((name, code));
    }
    Ok(TypeDescriptor::Enum8(out))
}

fn parse_enum16(args: &str, input: &str) -> Result<TypeDescriptor, ProtocolError> {
    let pairs = parse_enum_pairs(args, input)?;
    let mut out = Vec::with_capacity(pairs.len());
    for (name, code) in pairs {
        let code = i16::try_from(code)
            .map_err(|_| ProtocolError::InvalidEnumDescriptor(input.to_owned()))?;
        out.push((name, code));
    }
    Ok(TypeDescriptor::Enum16(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names() {
        assert_eq!(TypeDescriptor::parse("UInt8").unwrap(), TypeDescriptor::UInt8);
        assert_eq!(TypeDescriptor::parse("String").unwrap(), TypeDescriptor::String);
        assert_eq!(TypeDescriptor::parse("Bool").unwrap(), TypeDescriptor::Bool);
    }

    #[test]
    fn fixed_string() {
        assert_eq!(
            TypeDescriptor::parse("FixedString(16)").unwrap(),
            TypeDescriptor::FixedString(16)
        );
    }

    #[test]
    fn nested_composites() {
        let parsed = TypeDescriptor::parse("Array(Nullable(String))").unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::Array(Box::new(TypeDescriptor::Nullable(Box::new(
                TypeDescriptor::String
            ))))
        );
    }

    #[test]
    fn low_cardinality() {
        let parsed = TypeDescriptor::parse("LowCardinality(String)").unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::LowCardinality(Box::new(TypeDescriptor::String))
        );
    }

    #[test]
    fn decimal_args() {
        assert_eq!(
            TypeDescriptor::parse("Decimal(18, 4)").unwrap(),
            TypeDescriptor::Decimal {
                precision: 18,
                scale: 4
            }
        );
    }

    #[test]
    fn decimal_precision_out_of_range() {
        assert!(matches!(
            TypeDescriptor::parse("Decimal(0, 0)"),
            Err(ProtocolError::PrecisionOutOfRange(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("Decimal(77, 0)"),
            Err(ProtocolError::PrecisionOutOfRange(_))
        ));
    }

    #[test]
    fn datetime_with_tz() {
        assert_eq!(
            TypeDescriptor::parse("DateTime('UTC')").unwrap(),
            TypeDescriptor::DateTime {
                tz: Some("UTC".to_owned())
            }
        );
        assert_eq!(
            TypeDescriptor::parse("DateTime").unwrap(),
            TypeDescriptor::DateTime { tz: None }
        );
    }

    #[test]
    fn datetime64_precision_and_tz() {
        assert_eq!(
            TypeDescriptor::parse("DateTime64(3, 'Europe/Moscow')").unwrap(),
            TypeDescriptor::DateTime64 {
                precision: 3,
                tz: Some("Europe/Moscow".to_owned())
            }
        );
        assert!(matches!(
            TypeDescriptor::parse("DateTime64(0)"),
            Err(ProtocolError::PrecisionOutOfRange(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("DateTime64(9)"),
            Err(ProtocolError::PrecisionOutOfRange(_))
        ));
    }

    #[test]
    fn enum8_pairs_with_negative_codes() {
        let parsed = TypeDescriptor::parse("Enum8('a' = -1, 'b' = 2)").unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::Enum8(vec![("a".to_owned(), -1), ("b".to_owned(), 2)])
        );
    }

    #[test]
    fn enum16_pairs() {
        let parsed = TypeDescriptor::parse("Enum16('x' = 1000, 'y' = -1000)").unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::Enum16(vec![("x".to_owned(), 1000), ("y".to_owned(), -1000)])
        );
    }

    #[test]
    fn interval_units() {
        assert_eq!(
            TypeDescriptor::parse("IntervalDay").unwrap(),
            TypeDescriptor::Interval(IntervalUnit::Day)
        );
        assert_eq!(
            TypeDescriptor::parse("IntervalNanosecond").unwrap(),
            TypeDescriptor::Interval(IntervalUnit::Nanosecond)
        );
    }

    #[test]
    fn unknown_type_errors() {
        assert!(matches!(
            TypeDescriptor::parse("NotAType"),
            Err(ProtocolError::UnknownType(_))
        ));
    }

    #[test]
    fn decimal_alias_unsupported() {
        assert!(matches!(
            TypeDescriptor::parse("Decimal32(4)"),
            Err(ProtocolError::UnsupportedType(_))
        ));
    }

    #[test]
    fn unbalanced_parens_invalid() {
        assert!(matches!(
            TypeDescriptor::parse("Array(String"),
            Err(ProtocolError::InvalidTypeDescriptor(_))
        ));
    }
}
