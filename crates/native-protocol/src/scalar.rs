//! Read/write/skip implementations for every scalar Native type.

use std::io::{Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::codec::ColumnCodec;
use crate::descriptor::{IntervalUnit, TypeDescriptor};
use crate::error::ProtocolError;
use crate::value::Value;
use crate::varint::{read_varint, write_varint};

/// Unix epoch, the origin both `Date`/`Date32` day counts and
/// `DateTime`/`DateTime64` tick counts are measured from.
fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().expect("epoch is representable")
}

fn epoch_date() -> NaiveDate {
    epoch().date_naive()
}

/// A codec for every scalar [`TypeDescriptor`] variant; composites dispatch
/// into [`crate::composite`] and never reach here.
pub(crate) struct ScalarCodec {
    descriptor: TypeDescriptor,
}

pub(crate) fn scalar_codec_for(
    descriptor: &TypeDescriptor,
) -> Result<Box<dyn ColumnCodec>, ProtocolError> {
    match descriptor {
        TypeDescriptor::Array(_) | TypeDescriptor::Nullable(_) | TypeDescriptor::LowCardinality(_) => {
            Err(ProtocolError::UnknownType(
                "composite type reached scalar dispatch".to_owned(),
            ))
        }
        other => Ok(Box::new(ScalarCodec {
            descriptor: other.clone(),
        })),
    }
}

impl ColumnCodec for ScalarCodec {
    fn read_column(
        &self,
        reader: &mut dyn Read,
        num_rows: u64,
    ) -> Result<Vec<Value>, ProtocolError> {
        let mut out = Vec::with_capacity(usize::try_from(num_rows).unwrap_or(0));
        for _ in 0..num_rows {
            out.push(read_scalar(&self.descriptor, reader)?);
        }
        Ok(out)
    }

    fn write_column(&self, writer: &mut dyn Write, values: &[Value]) -> Result<(), ProtocolError> {
        for value in values {
            write_scalar(&self.descriptor, writer, value)?;
        }
        Ok(())
    }

    fn skip_column(&self, reader: &mut dyn Read, num_rows: u64) -> Result<(), ProtocolError> {
        for _ in 0..num_rows {
            skip_scalar(&self.descriptor, reader)?;
        }
        Ok(())
    }
}

fn read_exact(reader: &mut dyn Read, buf: &mut [u8]) -> Result<(), ProtocolError> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::TruncatedBlock {
                expected: buf.len(),
                actual: 0,
            }
        } else {
            ProtocolError::Io(err)
        }
    })
}

fn skip_bytes(reader: &mut dyn Read, n: usize) -> Result<(), ProtocolError> {
    let mut buf = vec![0u8; n];
    read_exact(reader, &mut buf)
}

/// Width in bytes of `Decimal(P, S)`'s underlying signed integer.
fn decimal_width(precision: u32) -> Result<usize, ProtocolError> {
    match precision {
        1..=9 => Ok(4),
        10..=18 => Ok(8),
        19..=38 => Ok(16),
        39..=76 => Ok(32),
        _ => Err(ProtocolError::PrecisionOutOfRange(format!(
            "Decimal precision {precision} outside [1, 76]"
        ))),
    }
}

fn read_scalar(descriptor: &TypeDescriptor, reader: &mut dyn Read) -> Result<Value, ProtocolError> {
    use TypeDescriptor as T;
    Ok(match descriptor {
        T::UInt8 => {
            let mut b = [0u8; 1];
            read_exact(reader, &mut b)?;
            Value::UInt8(b[0])
        }
        T::Int8 => {
            let mut b = [0u8; 1];
            read_exact(reader, &mut b)?;
            Value::Int8(b[0] as i8)
        }
        T::Bool => {
            let mut b = [0u8; 1];
            read_exact(reader, &mut b)?;
            Value::Bool(b[0] != 0)
        }
        T::UInt16 => {
            let mut b = [0u8; 2];
            read_exact(reader, &mut b)?;
            Value::UInt16(u16::from_le_bytes(b))
        }
        T::Int16 => {
            let mut b = [0u8; 2];
            read_exact(reader, &mut b)?;
            Value::Int16(i16::from_le_bytes(b))
        }
        T::UInt32 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            Value::UInt32(u32::from_le_bytes(b))
        }
        T::Int32 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            Value::Int32(i32::from_le_bytes(b))
        }
        T::UInt64 => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            Value::UInt64(u64::from_le_bytes(b))
        }
        T::Int64 => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            Value::Int64(i64::from_le_bytes(b))
        }
        T::UInt128 => {
            let mut b = [0u8; 16];
            read_exact(reader, &mut b)?;
            Value::UInt128(u128::from_le_bytes(b))
        }
        T::Int128 => {
            let mut b = [0u8; 16];
            read_exact(reader, &mut b)?;
            Value::Int128(i128::from_le_bytes(b))
        }
        T::UInt256 => {
            let mut b = [0u8; 32];
            read_exact(reader, &mut b)?;
            Value::UInt256(b)
        }
        T::Int256 => {
            let mut b = [0u8; 32];
            read_exact(reader, &mut b)?;
            Value::Int256(b)
        }
        T::Float32 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            Value::Float32(f32::from_le_bytes(b))
        }
        T::Float64 => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            Value::Float64(f64::from_le_bytes(b))
        }
        T::BFloat16 => {
            let mut b = [0u8; 2];
            read_exact(reader, &mut b)?;
            let bits = u16::from_le_bytes(b);
            Value::BFloat16(f32::from_bits(u32::from(bits) << 16))
        }
        T::Decimal { precision, scale } => {
            let width = decimal_width(*precision)?;
            let raw = read_signed_of_width(reader, width)?;
            let scale_i32 = i32::try_from(*scale)
                .map_err(|_| ProtocolError::PrecisionOutOfRange(format!("scale {scale}")))?;
            if *scale > 28 {
                return Err(ProtocolError::PrecisionOutOfRange(format!(
                    "Decimal scale {scale} exceeds 28"
                )));
            }
            Value::Decimal(Decimal::from_i128_with_scale(raw, scale_i32 as u32))
        }
        T::String => {
            let len = read_varint(reader)? as usize;
            if len == 0 {
                Value::String(String::new())
            } else {
                let mut buf = vec![0u8; len];
                read_exact(reader, &mut buf)?;
                Value::String(
                    String::from_utf8(buf)
                        .map_err(|err| ProtocolError::StringEncoding(err.to_string()))?,
                )
            }
        }
        T::FixedString(n) => {
            let mut buf = vec![0u8; *n];
            read_exact(reader, &mut buf)?;
            Value::FixedString(buf)
        }
        T::Date => {
            let mut b = [0u8; 2];
            read_exact(reader, &mut b)?;
            let days = u16::from_le_bytes(b);
            Value::Date(epoch_date() + chrono::Duration::days(i64::from(days)))
        }
        T::Date32 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            let days = i32::from_le_bytes(b);
            Value::Date32(epoch_date() + chrono::Duration::days(i64::from(days)))
        }
        T::DateTime { tz } => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            let seconds = i32::from_le_bytes(b);
            let instant = epoch() + chrono::Duration::seconds(i64::from(seconds));
            let _ = tz;
            Value::DateTime(instant)
        }
        T::DateTime64 { precision, tz } => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            let ticks = i64::from_le_bytes(b);
            let scale = 10i64.pow(*precision);
            let seconds = ticks.div_euclid(scale);
            let remainder_ticks = ticks.rem_euclid(scale);
            let nanos = remainder_ticks * 10i64.pow(9 - (*precision).min(9));
            let instant = epoch()
                + chrono::Duration::seconds(seconds)
                + chrono::Duration::nanoseconds(nanos);
            let _ = tz;
            Value::DateTime64(instant)
        }
        T::Enum8(pairs) => {
            let mut b = [0u8; 1];
            read_exact(reader, &mut b)?;
            let code = b[0] as i8;
            let name = pairs
                .iter()
                .find(|(_, c)| *c == code)
                .map(|(n, _)| n.clone())
                .ok_or_else(|| {
                    ProtocolError::InvalidEnumDescriptor(format!("unknown Enum8 code {code}"))
                })?;
            Value::Enum(name)
        }
        T::Enum16(pairs) => {
            let mut b = [0u8; 2];
            read_exact(reader, &mut b)?;
            let code = i16::from_le_bytes(b);
            let name = pairs
                .iter()
                .find(|(_, c)| *c == code)
                .map(|(n, _)| n.clone())
                .ok_or_else(|| {
                    ProtocolError::InvalidEnumDescriptor(format!("unknown Enum16 code {code}"))
                })?;
            Value::Enum(name)
        }
        T::Uuid => {
            let mut b = [0u8; 16];
            read_exact(reader, &mut b)?;
            let mut bytes = [0u8; 16];
            bytes[0..8].copy_from_slice(&b[0..8]);
            bytes[0..8].reverse();
            bytes[8..16].copy_from_slice(&b[8..16]);
            bytes[8..16].reverse();
            Value::Uuid(Uuid::from_bytes(bytes))
        }
        T::Ipv4 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            b.reverse();
            Value::Ipv4(Ipv4Addr::from(b))
        }
        T::Ipv6 => {
            let mut b = [0u8; 16];
            read_exact(reader, &mut b)?;
            Value::Ipv6(Ipv6Addr::from(b))
        }
        T::Nothing => {
            skip_bytes(reader, 1)?;
            Value::Null
        }
        T::Interval(_) => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            Value::Interval(i64::from_le_bytes(b))
        }
        T::Array(_) | T::Nullable(_) | T::LowCardinality(_) => unreachable!(
            "composite descriptors are dispatched by native_protocol::codec before reaching scalar::read_scalar"
        ),
    })
}

fn write_scalar(
    descriptor: &TypeDescriptor,
    writer: &mut dyn Write,
    value: &Value,
) -> Result<(), ProtocolError> {
    use TypeDescriptor as T;
    match descriptor {
        T::UInt8 => writer.write_all(&[expect_u8(value)?])?,
        T::Int8 => writer.write_all(&[expect_i8(value)? as u8])?,
        T::Bool => writer.write_all(&[u8::from(expect_bool(value)?)])?,
        T::UInt16 => writer.write_all(&expect_u16(value)?.to_le_bytes())?,
        T::Int16 => writer.write_all(&expect_i16(value)?.to_le_bytes())?,
        T::UInt32 => writer.write_all(&expect_u32(value)?.to_le_bytes())?,
        T::Int32 => writer.write_all(&expect_i32(value)?.to_le_bytes())?,
        T::UInt64 => writer.write_all(&expect_u64(value)?.to_le_bytes())?,
        T::Int64 => writer.write_all(&expect_i64(value)?.to_le_bytes())?,
        T::UInt128 => writer.write_all(&expect_u128(value)?.to_le_bytes())?,
        T::Int128 => writer.write_all(&expect_i128(value)?.to_le_bytes())?,
        T::UInt256 => writer.write_all(&expect_u256(value)?)?,
        T::Int256 => writer.write_all(&expect_i256(value)?)?,
        T::Float32 => writer.write_all(&expect_f32(value)?.to_le_bytes())?,
        T::Float64 => writer.write_all(&expect_f64(value)?.to_le_bytes())?,
        T::BFloat16 => {
            let f = expect_bfloat16(value)?;
            let bits = (f.to_bits() >> 16) as u16;
            writer.write_all(&bits.to_le_bytes())?;
        }
        T::Decimal { precision, scale } => {
            let width = decimal_width(*precision)?;
            let dec = expect_decimal(value)?;
            let rescaled = dec.round_dp_with_strategy(*scale, RoundingStrategy::ToZero);
            let raw: i128 = rescaled.mantissa();
            write_signed_of_width(writer, width, raw)?;
        }
        T::String => {
            let s = expect_str(value)?;
            let bytes = s.as_bytes();
            write_varint(bytes.len() as u64, writer)?;
            if !bytes.is_empty() {
                writer.write_all(bytes)?;
            }
        }
        T::FixedString(n) => {
            let bytes = expect_fixed_string(value)?;
            if bytes.len() > *n {
                return Err(ProtocolError::ValueOutOfRange {
                    type_name: "FixedString",
                    detail: format!("value of {} bytes exceeds N={n}", bytes.len()),
                });
            }
            let mut padded = vec![0u8; *n];
            padded[..bytes.len()].copy_from_slice(&bytes);
            writer.write_all(&padded)?;
        }
        T::Date => {
            let d = expect_date(value)?;
            let days = (d - epoch_date()).num_days();
            let days = u16::try_from(days).map_err(|_| ProtocolError::ValueOutOfRange {
                type_name: "Date",
                detail: format!("{days} days out of range"),
            })?;
            writer.write_all(&days.to_le_bytes())?;
        }
        T::Date32 => {
            let d = expect_date32(value)?;
            let days = (d - epoch_date()).num_days();
            let days = i32::try_from(days).map_err(|_| ProtocolError::ValueOutOfRange {
                type_name: "Date32",
                detail: format!("{days} days out of range"),
            })?;
            writer.write_all(&days.to_le_bytes())?;
        }
        T::DateTime { .. } => {
            let dt = expect_datetime(value)?;
            let seconds = dt.signed_duration_since(epoch()).num_seconds();
            let seconds = i32::try_from(seconds).map_err(|_| ProtocolError::ValueOutOfRange {
                type_name: "DateTime",
                detail: format!("{seconds} seconds out of range"),
            })?;
            writer.write_all(&seconds.to_le_bytes())?;
        }
        T::DateTime64 { precision, .. } => {
            let dt = expect_datetime(value)?;
            let delta = dt.signed_duration_since(epoch());
            let scale = 10i64.pow(*precision);
            let nanos_per_tick = 10i64.pow(9 - (*precision).min(9));
            let ticks = delta.num_seconds() * scale
                + (delta.subsec_nanos() as i64).div_euclid(nanos_per_tick.max(1));
            writer.write_all(&ticks.to_le_bytes())?;
        }
        T::Enum8(pairs) => {
            let code = enum_code(value, pairs)?;
            writer.write_all(&[code as u8])?;
        }
        T::Enum16(pairs) => {
            let code = enum_code(value, pairs)?;
            writer.write_all(&code.to_le_bytes())?;
        }
        T::Uuid => {
            let uuid = expect_uuid(value)?;
            let b = uuid.into_bytes();
            let mut wire = [0u8; 16];
            wire[0..8].copy_from_slice(&b[0..8]);
            wire[0..8].reverse();
            wire[8..16].copy_from_slice(&b[8..16]);
            wire[8..16].reverse();
            writer.write_all(&wire)?;
        }
        T::Ipv4 => {
            let ip = expect_ipv4(value)?;
            let mut b = ip.octets();
            b.reverse();
            writer.write_all(&b)?;
        }
        T::Ipv6 => {
            let ip = expect_ipv6(value)?;
            writer.write_all(&ip.octets())?;
        }
        T::Nothing => writer.write_all(b"0")?,
        T::Interval(_) => {
            let ticks = expect_interval(value)?;
            writer.write_all(&ticks.to_le_bytes())?;
        }
        T::Array(_) | T::Nullable(_) | T::LowCardinality(_) => unreachable!(
            "composite descriptors are dispatched by native_protocol::codec before reaching scalar::write_scalar"
        ),
    }
    Ok(())
}

fn skip_scalar(descriptor: &TypeDescriptor, reader: &mut dyn Read) -> Result<(), ProtocolError> {
    use TypeDescriptor as T;
    match descriptor {
        T::UInt8 | T::Int8 | T::Bool => skip_bytes(reader, 1),
        T::UInt16 | T::Int16 | T::Date | T::Enum16(_) => skip_bytes(reader, 2),
        T::UInt32 | T::Int32 | T::Float32 | T::Date32 | T::DateTime { .. } | T::Ipv4 => {
            skip_bytes(reader, 4)
        }
        T::UInt64 | T::Int64 | T::Float64 | T::DateTime64 { .. } | T::Interval(_) => {
            skip_bytes(reader, 8)
        }
        T::UInt128 | T::Int128 | T::Uuid | T::Ipv6 => skip_bytes(reader, 16),
        T::UInt256 | T::Int256 => skip_bytes(reader, 32),
        T::BFloat16 => skip_bytes(reader, 2),
        T::Enum8(_) => skip_bytes(reader, 1),
        T::Decimal { precision, .. } => skip_bytes(reader, decimal_width(*precision)?),
        T::String => {
            let len = read_varint(reader)? as usize;
            skip_bytes(reader, len)
        }
        T::FixedString(n) => skip_bytes(reader, *n),
        T::Nothing => skip_bytes(reader, 1),
        T::Array(_) | T::Nullable(_) | T::LowCardinality(_) => unreachable!(
            "composite descriptors are dispatched by native_protocol::codec before reaching scalar::skip_scalar"
        ),
    }
}

fn read_signed_of_width(reader: &mut dyn Read, width: usize) -> Result<i128, ProtocolError> {
    match width {
        4 => {
            let mut b = [0u8; 4];
            read_exact(reader, &mut b)?;
            Ok(i128::from(i32::from_le_bytes(b)))
        }
        8 => {
            let mut b = [0u8; 8];
            read_exact(reader, &mut b)?;
            Ok(i128::from(i64::from_le_bytes(b)))
        }
        16 => {
            let mut b = [0u8; 16];
            read_exact(reader, &mut b)?;
            Ok(i128::from_le_bytes(b))
        }
        32 => {
            let mut b = [0u8; 32];
            read_exact(reader, &mut b)?;
            let negative = b[31] & 0x80 != 0;
            let sentinel = if negative { 0xff } else { 0x00 };
            if b[16..32].iter().any(|&byte| byte != sentinel) {
                return Err(ProtocolError::ValueOutOfRange {
                    type_name: "Decimal",
                    detail: "Decimal256 value exceeds i128 representable range".to_owned(),
                });
            }
            let mut low = [0u8; 16];
            low.copy_from_slice(&b[0..16]);
            Ok(i128::from_le_bytes(low))
        }
        _ => unreachable!("decimal_width only returns 4, 8, 16, or 32"),
    }
}

fn write_signed_of_width(
    writer: &mut dyn Write,
    width: usize,
    raw: i128,
) -> Result<(), ProtocolError> {
    match width {
        4 => {
            let v = i32::try_from(raw).map_err(|_| ProtocolError::ValueOutOfRange {
                type_name: "Decimal",
                detail: format!("{raw} does not fit Int32"),
            })?;
            writer.write_all(&v.to_le_bytes())?;
        }
        8 => {
            let v = i64::try_from(raw).map_err(|_| ProtocolError::ValueOutOfRange {
                type_name: "Decimal",
                detail: format!("{raw} does not fit Int64"),
            })?;
            writer.write_all(&v.to_le_bytes())?;
        }
        16 => writer.write_all(&raw.to_le_bytes())?,
        32 => {
            let mut out = [if raw < 0 { 0xffu8 } else { 0x00 }; 32];
            out[0..16].copy_from_slice(&raw.to_le_bytes());
            writer.write_all(&out)?;
        }
        _ => unreachable!("decimal_width only returns 4, 8, 16, or 32"),
    }
    Ok(())
}

fn expect_u8(v: &Value) -> Result<u8, ProtocolError> {
    match v {
        Value::UInt8(x) => Ok(*x),
        _ => Err(mismatch("UInt8", v)),
    }
}
fn expect_i8(v: &Value) -> Result<i8, ProtocolError> {
    match v {
        Value::Int8(x) => Ok(*x),
        _ => Err(mismatch("Int8", v)),
    }
}
fn expect_bool(v: &Value) -> Result<bool, ProtocolError> {
    match v {
        Value::Bool(x) => Ok(*x),
        _ => Err(mismatch("Bool", v)),
    }
}
fn expect_u16(v: &Value) -> Result<u16, ProtocolError> {
    match v {
        Value::UInt16(x) => Ok(*x),
        _ => Err(mismatch("UInt16", v)),
    }
}
fn expect_i16(v: &Value) -> Result<i16, ProtocolError> {
    match v {
        Value::Int16(x) => Ok(*x),
        _ => Err(mismatch("Int16", v)),
    }
}
fn expect_u32(v: &Value) -> Result<u32, ProtocolError> {
    match v {
        Value::UInt32(x) => Ok(*x),
        _ => Err(mismatch("UInt32", v)),
    }
}
fn expect_i32(v: &Value) -> Result<i32, ProtocolError> {
    match v {
        Value::Int32(x) => Ok(*x),
        _ => Err(mismatch("Int32", v)),
    }
}
fn expect_u64(v: &Value) -> Result<u64, ProtocolError> {
    match v {
        Value::UInt64(x) => Ok(*x),
        _ => Err(mismatch("UInt64", v)),
    }
}
fn expect_i64(v: &Value) -> Result<i64, ProtocolError> {
    match v {
        Value::Int64(x) => Ok(*x),
        _ => Err(mismatch("Int64", v)),
    }
}
fn expect_u128(v: &Value) -> Result<u128, ProtocolError> {
    match v {
        Value::UInt128(x) => Ok(*x),
        _ => Err(mismatch("UInt128", v)),
    }
}
fn expect_i128(v: &Value) -> Result<i128, ProtocolError> {
    match v {
        Value::Int128(x) => Ok(*x),
        _ => Err(mismatch("Int128", v)),
    }
}
fn expect_u256(v: &Value) -> Result<[u8; 32], ProtocolError> {
    match v {
        Value::UInt256(x) => Ok(*x),
        _ => Err(mismatch("UInt256", v)),
    }
}
fn expect_i256(v: &Value) -> Result<[u8; 32], ProtocolError> {
    match v {
        Value::Int256(x) => Ok(*x),
        _ => Err(mismatch("Int256", v)),
    }
}
fn expect_f32(v: &Value) -> Result<f32, ProtocolError> {
    match v {
        Value::Float32(x) => Ok(*x),
        _ => Err(mismatch("Float32", v)),
    }
}
fn expect_f64(v: &Value) -> Result<f64, ProtocolError> {
    match v {
        Value::Float64(x) => Ok(*x),
        _ => Err(mismatch("Float64", v)),
    }
}
fn expect_bfloat16(v: &Value) -> Result<f32, ProtocolError> {
    match v {
        Value::BFloat16(x) => Ok(*x),
        _ => Err(mismatch("BFloat16", v)),
    }
}
fn expect_decimal(v: &Value) -> Result<Decimal, ProtocolError> {
    match v {
        Value::Decimal(x) => Ok(*x),
        _ => Err(mismatch("Decimal", v)),
    }
}
fn expect_str(v: &Value) -> Result<&str, ProtocolError> {
    match v {
        Value::String(x) => Ok(x.as_str()),
        _ => Err(mismatch("String", v)),
    }
}
fn expect_fixed_string(v: &Value) -> Result<Vec<u8>, ProtocolError> {
    match v {
        Value::FixedString(x) => Ok(x.clone()),
        Value::String(x) => Ok(x.clone().into_bytes()),
        _ => Err(mismatch("FixedString", v)),
    }
}
fn expect_date(v: &Value) -> Result<NaiveDate, ProtocolError> {
    match v {
        Value::Date(x) => Ok(*x),
        _ => Err(mismatch("Date", v)),
    }
}
fn expect_date32(v: &Value) -> Result<NaiveDate, ProtocolError> {
    match v {
        Value::Date32(x) => Ok(*x),
        Value::Date(x) => Ok(*x),
        _ => Err(mismatch("Date32", v)),
    }
}
fn expect_datetime(v: &Value) -> Result<DateTime<Utc>, ProtocolError> {
    match v {
        Value::DateTime(x) | Value::DateTime64(x) => Ok(*x),
        _ => Err(mismatch("DateTime", v)),
    }
}
fn expect_enum_name(v: &Value) -> Result<&str, ProtocolError> {
    match v {
        Value::Enum(x) | Value::String(x) => Ok(x.as_str()),
        _ => Err(mismatch("Enum", v)),
    }
}

/// Resolve the wire code to write for an `Enum8`/`Enum16` column: a
/// name-bearing value (`Value::Enum`/`Value::String`) is looked up in
/// `pairs`, while any integer-bearing value is taken as the code directly,
/// provided it matches one of `pairs`.
fn enum_code<C>(v: &Value, pairs: &[(String, C)]) -> Result<C, ProtocolError>
where
    C: Copy + Into<i64>,
{
    if let Some(code) = v.as_i64() {
        return pairs
            .iter()
            .find(|(_, c)| i64::from(*c) == code)
            .map(|(_, c)| *c)
            .ok_or_else(|| ProtocolError::InvalidEnumDescriptor(format!("unknown code {code}")));
    }
    let name = expect_enum_name(v)?;
    pairs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| *c)
        .ok_or_else(|| ProtocolError::InvalidEnumDescriptor(format!("unknown name {name}")))
}
fn expect_uuid(v: &Value) -> Result<Uuid, ProtocolError> {
    match v {
        Value::Uuid(x) => Ok(*x),
        _ => Err(mismatch("UUID", v)),
    }
}
fn expect_ipv4(v: &Value) -> Result<Ipv4Addr, ProtocolError> {
    match v {
        Value::Ipv4(x) => Ok(*x),
        _ => Err(mismatch("IPv4", v)),
    }
}
fn expect_ipv6(v: &Value) -> Result<Ipv6Addr, ProtocolError> {
    match v {
        Value::Ipv6(x) => Ok(*x),
        _ => Err(mismatch("IPv6", v)),
    }
}
fn expect_interval(v: &Value) -> Result<i64, ProtocolError> {
    match v {
        Value::Interval(x) => Ok(*x),
        Value::Int64(x) => Ok(*x),
        _ => Err(mismatch("Interval", v)),
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> ProtocolError {
    ProtocolError::TypeMismatch {
        expected,
        actual: actual.type_name().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(descriptor: TypeDescriptor, value: Value) {
        let mut buf = Vec::new();
        write_scalar(&descriptor, &mut buf, &value).unwrap();
        let mut cursor = buf.as_slice();
        let decoded = read_scalar(&descriptor, &mut cursor).unwrap();
        assert_eq!(decoded, value);
        assert!(cursor.is_empty());
    }

    #[test]
    fn integers_roundtrip() {
        roundtrip(TypeDescriptor::UInt8, Value::UInt8(250));
        roundtrip(TypeDescriptor::Int8, Value::Int8(-100));
        roundtrip(TypeDescriptor::UInt64, Value::UInt64(u64::MAX));
        roundtrip(TypeDescriptor::Int64, Value::Int64(i64::MIN));
        roundtrip(TypeDescriptor::UInt256, Value::UInt256([7u8; 32]));
    }

    #[test]
    fn bool_and_nothing() {
        roundtrip(TypeDescriptor::Bool, Value::Bool(true));
        let mut buf = Vec::new();
        write_scalar(&TypeDescriptor::Nothing, &mut buf, &Value::Null).unwrap();
        assert_eq!(buf, b"0");
    }

    #[test]
    fn float_and_bfloat16() {
        roundtrip(TypeDescriptor::Float64, Value::Float64(3.5));
        // BFloat16 only preserves the top 16 bits of the f32 mantissa.
        let mut buf = Vec::new();
        write_scalar(&TypeDescriptor::BFloat16, &mut buf, &Value::BFloat16(1.0)).unwrap();
        let mut cursor = buf.as_slice();
        let decoded = read_scalar(&TypeDescriptor::BFloat16, &mut cursor).unwrap();
        assert_eq!(decoded, Value::BFloat16(1.0));
    }

    #[test]
    fn string_roundtrip() {
        roundtrip(TypeDescriptor::String, Value::String("hello".to_owned()));
        roundtrip(TypeDescriptor::String, Value::String(String::new()));
    }

    #[test]
    fn fixed_string_pads_with_nul() {
        let mut buf = Vec::new();
        write_scalar(
            &TypeDescriptor::FixedString(4),
            &mut buf,
            &Value::FixedString(b"ab".to_vec()),
        )
        .unwrap();
        assert_eq!(buf, vec![b'a', b'b', 0, 0]);
    }

    #[test]
    fn fixed_string_overflow_errors() {
        let mut buf = Vec::new();
        let err = write_scalar(
            &TypeDescriptor::FixedString(2),
            &mut buf,
            &Value::FixedString(b"abc".to_vec()),
        );
        assert!(matches!(err, Err(ProtocolError::ValueOutOfRange { .. })));
    }

    #[test]
    fn date_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        roundtrip(TypeDescriptor::Date, Value::Date(d));
    }

    #[test]
    fn datetime_roundtrip() {
        let dt = epoch() + chrono::Duration::seconds(1_700_000_000);
        roundtrip(TypeDescriptor::DateTime { tz: None }, Value::DateTime(dt));
    }

    #[test]
    fn datetime64_roundtrip_at_millisecond_precision() {
        let dt = epoch() + chrono::Duration::seconds(10) + chrono::Duration::milliseconds(250);
        roundtrip(
            TypeDescriptor::DateTime64 {
                precision: 3,
                tz: None,
            },
            Value::DateTime64(dt),
        );
    }

    #[test]
    fn decimal_roundtrip() {
        roundtrip(
            TypeDescriptor::Decimal {
                precision: 18,
                scale: 4,
            },
            Value::Decimal(Decimal::new(123_456, 4)),
        );
    }

    #[test]
    fn enum8_roundtrip() {
        let descriptor = TypeDescriptor::Enum8(vec![("a".to_owned(), 1), ("b".to_owned(), -2)]);
        roundtrip(descriptor, Value::Enum("b".to_owned()));
    }

    #[test]
    fn enum8_write_accepts_raw_code_as_well_as_name() {
        let descriptor = TypeDescriptor::Enum8(vec![("a".to_owned(), 1), ("b".to_owned(), -2)]);
        let mut buf = Vec::new();
        write_scalar(&descriptor, &mut buf, &Value::Int8(-2)).unwrap();
        let mut by_name = Vec::new();
        write_scalar(&descriptor, &mut by_name, &Value::Enum("b".to_owned())).unwrap();
        assert_eq!(buf, by_name);

        let mut cursor = buf.as_slice();
        let decoded = read_scalar(&descriptor, &mut cursor).unwrap();
        assert_eq!(decoded, Value::Enum("b".to_owned()));
    }

    #[test]
    fn enum8_write_rejects_unknown_code() {
        let descriptor = TypeDescriptor::Enum8(vec![("a".to_owned(), 1), ("b".to_owned(), -2)]);
        let mut buf = Vec::new();
        let err = write_scalar(&descriptor, &mut buf, &Value::Int8(9)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEnumDescriptor(_)));
    }

    #[test]
    fn uuid_roundtrip() {
        let uuid = Uuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479").unwrap();
        roundtrip(TypeDescriptor::Uuid, Value::Uuid(uuid));
    }

    #[test]
    fn uuid_wire_bytes_are_half_swapped() {
        let uuid = Uuid::parse_str("00010203-0405-0607-0809-0a0b0c0d0e0f").unwrap();
        let mut buf = Vec::new();
        write_scalar(&TypeDescriptor::Uuid, &mut buf, &Value::Uuid(uuid)).unwrap();
        assert_eq!(
            buf,
            vec![
                0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x00, 0x0f, 0x0e, 0x0d, 0x0c, 0x0b,
                0x0a, 0x09, 0x08,
            ]
        );
    }

    #[test]
    fn ipv4_roundtrip() {
        let ip = Ipv4Addr::new(192, 168, 0, 1);
        roundtrip(TypeDescriptor::Ipv4, Value::Ipv4(ip));
    }

    #[test]
    fn ipv6_roundtrip() {
        let ip = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        roundtrip(TypeDescriptor::Ipv6, Value::Ipv6(ip));
    }

    #[test]
    fn interval_roundtrip() {
        roundtrip(
            TypeDescriptor::Interval(IntervalUnit::Day),
            Value::Interval(5),
        );
    }
}
