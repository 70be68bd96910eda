//! Derive a Native type descriptor from a column's observed values:
//! nullability, numeric range, string length uniformity, and timestamp
//! range all feed into picking the narrowest descriptor that covers them.

use chrono::{NaiveDate, TimeZone, Utc};
use native_protocol::Value;

use crate::error::TypeError;
use crate::table::Table;

/// Epoch-anchored bound for `Date`: 2149-06-06, ClickHouse's last
/// representable day in the 16-bit `Date` encoding.
fn date_upper_bound() -> NaiveDate {
    NaiveDate::from_ymd_opt(2149, 6, 6).expect("valid calendar date")
}

/// Epoch-anchored bound for `DateTime`: 2106-02-07T06:28:15 UTC, the last
/// second representable in a 32-bit Unix timestamp.
fn datetime_upper_bound() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2106, 2, 7, 6, 28, 15)
        .single()
        .expect("valid timestamp")
}

/// Fixed UTC-offset-to-IANA-name fallback used to pick a `DateTime64`
/// timezone when a value falls outside the plain `DateTime` range. Offsets
/// not covered here fall back to `UTC`.
const TZONES: &[(&str, &str)] = &[
    ("+00:00", "UTC"),
    ("+01:00", "Europe/Amsterdam"),
    ("+02:00", "Europe/Kaliningrad"),
    ("+03:00", "Europe/Moscow"),
    ("+03:30", "Asia/Tehran"),
    ("+04:00", "Europe/Samara"),
    ("+04:30", "Asia/Kabul"),
    ("+05:00", "Asia/Yekaterinburg"),
    ("+05:30", "Asia/Colombo"),
    ("+05:45", "Asia/Katmandu"),
    ("+06:00", "Asia/Omsk"),
    ("+06:30", "Asia/Yangon"),
    ("+07:00", "Asia/Krasnoyarsk"),
    ("+08:00", "Asia/Irkutsk"),
    ("+08:45", "Australia/Eucla"),
    ("+09:00", "Asia/Yakutsk"),
    ("+09:30", "Australia/Darwin"),
    ("+10:00", "Asia/Vladivostok"),
    ("+10:30", "Australia/Yancowinna"),
    ("+11:00", "Asia/Magadan"),
    ("+12:00", "Asia/Kamchatka"),
    ("+13:00", "Pacific/Enderbury"),
    ("+13:45", "Pacific/Chatham"),
    ("+14:00", "Pacific/Kiritimati"),
    ("-01:00", "Atlantic/Azores"),
    ("-02:00", "America/Noronha"),
    ("-03:00", "America/Araguaina"),
    ("-04:00", "America/Antigua"),
    ("-04:30", "Canada/Newfoundland"),
    ("-05:00", "America/Panama"),
    ("-06:00", "America/Chicago"),
    ("-07:00", "America/Boise"),
    ("-08:00", "America/Tijuana"),
    ("-09:00", "America/Anchorage"),
    ("-10:00", "America/Adak"),
    ("-10:30", "Pacific/Marquesas"),
    ("-11:00", "Pacific/Samoa"),
    ("-12:00", "Etc/GMT+12"),
];

fn tz_for_offset(offset_label: &str) -> &'static str {
    TZONES
        .iter()
        .find(|(offset, _)| *offset == offset_label)
        .map_or("UTC", |(_, name)| name)
}

/// Derive the Native type descriptor for every column in `table`, in
/// column order.
pub fn infer_schema(table: &dyn Table) -> Result<Vec<String>, TypeError> {
    let mut descriptors = Vec::with_capacity(table.columns().len());
    for (index, column) in table.columns().iter().enumerate() {
        let values = table.column_values(index);
        if values.len() != table.row_count() {
            return Err(TypeError::RowCountMismatch(
                Some(column.name.clone()),
                values.len(),
                table.row_count(),
            ));
        }
        descriptors.push(infer_column(Some(&column.name), values)?);
    }
    Ok(descriptors)
}

/// Derive the Native type descriptor for one column's values.
pub fn infer_column(name: Option<&str>, values: &[Value]) -> Result<String, TypeError> {
    let is_nullable = values.iter().any(Value::is_null);
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();

    if non_null.is_empty() {
        return Ok("Nothing".to_owned());
    }

    let inner = infer_non_null(name, &non_null)?;
    if is_nullable {
        Ok(format!("Nullable({inner})"))
    } else {
        Ok(inner)
    }
}

fn infer_non_null(name: Option<&str>, values: &[&Value]) -> Result<String, TypeError> {
    let owned: Option<String> = name.map(str::to_owned);
    let kind = values[0].type_name();
    for value in &values[1..] {
        if !same_kind(kind, value.type_name()) {
            return Err(TypeError::MixedKinds {
                column: owned,
                first: kind,
                second: value.type_name(),
            });
        }
    }

    match kind {
        "Bool" => Ok("Bool".to_owned()),
        "UInt8" | "UInt16" | "UInt32" | "UInt64" | "Int8" | "Int16" | "Int32" | "Int64" => {
            Ok(infer_integer(values))
        }
        "UInt128" => Ok(infer_wide_unsigned(values)),
        "Int128" => Ok(infer_wide_signed(values)),
        "UInt256" => Ok("UInt256".to_owned()),
        "Int256" => Ok("Int256".to_owned()),
        "Float32" | "Float64" => Ok(infer_float(values)),
        "BFloat16" => Ok("BFloat16".to_owned()),
        "String" => Ok(infer_string(values)),
        "FixedString" => Ok(infer_fixed_string(values)),
        "Date" | "Date32" => Ok(infer_date(values)),
        "DateTime" => Ok(infer_datetime(values)),
        "DateTime64" => Ok("DateTime64(3, 'UTC')".to_owned()),
        "Enum" => Ok("String".to_owned()),
        "UUID" => Ok("UUID".to_owned()),
        "IPv4" => Ok("IPv4".to_owned()),
        "IPv6" => Ok("IPv6".to_owned()),
        "Array" => infer_array(owned, values),
        "Decimal" => Ok(infer_decimal(values)),
        other => Err(TypeError::UninferableKind(owned, other)),
    }
}

/// Whether two `Value::type_name()`s belong to the same inference family
/// (e.g. any integer width can appear alongside any other, since the final
/// width is picked from the observed range, not the wire width of the
/// first sample).
fn same_kind(a: &str, b: &str) -> bool {
    let int_kinds = [
        "UInt8", "UInt16", "UInt32", "UInt64", "Int8", "Int16", "Int32", "Int64",
    ];
    if int_kinds.contains(&a) && int_kinds.contains(&b) {
        return true;
    }
    let date_kinds = ["Date", "Date32"];
    if date_kinds.contains(&a) && date_kinds.contains(&b) {
        return true;
    }
    let float_kinds = ["Float32", "Float64"];
    if float_kinds.contains(&a) && float_kinds.contains(&b) {
        return true;
    }
    a == b
}

fn value_as_i128(value: &Value) -> Option<i128> {
    match *value {
        Value::UInt8(v) => Some(i128::from(v)),
        Value::UInt16(v) => Some(i128::from(v)),
        Value::UInt32(v) => Some(i128::from(v)),
        Value::UInt64(v) => Some(i128::from(v)),
        Value::Int8(v) => Some(i128::from(v)),
        Value::Int16(v) => Some(i128::from(v)),
        Value::Int32(v) => Some(i128::from(v)),
        Value::Int64(v) => Some(i128::from(v)),
        _ => None,
    }
}

fn infer_integer(values: &[&Value]) -> String {
    let mut min = i128::MAX;
    let mut max = i128::MIN;
    for value in values {
        if let Some(v) = value_as_i128(value) {
            min = min.min(v);
            max = max.max(v);
        }
    }

    if min >= 0 {
        let width = if max <= i128::from(u8::MAX) {
            8
        } else if max <= i128::from(u16::MAX) {
            16
        } else if max <= i128::from(u32::MAX) {
            32
        } else if max <= i128::from(u64::MAX) {
            64
        } else {
            128
        };
        format!("UInt{width}")
    } else {
        let width = if min >= i128::from(i8::MIN) && max <= i128::from(i8::MAX) {
            8
        } else if min >= i128::from(i16::MIN) && max <= i128::from(i16::MAX) {
            16
        } else if min >= i128::from(i32::MIN) && max <= i128::from(i32::MAX) {
            32
        } else if min >= i128::from(i64::MIN) && max <= i128::from(i64::MAX) {
            64
        } else {
            128
        };
        format!("Int{width}")
    }
}

fn infer_wide_unsigned(values: &[&Value]) -> String {
    let min = values
        .iter()
        .filter_map(|v| match v {
            Value::UInt128(x) => Some(*x),
            _ => None,
        })
        .min()
        .unwrap_or(0);
    let max = values
        .iter()
        .filter_map(|v| match v {
            Value::UInt128(x) => Some(*x),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    if min <= u128::from(u64::MAX) && max <= u128::from(u64::MAX) {
        infer_integer(values)
    } else {
        "UInt128".to_owned()
    }
}

fn infer_wide_signed(values: &[&Value]) -> String {
    let min = values
        .iter()
        .filter_map(|v| match v {
            Value::Int128(x) => Some(*x),
            _ => None,
        })
        .min()
        .unwrap_or(0);
    let max = values
        .iter()
        .filter_map(|v| match v {
            Value::Int128(x) => Some(*x),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    if min >= i128::from(i64::MIN) && max <= i128::from(i64::MAX) {
        infer_integer(values)
    } else {
        "Int128".to_owned()
    }
}

fn infer_float(values: &[&Value]) -> String {
    const F32_MIN_POSITIVE_SUBNORMAL: f64 = 1.401_298_464_324_817e-45;
    const F32_MAX: f64 = 3.402_823_466_385_288_6e38;

    let fits_f32 = values.iter().all(|value| {
        let v = match value {
            Value::Float32(f) => f64::from(*f),
            Value::Float64(f) => *f,
            _ => return true,
        };
        if v == 0.0 {
            return true;
        }
        let magnitude = v.abs();
        (F32_MIN_POSITIVE_SUBNORMAL..=F32_MAX).contains(&magnitude)
    });

    if fits_f32 {
        "Float32".to_owned()
    } else {
        "Float64".to_owned()
    }
}

fn infer_string(values: &[&Value]) -> String {
    let lengths: Vec<usize> = values
        .iter()
        .filter_map(|v| v.as_str().map(str::len))
        .collect();
    match lengths.split_first() {
        Some((first, rest)) if rest.iter().all(|l| l == first) => {
            format!("FixedString({first})")
        }
        _ => "String".to_owned(),
    }
}

fn infer_fixed_string(values: &[&Value]) -> String {
    let lengths: Vec<usize> = values
        .iter()
        .filter_map(|v| match v {
            Value::FixedString(bytes) => Some(bytes.len()),
            _ => None,
        })
        .collect();
    match lengths.split_first() {
        Some((first, rest)) if rest.iter().all(|l| l == first) => {
            format!("FixedString({first})")
        }
        _ => "String".to_owned(),
    }
}

fn infer_date(values: &[&Value]) -> String {
    let dates: Vec<NaiveDate> = values
        .iter()
        .filter_map(|v| match v {
            Value::Date(d) | Value::Date32(d) => Some(*d),
            _ => None,
        })
        .collect();
    let min = dates.iter().min().copied().unwrap_or_default();
    let max = dates.iter().max().copied().unwrap_or_default();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid calendar date");

    if min >= epoch && max <= date_upper_bound() {
        "Date".to_owned()
    } else {
        "Date32".to_owned()
    }
}

fn infer_datetime(values: &[&Value]) -> String {
    let instants: Vec<chrono::DateTime<Utc>> = values
        .iter()
        .filter_map(|v| match v {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        })
        .collect();
    let min = instants.iter().min().copied();
    let max = instants.iter().max().copied();
    let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).single().expect("valid timestamp");

    match (min, max) {
        (Some(min), Some(max)) if min >= epoch && max <= datetime_upper_bound() => {
            "DateTime".to_owned()
        }
        (Some(_), Some(max)) => {
            let offset_label = max.format("%:z").to_string();
            format!("DateTime64(3, '{}')", tz_for_offset(&offset_label))
        }
        _ => "DateTime".to_owned(),
    }
}

fn infer_decimal(values: &[&Value]) -> String {
    let max_scale = values
        .iter()
        .filter_map(|v| match v {
            Value::Decimal(d) => Some(d.scale()),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    format!("Decimal(38, {max_scale})")
}

fn infer_array(owned: Option<String>, values: &[&Value]) -> Result<String, TypeError> {
    let mut flattened: Vec<&Value> = Vec::new();
    for value in values {
        if let Value::Array(elements) = value {
            flattened.extend(elements.iter());
        }
    }

    let is_nullable = flattened.iter().any(|v| v.is_null());
    let non_null: Vec<&Value> = flattened.into_iter().filter(|v| !v.is_null()).collect();

    if non_null.is_empty() {
        return Err(TypeError::EmptyArrayElements(owned));
    }

    let inner = infer_non_null(owned.as_deref(), &non_null)?;
    if is_nullable {
        Ok(format!("Array(Nullable({inner}))"))
    } else {
        Ok(format!("Array({inner})"))
    }
}
