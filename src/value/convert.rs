//! The cross-variant conversion matrix (`asX` / `asX(default)` /
//! `asXOrNull`). Conversions are lossy but deterministic and total on
//! the fixed matrix in the crate's design notes; anything off the
//! matrix raises `ValueError::IllegalArgument`.

use num_bigint::{BigInt, Sign};

use super::{BigDecimal, Data, Value, ValueType};
use crate::error::ValueError;

fn illegal(value_type: ValueType, target: &str) -> ValueError {
    ValueError::IllegalArgument(format!("cannot convert {value_type} to {target}"))
}

impl Value {
    fn require_defined(&self, target: &str) -> Result<(), ValueError> {
        if self.is_defined() {
            Ok(())
        } else {
            Err(illegal(ValueType::Undefined, target))
        }
    }

    pub fn as_boolean(&self) -> Result<bool, ValueError> {
        match &self.data {
            Data::Boolean(b) => Ok(*b),
            Data::Int(n) => Ok(*n != 0),
            Data::Long(n) => Ok(*n != 0),
            Data::Double(n) => Ok(*n != 0.0),
            Data::BigInteger(n) => Ok(*n != BigInt::from(0)),
            Data::BigDecimal(n) => Ok(!n.is_zero()),
            Data::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(illegal(ValueType::String, "boolean")),
            },
            Data::Bytes(b) => Ok(!b.is_empty()),
            Data::Type(t) => Ok(*t != ValueType::Undefined),
            Data::List(items) => Ok(!items.is_empty()),
            Data::Object(map) => Ok(!map.is_empty()),
            _ => Err(illegal(self.value_type(), "boolean")),
        }
    }

    pub fn as_boolean_or(&self, default: bool) -> Result<bool, ValueError> {
        if self.is_defined() {
            self.as_boolean()
        } else {
            Ok(default)
        }
    }

    pub fn as_boolean_or_null(&self) -> Result<Option<bool>, ValueError> {
        if self.is_defined() {
            self.as_boolean().map(Some)
        } else {
            Ok(None)
        }
    }

    fn as_big_integer_lossy(&self) -> Result<BigInt, ValueError> {
        match &self.data {
            Data::Boolean(b) => Ok(BigInt::from(if *b { 1 } else { 0 })),
            Data::Int(n) => Ok(BigInt::from(*n)),
            Data::Long(n) => Ok(BigInt::from(*n)),
            Data::Double(n) => Ok(BigInt::from(*n as i64)),
            Data::BigInteger(n) => Ok(n.clone()),
            Data::BigDecimal(n) => Ok(&n.unscaled / pow10(n.scale.max(0) as u32)),
            Data::String(s) => s
                .parse::<BigInt>()
                .map_err(|_| illegal(ValueType::String, "integer")),
            Data::Bytes(b) => Ok(BigInt::from_signed_bytes_be(b)),
            Data::List(items) => Ok(BigInt::from(items.len())),
            Data::Object(map) => Ok(BigInt::from(map.len())),
            _ => Err(illegal(self.value_type(), "integer")),
        }
    }

    pub fn as_int(&self) -> Result<i32, ValueError> {
        match &self.data {
            Data::Int(n) => Ok(*n),
            Data::Long(n) => Ok(*n as i32),
            Data::Double(n) => Ok(*n as i32),
            Data::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            Data::Bytes(b) => Ok(narrow_be_bytes(b, 4) as i32),
            _ => {
                let n = self.as_big_integer_lossy()?;
                Ok(narrow_bigint(&n, 4) as i32)
            }
        }
    }

    pub fn as_int_or(&self, default: i32) -> Result<i32, ValueError> {
        if self.is_defined() {
            self.as_int()
        } else {
            Ok(default)
        }
    }

    pub fn as_int_or_null(&self) -> Result<Option<i32>, ValueError> {
        if self.is_defined() {
            self.as_int().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_long(&self) -> Result<i64, ValueError> {
        match &self.data {
            Data::Int(n) => Ok(*n as i64),
            Data::Long(n) => Ok(*n),
            Data::Double(n) => Ok(*n as i64),
            Data::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            Data::Bytes(b) => Ok(narrow_be_bytes(b, 8)),
            _ => {
                let n = self.as_big_integer_lossy()?;
                Ok(narrow_bigint(&n, 8))
            }
        }
    }

    pub fn as_long_or(&self, default: i64) -> Result<i64, ValueError> {
        if self.is_defined() {
            self.as_long()
        } else {
            Ok(default)
        }
    }

    pub fn as_long_or_null(&self) -> Result<Option<i64>, ValueError> {
        if self.is_defined() {
            self.as_long().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_double(&self) -> Result<f64, ValueError> {
        match &self.data {
            Data::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Data::Int(n) => Ok(*n as f64),
            Data::Long(n) => Ok(*n as f64),
            Data::Double(n) => Ok(*n),
            Data::BigInteger(n) => n
                .to_string()
                .parse()
                .map_err(|_| illegal(ValueType::BigInteger, "double")),
            Data::BigDecimal(n) => n
                .to_string()
                .parse()
                .map_err(|_| illegal(ValueType::BigDecimal, "double")),
            Data::String(s) => s.parse().map_err(|_| illegal(ValueType::String, "double")),
            Data::List(items) => Ok(items.len() as f64),
            Data::Object(map) => Ok(map.len() as f64),
            Data::Bytes(b) => Ok(BigInt::from_signed_bytes_be(b).to_string().parse().unwrap_or(0.0)),
            _ => Err(illegal(self.value_type(), "double")),
        }
    }

    pub fn as_double_or(&self, default: f64) -> Result<f64, ValueError> {
        if self.is_defined() {
            self.as_double()
        } else {
            Ok(default)
        }
    }

    pub fn as_double_or_null(&self) -> Result<Option<f64>, ValueError> {
        if self.is_defined() {
            self.as_double().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_big_integer(&self) -> Result<BigInt, ValueError> {
        self.require_defined("big integer")?;
        self.as_big_integer_lossy()
    }

    pub fn as_big_integer_or(&self, default: BigInt) -> Result<BigInt, ValueError> {
        if self.is_defined() {
            self.as_big_integer()
        } else {
            Ok(default)
        }
    }

    pub fn as_big_integer_or_null(&self) -> Result<Option<BigInt>, ValueError> {
        if self.is_defined() {
            self.as_big_integer().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_big_decimal(&self) -> Result<BigDecimal, ValueError> {
        match &self.data {
            Data::BigDecimal(d) => Ok(d.clone()),
            Data::String(s) => s
                .parse()
                .map_err(|_| illegal(ValueType::String, "big decimal")),
            Data::Bytes(b) => Ok(BigDecimal::new(BigInt::from_signed_bytes_be(b), 0)),
            Data::List(items) => Ok(BigDecimal::new(BigInt::from(items.len()), 0)),
            Data::Object(map) => Ok(BigDecimal::new(BigInt::from(map.len()), 0)),
            _ => Ok(BigDecimal::new(self.as_big_integer_lossy()?, 0)),
        }
    }

    pub fn as_big_decimal_or(&self, default: BigDecimal) -> Result<BigDecimal, ValueError> {
        if self.is_defined() {
            self.as_big_decimal()
        } else {
            Ok(default)
        }
    }

    pub fn as_big_decimal_or_null(&self) -> Result<Option<BigDecimal>, ValueError> {
        if self.is_defined() {
            self.as_big_decimal().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_string(&self) -> Result<String, ValueError> {
        Ok(match &self.data {
            Data::Boolean(b) => b.to_string(),
            Data::Int(n) => n.to_string(),
            Data::Long(n) => n.to_string(),
            Data::Double(n) => format_double(*n),
            Data::BigInteger(n) => n.to_string(),
            Data::BigDecimal(n) => n.to_string(),
            Data::String(s) => s.clone(),
            Data::Bytes(b) => crate::base64::encode_compact(b),
            Data::Expression(s) => s.clone(),
            Data::Type(t) => t.name().to_string(),
            Data::List(_) | Data::Object(_) | Data::Property(..) => {
                crate::dmr::writer::render_compact(self)
            }
            Data::Undefined => return Err(illegal(ValueType::Undefined, "string")),
        })
    }

    pub fn as_string_or(&self, default: impl Into<String>) -> Result<String, ValueError> {
        if self.is_defined() {
            self.as_string()
        } else {
            Ok(default.into())
        }
    }

    pub fn as_string_or_null(&self) -> Result<Option<String>, ValueError> {
        if self.is_defined() {
            self.as_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_bytes(&self) -> Result<Vec<u8>, ValueError> {
        match &self.data {
            Data::Int(n) => Ok(n.to_be_bytes().to_vec()),
            Data::Long(n) => Ok(n.to_be_bytes().to_vec()),
            Data::BigInteger(n) => Ok(n.to_signed_bytes_be()),
            Data::String(s) => Ok(s.as_bytes().to_vec()),
            Data::Bytes(b) => Ok(b.clone()),
            _ => Err(illegal(self.value_type(), "bytes")),
        }
    }

    pub fn as_bytes_or(&self, default: Vec<u8>) -> Result<Vec<u8>, ValueError> {
        if self.is_defined() {
            self.as_bytes()
        } else {
            Ok(default)
        }
    }

    pub fn as_bytes_or_null(&self) -> Result<Option<Vec<u8>>, ValueError> {
        if self.is_defined() {
            self.as_bytes().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn as_value_type(&self) -> Result<ValueType, ValueError> {
        match &self.data {
            Data::String(s) => s.parse(),
            Data::Type(t) => Ok(*t),
            _ => Err(illegal(self.value_type(), "type")),
        }
    }

    pub fn as_value_type_or(&self, default: ValueType) -> Result<ValueType, ValueError> {
        if self.is_defined() {
            self.as_value_type()
        } else {
            Ok(default)
        }
    }

    pub fn as_value_type_or_null(&self) -> Result<Option<ValueType>, ValueError> {
        if self.is_defined() {
            self.as_value_type().map(Some)
        } else {
            Ok(None)
        }
    }

    /// LIST: identity. OBJECT: entries as `(key, value)` PROPERTY
    /// values. PROPERTY: a single-element list containing itself.
    pub fn as_list(&self) -> Result<Vec<Value>, ValueError> {
        match &self.data {
            Data::List(items) => Ok(items.clone()),
            Data::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| {
                    let mut p = Value::new();
                    p.set_property(k.clone(), v.clone()).unwrap();
                    p
                })
                .collect()),
            Data::Property(..) => Ok(vec![self.clone()]),
            _ => Err(illegal(self.value_type(), "list")),
        }
    }

    /// LIST: a two-element `[name, value]` pair becomes a PROPERTY if
    /// the first element converts to a string. OBJECT: a single-entry
    /// object becomes that entry's PROPERTY. PROPERTY: identity.
    pub fn as_property(&self) -> Result<Value, ValueError> {
        match &self.data {
            Data::Property(..) => Ok(self.clone()),
            Data::List(items) if items.len() == 2 => {
                let name = items[0].as_string()?;
                let mut p = Value::new();
                p.set_property(name, items[1].clone()).unwrap();
                Ok(p)
            }
            Data::Object(map) if map.len() == 1 => {
                let (k, v) = map.iter().next().unwrap();
                let mut p = Value::new();
                p.set_property(k.clone(), v.clone()).unwrap();
                Ok(p)
            }
            _ => Err(illegal(self.value_type(), "property")),
        }
    }
}

/// Interprets `bytes` as a signed big-endian integer, then narrows it
/// to exactly `width` bytes by truncating high-order bytes — silent
/// narrowing, matching the source library's observable behavior for
/// byte arrays longer than the target width (see design notes).
fn narrow_be_bytes(bytes: &[u8], width: usize) -> i64 {
    narrow_bigint(&BigInt::from_signed_bytes_be(bytes), width)
}

fn narrow_bigint(n: &BigInt, width: usize) -> i64 {
    let bytes = two_complement_bytes(n, width);
    let mut arr = [0u8; 8];
    arr[8 - width..].copy_from_slice(&bytes);
    let shift = (8 - width) * 8;
    (i64::from_be_bytes(arr) << shift) >> shift
}

/// `n`'s two's-complement representation, truncated or sign-extended to
/// exactly `width` bytes.
fn two_complement_bytes(n: &BigInt, width: usize) -> Vec<u8> {
    let full = n.to_signed_bytes_be();
    let negative = n.sign() == Sign::Minus;
    let mut buf = vec![if negative { 0xff } else { 0x00 }; width];
    let take = full.len().min(width);
    buf[width - take..].copy_from_slice(&full[full.len() - take..]);
    buf
}

fn pow10(exp: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let ten = BigInt::from(10);
    for _ in 0..exp {
        result *= &ten;
    }
    result
}

fn format_double(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 1e17 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}
