//! Self-delimiting binary wire format: every value is a one-byte type
//! char followed by a type-specific payload. Container payloads nest
//! full (type-char-prefixed) child encodings, so a decoder never needs
//! to know a child's tag in advance.

use log::debug;
use num_bigint::BigInt;

use crate::error::ModelError;
use crate::value::{BigDecimal, Value, ValueType};

/// Appends `value`'s wire encoding to `out`.
pub fn encode(value: &Value, out: &mut Vec<u8>) {
    debug!("binary: encoding {} frame at offset {}", value.value_type(), out.len());
    out.push(value.value_type().type_char());
    match value.value_type() {
        ValueType::Undefined => {}
        ValueType::Boolean => out.push(value.as_boolean().unwrap() as u8),
        ValueType::Int => out.extend_from_slice(&value.as_int().unwrap().to_be_bytes()),
        ValueType::Long => out.extend_from_slice(&value.as_long().unwrap().to_be_bytes()),
        ValueType::Double => out.extend_from_slice(&value.as_double().unwrap().to_bits().to_be_bytes()),
        ValueType::BigInteger => {
            let n = value.as_big_integer().unwrap();
            write_length_prefixed(out, &n.to_signed_bytes_be());
        }
        ValueType::BigDecimal => {
            let d = value.as_big_decimal().unwrap();
            write_length_prefixed(out, &d.unscaled.to_signed_bytes_be());
            out.extend_from_slice(&d.scale.to_be_bytes());
        }
        ValueType::String => write_length_prefixed(out, value.as_string().unwrap().as_bytes()),
        ValueType::Expression => write_length_prefixed(out, value.as_string().unwrap().as_bytes()),
        ValueType::Bytes => write_length_prefixed(out, &value.as_bytes().unwrap()),
        ValueType::Type => out.push(value.as_value_type().unwrap().type_char()),
        ValueType::List => {
            let items = value.as_list().unwrap();
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for item in &items {
                encode(item, out);
            }
        }
        ValueType::Object => {
            let entries = object_entries(value);
            out.extend_from_slice(&(entries.len() as i32).to_be_bytes());
            for (k, v) in entries {
                write_length_prefixed(out, k.as_bytes());
                encode(v, out);
            }
        }
        ValueType::Property => {
            let (name, child) = property_parts(value);
            write_length_prefixed(out, name.as_bytes());
            encode(child, out);
        }
    }
}

/// Encodes a standalone top-level value.
pub fn encode_to_vec(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode(value, &mut out);
    out
}

fn object_entries(value: &Value) -> Vec<(String, Value)> {
    value
        .as_list()
        .expect("OBJECT always converts to a list of PROPERTY entries")
        .into_iter()
        .map(|p| {
            let parts = property_parts(&p);
            (parts.0.to_string(), parts.1.clone())
        })
        .collect()
}

fn property_parts(value: &Value) -> (&str, &Value) {
    value
        .as_property_parts()
        .expect("caller guarantees value is a PROPERTY")
}

fn write_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// A cursor over an in-memory buffer, consumed front-to-back by `decode`.
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ModelError> {
        if self.buf.len() < n {
            return Err(ModelError::InvalidObject("truncated input".to_string()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn take_u8(&mut self) -> Result<u8, ModelError> {
        Ok(self.take(1)?[0])
    }

    fn take_i32(&mut self) -> Result<i32, ModelError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_length_prefixed(&mut self) -> Result<&'a [u8], ModelError> {
        let len = self.take_i32()?;
        if len < 0 {
            return Err(ModelError::InvalidObject("negative length".to_string()));
        }
        self.take(len as usize)
    }
}

/// Decodes a single value from the front of `bytes`, returning it along
/// with however much of `bytes` was unconsumed.
pub fn decode(bytes: &[u8]) -> Result<(Value, &[u8]), ModelError> {
    let mut cursor = Cursor { buf: bytes };
    let value = decode_one(&mut cursor)?;
    Ok((value, cursor.buf))
}

/// Decodes exactly one value and errors if any bytes remain.
pub fn decode_exact(bytes: &[u8]) -> Result<Value, ModelError> {
    let (value, rest) = decode(bytes)?;
    if !rest.is_empty() {
        return Err(ModelError::InvalidObject(
            "trailing bytes after value".to_string(),
        ));
    }
    Ok(value)
}

fn decode_one(cursor: &mut Cursor<'_>) -> Result<Value, ModelError> {
    let type_char = cursor.take_u8()?;
    let tag = ValueType::from_type_char(type_char)
        .map_err(|e| ModelError::InvalidObject(e.to_string()))?;
    debug!("binary: decoding {tag} frame, {} bytes remaining", cursor.buf.len());
    Ok(match tag {
        ValueType::Undefined => Value::new(),
        ValueType::Boolean => Value::boolean(cursor.take_u8()? != 0),
        ValueType::Int => Value::int(i32::from_be_bytes(cursor.take(4)?.try_into().unwrap())),
        ValueType::Long => Value::long(i64::from_be_bytes(cursor.take(8)?.try_into().unwrap())),
        ValueType::Double => Value::double(f64::from_bits(u64::from_be_bytes(
            cursor.take(8)?.try_into().unwrap(),
        ))),
        ValueType::BigInteger => {
            Value::big_integer(BigInt::from_signed_bytes_be(cursor.take_length_prefixed()?))
        }
        ValueType::BigDecimal => {
            let unscaled = BigInt::from_signed_bytes_be(cursor.take_length_prefixed()?);
            let scale = cursor.take_i32()?;
            Value::big_decimal(BigDecimal::new(unscaled, scale))
        }
        ValueType::String => Value::string(utf8(cursor.take_length_prefixed()?)?),
        ValueType::Expression => Value::expression(utf8(cursor.take_length_prefixed()?)?),
        ValueType::Bytes => Value::bytes(cursor.take_length_prefixed()?.to_vec()),
        ValueType::Type => {
            let inner = cursor.take_u8()?;
            Value::type_value(
                ValueType::from_type_char(inner).map_err(|e| ModelError::InvalidObject(e.to_string()))?,
            )
        }
        ValueType::List => {
            let count = cursor.take_i32()?;
            if count < 0 {
                return Err(ModelError::InvalidObject("negative count".to_string()));
            }
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(decode_one(cursor)?);
            }
            let mut v = Value::new();
            v.set_children(items).expect("fresh value is mutable");
            v
        }
        ValueType::Object => {
            let count = cursor.take_i32()?;
            if count < 0 {
                return Err(ModelError::InvalidObject("negative count".to_string()));
            }
            let mut v = Value::new();
            for _ in 0..count {
                let key = utf8(cursor.take_length_prefixed()?)?;
                let child = decode_one(cursor)?;
                *v.get(&key).expect("fresh/valid object is mutable") = child;
            }
            v
        }
        ValueType::Property => {
            let name = utf8(cursor.take_length_prefixed()?)?;
            let child = decode_one(cursor)?;
            let mut v = Value::new();
            v.set_property(name, child).expect("fresh value is mutable");
            v
        }
    })
}

fn utf8(bytes: &[u8]) -> Result<String, ModelError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ModelError::InvalidObject("payload is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        for v in [
            Value::new(),
            Value::boolean(true),
            Value::int(-17),
            Value::long(i64::MIN),
            Value::double(3.5),
            Value::big_integer(BigInt::from(123_456_789)),
            Value::big_decimal(BigDecimal::new(BigInt::from(12345), 2)),
            Value::string("hello"),
            Value::expression("${a:b}"),
            Value::bytes(vec![1, 2, 3]),
            Value::type_value(ValueType::List),
        ] {
            let encoded = encode_to_vec(&v);
            let decoded = decode_exact(&encoded).unwrap();
            assert_eq!(v, decoded);
        }
    }

    #[test]
    fn round_trips_nested_list_of_bytes() {
        let mut root = Value::new();
        root.add().unwrap().set_bytes(vec![0xde, 0xad]).unwrap();
        root.add().unwrap().set_bytes(vec![0xbe, 0xef]).unwrap();
        let encoded = encode_to_vec(&root);
        assert_eq!(decode_exact(&encoded).unwrap(), root);
    }

    #[test]
    fn round_trips_object_preserving_order() {
        let mut root = Value::new();
        root.get("z").unwrap().set_int(1).unwrap();
        root.get("a").unwrap().set_int(2).unwrap();
        let encoded = encode_to_vec(&root);
        let decoded = decode_exact(&encoded).unwrap();
        assert_eq!(decoded, root);
        let keys: Vec<&str> = decoded.as_object().unwrap().keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn rejects_unknown_type_char() {
        assert!(decode_exact(&[b'?']).is_err());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let encoded = encode_to_vec(&Value::int(1));
        let mut padded = encoded.clone();
        padded.push(0);
        assert!(decode_exact(&padded).is_err());
    }
}
