//! Standard-JSON scanner, sharing the [`Grammar`] automaton with the
//! DMR reader and decoding the four sentinel object shapes back into
//! their DMR variant.

use indexmap::IndexMap;
use num_bigint::BigInt;

use super::{BYTES_VALUE, EXPRESSION_VALUE, PROPERTY_VALUE, TYPE_MODEL_VALUE};
use crate::error::ModelError;
use crate::grammar::{Event, Grammar};
use crate::value::{Value, ValueType};

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner { bytes: text.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.bytes[self.pos..].starts_with(needle.as_bytes())
    }

    fn expect_byte(&mut self, b: u8) -> Result<(), ModelError> {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ModelError::Token(format!(
                "expected '{}' at position {}",
                b as char, self.pos
            )))
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if pred(b)) {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }
}

/// Parses a complete JSON document into a [`Value`].
pub fn parse(text: &str) -> Result<Value, ModelError> {
    let mut scanner = Scanner::new(text);
    let mut grammar = Grammar::new();
    let value = parse_value(&mut scanner, &mut grammar)?;
    scanner.skip_ws();
    if scanner.pos != scanner.bytes.len() {
        return Err(ModelError::Token(format!(
            "trailing characters at position {}",
            scanner.pos
        )));
    }
    if !grammar.is_done() {
        return Err(ModelError::Grammar("incomplete document".to_string()));
    }
    Ok(value)
}

fn parse_value(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    s.skip_ws();
    match s.peek() {
        Some(b'{') => parse_object(s, g),
        Some(b'[') => parse_array(s, g),
        Some(b'"') => {
            let text = parse_string_literal(s)?;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::string(text))
        }
        Some(c) if c.is_ascii_digit() || c == b'-' => parse_number(s, g),
        Some(b'n') if s.starts_with("null") => {
            s.pos += 4;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::new())
        }
        Some(b't') if s.starts_with("true") => {
            s.pos += 4;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::boolean(true))
        }
        Some(b'f') if s.starts_with("false") => {
            s.pos += 5;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::boolean(false))
        }
        Some(c) => Err(ModelError::Token(format!(
            "unexpected character '{}' at position {}",
            c as char, s.pos
        ))),
        None => Err(ModelError::Token("unexpected end of input".to_string())),
    }
}

fn parse_array(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    s.expect_byte(b'[')?;
    g.before(Event::StartList)?;
    g.after(Event::StartList)?;
    let mut items = Vec::new();
    s.skip_ws();
    if s.peek() == Some(b']') {
        s.bump();
        g.before(Event::EndList)?;
        g.after(Event::EndList)?;
        return Ok(crate::value::from_elements(items));
    }
    loop {
        items.push(parse_value(s, g)?);
        s.skip_ws();
        match s.peek() {
            Some(b']') => {
                s.bump();
                g.before(Event::EndList)?;
                g.after(Event::EndList)?;
                break;
            }
            Some(b',') => {
                s.bump();
            }
            _ => {
                return Err(ModelError::Token(format!(
                    "expected ',' or ']' at position {}",
                    s.pos
                )))
            }
        }
    }
    Ok(crate::value::from_elements(items))
}

/// Reads the raw (key, value) pairs of a JSON object without running
/// them through the sentinel-detection / grammar layer, used to decode
/// sentinel payloads (`{"BYTES_VALUE": "..."}`) whose single entry is
/// handled specially by the caller.
fn parse_raw_entries(s: &mut Scanner<'_>) -> Result<Vec<(String, RawValue)>, ModelError> {
    s.expect_byte(b'{')?;
    let mut entries = Vec::new();
    s.skip_ws();
    if s.peek() == Some(b'}') {
        s.bump();
        return Ok(entries);
    }
    loop {
        let key = parse_string_literal(s)?;
        s.expect_byte(b':')?;
        let value = parse_raw_value(s)?;
        entries.push((key, value));
        s.skip_ws();
        match s.peek() {
            Some(b'}') => {
                s.bump();
                break;
            }
            Some(b',') => {
                s.bump();
            }
            _ => {
                return Err(ModelError::Token(format!(
                    "expected ',' or '}}' at position {}",
                    s.pos
                )))
            }
        }
    }
    Ok(entries)
}

/// A JSON value captured without grammar bookkeeping, used only while
/// scanning ahead to classify a `{...}` as a sentinel or a plain DMR
/// OBJECT. Once classified, plain objects are re-parsed through
/// `parse_value` with the grammar engaged; PROPERTY_VALUE's payload
/// object is the one shape that has no such re-scan (a property's name
/// isn't a JSON key anywhere else), so its child is built straight from
/// the raw scan via `raw_to_value`.
enum RawValue {
    Null,
    Bool(bool),
    Number(String, bool, bool),
    String(String),
    Array(Vec<RawValue>),
    Object(Vec<(String, RawValue)>),
}

fn parse_raw_value(s: &mut Scanner<'_>) -> Result<RawValue, ModelError> {
    s.skip_ws();
    match s.peek() {
        Some(b'"') => Ok(RawValue::String(parse_string_literal(s)?)),
        Some(b'{') => Ok(RawValue::Object(parse_raw_entries(s)?)),
        Some(b'[') => {
            s.bump();
            let mut items = Vec::new();
            s.skip_ws();
            if s.peek() == Some(b']') {
                s.bump();
                return Ok(RawValue::Array(items));
            }
            loop {
                items.push(parse_raw_value(s)?);
                s.skip_ws();
                match s.peek() {
                    Some(b']') => {
                        s.bump();
                        break;
                    }
                    Some(b',') => {
                        s.bump();
                    }
                    _ => return Err(ModelError::Token("expected ',' or ']'".to_string())),
                }
            }
            Ok(RawValue::Array(items))
        }
        Some(b'n') if s.starts_with("null") => {
            s.pos += 4;
            Ok(RawValue::Null)
        }
        Some(b't') if s.starts_with("true") => {
            s.pos += 4;
            Ok(RawValue::Bool(true))
        }
        Some(b'f') if s.starts_with("false") => {
            s.pos += 5;
            Ok(RawValue::Bool(false))
        }
        Some(c) if c.is_ascii_digit() || c == b'-' => {
            let (literal, has_frac, has_exp) = scan_number_literal(s)?;
            Ok(RawValue::Number(literal.to_string(), has_frac, has_exp))
        }
        _ => Err(ModelError::Token(format!(
            "unexpected character at position {}",
            s.pos
        ))),
    }
}

fn parse_object(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let checkpoint = s.pos;
    let entries = parse_raw_entries(s)?;

    if entries.len() == 1 {
        let (key, value) = &entries[0];
        match key.as_str() {
            EXPRESSION_VALUE => {
                if let RawValue::String(text) = value {
                    g.before(Event::Scalar)?;
                    g.after(Event::Scalar)?;
                    return Ok(Value::expression(text.clone()));
                }
            }
            BYTES_VALUE => {
                if let RawValue::String(text) = value {
                    let bytes = crate::base64::decode(text)?;
                    g.before(Event::Scalar)?;
                    g.after(Event::Scalar)?;
                    return Ok(Value::bytes(bytes));
                }
            }
            TYPE_MODEL_VALUE => {
                if let RawValue::String(text) = value {
                    let tag: ValueType = text.parse().map_err(|_| {
                        ModelError::Token(format!("not a recognized type name: {text}"))
                    })?;
                    g.before(Event::Scalar)?;
                    g.after(Event::Scalar)?;
                    return Ok(Value::type_value(tag));
                }
            }
            PROPERTY_VALUE => {
                if let RawValue::Object(inner) = value {
                    if inner.len() == 1 {
                        let (name, raw_child) = &inner[0];
                        let child = raw_to_value(raw_child)?;
                        g.before(Event::StartProperty)?;
                        g.after(Event::StartProperty)?;
                        g.before(Event::Key)?;
                        g.after(Event::Key)?;
                        commit_raw(&child, g)?;
                        g.before(Event::EndProperty)?;
                        g.after(Event::EndProperty)?;
                        return Ok(crate::value::from_property(name.clone(), child));
                    }
                }
            }
            _ => {}
        }
    }

    // Not a sentinel: re-scan as a plain DMR OBJECT so nested sentinels
    // and grammar bookkeeping are handled uniformly.
    s.pos = checkpoint;
    parse_plain_object(s, g)
}

/// Materializes a raw-scanned object's entries into a `Value`, detecting
/// the same four sentinel shapes `parse_object` does (a sentinel nested
/// inside a PROPERTY_VALUE payload never passes back through the
/// grammar-engaged parser, so it has to be classified here too).
fn raw_object_to_value(entries: &[(String, RawValue)]) -> Result<Value, ModelError> {
    if entries.len() == 1 {
        let (key, value) = &entries[0];
        match key.as_str() {
            EXPRESSION_VALUE => {
                if let RawValue::String(text) = value {
                    return Ok(Value::expression(text.clone()));
                }
            }
            BYTES_VALUE => {
                if let RawValue::String(text) = value {
                    return Ok(Value::bytes(crate::base64::decode(text)?));
                }
            }
            TYPE_MODEL_VALUE => {
                if let RawValue::String(text) = value {
                    let tag: ValueType = text.parse().map_err(|_| {
                        ModelError::Token(format!("not a recognized type name: {text}"))
                    })?;
                    return Ok(Value::type_value(tag));
                }
            }
            PROPERTY_VALUE => {
                if let RawValue::Object(inner) = value {
                    if inner.len() == 1 {
                        let (name, raw_child) = &inner[0];
                        let child = raw_to_value(raw_child)?;
                        return Ok(crate::value::from_property(name.clone(), child));
                    }
                }
            }
            _ => {}
        }
    }
    let mut map: IndexMap<String, Value> = IndexMap::new();
    for (key, value) in entries {
        map.insert(key.clone(), raw_to_value(value)?);
    }
    Ok(crate::value::from_entries(map))
}

fn raw_to_value(raw: &RawValue) -> Result<Value, ModelError> {
    Ok(match raw {
        RawValue::Null => Value::new(),
        RawValue::Bool(b) => Value::boolean(*b),
        RawValue::Number(literal, has_frac, has_exp) => {
            number_value_from_literal(literal, *has_frac, *has_exp)?
        }
        RawValue::String(s) => Value::string(s.clone()),
        RawValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(raw_to_value(item)?);
            }
            crate::value::from_elements(out)
        }
        RawValue::Object(entries) => raw_object_to_value(entries)?,
    })
}

/// Re-validates a value already materialized by `raw_to_value` against
/// the grammar, so PROPERTY_VALUE's child still participates in the
/// shared automaton even though it was scanned ahead of time.
fn commit_raw(value: &Value, g: &mut Grammar) -> Result<(), ModelError> {
    match value.value_type() {
        ValueType::List => {
            g.before(Event::StartList)?;
            g.after(Event::StartList)?;
            for item in value.as_list_slice().unwrap_or(&[]) {
                commit_raw(item, g)?;
            }
            g.before(Event::EndList)?;
            g.after(Event::EndList)?;
        }
        ValueType::Object => {
            g.before(Event::StartObject)?;
            g.after(Event::StartObject)?;
            if let Some(entries) = value.as_object() {
                for (_, child) in entries.iter() {
                    g.before(Event::Key)?;
                    g.after(Event::Key)?;
                    commit_raw(child, g)?;
                }
            }
            g.before(Event::EndObject)?;
            g.after(Event::EndObject)?;
        }
        ValueType::Property => {
            g.before(Event::StartProperty)?;
            g.after(Event::StartProperty)?;
            g.before(Event::Key)?;
            g.after(Event::Key)?;
            let (_, child) = value.as_property_parts().expect("PROPERTY always has parts");
            commit_raw(child, g)?;
            g.before(Event::EndProperty)?;
            g.after(Event::EndProperty)?;
        }
        _ => {
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
        }
    }
    Ok(())
}

fn parse_plain_object(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    s.expect_byte(b'{')?;
    g.before(Event::StartObject)?;
    g.after(Event::StartObject)?;
    let mut entries: IndexMap<String, Value> = IndexMap::new();
    s.skip_ws();
    if s.peek() == Some(b'}') {
        s.bump();
        g.before(Event::EndObject)?;
        g.after(Event::EndObject)?;
        return Ok(crate::value::from_entries(entries));
    }
    loop {
        g.before(Event::Key)?;
        let key = parse_string_literal(s)?;
        g.after(Event::Key)?;
        s.expect_byte(b':')?;
        let child = parse_value(s, g)?;
        entries.insert(key, child);
        s.skip_ws();
        match s.peek() {
            Some(b'}') => {
                s.bump();
                g.before(Event::EndObject)?;
                g.after(Event::EndObject)?;
                break;
            }
            Some(b',') => {
                s.bump();
            }
            _ => {
                return Err(ModelError::Token(format!(
                    "expected ',' or '}}' at position {}",
                    s.pos
                )))
            }
        }
    }
    Ok(crate::value::from_entries(entries))
}

fn parse_string_literal(s: &mut Scanner<'_>) -> Result<String, ModelError> {
    s.skip_ws();
    s.expect_byte(b'"')?;
    let mut out = String::new();
    loop {
        match s.bump() {
            None => return Err(ModelError::Token("unterminated string".to_string())),
            Some(b'"') => break,
            Some(b'\\') => match s.bump() {
                Some(b'"') => out.push('"'),
                Some(b'\\') => out.push('\\'),
                Some(b'/') => out.push('/'),
                Some(b'b') => out.push('\u{8}'),
                Some(b'f') => out.push('\u{c}'),
                Some(b'n') => out.push('\n'),
                Some(b'r') => out.push('\r'),
                Some(b't') => out.push('\t'),
                Some(b'u') => {
                    let hex = s.take_while(|b| b.is_ascii_hexdigit());
                    if hex.len() != 4 {
                        return Err(ModelError::Token("bad \\u escape".to_string()));
                    }
                    let code = u32::from_str_radix(std::str::from_utf8(hex).unwrap(), 16)
                        .map_err(|_| ModelError::Token("bad \\u escape".to_string()))?;
                    let ch = char::from_u32(code)
                        .ok_or_else(|| ModelError::Token("bad \\u escape".to_string()))?;
                    out.push(ch);
                }
                _ => return Err(ModelError::Token("bad escape sequence".to_string())),
            },
            Some(b) if b.is_ascii() => out.push(b as char),
            Some(_) => {
                let start = s.pos - 1;
                let rest = std::str::from_utf8(&s.bytes[start..])
                    .map_err(|_| ModelError::Token("invalid UTF-8".to_string()))?;
                let ch = rest.chars().next().unwrap();
                out.push(ch);
                s.pos = start + ch.len_utf8();
            }
        }
    }
    Ok(out)
}

fn scan_number_literal<'a>(s: &mut Scanner<'a>) -> Result<(&'a str, bool, bool), ModelError> {
    let start = s.pos;
    if s.peek() == Some(b'-') {
        s.pos += 1;
    }
    let int_part = s.take_while(|b| b.is_ascii_digit());
    if int_part.is_empty() {
        return Err(ModelError::Token("expected digits".to_string()));
    }
    let mut has_frac = false;
    if s.peek() == Some(b'.') {
        has_frac = true;
        s.pos += 1;
        s.take_while(|b| b.is_ascii_digit());
    }
    let mut has_exp = false;
    if matches!(s.peek(), Some(b'e') | Some(b'E')) {
        has_exp = true;
        s.pos += 1;
        if matches!(s.peek(), Some(b'+') | Some(b'-')) {
            s.pos += 1;
        }
        s.take_while(|b| b.is_ascii_digit());
    }
    let literal = std::str::from_utf8(&s.bytes[start..s.pos]).unwrap();
    Ok((literal, has_frac, has_exp))
}

fn number_value_from_literal(literal: &str, has_frac: bool, has_exp: bool) -> Result<Value, ModelError> {
    if has_frac || has_exp {
        return Ok(Value::double(literal.parse().map_err(|_| {
            ModelError::Token(format!("bad number literal: {literal}"))
        })?));
    }
    if let Ok(n) = literal.parse::<i32>() {
        return Ok(Value::int(n));
    }
    if let Ok(n) = literal.parse::<i64>() {
        return Ok(Value::long(n));
    }
    let n: BigInt = literal
        .parse()
        .map_err(|_| ModelError::Token(format!("bad number literal: {literal}")))?;
    Ok(Value::big_integer(n))
}

fn parse_number(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let (literal, has_frac, has_exp) = scan_number_literal(s)?;
    let literal = literal.to_string();
    g.before(Event::Scalar)?;
    g.after(Event::Scalar)?;
    number_value_from_literal(&literal, has_frac, has_exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_null_true_false() {
        assert_eq!(parse("null").unwrap(), Value::new());
        assert_eq!(parse("true").unwrap(), Value::boolean(true));
        assert_eq!(parse("false").unwrap(), Value::boolean(false));
    }

    #[test]
    fn parses_numbers_by_shape() {
        assert_eq!(parse("42").unwrap(), Value::int(42));
        assert_eq!(parse("3.5").unwrap(), Value::double(3.5));
        assert_eq!(parse("9999999999").unwrap(), Value::long(9_999_999_999));
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(parse("[1,2,]").is_err());
    }

    #[test]
    fn property_sentinel_is_a_nested_single_key_object() {
        let parsed = parse(r#"{"PROPERTY_VALUE" : {"n" : 42}}"#).unwrap();
        assert_eq!(parsed.value_type(), ValueType::Property);
        let (name, child) = parsed.as_property_parts().unwrap();
        assert_eq!(name, "n");
        assert_eq!(child.as_int().unwrap(), 42);
    }

    #[test]
    fn property_sentinel_child_may_itself_be_a_sentinel() {
        let parsed = parse(r#"{"PROPERTY_VALUE" : {"b" : {"BYTES_VALUE" : "AQID"}}}"#).unwrap();
        let (name, child) = parsed.as_property_parts().unwrap();
        assert_eq!(name, "b");
        assert_eq!(child.as_bytes().unwrap(), vec![1, 2, 3]);
    }
}
