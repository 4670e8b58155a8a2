//! Recursive-descent scanner for the native DMR textual grammar.
//!
//! Grammar (informally):
//! ```text
//! value      := 'undefined' | 'true' | 'false' | number | string
//!             | bytes | expression | 'big' 'integer' number
//!             | 'big' 'decimal' number | type | list | object | property
//! object     := '{' (property (',' property)*)? '}'
//! property   := string '=>' value
//! list       := '[' (value (',' value)*)? ']'
//! number     := '-'? digits ('.' digits)? ([eE] [+-]? digits)? suffix?
//! suffix     := 'L' | 'I' | 'B'      -- long / big integer / big decimal
//! bytes      := 'bytes' '{' ('0x' hex hex (',' '0x' hex hex)*)? '}'
//! expression := '$' '{' ... '}' | 'expression' string
//! type       := 'type' '(' type-name ')'
//! ```

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::ModelError;
use crate::grammar::{Event, Grammar};
use crate::value::{BigDecimal, Value, ValueType};

pub type ParseError = ModelError;

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
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

    fn expect_str(&mut self, s: &str) -> Result<(), ModelError> {
        self.skip_ws();
        if self.starts_with(s) {
            self.pos += s.len();
            Ok(())
        } else {
            Err(ModelError::Token(format!(
                "expected '{s}' at position {}",
                self.pos
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

/// Parses a complete DMR document from `text`.
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
        Some(b'[') => parse_list(s, g),
        Some(b'"') => parse_string_or_property(s, g),
        Some(b'$') if s.starts_with("${") => parse_expression(s, g),
        Some(c) if c.is_ascii_digit() || c == b'-' => parse_number(s, g),
        Some(c) if c.is_ascii_alphabetic() => parse_keyword(s, g),
        Some(c) => Err(ModelError::Token(format!(
            "unexpected character '{}' at position {}",
            c as char, s.pos
        ))),
        None => Err(ModelError::Token("unexpected end of input".to_string())),
    }
}

fn parse_object(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
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
        s.expect_str("=>")?;
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

fn parse_list(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
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

/// A bare string literal is either a plain STRING value, or — if
/// followed by `=>` — the name half of a standalone PROPERTY value.
fn parse_string_or_property(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let text = parse_string_literal(s)?;
    s.skip_ws();
    if s.starts_with("=>") {
        g.before(Event::StartProperty)?;
        g.after(Event::StartProperty)?;
        g.before(Event::Key)?;
        g.after(Event::Key)?;
        s.expect_str("=>")?;
        let child = parse_value(s, g)?;
        g.before(Event::EndProperty)?;
        g.after(Event::EndProperty)?;
        Ok(crate::value::from_property(text, child))
    } else {
        g.before(Event::Scalar)?;
        g.after(Event::Scalar)?;
        Ok(Value::string(text))
    }
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
                // Re-decode the UTF-8 codepoint starting at the previous byte.
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

fn parse_expression(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let start = s.pos;
    s.pos += 2; // "${"
    let mut depth = 1usize;
    while depth > 0 {
        match s.peek() {
            None => return Err(ModelError::Token("unterminated expression".to_string())),
            Some(b'}') => {
                s.pos += 1;
                depth -= 1;
            }
            Some(b'$') if s.starts_with("${") => {
                s.pos += 2;
                depth += 1;
            }
            Some(_) => s.pos += 1,
        }
    }
    let text = std::str::from_utf8(&s.bytes[start..s.pos]).unwrap().to_string();
    g.before(Event::Scalar)?;
    g.after(Event::Scalar)?;
    Ok(Value::expression(text))
}

fn parse_keyword(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let word_bytes = s.take_while(|b| b.is_ascii_alphabetic());
    let word = std::str::from_utf8(word_bytes).unwrap();
    match word {
        "undefined" => {
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::new())
        }
        "true" => {
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::boolean(true))
        }
        "false" => {
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::boolean(false))
        }
        "bytes" => {
            s.expect_byte(b'{')?;
            let mut bytes = Vec::new();
            s.skip_ws();
            if s.peek() == Some(b'}') {
                s.bump();
            } else {
                loop {
                    s.expect_str("0x")?;
                    let hex = s.take_while(|b| b.is_ascii_hexdigit());
                    let hex = std::str::from_utf8(hex).unwrap();
                    if hex.len() != 2 {
                        return Err(ModelError::Token(format!(
                            "expected a two-digit hex byte at position {}",
                            s.pos
                        )));
                    }
                    bytes.push(
                        u8::from_str_radix(hex, 16)
                            .map_err(|_| ModelError::Token("bad hex digit".to_string()))?,
                    );
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
            }
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::bytes(bytes))
        }
        "expression" => {
            s.skip_ws();
            if s.peek() != Some(b'"') {
                return Err(ModelError::Token(
                    "expected a quoted expression payload after 'expression'".to_string(),
                ));
            }
            let text = parse_string_literal(s)?;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::expression(text))
        }
        "big" => {
            s.skip_ws();
            if s.starts_with("integer") {
                s.pos += "integer".len();
                s.skip_ws();
                let (literal, has_frac, has_exp) = scan_plain_number(s)?;
                if has_frac || has_exp {
                    return Err(ModelError::Token(format!(
                        "big integer literal cannot have a fraction or exponent: {literal}"
                    )));
                }
                let n: BigInt = literal
                    .parse()
                    .map_err(|_| ModelError::Token(format!("bad big integer literal: {literal}")))?;
                g.before(Event::Scalar)?;
                g.after(Event::Scalar)?;
                Ok(Value::big_integer(n))
            } else if s.starts_with("decimal") {
                s.pos += "decimal".len();
                s.skip_ws();
                let (literal, _, _) = scan_plain_number(s)?;
                let d: BigDecimal = literal
                    .parse()
                    .map_err(|_| ModelError::Token(format!("bad big decimal literal: {literal}")))?;
                g.before(Event::Scalar)?;
                g.after(Event::Scalar)?;
                Ok(Value::big_decimal(d))
            } else {
                Err(ModelError::Token(format!(
                    "expected 'integer' or 'decimal' after 'big' at position {}",
                    s.pos
                )))
            }
        }
        "type" => {
            s.expect_byte(b'(')?;
            let name = s.take_while(|b| b != b')');
            let name = std::str::from_utf8(name).unwrap().trim();
            let tag: ValueType = name
                .parse()
                .map_err(|_| ModelError::Token(format!("not a recognized type name: {name}")))?;
            s.expect_byte(b')')?;
            g.before(Event::Scalar)?;
            g.after(Event::Scalar)?;
            Ok(Value::type_value(tag))
        }
        other => Err(ModelError::Token(format!("unrecognized keyword '{other}'"))),
    }
}

/// Scans a bare `-? digits ('.' digits)? ([eE] [+-]? digits)?` literal
/// (no trailing suffix), returning its text and whether it had a
/// fractional or exponent part. Shared by number literals and the
/// `big integer`/`big decimal` keyword forms, which take the same shape
/// without a suffix.
fn scan_plain_number<'a>(s: &mut Scanner<'a>) -> Result<(&'a str, bool, bool), ModelError> {
    let start = s.pos;
    if s.peek() == Some(b'-') {
        s.pos += 1;
    }
    let int_part = s.take_while(|b| b.is_ascii_digit());
    if int_part.is_empty() {
        return Err(ModelError::Token("expected digits".to_string()));
    }
    let mut has_frac = false;
    if s.peek() == Some(b'.') && matches!(s.peek_at(1), Some(b) if b.is_ascii_digit()) {
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
    Ok((
        std::str::from_utf8(&s.bytes[start..s.pos]).unwrap(),
        has_frac,
        has_exp,
    ))
}

fn parse_number(s: &mut Scanner<'_>, g: &mut Grammar) -> Result<Value, ModelError> {
    let (literal, has_frac, has_exp) = scan_plain_number(s)?;
    let literal = literal.to_string();
    let suffix = match s.peek() {
        Some(b'L') | Some(b'I') | Some(b'B') => s.bump(),
        _ => None,
    };

    g.before(Event::Scalar)?;
    g.after(Event::Scalar)?;

    let value = match suffix {
        Some(b'L') if !has_frac && !has_exp => {
            Value::long(literal.parse().map_err(|_| {
                ModelError::Token(format!("bad long literal: {literal}"))
            })?)
        }
        Some(b'I') if !has_frac && !has_exp => {
            let n: BigInt = literal
                .parse()
                .map_err(|_| ModelError::Token(format!("bad big integer literal: {literal}")))?;
            Value::big_integer(n)
        }
        Some(b'B') => {
            let d: BigDecimal = literal
                .parse()
                .map_err(|_| ModelError::Token(format!("bad big decimal literal: {literal}")))?;
            Value::big_decimal(d)
        }
        None if has_frac || has_exp => {
            Value::double(literal.parse().map_err(|_| {
                ModelError::Token(format!("bad double literal: {literal}"))
            })?)
        }
        None => match literal.parse::<i32>() {
            Ok(n) => Value::int(n),
            Err(_) => Value::long(
                literal
                    .parse()
                    .map_err(|_| ModelError::Token(format!("bad integer literal: {literal}")))?,
            ),
        },
        _ => unreachable!("suffix implies has_frac/has_exp already excluded above"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_undefined_and_booleans() {
        assert_eq!(parse("undefined").unwrap(), Value::new());
        assert_eq!(parse("true").unwrap(), Value::boolean(true));
        assert_eq!(parse("false").unwrap(), Value::boolean(false));
    }

    #[test]
    fn parses_suffixed_numbers() {
        assert_eq!(parse("42").unwrap(), Value::int(42));
        assert_eq!(parse("-5L").unwrap(), Value::long(-5));
        assert_eq!(parse("3.5").unwrap(), Value::double(3.5));
        assert_eq!(parse("100I").unwrap(), Value::big_integer(BigInt::from(100)));
        assert_eq!(
            parse("1.25B").unwrap(),
            Value::big_decimal(BigDecimal::new(BigInt::from(125), 2))
        );
    }

    #[test]
    fn parses_expression_keyword_form() {
        assert_eq!(
            parse(r#"expression "${foo:bar}""#).unwrap(),
            Value::expression("${foo:bar}")
        );
    }

    #[test]
    fn parses_big_integer_and_big_decimal_keyword_forms() {
        assert_eq!(
            parse("big integer 123456789012345").unwrap(),
            Value::big_integer(BigInt::from(123_456_789_012_345_i64))
        );
        assert_eq!(
            parse("big decimal 1.25").unwrap(),
            Value::big_decimal(BigDecimal::new(BigInt::from(125), 2))
        );
    }

    #[test]
    fn parses_spaced_hex_bytes() {
        assert_eq!(
            parse("bytes { 0xAA, 0xBB }").unwrap(),
            Value::bytes(vec![0xaa, 0xbb])
        );
        assert_eq!(parse("bytes {}").unwrap(), Value::bytes(vec![]));
    }

    #[test]
    fn scenario_2_literal_form_parses_to_an_expression() {
        assert_eq!(
            parse(r#"{"k" => expression "${foo:bar}"}"#).unwrap().require("k").unwrap(),
            &Value::expression("${foo:bar}")
        );
    }

    #[test]
    fn parses_escaped_string() {
        assert_eq!(
            parse(r#""a\nb\"c""#).unwrap(),
            Value::string("a\nb\"c")
        );
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(parse("[1, 2,]").is_err());
    }

    #[test]
    fn rejects_garbage_after_document() {
        assert!(parse("1 2").is_err());
    }
}
