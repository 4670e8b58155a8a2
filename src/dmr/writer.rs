//! Renders a [`Value`] tree back into the native DMR textual grammar,
//! driven by the same [`Grammar`] automaton the reader uses so comma
//! placement is computed in one place.

use crate::grammar::{Event, Grammar};
use crate::value::{Value, ValueType};

/// Single-line rendering: no extra whitespace beyond what the grammar
/// requires (a space after `=>` and after each `,`).
pub fn render_compact(value: &Value) -> String {
    let mut out = String::new();
    let mut grammar = Grammar::new();
    write_value(value, &mut grammar, &mut out, None);
    out
}

/// Multi-line rendering, four spaces per nesting level. A container
/// only breaks onto multiple lines when it holds more than one element;
/// single-element and empty containers stay on one line.
pub fn render_pretty(value: &Value) -> String {
    let mut out = String::new();
    let mut grammar = Grammar::new();
    write_value(value, &mut grammar, &mut out, Some(0));
    out
}

fn newline_indent(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("    ");
    }
}

fn write_value(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    match value.value_type() {
        ValueType::Undefined => {
            scalar_event(g);
            out.push_str("undefined");
        }
        ValueType::Boolean => {
            scalar_event(g);
            out.push_str(if value.as_boolean().unwrap() { "true" } else { "false" });
        }
        ValueType::Int => {
            scalar_event(g);
            out.push_str(&value.as_int().unwrap().to_string());
        }
        ValueType::Long => {
            scalar_event(g);
            out.push_str(&value.as_long().unwrap().to_string());
            out.push('L');
        }
        ValueType::Double => {
            scalar_event(g);
            out.push_str(&format_double(value.as_double().unwrap()));
        }
        ValueType::BigInteger => {
            scalar_event(g);
            out.push_str(&value.as_big_integer().unwrap().to_string());
            out.push('I');
        }
        ValueType::BigDecimal => {
            scalar_event(g);
            out.push_str(&value.as_big_decimal().unwrap().to_string());
            out.push('B');
        }
        ValueType::String => {
            scalar_event(g);
            write_quoted(&value.as_string().unwrap(), out);
        }
        ValueType::Expression => {
            scalar_event(g);
            out.push_str(&value.as_string().unwrap());
        }
        ValueType::Bytes => {
            scalar_event(g);
            let bytes = value.as_bytes().unwrap();
            out.push_str("bytes {");
            for (i, b) in bytes.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { ", " });
                out.push_str(&format!("0x{b:02X}"));
            }
            if !bytes.is_empty() {
                out.push(' ');
            }
            out.push('}');
        }
        ValueType::Type => {
            scalar_event(g);
            out.push_str("type(");
            out.push_str(value.as_value_type().unwrap().name());
            out.push(')');
        }
        ValueType::List => write_list(value, g, out, indent),
        ValueType::Object => write_object(value, g, out, indent),
        ValueType::Property => write_property(value, g, out, indent),
    }
}

fn scalar_event(g: &mut Grammar) {
    g.before(Event::Scalar).expect("scalar always valid in a well-formed tree");
    g.after(Event::Scalar).expect("scalar always valid in a well-formed tree");
}

fn write_list(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    g.before(Event::StartList).unwrap();
    g.after(Event::StartList).unwrap();
    out.push('[');
    let multiline = indent.is_some() && value.len() > 1;
    let child_indent = if multiline { indent.map(|d| d + 1) } else { None };
    for item in value.as_list().unwrap() {
        let need_comma = g.before(peek_event(&item)).unwrap();
        if need_comma {
            out.push(',');
        }
        if let Some(d) = child_indent {
            newline_indent(out, d);
        }
        write_value(&item, g, out, child_indent);
    }
    if let Some(d) = indent {
        if multiline {
            newline_indent(out, d);
        }
    }
    g.before(Event::EndList).unwrap();
    g.after(Event::EndList).unwrap();
    out.push(']');
}

fn write_object(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    g.before(Event::StartObject).unwrap();
    g.after(Event::StartObject).unwrap();
    out.push('{');
    let multiline = indent.is_some() && value.len() > 1;
    let child_indent = if multiline { indent.map(|d| d + 1) } else { None };
    let entries: Vec<(String, Value)> = value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, child) in &entries {
        let need_comma = g.before(Event::Key).unwrap();
        if need_comma {
            out.push(',');
        }
        if let Some(d) = child_indent {
            newline_indent(out, d);
        }
        g.after(Event::Key).unwrap();
        write_quoted(key, out);
        out.push_str(" => ");
        write_value(child, g, out, child_indent);
    }
    if let Some(d) = indent {
        if multiline {
            newline_indent(out, d);
        }
    }
    g.before(Event::EndObject).unwrap();
    g.after(Event::EndObject).unwrap();
    out.push('}');
}

fn write_property(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    let (name, child) = value.as_property_parts().unwrap();
    let name = name.to_string();
    let child = child.clone();
    g.before(Event::StartProperty).unwrap();
    g.after(Event::StartProperty).unwrap();
    g.before(Event::Key).unwrap();
    g.after(Event::Key).unwrap();
    write_quoted(&name, out);
    out.push_str(" => ");
    write_value(&child, g, out, indent);
    g.before(Event::EndProperty).unwrap();
    g.after(Event::EndProperty).unwrap();
}

/// The grammar event a value will emit first, used only to ask the
/// automaton whether a preceding comma is needed before this element.
fn peek_event(value: &Value) -> Event {
    match value.value_type() {
        ValueType::List => Event::StartList,
        ValueType::Object => Event::StartObject,
        ValueType::Property => Event::StartProperty,
        _ => Event::Scalar,
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn format_double(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 1e17 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BigDecimal;
    use num_bigint::BigInt;

    #[test]
    fn renders_bytes_with_spaces_and_0x_prefix() {
        let v = Value::bytes(vec![0xaa, 0xbb]);
        assert_eq!(render_compact(&v), "bytes { 0xAA, 0xBB }");
        assert_eq!(render_compact(&Value::bytes(vec![])), "bytes {}");
    }

    #[test]
    fn renders_big_decimal_with_b_suffix() {
        let v = Value::big_decimal(BigDecimal::new(BigInt::from(125), 2));
        assert_eq!(render_compact(&v), "1.25B");
    }
}
