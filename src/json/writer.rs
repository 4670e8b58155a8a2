//! Renders a [`Value`] tree into standard JSON, driven by the same
//! [`Grammar`] automaton the DMR writer uses. Four variants with no
//! native JSON syntax are wrapped in reserved single-key sentinel
//! objects on the way out.

use super::{BYTES_VALUE, EXPRESSION_VALUE, PROPERTY_VALUE, TYPE_MODEL_VALUE};
use crate::grammar::{Event, Grammar};
use crate::value::{Value, ValueType};

/// Single-line rendering.
pub fn render_compact(value: &Value) -> String {
    let mut out = String::new();
    let mut grammar = Grammar::new();
    write_value(value, &mut grammar, &mut out, None);
    out
}

/// Multi-line rendering, four spaces per nesting level. A container
/// only breaks onto multiple lines when it holds more than one element.
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
            out.push_str("null");
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
        }
        ValueType::Double => {
            scalar_event(g);
            out.push_str(&format_double(value.as_double().unwrap()));
        }
        ValueType::BigInteger => {
            scalar_event(g);
            out.push_str(&value.as_big_integer().unwrap().to_string());
        }
        ValueType::BigDecimal => {
            // No dedicated sentinel: JSON has no fixed-point numeric
            // type, so this collapses to the nearest native number,
            // same as going through DOUBLE.
            scalar_event(g);
            out.push_str(&format_double(value.as_double().unwrap()));
        }
        ValueType::String => {
            scalar_event(g);
            write_quoted(&value.as_string().unwrap(), out);
        }
        ValueType::Expression => write_sentinel_string(
            EXPRESSION_VALUE,
            &value.as_string().unwrap(),
            g,
            out,
            indent,
        ),
        ValueType::Bytes => write_sentinel_string(
            BYTES_VALUE,
            &crate::base64::encode_compact(&value.as_bytes().unwrap()),
            g,
            out,
            indent,
        ),
        ValueType::Type => write_sentinel_string(
            TYPE_MODEL_VALUE,
            value.as_value_type().unwrap().name(),
            g,
            out,
            indent,
        ),
        ValueType::List => write_list(value, g, out, indent),
        ValueType::Object => write_object(value, g, out, indent),
        ValueType::Property => write_property_sentinel(value, g, out, indent),
    }
}

fn scalar_event(g: &mut Grammar) {
    g.before(Event::Scalar).expect("scalar always valid in a well-formed tree");
    g.after(Event::Scalar).expect("scalar always valid in a well-formed tree");
}

/// Emits `{"SENTINEL_KEY": "text"}` as a single-entry object, running
/// it through the grammar as an object with exactly one key/scalar
/// pair so JSON objects and DMR objects stay on one automaton.
fn write_sentinel_string(
    key: &str,
    text: &str,
    g: &mut Grammar,
    out: &mut String,
    _indent: Option<usize>,
) {
    g.before(Event::StartObject).unwrap();
    g.after(Event::StartObject).unwrap();
    out.push('{');
    g.before(Event::Key).unwrap();
    g.after(Event::Key).unwrap();
    write_quoted(key, out);
    out.push_str(" : ");
    g.before(Event::Scalar).unwrap();
    g.after(Event::Scalar).unwrap();
    write_quoted(text, out);
    g.before(Event::EndObject).unwrap();
    g.after(Event::EndObject).unwrap();
    out.push('}');
}

fn write_list(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    g.before(Event::StartList).unwrap();
    g.after(Event::StartList).unwrap();
    out.push('[');
    let items = value.as_list().unwrap();
    let multiline = indent.is_some() && items.len() > 1;
    let child_indent = if multiline { indent.map(|d| d + 1) } else { None };
    for item in &items {
        let need_comma = g.before(peek_event(item)).unwrap();
        if need_comma {
            out.push(',');
            if !multiline {
                out.push(' ');
            }
        }
        if let Some(d) = child_indent {
            newline_indent(out, d);
        }
        write_value(item, g, out, child_indent);
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
    let entries: Vec<(String, Value)> = value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let multiline = indent.is_some() && entries.len() > 1;
    let child_indent = if multiline { indent.map(|d| d + 1) } else { None };
    for (key, child) in &entries {
        let need_comma = g.before(Event::Key).unwrap();
        if need_comma {
            out.push(',');
            if !multiline {
                out.push(' ');
            }
        }
        if let Some(d) = child_indent {
            newline_indent(out, d);
        }
        g.after(Event::Key).unwrap();
        write_quoted(key, out);
        out.push_str(" : ");
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

/// Emits `{"PROPERTY_VALUE": {"name": value}}`: a single-key outer
/// object wrapping a single-key inner object. Both levels hold exactly
/// one entry, so neither ever breaks onto multiple lines under
/// pretty-printing (the "more than one element" threshold never fires),
/// matching `write_sentinel_string`'s always-inline shape.
fn write_property_sentinel(value: &Value, g: &mut Grammar, out: &mut String, indent: Option<usize>) {
    let (name, child) = value.as_property_parts().unwrap();
    let name = name.to_string();
    let child = child.clone();

    g.before(Event::StartProperty).unwrap();
    g.after(Event::StartProperty).unwrap();

    out.push('{');
    g.before(Event::Key).unwrap();
    g.after(Event::Key).unwrap();
    write_quoted(PROPERTY_VALUE, out);
    out.push_str(" : ");

    out.push('{');
    write_quoted(&name, out);
    out.push_str(" : ");
    write_value(&child, g, out, indent.map(|d| d + 2));
    out.push('}');

    out.push('}');

    g.before(Event::EndProperty).unwrap();
    g.after(Event::EndProperty).unwrap();
}

fn peek_event(value: &Value) -> Event {
    match value.value_type() {
        ValueType::List => Event::StartList,
        ValueType::Object => Event::StartObject,
        ValueType::Property => Event::StartProperty,
        // BYTES/EXPRESSION/TYPE render as single-key sentinel objects.
        ValueType::Bytes | ValueType::Expression | ValueType::Type => Event::StartObject,
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

    #[test]
    fn renders_null_for_undefined() {
        assert_eq!(render_compact(&Value::new()), "null");
    }

    #[test]
    fn renders_list_of_scalars() {
        let mut list = Value::empty_list();
        list.get_index(0).unwrap().set_int(1).unwrap();
        list.get_index(1).unwrap().set_int(2).unwrap();
        assert_eq!(render_compact(&list), "[1, 2]");
    }
}
