//! The native DMR textual grammar: `{"key" => value, ...}` objects,
//! `[v, v]` lists, `"key" => value` properties, suffixed numeric
//! literals, `bytes { 0xAA, 0xBB }` hex blocks, and bare `${...}`
//! expressions.

pub mod reader;
pub mod writer;

pub use reader::{parse, ParseError};
pub use writer::{render_compact, render_pretty};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn round_trips_a_small_object() {
        let mut root = Value::new();
        root.get("name").unwrap().set_string("crate").unwrap();
        root.get("count").unwrap().set_int(3).unwrap();
        root.get("tags").unwrap().add().unwrap().set_string("a").unwrap();

        let text = render_compact(&root);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn round_trips_every_scalar_kind() {
        use crate::value::{BigDecimal, ValueType};
        use num_bigint::BigInt;

        let mut root = Value::new();
        root.get("u").unwrap();
        root.get("b").unwrap().set_boolean(true).unwrap();
        root.get("i").unwrap().set_int(-7).unwrap();
        root.get("l").unwrap().set_long(9_000_000_000).unwrap();
        root.get("d").unwrap().set_double(2.5).unwrap();
        root.get("bi").unwrap()
            .set_big_integer(BigInt::from(123_456_789_012_i64))
            .unwrap();
        root.get("bd").unwrap()
            .set_big_decimal(BigDecimal::new(BigInt::from(125), 2))
            .unwrap();
        root.get("s").unwrap().set_string("hi \"there\"\n").unwrap();
        root.get("y").unwrap().set_bytes(vec![0xde, 0xad, 0xbe, 0xef]).unwrap();
        root.get("e").unwrap().set_expression("${a.b:fallback}").unwrap();
        root.get("t").unwrap().set_type(ValueType::Object).unwrap();

        let text = render_compact(&root);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn pretty_printing_still_parses_back() {
        let mut root = Value::new();
        root.get("a").unwrap().add().unwrap().set_int(1).unwrap();
        root.get("a").unwrap().add().unwrap().set_int(2).unwrap();
        let pretty = render_pretty(&root);
        assert_eq!(parse(&pretty).unwrap(), root);
    }
}
