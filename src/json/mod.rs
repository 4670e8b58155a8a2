//! The JSON-compatible dialect: standard JSON syntax, with four
//! reserved single-key sentinel objects standing in for the DMR
//! variants JSON has no native syntax for (`EXPRESSION_VALUE`,
//! `BYTES_VALUE`, `TYPE_MODEL_VALUE`, `PROPERTY_VALUE`).

pub mod reader;
pub mod writer;

pub use reader::parse;
pub use writer::{render_compact, render_pretty};

pub(crate) const EXPRESSION_VALUE: &str = "EXPRESSION_VALUE";
pub(crate) const BYTES_VALUE: &str = "BYTES_VALUE";
pub(crate) const TYPE_MODEL_VALUE: &str = "TYPE_MODEL_VALUE";
pub(crate) const PROPERTY_VALUE: &str = "PROPERTY_VALUE";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BigDecimal, Value, ValueType};
    use num_bigint::BigInt;

    #[test]
    fn round_trips_plain_object_and_array() {
        let mut root = Value::new();
        root.get("name").unwrap().set_string("crate").unwrap();
        root.get("items").unwrap().add().unwrap().set_int(1).unwrap();
        root.get("items").unwrap().add().unwrap().set_int(2).unwrap();

        let text = render_compact(&root);
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn undefined_round_trips_as_null() {
        let mut root = Value::new();
        root.get("maybe").unwrap();
        let text = render_compact(&root);
        assert!(text.contains("null"));
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn sentinel_values_round_trip() {
        let mut root = Value::new();
        root.get("e").unwrap().set_expression("${a:b}").unwrap();
        root.get("y").unwrap().set_bytes(vec![1, 2, 3]).unwrap();
        root.get("t").unwrap().set_type(ValueType::List).unwrap();
        root.get("p").unwrap()
            .set_property("k", Value::int(9))
            .unwrap();

        let text = render_compact(&root);
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn numbers_collapse_to_nearest_native_json_representation() {
        // BigDecimal has no dedicated JSON sentinel: it round-trips as a
        // plain numeric literal, so it comes back as a DOUBLE.
        let mut root = Value::new();
        root.get("d").unwrap()
            .set_big_decimal(BigDecimal::new(BigInt::from(125), 2))
            .unwrap();
        let text = render_compact(&root);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.require("d").unwrap().as_double().unwrap(), 1.25);
    }
}
