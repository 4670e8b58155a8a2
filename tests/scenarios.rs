//! End-to-end scenarios: the six concrete walkthroughs from the
//! project's testable-properties section, plus the grammar-rejection
//! sweep over a curated list of malformed event sequences.

use dmr::{BigDecimal, SimpleEnvironment, Value, ValueType};
use num_bigint::BigInt;

#[test]
fn scenario_1_object_with_list_renders_in_both_dialects() {
    let mut root = Value::new();
    root.get("a").unwrap().set_int(1).unwrap();
    let list = root.get("b").unwrap();
    list.add().unwrap().set_string("x").unwrap();
    list.add().unwrap().set_boolean(true).unwrap();

    assert_eq!(root.to_string_compact(), r#"{"a" => 1,"b" => ["x",true]}"#);
    assert_eq!(root.to_json_compact(), r#"{"a" : 1, "b" : ["x", true]}"#);
}

#[test]
fn scenario_2_expression_resolves_against_environment_or_falls_back() {
    let mut root = Value::new();
    root.get("k").unwrap().set_expression("${foo:bar}").unwrap();

    let parsed = Value::from_string(r#"{"k" => expression "${foo:bar}"}"#).unwrap();
    assert_eq!(parsed, root);

    let present = SimpleEnvironment::new().with_property("foo", "7");
    let resolved = root.resolve(&present).unwrap();
    let mut expected = Value::new();
    expected.get("k").unwrap().set_string("7").unwrap();
    assert_eq!(resolved, expected);

    let empty = SimpleEnvironment::new();
    let resolved = root.resolve(&empty).unwrap();
    let mut expected = Value::new();
    expected.get("k").unwrap().set_string("bar").unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn scenario_3_binary_encoding_of_list_of_bytes_matches_the_wire_shape() {
    let mut root = Value::empty_list();
    root.add().unwrap().set_bytes(vec![0xde, 0xad, 0xbe, 0xef]).unwrap();

    let encoded = dmr::binary::encode_to_vec(&root);
    let mut expected = vec![b'l', 0, 0, 0, 1];
    expected.push(b'Y');
    expected.extend_from_slice(&[0, 0, 0, 4]);
    expected.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(encoded, expected);
}

#[test]
fn scenario_4_json_property_sentinel_parses_into_a_property_value() {
    let parsed = Value::from_json(r#"{"PROPERTY_VALUE" : {"n" : 42}}"#).unwrap();
    assert_eq!(parsed.value_type(), ValueType::Property);
    assert_eq!(parsed.property_name(), Some("n"));
    assert_eq!(parsed.require_index(0).unwrap().as_int().unwrap(), 42);
}

#[test]
fn scenario_5_protecting_a_tree_rejects_further_mutation() {
    let mut root = Value::new();
    root.get("x").unwrap().add().unwrap().set_int(1).unwrap();
    root.protect();

    let err = root.get("x").unwrap().add().unwrap_err();
    assert!(err.to_string().contains("unsupported mutation"));
    assert_eq!(root.require("x").unwrap().as_list().unwrap().len(), 1);
}

#[test]
fn scenario_6_base64_envelope_of_empty_object_matches_wire_form() {
    let empty = Value::empty_object();
    let encoded = dmr::binary::encode_to_vec(&empty);
    assert_eq!(encoded, vec![b'O', 0, 0, 0, 0]);
    assert_eq!(dmr::from_base64(&dmr::to_base64(&empty)).unwrap(), empty);
}

#[test]
fn grammar_rejects_a_curated_list_of_malformed_documents() {
    let malformed = [
        "[, 1]",
        r#"{"a" 1}"#,
        "[1, 2,]",
        r#"{"a" => 1,}"#,
        "1 2",
        "[1 2]",
        r#"{"a" => }"#,
    ];
    for doc in malformed {
        let result = Value::from_string(doc);
        assert!(result.is_err(), "expected {doc:?} to be rejected");
        assert!(!result.unwrap_err().to_string().is_empty());
    }

    let malformed_json = [
        "[,1]",
        r#"{"a" 1}"#,
        "[1,2,]",
        "1 2",
    ];
    for doc in malformed_json {
        let result = Value::from_json(doc);
        assert!(result.is_err(), "expected {doc:?} to be rejected");
    }
}

#[test]
fn big_decimal_round_trips_through_native_text() {
    let mut root = Value::new();
    root.get("d").unwrap()
        .set_big_decimal(BigDecimal::new(BigInt::from(125), 2))
        .unwrap();
    let text = root.to_string_compact();
    assert_eq!(Value::from_string(&text).unwrap(), root);
}
