use super::*;

#[test]
fn fresh_value_is_undefined() {
    let v = Value::new();
    assert_eq!(v.value_type(), ValueType::Undefined);
    assert!(!v.is_defined());
}

#[test]
fn auto_vivification_builds_a_chain() {
    let mut root = Value::new();
    root.get("a").unwrap().get("b").unwrap().get("c").unwrap();
    assert!(root.has_path(&["a", "b", "c"]));
    assert_eq!(
        root.require("a").unwrap().require("b").unwrap().require("c").unwrap().value_type(),
        ValueType::Undefined
    );
}

#[test]
fn get_on_list_grows_by_one() {
    let mut root = Value::new();
    root.get_index(0).unwrap().set_int(1).unwrap();
    root.get_index(1).unwrap().set_int(2).unwrap();
    assert_eq!(root.require_index(0).unwrap().as_int().unwrap(), 1);
    assert_eq!(root.require_index(1).unwrap().as_int().unwrap(), 2);
    assert!(root.get_index(3).is_err());
}

#[test]
fn object_preserves_insertion_order_across_replace() {
    let mut root = Value::new();
    root.get("k1").unwrap().set_int(1).unwrap();
    root.get("k2").unwrap().set_int(2).unwrap();
    root.get("k3").unwrap().set_int(3).unwrap();
    root.get("k2").unwrap().set_int(20).unwrap();
    let keys: Vec<&str> = root
        .as_object()
        .unwrap()
        .keys()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(keys, vec!["k1", "k2", "k3"]);
    assert_eq!(root.require("k2").unwrap().as_int().unwrap(), 20);
}

#[test]
fn clone_is_independent_and_unprotected() {
    let mut root = Value::new();
    root.get("x").unwrap().set_int(1).unwrap();
    root.protect();
    let mut cloned = root.clone();
    assert!(!cloned.is_protected());
    cloned.get("x").unwrap().set_int(2).unwrap();
    assert_eq!(root.require("x").unwrap().as_int().unwrap(), 1);
    assert_eq!(cloned.require("x").unwrap().as_int().unwrap(), 2);
    assert_eq!(root.clone(), root);
}

#[test]
fn protect_is_transitive_and_rejects_mutation() {
    let mut root = Value::new();
    root.get("x").unwrap().set_empty_list().unwrap();
    root.get("x").unwrap().add().unwrap().set_int(1).unwrap();
    root.protect();
    assert!(root.get("x").unwrap().add().is_err());
    assert_eq!(root.require("x").unwrap().as_list().unwrap().len(), 1);
}

#[test]
fn equality_and_hash_are_structural_and_tag_sensitive() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let a = Value::int(1);
    let b = Value::long(1);
    assert_ne!(a, b);

    let mut c = Value::new();
    c.get("k").unwrap().set_int(1).unwrap();
    let mut d = Value::new();
    d.get("k").unwrap().set_int(1).unwrap();
    assert_eq!(c, d);

    let mut hc = DefaultHasher::new();
    c.hash(&mut hc);
    let mut hd = DefaultHasher::new();
    d.hash(&mut hd);
    assert_eq!(hc.finish(), hd.finish());
}

#[test]
fn remove_returns_removed_child_and_preserves_order() {
    let mut root = Value::new();
    root.get("a").unwrap().set_int(1).unwrap();
    root.get("b").unwrap().set_int(2).unwrap();
    root.get("c").unwrap().set_int(3).unwrap();
    let removed = root.remove("b").unwrap();
    assert_eq!(removed.as_int().unwrap(), 2);
    let keys: Vec<&str> = root.as_object().unwrap().keys().map(|s| s.as_str()).collect();
    assert_eq!(keys, vec!["a", "c"]);
    assert!(root.remove("missing").is_none());
}

#[test]
fn conversion_matrix_sample() {
    assert_eq!(Value::boolean(true).as_int().unwrap(), 1);
    assert_eq!(Value::string("42").as_int().unwrap(), 42);
    assert_eq!(Value::int(7).as_string().unwrap(), "7");
    assert!(Value::new().as_int().is_err());
    assert_eq!(Value::new().as_int_or(9).unwrap(), 9);
    assert_eq!(Value::new().as_int_or_null().unwrap(), None);
}
