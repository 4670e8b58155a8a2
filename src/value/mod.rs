//! The value tree: a recursive, tagged sum type with mutation, deep
//! copy, protect, and resolve transformations.

mod bigdecimal;
mod convert;
mod tag;

pub use bigdecimal::BigDecimal;
pub use tag::ValueType;

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{ModelError, NoSuchElementError, ValueError};
use crate::expression::{self, ExpressionEnvironment};

/// One node of a Dynamic Model Representation tree.
///
/// `Value` owns its payload; two independent values never share mutable
/// state, because every mutating entry point deep-copies whatever it is
/// given. The sole exception is the `from_entries`/`from_elements`/
/// `from_property` family below, used by the DMR and JSON readers to
/// assemble a container directly from already-parsed children without
/// paying for the auto-vivification path.
#[derive(Debug)]
pub struct Value {
    data: Data,
    protected: bool,
}

#[derive(Debug, Clone)]
enum Data {
    Undefined,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Expression(String),
    Type(ValueType),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
    Property(String, Box<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value {
            data: Data::Undefined,
            protected: false,
        }
    }
}

/// Cloning always produces an independent, unprotected deep copy:
/// protection is never carried across a clone, at any depth.
impl Clone for Value {
    fn clone(&self) -> Self {
        Value {
            data: self.data.clone(),
            protected: false,
        }
    }
}

/// Structural: tag + payload, recursively. The protection bit never
/// participates.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Data::*;
        match (&self.data, &other.data) {
            (Undefined, Undefined) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (BigInteger(a), BigInteger(b)) => a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Expression(a), Expression(b)) => a == b,
            (Type(a), Type(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Object(a), Object(b)) => a.len() == b.len() && a.iter().eq(b.iter()),
            (Property(ak, av), Property(bk, bv)) => ak == bk && av == bv,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Data::*;
        std::mem::discriminant(&self.data).hash(state);
        match &self.data {
            Undefined => {}
            Boolean(b) => b.hash(state),
            Int(n) => n.hash(state),
            Long(n) => n.hash(state),
            Double(n) => n.to_bits().hash(state),
            BigInteger(n) => n.hash(state),
            BigDecimal(n) => n.hash(state),
            String(s) => s.hash(state),
            Bytes(b) => b.hash(state),
            Expression(s) => s.hash(state),
            Type(t) => t.hash(state),
            List(items) => items.hash(state),
            Object(map) => {
                for (k, v) in map {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Property(k, v) => {
                k.hash(state);
                v.hash(state);
            }
        }
    }
}

macro_rules! scalar_ctor {
    ($new:ident, $setter:ident, $variant:ident, $t:ty) => {
        pub fn $new(value: $t) -> Self {
            Value {
                data: Data::$variant(value),
                protected: false,
            }
        }

        pub fn $setter(&mut self, value: $t) -> Result<(), ValueError> {
            self.ensure_mutable()?;
            self.data = Data::$variant(value);
            Ok(())
        }
    };
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    scalar_ctor!(boolean, set_boolean, Boolean, bool);
    scalar_ctor!(int, set_int, Int, i32);
    scalar_ctor!(long, set_long, Long, i64);
    scalar_ctor!(double, set_double, Double, f64);
    scalar_ctor!(big_integer, set_big_integer, BigInteger, BigInt);
    scalar_ctor!(big_decimal, set_big_decimal, BigDecimal, BigDecimal);
    scalar_ctor!(bytes, set_bytes, Bytes, Vec<u8>);
    scalar_ctor!(type_value, set_type, Type, ValueType);

    pub fn string(value: impl Into<String>) -> Self {
        Value {
            data: Data::String(value.into()),
            protected: false,
        }
    }

    pub fn set_string(&mut self, value: impl Into<String>) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::String(value.into());
        Ok(())
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Value {
            data: Data::Expression(value.into()),
            protected: false,
        }
    }

    pub fn set_expression(&mut self, value: impl Into<String>) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::Expression(value.into());
        Ok(())
    }

    pub fn empty_list() -> Self {
        Value {
            data: Data::List(Vec::new()),
            protected: false,
        }
    }

    pub fn set_empty_list(&mut self) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::List(Vec::new());
        Ok(())
    }

    pub fn empty_object() -> Self {
        Value {
            data: Data::Object(IndexMap::new()),
            protected: false,
        }
    }

    pub fn set_empty_object(&mut self) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::Object(IndexMap::new());
        Ok(())
    }

    /// `set(property-name, child)`: turns this node into a PROPERTY.
    pub fn set_property(&mut self, name: impl Into<String>, child: Value) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::Property(name.into(), Box::new(child));
        Ok(())
    }

    /// `set(collection-of-children)`: turns this node into a LIST.
    pub fn set_children(&mut self, children: impl IntoIterator<Item = Value>) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::List(children.into_iter().collect());
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), ValueError> {
        self.ensure_mutable()?;
        self.data = Data::Undefined;
        Ok(())
    }

    pub fn value_type(&self) -> ValueType {
        match &self.data {
            Data::Undefined => ValueType::Undefined,
            Data::Boolean(_) => ValueType::Boolean,
            Data::Int(_) => ValueType::Int,
            Data::Long(_) => ValueType::Long,
            Data::Double(_) => ValueType::Double,
            Data::BigInteger(_) => ValueType::BigInteger,
            Data::BigDecimal(_) => ValueType::BigDecimal,
            Data::String(_) => ValueType::String,
            Data::Bytes(_) => ValueType::Bytes,
            Data::Expression(_) => ValueType::Expression,
            Data::Type(_) => ValueType::Type,
            Data::List(_) => ValueType::List,
            Data::Object(_) => ValueType::Object,
            Data::Property(..) => ValueType::Property,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value_type() != ValueType::Undefined
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    fn ensure_mutable(&self) -> Result<(), ValueError> {
        if self.protected {
            Err(ValueError::Protected)
        } else {
            Ok(())
        }
    }

    /// Marks this node and every reachable descendant as protected
    /// (post-order). Idempotent.
    pub fn protect(&mut self) {
        match &mut self.data {
            Data::List(items) => items.iter_mut().for_each(Value::protect),
            Data::Object(map) => map.values_mut().for_each(Value::protect),
            Data::Property(_, child) => child.protect(),
            _ => {}
        }
        self.protected = true;
    }

    /// A deep copy in which every EXPRESSION payload has been
    /// substituted against `env`.
    pub fn resolve(&self, env: &dyn ExpressionEnvironment) -> Result<Value, ModelError> {
        let data = match &self.data {
            Data::Expression(text) => Data::String(expression::resolve(text, env)?),
            Data::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.resolve(env)?);
                }
                Data::List(out)
            }
            Data::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), v.resolve(env)?);
                }
                Data::Object(out)
            }
            Data::Property(name, child) => {
                Data::Property(name.clone(), Box::new(child.resolve(env)?))
            }
            other => other.clone(),
        };
        Ok(Value {
            data,
            protected: false,
        })
    }

    // -- child access --------------------------------------------------

    /// Queries and, on an UNDEFINED node or a present-but-absent key,
    /// inserts: the auto-vivification mechanism that makes
    /// `get("a").get("b").get("c")` build a three-level OBJECT chain.
    pub fn get(&mut self, key: &str) -> Result<&mut Value, ValueError> {
        if !self.is_defined() {
            self.set_empty_object()?;
        }
        match &mut self.data {
            Data::Object(map) => {
                if !map.contains_key(key) {
                    self.ensure_mutable()?;
                }
                Ok(map.entry(key.to_string()).or_insert_with(Value::new))
            }
            Data::Property(name, child) => {
                if name == key {
                    Ok(child)
                } else {
                    Err(ValueError::IllegalState(format!(
                        "property named '{name}' has no child '{key}'"
                    )))
                }
            }
            other => Err(ValueError::IllegalState(format!(
                "get(key) not supported on {}",
                describe(&*other)
            ))),
        }
    }

    /// Queries and, on an UNDEFINED node or an index one past the end,
    /// grows the LIST by exactly one UNDEFINED element.
    pub fn get_index(&mut self, index: usize) -> Result<&mut Value, ValueError> {
        if !self.is_defined() {
            self.set_empty_list()?;
        }
        match &mut self.data {
            Data::List(items) => {
                if index < items.len() {
                    Ok(&mut items[index])
                } else if index == items.len() {
                    self.ensure_mutable()?;
                    if let Data::List(items) = &mut self.data {
                        items.push(Value::new());
                        Ok(items.last_mut().unwrap())
                    } else {
                        unreachable!()
                    }
                } else {
                    Err(ValueError::IllegalArgument(format!(
                        "index {index} out of bounds"
                    )))
                }
            }
            Data::Property(name, child) => {
                if index == 0 {
                    let _ = name;
                    Ok(child)
                } else {
                    Err(ValueError::IllegalState(format!(
                        "property has no child at index {index}"
                    )))
                }
            }
            other => Err(ValueError::IllegalState(format!(
                "get(index) not supported on {}",
                describe(&*other)
            ))),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match &mut self.data {
            Data::Object(map) => map.shift_remove(key),
            _ => None,
        }
    }

    pub fn remove_index(&mut self, index: usize) -> Option<Value> {
        match &mut self.data {
            Data::List(items) if index < items.len() => Some(items.remove(index)),
            _ => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match &self.data {
            Data::Object(map) => map.contains_key(key),
            Data::Property(name, _) => name == key,
            _ => false,
        }
    }

    pub fn has_index(&self, index: usize) -> bool {
        match &self.data {
            Data::List(items) => index < items.len(),
            Data::Property(..) => index == 0,
            _ => false,
        }
    }

    pub fn has_defined(&self, key: &str) -> bool {
        self.has(key) && self.peek(key).map(Value::is_defined).unwrap_or(false)
    }

    /// Short-circuit conjunction over a sequence of keys.
    pub fn has_path(&self, path: &[&str]) -> bool {
        let mut current = self;
        for key in path {
            if !current.has(key) {
                return false;
            }
            match current.peek(key) {
                Some(next) => current = next,
                None => return false,
            }
        }
        true
    }

    fn peek(&self, key: &str) -> Option<&Value> {
        match &self.data {
            Data::Object(map) => map.get(key),
            Data::Property(name, child) if name == key => Some(child),
            _ => None,
        }
    }

    /// Pure query: the child at `key`, never auto-vivifying.
    pub fn require(&self, key: &str) -> Result<&Value, NoSuchElementError> {
        self.peek(key)
            .ok_or_else(|| NoSuchElementError(format!("no child named '{key}'")))
    }

    pub fn require_index(&self, index: usize) -> Result<&Value, NoSuchElementError> {
        match &self.data {
            Data::List(items) => items
                .get(index)
                .ok_or_else(|| NoSuchElementError(format!("no element at index {index}"))),
            Data::Property(_, child) if index == 0 => Ok(child),
            _ => Err(NoSuchElementError(format!("no element at index {index}"))),
        }
    }

    /// Appends a new UNDEFINED element to a LIST (auto-promoting an
    /// UNDEFINED node) and returns it.
    pub fn add(&mut self) -> Result<&mut Value, ValueError> {
        if !self.is_defined() {
            self.set_empty_list()?;
        }
        self.ensure_mutable()?;
        match &mut self.data {
            Data::List(items) => {
                items.push(Value::new());
                Ok(items.last_mut().unwrap())
            }
            other => Err(ValueError::IllegalState(format!(
                "add() not supported on {}",
                describe(&*other)
            ))),
        }
    }

    /// Inserts a new UNDEFINED element at `index` (`0 <= index <= len`).
    pub fn insert(&mut self, index: usize) -> Result<&mut Value, ValueError> {
        if !self.is_defined() {
            self.set_empty_list()?;
        }
        self.ensure_mutable()?;
        match &mut self.data {
            Data::List(items) => {
                if index > items.len() {
                    return Err(ValueError::IllegalArgument(format!(
                        "index {index} out of bounds"
                    )));
                }
                items.insert(index, Value::new());
                Ok(&mut items[index])
            }
            other => Err(ValueError::IllegalState(format!(
                "insert(index) not supported on {}",
                describe(&*other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            Data::List(items) => items.len(),
            Data::Object(map) => map.len(),
            Data::Property(..) => 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// LIST elements in order, or OBJECT `(key, value)` pairs in
    /// insertion order.
    pub fn iter(&self) -> ValueIter<'_> {
        match &self.data {
            Data::List(items) => ValueIter::List(items.iter()),
            Data::Object(map) => ValueIter::Object(map.iter()),
            _ => ValueIter::Empty,
        }
    }

    pub(crate) fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match &self.data {
            Data::Object(map) => Some(map),
            _ => None,
        }
    }

    pub(crate) fn as_list_slice(&self) -> Option<&[Value]> {
        match &self.data {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    /// The name half of a PROPERTY node, or `None` for any other tag.
    pub fn property_name(&self) -> Option<&str> {
        match &self.data {
            Data::Property(name, _) => Some(name.as_str()),
            _ => None,
        }
    }

    pub(crate) fn as_property_parts(&self) -> Option<(&str, &Value)> {
        match &self.data {
            Data::Property(name, child) => Some((name.as_str(), child)),
            _ => None,
        }
    }

    /// Move constructor used only by `from_entries`/`from_elements`/
    /// `from_property` below, to avoid copying subtrees while assembling
    /// a value a reader has already fully parsed. Never exposed outside
    /// the crate.
    pub(crate) fn from_parts(data: ValueData) -> Self {
        Value {
            data: data.0,
            protected: false,
        }
    }
}

/// Builds an OBJECT directly from a fully-assembled map, without paying
/// for the auto-vivification path. Used by readers that already parsed
/// the whole entry set (in order) before constructing the node.
pub(crate) fn from_entries(entries: IndexMap<String, Value>) -> Value {
    Value::from_parts(ValueData::object(entries))
}

/// Builds a LIST directly from a fully-assembled element vector.
pub(crate) fn from_elements(items: Vec<Value>) -> Value {
    Value::from_parts(ValueData::list(items))
}

/// Builds a PROPERTY directly from a name and child value.
pub(crate) fn from_property(name: String, child: Value) -> Value {
    Value::from_parts(ValueData::property(name, child))
}

/// Opaque wrapper so the tree builder can hand a constructed payload to
/// [`Value::from_parts`] without exposing `Data` publicly.
pub(crate) struct ValueData(Data);

impl ValueData {
    pub(crate) fn undefined() -> Self {
        ValueData(Data::Undefined)
    }
    pub(crate) fn list(items: Vec<Value>) -> Self {
        ValueData(Data::List(items))
    }
    pub(crate) fn object(map: IndexMap<String, Value>) -> Self {
        ValueData(Data::Object(map))
    }
    pub(crate) fn property(name: String, value: Value) -> Self {
        ValueData(Data::Property(name, Box::new(value)))
    }
}

fn describe(data: &Data) -> ValueType {
    match data {
        Data::Undefined => ValueType::Undefined,
        Data::Boolean(_) => ValueType::Boolean,
        Data::Int(_) => ValueType::Int,
        Data::Long(_) => ValueType::Long,
        Data::Double(_) => ValueType::Double,
        Data::BigInteger(_) => ValueType::BigInteger,
        Data::BigDecimal(_) => ValueType::BigDecimal,
        Data::String(_) => ValueType::String,
        Data::Bytes(_) => ValueType::Bytes,
        Data::Expression(_) => ValueType::Expression,
        Data::Type(_) => ValueType::Type,
        Data::List(_) => ValueType::List,
        Data::Object(_) => ValueType::Object,
        Data::Property(..) => ValueType::Property,
    }
}

pub enum ValueIter<'a> {
    List(std::slice::Iter<'a, Value>),
    Object(indexmap::map::Iter<'a, String, Value>),
    Empty,
}

pub enum ValueItem<'a> {
    Element(&'a Value),
    Entry(&'a str, &'a Value),
}

impl<'a> Iterator for ValueIter<'a> {
    type Item = ValueItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ValueIter::List(it) => it.next().map(ValueItem::Element),
            ValueIter::Object(it) => it.next().map(|(k, v)| ValueItem::Entry(k, v)),
            ValueIter::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests;
