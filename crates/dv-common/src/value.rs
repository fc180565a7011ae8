//! Runtime values and the object capability contract.
//!
//! The resolver never knows the concrete type of the object it inspects. It
//! only relies on [`Object`]: a type identity, an id, a label, and a
//! single-segment attribute lookup. Dotted paths are walked one segment at a
//! time through nested [`Value::Object`]s.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::html::SafeHtml;
use crate::id::{ObjectId, TypeKey};

/// Shared handle to an inspectable object.
pub type ObjectRef = Arc<dyn Object>;

/// Capability contract for anything a detail view can display.
pub trait Object: fmt::Debug + Send + Sync {
    /// Namespaced type identity used for routing.
    fn type_key(&self) -> TypeKey;

    /// Identifier unique within the type.
    fn object_id(&self) -> ObjectId;

    /// Human-readable name of the object (its page title and link text).
    fn label(&self) -> String;

    /// Look up one attribute by name. `None` means the attribute does not
    /// exist; an attribute holding no value returns `Some(Value::None)`.
    fn attr(&self, name: &str) -> Option<Value>;

    /// Type name used in error messages.
    fn type_name(&self) -> String {
        self.type_key().to_string()
    }
}

/// Monetary amount in minor units (cents) of an ISO currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Money {
    pub minor_units: i64,
    pub currency: Currency,
}

/// Three-letter ISO 4217 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency([u8; 3]);

impl Currency {
    /// Parse a three-letter code. Returns `None` for anything else.
    pub fn new(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        let mut out = [0u8; 3];
        for (slot, b) in out.iter_mut().zip(bytes) {
            *slot = b.to_ascii_uppercase();
        }
        Some(Currency(out))
    }

    pub fn code(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl Money {
    pub fn new(minor_units: i64, currency: Currency) -> Self {
        Money {
            minor_units,
            currency,
        }
    }
}

/// A stored file (image upload, attachment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

/// Runtime value of an attribute.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Timestamp with a zone offset.
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Money(Money),
    File(FileRef),
    /// Markup produced by a value function.
    Html(SafeHtml),
    Object(ObjectRef),
    List(Vec<Value>),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Money(_) => "money",
            Value::File(_) => "file",
            Value::Html(_) => "html",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }

    /// Plain text form of the value, with no formatting rules applied.
    pub fn text_form(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Money(m) => {
                let sign = if m.minor_units < 0 { "-" } else { "" };
                let abs = m.minor_units.unsigned_abs();
                format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, m.currency)
            }
            Value::File(f) => f.name.clone(),
            Value::Html(h) => h.as_str().to_string(),
            Value::Object(obj) => obj.label(),
            Value::List(items) => items
                .iter()
                .map(Value::text_form)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text_form())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::Money(m) => m.serialize(serializer),
            Value::File(f) => f.serialize(serializer),
            Value::Html(h) => h.serialize(serializer),
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", &obj.type_key().to_string())?;
                map.serialize_entry("id", obj.object_id().as_str())?;
                map.serialize_entry("label", &obj.label())?;
                map.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt.fixed_offset())
    }
}

impl From<Money> for Value {
    fn from(m: Money) -> Self {
        Value::Money(m)
    }
}

impl From<FileRef> for Value {
    fn from(f: FileRef) -> Self {
        Value::File(f)
    }
}

impl From<SafeHtml> for Value {
    fn from(h: SafeHtml) -> Self {
        Value::Html(h)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}

/// A bounded, sliceable collection of objects.
///
/// `count` must not require materializing the whole collection when the
/// backing store can avoid it; `head` returns at most `limit` objects in
/// iteration order (all of them for `None`).
pub trait ObjectSet {
    fn count(&self) -> usize;
    fn head(&self, limit: Option<usize>) -> Vec<ObjectRef>;
}

impl ObjectSet for [ObjectRef] {
    fn count(&self) -> usize {
        self.len()
    }

    fn head(&self, limit: Option<usize>) -> Vec<ObjectRef> {
        let n = limit.unwrap_or(self.len()).min(self.len());
        self[..n].to_vec()
    }
}

impl ObjectSet for Vec<ObjectRef> {
    fn count(&self) -> usize {
        self.as_slice().count()
    }

    fn head(&self, limit: Option<usize>) -> Vec<ObjectRef> {
        self.as_slice().head(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thing(u64);

    impl Object for Thing {
        fn type_key(&self) -> TypeKey {
            TypeKey::new("tests", "thing")
        }
        fn object_id(&self) -> ObjectId {
            ObjectId::from(self.0)
        }
        fn label(&self) -> String {
            format!("Thing {}", self.0)
        }
        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Int(self.0 as i64)),
                _ => None,
            }
        }
    }

    fn things(n: u64) -> Vec<ObjectRef> {
        (1..=n).map(|i| Arc::new(Thing(i)) as ObjectRef).collect()
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::None.text_form(), "");
        assert_eq!(Value::Bool(true).text_form(), "True");
        assert_eq!(Value::Int(-3).text_form(), "-3");
        assert_eq!(Value::from("x").text_form(), "x");
        let usd = Currency::new("usd").unwrap();
        assert_eq!(Value::Money(Money::new(12345, usd)).text_form(), "123.45 USD");
        let obj: ObjectRef = Arc::new(Thing(9));
        assert_eq!(Value::Object(obj).text_form(), "Thing 9");
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<String>).is_none());
        assert_eq!(Value::from(Some("a")).kind(), "text");
    }

    #[test]
    fn test_currency_validation() {
        assert_eq!(Currency::new("eur").unwrap().code(), "EUR");
        assert!(Currency::new("EURO").is_none());
        assert!(Currency::new("E1R").is_none());
    }

    #[test]
    fn test_object_set_head_and_count() {
        let set = things(15);
        assert_eq!(set.count(), 15);
        assert_eq!(set.head(Some(10)).len(), 10);
        assert_eq!(set.head(Some(100)).len(), 15);
        assert_eq!(set.head(None).len(), 15);
        let ids: Vec<String> = set
            .head(Some(3))
            .iter()
            .map(|o| o.object_id().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_object_serializes_as_summary() {
        let obj: ObjectRef = Arc::new(Thing(4));
        let json = serde_json::to_value(Value::Object(obj)).unwrap();
        assert_eq!(json["type"], "tests.thing");
        assert_eq!(json["id"], "4");
        assert_eq!(json["label"], "Thing 4");
    }
}
