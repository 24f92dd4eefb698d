//! Hashable key values produced by keyification.
//!
//! A [`Key`] is a deterministic projection of a value: two inputs that are
//! equal as data always produce equal keys, regardless of container
//! iteration order. Keys are `Eq + Ord + Hash` so they can index maps and
//! caches directly.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// A hashable, totally ordered key.
#[derive(Clone)]
pub enum Key {
    /// Null key component.
    Null,
    /// Boolean component.
    Bool(bool),
    /// Integer component.
    Int(i64),
    /// Float component, ordered and hashed by bit pattern with `-0.0`
    /// folded into `0.0`.
    Float(f64),
    /// String component.
    String(String),
    /// Date component.
    Date(NaiveDate),
    /// Instant component.
    Time(DateTime<Utc>),
    /// Ordered composite.
    Tuple(Vec<Key>),
    /// Order-independent composite.
    Set(BTreeSet<Key>),
}

// Type tags shared by ordering and the canonical byte encoding.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_DATE: u8 = 5;
const TAG_TIME: u8 = 6;
const TAG_TUPLE: u8 = 7;
const TAG_SET: u8 = 8;

/// Fold negative zero into positive zero; the two compare equal as values.
fn canonical_float(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}

impl Key {
    /// Build a tuple key.
    pub fn tuple<T: Into<Key>>(items: impl IntoIterator<Item = T>) -> Self {
        Key::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a set key.
    pub fn set<T: Into<Key>>(items: impl IntoIterator<Item = T>) -> Self {
        Key::Set(items.into_iter().map(Into::into).collect())
    }

    /// Project a value as-is.
    ///
    /// Only scalars are hashable; containers and entities need a field to
    /// keyify them and yield [`Error::Unhashable`] here.
    pub fn from_value(value: &Value) -> Result<Key> {
        match value {
            Value::Null => Ok(Key::Null),
            Value::Bool(b) => Ok(Key::Bool(*b)),
            Value::Int(i) => Ok(Key::Int(*i)),
            Value::Float(f) => Ok(Key::Float(canonical_float(*f))),
            Value::String(s) => Ok(Key::String(s.clone())),
            Value::Date(d) => Ok(Key::Date(*d)),
            Value::Time(t) => Ok(Key::Time(*t)),
            Value::List(_) => Err(Error::Unhashable { kind: ValueKind::List }),
            Value::Set(_) => Err(Error::Unhashable { kind: ValueKind::Set }),
            Value::Map(_) => Err(Error::Unhashable { kind: ValueKind::Map }),
            Value::Entity(_) => Err(Error::Unhashable { kind: ValueKind::Entity }),
        }
    }

    /// Check if this key is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Key::Null)
    }

    /// Components of a tuple key.
    pub fn as_tuple(&self) -> Option<&[Key]> {
        match self {
            Key::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Stable blake3 digest of the key, hex encoded.
    ///
    /// The digest covers a canonical byte encoding, so it is identical
    /// across processes and platforms for equal keys.
    pub fn fingerprint(&self) -> String {
        let mut bytes = Vec::new();
        self.encode(&mut bytes);
        blake3::hash(&bytes).to_hex().to_string()
    }

    fn tag(&self) -> u8 {
        match self {
            Key::Null => TAG_NULL,
            Key::Bool(_) => TAG_BOOL,
            Key::Int(_) => TAG_INT,
            Key::Float(_) => TAG_FLOAT,
            Key::String(_) => TAG_STRING,
            Key::Date(_) => TAG_DATE,
            Key::Time(_) => TAG_TIME,
            Key::Tuple(_) => TAG_TUPLE,
            Key::Set(_) => TAG_SET,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.tag());
        match self {
            Key::Null => {}
            Key::Bool(b) => out.push(u8::from(*b)),
            Key::Int(i) => out.extend_from_slice(&i.to_be_bytes()),
            Key::Float(f) => out.extend_from_slice(&canonical_float(*f).to_bits().to_be_bytes()),
            Key::String(s) => {
                out.extend_from_slice(&(s.len() as u64).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Key::Date(d) => out.extend_from_slice(&i64::from(d.num_days_from_ce()).to_be_bytes()),
            Key::Time(t) => {
                out.extend_from_slice(&t.timestamp().to_be_bytes());
                out.extend_from_slice(&t.timestamp_subsec_nanos().to_be_bytes());
            }
            Key::Tuple(items) => {
                out.extend_from_slice(&(items.len() as u64).to_be_bytes());
                for item in items {
                    item.encode(out);
                }
            }
            Key::Set(items) => {
                out.extend_from_slice(&(items.len() as u64).to_be_bytes());
                for item in items {
                    item.encode(out);
                }
            }
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::Null, Key::Null) => Ordering::Equal,
            (Key::Bool(a), Key::Bool(b)) => a.cmp(b),
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Float(a), Key::Float(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            (Key::String(a), Key::String(b)) => a.cmp(b),
            (Key::Date(a), Key::Date(b)) => a.cmp(b),
            (Key::Time(a), Key::Time(b)) => a.cmp(b),
            (Key::Tuple(a), Key::Tuple(b)) => a.cmp(b),
            (Key::Set(a), Key::Set(b)) => a.cmp(b),
            _ => self.tag().cmp(&other.tag()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Key) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Key::Null => {}
            Key::Bool(b) => b.hash(state),
            Key::Int(i) => i.hash(state),
            Key::Float(f) => canonical_float(*f).to_bits().hash(state),
            Key::String(s) => s.hash(state),
            Key::Date(d) => d.hash(state),
            Key::Time(t) => t.hash(state),
            Key::Tuple(items) => items.hash(state),
            Key::Set(items) => items.hash(state),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => f.write_str("null"),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::Float(x) => write!(f, "{:?}", canonical_float(*x)),
            Key::String(s) => write!(f, "{s:?}"),
            Key::Date(d) => write!(f, "{d}"),
            Key::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Key::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Key::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Key::Null => serializer.serialize_none(),
            Key::Bool(b) => serializer.serialize_bool(*b),
            Key::Int(i) => serializer.serialize_i64(*i),
            Key::Float(f) => serializer.serialize_f64(canonical_float(*f)),
            Key::String(s) => serializer.serialize_str(s),
            Key::Date(d) => serializer.collect_str(d),
            Key::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
            Key::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Key::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Key::Float(canonical_float(f))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<NaiveDate> for Key {
    fn from(d: NaiveDate) -> Self {
        Key::Date(d)
    }
}

impl From<DateTime<Utc>> for Key {
    fn from(t: DateTime<Utc>) -> Self {
        Key::Time(t)
    }
}

impl<T> From<Option<T>> for Key
where
    T: Into<Key>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(k) => k.into(),
            None => Key::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_from_value_scalars() {
        assert_eq!(Key::from_value(&Value::Null).unwrap(), Key::Null);
        assert_eq!(Key::from_value(&Value::from(1)).unwrap(), Key::Int(1));
        assert_eq!(Key::from_value(&Value::from("foo")).unwrap(), Key::from("foo"));
    }

    #[test]
    fn test_from_value_rejects_containers() {
        let error = Key::from_value(&Value::list([1])).unwrap_err();
        assert!(matches!(error, Error::Unhashable { .. }));
    }

    #[test]
    fn test_float_keys_are_hashable() {
        let mut keys = HashSet::new();
        keys.insert(Key::from(1.5));
        keys.insert(Key::from(1.5));
        keys.insert(Key::from(f64::NAN));
        keys.insert(Key::from(f64::NAN));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_negative_zero_keys_match_zero() {
        let zero = Key::from_value(&Value::from(0.0)).unwrap();
        let negative = Key::from_value(&Value::from(-0.0)).unwrap();
        assert_eq!(zero, negative);
        assert_eq!(zero.fingerprint(), negative.fingerprint());
        assert_eq!(format!("{negative:?}"), "0.0");

        let mut keys = HashSet::new();
        keys.insert(Key::Float(0.0));
        keys.insert(Key::Float(-0.0));
        assert_eq!(keys.len(), 1);
        assert_eq!(Key::Float(-0.0).fingerprint(), Key::from(0.0).fingerprint());
    }

    #[test]
    fn test_negative_zero_entity_and_set_keys() {
        use crate::catalog::{EntityType, Field, Group};
        use crate::entity::Entity;

        let point = EntityType::builder("Point")
            .field("x", Field::float().with_group(Group::PRIMARY))
            .build()
            .unwrap();
        let a = Entity::builder(&point).arg(0.0).build().unwrap();
        let b = Entity::builder(&point).arg(-0.0).build().unwrap();
        assert_eq!(a.get("x").unwrap(), b.get("x").unwrap());
        assert_eq!(a.primary_key().unwrap(), b.primary_key().unwrap());
        assert_eq!(
            a.primary_key().unwrap().fingerprint(),
            b.primary_key().unwrap().fingerprint()
        );

        let field = Field::set_of(Field::float());
        let positive = Value::set([0.0, 1.5]);
        let negative = Value::set([1.5, -0.0]);
        assert_eq!(positive, negative);
        assert_eq!(
            field.keyify(&positive, &Group::PRIMARY).unwrap(),
            field.keyify(&negative, &Group::PRIMARY).unwrap()
        );
    }

    #[test]
    fn test_set_keys_ignore_order() {
        assert_eq!(Key::set([3, 1, 2]), Key::set([1, 2, 3]));
        assert_eq!(Key::set([1, 2]).fingerprint(), Key::set([2, 1]).fingerprint());
    }

    #[test]
    fn test_ordering_across_kinds() {
        assert!(Key::Null < Key::from(false));
        assert!(Key::from(1) < Key::from("a"));
        assert!(Key::tuple([1, 2]) < Key::tuple([1, 3]));
    }

    #[test]
    fn test_debug_matches_tuple_syntax() {
        assert_eq!(format!("{:?}", Key::tuple([1])), "(1,)");
        assert_eq!(
            format!("{:?}", Key::tuple([Key::from(1), Key::from("x")])),
            "(1, \"x\")"
        );
        assert_eq!(format!("{:?}", Key::tuple(Vec::<Key>::new())), "()");
    }

    #[test]
    fn test_fingerprint_distinguishes_structure() {
        let flat = Key::tuple([1, 2]);
        let nested = Key::tuple([Key::tuple([1]), Key::from(2)]);
        assert_ne!(flat.fingerprint(), nested.fingerprint());
        assert_eq!(flat.fingerprint().len(), 64);
    }

    #[test]
    fn test_serialize_json() {
        let key = Key::tuple([Key::from(1), Key::tuple(["foo"]), Key::Null]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"[1,["foo"],null]"#);
    }
}
