//! Runtime values held by entity instances.
//!
//! Scalars are plain data. Containers and entities are shared handles:
//! cloning a [`Value`] clones the handle, so in-place mutation through one
//! clone is visible through every other.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::entity::Entity;
use crate::key::Key;
use crate::visit::VisitPath;

/// Kind tag of a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
    /// Calendar date.
    Date,
    /// UTC instant.
    Time,
    /// Ordered sequence.
    List,
    /// Unordered collection of distinct values.
    Set,
    /// Mapping from keys to values.
    Map,
    /// Entity instance.
    Entity,
}

impl ValueKind {
    /// The "empty but present" value of this kind.
    ///
    /// Entities have no target type here, so their empty value is null.
    pub fn empty_value(&self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Date => Value::Date(Utc::now().date_naive()),
            ValueKind::Time => Value::Time(Utc::now()),
            ValueKind::List => Value::List(List::new()),
            ValueKind::Set => Value::Set(Set::new()),
            ValueKind::Map => Value::Map(Map::new()),
            ValueKind::Entity => Value::Null,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// A dynamically typed field value.
#[derive(Clone, Default)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// UTC instant.
    Time(DateTime<Utc>),
    /// Shared ordered sequence.
    List(List),
    /// Shared set.
    Set(Set),
    /// Shared mapping.
    Map(Map),
    /// Shared entity instance.
    Entity(Entity),
}

impl Value {
    /// Build a list value.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(List::from_values(items))
    }

    /// Build a set value; duplicates are dropped.
    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Set(Set::from_values(items))
    }

    /// Build a map value.
    pub fn map<K: Into<Key>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(Map::from_entries(entries))
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Kind of this value, `None` for null.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Time(_) => Some(ValueKind::Time),
            Value::List(_) => Some(ValueKind::List),
            Value::Set(_) => Some(ValueKind::Set),
            Value::Map(_) => Some(ValueKind::Map),
            Value::Entity(_) => Some(ValueKind::Entity),
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as instant.
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Try to get as list handle.
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Try to get as set handle.
    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as map handle.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get as entity handle.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Check whether two values are the same shared object.
    ///
    /// Scalars are never "the same object"; only handles compare here.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Entity(a), Value::Entity(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Copy with fresh container handles all the way down.
    ///
    /// Entities stay shared; a container that contains itself keeps sharing
    /// the inner occurrence.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_in(&mut VisitPath::default())
    }

    fn deep_copy_in(&self, path: &mut VisitPath) -> Value {
        match self {
            Value::List(list) => path
                .within(list.addr(), |path| {
                    Value::List(List::from_values(
                        list.items().iter().map(|item| item.deep_copy_in(path)),
                    ))
                })
                .unwrap_or_else(|| self.clone()),
            Value::Set(set) => path
                .within(set.addr(), |path| {
                    Value::Set(Set::from_values(
                        set.items().iter().map(|item| item.deep_copy_in(path)),
                    ))
                })
                .unwrap_or_else(|| self.clone()),
            Value::Map(map) => path
                .within(map.addr(), |path| {
                    Value::Map(Map::from_entries(
                        map.entries()
                            .into_iter()
                            .map(|(key, value)| (key, value.deep_copy_in(path))),
                    ))
                })
                .unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }

    pub(crate) fn render(&self, f: &mut fmt::Formatter<'_>, path: &mut VisitPath) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::List(list) => {
                let rendered = path.within(list.addr(), |path| {
                    f.write_str("[")?;
                    render_items(f, &list.items(), path)?;
                    f.write_str("]")
                });
                rendered.unwrap_or_else(|| f.write_str("[...]"))
            }
            Value::Set(set) => {
                let rendered = path.within(set.addr(), |path| {
                    f.write_str("{")?;
                    render_items(f, &set.items(), path)?;
                    f.write_str("}")
                });
                rendered.unwrap_or_else(|| f.write_str("{...}"))
            }
            Value::Map(map) => {
                let rendered = path.within(map.addr(), |path| {
                    let mut entries = map.entries();
                    entries.sort_by(|a, b| a.0.cmp(&b.0));
                    f.write_str("{")?;
                    for (i, (key, value)) in entries.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{key:?}: ")?;
                        value.render(f, path)?;
                    }
                    f.write_str("}")
                });
                rendered.unwrap_or_else(|| f.write_str("{...}"))
            }
            Value::Entity(entity) => entity.render(f, path),
        }
    }
}

fn render_items(f: &mut fmt::Formatter<'_>, items: &[Value], path: &mut VisitPath) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.render(f, path)?;
    }
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut VisitPath::default())
    }
}

/// Address pairs of the containers being compared.
type EqPath = VisitPath<(usize, usize)>;

impl Value {
    /// Structural equality. A pair of containers met again while already
    /// being compared counts as equal, so self-containing values terminate.
    fn eq_in(&self, other: &Value, path: &mut EqPath) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.eq_in(b, path),
            (Value::Set(a), Value::Set(b)) => a.eq_in(b, path),
            (Value::Map(a), Value::Map(b)) => a.eq_in(b, path),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::List(_), Value::List(_))
            | (Value::Set(_), Value::Set(_))
            | (Value::Map(_), Value::Map(_)) => self.eq_in(other, &mut EqPath::default()),
            (Value::Entity(a), Value::Entity(b)) => a.ptr_eq(b),
            _ => false,
        }
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

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Value::Entity(e)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

fn addr_of<T>(shared: &Arc<RwLock<T>>) -> usize {
    Arc::as_ptr(shared) as *const () as usize
}

/// Shared, mutable ordered sequence.
#[derive(Clone, Default)]
pub struct List(Arc<RwLock<Vec<Value>>>);

impl List {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list from values.
    pub fn from_values<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self(Arc::new(RwLock::new(items.into_iter().map(Into::into).collect())))
    }

    /// Append a value.
    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    /// Get the item at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace the item at `index`, returning the old one.
    pub fn replace(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let mut items = self.0.write();
        items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value.into()))
    }

    /// Remove all items.
    pub fn clear(&self) {
        self.0.write().clear();
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the items.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Check whether both handles point to the same list.
    pub fn ptr_eq(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        addr_of(&self.0)
    }
}

impl List {
    fn eq_in(&self, other: &List, path: &mut EqPath) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        path.within((self.addr(), other.addr()), |path| {
            let ours = self.items();
            let theirs = other.items();
            ours.len() == theirs.len()
                && ours.iter().zip(&theirs).all(|(a, b)| a.eq_in(b, path))
        })
        .unwrap_or(true)
    }
}

impl PartialEq for List {
    fn eq(&self, other: &List) -> bool {
        self.eq_in(other, &mut EqPath::default())
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Value::List(self.clone()).render(f, &mut VisitPath::default())
    }
}

/// Shared, mutable set of distinct values.
///
/// Iteration follows insertion order; equality ignores it.
#[derive(Clone, Default)]
pub struct Set(Arc<RwLock<Vec<Value>>>);

impl Set {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from values, dropping duplicates.
    pub fn from_values<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        let set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Insert a value. Returns `false` if an equal value was already present.
    pub fn insert(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.0.write().push(value);
        true
    }

    /// Remove a value. Returns `true` if it was present.
    pub fn remove(&self, value: &Value) -> bool {
        let mut items = self.0.write();
        match items.iter().position(|item| item == value) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check membership.
    pub fn contains(&self, value: &Value) -> bool {
        self.0.read().iter().any(|item| item == value)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if the set has no items.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the items in insertion order.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Check whether both handles point to the same set.
    pub fn ptr_eq(&self, other: &Set) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        addr_of(&self.0)
    }
}

impl Set {
    fn eq_in(&self, other: &Set, path: &mut EqPath) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        path.within((self.addr(), other.addr()), |path| {
            let ours = self.items();
            let theirs = other.items();
            ours.len() == theirs.len()
                && ours
                    .iter()
                    .all(|item| theirs.iter().any(|candidate| item.eq_in(candidate, path)))
        })
        .unwrap_or(true)
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Set) -> bool {
        self.eq_in(other, &mut EqPath::default())
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Value::Set(self.clone()).render(f, &mut VisitPath::default())
    }
}

/// Shared, mutable mapping from keys to values.
///
/// Iteration order is unspecified.
#[derive(Clone, Default)]
pub struct Map(Arc<RwLock<HashMap<Key, Value>>>);

impl Map {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map from entries; later entries win on duplicate keys.
    pub fn from_entries<K: Into<Key>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self(Arc::new(RwLock::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )))
    }

    /// Insert an entry, returning the previous value for the key.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    /// Get the value for a key.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Remove the entry for a key.
    pub fn remove(&self, key: &Key) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the entries.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.0
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Snapshot of the values.
    pub fn values(&self) -> Vec<Value> {
        self.0.read().values().cloned().collect()
    }

    /// Check whether both handles point to the same map.
    pub fn ptr_eq(&self, other: &Map) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        addr_of(&self.0)
    }
}

impl Map {
    fn eq_in(&self, other: &Map, path: &mut EqPath) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        path.within((self.addr(), other.addr()), |path| {
            let theirs = other.0.read().clone();
            let ours = self.entries();
            ours.len() == theirs.len()
                && ours
                    .iter()
                    .all(|(key, value)| theirs.get(key).is_some_and(|v| value.eq_in(v, path)))
        })
        .unwrap_or(true)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Map) -> bool {
        self.eq_in(other, &mut EqPath::default())
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Value::Map(self.clone()).render(f, &mut VisitPath::default())
    }
}
