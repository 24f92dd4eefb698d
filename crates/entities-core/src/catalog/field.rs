//! Field descriptors.
//!
//! A [`Field`] is a type-level descriptor for one attribute of an entity
//! type. It owns the three per-field contracts the entity runtime builds on:
//! default materialization ([`Field::make_default`]), type checking
//! ([`Field::validate`]) and key projection ([`Field::keyify`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use tracing::trace;

use super::entity::EntityType;
use super::group::Group;
use super::types::{Collection, FieldKind};
use crate::entity::Entity;
use crate::error::{Error, Result, ValidationError, ValidationReason};
use crate::key::Key;
use crate::value::{List, Map, Set, Value, ValueKind};
use crate::visit::VisitPath;

/// Name stamped on the item field of a collection.
pub const ITEM_FIELD_NAME: &str = "<item>";

/// Process-wide declaration counter; fields are ordered by the index they take here.
static NEXT_FIELD_INDEX: AtomicU64 = AtomicU64::new(0);

/// Default specification of a field.
#[derive(Clone)]
pub enum DefaultValue {
    /// A literal value, deep-copied on every materialization.
    Literal(Value),
    /// A zero-argument producer invoked on every materialization.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.deep_copy(),
            DefaultValue::Producer(produce) => produce(),
        }
    }

    fn is_absent(&self) -> bool {
        matches!(self, DefaultValue::Literal(Value::Null))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// A field descriptor.
pub struct Field {
    index: u64,
    name: Option<String>,
    /// Full name of the enclosing collection field, for item fields.
    parent: Option<String>,
    owner: Weak<EntityType>,
    kind: FieldKind,
    default: Option<DefaultValue>,
    nullable: bool,
    group: Option<Group>,
}

impl Field {
    /// Create a nullable field of the given kind with no default and no group.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            index: NEXT_FIELD_INDEX.fetch_add(1, Ordering::Relaxed),
            name: None,
            parent: None,
            owner: Weak::new(),
            kind,
            default: None,
            nullable: true,
            group: None,
        }
    }

    /// Field accepting any value.
    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    /// Field accepting any value, with a fresh empty mapping as its empty value.
    pub fn dynamic() -> Self {
        Self::new(FieldKind::Dynamic(None))
    }

    /// Field accepting values of one kind.
    pub fn dynamic_of(kind: ValueKind) -> Self {
        Self::new(FieldKind::Dynamic(Some(kind)))
    }

    /// Boolean field.
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// Integer field.
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// Float field.
    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    /// String field.
    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// Date field.
    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Instant field.
    pub fn time() -> Self {
        Self::new(FieldKind::Time)
    }

    /// Embedded entity field.
    pub fn entity(target: &Arc<EntityType>) -> Self {
        Self::new(FieldKind::Entity(Arc::clone(target)))
    }

    /// Reference field keyed by the target's primary group.
    pub fn reference(target: &Arc<EntityType>) -> Self {
        Self::reference_by(target, Group::PRIMARY)
    }

    /// Reference field keyed by the given group of the target.
    pub fn reference_by(target: &Arc<EntityType>, reference_group: impl Into<Group>) -> Self {
        Self::new(FieldKind::Reference {
            target: Arc::clone(target),
            reference_group: reference_group.into(),
        })
    }

    /// Unconstrained list field.
    pub fn list() -> Self {
        Self::new(FieldKind::List(Collection::default()))
    }

    /// List field whose items are checked and keyified by `item`.
    pub fn list_of(item: Field) -> Self {
        Self::new(FieldKind::List(Self::collection_of(item)))
    }

    /// Unconstrained set field.
    pub fn set() -> Self {
        Self::new(FieldKind::Set(Collection::default()))
    }

    /// Set field whose items are checked and keyified by `item`.
    pub fn set_of(item: Field) -> Self {
        Self::new(FieldKind::Set(Self::collection_of(item)))
    }

    /// Unconstrained map field.
    pub fn map() -> Self {
        Self::new(FieldKind::Map(Collection::default()))
    }

    /// Map field whose values are checked and keyified by `item`.
    pub fn map_of(item: Field) -> Self {
        Self::new(FieldKind::Map(Self::collection_of(item)))
    }

    fn collection_of(mut item: Field) -> Collection {
        item.name = Some(ITEM_FIELD_NAME.to_string());
        Collection {
            item: Some(Box::new(item)),
            recursive: false,
        }
    }

    /// Let nested containers of the same kind be handled by this field.
    ///
    /// Has no effect on non-collection fields.
    pub fn recursive(mut self) -> Self {
        if let Some(collection) = self.kind.collection_mut() {
            collection.recursive = true;
        }
        self
    }

    /// Set a literal default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Set a default producer.
    pub fn with_default_fn<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(produce)));
        self
    }

    /// Add the field to a key group.
    pub fn with_group(mut self, group: impl Into<Group>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Mark the field as non-nullable.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Declaration index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Field name, once bound to an entity type (or `<item>` for item fields).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn slot(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether null is an accepted value.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Key group, if any.
    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    /// Default specification, if any.
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Declared item field of a collection.
    pub fn item(&self) -> Option<&Field> {
        self.kind.collection().and_then(Collection::item)
    }

    /// Entity type this field is declared on.
    pub fn owner(&self) -> Option<Arc<EntityType>> {
        self.owner.upgrade()
    }

    /// Dotted path from the outermost field, e.g. `accounts.<item>`.
    pub fn full_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or(ITEM_FIELD_NAME);
        match &self.parent {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        }
    }

    /// Full name prefixed with the owning entity type, e.g. `Customer.accounts`.
    pub fn qualified_name(&self) -> String {
        match self.owner() {
            Some(owner) => format!("{}.{}", owner.name(), self.full_name()),
            None => self.full_name(),
        }
    }

    pub(crate) fn bind(&mut self, name: String, parent: Option<String>, owner: &Weak<EntityType>) {
        self.name = Some(name);
        self.parent = parent;
        self.owner = owner.clone();

        let full_name = self.full_name();
        if let Some(item) = self.kind.collection_mut().and_then(|c| c.item.as_deref_mut()) {
            item.bind(ITEM_FIELD_NAME.to_string(), Some(full_name), owner);
        }
    }

    /// Resolve the default value.
    ///
    /// A producer is invoked, a literal is copied, and with no default the
    /// field falls back to null (nullable) or its empty value (non-nullable).
    /// A non-nullable field that still resolves to null is a schema error.
    pub fn make_default(&self) -> Result<Value> {
        let value = match &self.default {
            Some(default) if !default.is_absent() => default.resolve(),
            _ if self.nullable => Value::Null,
            _ => self.make_empty(),
        };

        if !self.nullable && value.is_null() {
            return Err(Error::NullDefault {
                field: self.full_name(),
            });
        }

        trace!(field = %self.full_name(), kind = self.kind.label(), "materialized default");
        Ok(value)
    }

    /// The kind's "empty but present" value.
    pub fn make_empty(&self) -> Value {
        match &self.kind {
            FieldKind::Any | FieldKind::Reference { .. } => Value::Null,
            FieldKind::Dynamic(None) => Value::Map(Map::new()),
            FieldKind::Dynamic(Some(kind)) => kind.empty_value(),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Integer => Value::Int(0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::String => Value::String(String::new()),
            FieldKind::Date => Value::Date(Utc::now().date_naive()),
            FieldKind::Time => Value::Time(Utc::now()),
            FieldKind::Entity(target) => Value::Entity(Entity::new(target)),
            FieldKind::List(_) => Value::List(List::new()),
            FieldKind::Set(_) => Value::Set(Set::new()),
            FieldKind::Map(_) => Value::Map(Map::new()),
        }
    }

    /// Check a value against this field.
    ///
    /// Embedded entities are validated recursively and collection items are
    /// checked one by one; every failure within one collection is reported.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.validate_in(value, &mut VisitPath::default())
    }

    pub(crate) fn validate_in(&self, value: &Value, path: &mut VisitPath) -> Result<()> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(self.reject(value, ValidationReason::NullValue));
        }

        if !self.kind.accepts(value) {
            return Err(self.reject(value, ValidationReason::InvalidType));
        }

        match (&self.kind, value) {
            (FieldKind::Entity(_), Value::Entity(entity)) => entity.validate_in(path),
            (FieldKind::List(c), Value::List(list)) => {
                self.validate_items(c, value, list.addr(), list.items(), path)
            }
            (FieldKind::Set(c), Value::Set(set)) => {
                self.validate_items(c, value, set.addr(), set.items(), path)
            }
            (FieldKind::Map(c), Value::Map(map)) => {
                self.validate_items(c, value, map.addr(), map.values(), path)
            }
            _ => Ok(()),
        }
    }

    fn reject(&self, value: &Value, reason: ValidationReason) -> Error {
        ValidationError::field(self.full_name(), value.clone(), reason).into()
    }

    fn validate_items(
        &self,
        collection: &Collection,
        container: &Value,
        addr: usize,
        items: Vec<Value>,
        path: &mut VisitPath,
    ) -> Result<()> {
        // A container already being validated further up is not re-entered.
        let outcome = path.within(addr, |path| {
            let mut errors = Vec::new();
            for item in &items {
                let Some(field) = self.item_field_of(collection, item) else {
                    continue;
                };
                match field.validate_in(item, path) {
                    Ok(()) => {}
                    Err(Error::Validation(e)) => errors.push(e),
                    Err(e) => return Err(e),
                }
            }
            ValidationError::collect(Some(self.full_name()), container, errors).map_err(Error::from)
        });
        outcome.unwrap_or(Ok(()))
    }

    fn item_field_of<'a>(&'a self, collection: &'a Collection, item: &Value) -> Option<&'a Field> {
        if collection.recursive && item.kind().is_some() && item.kind() == self.kind.container_kind()
        {
            Some(self)
        } else {
            collection.item()
        }
    }

    /// Project a value as a hashable key for `group`.
    ///
    /// Scalars project as themselves. Embedded entities project through their
    /// own `group`; references project through the configured reference group
    /// and pass `group` down to their nested entities. Lists become tuples,
    /// sets become order-independent sets and maps become key-sorted pairs.
    pub fn keyify(&self, value: &Value, group: &Group) -> Result<Key> {
        self.keyify_in(value, group, &mut VisitPath::default())
    }

    pub(crate) fn keyify_in(&self, value: &Value, group: &Group, path: &mut VisitPath) -> Result<Key> {
        match (&self.kind, value) {
            (_, Value::Null) => Ok(Key::Null),
            (FieldKind::Entity(_), Value::Entity(entity)) => entity.keyify_in(group, group, path),
            (
                FieldKind::Reference {
                    reference_group, ..
                },
                Value::Entity(entity),
            ) => entity.keyify_in(reference_group, group, path),
            (FieldKind::List(c), Value::List(list)) => {
                let keys = self.keyify_items(c, list.addr(), &list.items(), group, path)?;
                Ok(Key::Tuple(keys))
            }
            (FieldKind::Set(c), Value::Set(set)) => {
                let keys = self.keyify_items(c, set.addr(), &set.items(), group, path)?;
                Ok(Key::Set(keys.into_iter().collect()))
            }
            (FieldKind::Map(c), Value::Map(map)) => {
                let mut entries = map.entries();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                let (keys, values): (Vec<Key>, Vec<Value>) = entries.into_iter().unzip();
                let value_keys = self.keyify_items(c, map.addr(), &values, group, path)?;
                Ok(Key::Tuple(
                    keys.into_iter()
                        .zip(value_keys)
                        .map(|(key, value)| Key::Tuple(vec![key, value]))
                        .collect(),
                ))
            }
            _ => Key::from_value(value),
        }
    }

    fn keyify_items(
        &self,
        collection: &Collection,
        addr: usize,
        items: &[Value],
        group: &Group,
        path: &mut VisitPath,
    ) -> Result<Vec<Key>> {
        path.within(addr, |path| {
            items
                .iter()
                .map(|item| match self.item_field_of(collection, item) {
                    Some(field) => field.keyify_in(item, group, path),
                    None => Key::from_value(item),
                })
                .collect::<Result<Vec<Key>>>()
        })
        .unwrap_or_else(|| {
            Err(Error::CyclicKey {
                at: self.full_name(),
            })
        })
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("index", &self.index)
            .field("nullable", &self.nullable)
            .field("group", &self.group)
            .finish()
    }
}
