//! Entity instances.
//!
//! An [`Entity`] is a shared handle to sparse per-instance storage for one
//! [`EntityType`]. Only fields that were assigned, or already read once,
//! hold a value; every other field is materialized from its default on first
//! read and cached from then on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{instrument, trace};

use crate::catalog::{EntityType, Field, Group};
use crate::error::{Error, Result, ValidationError};
use crate::key::Key;
use crate::value::Value;
use crate::visit::VisitPath;

struct EntityState {
    entity_type: Arc<EntityType>,
    values: RwLock<HashMap<String, Value>>,
}

/// A shared handle to an entity instance.
///
/// Cloning the handle does not copy the instance.
#[derive(Clone)]
pub struct Entity {
    state: Arc<EntityState>,
}

/// Collects positional and named values for [`Entity::construct`].
pub struct EntityBuilder {
    entity_type: Arc<EntityType>,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl EntityBuilder {
    /// Add the next positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a named value.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Construct the entity.
    pub fn build(self) -> Result<Entity> {
        Entity::construct(&self.entity_type, self.positional, self.named)
    }
}

impl Entity {
    /// Create an instance with every field unset.
    pub fn new(entity_type: &Arc<EntityType>) -> Self {
        Self::from_values(entity_type, HashMap::new())
    }

    fn from_values(entity_type: &Arc<EntityType>, values: HashMap<String, Value>) -> Self {
        Self {
            state: Arc::new(EntityState {
                entity_type: Arc::clone(entity_type),
                values: RwLock::new(values),
            }),
        }
    }

    /// Start collecting construction values.
    pub fn builder(entity_type: &Arc<EntityType>) -> EntityBuilder {
        EntityBuilder {
            entity_type: Arc::clone(entity_type),
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Construct an instance from positional and named values.
    ///
    /// Positional values fill fields in declaration order; named values fill
    /// fields by name. Fields receiving neither stay unset. Supplying more
    /// positional values than fields, an unknown name, or two values for the
    /// same field is an error.
    pub fn construct<N: Into<String>>(
        entity_type: &Arc<EntityType>,
        positional: impl IntoIterator<Item = Value>,
        named: impl IntoIterator<Item = (N, Value)>,
    ) -> Result<Self> {
        let positional: Vec<Value> = positional.into_iter().collect();
        if positional.len() > entity_type.field_count() {
            return Err(Error::TooManyArguments {
                type_name: entity_type.name().to_string(),
                expected: entity_type.field_count(),
                given: positional.len(),
            });
        }

        let named: Vec<(String, Value)> = named
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        if let Some((name, _)) = named
            .iter()
            .find(|(name, _)| entity_type.field(name).is_none())
        {
            return Err(Error::UnknownArgument {
                type_name: entity_type.name().to_string(),
                name: name.clone(),
            });
        }

        let mut values: HashMap<String, Value> = entity_type
            .fields()
            .iter()
            .zip(positional)
            .map(|(field, value)| (field.slot().to_string(), value))
            .collect();

        for (name, value) in named {
            if values.contains_key(&name) {
                return Err(Error::DuplicateArgument {
                    type_name: entity_type.name().to_string(),
                    name,
                });
            }
            values.insert(name, value);
        }

        Ok(Self::from_values(entity_type, values))
    }

    /// The entity's type.
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.state.entity_type
    }

    fn field(&self, name: &str) -> Result<&Field> {
        self.entity_type()
            .field(name)
            .ok_or_else(|| Error::UnknownField {
                type_name: self.entity_type().name().to_string(),
                name: name.to_string(),
            })
    }

    /// Read a field.
    ///
    /// An unset field is materialized from its default and cached, so
    /// repeated reads return the same value (the same shared handle for
    /// containers and entities).
    pub fn get(&self, name: &str) -> Result<Value> {
        let cached = self.state.values.read().get(name).cloned();
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = self.field(name)?.make_default()?;
        let mut values = self.state.values.write();
        Ok(values.entry(name.to_string()).or_insert(value).clone())
    }

    /// Assign a field.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.field(name)?;
        self.state
            .values
            .write()
            .insert(name.to_string(), value.into());
        Ok(())
    }

    /// Drop a field's stored value; the next read materializes the default again.
    pub fn unset(&self, name: &str) -> Result<Option<Value>> {
        self.field(name)?;
        Ok(self.state.values.write().remove(name))
    }

    /// Check whether a field currently holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.state.values.read().contains_key(name)
    }

    /// Check whether both handles point to the same instance.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.state) as *const () as usize
    }

    /// Validate every field in declaration order.
    ///
    /// All fields are checked before reporting: a single failure is returned
    /// as is, several are aggregated into a [`ValidationError::Multiple`]
    /// rooted at this entity. Non-validation errors, such as a broken default,
    /// abort immediately.
    #[instrument(level = "trace", skip_all, fields(entity = %self.entity_type().name()))]
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_in(&mut VisitPath::default());
        if let Err(error) = &result {
            trace!(%error, "validation failed");
        }
        result
    }

    pub(crate) fn validate_in(&self, path: &mut VisitPath) -> Result<()> {
        // An entity already being validated further up is not re-entered.
        let outcome = path.within(self.addr(), |path| {
            let mut errors = Vec::new();
            for field in self.entity_type().fields() {
                let value = self.get(field.slot())?;
                match field.validate_in(&value, path) {
                    Ok(()) => {}
                    Err(Error::Validation(e)) => errors.push(e),
                    Err(e) => return Err(e),
                }
            }
            ValidationError::collect(None, &Value::Entity(self.clone()), errors).map_err(Error::from)
        });
        outcome.unwrap_or(Ok(()))
    }

    /// Key of the primary group.
    pub fn primary_key(&self) -> Result<Key> {
        self.keyify(&Group::PRIMARY)
    }

    /// Key of `group`, with nested entities keyified by the same group.
    pub fn keyify(&self, group: &Group) -> Result<Key> {
        self.keyify_with(group, group)
    }

    /// Key of `group`, with nested entities keyified by `child_group`.
    ///
    /// Returns a tuple with one component per field of `group`, in
    /// declaration order.
    #[instrument(level = "trace", skip_all, fields(entity = %self.entity_type().name(), %group, %child_group))]
    pub fn keyify_with(&self, group: &Group, child_group: &Group) -> Result<Key> {
        self.keyify_in(group, child_group, &mut VisitPath::default())
    }

    pub(crate) fn keyify_in(
        &self,
        group: &Group,
        child_group: &Group,
        path: &mut VisitPath,
    ) -> Result<Key> {
        let entity_type = self.entity_type();
        let fields = entity_type.group(group).ok_or_else(|| Error::UnknownGroup {
            type_name: entity_type.name().to_string(),
            group: group.clone(),
        })?;

        path.within(self.addr(), |path| {
            fields
                .iter()
                .map(|field| {
                    let value = self.get(field.slot())?;
                    field.keyify_in(&value, child_group, path)
                })
                .collect::<Result<Vec<Key>>>()
                .map(Key::Tuple)
        })
        .unwrap_or_else(|| {
            Err(Error::CyclicKey {
                at: entity_type.name().to_string(),
            })
        })
    }

    pub(crate) fn render(&self, f: &mut fmt::Formatter<'_>, path: &mut VisitPath) -> fmt::Result {
        let entity_type = self.entity_type();
        write!(f, "{}(", entity_type.name())?;

        let rendered = path.within(self.addr(), |path| {
            let fields: Vec<&Field> = match entity_type.group(&Group::PRIMARY) {
                Some(primary) => primary,
                None => entity_type.fields().iter().map(|field| &**field).collect(),
            };
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}=", field.slot())?;
                match self.get(field.slot()) {
                    Ok(value) => value.render(f, path)?,
                    Err(_) => f.write_str("<unresolved>")?,
                }
            }
            Ok(())
        });

        match rendered {
            Some(result) => result?,
            None => f.write_str("...")?,
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut VisitPath::default())
    }
}
