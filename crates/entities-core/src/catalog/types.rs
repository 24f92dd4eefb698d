//! Field kinds.

use std::fmt;
use std::sync::Arc;

use super::entity::EntityType;
use super::field::Field;
use super::group::Group;
use crate::value::{Value, ValueKind};

/// The kind of a field: which values it accepts and how it defaults and keys them.
pub enum FieldKind {
    /// Accepts any value; empty value is null.
    Any,
    /// Accepts values of one kind, or any value when `None`.
    Dynamic(Option<ValueKind>),
    /// Boolean value.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
    /// Calendar date.
    Date,
    /// UTC instant.
    Time,
    /// An embedded entity, validated and keyified with its owner.
    Entity(Arc<EntityType>),
    /// A reference to another entity, keyified by one of its key groups.
    Reference {
        /// Referenced entity type.
        target: Arc<EntityType>,
        /// Group of the referenced entity used as the reference key.
        reference_group: Group,
    },
    /// Ordered sequence; keyified as a tuple.
    List(Collection),
    /// Set of distinct values; keyified as an order-independent set.
    Set(Collection),
    /// Key/value mapping; keyified as key-sorted pairs.
    Map(Collection),
}

/// Item policy shared by the collection kinds.
#[derive(Default)]
pub struct Collection {
    pub(crate) item: Option<Box<Field>>,
    pub(crate) recursive: bool,
}

impl Collection {
    /// Declared item field, if any.
    pub fn item(&self) -> Option<&Field> {
        self.item.as_deref()
    }

    /// Whether nested containers of the same kind reuse the collection field.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl FieldKind {
    /// Short name of the kind.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Dynamic(_) => "dynamic",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Entity(_) => "entity",
            FieldKind::Reference { .. } => "reference",
            FieldKind::List(_) => "list",
            FieldKind::Set(_) => "set",
            FieldKind::Map(_) => "map",
        }
    }

    /// Check whether a non-null value is of an accepted type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Any, _) | (FieldKind::Dynamic(None), _) => true,
            (FieldKind::Dynamic(Some(kind)), v) => v.kind() == Some(*kind),
            (FieldKind::Boolean, Value::Bool(_))
            | (FieldKind::Integer, Value::Int(_))
            | (FieldKind::Float, Value::Float(_))
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Date, Value::Date(_))
            | (FieldKind::Time, Value::Time(_))
            | (FieldKind::List(_), Value::List(_))
            | (FieldKind::Set(_), Value::Set(_))
            | (FieldKind::Map(_), Value::Map(_)) => true,
            (FieldKind::Entity(target), Value::Entity(entity))
            | (FieldKind::Reference { target, .. }, Value::Entity(entity)) => {
                entity.entity_type().is_a(target)
            }
            _ => false,
        }
    }

    /// Item policy of a collection kind.
    pub fn collection(&self) -> Option<&Collection> {
        match self {
            FieldKind::List(c) | FieldKind::Set(c) | FieldKind::Map(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            FieldKind::List(c) | FieldKind::Set(c) | FieldKind::Map(c) => Some(c),
            _ => None,
        }
    }

    /// Container kind produced by a collection kind.
    pub fn container_kind(&self) -> Option<ValueKind> {
        match self {
            FieldKind::List(_) => Some(ValueKind::List),
            FieldKind::Set(_) => Some(ValueKind::Set),
            FieldKind::Map(_) => Some(ValueKind::Map),
            _ => None,
        }
    }

    /// Target entity type of an entity or reference kind.
    pub fn target(&self) -> Option<&Arc<EntityType>> {
        match self {
            FieldKind::Entity(target) | FieldKind::Reference { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Dynamic(Some(kind)) => write!(f, "dynamic<{kind}>"),
            FieldKind::Entity(target) => write!(f, "entity<{}>", target.name()),
            FieldKind::Reference {
                target,
                reference_group,
            } => write!(f, "reference<{}:{}>", target.name(), reference_group),
            FieldKind::List(c) | FieldKind::Set(c) | FieldKind::Map(c) => {
                write!(f, "{}", self.label())?;
                if let Some(item) = c.item() {
                    write!(f, "<{:?}>", item.kind())?;
                }
                if c.recursive {
                    f.write_str("*")?;
                }
                Ok(())
            }
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_acceptance() {
        assert!(FieldKind::Integer.accepts(&Value::from(1)));
        assert!(!FieldKind::Integer.accepts(&Value::from(1.0)));
        assert!(!FieldKind::Float.accepts(&Value::from(1)));
        assert!(FieldKind::String.accepts(&Value::from("x")));
        assert!(FieldKind::Any.accepts(&Value::list([1])));
    }

    #[test]
    fn test_dynamic_acceptance() {
        assert!(FieldKind::Dynamic(None).accepts(&Value::from(true)));
        assert!(FieldKind::Dynamic(Some(ValueKind::Int)).accepts(&Value::from(3)));
        assert!(!FieldKind::Dynamic(Some(ValueKind::Int)).accepts(&Value::from(3.0)));
    }

    #[test]
    fn test_container_kinds() {
        let list = FieldKind::List(Collection::default());
        assert_eq!(list.container_kind(), Some(ValueKind::List));
        assert!(list.accepts(&Value::list([1])));
        assert!(!list.accepts(&Value::set([1])));
        assert!(FieldKind::Integer.collection().is_none());
        assert_eq!(format!("{list:?}"), "list");
    }
}
