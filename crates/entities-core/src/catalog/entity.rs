//! Entity type definitions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::field::Field;
use super::group::Group;
use crate::error::{Error, Result};

/// A declared entity type: an ordered set of named fields partitioned into key groups.
///
/// Built once through [`EntityTypeBuilder`] and immutable afterwards.
pub struct EntityType {
    name: String,
    parent: Option<Arc<EntityType>>,
    /// Fields in declaration order.
    fields: Vec<Arc<Field>>,
    by_name: HashMap<String, usize>,
    /// Positions into `fields`, in declaration order.
    groups: HashMap<Group, Vec<usize>>,
}

/// Builder collecting field declarations for an [`EntityType`].
pub struct EntityTypeBuilder {
    name: String,
    parent: Option<Arc<EntityType>>,
    fields: Vec<(String, Field)>,
}

impl EntityTypeBuilder {
    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Declare several fields.
    pub fn fields<N: Into<String>>(mut self, fields: impl IntoIterator<Item = (N, Field)>) -> Self {
        self.fields
            .extend(fields.into_iter().map(|(name, field)| (name.into(), field)));
        self
    }

    /// Inherit the fields of another entity type.
    ///
    /// A field declared here with the same name as an inherited one replaces it.
    pub fn extends(mut self, parent: &Arc<EntityType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Build the schema.
    ///
    /// Fields are ordered by declaration index, not by the order they were
    /// added to the builder. Each field is stamped with its name and owner,
    /// and grouped fields are collected per group in that same order.
    pub fn build(self) -> Result<Arc<EntityType>> {
        if self.name.is_empty() {
            return Err(Error::InvalidSchema("entity type name is empty".into()));
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.fields {
            if name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "{} declares a field with an empty name",
                    self.name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "{} declares field {name:?} more than once",
                    self.name
                )));
            }
        }

        let EntityTypeBuilder {
            name,
            parent,
            fields: declared,
        } = self;

        let entity_type = Arc::new_cyclic(|owner| {
            let own: Vec<Arc<Field>> = declared
                .into_iter()
                .map(|(name, mut field)| {
                    field.bind(name, None, owner);
                    Arc::new(field)
                })
                .collect();

            let mut fields: Vec<Arc<Field>> = parent
                .as_ref()
                .map(|parent| {
                    parent
                        .fields
                        .iter()
                        .filter(|inherited| !own.iter().any(|f| f.name() == inherited.name()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            fields.extend(own);
            fields.sort_by_key(|field| field.index());

            let by_name = fields
                .iter()
                .enumerate()
                .map(|(position, field)| (field.slot().to_string(), position))
                .collect();

            let mut groups: HashMap<Group, Vec<usize>> = HashMap::new();
            for (position, field) in fields.iter().enumerate() {
                if let Some(group) = field.group() {
                    groups.entry(group.clone()).or_default().push(position);
                }
            }

            EntityType {
                name,
                parent,
                fields,
                by_name,
                groups,
            }
        });

        debug!(
            entity = %entity_type.name,
            fields = entity_type.fields.len(),
            groups = entity_type.groups.len(),
            "built entity type"
        );

        Ok(entity_type)
    }
}

impl EntityType {
    /// Start declaring an entity type.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent type, if declared with [`EntityTypeBuilder::extends`].
    pub fn parent(&self) -> Option<&Arc<EntityType>> {
        self.parent.as_ref()
    }

    /// Fields in declaration order, inherited fields included.
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&position| &*self.fields[position])
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.slot()).collect()
    }

    /// Fields of a group in declaration order, `None` if no field carries the group.
    pub fn group(&self, group: &Group) -> Option<Vec<&Field>> {
        self.groups.get(group).map(|positions| {
            positions
                .iter()
                .map(|&position| &*self.fields[position])
                .collect()
        })
    }

    /// Check whether any field carries the group.
    pub fn has_group(&self, group: &Group) -> bool {
        self.groups.contains_key(group)
    }

    /// Groups defined on this type, in no particular order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.keys()
    }

    /// Check whether this type is `other` or inherits from it.
    pub fn is_a(&self, other: &EntityType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if std::ptr::eq(ty, other) {
                return true;
            }
            current = ty.parent.as_deref();
        }
        false
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("fields", &self.field_names())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_builder() {
        let foo = EntityType::builder("Foo")
            .field("id", Field::integer().with_group(Group::PRIMARY))
            .field("name", Field::string().with_group(Group::SECONDARY))
            .field("desc", Field::string())
            .build()
            .unwrap();

        assert_eq!(foo.name(), "Foo");
        assert_eq!(foo.field_names(), vec!["id", "name", "desc"]);
        assert!(foo.field("id").is_some());
        assert!(foo.field("nonexistent").is_none());
        assert!(foo.has_group(&Group::PRIMARY));
        assert!(!foo.has_group(&Group::new("audit")));
    }

    #[test]
    fn test_order_follows_declaration_index() {
        let first = Field::integer().with_group(Group::PRIMARY);
        let second = Field::string().with_group(Group::PRIMARY);
        let third = Field::float();

        let foo = EntityType::builder("Foo")
            .field("c", third)
            .field("b", second)
            .field("a", first)
            .build()
            .unwrap();

        assert_eq!(foo.field_names(), vec!["a", "b", "c"]);
        let primary: Vec<_> = foo
            .group(&Group::PRIMARY)
            .unwrap()
            .iter()
            .map(|f| f.name().unwrap())
            .collect();
        assert_eq!(primary, vec!["a", "b"]);
    }

    #[test]
    fn test_binding_stamps_names_and_owner() {
        let foo = EntityType::builder("Foo")
            .field("field", Field::list_of(Field::dynamic()))
            .build()
            .unwrap();

        let field = foo.field("field").unwrap();
        assert_eq!(field.full_name(), "field");
        assert_eq!(field.item().unwrap().full_name(), "field.<item>");
        assert_eq!(field.qualified_name(), "Foo.field");
        assert_eq!(field.owner().unwrap().name(), "Foo");
        assert_eq!(field.item().unwrap().owner().unwrap().name(), "Foo");
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let result = EntityType::builder("Foo")
            .field("id", Field::integer())
            .field("id", Field::string())
            .build();
        assert!(matches!(result, Err(Error::InvalidSchema(_))));

        assert!(EntityType::builder("").build().is_err());
    }

    #[test]
    fn test_inheritance() {
        let base = EntityType::builder("Base")
            .field("id", Field::integer().with_group(Group::PRIMARY))
            .field("note", Field::string())
            .build()
            .unwrap();

        let child = EntityType::builder("Child")
            .extends(&base)
            .field("extra", Field::boolean())
            .field("note", Field::string().not_null())
            .build()
            .unwrap();

        assert_eq!(child.field_names(), vec!["id", "extra", "note"]);
        assert!(!child.field("note").unwrap().is_nullable());
        assert_eq!(child.field("id").unwrap().qualified_name(), "Base.id");
        assert_eq!(child.group(&Group::PRIMARY).unwrap().len(), 1);
        assert!(child.is_a(&base));
        assert!(!base.is_a(&child));
    }
}
