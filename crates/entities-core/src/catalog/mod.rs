//! Declarative catalog of entity types.
//!
//! The catalog holds the type-level side of the model: field descriptors,
//! their kinds and key groups, and the ordered schema each entity type is
//! built into.

mod entity;
mod field;
mod group;
mod types;

pub use entity::{EntityType, EntityTypeBuilder};
pub use field::{DefaultValue, Field, ITEM_FIELD_NAME};
pub use group::Group;
pub use types::{Collection, FieldKind};
