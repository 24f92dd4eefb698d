//! Entities Core - declarative entity types, validation and keyification.
//!
//! An entity type is declared once as an ordered set of named, typed fields.
//! Every instance of that type then gets three behaviors for free:
//!
//! - lazy default materialization for fields that were never assigned
//! - recursive validation that reports every violation in one pass
//! - keyification: deterministic, hashable projections of the fields in a
//!   key group, usable as cache or lookup keys
//!
//! # Example
//!
//! ```
//! use entities_core::{Entity, EntityType, Field, Group, Key};
//!
//! let account = EntityType::builder("Account")
//!     .field("id", Field::integer().with_group(Group::PRIMARY))
//!     .field("iban", Field::integer().with_group(Group::SECONDARY))
//!     .field("balance", Field::float().with_default(0.0))
//!     .build()
//!     .unwrap();
//!
//! let a = Entity::builder(&account).arg(1).arg(111).build().unwrap();
//! assert_eq!(a.primary_key().unwrap(), Key::tuple([1]));
//! assert_eq!(a.keyify(&Group::SECONDARY).unwrap(), Key::tuple([111]));
//! a.validate().unwrap();
//! ```

pub mod catalog;
pub mod entity;
pub mod error;
pub mod key;
pub mod value;

mod visit;

pub use catalog::{Collection, DefaultValue, EntityType, EntityTypeBuilder, Field, FieldKind, Group};
pub use entity::{Entity, EntityBuilder};
pub use error::{Error, Result, ValidationError, ValidationReason};
pub use key::Key;
pub use value::{List, Map, Set, Value, ValueKind};
