//! Core error types.

use std::fmt;

use thiserror::Error;

use crate::catalog::Group;
use crate::value::{Value, ValueKind};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Core entity errors.
#[derive(Debug, Error)]
pub enum Error {
    /// More positional values than declared fields.
    #[error("{type_name}() takes at most {expected} arguments ({given} given)")]
    TooManyArguments {
        /// Entity type being constructed.
        type_name: String,
        /// Number of declared fields.
        expected: usize,
        /// Number of positional values supplied.
        given: usize,
    },

    /// A named value does not match any declared field.
    #[error("{name:?} is an invalid keyword argument for {type_name}()")]
    UnknownArgument {
        /// Entity type being constructed.
        type_name: String,
        /// Offending argument name.
        name: String,
    },

    /// A field received both a positional and a named value, or two named values.
    #[error("{type_name}() got multiple values for argument {name:?}")]
    DuplicateArgument {
        /// Entity type being constructed.
        type_name: String,
        /// Offending argument name.
        name: String,
    },

    /// Read or write of a field the entity type does not declare.
    #[error("{type_name} has no field named {name:?}")]
    UnknownField {
        /// Entity type.
        type_name: String,
        /// Requested field name.
        name: String,
    },

    /// Keyification with a group the entity type does not define.
    #[error("{type_name} has no key group {group}")]
    UnknownGroup {
        /// Entity type.
        type_name: String,
        /// Requested group.
        group: Group,
    },

    /// A non-nullable field resolved its default to null.
    ///
    /// This is a broken schema declaration, not invalid instance data.
    #[error("non-nullable field {field} initialized as null")]
    NullDefault {
        /// Full name of the misconfigured field.
        field: String,
    },

    /// Entity type declaration rejected by the builder.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A value with no hashable projection was used as a key.
    #[error("value of kind {kind} is not hashable")]
    Unhashable {
        /// Kind of the offending value.
        kind: ValueKind,
    },

    /// Keyification reached a value that is already being keyified.
    #[error("cyclic reference at {at} cannot be keyified")]
    CyclicKey {
        /// Entity type or field where the cycle closed.
        at: String,
    },

    /// Instance data violates the declared fields.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Why a value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
    /// Null value on a non-nullable field.
    NullValue,
    /// Non-null value of a kind the field does not accept.
    InvalidType,
    /// More than one child check failed.
    MultipleErrors,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::NullValue => write!(f, "null value"),
            ValidationReason::InvalidType => write!(f, "invalid type"),
            ValidationReason::MultipleErrors => write!(f, "multiple errors"),
        }
    }
}

/// A validation failure, either for one field or aggregated over several.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// One field rejected one value.
    #[error("{field} = {value:?} ({reason})")]
    Field {
        /// Full name of the offending field.
        field: String,
        /// Offending value.
        value: Value,
        /// Reason for the rejection.
        reason: ValidationReason,
    },

    /// Several child checks failed in the same validation pass.
    #[error("{}", render_children(.errors))]
    Multiple {
        /// Full name of the collection field, `None` when rooted at an entity.
        field: Option<String>,
        /// The collection or entity whose children failed.
        value: Value,
        /// Child errors in iteration order.
        errors: Vec<ValidationError>,
    },
}

fn render_children(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ValidationError {
    /// Create a single-field error.
    pub fn field(field: impl Into<String>, value: Value, reason: ValidationReason) -> Self {
        ValidationError::Field {
            field: field.into(),
            value,
            reason,
        }
    }

    /// Fold the errors of one aggregation scope into a result.
    ///
    /// Zero errors is success, a lone error is returned as is, and two or more
    /// become a [`ValidationError::Multiple`] attached to `field` and `value`.
    pub fn collect(
        field: Option<String>,
        value: &Value,
        mut errors: Vec<ValidationError>,
    ) -> std::result::Result<(), ValidationError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple {
                field,
                value: value.clone(),
                errors,
            }),
        }
    }

    /// Full name of the offending field, if any.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ValidationError::Field { field, .. } => Some(field),
            ValidationError::Multiple { field, .. } => field.as_deref(),
        }
    }

    /// The offending value.
    pub fn value(&self) -> &Value {
        match self {
            ValidationError::Field { value, .. } | ValidationError::Multiple { value, .. } => value,
        }
    }

    /// The failure reason.
    pub fn reason(&self) -> ValidationReason {
        match self {
            ValidationError::Field { reason, .. } => *reason,
            ValidationError::Multiple { .. } => ValidationReason::MultipleErrors,
        }
    }

    /// Child errors of an aggregate; empty for a single-field error.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationError::Field { .. } => &[],
            ValidationError::Multiple { errors, .. } => errors,
        }
    }

    /// Check if this error aggregates several children.
    pub fn is_multiple(&self) -> bool {
        matches!(self, ValidationError::Multiple { .. })
    }
}

impl Error {
    /// The validation failure carried by this error, if it is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_none() {
        assert!(ValidationError::collect(None, &Value::Null, Vec::new()).is_ok());
    }

    #[test]
    fn test_collect_single_is_unwrapped() {
        let error = ValidationError::field("id", Value::from("1"), ValidationReason::InvalidType);
        let result = ValidationError::collect(None, &Value::Null, vec![error]);

        let error = result.unwrap_err();
        assert!(!error.is_multiple());
        assert_eq!(error.field_name(), Some("id"));
        assert_eq!(error.reason(), ValidationReason::InvalidType);
    }

    #[test]
    fn test_collect_many_aggregates() {
        let errors = vec![
            ValidationError::field("a", Value::Null, ValidationReason::NullValue),
            ValidationError::field("b", Value::from(2.0), ValidationReason::InvalidType),
        ];
        let error = ValidationError::collect(Some("list".into()), &Value::Null, errors).unwrap_err();

        assert!(error.is_multiple());
        assert_eq!(error.reason(), ValidationReason::MultipleErrors);
        assert_eq!(error.errors().len(), 2);
        assert_eq!(error.field_name(), Some("list"));
    }

    #[test]
    fn test_display() {
        let single = ValidationError::field("id", Value::from("1"), ValidationReason::InvalidType);
        assert_eq!(single.to_string(), "id = \"1\" (invalid type)");

        let multiple = ValidationError::Multiple {
            field: None,
            value: Value::Null,
            errors: vec![
                single,
                ValidationError::field("name", Value::Null, ValidationReason::NullValue),
            ],
        };
        assert_eq!(
            multiple.to_string(),
            "id = \"1\" (invalid type)\nname = null (null value)"
        );
    }

    #[test]
    fn test_error_messages() {
        let error = Error::TooManyArguments {
            type_name: "Foo".into(),
            expected: 3,
            given: 4,
        };
        assert_eq!(error.to_string(), "Foo() takes at most 3 arguments (4 given)");

        let error = Error::UnknownArgument {
            type_name: "Foo".into(),
            name: "zirt".into(),
        };
        assert_eq!(error.to_string(), "\"zirt\" is an invalid keyword argument for Foo()");
    }
}
