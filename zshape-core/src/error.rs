/// The Error type for the zshape crate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A shape references itself and cannot be synthesized.
    ShapeSynthesisCycle {
        /// Full name of the type being synthesized.
        type_name: String,
    },
    /// A `$ref` token names an id that was never registered in the session.
    UnresolvedReference {
        /// The unknown id.
        id: String,
    },
    /// The same `$id` was registered twice in one session.
    DuplicateReferenceId {
        /// The duplicated id.
        id: String,
    },
    /// A property with the same name already exists in the property set.
    PropertyNameCollision {
        /// The duplicated property name.
        name: String,
    },
    /// A scalar value could not be converted to the requested type.
    ScalarConversion {
        /// Name of the source shape.
        from: String,
        /// Name of the target shape.
        to: String,
    },
    /// An object graph contains an instance that (transitively) contains itself.
    UnsupportedGraphCycle {
        /// Name of the type (or id) at which the cycle was detected.
        at: String,
    },
    /// A dynamic value was used in a way its state does not allow (e.g. adding a named property
    /// to a wrapped value).
    ShapeConflict(&'static str),
    /// A value of this shape cannot be turned into a record type.
    NotARecord {
        /// The target type.
        type_name: String,
    },
    /// The property is not declared on the type.
    UnknownProperty {
        /// The type.
        type_name: String,
        /// The property name.
        property: String,
    },
    /// The property of a synthesized anonymous type is read-only.
    ReadOnlyProperty {
        /// The type.
        type_name: String,
        /// The property name.
        property: String,
    },
    /// A constructor was called with the wrong number of arguments.
    ArgumentCount {
        /// The type.
        type_name: String,
        /// Expected number of arguments.
        expected: usize,
        /// Number of arguments given.
        found: usize,
    },
    /// A type descriptor node was completed twice.
    DescriptorCompleted {
        /// The descriptor's name.
        type_name: String,
    },
    /// A descriptor from another type graph was used as an edge.
    ForeignDescriptor {
        /// The descriptor's name.
        type_name: String,
    },
    /// The reference session is not tracking.
    SessionClosed,
}

/// The Result type for the zshape crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::ShapeSynthesisCycle { type_name } => write!(
                f,
                "Cannot synthesize self-referencing shape of type `{type_name}`"
            ),
            Error::UnresolvedReference { id } => write!(f, "Unresolved reference `{id}`"),
            Error::DuplicateReferenceId { id } => write!(f, "Duplicate reference id `{id}`"),
            Error::PropertyNameCollision { name } => {
                write!(f, "A property named `{name}` already exists")
            }
            Error::ScalarConversion { from, to } => {
                write!(f, "Cannot convert a value of type `{from}` to `{to}`")
            }
            Error::UnsupportedGraphCycle { at } => {
                write!(f, "Circular object references are not supported (at `{at}`)")
            }
            Error::ShapeConflict(reason) => write!(f, "Invalid dynamic value shape: {reason}"),
            Error::NotARecord { type_name } => {
                write!(f, "Value cannot be mapped to record type `{type_name}`")
            }
            Error::UnknownProperty {
                type_name,
                property,
            } => write!(f, "Type `{type_name}` has no property `{property}`"),
            Error::ReadOnlyProperty {
                type_name,
                property,
            } => write!(f, "Property `{property}` of type `{type_name}` is read-only"),
            Error::ArgumentCount {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "Constructor of `{type_name}` takes {expected} arguments but {found} were given"
            ),
            Error::DescriptorCompleted { type_name } => {
                write!(f, "Type descriptor `{type_name}` is already complete")
            }
            Error::ForeignDescriptor { type_name } => write!(
                f,
                "Type descriptor `{type_name}` belongs to a different type graph"
            ),
            Error::SessionClosed => write!(f, "The reference session is not tracking"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_types() {
        let err = Error::ScalarConversion {
            from: "String".into(),
            to: "i32".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot convert a value of type `String` to `i32`"
        );

        let err = Error::ShapeSynthesisCycle {
            type_name: "app::Node".into(),
        };
        assert!(err.to_string().contains("app::Node"));
    }
}
