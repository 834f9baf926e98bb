//! Identifier types naming declared components.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::qualifier::Qualifier;

const ANONYMOUS_TYPE: &str = "<anonymous>";

/// Key for component storage and lookup.
///
/// An identifier is a `(type, qualifier)` pair. Components of the same type
/// can coexist in one environment only if their qualifiers differ. Equality
/// and hashing use the [`TypeId`] and the qualifier; the type name is only
/// kept for diagnostics.
///
/// Trait objects are first-class: `Identifier::of::<dyn Logger>()` names a
/// component stored as `Arc<dyn Logger>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{named, Identifier};
///
/// struct Database;
///
/// let plain = Identifier::of::<Database>();
/// let replica = Identifier::named::<Database>("replica");
///
/// assert_ne!(plain, replica);
/// assert_eq!(replica, Identifier::qualified::<Database>(named("replica")));
/// assert!(plain.to_string().ends_with("Database (<no qualifier>)"));
/// assert!(replica.to_string().ends_with("Database (named(replica))"));
/// ```
#[derive(Clone)]
pub struct Identifier {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Qualifier,
}

impl Identifier {
    /// Identifier for `T` without a qualifier.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::qualified::<T>(Qualifier::Empty)
    }

    /// Identifier for `T` with a [`Qualifier::Named`] qualifier.
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::qualified::<T>(Qualifier::Named(name.into()))
    }

    /// Identifier for `T` with an arbitrary qualifier.
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<Qualifier>) -> Self {
        Identifier {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: qualifier.into(),
        }
    }

    /// The type this identifier names.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type name as reported by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The qualifier of this identifier.
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Returns true if this identifier names `T`, whatever its qualifier.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns this identifier with `qualifier` combined into its own.
    ///
    /// ```rust
    /// use ferrous_inject::{named, Identifier};
    ///
    /// let id = Identifier::named::<u32>("port").with_qualifier(named("http"));
    /// assert_eq!(id.qualifier(), &(named("port") + named("http")));
    /// ```
    pub fn with_qualifier(self, qualifier: Qualifier) -> Self {
        Identifier {
            qualifier: self.qualifier + qualifier,
            ..self
        }
    }

    fn display_type_name(&self) -> &'static str {
        if self.type_name.contains("{{closure}}") {
            ANONYMOUS_TYPE
        } else {
            self.type_name
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_type_name(), self.qualifier)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identifier")
            .field("type", &self.type_name)
            .field("qualifier", &self.qualifier)
            .finish()
    }
}
