//! Qualifiers distinguish components that share the same type.

use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

/// Secondary disambiguator for components of the same type.
///
/// Most components never need one: a component declared without a qualifier
/// uses [`Qualifier::Empty`]. When several components of the same type must
/// coexist, give them distinct qualifiers such as [`named`] ones.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{named, Qualifier};
///
/// assert_eq!(Qualifier::Empty.to_string(), "<no qualifier>");
/// assert_eq!(named("primary").to_string(), "named(primary)");
///
/// let both = named("a") + named("b");
/// assert_eq!(both.to_string(), "named(a) + named(b)");
/// assert_eq!(both, named("b") + named("a"));
/// ```
#[derive(Clone, Default)]
pub enum Qualifier {
    /// No qualifier at all
    #[default]
    Empty,
    /// A qualifier based on a string
    Named(String),
    /// A set of at least two non-empty, non-composite qualifiers
    Composite(CompositeQualifier),
    /// A qualifier provided by the embedding application
    Custom(Arc<dyn CustomQualifier>),
}

/// Creates a [`Qualifier::Named`] with the given name.
pub fn named(name: impl Into<String>) -> Qualifier {
    Qualifier::Named(name.into())
}

impl Qualifier {
    /// Wraps an application-defined value as a qualifier.
    ///
    /// ```rust
    /// use ferrous_inject::Qualifier;
    ///
    /// #[derive(Debug, PartialEq, Eq, Hash)]
    /// enum Region { Eu, Us }
    ///
    /// impl std::fmt::Display for Region {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         write!(f, "region({:?})", self)
    ///     }
    /// }
    ///
    /// assert_eq!(Qualifier::custom(Region::Eu), Qualifier::custom(Region::Eu));
    /// assert_ne!(Qualifier::custom(Region::Eu), Qualifier::custom(Region::Us));
    /// ```
    pub fn custom<Q: CustomQualifier>(value: Q) -> Self {
        Qualifier::Custom(Arc::new(value))
    }

    /// Returns true for [`Qualifier::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Qualifier::Empty)
    }

    /// Returns true for [`Qualifier::Composite`].
    pub fn is_composite(&self) -> bool {
        matches!(self, Qualifier::Composite(_))
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Qualifier::Empty, Qualifier::Empty) => true,
            (Qualifier::Named(a), Qualifier::Named(b)) => a == b,
            (Qualifier::Composite(a), Qualifier::Composite(b)) => a == b,
            (Qualifier::Custom(a), Qualifier::Custom(b)) => a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Qualifier::Empty => 0u8.hash(state),
            Qualifier::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Qualifier::Composite(composite) => {
                2u8.hash(state);
                composite.hash(state);
            }
            Qualifier::Custom(custom) => {
                3u8.hash(state);
                custom.dyn_hash(state);
            }
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Empty => f.write_str("<no qualifier>"),
            Qualifier::Named(name) => write!(f, "named({})", name),
            Qualifier::Composite(composite) => fmt::Display::fmt(composite, f),
            Qualifier::Custom(custom) => fmt::Display::fmt(custom, f),
        }
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Empty => f.write_str("Empty"),
            Qualifier::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Qualifier::Composite(composite) => f.debug_tuple("Composite").field(composite).finish(),
            Qualifier::Custom(custom) => f.debug_tuple("Custom").field(custom).finish(),
        }
    }
}

impl From<&str> for Qualifier {
    fn from(name: &str) -> Self {
        named(name)
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        named(name)
    }
}

impl From<CompositeQualifier> for Qualifier {
    fn from(composite: CompositeQualifier) -> Self {
        Qualifier::Composite(composite)
    }
}

/// Combines two qualifiers.
///
/// - Empty on either side returns the other side.
/// - Two composites give the union of their members.
/// - A composite and a single qualifier give the composite with the single one added.
/// - Two single qualifiers give a new composite of both.
///
/// Combining two equal single qualifiers has nothing to compose and returns
/// that qualifier.
impl Add for Qualifier {
    type Output = Qualifier;

    fn add(self, other: Qualifier) -> Qualifier {
        match (self, other) {
            (Qualifier::Empty, other) => other,
            (this, Qualifier::Empty) => this,
            (Qualifier::Composite(mut a), Qualifier::Composite(b)) => {
                for member in b.members {
                    a.insert(member);
                }
                Qualifier::Composite(a)
            }
            (Qualifier::Composite(mut a), single) | (single, Qualifier::Composite(mut a)) => {
                a.insert(single);
                Qualifier::Composite(a)
            }
            (a, b) if a == b => a,
            (a, b) => Qualifier::Composite(CompositeQualifier { members: vec![a, b] }),
        }
    }
}

/// A set of qualifiers used together on a single identifier.
///
/// Members are kept in insertion order for display; equality and hashing
/// ignore that order.
#[derive(Clone, Debug)]
pub struct CompositeQualifier {
    members: Vec<Qualifier>,
}

impl CompositeQualifier {
    /// Creates a composite from at least two distinct non-empty, non-composite qualifiers.
    ///
    /// Duplicate members are collapsed before counting.
    ///
    /// ```rust
    /// use ferrous_inject::{named, CompositeQualifier, Qualifier};
    ///
    /// let composite = CompositeQualifier::new([named("a"), named("b")]).unwrap();
    /// assert_eq!(Qualifier::from(composite), named("a") + named("b"));
    ///
    /// assert!(CompositeQualifier::new([named("a")]).is_err());
    /// assert!(CompositeQualifier::new([named("a"), Qualifier::Empty]).is_err());
    /// ```
    pub fn new(members: impl IntoIterator<Item = Qualifier>) -> DiResult<Self> {
        let mut composite = CompositeQualifier { members: Vec::new() };
        for member in members {
            match member {
                Qualifier::Empty => {
                    return Err(DiError::InvalidDeclaration(
                        "A composite qualifier must not contain the empty qualifier".to_string(),
                    ))
                }
                Qualifier::Composite(_) => {
                    return Err(DiError::InvalidDeclaration(
                        "Composite qualifiers cannot be nested".to_string(),
                    ))
                }
                member => composite.insert(member),
            }
        }
        if composite.members.len() < 2 {
            return Err(DiError::InvalidDeclaration(format!(
                "Cannot create a composite qualifier with less than 2 qualifiers (got {})",
                composite.members.len()
            )));
        }
        Ok(composite)
    }

    /// The qualifiers this composite holds, in insertion order.
    pub fn members(&self) -> &[Qualifier] {
        &self.members
    }

    /// Returns true if `qualifier` is one of the members.
    pub fn contains(&self, qualifier: &Qualifier) -> bool {
        self.members.contains(qualifier)
    }

    fn insert(&mut self, qualifier: Qualifier) {
        if !self.members.contains(&qualifier) {
            self.members.push(qualifier);
        }
    }
}

impl PartialEq for CompositeQualifier {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self.members.iter().all(|member| other.members.contains(member))
    }
}

impl Eq for CompositeQualifier {}

impl Hash for CompositeQualifier {
    // Order-independent: members are hashed separately and summed.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self.members.iter().fold(0u64, |acc, member| {
            let mut hasher = DefaultHasher::new();
            member.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        self.members.len().hash(state);
        combined.hash(state);
    }
}

impl fmt::Display for CompositeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, member) in self.members.iter().enumerate() {
            if index > 0 {
                f.write_str(" + ")?;
            }
            fmt::Display::fmt(member, f)?;
        }
        Ok(())
    }
}

/// Extension point for application-defined qualifiers.
///
/// Blanket-implemented for every `Eq + Hash + Debug + Display` type, so any
/// such value can be passed to [`Qualifier::custom`]. Two custom qualifiers
/// are equal only if they have the same concrete type and equal values.
pub trait CustomQualifier: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Upcast used for value comparison.
    fn as_any(&self) -> &dyn Any;

    /// Value equality across the type-erased boundary.
    fn dyn_eq(&self, other: &dyn CustomQualifier) -> bool;

    /// Hashes the concrete type and value.
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<Q> CustomQualifier for Q
where
    Q: Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomQualifier) -> bool {
        other
            .as_any()
            .downcast_ref::<Q>()
            .map_or(false, |other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<Q>().hash(&mut state);
        self.hash(&mut state);
    }
}
