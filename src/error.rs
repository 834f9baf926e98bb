//! Error types for injection environments and graph checks.

use thiserror::Error;

use crate::check::CheckFailure;
use crate::identifier::Identifier;

/// Dependency injection errors
///
/// Represents the various error conditions that can occur while declaring
/// components, building environments, resolving injections or running graph
/// checks.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiError, Environment, MixedEnvironment};
///
/// struct Unregistered;
///
/// let env = MixedEnvironment::build(DeclarationsBuilder::new().build()).unwrap();
/// match env.get::<Unregistered>() {
///     Err(DiError::NotFound(identifier)) => {
///         assert!(identifier.to_string().ends_with("Unregistered (<no qualifier>)"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No component is declared under this identifier
    #[error("Component not found: {0}")]
    NotFound(Identifier),

    /// Two declarations were put under the same identifier
    #[error("Duplicate identifier: Tried to put '{0}', but one was already present")]
    DuplicateIdentifier(Identifier),

    /// A declaration or qualifier is malformed
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// A meta-environment injection was requested from a non-extensible environment
    #[error("This environment is not extensible and has no meta-environment")]
    NotExtensible,

    /// The stored component does not have the type its identifier declares
    #[error(
        "Internal error: injected component does not correspond to type expected by injector. \
         Expected an injection of {0}"
    )]
    TypeMismatch(Identifier),

    /// A construction cycle was found while building eagerly (includes path)
    #[error("Circular dependency: {}", join_path(.0))]
    Circular(Vec<Identifier>),

    /// Maximum eager construction depth exceeded
    #[error("Max construction depth {0} exceeded")]
    DepthExceeded(usize),

    /// An injector was read before its environment finished building
    #[error("Injection of {0} was read before the environment finished building")]
    EnvironmentNotReady(Identifier),

    /// An injector was read after its environment was dropped
    #[error("Injection of {0} was read after its environment was dropped")]
    EnvironmentDropped(Identifier),

    /// The environment only records injections and cannot produce components
    #[error("Injection of {0} is not available on this kind of environment")]
    InjectionUnavailable(Identifier),

    /// A supplier failed while building a component
    #[error("Failed to build {identifier}: {source}")]
    ConstructionFailed {
        /// The declaration whose supplier failed
        identifier: Identifier,
        /// What the supplier failed with
        #[source]
        source: Box<DiError>,
    },

    /// Something went wrong inside an environment implementation
    #[error("Internal error: {0}")]
    Internal(String),

    /// A graph check was not met
    #[error(transparent)]
    Check(#[from] CheckFailure),
}

impl DiError {
    /// Wraps `source` as the failure of the supplier declared under `identifier`.
    pub(crate) fn construction(identifier: &Identifier, source: DiError) -> Self {
        DiError::ConstructionFailed {
            identifier: identifier.clone(),
            source: Box::new(source),
        }
    }

    /// Follows `ConstructionFailed` wrapping down to the originating error.
    ///
    /// ```rust
    /// use ferrous_inject::{DiError, Identifier};
    ///
    /// struct A;
    /// struct B;
    ///
    /// let wrapped = DiError::ConstructionFailed {
    ///     identifier: Identifier::of::<A>(),
    ///     source: Box::new(DiError::NotFound(Identifier::of::<B>())),
    /// };
    /// assert!(matches!(wrapped.root_cause(), DiError::NotFound(_)));
    /// ```
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::ConstructionFailed { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if this error (or the error it wraps) is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), DiError::NotFound(_))
    }
}

fn join_path(path: &[Identifier]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
