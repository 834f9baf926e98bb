//! Unused check: every declared component should be injected somewhere.

use std::collections::HashSet;

use crate::check::tracking::DependencyTrackingEnvironment;
use crate::check::{declarations_of, CheckFailure, IndividualCheck};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;
use crate::qualifier::Qualifier;

/// Checks that every declared component is injected by another one.
///
/// Components that are only retrieved with an environment `get` (entry
/// points, typically) are legitimately never injected; exclude them.
///
/// ```rust
/// use ferrous_inject::check::{no_unused, IndividualCheck, NoUnusedCheck};
/// use ferrous_inject::{DiResult, Injector, Module};
///
/// struct Application {
///     database: Injector<Database>,
/// }
/// struct Database;
///
/// fn unused() -> DiResult<()> {
///     let module = Module::builder("app")
///         .put(|scope| Ok(Application { database: scope.inject()? }))
///         .put(|_| Ok(Database))
///         .build();
///     let modules = [module];
///
///     assert!(no_unused().check(&modules).is_err());
///     NoUnusedCheck::new().exclude::<Application>().check(&modules)
/// }
/// unused().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct NoUnusedCheck {
    excluded: HashSet<Identifier>,
}

/// Creates a [`NoUnusedCheck`] that excludes nothing.
pub fn no_unused() -> NoUnusedCheck {
    NoUnusedCheck::new()
}

impl NoUnusedCheck {
    /// Creates a check that excludes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes the unqualified component of type `T`.
    pub fn exclude<T: ?Sized + 'static>(self) -> Self {
        self.exclude_identifier(Identifier::of::<T>())
    }

    /// Excludes the component of type `T` with a named qualifier.
    pub fn exclude_named<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.exclude_identifier(Identifier::named::<T>(name))
    }

    /// Excludes the component of type `T` with an arbitrary qualifier.
    pub fn exclude_qualified<T: ?Sized + 'static>(self, qualifier: impl Into<Qualifier>) -> Self {
        self.exclude_identifier(Identifier::qualified::<T>(qualifier))
    }

    /// Excludes a component by identifier.
    pub fn exclude_identifier(mut self, identifier: Identifier) -> Self {
        self.excluded.insert(identifier);
        self
    }
}

impl IndividualCheck for NoUnusedCheck {
    fn name(&self) -> &'static str {
        "noUnused"
    }

    fn check(&self, modules: &[Module]) -> DiResult<()> {
        let env = DependencyTrackingEnvironment::build(&declarations_of(modules)?)?;
        let dependencies = env.dependencies();
        let injected: HashSet<&Identifier> = dependencies.values().flatten().collect();

        let unused: Vec<Identifier> = dependencies
            .keys()
            .filter(|identifier| !injected.contains(identifier) && !self.excluded.contains(*identifier))
            .cloned()
            .collect();

        if unused.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure::Unused { unused }.into())
        }
    }
}
