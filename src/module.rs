//! Named groups of declarations.

use std::sync::Arc;

use crate::declaration::Declaration;
use crate::error::DiResult;
use crate::qualifier::Qualifier;
use crate::scope::InjectionScope;

/// A named, reusable group of declarations.
///
/// Modules are the unit graph checks operate on and can be merged into a
/// [`DeclarationsBuilder`](crate::DeclarationsBuilder) with `put_module`.
/// A module does not deduplicate its declarations: duplicates are rejected
/// when modules are combined into one set of declarations.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, Module};
///
/// struct Repository;
/// struct Service;
///
/// fn modules() -> DiResult<()> {
///     let data = Module::builder("data").put(|_| Ok(Repository)).build();
///     let domain = Module::builder("domain").put(|_| Ok(Service)).build();
///
///     let mut builder = DeclarationsBuilder::new();
///     builder.put_module(&data)?.put_module(&domain)?;
///     assert_eq!(builder.build().len(), 2);
///     Ok(())
/// }
/// modules().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Module {
    name: String,
    declarations: Vec<Declaration>,
}

impl Module {
    /// Starts building a module.
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations, in the order they were added.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

/// Builder for [`Module`].
pub struct ModuleBuilder {
    name: String,
    declarations: Vec<Declaration>,
}

impl ModuleBuilder {
    /// Adds an unqualified component of type `T`.
    pub fn put<T, F>(self, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.declare(Declaration::new::<T, F>(Qualifier::Empty, supplier))
    }

    /// Adds a component of type `T` with a named qualifier.
    pub fn put_named<T, F>(self, name: impl Into<String>, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.declare(Declaration::new::<T, F>(Qualifier::Named(name.into()), supplier))
    }

    /// Adds a component of type `T` with an arbitrary qualifier.
    pub fn put_qualified<T, F>(self, qualifier: impl Into<Qualifier>, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.declare(Declaration::new::<T, F>(qualifier, supplier))
    }

    /// Adds a component whose supplier returns an `Arc<T>`.
    pub fn put_shared<T, F>(self, qualifier: impl Into<Qualifier>, supplier: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.declare(Declaration::shared::<T, F>(qualifier, supplier))
    }

    /// Adds a prepared declaration.
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Finishes the module.
    pub fn build(self) -> Module {
        Module {
            name: self.name,
            declarations: self.declarations,
        }
    }
}
