//! Mutable environment, mostly useful in tests.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::declaration::{AnyArc, Declaration, Declarations};
use crate::environment::EnvironmentCore;
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::InjectorCore;
use crate::internal::sync::RwLock;
use crate::module::Module;
use crate::qualifier::Qualifier;
use crate::scope::InjectionScope;

type ComponentMap = RwLock<IndexMap<Identifier, AnyArc>>;

/// Environment that accepts new components after it is built.
///
/// Suppliers run eagerly. Injectors are *active*: they read the component
/// map on every access instead of memoizing, so they observe components
/// added or replaced later with [`put`](MutableEnvironment::put). The map
/// is guarded by a read-write lock; no lock is held while a supplier runs.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, Injector, MutableEnvironment};
///
/// struct Late;
/// struct Early {
///     late: Injector<Late>,
/// }
///
/// fn late_binding() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder.put(|scope| Ok(Early { late: scope.inject()? }))?;
///     let env = MutableEnvironment::build(builder.build())?;
///
///     let early = env.get::<Early>()?;
///     assert!(early.late.get().is_err());
///
///     env.put(|_| Ok(Late))?;
///     assert!(early.late.get().is_ok());
///     Ok(())
/// }
/// late_binding().unwrap();
/// ```
pub struct MutableEnvironment {
    components: Arc<ComponentMap>,
}

impl MutableEnvironment {
    /// Builds the environment, running every supplier in declaration order.
    pub fn build(declarations: Declarations) -> DiResult<Self> {
        let env = MutableEnvironment {
            components: Arc::new(RwLock::new(IndexMap::with_capacity(declarations.len()))),
        };
        for declaration in &declarations {
            env.put_declaration(declaration.clone())?;
        }
        debug!(components = declarations.len(), "mutable environment built");
        Ok(env)
    }

    /// Adds an unqualified component of type `T`, replacing any previous one.
    pub fn put<T, F>(&self, supplier: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::new::<T, F>(Qualifier::Empty, supplier))
    }

    /// Adds a component of type `T` with a named qualifier, replacing any previous one.
    pub fn put_named<T, F>(&self, name: impl Into<String>, supplier: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::new::<T, F>(Qualifier::Named(name.into()), supplier))
    }

    /// Adds a component stored as an `Arc<T>`, for trait objects.
    pub fn put_shared<T, F>(&self, qualifier: impl Into<Qualifier>, supplier: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::shared::<T, F>(qualifier, supplier))
    }

    /// Adds an existing value.
    pub fn put_value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        self.put_declaration(Declaration::value(Qualifier::Empty, value))
    }

    /// Adds every declaration of `module`, in order.
    pub fn put_module(&self, module: &Module) -> DiResult<()> {
        for declaration in module.declarations() {
            self.put_declaration(declaration.clone())?;
        }
        Ok(())
    }

    /// Runs the supplier of `declaration` and stores the component.
    ///
    /// An existing component with the same identifier is replaced and keeps
    /// its position. Injectors already handed out see the new component on
    /// their next read. If the supplier fails, nothing changes.
    pub fn put_declaration(&self, declaration: Declaration) -> DiResult<()> {
        let identifier = declaration.identifier();
        let component = self.supply(&declaration)?;
        if self.components.write().insert(identifier.clone(), component).is_some() {
            debug!(%identifier, "component replaced");
        }
        Ok(())
    }

    /// Like [`put`](Self::put), but fails with [`DiError::DuplicateIdentifier`]
    /// instead of replacing.
    pub fn try_put<T, F>(&self, supplier: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_put_declaration(Declaration::new::<T, F>(Qualifier::Empty, supplier))
    }

    /// Like [`put_declaration`](Self::put_declaration), but fails with
    /// [`DiError::DuplicateIdentifier`] if the identifier is already present,
    /// before or after running the supplier.
    pub fn try_put_declaration(&self, declaration: Declaration) -> DiResult<()> {
        let identifier = declaration.identifier();
        if self.components.read().contains_key(identifier) {
            return Err(DiError::DuplicateIdentifier(identifier.clone()));
        }

        let component = self.supply(&declaration)?;
        let mut components = self.components.write();
        if components.contains_key(identifier) {
            return Err(DiError::DuplicateIdentifier(identifier.clone()));
        }
        components.insert(identifier.clone(), component);
        Ok(())
    }

    // No lock is held while the supplier runs.
    fn supply(&self, declaration: &Declaration) -> DiResult<AnyArc> {
        let identifier = declaration.identifier();
        trace!(%identifier, "running supplier");
        declaration
            .supply(&InjectionScope::new(self))
            .map_err(|error| DiError::construction(identifier, error))
    }

    /// Snapshot of every identifier, in insertion order.
    pub fn get_all_identifiers(&self) -> Vec<Identifier> {
        self.components.read().keys().cloned().collect()
    }
}

impl EnvironmentCore for MutableEnvironment {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        Ok(self.components.read().get(identifier).cloned())
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        Ok(Arc::new(ActiveInjectorCore {
            identifier: identifier.clone(),
            components: Arc::downgrade(&self.components),
        }))
    }
}

impl std::fmt::Debug for MutableEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableEnvironment")
            .field("components", &self.components.read().len())
            .finish()
    }
}

/// Reads the live component map on every access.
struct ActiveInjectorCore {
    identifier: Identifier,
    components: Weak<ComponentMap>,
}

impl InjectorCore for ActiveInjectorCore {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn fetch(&self) -> DiResult<AnyArc> {
        let components = self
            .components
            .upgrade()
            .ok_or_else(|| DiError::EnvironmentDropped(self.identifier.clone()))?;
        let component = components.read().get(&self.identifier).cloned();
        component.ok_or_else(|| DiError::NotFound(self.identifier.clone()))
    }

    fn memoized(&self) -> bool {
        false
    }
}
