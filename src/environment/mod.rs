//! Injection environments.
//!
//! An environment owns the components built from a set of declarations and
//! resolves identifiers to them. Four strategies are provided:
//!
//! - [`MixedEnvironment`]: every supplier runs once at build time, injections
//!   are resolved lazily on first read. Tolerates cycles.
//! - [`EagerMetaEnvironment`]: suppliers run at build time and injected
//!   components are built recursively on request. Rejects cycles.
//! - [`ExtensibleEnvironment`]: a mixed environment with an eager
//!   meta-environment and declarations processors.
//! - [`MutableEnvironment`]: eager creation, injections re-read on every
//!   access, and components can be added after the build.

use std::sync::Arc;

use crate::declaration::{downcast_component, AnyArc};
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::{InjectionHook, Injector, InjectorCore};
use crate::qualifier::Qualifier;

pub mod extensible;
pub mod meta;
pub mod mixed;
pub mod mutable;

pub use extensible::{EnvironmentRef, ExtensibleEnvironment};
pub use meta::EagerMetaEnvironment;
pub use mixed::MixedEnvironment;
pub use mutable::MutableEnvironment;

/// Object-safe core of an environment.
///
/// Implemented by every environment, including the instrumented ones used
/// by graph checks. Most callers use the generic [`Environment`] methods
/// built on top of it.
pub trait EnvironmentCore: Send + Sync {
    /// Looks up a component, `None` if nothing is declared under `identifier`.
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>>;

    /// Creates the backend of an injector for `identifier`.
    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>>;

    /// Creates the backend of an injector reading the meta-environment.
    ///
    /// Fails with [`DiError::NotExtensible`] unless overridden.
    fn meta_injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        let _ = identifier;
        Err(DiError::NotExtensible)
    }
}

pub(crate) fn ensure_type<T: ?Sized + 'static>(identifier: &Identifier) -> DiResult<()> {
    if identifier.is::<T>() {
        Ok(())
    } else {
        Err(DiError::InvalidDeclaration(format!(
            "{} does not name type {}",
            identifier,
            std::any::type_name::<T>()
        )))
    }
}

/// Typed retrieval API, available on every [`EnvironmentCore`].
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, MixedEnvironment};
///
/// fn lookups() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder.put(|_| Ok(8080u16))?.put_named("admin", |_| Ok(9090u16))?;
///     let env = MixedEnvironment::build(builder.build())?;
///
///     assert_eq!(*env.get::<u16>()?, 8080);
///     assert_eq!(*env.get_named::<u16>("admin")?, 9090);
///     assert!(env.get_or_null::<u32>()?.is_none());
///     Ok(())
/// }
/// lookups().unwrap();
/// ```
pub trait Environment: EnvironmentCore {
    /// Retrieves the unqualified component of type `T`.
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_identifier(&Identifier::of::<T>())
    }

    /// Retrieves the component of type `T` with a named qualifier.
    fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: impl Into<String>) -> DiResult<Arc<T>> {
        self.get_identifier(&Identifier::named::<T>(name))
    }

    /// Retrieves the component of type `T` with an arbitrary qualifier.
    fn get_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> DiResult<Arc<T>> {
        self.get_identifier(&Identifier::qualified::<T>(qualifier))
    }

    /// Retrieves the component stored under `identifier`, which must name `T`.
    fn get_identifier<T: ?Sized + Send + Sync + 'static>(&self, identifier: &Identifier) -> DiResult<Arc<T>> {
        self.get_or_null_identifier::<T>(identifier)?
            .ok_or_else(|| DiError::NotFound(identifier.clone()))
    }

    /// Retrieves the unqualified component of type `T`, `None` if absent.
    fn get_or_null<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.get_or_null_identifier(&Identifier::of::<T>())
    }

    /// Retrieves the named component of type `T`, `None` if absent.
    fn get_or_null_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> DiResult<Option<Arc<T>>> {
        self.get_or_null_identifier(&Identifier::named::<T>(name))
    }

    /// Retrieves the component stored under `identifier`, `None` if absent.
    fn get_or_null_identifier<T: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: &Identifier,
    ) -> DiResult<Option<Arc<T>>> {
        ensure_type::<T>(identifier)?;
        match self.get_erased(identifier)? {
            Some(component) => downcast_component::<T>(identifier, &component).map(Some),
            None => Ok(None),
        }
    }

    /// Retrieves the unqualified component of type `T`, panicking on failure.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Retrieves the named component of type `T`, panicking on failure.
    fn get_required_named<T: ?Sized + Send + Sync + 'static>(&self, name: impl Into<String>) -> Arc<T> {
        self.get_named::<T>(name)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Creates an injector bound to this environment.
    fn create_injector<T: ?Sized + Send + Sync + 'static>(&self, identifier: &Identifier) -> DiResult<Injector<T>> {
        ensure_type::<T>(identifier)?;
        self.injector_core(identifier).map(Injector::new)
    }

    /// Creates an injector that calls `hook` each time an injection actually
    /// happens. For memoizing environments this is at most once.
    fn create_injector_with<T, H>(&self, identifier: &Identifier, hook: H) -> DiResult<Injector<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        H: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        ensure_type::<T>(identifier)?;
        let hook: InjectionHook<T> = Box::new(hook);
        self.injector_core(identifier)
            .map(|core| Injector::with_hook(core, hook))
    }
}

impl<E: EnvironmentCore + ?Sized> Environment for E {}
