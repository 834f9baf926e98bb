//! Injection scopes handed to suppliers.

use std::sync::Arc;

use crate::environment::{ensure_type, EnvironmentCore};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::injector::{Injector, InjectorCore, OptionalInjector};
use crate::qualifier::Qualifier;

fn injector<T: ?Sized + Send + Sync + 'static>(
    identifier: &Identifier,
    core: impl FnOnce(&Identifier) -> DiResult<Arc<dyn InjectorCore>>,
) -> DiResult<Injector<T>> {
    ensure_type::<T>(identifier)?;
    core(identifier).map(Injector::new)
}

/// Entry point through which a supplier requests its dependencies.
///
/// Injection requests return [`Injector`]s. What happens at request time
/// depends on the environment: the mixed environment only hands out a lazy
/// handle, the eager meta-environment builds the target immediately.
/// Components should store injectors and read them later, never during
/// their own construction.
#[derive(Clone, Copy)]
pub struct InjectionScope<'a> {
    env: &'a dyn EnvironmentCore,
}

impl<'a> InjectionScope<'a> {
    pub(crate) fn new(env: &'a dyn EnvironmentCore) -> Self {
        InjectionScope { env }
    }

    /// Injects the unqualified component of type `T`.
    pub fn inject<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::of::<T>())
    }

    /// Injects the component of type `T` with a named qualifier.
    pub fn inject_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::named::<T>(name))
    }

    /// Injects the component of type `T` with an arbitrary qualifier.
    pub fn inject_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::qualified::<T>(qualifier))
    }

    /// Injects the component stored under `identifier`, which must name `T`.
    pub fn inject_identifier<T: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: &Identifier,
    ) -> DiResult<Injector<T>> {
        injector(identifier, |identifier| self.env.injector_core(identifier))
    }

    /// Like [`inject`](Self::inject), but absent components read as `None`.
    pub fn optional<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<OptionalInjector<T>> {
        self.optional_identifier(Identifier::of::<T>())
    }

    /// Like [`inject_named`](Self::inject_named), but absent components read as `None`.
    pub fn optional_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> DiResult<OptionalInjector<T>> {
        self.optional_identifier(Identifier::named::<T>(name))
    }

    /// Like [`inject_qualified`](Self::inject_qualified), but absent components read as `None`.
    pub fn optional_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> DiResult<OptionalInjector<T>> {
        self.optional_identifier(Identifier::qualified::<T>(qualifier))
    }

    fn optional_identifier<T: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: Identifier,
    ) -> DiResult<OptionalInjector<T>> {
        let result = self.inject_identifier(&identifier);
        OptionalInjector::from_result(identifier, result)
    }

    /// Scope over the meta-environment.
    ///
    /// Requests made through it fail with [`DiError::NotExtensible`](crate::DiError::NotExtensible) unless
    /// the environment being built is an extensible one.
    pub fn meta(&self) -> MetaScope<'a> {
        MetaScope { env: self.env }
    }
}

/// Injection scope over the meta-environment of an extensible environment.
///
/// Obtained with [`InjectionScope::meta`]. It has no `meta()` of its own.
#[derive(Clone, Copy)]
pub struct MetaScope<'a> {
    env: &'a dyn EnvironmentCore,
}

impl<'a> MetaScope<'a> {
    /// Injects the unqualified meta component of type `T`.
    pub fn inject<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::of::<T>())
    }

    /// Injects the meta component of type `T` with a named qualifier.
    pub fn inject_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::named::<T>(name))
    }

    /// Injects the meta component of type `T` with an arbitrary qualifier.
    pub fn inject_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> DiResult<Injector<T>> {
        self.inject_identifier(&Identifier::qualified::<T>(qualifier))
    }

    /// Injects the meta component stored under `identifier`.
    pub fn inject_identifier<T: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: &Identifier,
    ) -> DiResult<Injector<T>> {
        injector(identifier, |identifier| self.env.meta_injector_core(identifier))
    }

    /// Like [`inject`](Self::inject), but absent components read as `None`.
    pub fn optional<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<OptionalInjector<T>> {
        self.optional_identifier(Identifier::of::<T>())
    }

    /// Like [`inject_named`](Self::inject_named), but absent components read as `None`.
    pub fn optional_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
    ) -> DiResult<OptionalInjector<T>> {
        self.optional_identifier(Identifier::named::<T>(name))
    }

    fn optional_identifier<T: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: Identifier,
    ) -> DiResult<OptionalInjector<T>> {
        let result = self.inject_identifier(&identifier);
        OptionalInjector::from_result(identifier, result)
    }
}
