//! Deferred, memoized handles to injected components.

use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::declaration::{downcast_component, AnyArc};
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;

/// Object-safe backend of an [`Injector`], provided by environments.
///
/// Each environment decides what a read means: a lookup into an already
/// built component map, a trap that always fails, or a live read of a
/// mutable map.
pub trait InjectorCore: Send + Sync {
    /// The identifier this injector reads.
    fn identifier(&self) -> &Identifier;

    /// Fetches the type-erased component.
    fn fetch(&self) -> DiResult<AnyArc>;

    /// Whether the first successful read may be cached by the injector.
    fn memoized(&self) -> bool {
        true
    }
}

/// Callback invoked with the component each time an injection actually happens.
pub type InjectionHook<T> = Box<dyn Fn(&Arc<T>) + Send + Sync>;

/// A deferred read of another component.
///
/// Obtained from [`InjectionScope::inject`](crate::InjectionScope::inject)
/// and stored in the component being constructed. Nothing is read until
/// [`get`](Injector::get) is first called; the result is then memoized for
/// this injector. Concurrent first reads are synchronized per injector, so
/// the lookup and the injection hook run exactly once.
///
/// The memo holds a weak reference: components are owned by their
/// environment, and reading after the environment has been dropped fails
/// with [`DiError::EnvironmentDropped`].
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, Injector, MixedEnvironment};
///
/// struct Ping {
///     pong: Injector<Pong>,
/// }
///
/// struct Pong {
///     ping: Injector<Ping>,
/// }
///
/// fn cycle() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder
///         .put(|scope| Ok(Ping { pong: scope.inject()? }))?
///         .put(|scope| Ok(Pong { ping: scope.inject()? }))?;
///     let env = MixedEnvironment::build(builder.build())?;
///
///     let ping = env.get::<Ping>()?;
///     let back = ping.pong.get()?.ping.get()?;
///     assert!(std::sync::Arc::ptr_eq(&ping, &back));
///     Ok(())
/// }
/// cycle().unwrap();
/// ```
pub struct Injector<T: ?Sized + Send + Sync + 'static> {
    core: Arc<dyn InjectorCore>,
    memo: OnceCell<Weak<T>>,
    hook: Option<InjectionHook<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Injector<T> {
    pub(crate) fn new(core: Arc<dyn InjectorCore>) -> Self {
        Injector {
            core,
            memo: OnceCell::new(),
            hook: None,
        }
    }

    pub(crate) fn with_hook(core: Arc<dyn InjectorCore>, hook: InjectionHook<T>) -> Self {
        Injector {
            core,
            memo: OnceCell::new(),
            hook: Some(hook),
        }
    }

    /// The identifier this injector reads.
    pub fn identifier(&self) -> &Identifier {
        self.core.identifier()
    }

    /// Reads the component, resolving it on first use.
    pub fn get(&self) -> DiResult<Arc<T>> {
        if !self.core.memoized() {
            return self.resolve();
        }
        let weak = self
            .memo
            .get_or_try_init(|| self.resolve().map(|component| Arc::downgrade(&component)))?;
        weak.upgrade()
            .ok_or_else(|| DiError::EnvironmentDropped(self.identifier().clone()))
    }

    /// Reads the component, panicking on failure.
    ///
    /// The panic payload is the [`DiError`] itself, so it can be recovered
    /// with [`std::panic::catch_unwind`] and `downcast_ref::<DiError>()`.
    pub fn get_required(&self) -> Arc<T> {
        self.get().unwrap_or_else(|error| std::panic::panic_any(error))
    }

    /// Maps the injected component lazily.
    ///
    /// `map` runs on the first read of the returned injector and its result
    /// is memoized. This is the way to derive a value from an injected
    /// component without reading it while the owner is being constructed.
    ///
    /// ```rust
    /// use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, MixedEnvironment, WrappedInjector};
    ///
    /// struct Settings {
    ///     name: String,
    /// }
    ///
    /// struct Greeter {
    ///     greeting: WrappedInjector<Settings, String>,
    /// }
    ///
    /// fn wrapped() -> DiResult<()> {
    ///     let mut builder = DeclarationsBuilder::new();
    ///     builder
    ///         .put(|_| Ok(Settings { name: "world".to_string() }))?
    ///         .put(|scope| {
    ///             let greeting = scope
    ///                 .inject::<Settings>()?
    ///                 .wrap_in(|settings| format!("Hello, {}!", settings.name));
    ///             Ok(Greeter { greeting })
    ///         })?;
    ///     let env = MixedEnvironment::build(builder.build())?;
    ///     assert_eq!(*env.get::<Greeter>()?.greeting.get()?, "Hello, world!");
    ///     Ok(())
    /// }
    /// wrapped().unwrap();
    /// ```
    pub fn wrap_in<R, F>(self, map: F) -> WrappedInjector<T, R>
    where
        R: Send + Sync + 'static,
        F: Fn(Arc<T>) -> R + Send + Sync + 'static,
    {
        WrappedInjector {
            inner: self,
            map: Box::new(map),
            value: OnceCell::new(),
        }
    }

    fn resolve(&self) -> DiResult<Arc<T>> {
        let component = self.core.fetch()?;
        let component = downcast_component::<T>(self.identifier(), &component)?;
        if let Some(hook) = &self.hook {
            hook(&component);
        }
        Ok(component)
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for Injector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("identifier", self.identifier())
            .field("resolved", &self.memo.get().is_some())
            .finish()
    }
}

/// An injector whose component is mapped once, on first read.
///
/// Created with [`Injector::wrap_in`].
pub struct WrappedInjector<T: ?Sized + Send + Sync + 'static, R> {
    inner: Injector<T>,
    map: Box<dyn Fn(Arc<T>) -> R + Send + Sync>,
    value: OnceCell<Arc<R>>,
}

impl<T: ?Sized + Send + Sync + 'static, R: Send + Sync + 'static> WrappedInjector<T, R> {
    /// The identifier of the wrapped injection.
    pub fn identifier(&self) -> &Identifier {
        self.inner.identifier()
    }

    /// Reads and maps the component on first use.
    pub fn get(&self) -> DiResult<Arc<R>> {
        self.value
            .get_or_try_init(|| self.inner.get().map(|component| Arc::new((self.map)(component))))
            .map(Arc::clone)
    }
}

impl<T: ?Sized + Send + Sync + 'static, R> fmt::Debug for WrappedInjector<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedInjector")
            .field("identifier", self.inner.identifier())
            .field("mapped", &self.value.get().is_some())
            .finish()
    }
}

/// An injector that reads `None` when its component is not declared.
///
/// Only the not-found failure for this injector's own identifier becomes
/// `None`; every other error is returned unchanged.
pub struct OptionalInjector<T: ?Sized + Send + Sync + 'static> {
    identifier: Identifier,
    inner: Option<Injector<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> OptionalInjector<T> {
    /// Wraps the outcome of an injection request.
    pub(crate) fn from_result(identifier: Identifier, result: DiResult<Injector<T>>) -> DiResult<Self> {
        match result {
            Ok(injector) => Ok(OptionalInjector {
                identifier,
                inner: Some(injector),
            }),
            Err(DiError::NotFound(missing)) if missing == identifier => Ok(OptionalInjector {
                identifier,
                inner: None,
            }),
            Err(error) => Err(error),
        }
    }

    /// The identifier this injector reads.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Reads the component, or `None` if it is not declared.
    pub fn get(&self) -> DiResult<Option<Arc<T>>> {
        let Some(injector) = &self.inner else {
            return Ok(None);
        };
        match injector.get() {
            Ok(component) => Ok(Some(component)),
            Err(DiError::NotFound(missing)) if missing == self.identifier => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for OptionalInjector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalInjector")
            .field("identifier", &self.identifier)
            .field("absent", &self.inner.is_none())
            .finish()
    }
}
