//! Extensible environment: a mixed environment plus an eager meta-environment.

use std::sync::{Arc, Weak};

use tracing::debug;

use crate::declaration::{AnyArc, Declaration, ExtensibleContext};
use crate::environment::meta::EagerMetaEnvironment;
use crate::environment::mixed::MixedEnvironment;
use crate::environment::EnvironmentCore;
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::InjectorCore;
use crate::qualifier::Qualifier;

struct ExtensibleInner {
    main: MixedEnvironment,
    meta: Arc<EagerMetaEnvironment>,
}

/// Handle to the extensible environment, available in its meta-environment.
///
/// Every extensible environment declares one in its meta-environment under
/// `Identifier::of::<EnvironmentRef>()`, so meta components can query the
/// environment they extend. The handle is weak: it upgrades only once the
/// environment has finished building and while it is alive.
#[derive(Clone)]
pub struct EnvironmentRef {
    inner: Weak<ExtensibleInner>,
}

impl EnvironmentRef {
    /// The environment, if it is built and still alive.
    pub fn upgrade(&self) -> Option<ExtensibleEnvironment> {
        self.inner
            .upgrade()
            .map(|inner| ExtensibleEnvironment { inner })
    }
}

impl std::fmt::Debug for EnvironmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentRef")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Environment with a meta-environment for infrastructure components.
///
/// Building happens in this order:
///
/// 1. An [`EnvironmentRef`] to this environment is added to the meta declarations.
/// 2. The meta-environment is built eagerly ([`EagerMetaEnvironment`]).
/// 3. Every meta component declared as a
///    [`DeclarationsProcessor`](crate::DeclarationsProcessor) receives the main
///    declarations, once, in meta-declaration order.
/// 4. The main environment is built like a [`MixedEnvironment`]; its
///    suppliers can reach the meta-environment through
///    [`InjectionScope::meta`](crate::InjectionScope::meta).
///
/// Cloning is cheap and yields a handle to the same environment.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{
///     DiResult, Environment, EnvironmentRef, ExtensibleContext, ExtensibleEnvironment, Injector,
/// };
///
/// struct Clock;
/// struct Scheduler {
///     clock: Injector<Clock>,
/// }
///
/// fn extensible() -> DiResult<()> {
///     let mut builder = ExtensibleContext::builder();
///     builder.put(|scope| Ok(Scheduler { clock: scope.meta().inject()? }))?;
///     builder.meta(|meta| {
///         meta.put(|_| Ok(Clock))?;
///         Ok(())
///     })?;
///     let env = ExtensibleEnvironment::build(builder.build())?;
///
///     env.get::<Scheduler>()?.clock.get()?;
///     assert!(env.get::<Clock>().is_err());
///     assert!(env.meta_environment().get::<EnvironmentRef>()?.upgrade().is_some());
///     Ok(())
/// }
/// extensible().unwrap();
/// ```
#[derive(Clone)]
pub struct ExtensibleEnvironment {
    inner: Arc<ExtensibleInner>,
}

impl ExtensibleEnvironment {
    /// Builds the meta-environment, runs processors, then builds the main environment.
    pub fn build(context: ExtensibleContext) -> DiResult<Self> {
        let mut failure = None;
        let inner = Arc::new_cyclic(|this: &Weak<ExtensibleInner>| {
            match Self::build_inner(&context, this.clone()) {
                Ok(inner) => inner,
                Err(error) => {
                    failure = Some(error);
                    ExtensibleInner {
                        main: MixedEnvironment::empty(),
                        meta: Arc::new(EagerMetaEnvironment::empty()),
                    }
                }
            }
        });
        match failure {
            Some(error) => Err(error),
            None => Ok(ExtensibleEnvironment { inner }),
        }
    }

    fn build_inner(context: &ExtensibleContext, this: Weak<ExtensibleInner>) -> DiResult<ExtensibleInner> {
        let mut meta_declarations = context.meta_declarations.clone();
        meta_declarations.insert(Declaration::value(Qualifier::Empty, EnvironmentRef { inner: this }));
        let meta = Arc::new(EagerMetaEnvironment::build(meta_declarations)?);

        let mut processors = 0;
        for declaration in context.meta_declarations.iter().filter(|d| d.is_processor()) {
            let identifier = declaration.identifier();
            let component = meta
                .component(identifier)
                .ok_or_else(|| DiError::Internal(format!("Processor {} was not built", identifier)))?;
            let processor = declaration.as_processor(component).ok_or_else(|| {
                DiError::Internal(format!("Component {} is not a declarations processor", identifier))
            })?;
            processor.process_declarations(&context.declarations);
            processors += 1;
        }
        debug!(processors, "declarations processed");

        let main = MixedEnvironment::build_with_meta(&context.declarations, Some(Arc::clone(&meta)))?;
        Ok(ExtensibleInner { main, meta })
    }

    /// The meta-environment.
    pub fn meta_environment(&self) -> &EagerMetaEnvironment {
        &self.inner.meta
    }

    /// Every identifier of the main environment, in declaration order.
    pub fn get_all_identifiers(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.inner.main.get_all_identifiers()
    }
}

impl EnvironmentCore for ExtensibleEnvironment {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        self.inner.main.get_erased(identifier)
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        self.inner.main.injector_core(identifier)
    }

    fn meta_injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        self.inner.meta.injector_core(identifier)
    }
}

impl std::fmt::Debug for ExtensibleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensibleEnvironment")
            .field("main", &self.inner.main)
            .field("meta", &self.inner.meta)
            .finish()
    }
}
