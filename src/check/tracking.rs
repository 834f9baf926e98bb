//! Environment that records injection requests instead of building components.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::check::CheckFailure;
use crate::declaration::{AnyArc, Declaration, Declarations};
use crate::environment::EnvironmentCore;
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::InjectorCore;
use crate::internal::sync::Mutex;
use crate::scope::InjectionScope;

/// What an injector created by a [`Recorder`] does when read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReadPolicy {
    /// Fail with [`DiError::InjectionUnavailable`].
    Unavailable,
    /// Fail with a [`CheckFailure::UnsafeInjection`] naming the constructing component.
    Trap,
}

/// Instrumented environment used while one supplier runs.
pub(crate) struct Recorder {
    constructing: Identifier,
    policy: ReadPolicy,
    main: Mutex<Vec<Identifier>>,
    meta: Mutex<Vec<Identifier>>,
    trapped: Arc<Mutex<Option<Identifier>>>,
}

impl Recorder {
    pub(crate) fn new(constructing: Identifier, policy: ReadPolicy) -> Self {
        Recorder {
            constructing,
            policy,
            main: Mutex::new(Vec::new()),
            meta: Mutex::new(Vec::new()),
            trapped: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs the supplier of `declaration` against this recorder.
    pub(crate) fn run(&self, declaration: &Declaration) -> DiResult<AnyArc> {
        declaration.supply(&InjectionScope::new(self))
    }

    /// First target read under [`ReadPolicy::Trap`], even if the supplier
    /// discarded the resulting error.
    pub(crate) fn trapped(&self) -> Option<Identifier> {
        self.trapped.lock().clone()
    }

    pub(crate) fn into_edges(self) -> (Vec<Identifier>, Vec<Identifier>) {
        (self.main.into_inner(), self.meta.into_inner())
    }

    fn record(&self, edges: &Mutex<Vec<Identifier>>, identifier: &Identifier) -> Arc<dyn InjectorCore> {
        let mut edges = edges.lock();
        if !edges.contains(identifier) {
            edges.push(identifier.clone());
        }
        Arc::new(TrackedInjectorCore {
            constructing: self.constructing.clone(),
            target: identifier.clone(),
            policy: self.policy,
            trapped: Arc::clone(&self.trapped),
        })
    }
}

impl EnvironmentCore for Recorder {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        Err(DiError::InjectionUnavailable(identifier.clone()))
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        Ok(self.record(&self.main, identifier))
    }

    fn meta_injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        Ok(self.record(&self.meta, identifier))
    }
}

struct TrackedInjectorCore {
    constructing: Identifier,
    target: Identifier,
    policy: ReadPolicy,
    trapped: Arc<Mutex<Option<Identifier>>>,
}

impl InjectorCore for TrackedInjectorCore {
    fn identifier(&self) -> &Identifier {
        &self.target
    }

    fn fetch(&self) -> DiResult<AnyArc> {
        Err(match self.policy {
            ReadPolicy::Unavailable => DiError::InjectionUnavailable(self.target.clone()),
            ReadPolicy::Trap => {
                let mut trapped = self.trapped.lock();
                if trapped.is_none() {
                    *trapped = Some(self.target.clone());
                }
                DiError::Check(CheckFailure::UnsafeInjection {
                    constructing: self.constructing.clone(),
                    target: self.target.clone(),
                })
            }
        })
    }
}

/// Shadow environment recording which identifiers each supplier injects.
///
/// Every supplier runs once. Injection requests are recorded when the
/// injector is created, so a supplier that stores an injector without ever
/// reading it is still tracked. The injectors themselves cannot be read:
/// doing so fails with [`DiError::InjectionUnavailable`], and that failure
/// propagates out of [`build`](Self::build).
///
/// Requests made through [`InjectionScope::meta`] are recorded separately
/// and are not part of [`dependencies`](Self::dependencies).
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DependencyTrackingEnvironment, DiResult, Identifier, Injector};
///
/// struct Repository;
/// struct Service {
///     repository: Injector<Repository>,
/// }
///
/// fn track() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder
///         .put(|scope| Ok(Service { repository: scope.inject()? }))?
///         .put(|_| Ok(Repository))?;
///     let env = DependencyTrackingEnvironment::build(&builder.build())?;
///
///     assert_eq!(
///         env.dependencies()[&Identifier::of::<Service>()],
///         vec![Identifier::of::<Repository>()]
///     );
///     assert!(env.dependencies()[&Identifier::of::<Repository>()].is_empty());
///     Ok(())
/// }
/// track().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyTrackingEnvironment {
    dependencies: IndexMap<Identifier, Vec<Identifier>>,
    meta_dependencies: IndexMap<Identifier, Vec<Identifier>>,
}

impl DependencyTrackingEnvironment {
    /// Runs every supplier once and records its injection requests.
    pub fn build(declarations: &Declarations) -> DiResult<Self> {
        let mut env = DependencyTrackingEnvironment::default();
        for declaration in declarations {
            let identifier = declaration.identifier();
            let recorder = Recorder::new(identifier.clone(), ReadPolicy::Unavailable);
            recorder
                .run(declaration)
                .map_err(|error| DiError::construction(identifier, error))?;

            let (main, meta) = recorder.into_edges();
            env.dependencies.insert(identifier.clone(), main);
            if !meta.is_empty() {
                env.meta_dependencies.insert(identifier.clone(), meta);
            }
        }
        debug!(components = env.dependencies.len(), "dependencies tracked");
        Ok(env)
    }

    /// Edges from each declared identifier to the identifiers it injects,
    /// in declaration order then request order.
    pub fn dependencies(&self) -> &IndexMap<Identifier, Vec<Identifier>> {
        &self.dependencies
    }

    /// Edges to meta-environment components, for declarations that have any.
    pub fn meta_dependencies(&self) -> &IndexMap<Identifier, Vec<Identifier>> {
        &self.meta_dependencies
    }
}
