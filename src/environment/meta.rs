//! Eager environment used for meta-environments.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::declaration::{AnyArc, Declarations};
use crate::environment::EnvironmentCore;
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::InjectorCore;
use crate::internal::sync::Mutex;
use crate::internal::ConstructionStack;
use crate::scope::InjectionScope;

/// Environment that builds everything eagerly and recursively.
///
/// Injecting a component that has not been built yet builds it on the
/// spot, so meta components may depend on each other in any declaration
/// order. Cycles are not supported: re-entering a component under
/// construction fails with [`DiError::Circular`] carrying the cycle, and
/// nesting deeper than [`MAX_CONSTRUCTION_DEPTH`] fails with
/// [`DiError::DepthExceeded`]. Injecting an undeclared component fails
/// immediately with [`DiError::NotFound`].
///
/// [`MAX_CONSTRUCTION_DEPTH`]: crate::MAX_CONSTRUCTION_DEPTH
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, EagerMetaEnvironment, Environment, Injector};
///
/// struct Registry;
/// struct Manager {
///     registry: Injector<Registry>,
/// }
///
/// fn forward_reference() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     // Manager is declared first and pulls Registry in while being built.
///     builder
///         .put(|scope| Ok(Manager { registry: scope.inject()? }))?
///         .put(|_| Ok(Registry))?;
///     let env = EagerMetaEnvironment::build(builder.build())?;
///
///     let registry = env.get::<Registry>()?;
///     assert!(std::sync::Arc::ptr_eq(&registry, &env.get::<Manager>()?.registry.get()?));
///     Ok(())
/// }
/// forward_reference().unwrap();
/// ```
pub struct EagerMetaEnvironment {
    components: IndexMap<Identifier, AnyArc>,
}

impl EagerMetaEnvironment {
    /// Builds every component, recursively building injected ones first.
    pub fn build(declarations: Declarations) -> DiResult<Self> {
        let builder = EagerBuilder {
            declarations: &declarations,
            built: Mutex::new(IndexMap::with_capacity(declarations.len())),
            stack: ConstructionStack::default(),
        };
        for identifier in declarations.identifiers() {
            builder.ensure_built(identifier)?;
        }

        let mut built = builder.built.into_inner();
        let components = declarations
            .identifiers()
            .filter_map(|identifier| {
                built
                    .swap_remove(identifier)
                    .map(|component| (identifier.clone(), component))
            })
            .collect::<IndexMap<_, _>>();
        debug!(components = components.len(), "meta environment built");
        Ok(EagerMetaEnvironment { components })
    }

    pub(crate) fn empty() -> Self {
        EagerMetaEnvironment {
            components: IndexMap::new(),
        }
    }

    /// Every identifier in this environment, in declaration order.
    pub fn get_all_identifiers(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.components.keys()
    }

    pub(crate) fn component(&self, identifier: &Identifier) -> Option<&AnyArc> {
        self.components.get(identifier)
    }
}

impl EnvironmentCore for EagerMetaEnvironment {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        Ok(self.components.get(identifier).cloned())
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        let component = self
            .components
            .get(identifier)
            .ok_or_else(|| DiError::NotFound(identifier.clone()))?;
        Ok(Arc::new(StaticInjectorCore {
            identifier: identifier.clone(),
            component: Arc::clone(component),
        }))
    }
}

impl std::fmt::Debug for EagerMetaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EagerMetaEnvironment")
            .field("components", &self.components.len())
            .finish()
    }
}

/// Build-time view of an eager environment.
struct EagerBuilder<'d> {
    declarations: &'d Declarations,
    built: Mutex<IndexMap<Identifier, AnyArc>>,
    stack: ConstructionStack,
}

impl EagerBuilder<'_> {
    fn ensure_built(&self, identifier: &Identifier) -> DiResult<AnyArc> {
        if let Some(component) = self.built.lock().get(identifier) {
            return Ok(Arc::clone(component));
        }
        let declaration = self
            .declarations
            .get(identifier)
            .ok_or_else(|| DiError::NotFound(identifier.clone()))?;

        let component = {
            let _guard = self.stack.enter(identifier)?;
            trace!(%identifier, "running supplier");
            declaration
                .supply(&InjectionScope::new(self))
                .map_err(|error| match error {
                    // Keep cycle reports flat so the path stays readable.
                    DiError::Circular(_) | DiError::DepthExceeded(_) => error,
                    error => DiError::construction(identifier, error),
                })?
        };

        self.built
            .lock()
            .insert(identifier.clone(), Arc::clone(&component));
        Ok(component)
    }
}

impl EnvironmentCore for EagerBuilder<'_> {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        Ok(self.built.lock().get(identifier).cloned())
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        let component = self.ensure_built(identifier)?;
        Ok(Arc::new(StaticInjectorCore {
            identifier: identifier.clone(),
            component,
        }))
    }
}

/// Injector backend holding an already built component.
struct StaticInjectorCore {
    identifier: Identifier,
    component: AnyArc,
}

impl InjectorCore for StaticInjectorCore {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn fetch(&self) -> DiResult<AnyArc> {
        Ok(Arc::clone(&self.component))
    }
}
