//! Mixed environment: eager creation, lazy injection.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::declaration::{AnyArc, Declarations};
use crate::environment::meta::EagerMetaEnvironment;
use crate::environment::EnvironmentCore;
use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::injector::InjectorCore;
use crate::scope::InjectionScope;

/// Component map, filled exactly once when every supplier has run.
#[derive(Default)]
struct ComponentStore {
    components: OnceCell<IndexMap<Identifier, AnyArc>>,
}

impl ComponentStore {
    fn lookup(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        let components = self
            .components
            .get()
            .ok_or_else(|| DiError::EnvironmentNotReady(identifier.clone()))?;
        Ok(components.get(identifier).cloned())
    }
}

/// The default environment.
///
/// Building runs every supplier exactly once, in declaration order.
/// Injection requests made by suppliers only create lazy injectors; the
/// target is looked up on the injector's first read, once all components
/// exist. This is what lets components depend on each other cyclically,
/// including on themselves, as long as no injector is read during
/// construction.
///
/// Missing components surface on first read as [`DiError::NotFound`].
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, Injector, MixedEnvironment};
///
/// struct Node {
///     myself: Injector<Node>,
/// }
///
/// fn self_reference() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder.put(|scope| Ok(Node { myself: scope.inject()? }))?;
///     let env = MixedEnvironment::build(builder.build())?;
///
///     let node = env.get::<Node>()?;
///     assert!(std::sync::Arc::ptr_eq(&node, &node.myself.get()?));
///     Ok(())
/// }
/// self_reference().unwrap();
/// ```
pub struct MixedEnvironment {
    store: Arc<ComponentStore>,
    meta: Option<Arc<EagerMetaEnvironment>>,
}

impl MixedEnvironment {
    /// Builds the environment, running every supplier.
    pub fn build(declarations: Declarations) -> DiResult<Self> {
        Self::build_with_meta(&declarations, None)
    }

    /// Builds the environment with `meta` answering meta injections.
    pub(crate) fn build_with_meta(
        declarations: &Declarations,
        meta: Option<Arc<EagerMetaEnvironment>>,
    ) -> DiResult<Self> {
        let env = MixedEnvironment {
            store: Arc::new(ComponentStore::default()),
            meta,
        };

        let scope = InjectionScope::new(&env);
        let mut components = IndexMap::with_capacity(declarations.len());
        for declaration in declarations {
            let identifier = declaration.identifier();
            trace!(%identifier, "running supplier");
            let component = declaration
                .supply(&scope)
                .map_err(|error| DiError::construction(identifier, error))?;
            components.insert(identifier.clone(), component);
        }

        let count = components.len();
        env.store
            .components
            .set(components)
            .map_err(|_| DiError::Internal("mixed environment was filled twice".to_string()))?;
        debug!(components = count, extensible = env.meta.is_some(), "mixed environment built");
        Ok(env)
    }

    /// An environment with no components, used as a placeholder.
    pub(crate) fn empty() -> Self {
        let store = ComponentStore::default();
        // A fresh cell cannot already be set.
        let _ = store.components.set(IndexMap::new());
        MixedEnvironment {
            store: Arc::new(store),
            meta: None,
        }
    }

    /// Every identifier in this environment, in declaration order.
    pub fn get_all_identifiers(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.store
            .components
            .get()
            .into_iter()
            .flat_map(|components| components.keys())
    }
}

impl EnvironmentCore for MixedEnvironment {
    fn get_erased(&self, identifier: &Identifier) -> DiResult<Option<AnyArc>> {
        self.store.lookup(identifier)
    }

    fn injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        Ok(Arc::new(LazyInjectorCore {
            identifier: identifier.clone(),
            store: Arc::downgrade(&self.store),
        }))
    }

    fn meta_injector_core(&self, identifier: &Identifier) -> DiResult<Arc<dyn InjectorCore>> {
        match &self.meta {
            Some(meta) => meta.injector_core(identifier),
            None => Err(DiError::NotExtensible),
        }
    }
}

impl std::fmt::Debug for MixedEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixedEnvironment")
            .field("components", &self.get_all_identifiers().count())
            .field("extensible", &self.meta.is_some())
            .finish()
    }
}

/// Reads the component map on demand.
struct LazyInjectorCore {
    identifier: Identifier,
    store: Weak<ComponentStore>,
}

impl InjectorCore for LazyInjectorCore {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn fetch(&self) -> DiResult<AnyArc> {
        let store = self
            .store
            .upgrade()
            .ok_or_else(|| DiError::EnvironmentDropped(self.identifier.clone()))?;
        trace!(identifier = %self.identifier, "resolving injection");
        store
            .lookup(&self.identifier)?
            .ok_or_else(|| DiError::NotFound(self.identifier.clone()))
    }
}
