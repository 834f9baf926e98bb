//! Component declarations and the builder that collects them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::map::Values;
use indexmap::IndexMap;

use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::module::Module;
use crate::processor::DeclarationsProcessor;
use crate::qualifier::Qualifier;
use crate::scope::InjectionScope;

/// Type-erased component as stored by environments.
///
/// Always wraps an `Arc<T>` (so `Arc<Arc<T>>` behind `dyn Any`), which lets
/// sized types and trait objects share a single resolution path.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Supplier =
    Arc<dyn for<'a> Fn(&InjectionScope<'a>) -> DiResult<AnyArc> + Send + Sync>;

type ProcessorCast = fn(&AnyArc) -> Option<Arc<dyn DeclarationsProcessor>>;

/// Recovers an `Arc<T>` from a stored component.
pub(crate) fn downcast_component<T: ?Sized + Send + Sync + 'static>(
    identifier: &Identifier,
    component: &AnyArc,
) -> DiResult<Arc<T>> {
    (**component)
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| DiError::TypeMismatch(identifier.clone()))
}

fn supplier<F>(supplier: F) -> Supplier
where
    F: for<'a> Fn(&InjectionScope<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(supplier)
}

fn erase<T: ?Sized + Send + Sync + 'static>(component: Arc<T>) -> AnyArc {
    Arc::new(component)
}

fn cast_processor<T: DeclarationsProcessor>(component: &AnyArc) -> Option<Arc<dyn DeclarationsProcessor>> {
    (**component)
        .downcast_ref::<Arc<T>>()
        .map(|processor| Arc::clone(processor) as Arc<dyn DeclarationsProcessor>)
}

/// An identifier bound to the supplier that creates its component.
///
/// Declarations are immutable once built. The supplier receives an
/// [`InjectionScope`] through which it requests the injectors it needs.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Declaration, Identifier, Qualifier};
///
/// struct Config {
///     port: u16,
/// }
///
/// let declaration = Declaration::new::<Config, _>(Qualifier::Empty, |_| Ok(Config { port: 8080 }))
///     .with_tag("infrastructure");
///
/// assert_eq!(declaration.identifier(), &Identifier::of::<Config>());
/// assert!(declaration.has_tag::<&'static str>());
/// ```
#[derive(Clone)]
pub struct Declaration {
    identifier: Identifier,
    supplier: Supplier,
    tags: Vec<Arc<dyn Any + Send + Sync>>,
    processor: Option<ProcessorCast>,
}

impl Declaration {
    /// Declares a component of type `T` produced by `supplier`.
    pub fn new<T, F>(qualifier: impl Into<Qualifier>, supplier: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::from_supplier(
            Identifier::qualified::<T>(qualifier),
            self::supplier(move |scope| supplier(scope).map(|c| erase(Arc::new(c)))),
        )
    }

    /// Declares a component whose supplier already returns an `Arc<T>`.
    ///
    /// This is how trait objects are declared:
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use ferrous_inject::{Declaration, Identifier, Qualifier};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct Fixed;
    /// impl Clock for Fixed {
    ///     fn now(&self) -> u64 { 0 }
    /// }
    ///
    /// let declaration = Declaration::shared::<dyn Clock, _>(Qualifier::Empty, |_| {
    ///     Ok(Arc::new(Fixed) as Arc<dyn Clock>)
    /// });
    /// assert_eq!(declaration.identifier(), &Identifier::of::<dyn Clock>());
    /// ```
    pub fn shared<T, F>(qualifier: impl Into<Qualifier>, supplier: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        Self::from_supplier(
            Identifier::qualified::<T>(qualifier),
            self::supplier(move |scope| supplier(scope).map(erase)),
        )
    }

    /// Declares an existing value. Every environment built from this
    /// declaration shares the same instance.
    pub fn value<T>(qualifier: impl Into<Qualifier>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let value = Arc::new(value);
        Self::from_supplier(
            Identifier::qualified::<T>(qualifier),
            supplier(move |_| Ok(erase(Arc::clone(&value)))),
        )
    }

    /// Declares a component that also acts as a [`DeclarationsProcessor`].
    ///
    /// Only meaningful inside a meta-environment: the extensible environment
    /// hands the main declarations to every processor declared this way.
    pub fn processor<T, F>(qualifier: impl Into<Qualifier>, supplier: F) -> Self
    where
        T: DeclarationsProcessor,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let mut declaration = Self::new::<T, F>(qualifier, supplier);
        declaration.processor = Some(cast_processor::<T>);
        declaration
    }

    fn from_supplier(identifier: Identifier, supplier: Supplier) -> Self {
        Declaration {
            identifier,
            supplier,
            tags: Vec::new(),
            processor: None,
        }
    }

    /// Attaches an arbitrary tag, visible to declarations processors.
    pub fn with_tag<G: Any + Send + Sync>(mut self, tag: G) -> Self {
        self.tags.push(Arc::new(tag));
        self
    }

    /// The identifier this declaration is stored under.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// All tags, in the order they were attached.
    pub fn tags(&self) -> &[Arc<dyn Any + Send + Sync>] {
        &self.tags
    }

    /// Returns true if a tag of type `G` is attached.
    pub fn has_tag<G: Any>(&self) -> bool {
        self.tags.iter().any(|tag| tag.is::<G>())
    }

    /// Iterates the tags of type `G`.
    pub fn tags_of<G: Any>(&self) -> impl Iterator<Item = &G> {
        self.tags.iter().filter_map(|tag| tag.downcast_ref::<G>())
    }

    /// Returns true if this declaration was made with [`Declaration::processor`].
    pub fn is_processor(&self) -> bool {
        self.processor.is_some()
    }

    /// Runs the supplier.
    pub(crate) fn supply(&self, scope: &InjectionScope<'_>) -> DiResult<AnyArc> {
        (self.supplier)(scope)
    }

    /// Views a component built from this declaration as a processor.
    pub(crate) fn as_processor(&self, component: &AnyArc) -> Option<Arc<dyn DeclarationsProcessor>> {
        self.processor.and_then(|cast| cast(component))
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("identifier", &self.identifier)
            .field("tags", &self.tags.len())
            .field("processor", &self.is_processor())
            .finish()
    }
}

/// Immutable, insertion-ordered set of declarations keyed by identifier.
///
/// Produced by [`DeclarationsBuilder::build`]; environments are built from it.
#[derive(Clone, Default, Debug)]
pub struct Declarations {
    map: IndexMap<Identifier, Declaration>,
}

impl Declarations {
    /// Looks up a declaration.
    pub fn get(&self, identifier: &Identifier) -> Option<&Declaration> {
        self.map.get(identifier)
    }

    /// Returns true if `identifier` is declared.
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.map.contains_key(identifier)
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Declared identifiers, in declaration order.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.map.keys()
    }

    /// Declarations, in declaration order.
    pub fn iter(&self) -> Values<'_, Identifier, Declaration> {
        self.map.values()
    }

    /// Inserts or replaces a declaration. Only used for the synthetic
    /// declarations environments add themselves.
    pub(crate) fn insert(&mut self, declaration: Declaration) {
        self.map.insert(declaration.identifier.clone(), declaration);
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a Declaration;
    type IntoIter = Values<'a, Identifier, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder collecting declarations.
///
/// Every `put*` method fails immediately with
/// [`DiError::DuplicateIdentifier`] if the identifier is already present, so
/// a duplicate can never silently overwrite an earlier declaration.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DeclarationsBuilder, DiError, DiResult};
///
/// struct Repository;
///
/// fn declarations() -> DiResult<()> {
///     let mut builder = DeclarationsBuilder::new();
///     builder
///         .put(|_| Ok(Repository))?
///         .put_named("backup", |_| Ok(Repository))?;
///
///     let duplicate = builder.put(|_| Ok(Repository));
///     assert!(matches!(duplicate, Err(DiError::DuplicateIdentifier(_))));
///
///     assert_eq!(builder.build().len(), 2);
///     Ok(())
/// }
/// declarations().unwrap();
/// ```
#[derive(Default)]
pub struct DeclarationsBuilder {
    declarations: Declarations,
}

impl DeclarationsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an unqualified component of type `T`.
    pub fn put<T, F>(&mut self, supplier: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::new::<T, F>(Qualifier::Empty, supplier))
    }

    /// Declares a component of type `T` with a named qualifier.
    pub fn put_named<T, F>(&mut self, name: impl Into<String>, supplier: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::new::<T, F>(Qualifier::Named(name.into()), supplier))
    }

    /// Declares a component of type `T` with an arbitrary qualifier.
    pub fn put_qualified<T, F>(&mut self, qualifier: impl Into<Qualifier>, supplier: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::new::<T, F>(qualifier, supplier))
    }

    /// Declares a component whose supplier returns an `Arc<T>`, typically a trait object.
    pub fn put_shared<T, F>(&mut self, qualifier: impl Into<Qualifier>, supplier: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&InjectionScope<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::shared::<T, F>(qualifier, supplier))
    }

    /// Declares an existing unqualified value.
    pub fn put_value<T>(&mut self, value: T) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
    {
        self.put_declaration(Declaration::value(Qualifier::Empty, value))
    }

    /// Declares an unqualified declarations processor.
    pub fn put_processor<T, F>(&mut self, supplier: F) -> DiResult<&mut Self>
    where
        T: DeclarationsProcessor,
        F: Fn(&InjectionScope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.put_declaration(Declaration::processor::<T, F>(Qualifier::Empty, supplier))
    }

    /// Adds a prepared declaration.
    pub fn put_declaration(&mut self, declaration: Declaration) -> DiResult<&mut Self> {
        if self.declarations.contains(declaration.identifier()) {
            return Err(DiError::DuplicateIdentifier(declaration.identifier().clone()));
        }
        self.declarations.insert(declaration);
        Ok(self)
    }

    /// Adds every declaration of `module`, in order.
    pub fn put_module(&mut self, module: &Module) -> DiResult<&mut Self> {
        for declaration in module.declarations() {
            self.put_declaration(declaration.clone())?;
        }
        Ok(self)
    }

    /// Freezes the collected declarations.
    pub fn build(self) -> Declarations {
        self.declarations
    }
}

/// Declarations for an extensible environment: the main ones and those of
/// its meta-environment. The two namespaces never merge.
#[derive(Clone, Default, Debug)]
pub struct ExtensibleContext {
    /// Declarations of the main environment
    pub declarations: Declarations,
    /// Declarations of the meta-environment
    pub meta_declarations: Declarations,
}

impl ExtensibleContext {
    /// Starts building a context.
    pub fn builder() -> ExtensibleContextBuilder {
        ExtensibleContextBuilder::default()
    }
}

/// Builder for [`ExtensibleContext`].
///
/// Dereferences to the [`DeclarationsBuilder`] of the main environment, so
/// all `put*` methods are available directly.
///
/// ```rust
/// use ferrous_inject::{DiResult, ExtensibleContext};
///
/// struct Service;
/// struct Registry;
///
/// fn context() -> DiResult<()> {
///     let mut builder = ExtensibleContext::builder();
///     builder.put(|_| Ok(Service))?;
///     builder.meta(|meta| {
///         meta.put(|_| Ok(Registry))?;
///         Ok(())
///     })?;
///
///     let context = builder.build();
///     assert_eq!(context.declarations.len(), 1);
///     assert_eq!(context.meta_declarations.len(), 1);
///     Ok(())
/// }
/// context().unwrap();
/// ```
#[derive(Default)]
pub struct ExtensibleContextBuilder {
    main: DeclarationsBuilder,
    meta: DeclarationsBuilder,
}

impl ExtensibleContextBuilder {
    /// Declares meta-environment components through `configure`.
    pub fn meta<F>(&mut self, configure: F) -> DiResult<&mut Self>
    where
        F: FnOnce(&mut DeclarationsBuilder) -> DiResult<()>,
    {
        configure(&mut self.meta)?;
        Ok(self)
    }

    /// Freezes both declaration sets.
    pub fn build(self) -> ExtensibleContext {
        ExtensibleContext {
            declarations: self.main.build(),
            meta_declarations: self.meta.build(),
        }
    }
}

impl std::ops::Deref for ExtensibleContextBuilder {
    type Target = DeclarationsBuilder;

    fn deref(&self) -> &DeclarationsBuilder {
        &self.main
    }
}

impl std::ops::DerefMut for ExtensibleContextBuilder {
    fn deref_mut(&mut self) -> &mut DeclarationsBuilder {
        &mut self.main
    }
}
