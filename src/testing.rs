//! Subject-based test harness over [`MutableEnvironment`].
//!
//! A [`SubjectTest`] holds a base module containing the component under
//! test (the *subject*) and possibly some of its dependencies. Each call to
//! [`test`](SubjectTest::test) builds a fresh environment from that module,
//! so replacements made with `put` in one test never leak into another.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

use crate::declaration::DeclarationsBuilder;
use crate::environment::{Environment, MutableEnvironment};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;
use crate::qualifier::Qualifier;
use crate::scope::InjectionScope;

/// Runs test bodies against fresh environments built around one subject.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use ferrous_inject::testing::SubjectTest;
/// use ferrous_inject::{DiResult, Injector, Qualifier};
///
/// trait Greeting: Send + Sync {
///     fn text(&self) -> String;
/// }
///
/// struct Page {
///     greeting: Injector<dyn Greeting>,
/// }
///
/// impl Page {
///     fn render(&self) -> DiResult<String> {
///         Ok(format!("<p>{}</p>", self.greeting.get()?.text()))
///     }
/// }
///
/// struct Hello;
/// impl Greeting for Hello {
///     fn text(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// fn render_test() -> DiResult<()> {
///     let harness = SubjectTest::<Page>::single(|scope| Ok(Page { greeting: scope.inject()? }));
///     harness.test(|env| -> DiResult<()> {
///         env.put_shared::<dyn Greeting, _>(Qualifier::Empty, |_| Ok(Arc::new(Hello) as Arc<dyn Greeting>))?;
///         assert_eq!(env.subject()?.render()?, "<p>hello</p>");
///         Ok(())
///     })?
/// }
/// render_test().unwrap();
/// ```
pub struct SubjectTest<S: ?Sized> {
    subject: Identifier,
    base: Module,
    _subject: PhantomData<fn() -> Arc<S>>,
}

impl<S: ?Sized + Send + Sync + 'static> SubjectTest<S> {
    /// Uses `base` as the base module. It must declare the unqualified `S`.
    pub fn new(base: Module) -> Self {
        Self::qualified(Qualifier::Empty, base)
    }

    /// Uses `base` as the base module, with the subject under `qualifier`.
    pub fn qualified(qualifier: impl Into<Qualifier>, base: Module) -> Self {
        SubjectTest {
            subject: Identifier::qualified::<S>(qualifier),
            base,
            _subject: PhantomData,
        }
    }

    /// Identifier the subject is looked up with.
    pub fn subject_identifier(&self) -> &Identifier {
        &self.subject
    }

    /// Builds a fresh environment from the base module and runs `body` in it.
    pub fn test<R>(&self, body: impl FnOnce(&SubjectEnvironment<S>) -> R) -> DiResult<R> {
        self.test_with(|_| Ok(()), body)
    }

    /// Like [`test`](Self::test), with extra declarations added to the base
    /// module before the environment is built.
    ///
    /// Declarations that clash with the base module are rejected; replace
    /// components with `put` inside `body` instead.
    pub fn test_with<R>(
        &self,
        additional: impl FnOnce(&mut DeclarationsBuilder) -> DiResult<()>,
        body: impl FnOnce(&SubjectEnvironment<S>) -> R,
    ) -> DiResult<R> {
        let mut builder = DeclarationsBuilder::new();
        builder.put_module(&self.base)?;
        additional(&mut builder)?;

        trace!(subject = %self.subject, module = self.base.name(), "building test environment");
        let env = SubjectEnvironment {
            env: MutableEnvironment::build(builder.build())?,
            subject: self.subject.clone(),
            _subject: PhantomData,
        };
        Ok(body(&env))
    }
}

impl<S: Send + Sync + 'static> SubjectTest<S> {
    /// Shortcut for a base module holding only the subject's supplier.
    pub fn single<F>(supplier: F) -> Self
    where
        F: Fn(&InjectionScope<'_>) -> DiResult<S> + Send + Sync + 'static,
    {
        Self::new(Module::builder("<base test module>").put(supplier).build())
    }
}

impl<S: ?Sized> std::fmt::Debug for SubjectTest<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectTest")
            .field("subject", &self.subject)
            .field("base", &self.base.name())
            .finish()
    }
}

/// Mutable environment handed to a test body, with access to the subject.
///
/// Dereferences to [`MutableEnvironment`], so `put*` and `get*` are
/// available directly.
pub struct SubjectEnvironment<S: ?Sized> {
    env: MutableEnvironment,
    subject: Identifier,
    _subject: PhantomData<fn() -> Arc<S>>,
}

impl<S: ?Sized + Send + Sync + 'static> SubjectEnvironment<S> {
    /// The subject of this test, as currently stored in the environment.
    pub fn subject(&self) -> DiResult<Arc<S>> {
        self.env.get_identifier::<S>(&self.subject)
    }
}

impl<S: ?Sized> Deref for SubjectEnvironment<S> {
    type Target = MutableEnvironment;

    fn deref(&self) -> &MutableEnvironment {
        &self.env
    }
}
