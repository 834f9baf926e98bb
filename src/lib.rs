//! # ferrous-inject
//!
//! Lazy, cycle-tolerant dependency injection environments for Rust, with
//! eager meta-environments for infrastructure components and static checks
//! over declared dependency graphs.
//!
//! ## Features
//!
//! - **Lazy injection**: suppliers receive injectors, resolved and memoized on first read
//! - **Cycle tolerance**: components may inject each other, or themselves
//! - **Qualifiers**: several components of one type, told apart by named, composite or custom qualifiers
//! - **Trait objects**: `dyn Trait` components share the same resolution path as concrete types
//! - **Meta-environments**: eagerly built infrastructure components and declarations processors
//! - **Graph checks**: completeness, cycles, unused components and unsafe injections, without building the graph
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, Injector, MixedEnvironment};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Injector<Database>,
//! }
//!
//! impl UserService {
//!     fn backend(&self) -> DiResult<String> {
//!         Ok(self.db.get()?.url.clone())
//!     }
//! }
//!
//! fn main() -> DiResult<()> {
//!     let mut builder = DeclarationsBuilder::new();
//!     builder
//!         .put(|scope| Ok(UserService { db: scope.inject()? }))?
//!         .put(|_| Ok(Database { url: "postgres://localhost".to_string() }))?;
//!
//!     let env = MixedEnvironment::build(builder.build())?;
//!     let users = env.get::<UserService>()?;
//!     assert_eq!(users.backend()?, "postgres://localhost");
//!     Ok(())
//! }
//! ```
//!
//! ## Environments
//!
//! - [`MixedEnvironment`]: every supplier runs once at build time; injections resolve lazily
//! - [`EagerMetaEnvironment`]: injections build their target immediately; cycles are rejected
//! - [`ExtensibleEnvironment`]: a mixed environment plus a meta-environment and declarations processors
//! - [`MutableEnvironment`]: components can be added after the build; injections are re-read on every access
//!
//! ## Trait Objects
//!
//! ```rust
//! use std::sync::Arc;
//! use ferrous_inject::{DeclarationsBuilder, DiResult, Environment, MixedEnvironment, Qualifier};
//!
//! trait Logger: Send + Sync {
//!     fn prefix(&self) -> &str;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn prefix(&self) -> &str {
//!         "[console]"
//!     }
//! }
//!
//! fn main() -> DiResult<()> {
//!     let mut builder = DeclarationsBuilder::new();
//!     builder.put_shared::<dyn Logger, _>(Qualifier::Empty, |_| Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>))?;
//!
//!     let env = MixedEnvironment::build(builder.build())?;
//!     assert_eq!(env.get::<dyn Logger>()?.prefix(), "[console]");
//!     Ok(())
//! }
//! ```
//!
//! ## Checks
//!
//! See the [`check`] module.

// Module declarations
pub mod check;
pub mod declaration;
pub mod environment;
pub mod error;
pub mod identifier;
pub mod injector;
pub mod module;
pub mod processor;
pub mod qualifier;
pub mod scope;
pub mod testing;

mod internal;

// Re-exports
pub use check::{CheckFailure, CheckSuite, DependencyTrackingEnvironment, IndividualCheck};
pub use declaration::{
    AnyArc, Declaration, Declarations, DeclarationsBuilder, ExtensibleContext, ExtensibleContextBuilder,
};
pub use environment::{
    EagerMetaEnvironment, Environment, EnvironmentCore, EnvironmentRef, ExtensibleEnvironment,
    MixedEnvironment, MutableEnvironment,
};
pub use error::{DiError, DiResult};
pub use identifier::Identifier;
pub use injector::{InjectionHook, Injector, InjectorCore, OptionalInjector, WrappedInjector};
pub use internal::MAX_CONSTRUCTION_DEPTH;
pub use module::{Module, ModuleBuilder};
pub use processor::DeclarationsProcessor;
pub use qualifier::{named, CompositeQualifier, CustomQualifier, Qualifier};
pub use scope::{InjectionScope, MetaScope};
