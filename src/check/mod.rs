//! Static checks over declared dependency graphs.
//!
//! Checks build an instrumented environment from a list of [`Module`]s and
//! inspect which identifiers each supplier injects, without building any
//! real component graph. Each check rebuilds its own environment.
//!
//! ```rust
//! use ferrous_inject::check::{complete, no_cycle, safe_injection, CheckSuite};
//! use ferrous_inject::{DiResult, Injector, Module};
//!
//! struct Repository;
//! struct Service {
//!     repository: Injector<Repository>,
//! }
//!
//! fn checks() -> DiResult<()> {
//!     let module = Module::builder("app")
//!         .put(|scope| Ok(Service { repository: scope.inject()? }))
//!         .put(|_| Ok(Repository))
//!         .build();
//!
//!     CheckSuite::new()
//!         .modules([module])
//!         .with(complete())
//!         .with(no_cycle())
//!         .with(safe_injection())
//!         .run()
//! }
//! checks().unwrap();
//! ```

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::declaration::{Declarations, DeclarationsBuilder};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;

pub mod complete;
pub mod graph;
pub mod no_cycle;
pub mod no_unused;
pub mod safe_injection;
pub mod tracking;

pub use complete::{complete, CompleteCheck};
pub use graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind};
pub use no_cycle::{no_cycle, NoCycleCheck};
pub use no_unused::{no_unused, NoUnusedCheck};
pub use safe_injection::{safe_injection, SafeInjectionCheck};
pub use tracking::DependencyTrackingEnvironment;

/// A check that can be run over a list of modules.
pub trait IndividualCheck: Send + Sync {
    /// Short name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Runs the check. Check violations are returned as [`DiError::Check`](crate::DiError::Check).
    fn check(&self, modules: &[Module]) -> DiResult<()>;
}

/// Merges modules into one set of declarations, rejecting duplicates.
pub(crate) fn declarations_of(modules: &[Module]) -> DiResult<Declarations> {
    let mut builder = DeclarationsBuilder::new();
    for module in modules {
        builder.put_module(module)?;
    }
    Ok(builder.build())
}

/// A set of modules and the checks to run on them.
///
/// Checks run in the order they were added and stop at the first failure.
#[derive(Default)]
pub struct CheckSuite {
    modules: Vec<Module>,
    checks: Vec<Box<dyn IndividualCheck>>,
}

impl CheckSuite {
    /// Creates an empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds modules to check.
    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Adds a check.
    pub fn with(mut self, check: impl IndividualCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Runs every check. Fails with [`CheckFailure::NoChecks`] if none were added.
    pub fn run(&self) -> DiResult<()> {
        if self.checks.is_empty() {
            return Err(CheckFailure::NoChecks.into());
        }
        for check in &self.checks {
            debug!(check = check.name(), modules = self.modules.len(), "running check");
            check.check(&self.modules)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CheckSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckSuite")
            .field("modules", &self.modules.iter().map(Module::name).collect::<Vec<_>>())
            .field("checks", &self.checks.iter().map(|c| c.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// A violated check, with everything needed to locate the faulty declarations.
///
/// `Display` renders the full human-readable report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// Injected identifiers that are not declared, each with the declarations requesting it
    Incomplete {
        /// Missing identifier to requesters, in discovery order
        missing: IndexMap<Identifier, Vec<Identifier>>,
    },
    /// A dependency cycle, first and last entries being the same identifier
    Cycle {
        /// The cycle, in injection order
        trace: Vec<Identifier>,
    },
    /// Declarations that nothing injects
    Unused {
        /// The unused identifiers, in declaration order
        unused: Vec<Identifier>,
    },
    /// A supplier read an injector while its component was being built
    UnsafeInjection {
        /// The component being built
        constructing: Identifier,
        /// The component that was read
        target: Identifier,
    },
    /// A check suite was run without any check
    NoChecks,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Incomplete { missing } => {
                f.write_str("'complete' check failed.\n")?;
                f.write_str(
                    "Some dependencies were not found. Make sure they are present within your module definitions.",
                )?;
                for (dependency, requesters) in missing {
                    write!(f, "\n--> {} not found\n    Requested by:", dependency)?;
                    for requester in requesters {
                        write!(f, "\n    --> {}", requester)?;
                    }
                }
                Ok(())
            }
            CheckFailure::Cycle { trace } => {
                f.write_str("'noCycle' check failed.\nCyclic dependency found:\n")?;
                for (index, identifier) in trace.iter().enumerate() {
                    if index == 0 {
                        writeln!(f, "    {}", identifier)?;
                    } else {
                        writeln!(f, "--> {}", identifier)?;
                    }
                }
                f.write_str("Note: --> represents an injection (i.e. A --> B means 'A depends on B').")
            }
            CheckFailure::Unused { unused } => {
                f.write_str("'noUnused' check failed.\n")?;
                if unused.len() == 1 {
                    f.write_str("The following component is not injected anywhere, making it unused.\n")?;
                } else {
                    f.write_str("The following components are not injected anywhere, making them unused.\n")?;
                }
                for identifier in unused {
                    writeln!(f, "--> {}", identifier)?;
                }
                f.write_str(
                    "\nIf some or all of the components mentioned above are still used outside of injections \
                     (e.g. via a 'get' call on the environment), you can exclude them from this rule with \
                     NoUnusedCheck::exclude.",
                )
            }
            CheckFailure::UnsafeInjection { constructing, target } => {
                f.write_str("'safeInjection' check failed.\n")?;
                writeln!(f, "The following injection is done during the instantiation of {}:", constructing)?;
                writeln!(f, "    {}", constructing)?;
                writeln!(f, "--> {}", target)?;
                f.write_str("\nYou *must not* actually perform injections during the instantiation of objects.\n")?;
                f.write_str(
                    "If you need to do something on an object provided by an environment before storing it \
                     as a property, use 'wrap_in' instead.",
                )
            }
            CheckFailure::NoChecks => f.write_str(
                "CheckSuite run without any check, which checks nothing.\n\
                 --> Add checks with CheckSuite::with (for example 'with(complete())')\n\
                 --> If you do not want to run any checks, remove the check suite entirely.",
            ),
        }
    }
}

impl std::error::Error for CheckFailure {}
