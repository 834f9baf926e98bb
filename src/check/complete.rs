//! Completeness check: every injected component must be declared.

use indexmap::IndexMap;

use crate::check::tracking::DependencyTrackingEnvironment;
use crate::check::{declarations_of, CheckFailure, IndividualCheck};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;

/// Checks that every injection can be resolved within the modules.
///
/// Missing dependencies are grouped by missing identifier, each listing the
/// declarations that request it. Almost every suite should include this
/// check: a missing dependency is nearly always a forgotten declaration or a
/// mistyped qualifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteCheck;

/// Creates a [`CompleteCheck`].
pub fn complete() -> CompleteCheck {
    CompleteCheck
}

impl IndividualCheck for CompleteCheck {
    fn name(&self) -> &'static str {
        "complete"
    }

    fn check(&self, modules: &[Module]) -> DiResult<()> {
        let env = DependencyTrackingEnvironment::build(&declarations_of(modules)?)?;
        let dependencies = env.dependencies();

        let mut missing: IndexMap<Identifier, Vec<Identifier>> = IndexMap::new();
        for (requester, targets) in dependencies {
            for target in targets.iter().filter(|target| !dependencies.contains_key(*target)) {
                missing.entry(target.clone()).or_default().push(requester.clone());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure::Incomplete { missing }.into())
        }
    }
}
