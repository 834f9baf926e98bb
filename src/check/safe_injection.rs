//! Safe-injection check: suppliers must not read injectors.

use std::panic::{self, AssertUnwindSafe};

use tracing::trace;

use crate::check::tracking::{ReadPolicy, Recorder};
use crate::check::{declarations_of, CheckFailure, IndividualCheck};
use crate::error::{DiError, DiResult};
use crate::module::Module;

/// Checks that no supplier reads an injected component while building its own.
///
/// Reading during construction forces the target to exist already, which
/// defeats the cycle tolerance of the mixed environment and breaks as soon
/// as declaration order changes. Store the injector and read it later, or
/// derive values lazily with [`Injector::wrap_in`](crate::Injector::wrap_in).
///
/// Reads are detected whether the supplier propagates the error with `?`,
/// panics through [`Injector::get_required`](crate::Injector::get_required),
/// or discards the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeInjectionCheck;

/// Creates a [`SafeInjectionCheck`].
pub fn safe_injection() -> SafeInjectionCheck {
    SafeInjectionCheck
}

impl IndividualCheck for SafeInjectionCheck {
    fn name(&self) -> &'static str {
        "safeInjection"
    }

    fn check(&self, modules: &[Module]) -> DiResult<()> {
        let declarations = declarations_of(modules)?;
        for declaration in &declarations {
            let identifier = declaration.identifier();
            trace!(%identifier, "checking for unsafe injections");
            let recorder = Recorder::new(identifier.clone(), ReadPolicy::Trap);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| recorder.run(declaration)));
            if let Some(target) = recorder.trapped() {
                return Err(CheckFailure::UnsafeInjection {
                    constructing: identifier.clone(),
                    target,
                }
                .into());
            }

            match outcome {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => return Err(DiError::construction(identifier, error)),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        Ok(())
    }
}
