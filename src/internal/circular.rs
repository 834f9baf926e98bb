//! Re-entrancy detection for eager, recursive construction.

use crate::error::{DiError, DiResult};
use crate::identifier::Identifier;
use crate::internal::sync::Mutex;

/// Maximum nesting of eager constructions before giving up.
///
/// Each level costs several stack frames (supplier, scope, injector lookup),
/// so this stays well below what a default 2 MiB thread stack can hold.
pub const MAX_CONSTRUCTION_DEPTH: usize = 256;

/// Identifiers currently being constructed, outermost first.
#[derive(Default)]
pub(crate) struct ConstructionStack {
    stack: Mutex<Vec<Identifier>>,
}

impl ConstructionStack {
    /// Pushes `identifier`, failing if it is already being constructed.
    ///
    /// The returned guard pops it again when dropped.
    pub(crate) fn enter(&self, identifier: &Identifier) -> DiResult<StackGuard<'_>> {
        let mut stack = self.stack.lock();

        // Circular detection before pushing
        if let Some(start) = stack.iter().position(|entry| entry == identifier) {
            let mut path = stack[start..].to_vec();
            path.push(identifier.clone());
            return Err(DiError::Circular(path));
        }

        if stack.len() >= MAX_CONSTRUCTION_DEPTH {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        stack.push(identifier.clone());
        Ok(StackGuard { owner: self })
    }
}

/// Pops the top of a [`ConstructionStack`] on drop.
pub(crate) struct StackGuard<'s> {
    owner: &'s ConstructionStack,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.owner.stack.lock().pop();
    }
}
