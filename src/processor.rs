//! Meta-environment components that inspect the main declarations.

use crate::declaration::Declarations;

/// A meta-environment component that wants to see every main-environment
/// declaration while the extensible environment is being built.
///
/// Processors are declared with [`Declaration::processor`] or
/// [`DeclarationsBuilder::put_processor`]. Each one is called exactly once, in
/// meta-declaration order, after the meta-environment is built and before
/// any main component is created. Processors typically index declarations
/// by tag and keep that index behind interior mutability.
///
/// [`Declaration::processor`]: crate::Declaration::processor
/// [`DeclarationsBuilder::put_processor`]: crate::DeclarationsBuilder::put_processor
///
/// # Examples
///
/// ```rust
/// use std::sync::Mutex;
/// use ferrous_inject::{Declarations, DeclarationsProcessor, Identifier};
///
/// struct Service;
///
/// #[derive(Default)]
/// struct ServiceIndex {
///     services: Mutex<Vec<Identifier>>,
/// }
///
/// impl DeclarationsProcessor for ServiceIndex {
///     fn process_declarations(&self, declarations: &Declarations) {
///         let mut services = self.services.lock().unwrap();
///         services.extend(
///             declarations
///                 .iter()
///                 .filter(|declaration| declaration.has_tag::<Service>())
///                 .map(|declaration| declaration.identifier().clone()),
///         );
///     }
/// }
/// ```
pub trait DeclarationsProcessor: Send + Sync + 'static {
    /// Receives all main-environment declarations.
    fn process_declarations(&self, declarations: &Declarations);
}
