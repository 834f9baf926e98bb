//! Cycle check: no component may depend on itself, directly or not.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::check::tracking::DependencyTrackingEnvironment;
use crate::check::{declarations_of, CheckFailure, IndividualCheck};
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;

/// Checks that the injection graph has no cycle.
///
/// The mixed environment handles cycles fine as long as injectors are not
/// read during construction, but they usually point at a design problem.
/// Undeclared targets are ignored here; use [`complete`](crate::check::complete)
/// to catch those.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCycleCheck;

/// Creates a [`NoCycleCheck`].
pub fn no_cycle() -> NoCycleCheck {
    NoCycleCheck
}

impl IndividualCheck for NoCycleCheck {
    fn name(&self) -> &'static str {
        "noCycle"
    }

    fn check(&self, modules: &[Module]) -> DiResult<()> {
        let env = DependencyTrackingEnvironment::build(&declarations_of(modules)?)?;
        match find_cycle(env.dependencies()) {
            Some(trace) => Err(CheckFailure::Cycle { trace }.into()),
            None => Ok(()),
        }
    }
}

/// Depth-first search for a cycle, starting from every node in order.
///
/// Traversed edges are remembered across roots so shared subgraphs are only
/// explored once. Returns the cycle with its first node repeated at the end.
pub(crate) fn find_cycle(graph: &IndexMap<Identifier, Vec<Identifier>>) -> Option<Vec<Identifier>> {
    let mut visited = HashSet::new();
    let mut trace = Vec::new();
    graph
        .keys()
        .find_map(|root| visit(graph, root, &mut trace, &mut visited))
}

fn visit<'g>(
    graph: &'g IndexMap<Identifier, Vec<Identifier>>,
    from: &'g Identifier,
    trace: &mut Vec<&'g Identifier>,
    visited: &mut HashSet<(&'g Identifier, &'g Identifier)>,
) -> Option<Vec<Identifier>> {
    if let Some(start) = trace.iter().position(|entry| *entry == from) {
        let mut cycle: Vec<Identifier> = trace[start..].iter().map(|entry| (*entry).clone()).collect();
        cycle.push(from.clone());
        return Some(cycle);
    }

    trace.push(from);
    for to in graph.get(from).into_iter().flatten() {
        if visited.insert((from, to)) {
            if let Some(cycle) = visit(graph, to, trace, visited) {
                return Some(cycle);
            }
        }
    }
    trace.pop();
    None
}
