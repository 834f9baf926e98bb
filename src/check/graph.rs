//! Dependency graph export for visualization and debugging.

use std::fmt::Write as _;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::check::no_cycle::find_cycle;
use crate::check::tracking::DependencyTrackingEnvironment;
use crate::check::declarations_of;
use crate::declaration::Declarations;
use crate::error::DiResult;
use crate::identifier::Identifier;
use crate::module::Module;

/// A node of the graph: one identifier, declared or only injected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyNode {
    /// Identifier as displayed in check reports
    pub id: String,
    /// Full type name
    pub type_name: String,
    /// Qualifier as displayed in check reports
    pub qualifier: String,
    /// False for identifiers that are injected but never declared
    pub declared: bool,
    /// Number of tags attached to the declaration
    pub tags: usize,
}

/// Kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub enum EdgeKind {
    /// Injection from the same environment
    Injection,
    /// Injection from the meta-environment
    Meta,
}

/// An edge of the graph: `from` injects `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyEdge {
    /// Node id of the injecting component
    pub from: String,
    /// Node id of the injected component
    pub to: String,
    /// Where the injected component lives
    pub kind: EdgeKind,
}

/// The injection graph of a set of declarations.
///
/// Built from the same tracking environment the checks use, so building it
/// runs every supplier once.
///
/// ```rust
/// use ferrous_inject::check::DependencyGraph;
/// use ferrous_inject::{DiResult, Injector, Module};
///
/// struct Repository;
/// struct Service {
///     repository: Injector<Repository>,
/// }
///
/// fn graph() -> DiResult<()> {
///     let module = Module::builder("app")
///         .put(|scope| Ok(Service { repository: scope.inject()? }))
///         .build();
///     let graph = DependencyGraph::from_modules(&[module])?;
///
///     assert_eq!(graph.nodes.len(), 2);
///     assert!(!graph.nodes[1].declared);
///     assert_eq!(graph.edges.len(), 1);
///     assert!(graph.to_dot().contains("->"));
///     Ok(())
/// }
/// graph().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    /// Declared identifiers first, in declaration order, then undeclared targets
    pub nodes: Vec<DependencyNode>,
    /// Edges, in declaration then request order
    pub edges: Vec<DependencyEdge>,
    /// Whether the injection edges contain a cycle
    pub has_cycle: bool,
}

impl DependencyGraph {
    /// Tracks the declarations of `modules` and builds their graph.
    pub fn from_modules(modules: &[Module]) -> DiResult<Self> {
        let declarations = declarations_of(modules)?;
        let tracking = DependencyTrackingEnvironment::build(&declarations)?;
        Ok(Self::from_tracking(&declarations, &tracking))
    }

    /// Builds the graph from an already tracked set of declarations.
    pub fn from_tracking(declarations: &Declarations, tracking: &DependencyTrackingEnvironment) -> Self {
        let mut graph = DependencyGraph::default();
        for declaration in declarations {
            graph.nodes.push(node(declaration.identifier(), true, declaration.tags().len()));
        }

        let dependencies = tracking.dependencies();
        for (from, targets) in dependencies {
            for to in targets {
                graph.push_edge(from, to, EdgeKind::Injection, declarations);
            }
            for to in tracking.meta_dependencies().get(from).into_iter().flatten() {
                graph.push_edge(from, to, EdgeKind::Meta, declarations);
            }
        }

        graph.has_cycle = find_cycle(dependencies).is_some();
        graph
    }

    fn push_edge(&mut self, from: &Identifier, to: &Identifier, kind: EdgeKind, declarations: &Declarations) {
        let to_id = to.to_string();
        // Meta targets live in another namespace and are not nodes here.
        if kind == EdgeKind::Injection
            && !declarations.contains(to)
            && !self.nodes.iter().any(|node| node.id == to_id)
        {
            self.nodes.push(node(to, false, 0));
        }
        self.edges.push(DependencyEdge {
            from: from.to_string(),
            to: to_id,
            kind,
        });
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph dependencies {\n");
        for node in &self.nodes {
            let style = if node.declared { "solid" } else { "dashed" };
            let _ = writeln!(dot, "    \"{}\" [style={}];", escape(&node.id), style);
        }
        for edge in &self.edges {
            let style = match edge.kind {
                EdgeKind::Injection => "solid",
                EdgeKind::Meta => "dotted",
            };
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\" [style={}];",
                escape(&edge.from),
                escape(&edge.to),
                style
            );
        }
        dot.push('}');
        dot
    }

    /// Serializes the graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> DiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::DiError::Internal(format!("JSON serialization failed: {}", e)))
    }
}

fn node(identifier: &Identifier, declared: bool, tags: usize) -> DependencyNode {
    DependencyNode {
        id: identifier.to_string(),
        type_name: identifier.type_name().to_string(),
        qualifier: identifier.qualifier().to_string(),
        declared,
        tags,
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
