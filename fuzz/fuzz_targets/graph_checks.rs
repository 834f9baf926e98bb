#![no_main]

use ferrous_inject::check::{complete, no_cycle, no_unused, safe_injection, CheckFailure, IndividualCheck};
use ferrous_inject::{DeclarationsBuilder, DiError, Environment, Injector, MixedEnvironment, Module};
use libfuzzer_sys::fuzz_target;

const NODES: usize = 8;

struct Node {
    targets: Vec<Injector<Node>>,
}

fn node_id(index: usize) -> String {
    format!("n{}", index)
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte: which nodes are declared. Following bytes: edges (from, to),
    // targets may be undeclared.
    let declared = data[0];
    let edges: Vec<(usize, usize)> = data[1..]
        .chunks_exact(2)
        .take(32)
        .map(|pair| (pair[0] as usize % NODES, pair[1] as usize % NODES))
        .collect();

    let mut builder = Module::builder("fuzz");
    for index in (0..NODES).filter(|index| declared & (1 << index) != 0) {
        let targets: Vec<usize> = edges.iter().filter(|(from, _)| *from == index).map(|(_, to)| *to).collect();
        builder = builder.put_named(node_id(index), move |scope| {
            let targets = targets
                .iter()
                .map(|to| scope.inject_named::<Node>(node_id(*to)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node { targets })
        });
    }
    let modules = [builder.build()];

    // Lazy injections never read during construction.
    assert!(safe_injection().check(&modules).is_ok());
    let _ = complete().check(&modules);
    let _ = no_unused().check(&modules);

    match no_cycle().check(&modules) {
        Ok(()) => {}
        Err(DiError::Check(CheckFailure::Cycle { trace })) => {
            assert!(trace.len() >= 2);
            assert_eq!(trace.first(), trace.last());
        }
        Err(other) => panic!("unexpected error {}", other),
    }

    // The mixed environment tolerates every shape, missing targets fail on read only.
    let mut declarations = DeclarationsBuilder::new();
    declarations.put_module(&modules[0]).expect("module has distinct identifiers");
    let env = MixedEnvironment::build(declarations.build()).expect("lazy graph always builds");
    for index in 0..NODES {
        let Some(node) = env.get_or_null_named::<Node>(node_id(index)).expect("well-typed lookup") else {
            continue;
        };
        for target in &node.targets {
            let declared = env.get_or_null_identifier::<Node>(target.identifier()).expect("well-typed lookup");
            match target.get() {
                Ok(component) => assert!(declared.is_some_and(|expected| std::sync::Arc::ptr_eq(&expected, &component))),
                Err(error) => assert!(error.is_not_found() && declared.is_none()),
            }
        }
    }
});
