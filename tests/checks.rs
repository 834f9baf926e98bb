/// Graph check tests
///
/// Every check runs over modules without building a real environment.
/// Reports are compared in full since they are meant to be read as-is.

use ferrous_inject::check::{
    complete, no_cycle, no_unused, safe_injection, CheckFailure, CheckSuite, DependencyGraph,
    DependencyTrackingEnvironment, EdgeKind, IndividualCheck, NoUnusedCheck,
};
use ferrous_inject::{DeclarationsBuilder, DiError, DiResult, Identifier, Injector, Module};

// ===== Test Components =====

struct A {
    _b: Injector<B>,
    _z: Injector<Z>,
}

struct B;

struct Z;

struct Y;

struct Other {
    _z: Injector<Z>,
    _y: Injector<Y>,
}

struct Ping {
    _pong: Injector<Pong>,
}

struct Pong {
    _ping: Injector<Ping>,
}

struct C1 {
    _next: Injector<C2>,
}
struct C2 {
    _next: Injector<C3>,
}
struct C3 {
    _next: Injector<C4>,
}
struct C4 {
    _next: Injector<C1>,
}

struct Selfish {
    _me: Injector<Selfish>,
}

struct Isolated;

struct Lonely;

struct Eager {
    _value: std::sync::Arc<B>,
}

struct Lazy {
    _b: Injector<B>,
}

fn id<T: 'static>() -> String {
    Identifier::of::<T>().to_string()
}

fn failure(result: DiResult<()>) -> CheckFailure {
    match result {
        Err(DiError::Check(failure)) => failure,
        Err(other) => panic!("expected a check failure, got {}", other),
        Ok(()) => panic!("expected the check to fail"),
    }
}

fn ring_module() -> Module {
    Module::builder("ring")
        .put(|scope| Ok(C1 { _next: scope.inject()? }))
        .put(|scope| Ok(C2 { _next: scope.inject()? }))
        .put(|scope| Ok(C3 { _next: scope.inject()? }))
        .put(|scope| Ok(C4 { _next: scope.inject()? }))
        .build()
}

// ===== complete =====

#[test]
fn complete_names_missing_dependency_and_requester() {
    let module = Module::builder("app")
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))
        .put(|_| Ok(B))
        .build();

    let failure = failure(complete().check(&[module]));
    assert_eq!(
        failure.to_string(),
        format!(
            "'complete' check failed.\n\
             Some dependencies were not found. Make sure they are present within your module definitions.\n\
             --> {} not found\n    Requested by:\n    --> {}",
            id::<Z>(),
            id::<A>()
        )
    );
}

#[test]
fn complete_groups_requesters_per_missing_dependency() {
    let app = Module::builder("app")
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))
        .put(|_| Ok(B))
        .build();
    let other = Module::builder("other")
        .put(|scope| Ok(Other { _z: scope.inject()?, _y: scope.inject()? }))
        .build();

    match failure(complete().check(&[app, other])) {
        CheckFailure::Incomplete { missing } => {
            let missing: Vec<(Identifier, Vec<Identifier>)> = missing.into_iter().collect();
            assert_eq!(
                missing,
                vec![
                    (Identifier::of::<Z>(), vec![Identifier::of::<A>(), Identifier::of::<Other>()]),
                    (Identifier::of::<Y>(), vec![Identifier::of::<Other>()]),
                ]
            );
        }
        other => panic!("unexpected failure {}", other),
    }
}

#[test]
fn complete_passes_when_everything_is_declared() -> DiResult<()> {
    let module = Module::builder("app")
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))
        .put(|_| Ok(B))
        .put(|_| Ok(Z))
        .build();
    complete().check(&[module])
}

#[test]
fn checks_reject_duplicates_across_modules() {
    let first = Module::builder("first").put(|_| Ok(B)).build();
    let second = Module::builder("second").put(|_| Ok(B)).build();
    assert!(matches!(
        complete().check(&[first, second]),
        Err(DiError::DuplicateIdentifier(_))
    ));
}

// ===== noCycle =====

#[test]
fn no_cycle_reports_direct_cycle() {
    let module = Module::builder("app")
        .put(|scope| Ok(Ping { _pong: scope.inject()? }))
        .put(|scope| Ok(Pong { _ping: scope.inject()? }))
        .build();

    let failure = failure(no_cycle().check(&[module]));
    assert_eq!(
        failure,
        CheckFailure::Cycle {
            trace: vec![Identifier::of::<Ping>(), Identifier::of::<Pong>(), Identifier::of::<Ping>()],
        }
    );
    assert_eq!(
        failure.to_string(),
        format!(
            "'noCycle' check failed.\nCyclic dependency found:\n    {a}\n--> {b}\n--> {a}\n\
             Note: --> represents an injection (i.e. A --> B means 'A depends on B').",
            a = id::<Ping>(),
            b = id::<Pong>()
        )
    );
}

#[test]
fn no_cycle_reports_longer_cycles() {
    match failure(no_cycle().check(&[ring_module()])) {
        CheckFailure::Cycle { trace } => assert_eq!(
            trace,
            vec![
                Identifier::of::<C1>(),
                Identifier::of::<C2>(),
                Identifier::of::<C3>(),
                Identifier::of::<C4>(),
                Identifier::of::<C1>(),
            ]
        ),
        other => panic!("unexpected failure {}", other),
    }
}

#[test]
fn no_cycle_reports_self_injection() {
    let module = Module::builder("app")
        .put(|scope| Ok(Selfish { _me: scope.inject()? }))
        .build();

    match failure(no_cycle().check(&[module])) {
        CheckFailure::Cycle { trace } => {
            assert_eq!(trace, vec![Identifier::of::<Selfish>(), Identifier::of::<Selfish>()])
        }
        other => panic!("unexpected failure {}", other),
    }
}

#[test]
fn no_cycle_ignores_undeclared_targets() -> DiResult<()> {
    let module = Module::builder("app")
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))
        .build();
    no_cycle().check(&[module])
}

// ===== noUnused =====

fn ring_with_isolated() -> Vec<Module> {
    let ring = ring_module();
    let extra = Module::builder("extra").put(|_| Ok(Isolated)).build();
    vec![ring, extra]
}

#[test]
fn no_unused_names_isolated_component() {
    let failure = failure(no_unused().check(&ring_with_isolated()));
    assert_eq!(
        failure,
        CheckFailure::Unused {
            unused: vec![Identifier::of::<Isolated>()],
        }
    );
    assert_eq!(
        failure.to_string(),
        format!(
            "'noUnused' check failed.\n\
             The following component is not injected anywhere, making it unused.\n\
             --> {}\n\n\
             If some or all of the components mentioned above are still used outside of injections \
             (e.g. via a 'get' call on the environment), you can exclude them from this rule with \
             NoUnusedCheck::exclude.",
            id::<Isolated>()
        )
    );
}

#[test]
fn no_unused_passes_with_exclusion() -> DiResult<()> {
    NoUnusedCheck::new()
        .exclude::<Isolated>()
        .check(&ring_with_isolated())
}

#[test]
fn no_unused_uses_plural_for_several() {
    let module = Module::builder("app")
        .put(|_| Ok(Isolated))
        .put(|_| Ok(Lonely))
        .put_named("named", |_| Ok(Lonely))
        .build();
    let check = no_unused().exclude_named::<Lonely>("named");

    let failure = failure(check.check(&[module]));
    assert_eq!(
        failure,
        CheckFailure::Unused {
            unused: vec![Identifier::of::<Isolated>(), Identifier::of::<Lonely>()],
        }
    );
    assert!(failure
        .to_string()
        .contains("The following components are not injected anywhere, making them unused."));
}

// ===== safeInjection =====

fn expected_unsafe_report(constructing: &str, target: &str) -> String {
    format!(
        "'safeInjection' check failed.\n\
         The following injection is done during the instantiation of {c}:\n    {c}\n--> {t}\n\n\
         You *must not* actually perform injections during the instantiation of objects.\n\
         If you need to do something on an object provided by an environment before storing it as a \
         property, use 'wrap_in' instead.",
        c = constructing,
        t = target
    )
}

#[test]
fn safe_injection_catches_propagated_reads() {
    let module = Module::builder("app")
        .put(|_| Ok(B))
        .put(|scope| Ok(Eager { _value: scope.inject::<B>()?.get()? }))
        .build();

    let failure = failure(safe_injection().check(&[module]));
    assert_eq!(
        failure,
        CheckFailure::UnsafeInjection {
            constructing: Identifier::of::<Eager>(),
            target: Identifier::of::<B>(),
        }
    );
    assert_eq!(failure.to_string(), expected_unsafe_report(&id::<Eager>(), &id::<B>()));
}

#[test]
fn safe_injection_catches_panicking_reads() {
    let module = Module::builder("app")
        .put(|_| Ok(B))
        .put(|scope| Ok(Eager { _value: scope.inject::<B>()?.get_required() }))
        .build();

    assert_eq!(
        failure(safe_injection().check(&[module])),
        CheckFailure::UnsafeInjection {
            constructing: Identifier::of::<Eager>(),
            target: Identifier::of::<B>(),
        }
    );
}

#[test]
fn safe_injection_catches_reads_whose_error_is_discarded() {
    struct Forgiving {
        _value: Option<std::sync::Arc<B>>,
    }

    let module = Module::builder("app")
        .put(|_| Ok(B))
        .put(|scope| Ok(Forgiving { _value: scope.inject::<B>()?.get().ok() }))
        .build();

    let failure = failure(safe_injection().check(&[module]));
    assert_eq!(
        failure,
        CheckFailure::UnsafeInjection {
            constructing: Identifier::of::<Forgiving>(),
            target: Identifier::of::<B>(),
        }
    );
    assert_eq!(failure.to_string(), expected_unsafe_report(&id::<Forgiving>(), &id::<B>()));
}

#[test]
fn safe_injection_accepts_lazy_and_wrapped_injections() -> DiResult<()> {
    struct Derived {
        _name: ferrous_inject::WrappedInjector<B, String>,
    }

    let module = Module::builder("app")
        .put(|_| Ok(B))
        .put(|scope| Ok(Lazy { _b: scope.inject()? }))
        .put(|scope| {
            Ok(Derived {
                _name: scope.inject::<B>()?.wrap_in(|_| "b".to_string()),
            })
        })
        .build();
    safe_injection().check(&[module])
}

#[test]
fn safe_injection_reports_unrelated_supplier_failures() {
    let module = Module::builder("app")
        .put::<B, _>(|_| Err(DiError::Internal("boom".to_string())))
        .build();

    match safe_injection().check(&[module]) {
        Err(DiError::ConstructionFailed { identifier, .. }) => assert_eq!(identifier, Identifier::of::<B>()),
        other => panic!("expected a construction failure, got {:?}", other),
    }
}

// ===== CheckSuite =====

#[test]
fn suite_without_checks_fails() {
    let failure = failure(CheckSuite::new().modules([ring_module()]).run());
    assert_eq!(failure, CheckFailure::NoChecks);
    assert!(failure.to_string().starts_with("CheckSuite run without any check"));
}

#[test]
fn suite_runs_checks_in_order() {
    let modules = ring_with_isolated();

    let result = CheckSuite::new()
        .modules(modules.clone())
        .with(complete())
        .with(no_unused())
        .with(no_cycle())
        .run();
    assert!(matches!(failure(result), CheckFailure::Unused { .. }));

    let result = CheckSuite::new()
        .modules(modules)
        .with(complete())
        .with(no_cycle())
        .with(no_unused())
        .run();
    assert!(matches!(failure(result), CheckFailure::Cycle { .. }));
}

#[test]
fn suite_passes_on_a_clean_graph() -> DiResult<()> {
    let module = Module::builder("app")
        .put(|scope| Ok(Lazy { _b: scope.inject()? }))
        .put(|_| Ok(B))
        .build();

    CheckSuite::new()
        .modules([module])
        .with(complete())
        .with(no_cycle())
        .with(NoUnusedCheck::new().exclude::<Lazy>())
        .with(safe_injection())
        .run()
}

// ===== Tracking and graph =====

#[test]
fn tracking_records_requests_without_reading() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))?
        .put(|scope| {
            // Requesting twice records one edge.
            let _again: Injector<B> = scope.inject()?;
            Ok(Lazy { _b: scope.inject()? })
        })?
        .put(|scope| Ok(Ping { _pong: scope.meta().inject()? }))?;
    let env = DependencyTrackingEnvironment::build(&builder.build())?;

    assert_eq!(
        env.dependencies()[&Identifier::of::<A>()],
        vec![Identifier::of::<B>(), Identifier::of::<Z>()]
    );
    assert_eq!(env.dependencies()[&Identifier::of::<Lazy>()], vec![Identifier::of::<B>()]);
    assert!(env.dependencies()[&Identifier::of::<Ping>()].is_empty());
    assert_eq!(env.meta_dependencies()[&Identifier::of::<Ping>()], vec![Identifier::of::<Pong>()]);
    assert!(env.meta_dependencies().get(&Identifier::of::<A>()).is_none());
    Ok(())
}

#[test]
fn tracking_rejects_reads() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|_| Ok(B))?
        .put(|scope| Ok(Eager { _value: scope.inject::<B>()?.get()? }))?;

    let error = DependencyTrackingEnvironment::build(&builder.build()).unwrap_err();
    assert!(matches!(error.root_cause(), DiError::InjectionUnavailable(_)));
    Ok(())
}

#[test]
fn dependency_graph_lists_nodes_and_edges() -> DiResult<()> {
    let module = Module::builder("app")
        .put(|scope| Ok(A { _b: scope.inject()?, _z: scope.inject()? }))
        .put(|_| Ok(B))
        .build();
    let graph = DependencyGraph::from_modules(&[module])?;

    let nodes: Vec<(&str, bool)> = graph.nodes.iter().map(|n| (n.id.as_str(), n.declared)).collect();
    let (a, b, z) = (id::<A>(), id::<B>(), id::<Z>());
    assert_eq!(nodes, vec![(a.as_str(), true), (b.as_str(), true), (z.as_str(), false)]);
    assert_eq!(graph.edges.len(), 2);
    assert!(graph.edges.iter().all(|edge| edge.kind == EdgeKind::Injection && edge.from == a));
    assert!(!graph.has_cycle);

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph dependencies {"));
    assert!(dot.contains("[style=dashed]"));
    Ok(())
}

#[test]
fn dependency_graph_flags_cycles_and_meta_edges() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|scope| Ok(Ping { _pong: scope.inject()? }))?
        .put(|scope| Ok(Pong { _ping: scope.inject()? }))?
        .put(|scope| Ok(Lazy { _b: scope.meta().inject()? }))?;
    let declarations = builder.build();
    let tracking = DependencyTrackingEnvironment::build(&declarations)?;
    let graph = DependencyGraph::from_tracking(&declarations, &tracking);

    assert!(graph.has_cycle);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(
        graph.edges.iter().filter(|edge| edge.kind == EdgeKind::Meta).count(),
        1
    );
    assert!(graph.to_dot().contains("[style=dotted]"));
    Ok(())
}

#[cfg(feature = "graph-export")]
#[test]
fn dependency_graph_serializes_to_json() -> DiResult<()> {
    let module = Module::builder("app").put(|_| Ok(B)).build();
    let graph = DependencyGraph::from_modules(&[module])?;

    let json = graph.to_json()?;
    let parsed: DependencyGraph = serde_json::from_str(&json).expect("valid graph JSON");
    assert_eq!(parsed, graph);
    Ok(())
}
