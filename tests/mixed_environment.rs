/// Mixed environment tests
///
/// Components are created eagerly at build time while injections stay lazy,
/// which is what makes cyclic and self-referencing graphs work.

use ferrous_inject::{
    DeclarationsBuilder, DiError, DiResult, Environment, Identifier, Injector, MixedEnvironment,
    OptionalInjector, Qualifier, WrappedInjector,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ===== Test Components =====

struct AtoB {
    b: Injector<BtoA>,
}

impl AtoB {
    fn name(&self) -> &'static str {
        "AtoB"
    }

    fn use_b(&self) -> &'static str {
        self.b.get_required().name()
    }
}

struct BtoA {
    a: Injector<AtoB>,
}

impl BtoA {
    fn name(&self) -> &'static str {
        "BtoA"
    }

    fn use_a(&self) -> &'static str {
        self.a.get_required().name()
    }
}

struct CtoC {
    c: Injector<CtoC>,
}

impl CtoC {
    fn name(&self) -> &'static str {
        "CtoC"
    }

    fn use_c(&self) -> &'static str {
        self.c.get_required().name()
    }
}

struct Missing;

struct NeedsMissing {
    missing: Injector<Missing>,
}

struct MaybeMissing {
    missing: OptionalInjector<Missing>,
}

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

struct Host {
    greeter: Injector<dyn Greeter>,
}

/// Logs build and resolution events when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cyclic_env() -> DiResult<MixedEnvironment> {
    init_tracing();
    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|scope| Ok(AtoB { b: scope.inject()? }))?
        .put(|scope| Ok(BtoA { a: scope.inject()? }))?
        .put(|scope| Ok(CtoC { c: scope.inject()? }))?;
    MixedEnvironment::build(builder.build())
}

// ===== Cycles =====

#[test]
fn mutual_injection_resolves_both_ways() -> DiResult<()> {
    let env = cyclic_env()?;
    assert_eq!(env.get::<AtoB>()?.use_b(), "BtoA");
    assert_eq!(env.get::<BtoA>()?.use_a(), "AtoB");
    Ok(())
}

#[test]
fn self_injection_resolves_to_itself() -> DiResult<()> {
    let env = cyclic_env()?;
    let c = env.get::<CtoC>()?;
    assert_eq!(c.use_c(), "CtoC");
    assert!(Arc::ptr_eq(&c, &c.c.get()?));
    Ok(())
}

#[test]
fn repeated_gets_are_reference_stable() -> DiResult<()> {
    let env = cyclic_env()?;
    let first = env.get::<AtoB>()?;
    let second = env.get::<AtoB>()?;
    assert!(Arc::ptr_eq(&first, &second));

    let through_b = env.get::<BtoA>()?.a.get()?;
    assert!(Arc::ptr_eq(&first, &through_b));
    Ok(())
}

// ===== Construction =====

#[test]
fn suppliers_run_once_in_declaration_order() -> DiResult<()> {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut builder = DeclarationsBuilder::new();
    let log = Arc::clone(&order);
    builder.put(move |_| {
        log.lock().unwrap().push("u8");
        Ok(1u8)
    })?;
    let log = Arc::clone(&order);
    builder.put(move |_| {
        log.lock().unwrap().push("u16");
        Ok(2u16)
    })?;

    let env = MixedEnvironment::build(builder.build())?;
    env.get::<u8>()?;
    env.get::<u16>()?;
    env.get::<u8>()?;
    assert_eq!(*order.lock().unwrap(), vec!["u8", "u16"]);

    let identifiers: Vec<Identifier> = env.get_all_identifiers().cloned().collect();
    assert_eq!(identifiers, vec![Identifier::of::<u8>(), Identifier::of::<u16>()]);
    Ok(())
}

#[test]
fn missing_dependency_fails_on_first_read_only() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder.put(|scope| Ok(NeedsMissing { missing: scope.inject()? }))?;
    let env = MixedEnvironment::build(builder.build())?;

    let component = env.get::<NeedsMissing>()?;
    match component.missing.get() {
        Err(DiError::NotFound(identifier)) => assert_eq!(identifier, Identifier::of::<Missing>()),
        _ => panic!("expected a not-found error"),
    }
    Ok(())
}

#[test]
fn reading_during_construction_fails() -> DiResult<()> {
    struct Eager {
        _value: Arc<u8>,
    }

    let mut builder = DeclarationsBuilder::new();
    builder
        .put_value(3u8)?
        .put(|scope| Ok(Eager { _value: scope.inject::<u8>()?.get()? }))?;

    let error = MixedEnvironment::build(builder.build()).unwrap_err();
    match &error {
        DiError::ConstructionFailed { identifier, source } => {
            assert_eq!(identifier, &Identifier::of::<Eager>());
            assert!(matches!(**source, DiError::EnvironmentNotReady(_)));
        }
        other => panic!("expected a construction failure, got {}", other),
    }
    Ok(())
}

#[test]
fn supplier_errors_name_their_declaration() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder.put::<u8, _>(|_| Err(DiError::Internal("boom".to_string())))?;

    let error = MixedEnvironment::build(builder.build()).unwrap_err();
    assert!(error.to_string().contains(&Identifier::of::<u8>().to_string()));
    assert!(matches!(error.root_cause(), DiError::Internal(message) if message == "boom"));
    Ok(())
}

#[test]
fn meta_injection_is_not_extensible() -> DiResult<()> {
    struct WantsMeta {
        _meta: Injector<u8>,
    }

    let mut builder = DeclarationsBuilder::new();
    builder.put(|scope| Ok(WantsMeta { _meta: scope.meta().inject()? }))?;

    let error = MixedEnvironment::build(builder.build()).unwrap_err();
    assert!(matches!(error.root_cause(), DiError::NotExtensible));
    Ok(())
}

// ===== Retrieval =====

#[test]
fn get_or_null_and_required() -> DiResult<()> {
    let env = cyclic_env()?;
    assert!(env.get_or_null::<Missing>()?.is_none());
    assert!(env.get_or_null::<CtoC>()?.is_some());
    assert!(matches!(env.get::<Missing>(), Err(DiError::NotFound(_))));
    assert_eq!(env.get_required::<CtoC>().name(), "CtoC");

    let panicked = catch_unwind(AssertUnwindSafe(|| {
        env.get_required::<Missing>();
    }));
    assert!(panicked.is_err());
    Ok(())
}

#[test]
fn identifier_type_must_match() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder.put_value(5u64)?;
    let env = MixedEnvironment::build(builder.build())?;

    assert!(matches!(
        env.get_identifier::<u32>(&Identifier::of::<u64>()),
        Err(DiError::InvalidDeclaration(_))
    ));
    assert_eq!(*env.get_identifier::<u64>(&Identifier::of::<u64>())?, 5);
    Ok(())
}

#[test]
fn trait_objects_resolve_through_injectors() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder
        .put_shared::<dyn Greeter, _>(Qualifier::Empty, |_| Ok(Arc::new(English) as Arc<dyn Greeter>))?
        .put(|scope| Ok(Host { greeter: scope.inject()? }))?;
    let env = MixedEnvironment::build(builder.build())?;

    assert_eq!(env.get::<Host>()?.greeter.get()?.greet(), "hello");
    assert!(Arc::ptr_eq(&env.get::<dyn Greeter>()?, &env.get::<Host>()?.greeter.get()?));
    Ok(())
}

// ===== Injectors =====

#[test]
fn optional_injection_reads_none_when_absent() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder.put(|scope| Ok(MaybeMissing { missing: scope.optional()? }))?;
    let env = MixedEnvironment::build(builder.build())?;
    assert!(env.get::<MaybeMissing>()?.missing.get()?.is_none());

    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|scope| Ok(MaybeMissing { missing: scope.optional()? }))?
        .put(|_| Ok(Missing))?;
    let env = MixedEnvironment::build(builder.build())?;
    assert!(env.get::<MaybeMissing>()?.missing.get()?.is_some());
    Ok(())
}

#[test]
fn injector_get_required_panics_with_the_error() -> DiResult<()> {
    let mut builder = DeclarationsBuilder::new();
    builder.put(|scope| Ok(NeedsMissing { missing: scope.inject()? }))?;
    let env = MixedEnvironment::build(builder.build())?;
    let component = env.get::<NeedsMissing>()?;

    let payload = catch_unwind(AssertUnwindSafe(|| {
        component.missing.get_required();
    }))
    .unwrap_err();
    assert!(matches!(payload.downcast_ref::<DiError>(), Some(DiError::NotFound(_))));
    Ok(())
}

#[test]
fn injection_hook_runs_once_per_injector() -> DiResult<()> {
    let env = cyclic_env()?;
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let injector: Injector<CtoC> = env.create_injector_with(&Identifier::of::<CtoC>(), move |_: &Arc<CtoC>| {
        counter.fetch_add(1, Ordering::SeqCst);
    })?;
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let first = injector.get()?;
    let second = injector.get()?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn wrapped_injector_maps_once() -> DiResult<()> {
    struct Label {
        text: WrappedInjector<CtoC, String>,
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut builder = DeclarationsBuilder::new();
    builder
        .put(|scope| Ok(CtoC { c: scope.inject()? }))?
        .put(move |scope| {
            let counter = Arc::clone(&counter);
            let text = scope.inject::<CtoC>()?.wrap_in(move |c| {
                counter.fetch_add(1, Ordering::SeqCst);
                format!("{}!", c.name())
            });
            Ok(Label { text })
        })?;
    let env = MixedEnvironment::build(builder.build())?;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let label = env.get::<Label>()?;
    assert_eq!(*label.text.get()?, "CtoC!");
    assert_eq!(*label.text.get()?, "CtoC!");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(label.text.identifier(), &Identifier::of::<CtoC>());
    Ok(())
}

#[test]
fn reading_after_drop_fails() -> DiResult<()> {
    let env = cyclic_env()?;
    let a = env.get::<AtoB>()?;
    a.b.get()?;
    drop(env);

    assert!(matches!(a.b.get(), Err(DiError::EnvironmentDropped(_))));
    Ok(())
}
