/// Extensible environment tests
///
/// Covers meta injection, declarations processors and the environment
/// handle every meta-environment receives.

use ferrous_inject::{
    Declaration, Declarations, DeclarationsProcessor, DiError, DiResult, Environment, EnvironmentRef,
    ExtensibleContext, ExtensibleEnvironment, Identifier, Injector, Qualifier,
};
use std::sync::{Arc, Mutex};

// ===== Test Components =====

/// Tag marking components a lifecycle manager should start.
struct Startable;

struct Clock {
    now: u64,
}

struct Scheduler {
    clock: Injector<Clock>,
}

struct Worker;

struct Mailer;

/// Meta component indexing startable declarations.
#[derive(Default)]
struct StartIndex {
    startable: Mutex<Vec<Identifier>>,
}

impl DeclarationsProcessor for StartIndex {
    fn process_declarations(&self, declarations: &Declarations) {
        let mut startable = self.startable.lock().unwrap();
        startable.extend(
            declarations
                .iter()
                .filter(|declaration| declaration.has_tag::<Startable>())
                .map(|declaration| declaration.identifier().clone()),
        );
    }
}

impl StartIndex {
    fn startable(&self) -> Vec<Identifier> {
        self.startable.lock().unwrap().clone()
    }
}

/// Processor appending its name to a shared log.
struct Logging {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl DeclarationsProcessor for Logging {
    fn process_declarations(&self, declarations: &Declarations) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, declarations.len()));
    }
}

// ===== Meta injection =====

#[test]
fn main_components_inject_meta_components() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.put(|scope| Ok(Scheduler { clock: scope.meta().inject()? }))?;
    builder.meta(|meta| {
        meta.put(|_| Ok(Clock { now: 42 }))?;
        Ok(())
    })?;
    let env = ExtensibleEnvironment::build(builder.build())?;

    assert_eq!(env.get::<Scheduler>()?.clock.get()?.now, 42);
    assert!(Arc::ptr_eq(
        &env.get::<Scheduler>()?.clock.get()?,
        &env.meta_environment().get::<Clock>()?
    ));
    Ok(())
}

#[test]
fn namespaces_do_not_leak() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.put(|_| Ok(Worker))?;
    builder.meta(|meta| {
        meta.put(|_| Ok(Clock { now: 0 }))?;
        Ok(())
    })?;
    let env = ExtensibleEnvironment::build(builder.build())?;

    assert!(matches!(env.get::<Clock>(), Err(DiError::NotFound(_))));
    assert!(env.meta_environment().get_or_null::<Worker>()?.is_none());
    Ok(())
}

#[test]
fn missing_meta_component_fails_the_build() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.put(|scope| Ok(Scheduler { clock: scope.meta().inject()? }))?;

    let error = ExtensibleEnvironment::build(builder.build()).unwrap_err();
    match error.root_cause() {
        DiError::NotFound(identifier) => assert_eq!(identifier, &Identifier::of::<Clock>()),
        other => panic!("expected a not-found error, got {}", other),
    }
    Ok(())
}

#[test]
fn meta_build_failures_propagate() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.meta(|meta| {
        meta.put::<Clock, _>(|_| Err(DiError::Internal("no clock".to_string())))?;
        Ok(())
    })?;

    let error = ExtensibleEnvironment::build(builder.build()).unwrap_err();
    assert!(matches!(error.root_cause(), DiError::Internal(message) if message == "no clock"));
    Ok(())
}

// ===== Processors =====

#[test]
fn processors_see_tagged_declarations_before_main_build() -> DiResult<()> {
    struct Observer {
        seen_at_build: usize,
    }

    let mut builder = ExtensibleContext::builder();
    builder
        .put_declaration(Declaration::new::<Worker, _>(Qualifier::Empty, |_| Ok(Worker)).with_tag(Startable))?
        .put_declaration(Declaration::new::<Mailer, _>(Qualifier::Empty, |_| Ok(Mailer)).with_tag(Startable))?
        .put(|scope| {
            // Meta components are fully built, so reading one here is fine.
            let index = scope.meta().inject::<StartIndex>()?.get()?;
            Ok(Observer {
                seen_at_build: index.startable().len(),
            })
        })?;
    builder.meta(|meta| {
        meta.put_processor(|_| Ok(StartIndex::default()))?;
        Ok(())
    })?;
    let env = ExtensibleEnvironment::build(builder.build())?;

    assert_eq!(env.get::<Observer>()?.seen_at_build, 2);
    assert_eq!(
        env.meta_environment().get::<StartIndex>()?.startable(),
        vec![Identifier::of::<Worker>(), Identifier::of::<Mailer>()]
    );
    Ok(())
}

#[test]
fn processors_run_once_in_meta_declaration_order() -> DiResult<()> {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut builder = ExtensibleContext::builder();
    builder.put(|_| Ok(Worker))?;
    let (first, second) = (Arc::clone(&log), Arc::clone(&log));
    builder.meta(move |meta| {
        meta.put_declaration(Declaration::processor::<Logging, _>("second", move |_| {
            Ok(Logging {
                name: "second",
                log: Arc::clone(&second),
            })
        }))?;
        meta.put_declaration(Declaration::processor::<Logging, _>("first", move |_| {
            Ok(Logging {
                name: "first",
                log: Arc::clone(&first),
            })
        }))?;
        Ok(())
    })?;
    ExtensibleEnvironment::build(builder.build())?;

    assert_eq!(*log.lock().unwrap(), vec!["second:1".to_string(), "first:1".to_string()]);
    Ok(())
}

#[test]
fn plain_meta_components_are_not_processors() -> DiResult<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&log);

    let mut builder = ExtensibleContext::builder();
    builder.meta(move |meta| {
        // Declared with `put`, so never handed the declarations.
        meta.put(move |_| {
            Ok(Logging {
                name: "plain",
                log: Arc::clone(&shared),
            })
        })?;
        Ok(())
    })?;
    ExtensibleEnvironment::build(builder.build())?;

    assert!(log.lock().unwrap().is_empty());
    Ok(())
}

// ===== Environment handle =====

#[test]
fn environment_ref_upgrades_after_build() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.put(|_| Ok(Worker))?.put(|_| Ok(Mailer))?;
    let env = ExtensibleEnvironment::build(builder.build())?;

    let handle = env.meta_environment().get::<EnvironmentRef>()?;
    let upgraded = handle.upgrade().expect("environment is alive");
    let identifiers: Vec<Identifier> = upgraded.get_all_identifiers().cloned().collect();
    assert_eq!(identifiers, vec![Identifier::of::<Worker>(), Identifier::of::<Mailer>()]);
    assert!(Arc::ptr_eq(&upgraded.get::<Worker>()?, &env.get::<Worker>()?));

    drop(upgraded);
    drop(env);
    assert!(handle.upgrade().is_none());
    Ok(())
}

#[test]
fn environment_ref_is_not_ready_during_meta_build() -> DiResult<()> {
    struct EarlyLook {
        upgraded_during_build: bool,
    }

    let mut builder = ExtensibleContext::builder();
    builder.meta(|meta| {
        meta.put(|scope| {
            let handle = scope.inject::<EnvironmentRef>()?.get()?;
            Ok(EarlyLook {
                upgraded_during_build: handle.upgrade().is_some(),
            })
        })?;
        Ok(())
    })?;
    let env = ExtensibleEnvironment::build(builder.build())?;

    assert!(!env.meta_environment().get::<EarlyLook>()?.upgraded_during_build);
    Ok(())
}

#[test]
fn clones_share_the_environment() -> DiResult<()> {
    let mut builder = ExtensibleContext::builder();
    builder.put(|_| Ok(Worker))?;
    let env = ExtensibleEnvironment::build(builder.build())?;
    let clone = env.clone();

    assert!(Arc::ptr_eq(&env.get::<Worker>()?, &clone.get::<Worker>()?));
    Ok(())
}
