use ferrous_container::{AnyArc, Container, DiError, DiResult, Key, Lifetime, Next, Resolver, TypedSchema};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Logger {
    target: &'static str,
}

struct ReportService {
    logger: Arc<Logger>,
}

struct AuditService {
    logger: Arc<Logger>,
}

fn with_default_logger() -> Container {
    let container = Container::new();
    container.singleton(Key::name("logger"), |_| Ok(Logger { target: "console" }));
    container
}

#[test]
fn test_override_applies_only_to_named_consumer() {
    let container = with_default_logger();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    let for_reports = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();
    let for_audit = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<AuditService>())
        .unwrap();
    let plain = container.get::<Logger>(&Key::name("logger")).unwrap();

    assert_eq!(for_reports.target, "file");
    assert_eq!(for_audit.target, "console");
    assert_eq!(plain.target, "console");
}

#[test]
fn test_override_reaches_constructor_injection() {
    let container = with_default_logger();
    container.construct::<ReportService, _>(Lifetime::Transient, [Key::name("logger")], |args| {
        Ok(ReportService { logger: args.get(0)? })
    });
    container.construct::<AuditService, _>(Lifetime::Transient, [Key::name("logger")], |args| {
        Ok(AuditService { logger: args.get(0)? })
    });
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    assert_eq!(container.get_type::<ReportService>().unwrap().logger.target, "file");
    assert_eq!(container.get_type::<AuditService>().unwrap().logger.target, "console");
}

#[test]
fn test_dependency_helper_names_the_consumer() {
    let container = with_default_logger();
    container.transient(Key::of::<ReportService>(), |r| {
        Ok(ReportService { logger: r.dependency(&Key::name("logger"))? })
    });
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    assert_eq!(container.get_type::<ReportService>().unwrap().logger.target, "file");
}

#[test]
fn test_give_with_runs_on_every_resolution() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let container = with_default_logger();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give_with(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Logger { target: "fresh" })
        });

    let a = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();
    let b = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_give_key_redirects_to_another_binding() {
    let container = with_default_logger();
    container.singleton(Key::name("FileLogger"), |_| Ok(Logger { target: "file" }));
    container
        .when(Key::of::<AuditService>())
        .needs(Key::name("logger"))
        .give_key(Key::name("FileLogger"));

    let audit = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<AuditService>())
        .unwrap();
    let direct = container.get::<Logger>(&Key::name("FileLogger")).unwrap();
    assert!(Arc::ptr_eq(&audit, &direct));
}

#[test]
fn test_empty_override_is_an_error() {
    let container = with_default_logger();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give_optional::<Logger>(None);

    match container.get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>()) {
        Err(DiError::InvalidContextualBinding { consumer, dependency }) => {
            assert_eq!(consumer, Key::of::<ReportService>());
            assert_eq!(dependency, Key::name("logger"));
        }
        other => panic!("expected InvalidContextualBinding, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_give_registers_fallback_when_dependency_unbound() {
    let container = Container::new();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("timeout"))
        .give(30u32);

    assert!(container.has(&Key::name("timeout")));
    assert_eq!(*container.get::<u32>(&Key::name("timeout")).unwrap(), 30);
}

#[test]
fn test_give_with_fallback_runs_the_factory() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let container = Container::new();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("retries"))
        .give_with(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) as u32 + 3));

    assert_eq!(*container.get::<u32>(&Key::name("retries")).unwrap(), 3);
    assert_eq!(*container.get::<u32>(&Key::name("retries")).unwrap(), 4);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_give_does_not_replace_existing_binding() {
    let container = Container::new();
    container.instance(Key::name("timeout"), 10u32);
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("timeout"))
        .give(30u32);

    assert_eq!(*container.get::<u32>(&Key::name("timeout")).unwrap(), 10);
}

#[test]
fn test_override_wins_over_cached_singleton() {
    let container = with_default_logger();
    let shared = container.get::<Logger>(&Key::name("logger")).unwrap();
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    let overridden = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();
    assert!(!Arc::ptr_eq(&shared, &overridden));
    assert_eq!(overridden.target, "file");
    assert!(Arc::ptr_eq(&shared, &container.get::<Logger>(&Key::name("logger")).unwrap()));
}

#[test]
fn test_override_declared_on_parent_applies_in_scope() {
    let root = with_default_logger();
    root.when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });
    let scope = root.create_scope();

    let logger = scope
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();
    assert_eq!(logger.target, "file");
}

#[test]
fn test_override_keyed_by_canonical_dependency() {
    let container = with_default_logger();
    container.alias(Key::name("log"), Key::name("logger"));
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    let logger = container
        .get_for::<Logger>(&Key::name("log"), &Key::of::<ReportService>())
        .unwrap();
    assert_eq!(logger.target, "file");
}

fn worker_limit() -> Container {
    let container = Container::new();
    container
        .bind_with_schema(
            Key::name("workers"),
            Lifetime::Singleton,
            |_| Ok(4u32),
            TypedSchema::<u32>::new().rule("", |n: &u32| *n < 10, "must be below 10"),
        )
        .unwrap();
    container
}

#[test]
fn test_override_is_checked_by_binding_schema() {
    let container = worker_limit();
    container.when(Key::name("batch")).needs(Key::name("workers")).give(99u32);
    container.when(Key::name("report")).needs(Key::name("workers")).give(2u32);

    assert!(matches!(
        container.get_for::<u32>(&Key::name("workers"), &Key::name("batch")),
        Err(DiError::InvalidSchema { key, .. }) if key == Key::name("workers")
    ));
    assert_eq!(*container.get_for::<u32>(&Key::name("workers"), &Key::name("report")).unwrap(), 2);
    assert_eq!(*container.get::<u32>(&Key::name("workers")).unwrap(), 4);
}

#[test]
fn test_override_runs_through_middleware() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = seen.clone();
    let container = with_default_logger();
    container.use_middleware(move |key: &Key, next: &Next<'_>| -> DiResult<AnyArc> {
        log.lock().unwrap().push(key.to_string());
        next.run()
    });
    container
        .when(Key::of::<ReportService>())
        .needs(Key::name("logger"))
        .give(Logger { target: "file" });

    let logger = container
        .get_for::<Logger>(&Key::name("logger"), &Key::of::<ReportService>())
        .unwrap();
    assert_eq!(logger.target, "file");
    assert_eq!(*seen.lock().unwrap(), vec!["logger"]);
}

#[test]
fn test_extensions_apply_to_override() {
    let container = worker_limit();
    container
        .extend(Key::name("workers"), |n: Arc<u32>, _| Ok(Arc::new(*n + 1)))
        .unwrap();
    container.when(Key::name("batch")).needs(Key::name("workers")).give(6u32);

    assert_eq!(*container.get_for::<u32>(&Key::name("workers"), &Key::name("batch")).unwrap(), 7);
    assert_eq!(*container.get::<u32>(&Key::name("workers")).unwrap(), 5);
}

#[test]
fn test_override_of_singleton_is_not_cached() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let container = worker_limit();
    container
        .when(Key::name("batch"))
        .needs(Key::name("workers"))
        .give_with(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) as u32));

    let first = container.get_for::<u32>(&Key::name("workers"), &Key::name("batch")).unwrap();
    let second = container.get_for::<u32>(&Key::name("workers"), &Key::name("batch")).unwrap();
    assert_eq!((*first, *second), (0, 1));
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*container.get::<u32>(&Key::name("workers")).unwrap(), 4);
}

#[tokio::test]
async fn test_redirect_to_async_binding_is_finished_after_await() {
    let container = worker_limit();
    container
        .extend(Key::name("workers"), |n: Arc<u32>, _| Ok(Arc::new(*n * 10)))
        .unwrap();
    container.transient_async(Key::name("remote.workers"), |_| async { Ok(3u32) });
    container
        .when(Key::name("batch"))
        .needs(Key::name("workers"))
        .give_key(Key::name("remote.workers"));

    let value = container
        .resolve_async_for(&Key::name("workers"), &Key::name("batch"))
        .await
        .unwrap();
    assert_eq!(*value.downcast::<u32>().unwrap(), 30);
}
