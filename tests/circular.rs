use ferrous_container::{Container, ContainerConfig, DiError, Key, Resolver, DEFAULT_MAX_DEPTH};
use std::sync::Arc;

/// Helper: assert that `result` is a cycle error carrying `expected_path`.
fn assert_circular<T>(result: Result<T, DiError>, expected_path: &[&str]) {
    match result {
        Err(DiError::Circular(path)) => {
            let names: Vec<String> = path.iter().map(Key::display_name).collect();
            assert_eq!(names, expected_path, "wrong circular path");
        }
        Err(other) => panic!("expected a circular dependency error, got {other}"),
        Ok(_) => panic!("expected a circular dependency error, got a value"),
    }
}

#[test]
fn test_self_circular_dependency() {
    let container = Container::new();
    container.transient(Key::name("A"), |r| {
        let again = r.get::<u32>(&Key::name("A"))?;
        Ok(*again)
    });

    assert_circular(container.get::<u32>(&Key::name("A")), &["A", "A"]);
}

#[test]
fn test_two_service_cycle_reports_discovery_order() {
    let container = Container::new();
    container.singleton(Key::name("A"), |r| Ok(*r.get::<u32>(&Key::name("B"))?));
    container.singleton(Key::name("B"), |r| Ok(*r.get::<u32>(&Key::name("A"))?));

    assert_circular(container.get::<u32>(&Key::name("A")), &["A", "B", "A"]);
    assert_circular(container.get::<u32>(&Key::name("B")), &["B", "A", "B"]);
}

#[test]
fn test_three_service_cycle() {
    let container = Container::new();
    container.transient(Key::name("A"), |r| Ok(*r.get::<u8>(&Key::name("B"))?));
    container.transient(Key::name("B"), |r| Ok(*r.get::<u8>(&Key::name("C"))?));
    container.transient(Key::name("C"), |r| Ok(*r.get::<u8>(&Key::name("A"))?));

    let err = container.get::<u8>(&Key::name("A")).unwrap_err();
    assert_eq!(err.to_string(), "Circular dependency: A -> B -> C -> A");
}

#[test]
fn test_cycle_through_alias_uses_canonical_keys() {
    let container = Container::new();
    container.alias(Key::name("a"), Key::name("A"));
    container.transient(Key::name("A"), |r| Ok(*r.get::<u8>(&Key::name("B"))?));
    container.transient(Key::name("B"), |r| Ok(*r.get::<u8>(&Key::name("a"))?));

    assert_circular(container.get::<u8>(&Key::name("a")), &["A", "B", "A"]);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let container = Container::new();
    container.transient(Key::name("D"), |_| Ok(1u32));
    container.transient(Key::name("B"), |r| Ok(*r.get::<u32>(&Key::name("D"))? + 1));
    container.transient(Key::name("C"), |r| Ok(*r.get::<u32>(&Key::name("D"))? + 2));
    container.transient(Key::name("A"), |r| {
        Ok(*r.get::<u32>(&Key::name("B"))? + *r.get::<u32>(&Key::name("C"))?)
    });

    assert_eq!(*container.get::<u32>(&Key::name("A")).unwrap(), 5);
}

#[test]
fn test_failed_resolution_leaves_no_stale_chain() {
    let container = Container::new();
    container.transient(Key::name("A"), |r| Ok(*r.get::<u8>(&Key::name("missing"))?));
    container.transient(Key::name("B"), |r| Ok(*r.get::<u8>(&Key::name("A"))?));

    assert!(matches!(container.get::<u8>(&Key::name("B")), Err(DiError::Unresolved(_))));
    assert!(matches!(container.get::<u8>(&Key::name("A")), Err(DiError::Unresolved(_))));

    container.instance(Key::name("missing"), 9u8);
    assert_eq!(*container.get::<u8>(&Key::name("B")).unwrap(), 9);
}

#[test]
fn test_parallel_resolutions_do_not_share_chains() {
    let container = Container::new();
    container.transient(Key::name("leaf"), |_| {
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(1u8)
    });
    container.transient(Key::name("root"), |r| Ok(*r.get::<u8>(&Key::name("leaf"))?));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = container.clone();
            std::thread::spawn(move || c.get::<u8>(&Key::name("root")).map(|v| *v))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}

#[test]
fn test_depth_limit_is_configurable() {
    let container = Container::with_config(ContainerConfig {
        max_depth: 3,
        ..ContainerConfig::default()
    });
    for i in 0..5u32 {
        let next = Key::name(format!("n{}", i + 1));
        container.transient(Key::name(format!("n{i}")), move |r| {
            Ok(r.try_get::<u32>(&next)?.map_or(0, |v| *v + 1))
        });
    }

    assert!(matches!(
        container.get::<u32>(&Key::name("n0")),
        Err(DiError::DepthExceeded(3))
    ));
    assert_eq!(*container.get::<u32>(&Key::name("n3")).unwrap(), 1);
}

/// `links` transients stacked on a registered instance.
fn chain_of(links: usize) -> Container {
    let container = Container::new();
    container.instance(Key::name("c0"), 0usize);
    for i in 1..=links {
        let prev = Key::name(format!("c{}", i - 1));
        container.transient(Key::name(format!("c{i}")), move |r| Ok(*r.get::<usize>(&prev)? + 1));
    }
    container
}

#[test]
fn test_default_depth_limit_is_reached_before_stack_overflow() {
    let deepest = Key::name(format!("c{DEFAULT_MAX_DEPTH}"));
    let container = chain_of(DEFAULT_MAX_DEPTH);
    assert_eq!(*container.get::<usize>(&deepest).unwrap(), DEFAULT_MAX_DEPTH);

    let container = chain_of(DEFAULT_MAX_DEPTH + 1);
    let over = Key::name(format!("c{}", DEFAULT_MAX_DEPTH + 1));
    assert!(matches!(
        container.get::<usize>(&over),
        Err(DiError::DepthExceeded(limit)) if limit == DEFAULT_MAX_DEPTH
    ));

    // Far past the limit still fails cleanly on a default-sized test thread.
    let container = chain_of(4 * DEFAULT_MAX_DEPTH);
    let top = Key::name(format!("c{}", 4 * DEFAULT_MAX_DEPTH));
    assert!(matches!(container.get::<usize>(&top), Err(DiError::DepthExceeded(_))));
}

#[test]
fn test_singleton_cycle_across_scope_boundary() {
    let root = Container::new();
    root.singleton(Key::name("A"), |r| Ok(Arc::new(*r.get::<u8>(&Key::name("B"))?)));
    let scope = root.create_scope();
    scope.transient(Key::name("B"), |r| Ok(**r.get::<Arc<u8>>(&Key::name("A"))?));

    // The singleton is built in the root, which cannot see the scope's B.
    assert!(matches!(
        scope.get::<Arc<u8>>(&Key::name("A")),
        Err(DiError::Unresolved(key)) if key == Key::name("B")
    ));
}
