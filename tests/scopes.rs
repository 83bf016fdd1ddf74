use ferrous_container::{Container, Key, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct RequestId(usize);

fn request_ids() -> (Container, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let root = Container::new();
    root.scoped(Key::of::<RequestId>(), move |_| {
        Ok(RequestId(counter.fetch_add(1, Ordering::SeqCst) + 1))
    });
    (root, builds)
}

#[test]
fn test_scoped_isolated_per_scope() {
    let (root, builds) = request_ids();
    let scope1 = root.create_scope();
    let scope2 = root.create_scope();

    let a1 = scope1.get_type::<RequestId>().unwrap();
    let a2 = scope1.get_type::<RequestId>().unwrap();
    let b1 = scope2.get_type::<RequestId>().unwrap();

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b1));
    assert_ne!(a1.0, b1.0);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_nested_scope_gets_its_own_scoped_instance() {
    let (root, _) = request_ids();
    let outer = root.create_scope();
    let inner = outer.create_scope();

    let from_outer = outer.get_type::<RequestId>().unwrap();
    let from_inner = inner.get_type::<RequestId>().unwrap();
    assert!(!Arc::ptr_eq(&from_outer, &from_inner));
}

#[test]
fn test_child_shadows_parent_binding() {
    let root = Container::new();
    root.instance(Key::name("env"), "production");
    let child = root.create_child();
    child.instance(Key::name("env"), "test");

    assert_eq!(*child.get::<&str>(&Key::name("env")).unwrap(), "test");
    assert_eq!(*root.get::<&str>(&Key::name("env")).unwrap(), "production");
}

#[test]
fn test_child_bindings_do_not_leak_upward() {
    let root = Container::new();
    let child = root.create_child();
    child.instance(Key::name("local"), 1u8);

    assert!(child.has(&Key::name("local")));
    assert!(!root.has(&Key::name("local")));
    assert!(root.get::<u8>(&Key::name("local")).is_err());
}

#[test]
fn test_transient_in_scope_sees_scope_bindings() {
    let root = Container::new();
    root.transient(Key::name("greeting"), |r| {
        let user = r.get::<String>(&Key::name("user"))?;
        Ok(format!("hello {user}"))
    });

    let scope = root.create_scope();
    scope.instance(Key::name("user"), "ada".to_string());

    assert_eq!(*scope.get::<String>(&Key::name("greeting")).unwrap(), "hello ada");
    assert!(root.get::<String>(&Key::name("greeting")).is_err());
}

#[test]
fn test_singleton_is_built_in_owning_container() {
    let root = Container::new();
    root.instance(Key::name("user"), "root".to_string());
    root.singleton(Key::name("greeting"), |r| {
        let user = r.get::<String>(&Key::name("user"))?;
        Ok(format!("hello {user}"))
    });

    let scope = root.create_scope();
    scope.instance(Key::name("user"), "scope".to_string());

    assert_eq!(*scope.get::<String>(&Key::name("greeting")).unwrap(), "hello root");
}

#[test]
fn test_scope_aliases_are_consulted_before_parent() {
    let root = Container::new();
    root.instance(Key::name("FileLogger"), "file");
    root.instance(Key::name("ConsoleLogger"), "console");
    root.alias(Key::name("logger"), Key::name("FileLogger"));

    let scope = root.create_scope();
    scope.alias(Key::name("logger"), Key::name("ConsoleLogger"));

    assert_eq!(*scope.get::<&str>(&Key::name("logger")).unwrap(), "console");
    assert_eq!(*root.get::<&str>(&Key::name("logger")).unwrap(), "file");
}

#[test]
fn test_children_are_tracked() {
    let root = Container::new();
    let a = root.create_scope();
    let _b = root.create_child();

    assert_eq!(root.children().len(), 2);
    assert!(a.parent().unwrap().ptr_eq(&root));
    drop(a);
    assert_eq!(root.children().len(), 1);
}

#[test]
fn test_scopes_share_config() {
    let root = Container::with_config(ferrous_container::ContainerConfig {
        chained_aliases: true,
        ..Default::default()
    });
    let scope = root.create_scope();
    assert!(scope.config().chained_aliases);
}

#[test]
fn test_parent_rebind_replaces_instances_in_live_scopes() {
    let root = Container::new();
    root.scoped(Key::name("session"), |_| Ok(1u32));
    let scope = root.create_scope();
    assert_eq!(*scope.get::<u32>(&Key::name("session")).unwrap(), 1);

    root.scoped(Key::name("session"), |_| Ok(2u32));
    let first = scope.get::<u32>(&Key::name("session")).unwrap();
    let again = scope.get::<u32>(&Key::name("session")).unwrap();
    assert_eq!(*first, 2);
    assert!(Arc::ptr_eq(&first, &again));

    // A shadowing binding in the scope itself also wins over the old instance.
    scope.scoped(Key::name("session"), |_| Ok(3u32));
    assert_eq!(*scope.get::<u32>(&Key::name("session")).unwrap(), 3);
}
