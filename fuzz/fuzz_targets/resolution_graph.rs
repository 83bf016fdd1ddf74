#![no_main]

use ferrous_container::{Container, DiError, Key, Lifetime, Resolver};
use libfuzzer_sys::fuzz_target;

const NODES: usize = 8;

// Each byte pair describes one node: its lifetime and which other node it depends on.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let root = Container::new();
    let mut bound = [false; NODES];
    for pair in data.chunks_exact(2).take(NODES) {
        let node = (pair[0] as usize) % NODES;
        let lifetime = match pair[0] >> 6 {
            0 => Lifetime::Singleton,
            1 => Lifetime::Scoped,
            _ => Lifetime::Transient,
        };
        let dep = pair[1] as usize;
        bound[node] = true;
        if dep >= NODES * 2 {
            root.bind(Key::name(format!("n{node}")), lifetime, move |_| Ok(node as u64));
        } else {
            let next = Key::name(format!("n{}", dep % NODES));
            root.bind(Key::name(format!("n{node}")), lifetime, move |r| {
                Ok(*r.get::<u64>(&next)? + 1)
            });
        }
    }

    let scope = root.create_scope();
    for (node, is_bound) in bound.iter().enumerate() {
        let key = Key::name(format!("n{node}"));
        match scope.get::<u64>(&key) {
            Ok(_) => assert!(is_bound),
            Err(DiError::Circular(path)) => {
                assert!(path.len() >= 2);
                assert_eq!(path.first(), path.last());
            }
            Err(DiError::Unresolved(_)) => {}
            Err(other) => panic!("unexpected error for {key}: {other}"),
        }
    }

    scope.dispose();
    root.dispose();
});
