#![no_main]

use ferrous_container::{Container, ContainerConfig, DiError, Key, Resolver};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, edges)) = data.split_first() else {
        return;
    };

    let container = Container::with_config(ContainerConfig {
        chained_aliases: flags & 1 == 1,
        ..ContainerConfig::default()
    });
    container.instance(Key::name("target"), 7u8);

    for pair in edges.chunks_exact(2).take(16) {
        let from = Key::name(format!("a{}", pair[0] % 6));
        let to = if pair[1] % 7 == 6 {
            Key::name("target")
        } else {
            Key::name(format!("a{}", pair[1] % 6))
        };
        container.alias(from, to);
    }

    for i in 0..6 {
        let key = Key::name(format!("a{i}"));
        match container.get::<u8>(&key) {
            Ok(v) => assert_eq!(*v, 7),
            Err(DiError::Unresolved(_)) | Err(DiError::InvalidAlias(_)) | Err(DiError::Circular(_)) => {}
            Err(other) => panic!("unexpected error for {key}: {other}"),
        }
        let _ = container.alias_target(&key);
    }
});
