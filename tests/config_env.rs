use ferrous_container::{Container, ContainerConfig, Key, Resolver};
use serial_test::serial;
use std::env;

const VARS: [&str; 4] = [
    "FERROUS_CONTAINER_MAX_DEPTH",
    "FERROUS_CONTAINER_CHAINED_ALIASES",
    "FERROUS_CONTAINER_EAGER_SCHEMA",
    "FERROUS_CONTAINER_WARN_UNDISPOSED",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    assert_eq!(ContainerConfig::from_env(), ContainerConfig::default());
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("FERROUS_CONTAINER_MAX_DEPTH", "16");
    env::set_var("FERROUS_CONTAINER_CHAINED_ALIASES", "true");
    env::set_var("FERROUS_CONTAINER_EAGER_SCHEMA", "1");
    env::set_var("FERROUS_CONTAINER_WARN_UNDISPOSED", "off");

    let config = ContainerConfig::from_env();
    clear_env();

    assert_eq!(config.max_depth, 16);
    assert!(config.chained_aliases);
    assert!(config.eager_schema_validation);
    assert!(!config.warn_on_undisposed);
}

#[test]
#[serial]
fn test_unparsable_values_keep_defaults() {
    clear_env();
    env::set_var("FERROUS_CONTAINER_MAX_DEPTH", "zero");
    env::set_var("FERROUS_CONTAINER_CHAINED_ALIASES", "perhaps");

    let config = ContainerConfig::from_env();
    clear_env();

    assert_eq!(config.max_depth, ContainerConfig::default().max_depth);
    assert!(!config.chained_aliases);
}

#[test]
#[serial]
fn test_env_config_drives_container() {
    clear_env();
    env::set_var("FERROUS_CONTAINER_CHAINED_ALIASES", "yes");
    let container = Container::with_config(ContainerConfig::from_env());
    clear_env();

    container.instance(Key::name("ConsoleLogger"), "console");
    container.alias(Key::name("logger"), Key::name("ConsoleLogger"));
    container.alias(Key::name("log"), Key::name("logger"));
    assert_eq!(*container.get::<&str>(&Key::name("log")).unwrap(), "console");
}

#[cfg(feature = "config")]
#[test]
fn test_json_config() {
    let config = ContainerConfig::from_json_str(r#"{ "max_depth": 8, "eager_schema_validation": true }"#).unwrap();
    assert_eq!(config.max_depth, 8);
    assert!(config.eager_schema_validation);
    assert!(!config.chained_aliases);
}
