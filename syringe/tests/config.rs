use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use syringe::{
    Binder, InjectError, Injectable, Injector, InjectorConfig, Key, Scope, Stage,
};

struct Connection;

impl Injectable for Connection {}

#[derive(Injectable)]
struct SimpleEditor;

fn connection_module(counter: Arc<AtomicUsize>, eager: bool) -> impl Fn(&mut Binder) {
    move |binder: &mut Binder| {
        let counter = counter.clone();
        let connection = binder.bind::<Connection>().to_provider(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Connection))
        });
        if eager {
            connection.as_eager_singleton();
        } else {
            connection.in_scope(Scope::Singleton);
        }
    }
}

#[test]
fn test_development_stage_is_lazy() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(connection_module(counter.clone(), false))
        .build()
        .unwrap();
    assert_eq!(injector.config().stage, Stage::Development);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    injector.get_instance::<Connection>().unwrap();
    injector.get_instance::<Connection>().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_production_stage_is_eager() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .stage(Stage::Production)
        .install(connection_module(counter.clone(), false))
        .build()
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    injector.get_instance::<Connection>().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_eager_singleton() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(connection_module(counter.clone(), true))
        .build()
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    let connection = injector.get_instance::<Connection>().unwrap();
    assert!(Arc::ptr_eq(
        &connection,
        &injector.get_instance::<Connection>().unwrap()
    ));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_eager_singleton_failure() {
    let result = Injector::builder()
        .configure(|binder| {
            binder
                .bind::<Connection>()
                .to_provider(|_| Err(InjectError::provision::<Connection>("refused")))
                .as_eager_singleton();
        })
        .build();
    assert!(matches!(result, Err(InjectError::Provision { .. })));
}

#[test]
fn test_explicit_bindings_from_config() {
    let config = InjectorConfig::new().with_explicit_bindings(true);
    let injector = Injector::builder().config(config.clone()).build().unwrap();
    assert_eq!(injector.config(), &config);
    assert!(matches!(
        injector.get_instance::<SimpleEditor>(),
        Err(InjectError::UnresolvableBinding { .. })
    ));

    let injector = Injector::builder()
        .config(config)
        .configure(|binder| {
            binder.bind::<SimpleEditor>();
        })
        .build()
        .unwrap();
    assert!(injector.get_instance::<SimpleEditor>().is_ok());
}

#[test]
fn test_explicit_bindings_from_module() {
    let injector = Injector::builder()
        .configure(|binder| {
            binder.require_explicit_bindings();
        })
        .build()
        .unwrap();
    assert!(injector.config().require_explicit_bindings);
    assert!(injector.get_instance::<SimpleEditor>().is_err());
    assert!(!injector.has_binding(&Key::<SimpleEditor>::get()));
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"stage": "production", "require_explicit_bindings": true}}"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = InjectorConfig::parse_file(file.path()).unwrap();
    assert_eq!(config.stage, Stage::Production);
    assert!(config.require_explicit_bindings);

    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .config(config)
        .install(connection_module(counter.clone(), false))
        .build()
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(injector.get_instance::<Connection>().is_ok());
}

#[test]
fn test_config_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(InjectorConfig::parse_file(dir.path().join("injector.json")).is_err());
}
