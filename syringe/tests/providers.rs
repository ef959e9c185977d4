use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use syringe::{Binder, InjectError, Injectable, Injector, Key, Provider, injectable};

#[derive(Debug, PartialEq, Eq)]
enum UserRole {
    Product,
}

impl Injectable for UserRole {}

struct Resource {
    id: usize,
}

impl Injectable for Resource {}

struct Editor3 {
    user_role: Arc<UserRole>,
    resource_provider: Provider<Resource>,
}

#[injectable]
impl Editor3 {
    #[inject]
    fn new(user_role: Arc<UserRole>, resource_provider: Provider<Resource>) -> Self {
        Self {
            user_role,
            resource_provider,
        }
    }
}

fn resource_module(counter: Arc<AtomicUsize>, singleton: bool) -> impl Fn(&mut Binder) {
    move |binder: &mut Binder| {
        binder
            .bind::<UserRole>()
            .to_provider(|_| Ok(Arc::new(UserRole::Product)));
        let counter = counter.clone();
        let resource = binder.bind::<Resource>().to_provider(move |_| {
            let id = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Resource { id }))
        });
        if singleton {
            resource.in_singleton_scope();
        }
    }
}

#[test]
fn test_providers() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(resource_module(counter.clone(), false))
        .build()
        .unwrap();
    let editor = injector.get_instance::<Editor3>().unwrap();
    assert_eq!(*editor.user_role, UserRole::Product);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let resource = editor.resource_provider.get().unwrap();
    let resource2 = editor.resource_provider.get().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_ne!(resource.id, resource2.id);
    assert!(!Arc::ptr_eq(&resource, &resource2));
}

#[test]
fn test_singleton_provider() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(resource_module(counter.clone(), true))
        .build()
        .unwrap();
    let editor = injector.get_instance::<Editor3>().unwrap();
    let resource = editor.resource_provider.get().unwrap();
    let resource2 = editor.resource_provider.get().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&resource, &resource2));
}

#[test]
fn test_provider_from_injector() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(resource_module(counter.clone(), false))
        .build()
        .unwrap();
    let provider = injector.get_provider::<Resource>();
    assert_eq!(provider.key().id().type_name(), std::any::type_name::<Resource>());
    provider.get().unwrap();
    provider.clone().get().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_provider_with_dependencies() {
    struct Report {
        role: Arc<UserRole>,
        title: Arc<String>,
    }

    impl Injectable for Report {}

    let injector = Injector::builder()
        .configure(|binder| {
            binder
                .bind::<UserRole>()
                .to_instance(UserRole::Product);
            binder
                .bind::<String>()
                .named("title")
                .to_instance("Weekly".to_string());
            binder.bind::<Report>().to_provider(|resolver| {
                Ok(Arc::new(Report {
                    role: resolver.get::<UserRole>()?,
                    title: resolver.get_key(&Key::<String>::named("title"))?,
                }))
            });
        })
        .build()
        .unwrap();
    let report = injector.get_instance::<Report>().unwrap();
    assert_eq!(*report.role, UserRole::Product);
    assert_eq!(report.title.as_str(), "Weekly");
}

#[test]
fn test_provider_failure() {
    let injector = Injector::builder()
        .configure(|binder| {
            binder
                .bind::<Resource>()
                .to_provider(|_| Err(InjectError::provision::<Resource>("disk is full")));
        })
        .build()
        .unwrap();
    let err = injector.get_instance::<Resource>().err().unwrap();
    match err {
        InjectError::Provision { type_name, source } => {
            assert_eq!(type_name, std::any::type_name::<Resource>());
            assert_eq!(source.to_string(), "disk is full");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[test]
fn test_provider_outlives_injector() {
    let counter = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder()
        .install(resource_module(counter, false))
        .build()
        .unwrap();
    let editor = injector.get_instance::<Editor3>().unwrap();
    assert!(editor.resource_provider.get().is_ok());
    drop(injector);
    assert!(matches!(
        editor.resource_provider.get(),
        Err(InjectError::InjectorClosed)
    ));
}
