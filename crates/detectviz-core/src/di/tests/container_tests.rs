use crate::di::container::{Container, DuplicatePolicy};
use crate::di::descriptor::{ServiceKey, ServiceScope};
use crate::di::error::DiError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// --- Test capabilities ---
trait Greeter: Send + Sync {
    fn greeting(&self) -> String;
}

struct StaticGreeter {
    name: String,
}

impl Greeter for StaticGreeter {
    fn greeting(&self) -> String {
        format!("hello from {}", self.name)
    }
}

trait Counter: Send + Sync {
    fn id(&self) -> usize;
}

struct NumberedCounter(usize);

impl Counter for NumberedCounter {
    fn id(&self) -> usize {
        self.0
    }
}

#[test]
fn test_register_singleton_marks_registered() {
    let container = Container::new();
    assert!(!container.is_registered::<dyn Greeter>());

    container
        .register_singleton::<dyn Greeter, _, _>(|_: ()| {
            Arc::new(StaticGreeter { name: "test".into() }) as Arc<dyn Greeter>
        })
        .expect("registration should succeed");

    assert!(container.is_registered::<dyn Greeter>());
    assert_eq!(container.scope_of::<dyn Greeter>(), Some(ServiceScope::Singleton));
}

#[test]
fn test_register_transient_marks_registered() {
    let container = Container::new();
    container
        .register_transient::<dyn Greeter, _, _>(|_: ()| {
            Arc::new(StaticGreeter { name: "transient".into() }) as Arc<dyn Greeter>
        })
        .expect("registration should succeed");

    assert!(container.is_registered::<dyn Greeter>());
    assert_eq!(container.scope_of::<dyn Greeter>(), Some(ServiceScope::Transient));
}

#[test]
fn test_singleton_factory_invoked_once() {
    let container = Container::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    container
        .register_singleton::<dyn Counter, _, _>(move |_: ()| {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            Arc::new(NumberedCounter(n)) as Arc<dyn Counter>
        })
        .unwrap();

    let first = container.resolve::<dyn Counter>().unwrap();
    let second = container.resolve::<dyn Counter>().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1, "singleton factory should run exactly once");
    assert!(Arc::ptr_eq(&first, &second), "singleton resolutions should share one instance");
}

#[test]
fn test_transient_factory_invoked_every_time() {
    let container = Container::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    container
        .register_transient::<dyn Counter, _, _>(move |_: ()| {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            Arc::new(NumberedCounter(n)) as Arc<dyn Counter>
        })
        .unwrap();

    let first = container.resolve::<dyn Counter>().unwrap();
    let second = container.resolve::<dyn Counter>().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&first, &second), "transient resolutions should be distinct");
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_register_instance_is_identity_preserving() {
    let container = Container::new();
    let instance: Arc<dyn Greeter> = Arc::new(StaticGreeter { name: "instance".into() });

    container.register_instance(instance.clone()).unwrap();

    let resolved = container.resolve::<dyn Greeter>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &instance));
    assert_eq!(resolved.greeting(), "hello from instance");
}

#[test]
fn test_register_concrete_type_instance() {
    let container = Container::new();
    let instance = Arc::new(StaticGreeter { name: "concrete".into() });
    container.register_instance(instance.clone()).unwrap();

    let resolved = container.resolve::<StaticGreeter>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &instance));
    // The concrete type and the trait object are different capabilities.
    assert!(!container.is_registered::<dyn Greeter>());
}

#[test]
fn test_resolve_unregistered_fails() {
    let container = Container::new();
    let result = container.resolve::<dyn Greeter>();
    match result {
        Err(DiError::NotRegistered { service }) => assert!(service.contains("Greeter")),
        Err(other) => panic!("Expected NotRegistered, got {:?}", other),
        Ok(_) => panic!("Resolving an unregistered capability must fail"),
    }
}

#[test]
fn test_factory_error_is_propagated() {
    let container = Container::new();
    container
        .register_singleton::<dyn Greeter, _, _>(|_: ()| -> Result<Arc<dyn Greeter>, String> {
            Err("factory error".to_string())
        })
        .unwrap();

    let err = container.resolve::<dyn Greeter>().err().expect("factory failure must surface");
    match &err {
        DiError::FactoryFailed { source, .. } => assert_eq!(source.to_string(), "factory error"),
        other => panic!("Expected FactoryFailed, got {:?}", other),
    }
    assert!(err.to_string().contains("factory error"));
}

#[test]
fn test_failed_singleton_is_not_cached() {
    let container = Container::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    container
        .register_singleton::<dyn Counter, _, _>(move |_: ()| -> Result<Arc<dyn Counter>, String> {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err("first attempt fails".into())
            } else {
                Ok(Arc::new(NumberedCounter(n)))
            }
        })
        .unwrap();

    assert!(container.resolve::<dyn Counter>().is_err());
    let counter = container.resolve::<dyn Counter>().expect("second attempt should succeed");
    assert_eq!(counter.id(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_duplicate_registration_rejected_by_default() {
    let container = Container::new();
    let original: Arc<dyn Greeter> = Arc::new(StaticGreeter { name: "original".into() });
    container.register_instance(original.clone()).unwrap();

    let second = container.register_singleton::<dyn Greeter, _, _>(|_: ()| {
        Arc::new(StaticGreeter { name: "replacement".into() }) as Arc<dyn Greeter>
    });
    assert!(matches!(second, Err(DiError::AlreadyRegistered { .. })));

    let resolved = container.resolve::<dyn Greeter>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &original), "rejected registration must not touch the original");
}

#[test]
fn test_duplicate_registration_replaced_when_configured() {
    let container = Container::with_policy(DuplicatePolicy::Replace);
    container
        .register_instance::<dyn Greeter>(Arc::new(StaticGreeter { name: "original".into() }))
        .unwrap();
    // Cache the first instance before replacing it.
    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greeting(), "hello from original");

    container
        .register_singleton::<dyn Greeter, _, _>(|_: ()| {
            Arc::new(StaticGreeter { name: "replacement".into() }) as Arc<dyn Greeter>
        })
        .unwrap();

    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greeting(), "hello from replacement");
    assert_eq!(container.get_registered_services().len(), 1);
}

#[test]
fn test_get_registered_services_and_clear() {
    let container = Container::new();
    container
        .register_singleton::<dyn Greeter, _, _>(|_: ()| {
            Arc::new(StaticGreeter { name: "test".into() }) as Arc<dyn Greeter>
        })
        .unwrap();
    container
        .register_transient::<dyn Counter, _, _>(|_: ()| Arc::new(NumberedCounter(0)) as Arc<dyn Counter>)
        .unwrap();

    let services = container.get_registered_services();
    assert_eq!(services.len(), 2);
    assert!(services.contains(&ServiceKey::of::<dyn Greeter>()));
    assert!(services.contains(&ServiceKey::of::<dyn Counter>()));

    container.clear();
    assert!(!container.is_registered::<dyn Greeter>());
    assert!(container.get_registered_services().is_empty());
    assert!(container.resolve::<dyn Counter>().is_err());
}

#[test]
fn test_container_name() {
    assert_eq!(Container::new().name(), "dependency_injection_container");
}
