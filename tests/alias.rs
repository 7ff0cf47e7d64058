use ferrous_scopes::{
    name_of, BoxError, CancellationToken, DiError, HealthCheck, Resolver, Scope, ServiceKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Store: Send + Sync {
    fn get(&self) -> u32;
}

struct Memory(u32);

impl Store for Memory {
    fn get(&self) -> u32 {
        self.0
    }
}

impl HealthCheck for Memory {
    fn health_check(&self) -> Result<(), BoxError> {
        if self.0 == 0 {
            Err("empty store".into())
        } else {
            Ok(())
        }
    }
}

fn as_store(memory: Arc<Memory>) -> Arc<dyn Store> {
    memory
}

#[test]
fn test_alias_exposes_trait_object() {
    let scope = Scope::new();
    scope.provide(|_| Ok(Memory(7))).unwrap();
    scope.as_alias::<Memory, dyn Store>(as_store).unwrap();

    let store = scope.invoke::<dyn Store>().unwrap();

    assert_eq!(store.get(), 7);
    assert_eq!(scope.describe(name_of::<dyn Store>()).unwrap().kind, ServiceKind::Alias);
}

#[test]
fn test_alias_shares_the_target_instance() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let scope = Scope::new();
    scope
        .provide(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Memory(1))
        })
        .unwrap();
    scope.as_alias::<Memory, dyn Store>(as_store).unwrap();

    scope.invoke::<dyn Store>().unwrap();
    scope.invoke::<dyn Store>().unwrap();
    scope.invoke::<Memory>().unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_alias_may_be_declared_before_target() {
    let scope = Scope::new();
    scope.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();
    scope.provide_named("memory", |_| Ok(Memory(3))).unwrap();

    assert_eq!(scope.invoke_named::<dyn Store>("store").unwrap().get(), 3);
}

#[test]
fn test_alias_to_missing_target() {
    let scope = Scope::new();
    scope.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();

    match scope.invoke_named::<dyn Store>("store") {
        Err(DiError::ServiceNotFound { name, known }) => {
            assert_eq!(name, "memory");
            assert_eq!(known, vec!["store".to_string()]);
        }
        other => panic!("expected ServiceNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_alias_with_wrong_target_type() {
    let scope = Scope::new();
    scope.provide_named_value("memory", 5u64).unwrap();
    scope.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();

    match scope.invoke_named::<dyn Store>("store") {
        Err(DiError::TypeMismatch { declared, actual }) => {
            assert_eq!(declared, name_of::<Memory>());
            assert_eq!(actual, "u64");
        }
        other => panic!("expected TypeMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_alias_follows_transient_policy() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let scope = Scope::new();
    scope
        .provide_transient(move |_| {
            Ok(Memory(counter.fetch_add(1, Ordering::SeqCst) as u32))
        })
        .unwrap();
    scope.as_alias::<Memory, dyn Store>(as_store).unwrap();

    assert_eq!(scope.invoke::<dyn Store>().unwrap().get(), 0);
    assert_eq!(scope.invoke::<dyn Store>().unwrap().get(), 1);
}

#[test]
fn test_alias_resolves_target_from_its_own_scope() {
    let root = Scope::new();
    root.provide_named_value("memory", Memory(1)).unwrap();
    root.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();

    let child = root.scope("child");
    child.provide_named_value("memory", Memory(2)).unwrap();

    // The alias is owned by the root, so it sees the root's target.
    assert_eq!(child.invoke_named::<dyn Store>("store").unwrap().get(), 1);
}

#[test]
fn test_alias_describes_target() {
    let scope = Scope::new();
    scope.provide_named("memory", |_| Ok(Memory(1))).unwrap();
    scope.bind_alias::<Memory, dyn Store>("memory", as_store).unwrap();

    let before = scope.describe(name_of::<dyn Store>()).unwrap();
    assert_eq!(before.target.as_deref(), Some("memory"));
    assert!(!before.built);

    scope.invoke::<dyn Store>().unwrap();
    let after = scope.describe(name_of::<dyn Store>()).unwrap();
    assert!(after.built);
}

#[test]
fn test_alias_delegates_health_check_to_built_target() {
    let scope = Scope::new();
    scope.service::<Memory>().named("memory").health_check().lazy(|_| Ok(Memory(0))).unwrap();
    scope.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();
    let token = CancellationToken::new();

    // Nothing built yet.
    assert!(scope.health_check_named("store", &token).is_ok());

    scope.invoke_named::<dyn Store>("store").unwrap();
    match scope.health_check_named("store", &token) {
        Err(DiError::Aggregate(errors)) => {
            assert_eq!(errors.get("store").unwrap().to_string(), "empty store");
        }
        other => panic!("expected aggregate error, got {:?}", other),
    }
}

#[test]
fn test_alias_is_never_shut_down() {
    let scope = Scope::new();
    scope.provide_named("memory", |_| Ok(Memory(1))).unwrap();
    scope.as_named_alias::<Memory, dyn Store>("memory", "store", as_store).unwrap();
    scope.invoke_named::<dyn Store>("store").unwrap();

    scope.shutdown(&CancellationToken::new()).unwrap();

    assert!(scope
        .list_invoked_services()
        .iter()
        .all(|service| service.service != "store"));
}

#[test]
fn test_must_alias_variants_register() {
    let scope = Scope::new();
    scope.provide(|_| Ok(Memory(3))).unwrap();
    scope.provide_named_value("backup", Memory(4)).unwrap();

    scope.must_as_alias::<Memory, dyn Store>(as_store);
    scope.must_as_named_alias::<Memory, dyn Store>("backup", "backup-store", as_store);
    let failover = scope.scope("failover");
    failover.must_bind_alias::<Memory, dyn Store>("backup", as_store);

    assert_eq!(scope.invoke::<dyn Store>().unwrap().get(), 3);
    assert_eq!(scope.invoke_named::<dyn Store>("backup-store").unwrap().get(), 4);
    assert_eq!(failover.invoke::<dyn Store>().unwrap().get(), 4);
    assert_eq!(scope.describe("backup-store").unwrap().kind, ServiceKind::Alias);
}

#[test]
#[should_panic(expected = "DI: service `backup-store` has already been declared")]
fn test_must_as_named_alias_panics_on_duplicate() {
    let scope = Scope::new();
    scope.provide_named_value("backup-store", 0u8).unwrap();
    scope.must_as_named_alias::<Memory, dyn Store>("backup", "backup-store", as_store);
}
