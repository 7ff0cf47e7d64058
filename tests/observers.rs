use ferrous_scopes::{
    BoxError, CancellationToken, DiError, HookError, InjectorOptions, Resolver, Scope,
    ScopeObserver, ServiceKind, ServiceRef, Shutdown,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl ScopeObserver for EventLog {
    fn registered(&self, service: &ServiceRef, kind: ServiceKind) {
        self.events.lock().push(format!("registered {} as {}", service, kind));
    }

    fn built(&self, service: &ServiceRef, _elapsed: Duration) {
        self.events.lock().push(format!("built {}", service));
    }

    fn build_failed(&self, service: &ServiceRef, _error: &DiError) {
        self.events.lock().push(format!("failed {}", service));
    }

    fn shut_down(&self, service: &ServiceRef, error: Option<&HookError>) {
        let outcome = if error.is_some() { "with error" } else { "cleanly" };
        self.events.lock().push(format!("shut down {} {}", service, outcome));
    }
}

struct Conn;

impl Shutdown for Conn {
    fn shutdown(&self) {}
}

#[test]
fn test_observer_sees_lifecycle_events() {
    let log = Arc::new(EventLog::default());
    let scope = Scope::new_with_options(InjectorOptions::new().with_observer(log.clone()));

    scope.service::<Conn>().named("conn").shutdown().lazy(|_| Ok(Conn)).unwrap();
    scope.provide_named("broken", |_| -> Result<u8, BoxError> { Err("nope".into()) }).unwrap();

    scope.invoke_named::<Conn>("conn").unwrap();
    scope.invoke_named::<Conn>("conn").unwrap();
    assert!(scope.invoke_named::<u8>("broken").is_err());
    scope.shutdown(&CancellationToken::new()).unwrap();

    assert_eq!(
        log.events(),
        vec![
            "registered [root]/conn as lazy",
            "registered [root]/broken as lazy",
            "built [root]/conn",
            "failed [root]/broken",
            "shut down [root]/conn cleanly",
        ]
    );
}

#[test]
fn test_observers_are_shared_by_child_scopes() {
    let log = Arc::new(EventLog::default());
    let root = Scope::new_with_options(InjectorOptions::new().with_observer(log.clone()));
    let child = root.scope("child");

    child.provide_named_value("n", 1u8).unwrap();

    assert_eq!(log.events(), vec!["registered child/n as value"]);
    assert_eq!(child.options().observer_count(), 1);
}

#[test]
fn test_every_observer_is_notified() {
    let first = Arc::new(EventLog::default());
    let second = Arc::new(EventLog::default());
    let options = InjectorOptions::new()
        .with_observer(first.clone())
        .with_observer(second.clone());
    let scope = Scope::new_with_options(options);

    scope.provide_named_transient("t", |_| Ok(0u8)).unwrap();

    assert_eq!(first.events(), second.events());
    assert_eq!(first.events().len(), 1);
}

#[test]
fn test_trace_capacity_bounds_recorded_frames() {
    let scope = Scope::new_with_options(InjectorOptions::new().with_trace_capacity(1));
    scope.provide_named("svc", |_| Ok(1u8)).unwrap();

    scope.invoke_named::<u8>("svc").unwrap();
    scope.invoke_named::<u8>("svc").unwrap();
    scope.invoke_named::<u8>("svc").unwrap();

    let description = scope.describe("svc").unwrap();
    assert_eq!(description.invocation_frames.len(), 1);
    assert_eq!(description.invocation_count, 3);
}
