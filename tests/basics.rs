use ferrous_scopes::{name_of, DiError, Resolver, Scope, ServiceKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_value_is_shared() {
    let scope = Scope::new();
    scope.provide_value(42usize).unwrap();
    scope.provide_value("hello".to_string()).unwrap();

    let num1 = scope.invoke::<usize>().unwrap();
    let num2 = scope.invoke::<usize>().unwrap();
    let str1 = scope.invoke::<String>().unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2)); // Same instance
}

#[test]
fn test_provider_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let scope = Scope::new();
    scope.provide_value(Config { port: 8080 }).unwrap();
    scope
        .provide(|scope| {
            Ok(Server {
                config: scope.invoke::<Config>()?,
                name: "MyServer".to_string(),
            })
        })
        .unwrap();

    let server = scope.invoke::<Server>().unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_lazy_is_built_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let scope = Scope::new();
    scope
        .provide_named("session", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(String::from("session-1"))
        })
        .unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 0); // Registration does no work

    let a = scope.invoke_named::<String>("session").unwrap();
    let b = scope.invoke_named::<String>("session").unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_creates_new_instances() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let scope = Scope::new();
    scope
        .provide_transient(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("request-{}", n))
        })
        .unwrap();

    let first = scope.invoke::<String>().unwrap();
    let second = scope.invoke::<String>().unwrap();

    assert_eq!(*first, "request-1");
    assert_eq!(*second, "request-2");
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!scope.describe(name_of::<String>()).unwrap().built);
}

#[test]
fn test_duplicate_registration_fails() {
    let scope = Scope::new();
    scope.provide_named_value("port", 80u16).unwrap();

    let error = scope.provide_named_value("port", 8080u16).unwrap_err();

    assert!(matches!(error, DiError::DuplicateService(ref name) if name == "port"));
    assert_eq!(*scope.invoke_named::<u16>("port").unwrap(), 80);
}

#[test]
fn test_override_replaces_without_error() {
    let scope = Scope::new();
    scope.provide_named_value("port", 80u16).unwrap();
    scope.override_named_value("port", 8080u16).unwrap();
    scope.override_named_transient("fresh", |_| Ok(1u8)).unwrap();

    assert_eq!(*scope.invoke_named::<u16>("port").unwrap(), 8080);
    assert_eq!(scope.describe("fresh").unwrap().kind, ServiceKind::Transient);
}

#[test]
fn test_override_can_change_kind() {
    let scope = Scope::new();
    scope.provide_value(1u32).unwrap();
    scope.override_provide(|_| Ok(2u32)).unwrap();

    assert_eq!(*scope.invoke::<u32>().unwrap(), 2);
    assert_eq!(scope.describe(name_of::<u32>()).unwrap().kind, ServiceKind::Lazy);
}

#[test]
fn test_not_found_lists_visible_services() {
    let root = Scope::new();
    root.provide_named_value("b", 1u8).unwrap();
    let child = root.scope("child");
    child.provide_named_value("a", 1u8).unwrap();

    match child.invoke_named::<u8>("missing") {
        Err(DiError::ServiceNotFound { name, known }) => {
            assert_eq!(name, "missing");
            assert_eq!(known, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected ServiceNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_type_mismatch() {
    let scope = Scope::new();
    scope.provide_named_value("port", 8080u16).unwrap();

    match scope.invoke_named::<u32>("port") {
        Err(DiError::TypeMismatch { declared, actual }) => {
            assert_eq!(declared, "u32");
            assert_eq!(actual, "u16");
        }
        other => panic!("expected TypeMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[should_panic(expected = "could not find service `nothing`")]
fn test_must_invoke_panics_on_error() {
    let scope = Scope::new();
    let _ = scope.must_invoke_named::<u8>("nothing");
}

#[test]
fn test_must_invoke_returns_instance() {
    let scope = Scope::new();
    scope.provide_value(7i64).unwrap();
    assert_eq!(*scope.must_invoke::<i64>(), 7);
}

#[test]
fn test_trait_object_registration() {
    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    let scope = Scope::new();
    scope
        .service::<dyn Greeter>()
        .lazy_arc(|_| Ok(Arc::new(English) as Arc<dyn Greeter>))
        .unwrap();

    assert_eq!(scope.invoke::<dyn Greeter>().unwrap().greet(), "hello");
    assert!(name_of::<dyn Greeter>().contains("Greeter"));
}

#[test]
fn test_describe_reports_build_and_frames() {
    let scope = Scope::new();
    scope.provide_named("answer", |_| Ok(42u32)).unwrap();

    let before = scope.describe("answer").unwrap();
    assert_eq!(before.kind, ServiceKind::Lazy);
    assert!(!before.built);
    assert!(before.build_time.is_none());
    assert!(before.provider_frame.unwrap().file.ends_with("basics.rs"));

    for _ in 0..3 {
        scope.invoke_named::<u32>("answer").unwrap();
    }
    scope.invoke_named::<u32>("answer").unwrap();

    let after = scope.describe("answer").unwrap();
    assert!(after.built);
    assert!(after.build_time.is_some());
    assert_eq!(after.invocation_count, 4);
    assert_eq!(after.invocation_frames.len(), 2); // Two distinct call sites
    assert!(after.invocation_frames.iter().all(|frame| frame.file.ends_with("basics.rs")));
}

#[test]
fn test_resolve_does_not_build() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let scope = Scope::new();
    scope
        .provide(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1u64)
        })
        .unwrap();

    let description = scope.resolve(name_of::<u64>()).unwrap();

    assert_eq!(description.owner.scope_id, scope.id());
    assert_eq!(builds.load(Ordering::SeqCst), 0);
    assert!(matches!(scope.resolve("missing"), Err(DiError::ServiceNotFound { .. })));
}

#[test]
fn test_list_services() {
    let root = Scope::new();
    root.provide_named_value("b", 1u8).unwrap();
    root.provide_named("c", |_| Ok(1u8)).unwrap();
    let child = root.scope("child");
    child.provide_named_value("a", 1u8).unwrap();

    let provided: Vec<String> = child
        .list_provided_services()
        .into_iter()
        .map(|service| service.to_string())
        .collect();
    assert_eq!(provided, vec!["child/a", "[root]/b", "[root]/c"]);

    // Values are built from the start, lazies once invoked.
    let invoked = |scope: &Scope| -> Vec<String> {
        scope.list_invoked_services().into_iter().map(|s| s.service).collect()
    };
    assert_eq!(invoked(&child), vec!["a", "b"]);

    child.invoke_named::<u8>("c").unwrap();
    assert_eq!(invoked(&child), vec!["a", "b", "c"]);
}

#[test]
fn test_is_provided() {
    let root = Scope::new();
    root.provide_value(true).unwrap();
    let child = root.scope("child");

    assert!(child.is_provided(name_of::<bool>()));
    assert!(!child.is_provided("other"));
}
