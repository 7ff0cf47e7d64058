//! Service lifecycle policies.

use std::fmt;

/// Lifecycle policy of a registered service, controlling construction and caching.
///
/// # Kind Characteristics
///
/// - **Value**: pre-built, never constructed by the scope
/// - **Lazy**: built on first invocation, cached until the scope shuts down
/// - **Transient**: built on every invocation, never cached
/// - **Alias**: never builds, delegates to another named service
///
/// # Examples
///
/// ```rust
/// use ferrous_scopes::{Scope, ServiceKind};
///
/// struct Database { url: String }
///
/// let scope = Scope::new();
/// scope.provide_value(Database { url: "postgres://localhost".to_string() }).unwrap();
/// scope.provide_named_transient("request-id", |_| Ok(7u64)).unwrap();
///
/// let db = scope.describe(ferrous_scopes::name_of::<Database>()).unwrap();
/// assert_eq!(db.kind, ServiceKind::Value);
/// assert_eq!(scope.describe("request-id").unwrap().kind, ServiceKind::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceKind {
    /// Pre-built instance, returned as is
    Value,
    /// Built at most once, memoised until shutdown
    ///
    /// Concurrent first invocations block on the descriptor until the single
    /// in-flight build completes, then all observe the same instance.
    Lazy,
    /// Built on every invocation, never cached
    Transient,
    /// Delegates to a target service and checks its type at invocation time
    Alias,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceKind::Value => "value",
            ServiceKind::Lazy => "lazy",
            ServiceKind::Transient => "transient",
            ServiceKind::Alias => "alias",
        };
        f.write_str(label)
    }
}
