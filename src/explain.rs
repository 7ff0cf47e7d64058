//! Human-readable dumps of a scope tree.

use std::fmt;

use crate::descriptors::ServiceDescription;
use crate::scope::Scope;

/// Snapshot of a scope, its services and its descendants.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{Resolver, Scope};
///
/// let root = Scope::new();
/// root.provide_named("answer", |_| Ok(42u32)).unwrap();
/// root.scope("jobs").provide_named_value("queue", Vec::<u8>::new()).unwrap();
/// root.invoke_named::<u32>("answer").unwrap();
///
/// let explanation = root.explain();
/// assert_eq!(explanation.service_count(), 2);
///
/// let text = explanation.to_string();
/// assert!(text.contains("answer (lazy, built, invoked 1x)"));
/// assert!(text.contains("scope `jobs`"));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScopeExplanation {
    pub id: u64,
    pub name: String,
    /// Local services, sorted by name
    pub services: Vec<ServiceDescription>,
    pub children: Vec<ScopeExplanation>,
}

impl ScopeExplanation {
    /// Services in this scope and all descendants.
    pub fn service_count(&self) -> usize {
        let nested: usize = self.children.iter().map(ScopeExplanation::service_count).sum();
        self.services.len() + nested
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(f, "{}scope `{}` (#{})", indent, self.name, self.id)?;
        for service in &self.services {
            write!(f, "{}  - {} ({}", indent, service.name(), service.kind)?;
            if service.built {
                f.write_str(", built")?;
            }
            if let Some(target) = &service.target {
                write!(f, ", -> {}", target)?;
            }
            if service.invocation_count > 0 {
                write!(f, ", invoked {}x", service.invocation_count)?;
            }
            writeln!(f, ")")?;
        }
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(feature = "graph-export")]
impl ScopeExplanation {
    /// Pretty-printed JSON rendering of the tree.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ScopeExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl Scope {
    /// Describes this scope and its subtree.
    pub fn explain(&self) -> ScopeExplanation {
        let mut services: Vec<ServiceDescription> = self
            .local_entries()
            .iter()
            .map(|entry| entry.describe(self))
            .collect();
        services.sort_by(|a, b| a.name().cmp(b.name()));

        ScopeExplanation {
            id: self.id(),
            name: self.name().to_string(),
            services,
            children: self.children().iter().map(Scope::explain).collect(),
        }
    }
}
