//! Scope tree, service resolution and introspection.
//!
//! A [`Scope`] is a node in a tree of registries. Lookups start at the scope
//! they are made on and walk towards the root; the nearest registration of a
//! name wins. Children are owned by their parent (for shutdown ordering),
//! parents are only weakly referenced by their children.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::config::InjectorOptions;
use crate::descriptors::ServiceDescription;
use crate::error::{DiError, DiResult};
use crate::internal::ChainGuard;
use crate::invocation::Frame;
use crate::key::ServiceRef;
use crate::observer::Observers;
use crate::package::Package;
use crate::registration::Registry;
use crate::service::{AnyArc, ServiceEntry};
use crate::traits::{Resolver, ResolverCore};

mod builder;
pub mod global;
mod lifecycle;

pub use builder::ServiceBuilder;

/// Name given to scopes created without one.
pub const ROOT_SCOPE_NAME: &str = "[root]";

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ScopeInner {
    id: u64,
    name: String,
    parent: Option<Weak<ScopeInner>>,
    children: RwLock<Vec<Scope>>,
    registry: RwLock<Registry>,
    options: Arc<InjectorOptions>,
}

/// A node of the service tree: a registry plus links to parent and children.
///
/// `Scope` is a cheap handle; clones refer to the same node. It is `Send` and
/// `Sync`, and every operation may be called concurrently.
///
/// # Resolution
///
/// - **Nearest wins**: a name registered in this scope shadows the same name
///   in any ancestor
/// - **Owner builds**: a provider always runs against the scope that owns it,
///   so a root service never sees registrations made in a child
/// - **Siblings are isolated**: a scope never looks into its siblings
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{Resolver, Scope};
///
/// let root = Scope::new();
/// root.provide_named_value("greeting", "hello".to_string()).unwrap();
///
/// let english = root.scope("en");
/// let french = root.scope("fr");
/// french.provide_named_value("greeting", "bonjour".to_string()).unwrap();
///
/// assert_eq!(*english.invoke_named::<String>("greeting").unwrap(), "hello");
/// assert_eq!(*french.invoke_named::<String>("greeting").unwrap(), "bonjour");
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Creates a root scope with default options.
    pub fn new() -> Self {
        Self::new_with_options(InjectorOptions::default())
    }

    /// Creates a root scope with a custom name.
    pub fn new_named(name: impl Into<String>) -> Self {
        Self::with_parts(name.into(), None, Arc::new(InjectorOptions::default()), Registry::new())
    }

    /// Creates a root scope; every scope derived from it shares `options`.
    pub fn new_with_options(options: InjectorOptions) -> Self {
        Self::with_parts(ROOT_SCOPE_NAME.to_string(), None, Arc::new(options), Registry::new())
    }

    /// Creates a root scope and installs `packages` into it, in order.
    pub fn new_with_packages(packages: &[Package]) -> DiResult<Self> {
        let scope = Self::new();
        for package in packages {
            scope.install(package)?;
        }
        Ok(scope)
    }

    fn with_parts(
        name: String,
        parent: Option<Weak<ScopeInner>>,
        options: Arc<InjectorOptions>,
        registry: Registry,
    ) -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(scope = %name, id, "scope created");
        Self {
            inner: Arc::new(ScopeInner {
                id,
                name,
                parent,
                children: RwLock::new(Vec::new()),
                registry: RwLock::new(registry),
                options,
            }),
        }
    }

    /// Derives a child scope. The child inherits this scope's options and
    /// is shut down before this scope's own services.
    ///
    /// The parent keeps the child alive until it is [`detach`](Self::detach)ed,
    /// whether or not any handle to it remains. Short-lived scopes (one per
    /// request, say) should end with [`close`](Self::close).
    pub fn scope(&self, name: impl Into<String>) -> Scope {
        let child = Self::with_parts(
            name.into(),
            Some(Arc::downgrade(&self.inner)),
            self.inner.options.clone(),
            Registry::new(),
        );
        self.inner.children.write().push(child.clone());
        child
    }

    /// Like [`scope`](Self::scope), then installs `packages` into the child.
    pub fn scope_with_packages(
        &self,
        name: impl Into<String>,
        packages: &[Package],
    ) -> DiResult<Scope> {
        let child = self.scope(name);
        for package in packages {
            child.install(package)?;
        }
        Ok(child)
    }

    /// Process-unique identifier.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &InjectorOptions {
        &self.inner.options
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Parent scope, or `None` for a root (or if the parent was dropped).
    pub fn parent(&self) -> Option<Scope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> Vec<Scope> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(scope) = current {
            current = scope.parent();
            ancestors.push(scope);
        }
        ancestors
    }

    /// Topmost ancestor, or this scope when it is a root.
    pub fn root(&self) -> Scope {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// Direct children, in creation order.
    pub fn children(&self) -> Vec<Scope> {
        self.inner.children.read().clone()
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<Scope> {
        self.inner
            .children
            .read()
            .iter()
            .find(|child| child.name() == name)
            .cloned()
    }

    /// Removes this scope from its parent's children.
    ///
    /// The scope keeps resolving through its ancestors, but the parent's
    /// health checks and shutdowns no longer reach it. Returns `false` for a
    /// root, for a scope already detached, or once the parent is gone.
    pub fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        let mut siblings = parent.inner.children.write();
        let before = siblings.len();
        siblings.retain(|child| !child.ptr_eq(self));
        let detached = siblings.len() != before;
        if detached {
            tracing::trace!(
                scope = %self.name(),
                id = self.id(),
                parent = %parent.name(),
                "scope detached"
            );
        }
        detached
    }

    /// Whether both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn service_ref(&self, service: &str) -> ServiceRef {
        ServiceRef::new(self.inner.id, &self.inner.name, service)
    }

    pub(crate) fn observers(&self) -> &Observers {
        self.inner.options.observers()
    }

    pub(crate) fn register(&self, entry: Arc<dyn ServiceEntry>, replace: bool) -> DiResult<()> {
        let service = self.service_ref(entry.name());
        let kind = entry.kind();

        if replace {
            let previous = self.inner.registry.write().replace(entry);
            if let Some(previous) = previous {
                if previous.is_built() && previous.is_shutdowner() {
                    tracing::warn!(
                        scope = %self.name(),
                        service = %service.service,
                        "overriding a built service without shutting it down"
                    );
                }
            }
        } else {
            self.inner.registry.write().insert(entry)?;
        }

        tracing::debug!(
            scope = %self.name(),
            service = %service.service,
            %kind,
            replace,
            "service registered"
        );
        self.observers().registered(&service, kind);
        Ok(())
    }

    /// Nearest descriptor called `name`, with the scope owning it.
    pub(crate) fn lookup(&self, name: &str) -> Option<(Scope, Arc<dyn ServiceEntry>)> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let found = scope.inner.registry.read().get(name).cloned();
            if let Some(entry) = found {
                return Some((scope, entry));
            }
            current = scope.parent();
        }
        None
    }

    pub(crate) fn local_entry(&self, name: &str) -> Option<Arc<dyn ServiceEntry>> {
        self.inner.registry.read().get(name).cloned()
    }

    pub(crate) fn local_entries(&self) -> Vec<Arc<dyn ServiceEntry>> {
        self.inner.registry.read().entries()
    }

    pub(crate) fn local_names(&self) -> Vec<String> {
        self.inner.registry.read().names()
    }

    /// Sorted union of the names visible from this scope.
    pub(crate) fn visible_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        names.extend(self.local_names());
        for ancestor in self.ancestors() {
            names.extend(ancestor.local_names());
        }
        names.into_iter().collect()
    }

    /// Looks `name` up and produces its instance under the resolution-chain
    /// guard of the owning scope.
    pub(crate) fn invoke_any(&self, name: &str, caller: Frame) -> DiResult<(AnyArc, &'static str)> {
        let (owner, entry) = self
            .lookup(name)
            .ok_or_else(|| DiError::not_found(name, self.visible_names()))?;

        let _guard = ChainGuard::enter(owner.id(), name, self.options().max_depth())?;
        let instance = entry.instance(&owner, caller)?;
        Ok((instance, entry.type_name()))
    }

    /// Describes the descriptor an invocation of `name` would use, without
    /// building anything.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` with every visible name if no scope in the chain
    /// declares `name`.
    pub fn resolve(&self, name: &str) -> DiResult<ServiceDescription> {
        match self.lookup(name) {
            Some((owner, entry)) => Ok(entry.describe(&owner)),
            None => Err(DiError::not_found(name, self.visible_names())),
        }
    }

    /// Describes a service registered directly in this scope.
    pub fn describe(&self, name: &str) -> Option<ServiceDescription> {
        self.local_entry(name).map(|entry| entry.describe(self))
    }

    /// Whether `name` is visible from this scope.
    pub fn is_provided(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Every service visible from this scope, nearest scope first, sorted by
    /// name within a scope. Shadowed ancestors' entries are included.
    pub fn list_provided_services(&self) -> Vec<ServiceRef> {
        self.chain()
            .iter()
            .flat_map(|scope| {
                scope
                    .local_names()
                    .into_iter()
                    .map(move |name| scope.service_ref(&name))
            })
            .collect()
    }

    /// Visible services that currently hold an instance.
    pub fn list_invoked_services(&self) -> Vec<ServiceRef> {
        let mut invoked = Vec::new();
        for scope in self.chain() {
            let mut entries = scope.local_entries();
            entries.retain(|entry| entry.is_built());
            entries.sort_by(|a, b| a.name().cmp(b.name()));
            invoked.extend(entries.iter().map(|entry| scope.service_ref(entry.name())));
        }
        invoked
    }

    fn chain(&self) -> Vec<Scope> {
        let mut chain = vec![self.clone()];
        chain.extend(self.ancestors());
        chain
    }

    /// Installs a package into this scope.
    pub fn install(&self, package: &Package) -> DiResult<()> {
        package.register(self)
    }

    /// Copies this scope and its subtree with every descriptor reset: nothing
    /// built, empty invocation traces. The copy is attached to the same
    /// parent, or is a new root.
    pub fn duplicate(&self) -> Scope {
        let copy = self.duplicate_under(self.inner.parent.clone());
        if let Some(parent) = self.parent() {
            parent.inner.children.write().push(copy.clone());
        }
        copy
    }

    fn duplicate_under(&self, parent: Option<Weak<ScopeInner>>) -> Scope {
        let mut registry = Registry::new();
        for entry in self.local_entries() {
            registry.replace(entry.clone_reset());
        }

        let copy =
            Self::with_parts(self.inner.name.clone(), parent, self.inner.options.clone(), registry);
        let children: Vec<Scope> = self
            .children()
            .iter()
            .map(|child| child.duplicate_under(Some(Arc::downgrade(&copy.inner))))
            .collect();
        *copy.inner.children.write() = children;
        copy
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, name: &str, caller: Frame) -> DiResult<(AnyArc, &'static str)> {
        self.invoke_any(name, caller)
    }
}

impl Resolver for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("services", &self.inner.registry.read().len())
            .field("children", &self.inner.children.read().len())
            .finish()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let pending: Vec<String> = self
            .registry
            .get_mut()
            .iter()
            .filter(|(_, entry)| entry.is_built() && entry.is_shutdowner())
            .map(|(name, _)| name.to_string())
            .collect();

        if !pending.is_empty() {
            tracing::warn!(
                scope = %self.name,
                services = ?pending,
                "scope dropped with services that were never shut down"
            );
        }
    }
}
