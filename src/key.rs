//! Service naming helpers.

use std::fmt;

/// Default service name for type `T`.
///
/// Services registered without an explicit name are keyed by the
/// `std::any::type_name` of the type they produce. Trait objects are keyed by
/// the trait object's name, e.g. `dyn my_crate::Logger`.
///
/// # Examples
///
/// ```rust
/// use ferrous_scopes::name_of;
///
/// assert_eq!(name_of::<u32>(), "u32");
/// assert_eq!(name_of::<String>(), "alloc::string::String");
/// assert!(name_of::<dyn std::fmt::Debug>().contains("Debug"));
/// ```
pub fn name_of<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}

/// Identifies one service inside one scope of a tree.
///
/// Used as the key of sweep results so that services sharing a name in
/// different scopes stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceRef {
    /// Id of the owning scope
    pub scope_id: u64,
    /// Name of the owning scope
    pub scope_name: String,
    /// Service name within that scope
    pub service: String,
}

impl ServiceRef {
    pub(crate) fn new(scope_id: u64, scope_name: &str, service: &str) -> Self {
        Self {
            scope_id,
            scope_name: scope_name.to_string(),
            service: service.to_string(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope_name, self.service)
    }
}
