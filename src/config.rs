//! Runtime options for a scope tree.
//!
//! Options are set on the root scope and inherited by every scope derived
//! from it. The plain-data part, [`InjectorSettings`], can be loaded from
//! environment variables or, with the `config` feature, from JSON.

use std::env;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::invocation::DEFAULT_TRACE_CAPACITY;
use crate::observer::{Observers, ScopeObserver};

/// Default limit on nested invocations before `DepthExceeded` is reported.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting had a value that could not be parsed or is out of range
    #[error("invalid value `{value}` for setting `{key}`")]
    InvalidValue {
        /// Setting name (environment variable or JSON field)
        key: String,
        /// Offending raw value
        value: String,
    },
    /// The JSON document could not be decoded
    #[cfg(feature = "config")]
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable scope-tree settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorSettings {
    /// Distinct call sites kept per lazy service
    pub trace_capacity: usize,
    /// Maximum nesting of invocations on one thread
    pub max_depth: usize,
    /// Per-probe health-check deadline in milliseconds, if any
    pub health_check_timeout_ms: Option<u64>,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            health_check_timeout_ms: None,
        }
    }
}

impl InjectorSettings {
    /// Applies `{PREFIX}_TRACE_CAPACITY`, `{PREFIX}_MAX_DEPTH` and
    /// `{PREFIX}_HEALTH_CHECK_TIMEOUT_MS` from the environment over `self`.
    /// Unset variables leave the current value untouched.
    pub fn with_env_overrides(mut self, prefix: &str) -> Result<Self, ConfigError> {
        if let Some(capacity) = read_env(prefix, "trace_capacity")? {
            self.trace_capacity = capacity as usize;
        }
        if let Some(depth) = read_env(prefix, "max_depth")? {
            self.max_depth = depth as usize;
        }
        if let Some(timeout) = read_env(prefix, "health_check_timeout_ms")? {
            self.health_check_timeout_ms = Some(timeout);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_depth".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn read_env(prefix: &str, key: &str) -> Result<Option<u64>, ConfigError> {
    let env_key = format!("{}_{}", prefix.to_uppercase(), key.to_uppercase());
    match env::var(&env_key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key: env_key, value }),
        Err(_) => Ok(None),
    }
}

/// Options shared by a scope tree.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{InjectorOptions, Scope};
/// use std::time::Duration;
///
/// let options = InjectorOptions::new()
///     .with_trace_capacity(10)
///     .with_health_check_timeout(Duration::from_secs(2));
///
/// let root = Scope::new_with_options(options);
/// let child = root.scope("worker");
/// assert_eq!(child.options().trace_capacity(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InjectorOptions {
    settings: InjectorSettings,
    observers: Observers,
}

impl InjectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying `settings` and no observers.
    pub fn from_settings(settings: InjectorSettings) -> Self {
        Self { settings, observers: Observers::default() }
    }

    /// Default settings with environment overrides under `prefix`.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_settings(InjectorSettings::default().with_env_overrides(prefix)?))
    }

    /// Parses settings from a JSON document; missing fields keep defaults.
    ///
    /// ```
    /// # #[cfg(feature = "config")]
    /// # {
    /// use ferrous_scopes::InjectorOptions;
    ///
    /// let options = InjectorOptions::from_json(r#"{ "max_depth": 64 }"#).unwrap();
    /// assert_eq!(options.max_depth(), 64);
    /// assert_eq!(options.trace_capacity(), 100);
    /// # }
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: InjectorSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }

    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.settings.trace_capacity = capacity;
        self
    }

    /// Sets the invocation depth limit; values below 1 are raised to 1.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.settings.max_depth = depth.max(1);
        self
    }

    /// Gives each health probe a child token that expires after `timeout`.
    ///
    /// The timeout is kept in whole milliseconds: a fraction of a millisecond
    /// rounds up and durations past `u64::MAX` milliseconds saturate.
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        let mut millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if Duration::from_millis(millis) < timeout {
            millis = millis.saturating_add(1);
        }
        self.settings.health_check_timeout_ms = Some(millis);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScopeObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn settings(&self) -> &InjectorSettings {
        &self.settings
    }

    pub fn trace_capacity(&self) -> usize {
        self.settings.trace_capacity
    }

    pub fn max_depth(&self) -> usize {
        self.settings.max_depth
    }

    pub fn health_check_timeout(&self) -> Option<Duration> {
        self.settings.health_check_timeout_ms.map(Duration::from_millis)
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.observers
    }
}
