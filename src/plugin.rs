//! Lifecycle-managed extensions that merge capabilities into the runtime.
//!
//! A [`Plugin`] bundles metadata (name, version, dependency names), lifecycle
//! hooks, and declared capabilities: middleware entries, named error-kind
//! factories, a configuration patch, and named utility functions. Install
//! merges capabilities additively; uninstall reverses exactly what the plugin
//! contributed. Name collisions on factories and utilities are
//! last-write-wins, logged as a warning.
//!
//! Installation is the one place the runtime surfaces a hard failure
//! ([`InstallError::MissingDependency`]): partially merging a plugin's
//! capabilities would corrupt shared pipeline and registry state, so nothing
//! is merged unless the dependency check passes.
//!
//! # Examples
//!
//! ```
//! use faultline::plugin::Plugin;
//! use faultline::{ErrorValue, Runtime};
//!
//! let runtime = Runtime::new();
//! let plugin = Plugin::builder("http-kinds", "1.0.0")
//!     .error_kind("NotFound", |message| ErrorValue::new("NotFound", message))
//!     .build();
//!
//! runtime.install(plugin).unwrap();
//! let err = runtime.error_from_factory("NotFound", "no such order").unwrap();
//! assert_eq!(err.kind(), "NotFound");
//! ```

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::{Config, ConfigPatch};
use crate::middleware::MiddlewareFn;
use crate::runtime::Runtime;
use crate::types::{kind, ErrorValue};

/// Parameterless lifecycle hook.
pub type LifecycleHook = Arc<dyn Fn() + Send + Sync>;

/// Hook invoked with the new effective configuration after `configure`.
pub type ConfigChangeHook = Arc<dyn Fn(&Config) + Send + Sync>;

/// Named factory producing an error value from a message.
pub type ErrorFactory = Arc<dyn Fn(&str) -> ErrorValue + Send + Sync>;

/// Named utility function merged into the runtime's registry.
pub type Utility = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) on_install: Option<LifecycleHook>,
    pub(crate) on_enable: Option<LifecycleHook>,
    pub(crate) on_disable: Option<LifecycleHook>,
    pub(crate) on_uninstall: Option<LifecycleHook>,
    pub(crate) on_config_change: Option<ConfigChangeHook>,
}

/// A named, lifecycle-managed bundle of capabilities.
pub struct Plugin {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) hooks: Hooks,
    pub(crate) middleware: Vec<(Option<i32>, MiddlewareFn)>,
    pub(crate) factories: Vec<(String, ErrorFactory)>,
    pub(crate) utilities: Vec<(String, Utility)>,
    pub(crate) config_patch: Option<ConfigPatch>,
}

impl Plugin {
    /// Starts building a plugin with the given name and version.
    pub fn builder<N: Into<String>, V: Into<String>>(name: N, version: V) -> PluginBuilder {
        PluginBuilder {
            plugin: Plugin {
                name: name.into(),
                version: version.into(),
                dependencies: Vec::new(),
                hooks: Hooks::default(),
                middleware: Vec::new(),
                factories: Vec::new(),
                utilities: Vec::new(),
                config_patch: None,
            },
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Builder for [`Plugin`].
#[must_use]
pub struct PluginBuilder {
    plugin: Plugin,
}

impl PluginBuilder {
    /// Declares a dependency that must be installed first.
    pub fn depends_on<S: Into<String>>(mut self, name: S) -> Self {
        self.plugin.dependencies.push(name.into());
        self
    }

    pub fn on_install<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.plugin.hooks.on_install = Some(Arc::new(f));
        self
    }

    pub fn on_enable<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.plugin.hooks.on_enable = Some(Arc::new(f));
        self
    }

    pub fn on_disable<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.plugin.hooks.on_disable = Some(Arc::new(f));
        self
    }

    pub fn on_uninstall<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.plugin.hooks.on_uninstall = Some(Arc::new(f));
        self
    }

    pub fn on_config_change<F: Fn(&Config) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.plugin.hooks.on_config_change = Some(Arc::new(f));
        self
    }

    /// Contributes a middleware entry, appended at install time.
    pub fn middleware(mut self, entry: MiddlewareFn) -> Self {
        self.plugin.middleware.push((None, entry));
        self
    }

    /// Contributes a middleware entry carrying an explicit priority.
    pub fn middleware_with_priority(mut self, priority: i32, entry: MiddlewareFn) -> Self {
        self.plugin.middleware.push((Some(priority), entry));
        self
    }

    /// Contributes a named error-kind factory.
    pub fn error_kind<S, F>(mut self, name: S, factory: F) -> Self
    where
        S: Into<String>,
        F: Fn(&str) -> ErrorValue + Send + Sync + 'static,
    {
        self.plugin.factories.push((name.into(), Arc::new(factory)));
        self
    }

    /// Contributes a named utility function.
    pub fn utility<S, F>(mut self, name: S, f: F) -> Self
    where
        S: Into<String>,
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.plugin.utilities.push((name.into(), Arc::new(f)));
        self
    }

    /// Contributes a configuration patch applied at install time.
    pub fn config_patch(mut self, patch: ConfigPatch) -> Self {
        self.plugin.config_patch = Some(patch);
        self
    }

    pub fn build(self) -> Plugin {
        self.plugin
    }
}

/// Hard failure surfaced by [`Runtime::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// One or more declared dependencies are not installed.
    MissingDependency {
        /// The plugin that failed to install.
        plugin: String,
        /// The dependency names that were not found.
        missing: Vec<String>,
    },
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency { plugin, missing } => {
                write!(f, "plugin '{}' requires missing dependencies: {}", plugin, missing.join(", "))
            },
        }
    }
}

impl std::error::Error for InstallError {}

impl InstallError {
    /// Renders the failure as an error value with the reserved
    /// [`MissingDependency`](crate::kind::MISSING_DEPENDENCY) kind.
    pub fn to_error_value(&self) -> ErrorValue {
        ErrorValue::new(kind::MISSING_DEPENDENCY, self.to_string())
    }
}

/// Outcome of a successful [`Runtime::install`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReport {
    /// The plugin was installed and enabled.
    Installed,
    /// A plugin with this name was already installed; nothing changed.
    Duplicate,
}

/// Summary row returned by [`Runtime::list_plugins`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub enabled: bool,
}

struct Installed {
    plugin: Plugin,
    enabled: bool,
    middleware_ids: Vec<u64>,
    factory_keys: Vec<String>,
    utility_keys: Vec<String>,
}

/// Registries backing the plugin system.
pub(crate) struct PluginRegistry {
    installed: RwLock<Vec<Installed>>,
    factories: RwLock<HashMap<String, (String, ErrorFactory)>>,
    utilities: RwLock<HashMap<String, (String, Utility)>>,
}

impl PluginRegistry {
    pub(crate) fn new() -> Self {
        Self {
            installed: RwLock::new(Vec::new()),
            factories: RwLock::new(HashMap::new()),
            utilities: RwLock::new(HashMap::new()),
        }
    }

    fn is_installed(&self, name: &str) -> bool {
        self.installed.read().iter().any(|p| p.plugin.name == name)
    }

    pub(crate) fn factory(&self, kind: &str) -> Option<ErrorFactory> {
        self.factories.read().get(kind).map(|(_, f)| Arc::clone(f))
    }

    pub(crate) fn utility(&self, name: &str) -> Option<Utility> {
        self.utilities.read().get(name).map(|(_, f)| Arc::clone(f))
    }

    pub(crate) fn notify_config_change(&self, config: &Config) {
        let hooks: Vec<ConfigChangeHook> = self
            .installed
            .read()
            .iter()
            .filter(|p| p.enabled)
            .filter_map(|p| p.plugin.hooks.on_config_change.clone())
            .collect();
        for hook in hooks {
            hook(config);
        }
    }
}

impl Runtime {
    /// Installs a plugin: dependency check, `on_install`, capability merge,
    /// `on_enable`, in that order. Nothing is merged if a dependency is
    /// missing. Re-installing an already-installed name is a benign
    /// duplicate, not an error.
    pub fn install(&self, plugin: Plugin) -> Result<InstallReport, InstallError> {
        let registry = self.plugins();

        if registry.is_installed(&plugin.name) {
            tracing::debug!(plugin = %plugin.name, "plugin already installed; skipping");
            return Ok(InstallReport::Duplicate);
        }

        let missing: Vec<String> = plugin
            .dependencies
            .iter()
            .filter(|dep| !registry.is_installed(dep))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(InstallError::MissingDependency { plugin: plugin.name, missing });
        }

        if let Some(hook) = &plugin.hooks.on_install {
            hook();
        }

        let middleware_ids: Vec<u64> = plugin
            .middleware
            .iter()
            .map(|(priority, entry)| {
                self.middleware()
                    .push(Some(plugin.name.clone()), *priority, Arc::clone(entry))
            })
            .collect();

        let mut factory_keys = Vec::with_capacity(plugin.factories.len());
        {
            let mut factories = registry.factories.write();
            for (key, factory) in &plugin.factories {
                if let Some((owner, _)) = factories.get(key) {
                    tracing::warn!(
                        key = %key,
                        previous_owner = %owner,
                        new_owner = %plugin.name,
                        "error-kind factory name collision; last write wins"
                    );
                }
                factories.insert(key.clone(), (plugin.name.clone(), Arc::clone(factory)));
                factory_keys.push(key.clone());
            }
        }

        let mut utility_keys = Vec::with_capacity(plugin.utilities.len());
        {
            let mut utilities = registry.utilities.write();
            for (key, utility) in &plugin.utilities {
                if let Some((owner, _)) = utilities.get(key) {
                    tracing::warn!(
                        key = %key,
                        previous_owner = %owner,
                        new_owner = %plugin.name,
                        "utility name collision; last write wins"
                    );
                }
                utilities.insert(key.clone(), (plugin.name.clone(), Arc::clone(utility)));
                utility_keys.push(key.clone());
            }
        }

        if let Some(patch) = plugin.config_patch.clone() {
            // Goes through the runtime so previously installed plugins
            // observe the change.
            self.configure(patch);
        }

        let on_enable = plugin.hooks.on_enable.clone();
        tracing::debug!(plugin = %plugin.name, version = %plugin.version, "plugin installed");
        registry.installed.write().push(Installed {
            plugin,
            enabled: true,
            middleware_ids,
            factory_keys,
            utility_keys,
        });

        if let Some(hook) = on_enable {
            hook();
        }

        Ok(InstallReport::Installed)
    }

    /// Uninstalls a plugin by name, reversing its capability merge exactly:
    /// only the middleware entries and registry keys it contributed are
    /// removed. Runs `on_disable` then `on_uninstall`. Returns `false` for
    /// unknown names.
    pub fn uninstall(&self, name: &str) -> bool {
        let registry = self.plugins();

        let removed = {
            let mut installed = registry.installed.write();
            match installed.iter().position(|p| p.plugin.name == name) {
                Some(index) => installed.remove(index),
                None => return false,
            }
        };

        self.middleware().remove_ids(&removed.middleware_ids);

        {
            let mut factories = registry.factories.write();
            for key in &removed.factory_keys {
                if factories.get(key).is_some_and(|(owner, _)| owner == name) {
                    factories.remove(key);
                }
            }
        }
        {
            let mut utilities = registry.utilities.write();
            for key in &removed.utility_keys {
                if utilities.get(key).is_some_and(|(owner, _)| owner == name) {
                    utilities.remove(key);
                }
            }
        }

        if let Some(hook) = &removed.plugin.hooks.on_disable {
            hook();
        }
        if let Some(hook) = &removed.plugin.hooks.on_uninstall {
            hook();
        }
        tracing::debug!(plugin = %name, "plugin uninstalled");
        true
    }

    /// Enables a previously disabled plugin. Capabilities stay merged across
    /// the toggle; only `on_config_change` delivery is affected.
    pub fn enable_plugin(&self, name: &str) -> bool {
        self.set_plugin_enabled(name, true)
    }

    /// Disables a plugin without unmerging its capabilities.
    pub fn disable_plugin(&self, name: &str) -> bool {
        self.set_plugin_enabled(name, false)
    }

    fn set_plugin_enabled(&self, name: &str, enabled: bool) -> bool {
        let registry = self.plugins();
        let mut installed = registry.installed.write();
        let Some(entry) = installed.iter_mut().find(|p| p.plugin.name == name) else {
            return false;
        };
        if entry.enabled == enabled {
            return true;
        }
        entry.enabled = enabled;
        let hook = if enabled {
            entry.plugin.hooks.on_enable.clone()
        } else {
            entry.plugin.hooks.on_disable.clone()
        };
        drop(installed);
        if let Some(hook) = hook {
            hook();
        }
        true
    }

    /// Lists installed plugins in installation order.
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugins()
            .installed
            .read()
            .iter()
            .map(|p| PluginInfo {
                name: p.plugin.name.clone(),
                version: p.plugin.version.clone(),
                enabled: p.enabled,
            })
            .collect()
    }

    /// Invokes a plugin-registered error-kind factory.
    pub fn error_from_factory(&self, kind: &str, message: &str) -> Option<ErrorValue> {
        self.plugins().factory(kind).map(|f| f(message))
    }

    /// Invokes a plugin-registered utility function.
    pub fn call_utility(&self, name: &str, input: Value) -> Option<Value> {
        self.plugins().utility(name).map(|f| f(input))
    }
}
