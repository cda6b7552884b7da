//! Configuration Registry
//!
//! Stores resolved configuration values in one table per value type. Each
//! table has its own reader/writer lock, so readers and writers of different
//! types never contend, and a writer of one type only blocks that type.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::parse::{self, ParseStrategy, ResolveOptions};
use crate::settings::RegistrySettings;
use crate::source::{EnvSource, ProcessEnv};
use crate::value::{for_each_value_type, ConfigValue, Value, ValueKind};
use crate::variable::{AnyVariable, Variable};

/// Values of one type, keyed by variable
pub struct Table<T> {
    entries: RwLock<HashMap<Variable<T>, T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: ConfigValue> Table<T> {
    fn get(&self, name: &str) -> Option<T> {
        self.entries.read().get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    fn insert(&self, key: Variable<T>, value: T) {
        self.entries.write().insert(key, value);
    }

    fn replace(&self, entries: HashMap<Variable<T>, T>) {
        *self.entries.write() = entries;
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Entries sorted by name
    fn sorted(&self) -> Vec<(Variable<T>, T)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Read guard that can be taken again by a thread already holding one
    pub(crate) fn read_recursive(&self) -> RwLockReadGuard<'_, HashMap<Variable<T>, T>> {
        self.entries.read_recursive()
    }

    /// Copy `entries` in, overwriting keys that already exist
    pub(crate) fn extend_from(&self, entries: &HashMap<Variable<T>, T>) {
        let mut target = self.entries.write();
        target.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// One registered value, as reported by [`Registry::snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(flatten)]
    pub value: Value,
}

impl Entry {
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }
}

macro_rules! define_registry {
    ($($variant:ident => $ty:ty, $field:ident, $label:literal [$($alias:literal),*];)*) => {
        /// Typed configuration registry
        ///
        /// Created empty, filled during startup with [`Registry::load_environment`]
        /// or [`Registry::write_configuration`], then read with [`Registry::get`].
        pub struct Registry {
            $(pub(crate) $field: Table<$ty>,)*
            options: ResolveOptions,
        }

        $(
            impl ConfigValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn table(registry: &Registry) -> &Table<Self> {
                    &registry.$field
                }
            }
        )*

        impl Registry {
            fn with_options(options: ResolveOptions) -> Self {
                Self {
                    $($field: Table::default(),)*
                    options,
                }
            }

            /// Look up a variable of any kind
            pub fn value(&self, key: &AnyVariable) -> Option<Value> {
                match key.kind() {
                    $(ValueKind::$variant => self.$field.get(key.name()).map(Value::$variant),)*
                }
            }

            /// Whether a variable of any kind is registered
            pub fn is_registered(&self, key: &AnyVariable) -> bool {
                match key.kind() {
                    $(ValueKind::$variant => self.$field.contains(key.name()),)*
                }
            }

            /// Store a dynamically typed value under `name`
            pub fn set_value(&self, name: impl Into<Cow<'static, str>>, value: Value) {
                let name = name.into();
                match value {
                    $(Value::$variant(v) => self.$field.insert(variable_named(name), v),)*
                }
            }

            /// Resolve a dynamically typed variable from `source` with the
            /// registry's strategy and store it.
            ///
            /// Fails with [`RegistryError::InvalidArgument`] if `fallback` is
            /// not of the variable's kind.
            pub fn try_load_value<S: EnvSource + ?Sized>(
                &self,
                source: &S,
                key: &AnyVariable,
                fallback: Value,
            ) -> Result<()> {
                let fallback_kind = fallback.kind();
                match (key.kind(), fallback) {
                    $(
                        (ValueKind::$variant, Value::$variant(fb)) => {
                            let variable: Variable<$ty> = variable_named(Cow::Owned(key.name().to_string()));
                            self.try_load_from(source, &variable, fb)
                        }
                    )*
                    (kind, _) => Err(RegistryError::InvalidArgument(format!(
                        "fallback for {} variable {} has kind {}",
                        kind,
                        key.name(),
                        fallback_kind
                    ))),
                }
            }

            /// Every registered value, ordered by kind and then name
            pub fn snapshot(&self) -> Vec<Entry> {
                let mut entries = Vec::new();
                $(
                    entries.extend(self.$field.sorted().into_iter().map(|(k, v)| Entry {
                        name: k.name().to_string(),
                        value: Value::$variant(v),
                    }));
                )*
                entries
            }

            /// Number of registered values across all kinds
            pub fn len(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            /// Number of registered values per kind
            pub fn counts(&self) -> Vec<(ValueKind, usize)> {
                vec![$((ValueKind::$variant, self.$field.len()),)*]
            }
        }
    };
}

for_each_value_type!(define_registry);

fn variable_named<T>(name: Cow<'static, str>) -> Variable<T> {
    match name {
        Cow::Borrowed(name) => Variable::new(name),
        Cow::Owned(name) => Variable::owned(name),
    }
}

impl Registry {
    /// Empty registry that falls back silently on invalid values
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    /// Empty registry using `strategy` for the `try_load_*` operations
    pub fn with_strategy(strategy: ParseStrategy) -> Self {
        Self::with_options(ResolveOptions {
            strategy,
            ..ResolveOptions::default()
        })
    }

    /// Empty registry configured from settings
    pub fn with_settings(settings: &RegistrySettings) -> Self {
        Self::with_options(settings.resolve_options())
    }

    /// Strategy applied by the `try_load_*` operations
    pub fn strategy(&self) -> ParseStrategy {
        self.options.strategy
    }

    /// Value of `key`, or the type's zero value if it was never registered
    pub fn get<T: ConfigValue>(&self, key: &Variable<T>) -> T {
        T::table(self).get(key.name()).unwrap_or_default()
    }

    /// Value of `key`, `None` if it was never registered
    pub fn try_get<T: ConfigValue>(&self, key: &Variable<T>) -> Option<T> {
        T::table(self).get(key.name())
    }

    pub fn contains<T: ConfigValue>(&self, key: &Variable<T>) -> bool {
        T::table(self).contains(key.name())
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set<T: ConfigValue>(&self, key: &Variable<T>, value: T) {
        T::table(self).insert(key.clone(), value);
    }

    /// Resolve `key` from the process environment and store the result.
    ///
    /// Unset or invalid values resolve to `fallback` (invalid booleans to
    /// `false`). Any previous value for `key` is overwritten.
    pub fn load_environment<T: ConfigValue>(&self, key: &Variable<T>, fallback: T) {
        self.load_from(&ProcessEnv, key, fallback);
    }

    /// Like [`Registry::load_environment`], reading from `source`
    pub fn load_from<T: ConfigValue, S: EnvSource + ?Sized>(
        &self,
        source: &S,
        key: &Variable<T>,
        fallback: T,
    ) {
        // Parse before taking the write lock.
        let value = parse::resolve_lenient(source, key.name(), fallback, self.options.empty_as_unset);
        self.set(key, value);
    }

    /// Resolve `key` from the process environment with the registry's
    /// strategy. Nothing is stored when the value is rejected.
    pub fn try_load_environment<T: ConfigValue>(&self, key: &Variable<T>, fallback: T) -> Result<()> {
        self.try_load_from(&ProcessEnv, key, fallback)
    }

    /// Like [`Registry::try_load_environment`], reading from `source`
    pub fn try_load_from<T: ConfigValue, S: EnvSource + ?Sized>(
        &self,
        source: &S,
        key: &Variable<T>,
        fallback: T,
    ) -> Result<()> {
        let value = parse::resolve_with(source, key.name(), fallback, self.options)?;
        self.set(key, value);
        Ok(())
    }

    /// Replace the whole table for `T` with `values`.
    ///
    /// Meant for test setup and static defaults, not for runtime updates.
    /// Existing values of type `T` that are not in `values` are dropped.
    pub fn write_configuration<T: ConfigValue>(&self, values: HashMap<Variable<T>, T>) {
        debug!(kind = %T::KIND, count = values.len(), "replacing configuration table");
        T::table(self).replace(values);
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<_> = self
            .counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| (kind.as_str(), count))
            .collect();
        f.debug_struct("Registry")
            .field("strategy", &self.options.strategy)
            .field("counts", &counts)
            .finish()
    }
}

/// Read access to resolved configuration.
///
/// Implemented by [`Registry`]; other implementations can stand in for a
/// registry where code only reads configuration, such as in tests. Writing
/// and merging require a real [`Registry`].
pub trait Configuration: Send + Sync {
    /// Look up a variable of any kind
    fn value(&self, key: &AnyVariable) -> Option<Value>;

    fn is_registered(&self, key: &AnyVariable) -> bool {
        self.value(key).is_some()
    }

    /// Fails with [`RegistryError::MissingVariables`] naming every key that
    /// is not registered
    fn configuration_keys_registered(&self, keys: &[AnyVariable]) -> Result<()> {
        crate::validate::missing_in(keys.iter().map(|key| (key, self.is_registered(key)))).into_result()
    }

    /// The concrete registry behind this configuration, if there is one
    fn as_registry(&self) -> Option<&Registry> {
        None
    }
}

impl dyn Configuration + '_ {
    /// Typed read, zero value if unregistered
    pub fn get<T: ConfigValue>(&self, key: &Variable<T>) -> T {
        self.value(&key.erase())
            .and_then(T::from_value)
            .unwrap_or_default()
    }
}

impl Configuration for Registry {
    fn value(&self, key: &AnyVariable) -> Option<Value> {
        Registry::value(self, key)
    }

    fn is_registered(&self, key: &AnyVariable) -> bool {
        Registry::is_registered(self, key)
    }

    fn configuration_keys_registered(&self, keys: &[AnyVariable]) -> Result<()> {
        Registry::configuration_keys_registered(self, keys)
    }

    fn as_registry(&self) -> Option<&Registry> {
        Some(self)
    }
}

/// Replace the table for `T` in the registry behind `config`.
///
/// Fails with [`RegistryError::InvalidArgument`] when `config` is `None` or is
/// not backed by a [`Registry`].
pub fn write_configuration<T: ConfigValue>(
    config: Option<&dyn Configuration>,
    values: HashMap<Variable<T>, T>,
) -> Result<()> {
    let config = config.ok_or_else(|| {
        RegistryError::InvalidArgument("configuration cannot be None".to_string())
    })?;
    let registry = config.as_registry().ok_or_else(|| {
        RegistryError::InvalidArgument("invalid configuration type, expected Registry".to_string())
    })?;
    registry.write_configuration(values);
    Ok(())
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry.
///
/// Created on first use with settings read from `ENVREG_*` variables; if
/// those are malformed the defaults are used.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| {
        let settings = RegistrySettings::load().unwrap_or_else(|e| {
            warn!(error = %e, "invalid registry settings, using defaults");
            RegistrySettings::default()
        });
        Registry::with_settings(&settings)
    })
}
