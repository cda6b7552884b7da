//! Settings for the registry itself
//!
//! Loaded from defaults, then from environment variables with the `ENVREG_`
//! prefix:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `ENVREG_STRATEGY` | `fallback` | `fallback` or `fail-fast` for invalid values |
//! | `ENVREG_EMPTY_AS_UNSET` | `true` | treat variables set to `""` as unset |

use std::collections::HashMap;

use config_crate::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::parse::{ParseStrategy, ResolveOptions};

/// Prefix of the environment variables read by [`RegistrySettings::load`]
pub const ENV_PREFIX: &str = "ENVREG";

/// Registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// What to do with values that do not parse
    #[serde(default)]
    pub strategy: ParseStrategy,

    /// Treat variables set to the empty string as unset
    #[serde(default = "default_true")]
    pub empty_as_unset: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            strategy: ParseStrategy::default(),
            empty_as_unset: true,
        }
    }
}

impl RegistrySettings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load settings from `vars` instead of the process environment
    pub fn load_from(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;
        config.try_deserialize()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Options used when resolving a variable
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            strategy: self.strategy,
            empty_as_unset: self.empty_as_unset,
        }
    }
}
