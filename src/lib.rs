//! envreg
//!
//! A typed registry for configuration read from environment variables.
//!
//! ## Features
//!
//! - **Typed Variables**: `Variable<T>` names a variable and fixes its value type
//! - **Fallbacks**: unset or unparsable variables resolve to a declared default
//! - **Per-Type Locking**: one reader/writer lock per value type, per registry
//! - **Presence Checks**: subsystems assert their required variables are registered
//! - **Merging**: registries built by independent subsystems combine into one
//!
//! ## Example
//!
//! ```
//! use envreg::{variables, Registry, Variable};
//!
//! const DATABASE_URL: Variable<String> = Variable::new("ENVREG_DOC_DATABASE_URL");
//! const PORT: Variable<u16> = Variable::new("ENVREG_DOC_PORT");
//!
//! let registry = Registry::new();
//! registry.load_environment(&DATABASE_URL, "postgres://localhost/app".to_string());
//! registry.load_environment(&PORT, 8080);
//!
//! registry.configuration_keys_registered(variables![DATABASE_URL, PORT]).unwrap();
//! assert_eq!(registry.get(&PORT), 8080);
//! ```
//!
//! ## Supported Types
//!
//! ```text
//! String
//! isize  i8  i16  i32  i64
//! usize  u8  u16  u32  u64  UintPtr
//! Vec<u8>  Vec<char>
//! f32  f64
//! bool
//! ```

pub mod error;
pub mod merge;
pub mod parse;
pub mod registry;
pub mod settings;
pub mod source;
pub mod validate;
pub mod value;
pub mod variable;

pub use error::{ErrorKind, MissingVariables, RegistryError, Result};
pub use merge::{merge, merge_registries};
pub use parse::{env, fallback, resolve, resolve_with, FromEnv, ParseStrategy, ResolveOptions};
pub use registry::{global, write_configuration, Configuration, Entry, Registry};
pub use settings::RegistrySettings;
pub use source::{EnvSource, MapSource, ProcessEnv};
pub use value::{ConfigValue, UintPtr, Value, ValueKind};
pub use variable::{AnyVariable, Variable};
