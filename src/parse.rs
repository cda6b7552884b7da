//! Parsing environment values with fallbacks
//!
//! Every supported type resolves the same way: an unset variable yields the
//! fallback, a set variable is parsed with the type's grammar, and a value
//! that does not parse yields the fallback again. Booleans are the exception:
//! an unparsable boolean resolves to `false` whatever the fallback.
//!
//! Grammars:
//!
//! | Type | Accepted text |
//! |------|---------------|
//! | integers | decimal with optional sign, within the type's range |
//! | `f32`, `f64` | Rust float literals within the type's range, including `inf` and `NaN` |
//! | `bool` | `true`, `false`, `t`, `f`, `1`, `0` (any case) |
//! | `String` | any UTF-8 text |
//! | `Vec<u8>` | the raw bytes of the value |
//! | `Vec<char>` | the characters of the text, invalid UTF-8 replaced by U+FFFD |

use std::ffi::OsStr;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::source::{EnvSource, ProcessEnv};
use crate::value::{ConfigValue, UintPtr};

/// What to do when a variable is set but does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseStrategy {
    /// Substitute the fallback without reporting anything
    #[default]
    Fallback,
    /// Report [`RegistryError::InvalidValue`]
    #[serde(alias = "fail_fast", alias = "strict")]
    FailFast,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::Fallback => f.write_str("fallback"),
            ParseStrategy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Options applied while resolving a single variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub strategy: ParseStrategy,
    /// Treat a variable set to the empty string as unset
    pub empty_as_unset: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strategy: ParseStrategy::Fallback,
            empty_as_unset: true,
        }
    }
}

/// Parsing from the raw text of an environment variable
pub trait FromEnv: Sized {
    /// Parse `raw`, `None` if it is not valid for this type
    fn from_env(raw: &OsStr) -> Option<Self>;

    /// Value used when the variable is set but invalid
    fn on_invalid(fallback: Self) -> Self {
        fallback
    }
}

macro_rules! from_env_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEnv for $ty {
                fn from_env(raw: &OsStr) -> Option<Self> {
                    raw.to_str()?.parse().ok()
                }
            }
        )*
    };
}

from_env_via_from_str!(isize, i8, i16, i32, i64, usize, u8, u16, u32, u64, UintPtr);

// `str::parse` saturates to infinity on overflow; only a spelled-out
// infinity may resolve to one.
macro_rules! from_env_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEnv for $ty {
                fn from_env(raw: &OsStr) -> Option<Self> {
                    let raw = raw.to_str()?;
                    let value: $ty = raw.parse().ok()?;
                    if value.is_infinite() && !is_infinity_literal(raw) {
                        return None;
                    }
                    Some(value)
                }
            }
        )*
    };
}

from_env_float!(f32, f64);

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

impl FromEnv for String {
    fn from_env(raw: &OsStr) -> Option<Self> {
        raw.to_str().map(str::to_string)
    }
}

impl FromEnv for Vec<u8> {
    fn from_env(raw: &OsStr) -> Option<Self> {
        Some(raw.as_encoded_bytes().to_vec())
    }
}

// Invalid UTF-8 sequences become U+FFFD.
impl FromEnv for Vec<char> {
    fn from_env(raw: &OsStr) -> Option<Self> {
        Some(raw.to_string_lossy().chars().collect())
    }
}

impl FromEnv for bool {
    fn from_env(raw: &OsStr) -> Option<Self> {
        let raw = raw.to_str()?;
        if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("t") || raw == "1" {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("f") || raw == "0" {
            Some(false)
        } else {
            None
        }
    }

    // An unparsable boolean is false, not the fallback.
    fn on_invalid(_fallback: Self) -> Self {
        false
    }
}

/// Outcome of reading one variable from a source
enum Lookup<T> {
    Unset,
    Parsed(T),
    Invalid,
}

fn lookup<T: ConfigValue, S: EnvSource + ?Sized>(
    source: &S,
    name: &str,
    empty_as_unset: bool,
) -> Lookup<T> {
    match source.get(name) {
        None => Lookup::Unset,
        Some(raw) if empty_as_unset && raw.is_empty() => Lookup::Unset,
        Some(raw) => match T::from_env(&raw) {
            Some(value) => Lookup::Parsed(value),
            None => Lookup::Invalid,
        },
    }
}

/// Resolve `name` from `source`, substituting `fallback` when it is unset or
/// invalid.
pub fn resolve<T: ConfigValue, S: EnvSource + ?Sized>(source: &S, name: &str, fallback: T) -> T {
    resolve_lenient(source, name, fallback, true)
}

pub(crate) fn resolve_lenient<T: ConfigValue, S: EnvSource + ?Sized>(
    source: &S,
    name: &str,
    fallback: T,
    empty_as_unset: bool,
) -> T {
    match lookup::<T, S>(source, name, empty_as_unset) {
        Lookup::Unset => {
            debug!(variable = name, kind = %T::KIND, "variable unset, using fallback");
            fallback
        }
        Lookup::Parsed(value) => {
            debug!(variable = name, kind = %T::KIND, "variable resolved from source");
            value
        }
        Lookup::Invalid => {
            debug!(variable = name, kind = %T::KIND, "variable unparsable, using fallback");
            T::on_invalid(fallback)
        }
    }
}

/// Resolve `name` from `source` under the given options.
///
/// With [`ParseStrategy::FailFast`] an invalid value is an error instead of
/// being replaced by the fallback. An unset variable always yields the
/// fallback.
pub fn resolve_with<T: ConfigValue, S: EnvSource + ?Sized>(
    source: &S,
    name: &str,
    fallback: T,
    options: ResolveOptions,
) -> Result<T> {
    match options.strategy {
        ParseStrategy::Fallback => Ok(resolve_lenient(source, name, fallback, options.empty_as_unset)),
        ParseStrategy::FailFast => match lookup::<T, S>(source, name, options.empty_as_unset) {
            Lookup::Unset => Ok(fallback),
            Lookup::Parsed(value) => Ok(value),
            Lookup::Invalid => Err(RegistryError::InvalidValue {
                name: name.to_string(),
                kind: T::KIND,
            }),
        },
    }
}

/// Read `name` from the process environment with a fallback.
///
/// ```
/// let workers: u8 = envreg::env("ENVREG_DOC_WORKERS_UNSET", 4);
/// assert_eq!(workers, 4);
/// ```
pub fn env<T: ConfigValue>(name: &str, fallback: T) -> T {
    resolve(&ProcessEnv, name, fallback)
}

/// Returns `fallback` when `value` is the type's zero value, else `value`.
pub fn fallback<T: PartialEq + Default>(value: T, fallback: T) -> T {
    if value == T::default() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MapSource;
    use crate::value::ValueKind;
    use proptest::prelude::*;

    fn source() -> MapSource {
        MapSource::from_iter([
            ("valid_int", "2"),
            ("invalid_int", "test"),
            ("empty", ""),
            ("int8_overflow", "300"),
            ("uint8_overflow", "256"),
            ("negative", "-1"),
            ("uint64_overflow", "18446744073709551616"),
            ("float", "12.134"),
            ("float_negative", "-12.642322"),
            ("float_big", "9223372036854775808"),
            ("text", "testing"),
            ("bool_true", "true"),
            ("bool_upper", "TRUE"),
            ("bool_t", "t"),
            ("bool_one", "1"),
            ("bool_false", "false"),
            ("bool_f", "F"),
            ("bool_zero", "0"),
            ("bool_invalid", "invalid"),
            ("bool_number", "123"),
        ])
    }

    #[test]
    fn test_unset_returns_fallback() {
        let src = source();
        assert_eq!(resolve(&src, "missing", 7i32), 7);
        assert_eq!(resolve(&src, "missing", String::from("foo")), "foo");
        assert!(resolve(&src, "missing", true));
        assert_eq!(resolve(&src, "missing", b"foo".to_vec()), b"foo");
    }

    #[test]
    fn test_valid_integers() {
        let src = source();
        assert_eq!(resolve(&src, "valid_int", 0isize), 2);
        assert_eq!(resolve(&src, "valid_int", 0i8), 2);
        assert_eq!(resolve(&src, "valid_int", 0u64), 2);
        assert_eq!(resolve(&src, "valid_int", UintPtr(0)), UintPtr(2));
        assert_eq!(resolve(&src, "negative", 0i16), -1);
    }

    #[test]
    fn test_out_of_range_returns_fallback() {
        let src = source();
        assert_eq!(resolve(&src, "int8_overflow", 0i8), 0);
        assert_eq!(resolve(&src, "uint8_overflow", 22u8), 22);
        assert_eq!(resolve(&src, "negative", 127u32), 127);
        assert_eq!(resolve(&src, "uint64_overflow", 22u64), 22);
        assert_eq!(resolve(&src, "uint64_overflow", UintPtr(22)), UintPtr(22));
    }

    #[test]
    fn test_malformed_returns_fallback() {
        let src = source();
        assert_eq!(resolve(&src, "invalid_int", 300i32), 300);
        assert_eq!(resolve(&src, "invalid_int", 22.33f64), 22.33);
        assert_eq!(resolve(&src, "text", 55usize), 55);
    }

    #[test]
    fn test_empty_is_unset() {
        let src = source();
        assert_eq!(resolve(&src, "empty", 1i64), 1);
        assert_eq!(resolve(&src, "empty", String::from("foo")), "foo");
        assert!(resolve(&src, "empty", true));
    }

    #[test]
    fn test_empty_kept_when_configured() {
        let src = source();
        let options = ResolveOptions {
            empty_as_unset: false,
            ..ResolveOptions::default()
        };
        let value = resolve_with(&src, "empty", String::from("foo"), options).unwrap();
        assert_eq!(value, "");
        // Empty text is not a valid integer.
        assert_eq!(resolve_with(&src, "empty", 9u8, options).unwrap(), 9);
    }

    #[test]
    fn test_floats() {
        let src = source();
        assert_eq!(resolve(&src, "valid_int", 0f32), 2.0);
        assert!((resolve(&src, "float", 0f32) - 12.134).abs() < 1e-4);
        assert!((resolve(&src, "float_negative", 0f64) - -12.642322).abs() < 1e-9);
        assert_eq!(resolve(&src, "float_big", 22.44f32), 9.223372e18);
        assert_eq!(resolve(&src, "float_big", 22.44f64), 9.223372036854776e18);
    }

    #[test]
    fn test_float_overflow_returns_fallback() {
        let src = MapSource::from_iter([
            ("f32_big", "1e39"),
            ("f32_big_negative", "-1e39"),
            ("f64_big", "1e400"),
        ]);
        assert_eq!(resolve(&src, "f32_big", 22.44f32), 22.44);
        assert_eq!(resolve(&src, "f32_big_negative", 22.44f32), 22.44);
        assert_eq!(resolve(&src, "f64_big", 22.44f64), 22.44);
        // 1e39 is within f64 range.
        assert_eq!(resolve(&src, "f32_big", 0f64), 1e39);

        let options = ResolveOptions {
            strategy: ParseStrategy::FailFast,
            ..ResolveOptions::default()
        };
        assert!(resolve_with(&src, "f32_big", 1f32, options).is_err());
    }

    #[test]
    fn test_float_infinity_literals() {
        let src = MapSource::from_iter([("inf", "inf"), ("neg", "-Infinity"), ("plus", "+INF")]);
        assert_eq!(resolve(&src, "inf", 0f32), f32::INFINITY);
        assert_eq!(resolve(&src, "neg", 0f64), f64::NEG_INFINITY);
        assert_eq!(resolve(&src, "plus", 0f64), f64::INFINITY);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_text() {
        use std::os::unix::ffi::OsStrExt;

        let mut src = MapSource::new();
        src.insert("raw", OsStr::from_bytes(b"a\xffb"));
        assert_eq!(resolve(&src, "raw", String::from("foo")), "foo");
        assert_eq!(resolve(&src, "raw", Vec::<char>::new()), vec!['a', '\u{FFFD}', 'b']);
        assert_eq!(resolve(&src, "raw", Vec::<u8>::new()), b"a\xffb");
    }

    #[test]
    fn test_text_types() {
        let src = source();
        assert_eq!(resolve(&src, "text", String::from("foo")), "testing");
        assert_eq!(resolve(&src, "valid_int", Vec::<u8>::new()), b"2");
        assert_eq!(resolve(&src, "text", Vec::<char>::new()), "testing".chars().collect::<Vec<_>>());
    }

    #[test]
    fn test_bool_grammar() {
        let src = source();
        assert!(resolve(&src, "bool_true", false));
        assert!(resolve(&src, "bool_upper", false));
        assert!(resolve(&src, "bool_t", false));
        assert!(resolve(&src, "bool_one", false));
        assert!(!resolve(&src, "bool_false", true));
        assert!(!resolve(&src, "bool_f", true));
        assert!(!resolve(&src, "bool_zero", true));
    }

    #[test]
    fn test_bool_invalid_is_false_regardless_of_fallback() {
        // Unlike every other type, an invalid boolean ignores the fallback.
        let src = source();
        assert!(!resolve(&src, "bool_invalid", true));
        assert!(!resolve(&src, "bool_invalid", false));
        assert!(!resolve(&src, "bool_number", true));
    }

    #[test]
    fn test_fail_fast_reports_invalid_value() {
        let src = source();
        let options = ResolveOptions {
            strategy: ParseStrategy::FailFast,
            ..ResolveOptions::default()
        };

        let err = resolve_with(&src, "uint8_overflow", 22u8, options).unwrap_err();
        match err {
            RegistryError::InvalidValue { name, kind } => {
                assert_eq!(name, "uint8_overflow");
                assert_eq!(kind, ValueKind::U8);
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }

        assert!(resolve_with(&src, "bool_invalid", true, options).is_err());
        assert_eq!(resolve_with(&src, "missing", 5u8, options).unwrap(), 5);
        assert_eq!(resolve_with(&src, "valid_int", 5u8, options).unwrap(), 2);
    }

    #[test]
    fn test_fallback_helper() {
        assert_eq!(fallback(0, 5), 5);
        assert_eq!(fallback(3, 5), 3);
        assert_eq!(fallback(String::new(), "x".to_string()), "x");
        assert_eq!(fallback("set".to_string(), "x".to_string()), "set");
        assert!(fallback(false, true));
    }

    #[test]
    fn test_strategy_serde_names() {
        let strategy: ParseStrategy = serde_json::from_str(r#""fail-fast""#).unwrap();
        assert_eq!(strategy, ParseStrategy::FailFast);
        let strategy: ParseStrategy = serde_json::from_str(r#""strict""#).unwrap();
        assert_eq!(strategy, ParseStrategy::FailFast);
        assert_eq!(ParseStrategy::default().to_string(), "fallback");
    }

    proptest! {
        #[test]
        fn prop_u8_out_of_range_uses_fallback(value in 256u32..=u32::MAX, fb in any::<u8>()) {
            let src = MapSource::from_iter([("n", value.to_string())]);
            prop_assert_eq!(resolve(&src, "n", fb), fb);
        }

        #[test]
        fn prop_i16_in_range_round_trips(value in any::<i16>(), fb in any::<i16>()) {
            let src = MapSource::from_iter([("n", value.to_string())]);
            prop_assert_eq!(resolve(&src, "n", fb), value);
        }
    }
}
