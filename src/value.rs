//! Supported value types
//!
//! The registry stores a closed set of value types. The set is declared once in
//! [`for_each_value_type!`], which hands the full table to a callback macro. The
//! kind tag, the dynamic [`Value`] enum, the registry fields and the merge logic
//! are all generated from that one table, so adding a type is a one-line change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::parse::FromEnv;
use crate::registry::{Registry, Table};

/// Invokes `$callback!` with one row per supported value type:
/// `Variant => type, registry_field, "label" [aliases...]`.
macro_rules! for_each_value_type {
    ($callback:ident) => {
        $callback! {
            String => String, strings, "string" ["str", "text"];
            Isize => isize, isizes, "isize" ["int"];
            I8 => i8, i8s, "i8" ["int8"];
            I16 => i16, i16s, "i16" ["int16"];
            I32 => i32, i32s, "i32" ["int32"];
            I64 => i64, i64s, "i64" ["int64"];
            Usize => usize, usizes, "usize" ["uint"];
            U8 => u8, u8s, "u8" ["uint8"];
            U16 => u16, u16s, "u16" ["uint16"];
            U32 => u32, u32s, "u32" ["uint32"];
            U64 => u64, u64s, "u64" ["uint64"];
            UintPtr => $crate::value::UintPtr, uintptrs, "uintptr" ["uint_ptr", "ptr"];
            Bytes => Vec<u8>, bytes, "bytes" [];
            Chars => Vec<char>, chars, "chars" ["runes"];
            F32 => f32, f32s, "f32" ["float32"];
            F64 => f64, f64s, "f64" ["float64"];
            Bool => bool, bools, "bool" ["boolean"];
        }
    };
}
pub(crate) use for_each_value_type;

mod sealed {
    pub trait Sealed {}
}

/// A type that can be stored in a [`Registry`].
///
/// Implemented for every supported value type and sealed against outside
/// implementations; the set of tables in a registry is fixed.
pub trait ConfigValue:
    FromEnv + Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static + sealed::Sealed
{
    /// Kind tag for this type
    const KIND: ValueKind;

    /// Wrap into the dynamic representation
    fn into_value(self) -> Value;

    /// Unwrap from the dynamic representation, `None` on a kind mismatch
    fn from_value(value: Value) -> Option<Self>;

    #[doc(hidden)]
    fn table(registry: &Registry) -> &Table<Self>;
}

macro_rules! define_values {
    ($($variant:ident => $ty:ty, $field:ident, $label:literal [$($alias:literal),*];)*) => {
        /// Kind tag of a supported value type
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ValueKind {
            $(
                #[serde(rename = $label)]
                $variant,
            )*
        }

        impl ValueKind {
            /// Every supported kind, in declaration order
            pub const ALL: &'static [ValueKind] = &[$(ValueKind::$variant,)*];

            /// Canonical lowercase name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ValueKind::$variant => $label,)*
                }
            }
        }

        impl FromStr for ValueKind {
            type Err = RegistryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($label $(| $alias)* => Ok(ValueKind::$variant),)*
                    _ => Err(RegistryError::UnknownKind(s.to_string())),
                }
            }
        }

        /// A configuration value of any supported kind
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "value")]
        pub enum Value {
            $(
                #[serde(rename = $label)]
                $variant($ty),
            )*
        }

        impl Value {
            /// Kind tag of this value
            pub fn kind(&self) -> ValueKind {
                match self {
                    $(Value::$variant(_) => ValueKind::$variant,)*
                }
            }

            /// Zero value of a kind
            pub fn default_for(kind: ValueKind) -> Value {
                match kind {
                    $(ValueKind::$variant => Value::$variant(<$ty>::default()),)*
                }
            }

            /// Parse text with the grammar of `kind`, `None` if malformed
            pub fn parse(kind: ValueKind, raw: &str) -> Option<Value> {
                let raw = std::ffi::OsStr::new(raw);
                match kind {
                    $(ValueKind::$variant => <$ty as FromEnv>::from_env(raw).map(Value::$variant),)*
                }
            }
        }

        $(
            impl sealed::Sealed for $ty {}
        )*
    };
}

for_each_value_type!(define_values);

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Isize(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::Usize(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::UintPtr(v) => write!(f, "{}", v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Chars(v) => f.write_str(&v.iter().collect::<String>()),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Pointer-sized unsigned integer.
///
/// Kept apart from `usize` so that native-width and pointer-width variables
/// live in separate tables, as they do on platforms where the two differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UintPtr(pub usize);

impl UintPtr {
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for UintPtr {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<UintPtr> for usize {
    fn from(value: UintPtr) -> Self {
        value.0
    }
}

impl fmt::Display for UintPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UintPtr {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UintPtr)
    }
}
