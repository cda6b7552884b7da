//! Typed variable identifiers

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::RegistryError;
use crate::value::{ConfigValue, ValueKind};

/// Name of a configuration variable whose value type is fixed at declaration.
///
/// The name doubles as the environment variable name. Variables are usually
/// declared as constants:
///
/// ```
/// use envreg::Variable;
///
/// const PORT: Variable<u16> = Variable::new("PORT");
/// const DATABASE_URL: Variable<String> = Variable::new("DATABASE_URL");
/// ```
///
/// Variables of different value types never compare equal, even when they
/// share a name; each type has its own table in the registry.
pub struct Variable<T> {
    name: Cow<'static, str>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Variable<T> {
    /// Declare a variable with a static name
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _type: PhantomData,
        }
    }

    /// Declare a variable whose name is built at runtime
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _type: PhantomData,
        }
    }

    /// Variable name, also used as the environment variable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: ConfigValue> Variable<T> {
    /// Kind of value this variable holds
    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    /// Type-erased copy, for heterogeneous key lists
    pub fn erase(&self) -> AnyVariable {
        AnyVariable {
            name: self.name.clone(),
            kind: T::KIND,
        }
    }
}

impl<T> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Variable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Variable<T> {}

// Must agree with `str`'s Hash for the `Borrow<str>` lookups in the tables.
impl<T> Hash for Variable<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl<T> Borrow<str> for Variable<T> {
    fn borrow(&self) -> &str {
        self.name()
    }
}

impl<T> PartialOrd for Variable<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Variable<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl<T: ConfigValue> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable<{}>({:?})", T::KIND, self.name())
    }
}

impl<T> fmt::Display for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T> From<&'static str> for Variable<T> {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl<T> From<String> for Variable<T> {
    fn from(name: String) -> Self {
        Self::owned(name)
    }
}

/// A variable name paired with its value kind, without the static type.
///
/// Equality and hashing cover both name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnyVariable {
    name: Cow<'static, str>,
    kind: ValueKind,
}

impl AnyVariable {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Recover the typed variable, `None` if `T` is not this variable's kind
    pub fn typed<T: ConfigValue>(&self) -> Option<Variable<T>> {
        (self.kind == T::KIND).then(|| Variable {
            name: self.name.clone(),
            _type: PhantomData,
        })
    }
}

impl fmt::Display for AnyVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Parses `kind:NAME`, e.g. `u16:PORT`.
impl FromStr for AnyVariable {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s.split_once(':').ok_or_else(|| {
            RegistryError::InvalidArgument(format!("expected KIND:NAME, got {:?}", s))
        })?;
        if name.is_empty() {
            return Err(RegistryError::InvalidArgument(format!(
                "variable name is empty in {:?}",
                s
            )));
        }
        Ok(Self::new(name.to_string(), kind.parse()?))
    }
}

impl<T: ConfigValue> From<Variable<T>> for AnyVariable {
    fn from(variable: Variable<T>) -> Self {
        AnyVariable {
            name: variable.name,
            kind: T::KIND,
        }
    }
}

impl<T: ConfigValue> From<&Variable<T>> for AnyVariable {
    fn from(variable: &Variable<T>) -> Self {
        variable.erase()
    }
}

impl From<&AnyVariable> for AnyVariable {
    fn from(variable: &AnyVariable) -> Self {
        variable.clone()
    }
}

/// Builds a `Vec<AnyVariable>` from typed variables of mixed value types.
///
/// ```
/// use envreg::{variables, Variable};
///
/// const HOST: Variable<String> = Variable::new("HOST");
/// const PORT: Variable<u16> = Variable::new("PORT");
///
/// let required = variables![HOST, PORT];
/// assert_eq!(required.len(), 2);
/// ```
#[macro_export]
macro_rules! variables {
    ($($variable:expr),* $(,)?) => {{
        let keys: ::std::vec::Vec<$crate::AnyVariable> =
            ::std::vec![$($crate::AnyVariable::from(&$variable)),*];
        keys
    }};
}
