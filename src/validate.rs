//! Presence checks for required variables

use tracing::debug;

use crate::error::{MissingVariables, Result};
use crate::registry::Registry;
use crate::variable::AnyVariable;

/// Collect the names of keys whose check failed, in order
pub(crate) fn missing_in<'a>(checks: impl IntoIterator<Item = (&'a AnyVariable, bool)>) -> MissingVariables {
    let names = checks
        .into_iter()
        .filter(|(_, registered)| !registered)
        .map(|(key, _)| key.name().to_string())
        .collect();
    MissingVariables::new(names)
}

impl Registry {
    /// Names of the keys that are not registered, in the order given.
    ///
    /// Each key is looked up in its own type's table only, so a key
    /// registered under a different type counts as missing.
    pub fn missing_variables<I>(&self, keys: I) -> MissingVariables
    where
        I: IntoIterator,
        I::Item: Into<AnyVariable>,
    {
        let keys: Vec<AnyVariable> = keys.into_iter().map(Into::into).collect();
        missing_in(keys.iter().map(|key| (key, self.is_registered(key))))
    }

    /// Check that every key in `keys` is registered.
    ///
    /// Keys of mixed value types are passed as [`AnyVariable`]s, usually
    /// built with [`variables!`](crate::variables). An empty list always
    /// succeeds. Each key takes only its own type's read lock, so the check
    /// is not atomic across types.
    ///
    /// ```
    /// use envreg::{variables, Registry, Variable};
    ///
    /// const HOST: Variable<String> = Variable::new("HOST");
    /// const PORT: Variable<u16> = Variable::new("PORT");
    ///
    /// let registry = Registry::new();
    /// registry.set(&HOST, "localhost".to_string());
    ///
    /// let err = registry.configuration_keys_registered(variables![HOST, PORT]).unwrap_err();
    /// assert!(err.is_missing_variables());
    /// assert_eq!(err.missing_variables().unwrap().names, vec!["PORT"]);
    /// ```
    pub fn configuration_keys_registered<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<AnyVariable>,
    {
        let missing = self.missing_variables(keys);
        if !missing.is_empty() {
            debug!(missing = missing.len(), "configuration variables not registered");
        }
        missing.into_result()
    }
}
