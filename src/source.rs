//! Sources of raw variable values

use std::collections::HashMap;
use std::ffi::OsString;

/// A key/value source that variables are resolved against.
///
/// [`ProcessEnv`] reads the real process environment; [`MapSource`] is an
/// in-memory source for tests and for layering values from elsewhere.
pub trait EnvSource {
    /// Raw value of `name`, `None` when unset
    fn get(&self, name: &str) -> Option<OsString>;
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn get(&self, name: &str) -> Option<OsString> {
        (**self).get(name)
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

/// An in-memory source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSource {
    vars: HashMap<String, OsString>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OsString>) -> Option<OsString> {
        self.vars.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<OsString> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for MapSource {
    fn get(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<OsString> {
        HashMap::get(self, name).map(OsString::from)
    }
}

impl<K: Into<String>, V: Into<OsString>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source() {
        let mut source = MapSource::from_iter([("A", "1")]);
        assert_eq!(source.get("A"), Some(OsString::from("1")));
        assert_eq!(source.get("B"), None);

        source.insert("B", "2");
        assert_eq!(source.len(), 2);
        assert_eq!(source.remove("A"), Some(OsString::from("1")));
        assert_eq!(EnvSource::get(&source, "A"), None);
    }

    #[test]
    fn test_hash_map_source() {
        let mut vars = HashMap::new();
        vars.insert("HOST".to_string(), "localhost".to_string());
        assert_eq!(EnvSource::get(&vars, "HOST"), Some(OsString::from("localhost")));
        assert_eq!(EnvSource::get(&vars, "PORT"), None);
    }

    #[test]
    fn test_process_env_unset() {
        assert_eq!(ProcessEnv.get("ENVREG_SOURCE_TEST_DEFINITELY_UNSET"), None);
    }
}
