//! Combining registries

use tracing::debug;

use crate::registry::{Configuration, Registry};
use crate::value::for_each_value_type;

/// Merge configurations into a new registry.
///
/// Later arguments win on key collisions within a type; keys of different
/// types never collide. Merging nothing yields an empty registry.
///
/// # Panics
///
/// Panics if any argument is not backed by a [`Registry`]. Only values
/// built by this crate may be merged.
pub fn merge(configs: &[&dyn Configuration]) -> Registry {
    let registries: Vec<&Registry> = configs
        .iter()
        .map(|config| match config.as_registry() {
            Some(registry) => registry,
            None => panic!("unsupported configuration type: merge requires Registry instances"),
        })
        .collect();
    merge_registries(registries)
}

macro_rules! merge_tables {
    ($($variant:ident => $ty:ty, $field:ident, $label:literal [$($alias:literal),*];)*) => {
        fn merge_into(merged: &Registry, sources: &[&Registry]) {
            // Hold every table's read lock on every source for the whole copy,
            // so the result is a consistent view of each type.
            $(
                let $field: Vec<_> = sources.iter().map(|r| r.$field.read_recursive()).collect();
            )*
            $(
                for entries in &$field {
                    merged.$field.extend_from(entries);
                }
            )*
        }
    };
}

for_each_value_type!(merge_tables);

/// Merge registries into a new one, later registries winning on collisions.
pub fn merge_registries<'a>(registries: impl IntoIterator<Item = &'a Registry>) -> Registry {
    let sources: Vec<&Registry> = registries.into_iter().collect();
    let merged = Registry::new();
    merge_into(&merged, &sources);
    debug!(sources = sources.len(), entries = merged.len(), "merged registries");
    merged
}
