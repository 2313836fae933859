//! Request-scoped attribute storage.
//!
//! Attributes are the side channel routers use to cache per-request state
//! (resolved lookup paths, parsed request paths, logging markers) and that
//! introspection uses to cache its own results. Values are type-erased and
//! shared, so copying an attribute map is cheap and never deep-copies values.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable attribute value.
pub type AttributeValue = Arc<dyn Any + Send + Sync>;

/// String-keyed attribute map.
///
/// # Example
///
/// ```
/// use archimedes_core::Attributes;
///
/// let mut attributes = Attributes::new();
/// attributes.insert_value("app.tenant", "acme".to_string());
///
/// let tenant = attributes.get_as::<String>("app.tenant").unwrap();
/// assert_eq!(tenant.as_str(), "acme");
/// ```
#[derive(Clone, Default)]
pub struct Attributes {
    entries: HashMap<String, AttributeValue>,
}

impl Attributes {
    /// Creates an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        self.entries.get(name).cloned()
    }

    /// Returns the value stored under `name` if it has type `T`.
    #[must_use]
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(|value| value.downcast::<T>().ok())
    }

    /// Stores a raw value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.entries.insert(name.into(), value)
    }

    /// Wraps and stores a typed value.
    pub fn insert_value<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Option<AttributeValue> {
        self.insert(name, Arc::new(value))
    }

    /// Removes the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.entries.remove(name)
    }

    /// Stores `value` under `name`, or removes the entry when `value` is `None`.
    pub fn set_or_remove(&mut self, name: &str, value: Option<AttributeValue>) {
        match value {
            Some(value) => {
                self.entries.insert(name.to_string(), value);
            }
            None => {
                self.entries.remove(name);
            }
        }
    }

    /// Checks whether an entry exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the attribute names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_and_get_typed() {
        let mut attributes = Attributes::new();
        attributes.insert_value("count", 42_u32);

        assert_eq!(attributes.get_as::<u32>("count").as_deref(), Some(&42));
        assert!(attributes.get_as::<String>("count").is_none());
    }

    #[test]
    fn test_insert_returns_previous() {
        let mut attributes = Attributes::new();
        assert!(attributes.insert_value("key", 1_u8).is_none());

        let previous = attributes.insert_value("key", 2_u8).unwrap();
        assert_eq!(previous.downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn test_set_or_remove() {
        let mut attributes = Attributes::new();
        attributes.set_or_remove("key", Some(Arc::new("value")));
        assert!(attributes.contains("key"));

        attributes.set_or_remove("key", None);
        assert!(!attributes.contains("key"));
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_clone_shares_values() {
        let mut attributes = Attributes::new();
        attributes.insert_value("shared", vec![1, 2, 3]);

        let copy = attributes.clone();
        let original = attributes.get("shared").unwrap();
        let copied = copy.get("shared").unwrap();
        assert!(Arc::ptr_eq(&original, &copied));
    }

    #[test]
    fn test_names_sorted() {
        let mut attributes = Attributes::new();
        attributes.insert_value("b", 1);
        attributes.insert_value("a", 2);

        assert_eq!(attributes.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_debug_lists_names() {
        let mut attributes = Attributes::new();
        attributes.insert_value("visible", ());

        let debug = format!("{attributes:?}");
        assert!(debug.contains("visible"));
    }

    proptest! {
        #[test]
        fn prop_restoring_a_snapshot_is_exact(
            initial in prop::collection::hash_map("[a-z]{1,6}", any::<u16>(), 0..6),
            overwrite in prop::collection::hash_map("[a-z]{1,6}", any::<u16>(), 0..6),
        ) {
            let mut attributes = Attributes::new();
            for (name, value) in &initial {
                attributes.insert_value(name.as_str(), *value);
            }
            let names: Vec<String> = overwrite.keys().cloned().collect();
            let saved: Vec<_> = names.iter().map(|name| attributes.get(name)).collect();

            for (name, value) in &overwrite {
                attributes.insert_value(name.as_str(), value.wrapping_add(1));
            }
            for (name, value) in names.iter().zip(saved) {
                attributes.set_or_remove(name, value);
            }

            prop_assert_eq!(attributes.len(), initial.len());
            for (name, value) in &initial {
                let restored = attributes.get_as::<u16>(name);
                prop_assert_eq!(restored.as_deref(), Some(value));
            }
        }
    }
}
