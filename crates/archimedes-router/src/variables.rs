//! Values bound to `{name}` and `{*name}` placeholders by a pattern match.

use smallvec::SmallVec;

/// Captured URI template variables, kept in the order the pattern declares them.
///
/// Patterns rarely declare more than a few placeholders, so the first four
/// bindings live inline.
///
/// # Example
///
/// ```rust
/// use archimedes_router::UriVariables;
///
/// let variables: UriVariables = [("orgId", "acme"), ("userId", "7")].into_iter().collect();
///
/// assert_eq!(variables.get("userId"), Some("7"));
/// assert_eq!(variables.names().collect::<Vec<_>>(), vec!["orgId", "userId"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UriVariables {
    bindings: SmallVec<[(String, String); 4]>,
}

impl UriVariables {
    /// Creates an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to the placeholder `name`.
    pub fn capture(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find_map(|(bound, value)| (bound == name).then_some(value))
    }

    /// Placeholder names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(name, _)| name)
    }

    /// `(name, value)` pairs, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // A match attempt that backtracks rewinds to the mark taken before it.
    pub(crate) fn mark(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for UriVariables {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_and_get() {
        let mut variables = UriVariables::new();
        variables.capture("id", "123");

        assert_eq!(variables.get("id"), Some("123"));
        assert_eq!(variables.get("missing"), None);
        assert_eq!(variables.len(), 1);
    }

    #[test]
    fn test_rewind_discards_later_bindings() {
        let mut variables = UriVariables::new();
        variables.capture("a", "1");
        let mark = variables.mark();
        variables.capture("b", "2");
        variables.capture("c", "3");

        variables.rewind(mark);
        assert_eq!(variables.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let variables: UriVariables = (0..10).map(|i| (format!("key{i}"), format!("value{i}"))).collect();

        assert_eq!(variables.len(), 10);
        assert_eq!(variables.get("key9"), Some("value9"));
        assert!(!variables.is_empty());
    }
}
