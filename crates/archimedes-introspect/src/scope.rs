//! Save/restore of a single request attribute.

use archimedes_core::{AttributeValue, ServerRequest, ServerRequestExt};
use std::ops::{Deref, DerefMut};

/// Holds a request and restores one attribute to its saved state on drop.
///
/// The request is reachable through `Deref`/`DerefMut` while the scope lives,
/// so code inside the scope cannot bypass the restore. The previous value is
/// reinstated as the same shared value; a previously absent attribute is
/// removed.
pub struct AttributeScope<'a, R: ServerRequest + ?Sized> {
    request: &'a mut R,
    name: &'static str,
    previous: Option<AttributeValue>,
}

impl<'a, R: ServerRequest + ?Sized> AttributeScope<'a, R> {
    /// Remembers the current value of `name`.
    pub fn save(request: &'a mut R, name: &'static str) -> Self {
        let previous = request.attribute(name);
        Self {
            request,
            name,
            previous,
        }
    }

    /// Remembers the current value of `name`, then replaces it with `value`.
    pub fn replace(request: &'a mut R, name: &'static str, value: AttributeValue) -> Self {
        let scope = Self::save(request, name);
        scope.request.set_attribute(name, value);
        scope
    }
}

impl<R: ServerRequest + ?Sized> Deref for AttributeScope<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.request
    }
}

impl<R: ServerRequest + ?Sized> DerefMut for AttributeScope<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.request
    }
}

impl<R: ServerRequest + ?Sized> Drop for AttributeScope<'_, R> {
    fn drop(&mut self) {
        self.request.restore_attribute(self.name, self.previous.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_core::Exchange;
    use std::sync::Arc;

    const NAME: &str = "test.attribute";

    fn exchange() -> Exchange {
        Exchange::new(http::Request::get("/").body(()).unwrap())
    }

    #[test]
    fn test_replace_restores_previous_value() {
        let mut request = exchange();
        request.set_typed_attribute(NAME, 1_u8);
        let before = request.attribute(NAME).unwrap();

        {
            let scope = AttributeScope::replace(&mut request, NAME, Arc::new(2_u8));
            assert_eq!(scope.typed_attribute::<u8>(NAME).as_deref(), Some(&2));
        }

        let after = request.attribute(NAME).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_replace_removes_previously_absent_value() {
        let mut request = exchange();
        {
            let _scope = AttributeScope::replace(&mut request, NAME, Arc::new("temp"));
        }
        assert!(request.attribute(NAME).is_none());
    }

    #[test]
    fn test_save_restores_after_writes_through_scope() {
        let mut request = exchange();
        {
            let mut scope = AttributeScope::save(&mut request, NAME);
            scope.set_typed_attribute(NAME, 9_u32);
        }
        assert!(request.attribute(NAME).is_none());
    }

    #[test]
    fn test_restores_on_unwind() {
        let mut request = exchange();
        request.set_typed_attribute(NAME, 1_u8);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = AttributeScope::replace(&mut request, NAME, Arc::new(2_u8));
            panic!("router blew up");
        }));

        assert!(result.is_err());
        assert_eq!(request.typed_attribute::<u8>(NAME).as_deref(), Some(&1));
    }

    #[test]
    fn test_works_through_trait_objects() {
        let mut request = exchange();
        let dynamic: &mut dyn ServerRequest = &mut request;
        {
            let _scope = AttributeScope::replace(dynamic, NAME, Arc::new(true));
        }
        assert!(request.attribute(NAME).is_none());
    }
}
