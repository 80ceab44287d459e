#![forbid(unsafe_code)]

//! Children providers.
//!
//! The reconciler treats the shape of the tree below each value as external
//! knowledge: a [`ChildrenProvider`] maps a value to its ordered list of
//! children. The provider is supplied once at construction time and must be
//! deterministic for a given value within one `apply` call — the reconciler
//! may invoke it more than once per node per call (once while diffing, again
//! when the widget re-queries through the data source).
//!
//! Providers are fallible: a provider that cannot compute a child list
//! returns [`ProviderError`], which aborts reconciliation of that subtree
//! (and only that subtree; see [`reconcile`](crate::reconcile) for the
//! partial-failure contract).

use std::fmt;

/// Error raised by a [`ChildrenProvider`] while computing a child list.
#[derive(Debug, Clone)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Create a provider error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "children provider failed: {}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Maps a value to its ordered children.
///
/// Implemented directly by stateful providers, or obtained from closures:
/// any `Fn(&V) -> Result<Vec<V>, ProviderError>` is a provider, and
/// [`from_fn`] wraps an infallible `Fn(&V) -> Vec<V>`.
pub trait ChildrenProvider<V> {
    /// The ordered children of `value`.
    fn children(&self, value: &V) -> Result<Vec<V>, ProviderError>;
}

impl<V, F> ChildrenProvider<V> for F
where
    F: Fn(&V) -> Result<Vec<V>, ProviderError>,
{
    fn children(&self, value: &V) -> Result<Vec<V>, ProviderError> {
        self(value)
    }
}

/// Provider adapter returned by [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

impl<V, F> ChildrenProvider<V> for FromFn<F>
where
    F: Fn(&V) -> Vec<V>,
{
    fn children(&self, value: &V) -> Result<Vec<V>, ProviderError> {
        Ok((self.0)(value))
    }
}

/// Wrap an infallible children function as a [`ChildrenProvider`].
///
/// ```
/// use treeline_core::{ChildrenProvider, from_fn};
///
/// let provider = from_fn(|v: &i32| if *v == 1 { vec![10, 11] } else { vec![] });
/// assert_eq!(provider.children(&1).unwrap(), vec![10, 11]);
/// assert!(provider.children(&2).unwrap().is_empty());
/// ```
pub fn from_fn<V, F>(f: F) -> FromFn<F>
where
    F: Fn(&V) -> Vec<V>,
{
    FromFn(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_provider_propagates_errors() {
        let provider = |v: &&str| {
            if *v == "bad" {
                Err(ProviderError::new("no children for bad"))
            } else {
                Ok(vec![])
            }
        };
        assert!(provider.children(&"ok").is_ok());
        let err = provider.children(&"bad").unwrap_err();
        assert!(err.to_string().contains("no children for bad"));
    }

    #[test]
    fn from_fn_never_fails() {
        let provider = from_fn(|v: &i32| vec![v + 1]);
        assert_eq!(provider.children(&1).unwrap(), vec![2]);
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::new("timeout");
        assert_eq!(err.to_string(), "children provider failed: timeout");
        assert_eq!(err.message(), "timeout");
    }
}
