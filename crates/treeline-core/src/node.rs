#![forbid(unsafe_code)]

//! Shadow tree nodes.
//!
//! A [`ShadowNode`] is the reconciler's private mirror of one displayed
//! position: the value last assigned to that position plus the ordered list
//! of child nodes. It is plain data — every invariant (positional order,
//! grow-only children, `value = None` only at the root) is maintained by
//! [`TreeReconciler`](crate::TreeReconciler), not self-enforced here.
//!
//! Nodes are created lazily the first time a position is observed and live
//! for the reconciler's entire lifetime. Positions beyond the current
//! snapshot's length keep their last node; the tree never shrinks.

/// One position in the shadow tree.
///
/// `value` is `None` only for the implicit root; every descendant node is
/// created with a value and keeps one from then on. Child order is
/// positional order in the widget.
#[derive(Debug, Clone)]
pub struct ShadowNode<V> {
    value: Option<V>,
    children: Vec<ShadowNode<V>>,
}

impl<V> ShadowNode<V> {
    /// Create the implicit root node (no value, no children).
    #[must_use]
    pub fn root() -> Self {
        Self {
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a node holding `value`.
    #[must_use]
    pub fn with_value(value: V) -> Self {
        Self {
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// The value last assigned to this position, if any.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Assign a new value, returning the previous one.
    pub fn replace_value(&mut self, value: V) -> Option<V> {
        self.value.replace(value)
    }

    /// Child node at `index`, if that position exists.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&ShadowNode<V>> {
        self.children.get(index)
    }

    /// Mutable child node at `index`, if that position exists.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut ShadowNode<V>> {
        self.children.get_mut(index)
    }

    /// Number of child positions currently mirrored.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Append a new child position holding `value`, returning it.
    pub fn append_child(&mut self, value: V) -> &mut ShadowNode<V> {
        self.children.push(ShadowNode::with_value(value));
        self.children
            .last_mut()
            .expect("children is non-empty after push")
    }

    /// Iterate over child nodes in positional order.
    pub fn children(&self) -> impl Iterator<Item = &ShadowNode<V>> {
        self.children.iter()
    }
}

impl<V> Default for ShadowNode<V> {
    fn default() -> Self {
        Self::root()
    }
}
