#![forbid(unsafe_code)]

//! Widget-facing data source.
//!
//! An outline widget pulls its model lazily through three queries: how many
//! children an item has, which item sits at a given index, and whether an
//! item is expandable. [`OutlineDataSource`] answers them from two places:
//! the shadow tree for the implicit root (the only level the reconciler owns
//! wholesale) and the [`ChildrenProvider`] for everything below it.
//!
//! Queries are synchronous and side-effect-free. They return `Result`
//! because the provider is fallible; a widget adapter that cannot propagate
//! errors decides how to degrade (typically: report zero children).
//!
//! The widget calls these queries re-entrantly while servicing the commands
//! an [`apply`](OutlineDataSource::apply) emitted. That interleaving is
//! safe: `apply` plans the whole update first, releasing its exclusive hold
//! on the reconciler before the first command is delivered, so a sink
//! callback querying back into this type only ever takes shared borrows.
//! Everything here takes `&self`; the facade is meant to be shared (`Rc`)
//! between the binding and the widget adapter.

use std::cell::{Ref, RefCell};
use std::fmt;

use crate::node::ShadowNode;
use crate::provider::{ChildrenProvider, ProviderError};
use crate::reconcile::{ReconcileError, ReconcileOptions, TreeReconciler};
use crate::sink::OutlineSink;

/// Lazily-queried model facade over a [`TreeReconciler`].
pub struct OutlineDataSource<V, P> {
    reconciler: RefCell<TreeReconciler<V, P>>,
}

impl<V, P> fmt::Debug for OutlineDataSource<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineDataSource")
            .field("reconciler", &self.reconciler.borrow())
            .finish()
    }
}

impl<V, P> OutlineDataSource<V, P>
where
    V: Clone,
    P: ChildrenProvider<V>,
{
    /// Create a data source with default [`ReconcileOptions`].
    pub fn new(provider: P) -> Self {
        Self {
            reconciler: RefCell::new(TreeReconciler::new(provider)),
        }
    }

    /// Create a data source with explicit reconciler options.
    pub fn with_options(provider: P, options: ReconcileOptions) -> Self {
        Self {
            reconciler: RefCell::new(TreeReconciler::with_options(provider, options)),
        }
    }

    /// Number of children of `item`, or of the implicit root for `None`.
    ///
    /// The root count comes from the shadow tree (it reflects every position
    /// ever observed, including stale trailing ones); any other count comes
    /// from the provider.
    pub fn child_count(&self, item: Option<&V>) -> Result<usize, ProviderError> {
        let reconciler = self.reconciler.borrow();
        match item {
            None => Ok(reconciler.root().child_count()),
            Some(value) => Ok(reconciler.provider().children(value)?.len()),
        }
    }

    /// The child of `item` (or of the root for `None`) at `index`.
    ///
    /// `Ok(None)` when the index is out of range.
    pub fn child(&self, index: usize, item: Option<&V>) -> Result<Option<V>, ProviderError> {
        let reconciler = self.reconciler.borrow();
        match item {
            None => Ok(reconciler
                .root()
                .child(index)
                .and_then(ShadowNode::value)
                .cloned()),
            Some(value) => Ok(reconciler
                .provider()
                .children(value)?
                .into_iter()
                .nth(index)),
        }
    }

    /// Whether `item` has any children (the widget's expandability test).
    pub fn is_expandable(&self, item: &V) -> Result<bool, ProviderError> {
        Ok(self.child_count(Some(item))? > 0)
    }

    /// Reconcile a new snapshot of top-level elements, emitting update
    /// commands to `sink`. See [`TreeReconciler::apply`].
    ///
    /// The reconciler is borrowed exclusively only while the update is
    /// planned; by the time `sink` receives its first command the borrow is
    /// gone, so the sink may query this data source freely.
    pub fn apply<S>(&self, snapshot: &[V], sink: &mut S) -> Result<(), ReconcileError>
    where
        S: OutlineSink<V>,
    {
        let plan = self.reconciler.borrow_mut().plan(snapshot);
        plan.emit(sink)
    }

    /// Read-only view of the shadow tree root.
    ///
    /// Holds a shared borrow of the reconciler for the guard's lifetime; do
    /// not keep it across an [`apply`](Self::apply).
    #[must_use]
    pub fn shadow_root(&self) -> Ref<'_, ShadowNode<V>> {
        Ref::map(self.reconciler.borrow(), TreeReconciler::root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::from_fn;
    use crate::sink::SinkCapabilities;

    /// Sink that drops every command; facade tests only care about queries.
    struct DiscardSink;

    impl<V> OutlineSink<V> for DiscardSink {
        fn begin_updates(&mut self) {}
        fn end_updates(&mut self) {}
        fn insert_child(&mut self, _index: usize, _parent: Option<&V>) {}
        fn reload_item(&mut self, _item: &V) {}
        fn row_for_item(&mut self, _item: &V) -> Option<usize> {
            None
        }
        fn reload_rows(&mut self, _first: usize, _last: usize) {}
        fn reload_all(&mut self) {}
        fn capabilities(&self) -> SinkCapabilities {
            SinkCapabilities::all()
        }
    }

    /// Sink that queries the data source back while servicing commands, the
    /// way a live widget does.
    struct RequeryingSink<'a, P> {
        source: &'a OutlineDataSource<&'static str, P>,
        root_counts: Vec<usize>,
    }

    impl<P> OutlineSink<&'static str> for RequeryingSink<'_, P>
    where
        P: ChildrenProvider<&'static str>,
    {
        fn begin_updates(&mut self) {}
        fn end_updates(&mut self) {}
        fn insert_child(&mut self, _index: usize, _parent: Option<&&'static str>) {
            self.root_counts
                .push(self.source.child_count(None).unwrap());
        }
        fn reload_item(&mut self, _item: &&'static str) {
            self.root_counts
                .push(self.source.child_count(None).unwrap());
        }
        fn row_for_item(&mut self, _item: &&'static str) -> Option<usize> {
            None
        }
        fn reload_rows(&mut self, _first: usize, _last: usize) {}
        fn reload_all(&mut self) {}
    }

    fn source() -> OutlineDataSource<&'static str, impl ChildrenProvider<&'static str>> {
        OutlineDataSource::new(from_fn(|v: &&'static str| {
            if *v == "A" { vec!["X", "Y"] } else { vec![] }
        }))
    }

    #[test]
    fn root_queries_come_from_the_shadow_tree() {
        let src = source();
        assert_eq!(src.child_count(None).unwrap(), 0);

        src.apply(&["A", "B"], &mut DiscardSink).unwrap();
        assert_eq!(src.child_count(None).unwrap(), 2);
        assert_eq!(src.child(0, None).unwrap(), Some("A"));
        assert_eq!(src.child(1, None).unwrap(), Some("B"));
        assert_eq!(src.child(2, None).unwrap(), None);
    }

    #[test]
    fn non_root_queries_come_from_the_provider() {
        let src = source();
        // The provider answers even before any snapshot was applied.
        assert_eq!(src.child_count(Some(&"A")).unwrap(), 2);
        assert_eq!(src.child(1, Some(&"A")).unwrap(), Some("Y"));
        assert_eq!(src.child(5, Some(&"A")).unwrap(), None);
        assert_eq!(src.child_count(Some(&"B")).unwrap(), 0);
    }

    #[test]
    fn expandability_mirrors_child_count() {
        let src = source();
        assert!(src.is_expandable(&"A").unwrap());
        assert!(!src.is_expandable(&"B").unwrap());
    }

    #[test]
    fn provider_failure_surfaces_in_queries() {
        let src: OutlineDataSource<&'static str, _> = OutlineDataSource::new(
            |_: &&'static str| -> Result<Vec<&'static str>, ProviderError> {
                Err(ProviderError::new("offline"))
            },
        );
        assert!(src.child_count(Some(&"A")).is_err());
        assert!(src.is_expandable(&"A").is_err());
        // Root queries never touch the provider.
        assert_eq!(src.child_count(None).unwrap(), 0);
    }

    #[test]
    fn stale_root_positions_stay_queryable() {
        let src = source();
        src.apply(&["B", "C", "D"], &mut DiscardSink).unwrap();
        src.apply(&["B"], &mut DiscardSink).unwrap();
        // Grow-only shadow tree: the widget still sees three root rows.
        assert_eq!(src.child_count(None).unwrap(), 3);
        assert_eq!(src.child(2, None).unwrap(), Some("D"));
    }

    #[test]
    fn queries_are_answerable_while_commands_run() {
        let src = source();
        src.apply(&["B"], &mut DiscardSink).unwrap();

        let mut sink = RequeryingSink {
            source: &src,
            root_counts: Vec::new(),
        };
        src.apply(&["B", "C"], &mut sink).unwrap();

        // Every command (the insert for "C" plus all reloads) could query
        // back in, and each saw the fully reconciled root.
        assert!(!sink.root_counts.is_empty());
        assert!(
            sink.root_counts.iter().all(|&count| count == 2),
            "mid-apply queries see the reconciled tree: {:?}",
            sink.root_counts
        );
    }

    #[test]
    fn shadow_root_guard_reads_the_current_tree() {
        let src = source();
        src.apply(&["A"], &mut DiscardSink).unwrap();
        let root = src.shadow_root();
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child(0).and_then(ShadowNode::value), Some(&"A"));
    }
}
