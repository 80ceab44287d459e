#![forbid(unsafe_code)]

//! Snapshot-to-shadow-tree reconciliation.
//!
//! [`TreeReconciler::apply`] walks an incoming snapshot in lockstep with the
//! shadow tree (depth-first, pre-order), growing the tree for positions that
//! did not exist before, recording a reload for every reconciled position,
//! and emitting commands to an [`OutlineSink`] so the widget redraws only
//! what changed.
//!
//! # Phases
//!
//! One `apply` call is two strictly separated phases:
//!
//! 1. **Plan** ([`TreeReconciler::plan`]): the structural walk. Shadow
//!    values are updated, new positions are appended, and every insert and
//!    pending reload is recorded into an [`UpdatePlan`]. The sink is never
//!    called during the walk.
//! 2. **Emit** ([`UpdatePlan::emit`]): the recorded inserts are delivered
//!    inside a `begin_updates`/`end_updates` batch (when the sink supports
//!    [`BATCHED_INSERTS`]), then each pending reload is issued as
//!    `reload_item` against the value the widget is still displaying, the
//!    item's new value is resolved to a visible row via `row_for_item`, and
//!    all resolved rows are coalesced into a single `reload_rows` span,
//!    falling back to `reload_all` when nothing resolved.
//!
//! The split buys two guarantees. Rows are resolved only after the batch
//! closed, so no resolved index can be invalidated by a later structural
//! edit of the same `apply`; stale-index reloads are impossible by
//! construction rather than by re-validation. And the shadow tree is fully
//! reconciled before the first command is delivered, so a sink callback may
//! re-enter the data source's queries (the widget interleaving
//! [`OutlineDataSource`](crate::OutlineDataSource) documents).
//!
//! # Invariants
//!
//! 1. Shadow children never shrink; a position, once observed, keeps a node
//!    for the reconciler's lifetime. A snapshot shorter than its predecessor
//!    leaves trailing positions displaying their last value until a longer
//!    snapshot overwrites them.
//! 2. Every `insert_child` is emitted between `begin_updates` and
//!    `end_updates`. Batched sinks get the batch on every apply, inserts or
//!    not, and the batch is balanced even when the walk failed.
//! 3. A reload is queued for every reconciled position on every `apply`,
//!    whether or not its value changed (the widget cannot otherwise learn
//!    that nested content refreshed).
//! 4. Exactly one of `reload_rows`/`reload_all` closes a successful `apply`.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Provider fails for a value | That subtree's walk stops; siblings already reconciled keep their shadow state, and their recorded inserts are still delivered in the batch; the error propagates after the batch closes. No refresh phase runs. |
//! | Depth exceeds `max_depth` | Walk stops with [`ReconcileError::DepthLimit`]; same partial-application rules as a provider failure. |
//! | No reload resolved to a row | `reload_all` instead of a row range. |
//! | Sink lacks `BATCHED_INSERTS` and structure changed | Single `reload_all`; no inserts, no item reloads. |
//!
//! [`BATCHED_INSERTS`]: SinkCapabilities::BATCHED_INSERTS

use std::fmt;

use smallvec::SmallVec;

use crate::node::ShadowNode;
use crate::provider::{ChildrenProvider, ProviderError};
use crate::sink::{OutlineSink, SinkCapabilities};

/// Tuning knobs for [`TreeReconciler`].
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Maximum nesting depth the walk will descend to before giving up.
    ///
    /// The children provider is an external collaborator; nothing guarantees
    /// the tree it describes is finite. The depth bound turns a cyclic or
    /// pathologically deep provider into a [`ReconcileError::DepthLimit`]
    /// instead of unbounded recursion.
    ///
    /// Default: 64
    pub max_depth: usize,

    /// Whether to queue one extra reload per top-level element after the
    /// structural walk, forcing already-visible root rows to refresh even
    /// when only content deeper in the tree changed.
    ///
    /// Default: true
    pub refresh_roots: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            refresh_roots: true,
        }
    }
}

/// Error from [`TreeReconciler::apply`].
#[derive(Debug, Clone)]
pub enum ReconcileError {
    /// The children provider failed while expanding a subtree.
    Provider(ProviderError),
    /// The walk descended past [`ReconcileOptions::max_depth`].
    DepthLimit {
        /// The configured bound that was exceeded.
        limit: usize,
    },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(err) => {
                write!(f, "reconciliation aborted: {}", err.message())
            }
            Self::DepthLimit { limit } => {
                write!(
                    f,
                    "tree depth limit ({limit}) exceeded; children provider may be cyclic"
                )
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::DepthLimit { .. } => None,
        }
    }
}

impl From<ProviderError> for ReconcileError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

/// A structural insert recorded during the walk.
struct PlannedInsert<V> {
    index: usize,
    parent: Option<V>,
}

/// A reload queued during the structural walk, issued in the refresh phase.
///
/// `displayed` is the value the widget still shows for the position (reloads
/// must reference it, or the widget cannot locate the row); `current` is the
/// value just written to the shadow node (row resolution must use it, since
/// that is what the widget will display after the reload).
struct PendingReload<V> {
    displayed: V,
    current: V,
}

/// The commands one reconciliation pass decided to deliver.
///
/// Produced by [`TreeReconciler::plan`] after the shadow tree has been fully
/// updated; holds no borrow of the reconciler. A plan that recorded a walk
/// failure still delivers its structural batch on emit, then returns the
/// error instead of running the refresh phase.
#[must_use = "an update plan does nothing until emitted to a sink"]
pub struct UpdatePlan<V> {
    inserts: SmallVec<[PlannedInsert<V>; 8]>,
    reloads: SmallVec<[PendingReload<V>; 8]>,
    structure_changed: bool,
    error: Option<ReconcileError>,
}

impl<V> fmt::Debug for UpdatePlan<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePlan")
            .field("inserts", &self.inserts.len())
            .field("reloads", &self.reloads.len())
            .field("structure_changed", &self.structure_changed)
            .field("error", &self.error)
            .finish()
    }
}

impl<V> UpdatePlan<V> {
    /// Deliver the planned commands to `sink`.
    ///
    /// Command order follows the [`OutlineSink`](crate::sink) contract:
    /// batch + inserts, then item reloads, then exactly one of
    /// `reload_rows`/`reload_all`. Returns the walk's error, if any, once
    /// the structural batch has been delivered.
    pub fn emit<S>(self, sink: &mut S) -> Result<(), ReconcileError>
    where
        S: OutlineSink<V>,
    {
        let caps = sink.capabilities();
        let batched = caps.contains(SinkCapabilities::BATCHED_INSERTS);

        if batched {
            sink.begin_updates();
            for insert in &self.inserts {
                sink.insert_child(insert.index, insert.parent.as_ref());
            }
            // The widget requires balanced batches even on a failed walk.
            sink.end_updates();
        }
        if let Some(err) = self.error {
            return Err(err);
        }

        if !batched && self.structure_changed {
            // Without insert support the widget has no structural
            // notifications to go on; only a full reload is sound.
            #[cfg(feature = "tracing")]
            tracing::debug!("structure changed on an insert-less sink; full reload");
            sink.reload_all();
            return Ok(());
        }

        if !caps.contains(SinkCapabilities::ROW_RANGE_RELOAD) {
            for reload in &self.reloads {
                sink.reload_item(&reload.displayed);
            }
            sink.reload_all();
            return Ok(());
        }

        // Refresh phase: item reloads, then one coalesced row-range reload
        // covering every reload that resolved to a visible row.
        let mut span: Option<(usize, usize)> = None;
        for reload in &self.reloads {
            sink.reload_item(&reload.displayed);
            if let Some(row) = sink.row_for_item(&reload.current) {
                span = Some(match span {
                    None => (row, row),
                    Some((first, last)) => (first.min(row), last.max(row)),
                });
            }
        }
        match span {
            Some((first, last)) => sink.reload_rows(first, last),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no reload resolved to a visible row; full reload");
                sink.reload_all();
            }
        }
        Ok(())
    }
}

/// Diffs whole snapshots against a persistent shadow tree and emits update
/// commands to an [`OutlineSink`].
///
/// The reconciler exclusively owns its shadow tree. It is single-threaded:
/// the caller must serialize `apply` calls (GUI toolkits require model
/// mutation on one designated thread anyway).
pub struct TreeReconciler<V, P> {
    root: ShadowNode<V>,
    provider: P,
    options: ReconcileOptions,
}

impl<V, P> fmt::Debug for TreeReconciler<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeReconciler")
            .field("top_level", &self.root.child_count())
            .field("options", &self.options)
            .finish()
    }
}

impl<V, P> TreeReconciler<V, P>
where
    V: Clone,
    P: ChildrenProvider<V>,
{
    /// Create a reconciler with default [`ReconcileOptions`].
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ReconcileOptions::default())
    }

    /// Create a reconciler with explicit options.
    pub fn with_options(provider: P, options: ReconcileOptions) -> Self {
        Self {
            root: ShadowNode::root(),
            provider,
            options,
        }
    }

    /// The shadow tree root (implicit, valueless).
    #[must_use]
    pub fn root(&self) -> &ShadowNode<V> {
        &self.root
    }

    /// The children provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Reconcile a new snapshot of top-level elements against the shadow
    /// tree, emitting update commands to `sink`.
    ///
    /// Equivalent to [`plan`](Self::plan) followed by
    /// [`UpdatePlan::emit`]. On error, shadow mutations stay applied and
    /// the structural batch is still delivered (best-effort refresh); only
    /// the refresh phase is skipped.
    pub fn apply<S>(&mut self, snapshot: &[V], sink: &mut S) -> Result<(), ReconcileError>
    where
        S: OutlineSink<V>,
    {
        self.plan(snapshot).emit(sink)
    }

    /// Run the structural walk for `snapshot`, returning the commands to
    /// deliver.
    ///
    /// The shadow tree is fully reconciled when this returns (even on a
    /// recorded walk failure, up to the failing subtree); no sink is
    /// involved, so the caller may release any shared ownership of the
    /// reconciler before emitting and sink callbacks may re-query it.
    pub fn plan(&mut self, snapshot: &[V]) -> UpdatePlan<V> {
        #[cfg(feature = "tracing")]
        tracing::trace!(len = snapshot.len(), "planning snapshot update");

        let mut walk = Walk {
            provider: &self.provider,
            options: &self.options,
            inserts: SmallVec::new(),
            reloads: SmallVec::new(),
            structure_changed: false,
        };
        let result = walk.children(&mut self.root, None, snapshot, 0);
        if result.is_ok() && self.options.refresh_roots {
            for value in snapshot {
                walk.reloads.push(PendingReload {
                    displayed: value.clone(),
                    current: value.clone(),
                });
            }
        }
        UpdatePlan {
            inserts: walk.inserts,
            reloads: walk.reloads,
            structure_changed: walk.structure_changed,
            error: result.err(),
        }
    }
}

/// Walk state, split off `TreeReconciler` so the shadow root can be mutated
/// while the provider and options are shared.
struct Walk<'a, V, P> {
    provider: &'a P,
    options: &'a ReconcileOptions,
    inserts: SmallVec<[PlannedInsert<V>; 8]>,
    reloads: SmallVec<[PendingReload<V>; 8]>,
    structure_changed: bool,
}

impl<V, P> Walk<'_, V, P>
where
    V: Clone,
    P: ChildrenProvider<V>,
{
    /// Reconcile `values` against `node`'s children. `parent` is the value
    /// identifying `node`'s own position to the widget (`None` = root).
    fn children(
        &mut self,
        node: &mut ShadowNode<V>,
        parent: Option<&V>,
        values: &[V],
        depth: usize,
    ) -> Result<(), ReconcileError> {
        if values.is_empty() {
            return Ok(());
        }
        if depth > self.options.max_depth {
            return Err(ReconcileError::DepthLimit {
                limit: self.options.max_depth,
            });
        }
        for (index, value) in values.iter().enumerate() {
            let child = if index == node.child_count() {
                // Position did not exist before: grow the shadow tree and
                // record the structural insert.
                self.structure_changed = true;
                self.inserts.push(PlannedInsert {
                    index,
                    parent: parent.cloned(),
                });
                node.append_child(value.clone())
            } else {
                node.child_mut(index)
                    .expect("index below child_count, checked above")
            };
            self.value(child, value, depth)?;
        }
        Ok(())
    }

    /// Assign `value` to `node`, queue its reload, and recurse into the
    /// children the provider reports for it.
    fn value(
        &mut self,
        node: &mut ShadowNode<V>,
        value: &V,
        depth: usize,
    ) -> Result<(), ReconcileError> {
        let displayed = node
            .replace_value(value.clone())
            .unwrap_or_else(|| value.clone());
        self.reloads.push(PendingReload {
            displayed,
            current: value.clone(),
        });
        let children = self.provider.children(value)?;
        self.children(node, Some(value), &children, depth + 1)
    }
}
