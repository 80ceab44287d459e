#![forbid(unsafe_code)]

//! The widget command contract.
//!
//! The reconciler never touches a widget directly; it emits commands through
//! an [`OutlineSink`]. A concrete adapter translates them into the host
//! toolkit's calls (for an outline view: `beginUpdates`/`endUpdates`,
//! `insertItems`, `reloadItem`, `reloadDataForRowIndexes`, `reloadData`).
//!
//! # Ordering contract
//!
//! Commands arrive in the order the reconciler produces them:
//!
//! 1. `begin_updates` (only when [`SinkCapabilities::BATCHED_INSERTS`]);
//! 2. zero or more `insert_child` calls, all between the batch boundaries;
//! 3. `end_updates` — always delivered once `begin_updates` was, even when
//!    reconciliation fails mid-walk (the batch stays balanced);
//! 4. `reload_item` calls, each optionally followed by a `row_for_item`
//!    query, all outside the batch;
//! 5. exactly one of `reload_rows` or `reload_all`.
//!
//! `row_for_item` is the only sink method the reconciler reads from: it asks
//! which visible row an item occupies so item reloads can be coalesced into
//! one row-range reload. Items hidden under a collapsed ancestor resolve to
//! `None` and simply do not contribute to the range.
//!
//! # Capabilities
//!
//! Not every widget supports fine-grained structural edits. A sink reports
//! what it can do via [`SinkCapabilities`]; the reconciler degrades
//! gracefully (see the flag docs). The default is everything.

use bitflags::bitflags;

bitflags! {
    /// What a concrete [`OutlineSink`] supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SinkCapabilities: u8 {
        /// The widget accepts `insert_child` commands inside a
        /// `begin_updates`/`end_updates` batch. Without this flag the
        /// reconciler emits no structural commands at all and issues
        /// `reload_all` whenever the tree's structure changed.
        const BATCHED_INSERTS = 1 << 0;
        /// `row_for_item` and `reload_rows` are meaningful. Without this
        /// flag the refresh phase ends in `reload_all` instead of a
        /// coalesced row range.
        const ROW_RANGE_RELOAD = 1 << 1;
    }
}

impl Default for SinkCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Command surface of the tree widget, as seen by the reconciler.
///
/// Items are identified by value: the widget's notion of a row's identity is
/// the `V` it was last handed through the data source, which is why reloads
/// reference the *previously displayed* value (the widget cannot locate a
/// row by a value it has never seen).
pub trait OutlineSink<V> {
    /// Open a structural-edit batch. Inserts are only valid inside one.
    fn begin_updates(&mut self);

    /// Close the current structural-edit batch.
    fn end_updates(&mut self);

    /// A new child appeared at `index` under `parent` (`None` = the root).
    fn insert_child(&mut self, index: usize, parent: Option<&V>);

    /// Refresh the row currently displaying `item` in place.
    fn reload_item(&mut self, item: &V);

    /// The visible row `item` occupies, or `None` when it is not currently
    /// visible (collapsed ancestor, never displayed).
    fn row_for_item(&mut self, item: &V) -> Option<usize>;

    /// Refresh the contiguous visible rows `first..=last`.
    fn reload_rows(&mut self, first: usize, last: usize);

    /// Refresh everything.
    fn reload_all(&mut self);

    /// What this sink supports. Defaults to [`SinkCapabilities::all`].
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::all()
    }
}
