#![forbid(unsafe_code)]

//! Test harness for Treeline.
//!
//! Real outline widgets are awkward test subjects: they are stateful,
//! toolkit-bound, and answer row queries from layout state. This crate
//! substitutes deterministic fixtures:
//!
//! - [`RecordingOutline`] — an [`OutlineSink`] that records every command in
//!   arrival order and answers `row_for_item` from an explicit item→row
//!   table (an item absent from the table behaves like a collapsed row).
//! - [`StaticTree`] — a map-backed [`ChildrenProvider`] with injectable
//!   per-value failures.
//! - [`strategies`] — proptest generators shared by the invariant suites.
//!
//! # Invariants checked by the fixtures themselves
//!
//! `RecordingOutline` never panics on protocol violations; it records what
//! actually happened and exposes [`batch_balanced`](RecordingOutline::batch_balanced)
//! and [`inserts_inside_batch`](RecordingOutline::inserts_inside_batch) so a
//! test can assert the discipline explicitly.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use treeline_core::{ChildrenProvider, OutlineSink, ProviderError, SinkCapabilities};

/// One recorded sink command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand<V> {
    /// `begin_updates`.
    BeginUpdates,
    /// `end_updates`.
    EndUpdates,
    /// `insert_child(index, parent)` (parent `None` = root).
    InsertChild { index: usize, parent: Option<V> },
    /// `reload_item(item)`.
    ReloadItem(V),
    /// `reload_rows(first, last)`.
    ReloadRows { first: usize, last: usize },
    /// `reload_all`.
    ReloadAll,
}

/// Recording fake of an outline widget.
///
/// Row resolution is driven by a table the test sets up in advance:
/// [`set_row`](Self::set_row) marks an item visible at a row,
/// anything else resolves to `None`.
#[derive(Debug, Clone)]
pub struct RecordingOutline<V> {
    commands: Vec<SinkCommand<V>>,
    rows: AHashMap<V, usize>,
    capabilities: SinkCapabilities,
}

impl<V> RecordingOutline<V>
where
    V: Clone + Eq + Hash,
{
    /// A recording sink advertising every capability.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(SinkCapabilities::all())
    }

    /// A recording sink advertising exactly `capabilities`.
    #[must_use]
    pub fn with_capabilities(capabilities: SinkCapabilities) -> Self {
        Self {
            commands: Vec::new(),
            rows: AHashMap::new(),
            capabilities,
        }
    }

    /// Mark `item` as visible at `row` for `row_for_item` resolution.
    pub fn set_row(&mut self, item: V, row: usize) {
        self.rows.insert(item, row);
    }

    /// Forget all visible rows (everything resolves to `None` again).
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// All commands recorded so far, in arrival order.
    #[must_use]
    pub fn commands(&self) -> &[SinkCommand<V>] {
        &self.commands
    }

    /// Drain and return the recorded commands.
    pub fn take_commands(&mut self) -> Vec<SinkCommand<V>> {
        std::mem::take(&mut self.commands)
    }

    /// The recorded `insert_child` commands, in order.
    #[must_use]
    pub fn inserts(&self) -> Vec<(usize, Option<V>)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SinkCommand::InsertChild { index, parent } => Some((*index, parent.clone())),
                _ => None,
            })
            .collect()
    }

    /// The items reloaded so far, in order.
    #[must_use]
    pub fn reloaded_items(&self) -> Vec<V> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SinkCommand::ReloadItem(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    /// The last recorded command, if any.
    #[must_use]
    pub fn last_command(&self) -> Option<&SinkCommand<V>> {
        self.commands.last()
    }

    /// Whether every `begin_updates` was matched by an `end_updates`, with
    /// no `end_updates` arriving unopened.
    #[must_use]
    pub fn batch_balanced(&self) -> bool {
        let mut depth: isize = 0;
        for command in &self.commands {
            match command {
                SinkCommand::BeginUpdates => depth += 1,
                SinkCommand::EndUpdates => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }

    /// Whether every recorded insert arrived inside an open batch.
    #[must_use]
    pub fn inserts_inside_batch(&self) -> bool {
        let mut depth: usize = 0;
        for command in &self.commands {
            match command {
                SinkCommand::BeginUpdates => depth += 1,
                SinkCommand::EndUpdates => depth = depth.saturating_sub(1),
                SinkCommand::InsertChild { .. } if depth == 0 => return false,
                _ => {}
            }
        }
        true
    }
}

impl<V> Default for RecordingOutline<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OutlineSink<V> for RecordingOutline<V>
where
    V: Clone + Eq + Hash,
{
    fn begin_updates(&mut self) {
        self.commands.push(SinkCommand::BeginUpdates);
    }

    fn end_updates(&mut self) {
        self.commands.push(SinkCommand::EndUpdates);
    }

    fn insert_child(&mut self, index: usize, parent: Option<&V>) {
        self.commands.push(SinkCommand::InsertChild {
            index,
            parent: parent.cloned(),
        });
    }

    fn reload_item(&mut self, item: &V) {
        self.commands.push(SinkCommand::ReloadItem(item.clone()));
    }

    fn row_for_item(&mut self, item: &V) -> Option<usize> {
        self.rows.get(item).copied()
    }

    fn reload_rows(&mut self, first: usize, last: usize) {
        self.commands.push(SinkCommand::ReloadRows { first, last });
    }

    fn reload_all(&mut self) {
        self.commands.push(SinkCommand::ReloadAll);
    }

    fn capabilities(&self) -> SinkCapabilities {
        self.capabilities
    }
}

/// Map-backed children provider with injectable failures.
///
/// Values without an entry are leaves. `fail_on` makes the provider return
/// [`ProviderError`] for a specific value, for exercising partial-failure
/// paths.
#[derive(Debug, Clone)]
pub struct StaticTree<V> {
    children: AHashMap<V, Vec<V>>,
    failing: AHashSet<V>,
}

impl<V> StaticTree<V>
where
    V: Clone + Eq + Hash,
{
    /// An all-leaves tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: AHashMap::new(),
            failing: AHashSet::new(),
        }
    }

    /// Declare the children of `parent` (builder style).
    #[must_use]
    pub fn child(mut self, parent: V, children: Vec<V>) -> Self {
        self.children.insert(parent, children);
        self
    }

    /// Make the provider fail for `value` (builder style).
    #[must_use]
    pub fn fail_on(mut self, value: V) -> Self {
        self.failing.insert(value);
        self
    }
}

impl<V> Default for StaticTree<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ChildrenProvider<V> for StaticTree<V>
where
    V: Clone + Eq + Hash,
{
    fn children(&self, value: &V) -> Result<Vec<V>, ProviderError> {
        if self.failing.contains(value) {
            return Err(ProviderError::new("injected failure"));
        }
        Ok(self.children.get(value).cloned().unwrap_or_default())
    }
}

/// Proptest strategies shared by the invariant suites.
pub mod strategies {
    use proptest::prelude::*;

    const LABELS: &[&str] = &["A", "B", "C", "D", "E", "F", "G", "H"];

    /// One element label from a small alphabet (collisions are deliberate:
    /// repeated labels across snapshots exercise value reuse).
    pub fn label() -> impl Strategy<Value = String> {
        proptest::sample::select(LABELS).prop_map(str::to_owned)
    }

    /// A top-level snapshot of up to `max_len` labels.
    pub fn snapshot(max_len: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(label(), 0..=max_len)
    }

    /// A pair of consecutive snapshots.
    pub fn snapshot_pair(max_len: usize) -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
        (snapshot(max_len), snapshot(max_len))
    }
}
