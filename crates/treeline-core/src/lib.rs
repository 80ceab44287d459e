#![forbid(unsafe_code)]

//! Core reconciliation engine for Treeline.
//!
//! A tree-shaped widget (an outline view) queries its model lazily: how many
//! children does this item have, which item sits at this index. An upstream
//! producer, by contrast, delivers complete snapshots of the top-level
//! elements with no diff information. This crate bridges the two worlds:
//!
//! - [`ShadowNode`] — a private mirror of the widget's displayed hierarchy.
//! - [`ChildrenProvider`] — the caller-supplied function mapping a value to
//!   its ordered children.
//! - [`TreeReconciler`] — diffs each incoming snapshot against the shadow
//!   tree and emits the minimal command set to the widget.
//! - [`OutlineSink`] — the command contract a concrete widget adapter
//!   implements (batched inserts, item/range/full reloads).
//! - [`OutlineDataSource`] — the widget-facing query surface plus the
//!   snapshot entry point.
//!
//! # Data flow
//!
//! ```text
//! snapshot ──► OutlineDataSource::apply ──► TreeReconciler
//!                                               │ mutates shadow tree
//!                                               ▼
//!                                          OutlineSink commands
//!                                               │
//!                                               ▼
//!                widget redraws, querying OutlineDataSource back
//! ```
//!
//! Everything is single-threaded and synchronous; see the module docs of
//! [`reconcile`] for the ordering and batching guarantees.

pub mod node;
pub mod provider;
pub mod reconcile;
pub mod sink;
pub mod source;

pub use node::ShadowNode;
pub use provider::{ChildrenProvider, FromFn, ProviderError, from_fn};
pub use reconcile::{ReconcileError, ReconcileOptions, TreeReconciler, UpdatePlan};
pub use sink::{OutlineSink, SinkCapabilities};
pub use source::OutlineDataSource;
