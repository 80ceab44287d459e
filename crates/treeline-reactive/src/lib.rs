#![forbid(unsafe_code)]

//! Reactive layer for Treeline.
//!
//! The core reconciler is pull-driven: someone hands it a snapshot. This
//! crate supplies the push side:
//!
//! - [`Observable`]: a shared, version-tracked value cell with change
//!   notification via subscriber callbacks.
//! - [`Publisher`] / [`Event`]: a push stream carrying
//!   value / error / completed events with terminal semantics.
//! - [`OutlineBinding`]: subscribes a snapshot stream to an
//!   [`OutlineDataSource`](treeline_core::OutlineDataSource) and a sink,
//!   applying each arriving snapshot and routing failures to the binding
//!   error channel.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); snapshots must be
//! produced on the thread that owns the widget.

pub mod binding;
pub mod observable;
pub mod stream;

pub use binding::OutlineBinding;
pub use observable::{Observable, Subscription};
pub use stream::{Event, Publisher, StreamError};
