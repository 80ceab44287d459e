#![forbid(unsafe_code)]

//! Binding snapshot streams into outline data sources.
//!
//! [`OutlineBinding`] is the glue between the push and pull worlds: it
//! subscribes to a [`Publisher`] of snapshots and applies each arriving
//! snapshot to an [`OutlineDataSource`], emitting widget commands through
//! the supplied sink.
//!
//! # Error channel
//!
//! Neither upstream errors nor apply failures propagate out of the stream
//! callback — there is nobody to propagate to. Both are reported through
//! `tracing::error!` (the host's binding-error channel) and the display
//! keeps its last consistent state.
//!
//! # Teardown
//!
//! The binding holds the only strong reference to its stream callback;
//! dropping the binding unsubscribes. The data source is a shared handle
//! (`Rc`, all its operations take `&self`) and the sink a shared mutable
//! one (`Rc<RefCell<..>>`), so the widget adapter keeps querying the data
//! source after the binding is gone — and while a snapshot is being
//! applied, since the data source plans each update before the first
//! command reaches the sink.
//!
//! # Invariants
//!
//! 1. Snapshots are applied in arrival order, one at a time.
//! 2. A failed apply leaves the shadow tree in its partially-updated state
//!    and does not prevent later snapshots from applying.
//! 3. After `Completed`, the last applied snapshot stays displayed.
//! 4. After drop, no snapshot is ever applied through this binding again.
//! 5. Sink callbacks may re-query the data source mid-apply.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use treeline_core::{ChildrenProvider, OutlineDataSource, OutlineSink};

use crate::observable::Subscription;
use crate::stream::{Event, Publisher};

/// Live connection from a snapshot stream to an outline data source + sink.
pub struct OutlineBinding<V, P, S> {
    source: Rc<OutlineDataSource<V, P>>,
    sink: Rc<RefCell<S>>,
    _subscription: Subscription,
}

impl<V, P, S> fmt::Debug for OutlineBinding<V, P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineBinding").finish()
    }
}

impl<V, P, S> OutlineBinding<V, P, S>
where
    V: Clone + 'static,
    P: ChildrenProvider<V> + 'static,
    S: OutlineSink<V> + 'static,
{
    /// Subscribe `stream` to `source`/`sink`.
    ///
    /// Each `Next(snapshot)` is applied immediately on the delivering
    /// thread; `Error` is reported and ends the stream; `Completed` leaves
    /// the last snapshot displayed.
    pub fn bind(
        stream: &Publisher<Vec<V>>,
        source: Rc<OutlineDataSource<V, P>>,
        sink: Rc<RefCell<S>>,
    ) -> Self {
        let src = Rc::clone(&source);
        let snk = Rc::clone(&sink);
        let subscription = stream.subscribe(move |event| match event {
            Event::Next(snapshot) => {
                if let Err(err) = src.apply(snapshot, &mut *snk.borrow_mut()) {
                    tracing::error!(error = %err, "snapshot failed to apply");
                }
            }
            Event::Error(err) => {
                tracing::error!(error = %err, "snapshot stream signaled an error");
            }
            Event::Completed => {
                // Last snapshot stays displayed.
            }
        });
        Self {
            source,
            sink,
            _subscription: subscription,
        }
    }

    /// Shared handle to the bound data source (for widget queries).
    #[must_use]
    pub fn source(&self) -> Rc<OutlineDataSource<V, P>> {
        Rc::clone(&self.source)
    }

    /// Shared handle to the bound sink.
    #[must_use]
    pub fn sink(&self) -> Rc<RefCell<S>> {
        Rc::clone(&self.sink)
    }

    /// Explicit teardown; equivalent to dropping the binding.
    pub fn unbind(self) {}
}
