#![forbid(unsafe_code)]

//! Push streams with terminal events.
//!
//! An upstream producer delivers snapshots through a [`Publisher`]: each
//! delivery is an [`Event`] — a value, an error, or completion. Error and
//! completion are *terminal*: after either, the publisher drops all
//! subscribers and silently ignores further pushes. Subscribers see at most
//! one terminal event.
//!
//! The subscription model matches [`Observable`](crate::Observable): the
//! publisher holds weak callbacks, the returned
//! [`Subscription`](crate::Subscription) holds the strong reference.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observable::Subscription;

/// Cloneable wrapper around an arbitrary upstream error.
#[derive(Debug, Clone)]
pub struct StreamError {
    inner: Rc<dyn std::error::Error + 'static>,
}

impl StreamError {
    /// Wrap any error as a stream error.
    #[must_use]
    pub fn new(error: impl std::error::Error + 'static) -> Self {
        Self {
            inner: Rc::new(error),
        }
    }

    /// A stream error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

/// One delivery on a push stream.
#[derive(Debug, Clone)]
pub enum Event<T> {
    /// A new value.
    Next(T),
    /// The producer failed; terminal.
    Error(StreamError),
    /// The producer finished; terminal.
    Completed,
}

struct PublisherInner<T> {
    subscribers: Vec<Weak<dyn Fn(&Event<T>)>>,
    terminated: bool,
}

/// A push subject: values in, events out to every live subscriber.
pub struct Publisher<T> {
    inner: Rc<RefCell<PublisherInner<T>>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("terminated", &self.inner.borrow().terminated)
            .finish()
    }
}

impl<T: 'static> Publisher<T> {
    /// Create an open publisher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PublisherInner {
                subscribers: Vec::new(),
                terminated: false,
            })),
        }
    }

    /// Register `callback` for every future event.
    ///
    /// Subscribing to an already-terminated publisher yields a subscription
    /// that will never fire.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&Event<T>) + 'static) -> Subscription {
        let strong = Rc::new(callback);
        // Unsize in a separate step; `strong` must stay concrete so the
        // guard can hold it as `Rc<dyn Any>`.
        let weak = Rc::downgrade(&strong);
        let weak: Weak<dyn Fn(&Event<T>)> = weak;
        self.inner.borrow_mut().subscribers.push(weak);
        Subscription::new(strong)
    }

    /// Deliver a value. Ignored after termination.
    pub fn push(&self, value: T) {
        if self.inner.borrow().terminated {
            return;
        }
        self.notify(&Event::Next(value));
    }

    /// Terminate with an error.
    pub fn fail(&self, error: StreamError) {
        self.terminate(Event::Error(error));
    }

    /// Terminate normally.
    pub fn complete(&self) {
        self.terminate(Event::Completed);
    }

    /// Whether a terminal event has been delivered.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminated
    }

    fn terminate(&self, event: Event<T>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.terminated {
                return;
            }
            inner.terminated = true;
        }
        self.notify(&event);
        // Terminal: nothing will ever be delivered again.
        self.inner.borrow_mut().subscribers.clear();
    }

    fn notify(&self, event: &Event<T>) {
        let subscribers = self.inner.borrow().subscribers.clone();
        for weak in &subscribers {
            if let Some(callback) = weak.upgrade() {
                callback(event);
            }
        }
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|w| w.strong_count() > 0);
    }
}

impl<T: 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}
