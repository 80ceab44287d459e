#![forbid(unsafe_code)]

//! Shared, version-tracked value cells.
//!
//! [`Observable<T>`] uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` function pointers and cleaned
//! up lazily during notification; the strong reference lives in the
//! [`Subscription`] handed back to the caller, so dropping the subscription
//! is all it takes to unsubscribe.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//!
//! # Failure Modes
//!
//! - Callback panic: propagates to the caller of `set()`.
//! - Re-entrant `set()` from a callback: later callbacks in the current
//!   cycle still observe the value that triggered the cycle.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// RAII guard keeping one subscriber callback alive.
///
/// The observable (or [`Publisher`](crate::Publisher)) only holds a weak
/// reference to the callback; when this guard drops, the callback dies and
/// is swept on the next notification.
pub struct Subscription {
    _callback: Rc<dyn Any>,
}

impl Subscription {
    pub(crate) fn new(callback: Rc<dyn Any>) -> Self {
        Self {
            _callback: callback,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

struct Inner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<dyn Fn(&T)>>,
}

/// A shared value cell with change notification.
pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers. Equal values are a no-op.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// How many times the value has actually changed.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Register `callback` to run on every value change.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong = Rc::new(callback);
        // Unsize in a separate step; `strong` must stay concrete so the
        // guard can hold it as `Rc<dyn Any>`.
        let weak = Rc::downgrade(&strong);
        let weak: Weak<dyn Fn(&T)> = weak;
        self.inner.borrow_mut().subscribers.push(weak);
        Subscription::new(strong)
    }

    fn notify(&self) {
        // Snapshot value and subscriber list so callbacks may re-enter
        // (subscribe, set) without tripping the RefCell.
        let (value, subscribers) = {
            let inner = self.inner.borrow();
            (inner.value.clone(), inner.subscribers.clone())
        };
        for weak in &subscribers {
            if let Some(callback) = weak.upgrade() {
                callback(&value);
            }
        }
        // Lazy sweep of dead subscribers.
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|w| w.strong_count() > 0);
    }
}
