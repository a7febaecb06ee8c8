//! Signal<T>: synchronous, single-threaded signal/slot emission.
//!
//! Every value-bearing widget owns a `changed: Signal<Value>`; containers
//! and `FunctionGui` own higher-level signals built from the same type.
//! Slots run synchronously in connection order. While a slot is running it
//! is taken out of its storage, so a reentrant emission of the same signal
//! skips the slot that is already on the stack instead of recursing into it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies one connected slot. Returned by [`Signal::connect`] so the
    /// connection can later be severed.
    pub struct ConnectionId;
}

type Callback<T> = Box<dyn FnMut(&T)>;

struct SignalInner<T> {
    /// `None` marks a slot whose callback is currently executing.
    slots: RefCell<SlotMap<ConnectionId, Option<Callback<T>>>>,
    /// Emission is suppressed while > 0 (see [`SignalBlocker`]).
    blocked: Cell<usize>,
}

/// A cloneable handle to one notification channel.
///
/// Clones share the same slot storage: connecting through one clone makes
/// the slot visible to emissions through any other.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                slots: RefCell::new(SlotMap::with_key()),
                blocked: Cell::new(0),
            }),
        }
    }

    /// Connect a slot; it will be invoked on every unblocked emission.
    pub fn connect(&self, f: impl FnMut(&T) + 'static) -> ConnectionId {
        self.inner.slots.borrow_mut().insert(Some(Box::new(f)))
    }

    /// Sever a connection. Returns `false` if the id was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.inner.slots.borrow_mut().remove(id).is_some()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    /// Invoke every connected slot with `payload`.
    ///
    /// Returns `true` if the emission was delivered, `false` if blocked.
    /// Slots connected *during* this emission are not invoked until the
    /// next one.
    pub fn emit(&self, payload: &T) -> bool {
        if self.is_blocked() {
            return false;
        }
        let ids: Vec<ConnectionId> = self.inner.slots.borrow().keys().collect();
        for id in ids {
            // Take the callback out so the slot map is not borrowed while
            // user code runs, and so reentrant emissions skip this slot.
            let taken = match self.inner.slots.borrow_mut().get_mut(id) {
                Some(slot) => slot.take(),
                None => None, // disconnected mid-emission
            };
            let Some(mut cb) = taken else {
                continue;
            };
            cb(payload);
            // Put it back unless the slot was disconnected while running.
            if let Some(slot) = self.inner.slots.borrow_mut().get_mut(id) {
                *slot = Some(cb);
            }
        }
        true
    }

    /// Suppress emission until the returned guard drops.
    ///
    /// Blockers nest; emission resumes when the last one is released.
    pub fn blocked(&self) -> SignalBlocker<T> {
        self.inner.blocked.set(self.inner.blocked.get() + 1);
        SignalBlocker {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.get() > 0
    }

    /// Whether `other` is a handle to this same channel.
    pub fn same_channel(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

// ---------------------------------------------------------------------------
// SignalBlocker
// ---------------------------------------------------------------------------

/// RAII guard from [`Signal::blocked`]. Releases its block on drop, which
/// also runs during unwinding.
pub struct SignalBlocker<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Drop for SignalBlocker<T> {
    fn drop(&mut self) {
        let n = self.inner.blocked.get();
        debug_assert!(n > 0, "blocker count underflow");
        self.inner.blocked.set(n.saturating_sub(1));
    }
}

// ===========================================================================
// Tests
// ===========================================================================
