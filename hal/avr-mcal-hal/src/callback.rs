//! Interrupt callback slots
//!
//! Each interrupt source owns one slot. Foreground code registers a plain
//! `fn()` into it and the interrupt handler fires whatever is there. An empty
//! slot makes firing a no-op.

use core::cell::Cell;

use critical_section::Mutex;

/// Application callback fired from interrupt context
pub type Callback = fn();

/// Holds at most one callback for one interrupt source
///
/// The slot is `Sync`, so it can sit in a `static` or inside a driver that is
/// shared between foreground code and an interrupt handler. Every access
/// happens inside a critical section.
pub struct CallbackSlot {
    inner: Mutex<Cell<Option<Callback>>>,
}

impl Default for CallbackSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    /// Store `callback`, replacing any earlier registration
    pub fn register(&self, callback: Callback) {
        critical_section::with(|cs| self.inner.borrow(cs).set(Some(callback)));
    }

    /// Empty the slot
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow(cs).set(None));
    }

    /// Check whether a callback is stored
    pub fn is_registered(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow(cs).get().is_some())
    }

    /// Fire the stored callback
    ///
    /// Returns `false` when the slot was empty. The callback runs outside the
    /// critical section.
    pub fn invoke(&self) -> bool {
        let callback = critical_section::with(|cs| self.inner.borrow(cs).get());
        match callback {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }
}
