//! Explicit init-once guard.

use once_cell::sync::OnceCell;

/// Holds a value that is initialized at most once and can be torn down.
///
/// Concurrent callers of [`InitGuard::get_or_try_init`] race to initialize;
/// exactly one initializer runs and everyone observes its value. A failed
/// initializer leaves the guard empty so a later call can retry.
#[derive(Debug)]
pub struct InitGuard<T> {
    cell: OnceCell<T>,
}

impl<T> InitGuard<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the value, running `init` first if nothing is stored yet.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        self.cell.get_or_try_init(init)
    }

    /// Return the value if it has been initialized.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Remove and return the value, leaving the guard uninitialized.
    pub fn teardown(&mut self) -> Option<T> {
        self.cell.take()
    }
}

impl<T> Default for InitGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}
