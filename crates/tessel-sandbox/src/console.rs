//! Process-wide console lock.
//!
//! Statement execution holds it while output is being captured, and the
//! progress reporter holds it while printing, so the two never interleave.

use std::sync::{Mutex, MutexGuard, PoisonError};

static CONSOLE: Mutex<()> = Mutex::new(());

pub fn console_lock() -> MutexGuard<'static, ()> {
    CONSOLE.lock().unwrap_or_else(PoisonError::into_inner)
}
