/*!
 * Versioned Cursor
 * Snapshot iteration with cooperative mutation detection
 */

use super::vec::PooledVec;
use crate::errors::{PoolError, Result};

/// Cursor lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Initialized,
    Iterating,
    Exhausted,
    /// Terminal: a version mismatch was observed. Every later `move_next`
    /// keeps signaling `ConcurrentModification`.
    Invalidated,
}

/// Detached snapshot cursor over a [`PooledVec`].
///
/// Captures `(version, len)` at creation. Because it does not borrow the
/// buffer between steps, the buffer can be mutated between `move_next` calls;
/// the next call then observes the version mismatch and fails with
/// `ConcurrentModification`. Detection is cooperative and best-effort, not a
/// safety guarantee: it reports misuse after the fact, it does not prevent a
/// cross-thread data race (supply external locking if you need that).
///
/// A cursor is bound to the buffer it was created from and must be stepped
/// against that same buffer; it never outlives a single iteration pass.
/// Request a fresh cursor for a fresh snapshot.
///
/// # Example
///
/// ```ignore
/// let mut cursor = vec.cursor();
/// while let Some(item) = cursor.move_next(&vec)? {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct VersionedCursor {
    version: u64,
    count: usize,
    index: usize,
    state: CursorState,
}

impl VersionedCursor {
    pub(crate) fn new<T>(list: &PooledVec<T>) -> Self {
        Self {
            version: list.version(),
            count: list.len(),
            index: 0,
            state: CursorState::Initialized,
        }
    }

    /// Advance and yield the next element, `Ok(None)` once exhausted.
    ///
    /// Exhaustion is not an error; a version mismatch is.
    pub fn move_next<'a, T>(&mut self, list: &'a PooledVec<T>) -> Result<Option<&'a T>> {
        if self.state == CursorState::Invalidated {
            return Err(PoolError::ConcurrentModification);
        }
        if list.version() != self.version {
            self.state = CursorState::Invalidated;
            return Err(PoolError::ConcurrentModification);
        }
        if self.index < self.count {
            let item = list.get(self.index)?;
            self.index += 1;
            self.state = CursorState::Iterating;
            Ok(Some(item))
        } else {
            self.state = CursorState::Exhausted;
            Ok(None)
        }
    }

    /// Rewind to the start without re-capturing the version.
    ///
    /// A reset after external mutation still raises
    /// `ConcurrentModification` on the next `move_next`.
    pub fn reset(&mut self) {
        self.index = 0;
        self.state = CursorState::Initialized;
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> CursorState {
        self.state
    }
}
