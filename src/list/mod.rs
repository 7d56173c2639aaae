/*!
 * Growable Buffer
 *
 * Pool-backed growable collection and its companions:
 * - `PooledVec`: the buffer itself, version-counted, deterministically disposed
 * - `VersionedCursor`: snapshot iteration with mutation detection
 * - `Recycler`: bounded reuse of the buffer wrapper, not just its storage
 *
 * All of these are single-writer / thread-confined; only the allocator in
 * [`crate::pool`] is safe for concurrent use.
 */

mod cursor;
mod recycle;
mod vec;

pub use cursor::{CursorState, VersionedCursor};
pub use recycle::{Recycler, RecyclerConfig};
pub use vec::{PooledVec, MIN_CAPACITY};
