/*!
 * poolbuf
 * Exact-size array pooling, pool-backed growable buffers, and wrapper recycling
 */

pub mod errors;
pub mod growth;
pub mod list;
pub mod pool;
pub mod scratch;

// Re-exports
pub use errors::{PoolError, Result};
pub use growth::grow;
pub use list::{CursorState, PooledVec, Recycler, RecyclerConfig, VersionedCursor, MIN_CAPACITY};
pub use pool::{ExactSizePool, PoolConfig, Store};
pub use scratch::ScratchGuard;
