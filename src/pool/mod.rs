/*!
 * Backing Store Allocator
 *
 * Exact-size array pooling:
 * - `Store`: contiguous fixed-length block with single-owner transfer
 * - `ExactSizePool`: lock-free fast slots + capped overflow queues per length
 * - process-wide shared pool per element type
 *
 * # Concurrency
 *
 * The pool is the only concurrent component in this crate: rent/release are
 * safe from any number of threads on one instance. The fast path is a single
 * CAS; the overflow path rides the queue's own guarantees. Idle-memory caps
 * are advisory, enforced by counters that may drift under race.
 */

mod exact;
mod shared;
mod store;

pub use exact::{ExactSizePool, PoolConfig};
pub use store::Store;
