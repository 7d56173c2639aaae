/*!
 * Exact-Size Store Pool
 * Two-tier rent/release of exact-length blocks: lock-free CAS fast slots
 * over capped per-length overflow queues
 */

use super::store::Store;
use crate::errors::{PoolError, Result};
use ahash::RandomState;
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::mem::{self, MaybeUninit};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

/// Pool tuning knobs
///
/// `fast_slot_limit` is the exclusive upper bound on lengths eligible for the
/// CAS fast path; `max_per_size` caps how many idle stores one size class
/// retains in its overflow queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    pub fast_slot_limit: usize,
    pub max_per_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fast_slot_limit: 50,
            max_per_size: 50,
        }
    }
}

/// One size class: overflow queue plus its advisory occupancy counter.
///
/// The counter is maintained independently of the queue, so it can drift
/// slightly under contention. The cap it enforces bounds idle memory on a
/// best-effort basis; transient overshoot under race is accepted.
struct SizeClass<T> {
    queue: SegQueue<Store<T>>,
    occupancy: AtomicUsize,
}

impl<T> Default for SizeClass<T> {
    fn default() -> Self {
        Self {
            queue: SegQueue::new(),
            occupancy: AtomicUsize::new(0),
        }
    }
}

/// Exact-size store allocator, safe for concurrent use from many threads.
///
/// Unlike bucketing pools that round capacity up, `rent(len)` returns a block
/// of exactly `len` slots. Growth arithmetic and scratch consumers depend on
/// capacity equal to the requested size, never "at least".
///
/// # Strategy
///
/// 1. **Fast slot**: one shared cache slot per eligible length, claimed and
///    refilled with a single compare-and-swap. Losing threads fall through.
/// 2. **Overflow queue**: a per-length MPMC queue, capped by an occupancy
///    counter. Stores released past the cap are dropped, not retained.
///
/// # Example
///
/// ```ignore
/// let pool: Arc<ExactSizePool<u64>> = ExactSizePool::shared();
/// let store = pool.rent(64)?;
/// assert_eq!(store.len(), 64);
/// pool.release(store)?;
/// ```
pub struct ExactSizePool<T> {
    /// Indexed by length; null means empty. Each non-null entry owns a block
    /// of exactly that length, reassembled via the slot index on claim.
    fast_slots: Box<[AtomicPtr<MaybeUninit<T>>]>,
    classes: DashMap<usize, SizeClass<T>, RandomState>,
    max_per_size: usize,
}

impl<T> ExactSizePool<T> {
    /// Create a pool with default configuration
    pub fn new() -> Self {
        match Self::with_config(PoolConfig::default()) {
            Ok(pool) => pool,
            Err(_) => unreachable!("default pool configuration is valid"),
        }
    }

    /// Create a pool with explicit configuration
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        if config.fast_slot_limit == 0 || config.max_per_size == 0 {
            return Err(PoolError::InvalidArgument(
                "pool configuration requires non-zero fast_slot_limit and max_per_size".into(),
            ));
        }
        let fast_slots = std::iter::repeat_with(|| AtomicPtr::new(ptr::null_mut()))
            .take(config.fast_slot_limit)
            .collect();
        Ok(Self {
            fast_slots,
            classes: DashMap::with_hasher(RandomState::new()),
            max_per_size: config.max_per_size,
        })
    }

    /// Largest length rentable for this element type
    #[inline]
    pub(crate) fn max_len() -> usize {
        let elem = mem::size_of::<T>();
        if elem == 0 {
            usize::MAX
        } else {
            isize::MAX as usize / elem
        }
    }

    /// Rent a store of exactly `len` slots.
    ///
    /// Never fails for a representable length: when no pooled store is
    /// available a fresh block is allocated. A length whose byte size is not
    /// representable signals `InvalidArgument`.
    pub fn rent(&self, len: usize) -> Result<Store<T>> {
        if len > Self::max_len() {
            return Err(PoolError::InvalidArgument(format!(
                "length {len} exceeds maximum backing-store length {}",
                Self::max_len()
            )));
        }

        if len < self.fast_slots.len() {
            let slot = &self.fast_slots[len];
            let cached = slot.load(Ordering::Acquire);
            if !cached.is_null()
                && slot
                    .compare_exchange(cached, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                trace!("rent({len}): fast-slot hit");
                // SAFETY: the CAS transferred exclusive ownership of the
                // pointer out of the slot; it was stored by `release` from a
                // store of exactly `len` slots.
                return Ok(unsafe { Store::from_raw(cached, len) });
            }
        }

        if let Some(class) = self.classes.get(&len) {
            if let Some(store) = class.queue.pop() {
                let _ = class.occupancy.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |count| Some(count.saturating_sub(1)),
                );
                trace!("rent({len}): overflow-queue hit");
                return Ok(store);
            }
        }

        trace!("rent({len}): miss, allocating fresh store");
        Ok(Store::with_len(len))
    }

    /// Release a store back to the pool.
    ///
    /// The caller must have dropped or moved out every live element first; the
    /// pool retains only fully uninitialized blocks. Fills the empty fast slot
    /// when eligible, otherwise queues up to the size-class cap and drops the
    /// store past it.
    pub fn release(&self, store: Store<T>) -> Result<()> {
        let len = store.len();
        if len > Self::max_len() {
            return Err(PoolError::InvalidArgument(format!(
                "store of length {len} was not produced by this pool"
            )));
        }

        let store = if len < self.fast_slots.len() {
            let slot = &self.fast_slots[len];
            let raw = store.into_raw();
            if slot
                .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                trace!("release({len}): fast slot filled");
                return Ok(());
            }
            // SAFETY: the CAS failed, so ownership of `raw` never left us.
            unsafe { Store::from_raw(raw, len) }
        } else {
            store
        };

        let class = self.classes.entry(len).or_default();
        let count = class.occupancy.fetch_add(1, Ordering::AcqRel) + 1;
        if count <= self.max_per_size {
            class.queue.push(store);
        } else {
            let _ = class.occupancy.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some(c.saturating_sub(1))
            });
            trace!("release({len}): size class at cap, dropping store");
        }
        Ok(())
    }

    /// Number of idle stores currently retained for `len`.
    ///
    /// Best-effort: the overflow occupancy counter is not atomic with the
    /// queue, so the value may lag under concurrent rent/release traffic.
    pub fn retained(&self, len: usize) -> usize {
        let fast = usize::from(
            len < self.fast_slots.len() && !self.fast_slots[len].load(Ordering::Acquire).is_null(),
        );
        let queued = self
            .classes
            .get(&len)
            .map(|class| class.occupancy.load(Ordering::Acquire))
            .unwrap_or(0);
        fast + queued
    }
}

impl<T> Default for ExactSizePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ExactSizePool<T> {
    fn drop(&mut self) {
        // Queued stores drop with the map; fast-slot pointers are reclaimed
        // here so their blocks are freed exactly once.
        for (len, slot) in self.fast_slots.iter().enumerate() {
            let raw = slot.swap(ptr::null_mut(), Ordering::AcqRel);
            if !raw.is_null() {
                // SAFETY: the swap took exclusive ownership; the pointer was
                // stored by `release` for a block of exactly `len` slots.
                drop(unsafe { Store::from_raw(raw, len) });
            }
        }
    }
}

impl<T> std::fmt::Debug for ExactSizePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactSizePool")
            .field("fast_slot_limit", &self.fast_slots.len())
            .field("max_per_size", &self.max_per_size)
            .field("size_classes", &self.classes.len())
            .finish()
    }
}
