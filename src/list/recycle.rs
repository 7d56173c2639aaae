/*!
 * Wrapper Recycler
 * Bounded, thread-confined arena that reuses disposed buffer wrappers
 */

use super::vec::PooledVec;
use crate::errors::{PoolError, Result};
use crate::pool::ExactSizePool;
use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Provenance tag stamped on recycled wrappers.
///
/// Identifies the arena slot a wrapper parks in and the generation it was
/// handed out under, so stale or foreign wrappers are rejected at `retire`
/// instead of corrupting the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecycleTag {
    pub slot: usize,
    pub generation: u64,
}

/// Recycler tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecyclerConfig {
    /// Maximum wrappers parked at once; retirements past it are discarded
    pub max_parked: usize,
}

impl Default for RecyclerConfig {
    fn default() -> Self {
        Self { max_parked: 128 }
    }
}

struct Slot<T> {
    generation: u64,
    parked: Option<PooledVec<T>>,
}

/// Bounded arena of reusable [`PooledVec`] wrappers.
///
/// Disposing a buffer returns its backing store to the allocator but still
/// discards the wrapper itself; under churn that is one allocation per
/// buffer lifetime. The recycler parks disposed wrappers in slot order and
/// hands them back reinitialized exactly as fresh construction would.
///
/// Thread-confined: the API takes `&mut self`, there is no locking, and an
/// instance is meant to be owned by one thread (or one task) for its
/// lifetime. Each parked slot carries a generation counter; a wrapper's tag
/// must match its slot's generation to be accepted back.
pub struct Recycler<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    max_parked: usize,
}

impl<T> Recycler<T> {
    /// Create a recycler with the default slot bound
    pub fn new() -> Self {
        Self::with_config(RecyclerConfig::default())
    }

    /// Create a recycler with an explicit slot bound
    pub fn with_config(config: RecyclerConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            max_parked: config.max_parked,
        }
    }

    /// Rent a buffer: reuse a parked wrapper when one is available, otherwise
    /// construct a fresh one marked recyclable.
    ///
    /// Either way the result is indistinguishable from fresh construction:
    /// empty, version 0, capacity floored as usual.
    pub fn rent(&mut self, capacity: usize, pool: Arc<ExactSizePool<T>>) -> Result<PooledVec<T>> {
        while let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            if let Some(mut vec) = slot.parked.take() {
                slot.generation += 1;
                let generation = slot.generation;
                vec.reinit(capacity, pool)?;
                vec.set_recycle_tag(Some(RecycleTag {
                    slot: index,
                    generation,
                }));
                trace!("recycler reuse: slot {index} generation {generation}");
                return Ok(vec);
            }
        }
        let mut vec = PooledVec::with_capacity(capacity, pool)?;
        vec.mark_recyclable();
        Ok(vec)
    }

    /// Dispose a buffer and park its wrapper for reuse.
    ///
    /// Only wrappers obtained through a recycler are accepted; a directly
    /// constructed wrapper, or one whose tag no longer matches its slot's
    /// generation, is rejected with `InvalidArgument`. A full arena disposes
    /// the buffer and silently discards the wrapper instead of erroring.
    pub fn retire(&mut self, mut vec: PooledVec<T>) -> Result<()> {
        if !vec.is_recyclable() {
            return Err(PoolError::InvalidArgument(
                "wrapper was not obtained from a recycler".into(),
            ));
        }

        if let Some(tag) = vec.recycle_tag() {
            let valid = self
                .slots
                .get(tag.slot)
                .map_or(false, |slot| slot.generation == tag.generation && slot.parked.is_none());
            if !valid {
                return Err(PoolError::InvalidArgument(
                    "stale recycle tag: wrapper does not belong to this recycler".into(),
                ));
            }
            vec.dispose();
            self.slots[tag.slot].parked = Some(vec);
            self.free.push(tag.slot);
            return Ok(());
        }

        // First retirement of a wrapper constructed while the arena was empty.
        vec.dispose();
        if self.slots.len() < self.max_parked {
            let index = self.slots.len();
            vec.set_recycle_tag(Some(RecycleTag {
                slot: index,
                generation: 0,
            }));
            self.slots.push(Slot {
                generation: 0,
                parked: Some(vec),
            });
            self.free.push(index);
        } else {
            trace!("recycler full ({} slots), discarding wrapper", self.max_parked);
        }
        Ok(())
    }

    /// Number of wrappers currently parked
    #[inline]
    pub fn parked(&self) -> usize {
        self.free.len()
    }

    /// Slot bound this recycler was configured with
    #[inline]
    pub fn max_parked(&self) -> usize {
        self.max_parked
    }
}

impl<T> Default for Recycler<T> {
    fn default() -> Self {
        Self::new()
    }
}
