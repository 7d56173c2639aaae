/*!
 * Backing Store
 * Exact-length storage block with pool-transferable ownership
 */

use std::fmt;
use std::mem::MaybeUninit;

/// Contiguous fixed-length block of element storage.
///
/// A store has exactly one live owner at any instant: either a buffer that
/// rented it or the pool that holds it idle. Ownership transfers only at
/// rent/release boundaries.
///
/// A store never contains live elements on its own. Initialization state is
/// tracked entirely by the owning buffer (`PooledVec` tracks an initialized
/// prefix, `ScratchGuard` initializes the full length). Stores held idle by
/// the pool are fully uninitialized, so releasing a store requires the owner
/// to have dropped or moved out every element first.
pub struct Store<T> {
    block: Box<[MaybeUninit<T>]>,
}

impl<T> Store<T> {
    /// Allocate a fresh, fully uninitialized block of exactly `len` slots
    pub(crate) fn with_len(len: usize) -> Self {
        let block: Box<[MaybeUninit<T>]> =
            std::iter::repeat_with(MaybeUninit::uninit).take(len).collect();
        Self { block }
    }

    /// Exact length of the block, equal to the length it was rented at
    #[inline]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Check if the block has zero length
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Base pointer, usable for identity comparison between stores
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr() as *const T
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.block.as_mut_ptr() as *mut T
    }

    /// Decompose into a thin pointer for storage in a CAS fast slot.
    ///
    /// The length is not carried by the pointer; fast slots are indexed by
    /// length, so [`Store::from_raw`] recovers it from the slot index.
    pub(crate) fn into_raw(self) -> *mut MaybeUninit<T> {
        Box::into_raw(self.block) as *mut MaybeUninit<T>
    }

    /// Reassemble a store from a thin pointer previously produced by
    /// [`Store::into_raw`] with the same `len`.
    ///
    /// # Safety
    ///
    /// `ptr` must originate from `into_raw` on a store of exactly `len` slots,
    /// and ownership must not be reconstructed more than once per `into_raw`.
    pub(crate) unsafe fn from_raw(ptr: *mut MaybeUninit<T>, len: usize) -> Self {
        Self {
            block: Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)),
        }
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("len", &self.len()).finish()
    }
}
