/*!
 * Pooled Growable Buffer
 * Growable collection backed by exact-size pooled stores, with version-counted
 * mutation detection and deterministic disposal
 */

use super::cursor::VersionedCursor;
use super::recycle::RecycleTag;
use crate::errors::{PoolError, Result};
use crate::growth;
use crate::pool::{ExactSizePool, Store};
use log::{debug, error};
use std::fmt;
use std::mem;
use std::ptr;
use std::slice;
use std::sync::Arc;

/// Smallest capacity a live buffer is constructed with. Requests below this
/// are floored to avoid pathological rapid regrowth.
pub const MIN_CAPACITY: usize = 16;

/// Growable buffer whose backing store is rented from an [`ExactSizePool`].
///
/// Call [`dispose`](Self::dispose) to return the store deterministically;
/// `Drop` disposes as a safety net. Structural mutations bump an internal
/// version counter used by [`VersionedCursor`] to detect iteration over a
/// buffer that changed underneath it.
///
/// Single-writer: the buffer itself is not synchronized. Mutating one
/// instance from two threads is a misuse that is only *detected* (via the
/// version counter, when observed through a cursor), never prevented. The
/// borrow checker additionally rules out same-thread aliasing misuse.
///
/// # Invariants
///
/// - `0 <= len <= capacity`
/// - capacity is monotonically non-decreasing except at dispose
/// - the version increments exactly once per mutating call
/// - the initialized prefix is exactly `[0, len)`
pub struct PooledVec<T> {
    store: Option<Store<T>>,
    count: usize,
    version: u64,
    pool: Arc<ExactSizePool<T>>,
    recycle: Option<RecycleTag>,
    recyclable: bool,
}

impl<T> PooledVec<T> {
    /// Create an empty buffer at the minimum capacity
    pub fn new(pool: Arc<ExactSizePool<T>>) -> Result<Self> {
        Self::with_capacity(0, pool)
    }

    /// Create an empty buffer backed by the process-wide shared pool for `T`
    pub fn with_shared_pool(capacity: usize) -> Result<Self>
    where
        T: Send + 'static,
    {
        Self::with_capacity(capacity, ExactSizePool::shared())
    }

    /// Create an empty buffer with at least `capacity` slots (floored to
    /// [`MIN_CAPACITY`])
    pub fn with_capacity(capacity: usize, pool: Arc<ExactSizePool<T>>) -> Result<Self> {
        let store = pool.rent(capacity.max(MIN_CAPACITY))?;
        Ok(Self {
            store: Some(store),
            count: 0,
            version: 0,
            pool,
            recycle: None,
            recyclable: false,
        })
    }

    /// Number of live elements
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current backing-store length (0 once disposed)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.as_ref().map_or(0, Store::len)
    }

    /// Mutation version counter
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if the buffer has been disposed
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.store.is_none()
    }

    #[inline]
    fn store_ref(&self) -> Result<&Store<T>> {
        self.store.as_ref().ok_or(PoolError::UseAfterDispose)
    }

    #[inline]
    fn store_mut(&mut self) -> Result<&mut Store<T>> {
        self.store.as_mut().ok_or(PoolError::UseAfterDispose)
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// View the live elements as a slice
    pub fn as_slice(&self) -> Result<&[T]> {
        let store = self.store_ref()?;
        // SAFETY: `[0, count)` is the initialized prefix.
        Ok(unsafe { slice::from_raw_parts(store.as_ptr(), self.count) })
    }

    /// View the live elements as a mutable slice
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        let count = self.count;
        let store = self.store_mut()?;
        // SAFETY: `[0, count)` is the initialized prefix; `&mut self` gives
        // exclusive access.
        Ok(unsafe { slice::from_raw_parts_mut(store.as_mut_ptr(), count) })
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.count;
        self.as_slice()?
            .get(index)
            .ok_or(PoolError::IndexOutOfRange { index, len })
    }

    /// Mutable element at `index`
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.count;
        self.as_mut_slice()?
            .get_mut(index)
            .ok_or(PoolError::IndexOutOfRange { index, len })
    }

    /// Append an element, growing the backing store if full.
    ///
    /// Amortized O(1): growth doubles capacity via the shared policy.
    pub fn push(&mut self, item: T) -> Result<()> {
        if self.count == self.store_ref()?.len() {
            self.grow_to(self.count + 1)?;
        }
        let count = self.count;
        let store = self.store_mut()?;
        // SAFETY: count < capacity after growth; slot `count` is in bounds
        // and uninitialized.
        unsafe { store.as_mut_ptr().add(count).write(item) };
        self.count += 1;
        self.bump_version();
        Ok(())
    }

    /// Insert an element at `index`, shifting `[index, len)` right by one.
    ///
    /// `index == len` appends.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.store_ref()?;
        if index > self.count {
            return Err(PoolError::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        if self.count == self.store_ref()?.len() {
            self.grow_to(self.count + 1)?;
        }
        let count = self.count;
        let store = self.store_mut()?;
        // SAFETY: count < capacity after growth; the shift stays within the
        // store and vacates exactly slot `index`.
        unsafe {
            let base = store.as_mut_ptr();
            ptr::copy(base.add(index), base.add(index + 1), count - index);
            base.add(index).write(item);
        }
        self.count += 1;
        self.bump_version();
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail left
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.store_ref()?;
        if index >= self.count {
            return Err(PoolError::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        let count = self.count;
        let store = self.store_mut()?;
        // SAFETY: index < count, so the slot is initialized; the shift closes
        // the gap and the vacated tail slot leaves the initialized prefix.
        let item = unsafe {
            let base = store.as_mut_ptr();
            let item = base.add(index).read();
            ptr::copy(base.add(index + 1), base.add(index), count - index - 1);
            item
        };
        self.count -= 1;
        self.bump_version();
        Ok(item)
    }

    /// Remove the first element equal to `item`; returns whether one was found
    pub fn remove(&mut self, item: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        match self.index_of(item)? {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every element matching the predicate in a single compaction
    /// pass; returns how many were removed.
    ///
    /// The version increments exactly once if any element was removed, and
    /// not at all otherwise. If the predicate panics, already-kept elements
    /// and the unprocessed tail are leaked rather than double-dropped.
    pub fn remove_all<F>(&mut self, mut pred: F) -> Result<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.store_ref()?;
        let count = self.count;
        // Zero during compaction so an unwinding predicate cannot expose
        // vacated slots through Drop.
        self.count = 0;
        let base = match self.store.as_mut() {
            Some(store) => store.as_mut_ptr(),
            None => return Err(PoolError::UseAfterDispose),
        };

        let mut write = 0usize;
        let mut removed = 0usize;
        for read in 0..count {
            // SAFETY: `read < count`, the originally initialized prefix; each
            // element is either dropped or moved down exactly once.
            unsafe {
                let elem = base.add(read);
                if pred(&*elem) {
                    ptr::drop_in_place(elem);
                    removed += 1;
                } else {
                    if write != read {
                        ptr::copy_nonoverlapping(elem, base.add(write), 1);
                    }
                    write += 1;
                }
            }
        }

        self.count = write;
        if removed > 0 {
            self.bump_version();
        }
        Ok(removed)
    }

    /// Remove `count` elements starting at `index` with a single compaction
    /// shift and a single version bump.
    ///
    /// A range extending past the live prefix is rejected with
    /// `InvalidArgument` before anything is touched. Removing zero elements
    /// from a valid position is a no-op that leaves the version unchanged.
    /// If an element `Drop` panics, the remaining elements in the range and
    /// the tail are leaked rather than double-dropped.
    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<()> {
        self.store_ref()?;
        let len = self.count;
        let end = index
            .checked_add(count)
            .filter(|&end| end <= len)
            .ok_or_else(|| {
                PoolError::InvalidArgument(format!(
                    "range of {count} elements at index {index} out of bounds for length {len}"
                ))
            })?;
        if count == 0 {
            return Ok(());
        }
        // Zero during the drops so an unwinding element Drop cannot expose
        // vacated slots.
        self.count = 0;
        let base = match self.store.as_mut() {
            Some(store) => store.as_mut_ptr(),
            None => return Err(PoolError::UseAfterDispose),
        };
        // SAFETY: [index, end) lies within the originally initialized prefix;
        // each removed element drops exactly once, then the tail closes the
        // gap in one shift.
        unsafe {
            ptr::drop_in_place(slice::from_raw_parts_mut(base.add(index), count));
            ptr::copy(base.add(end), base.add(index), len - end);
        }
        self.count = len - count;
        self.bump_version();
        Ok(())
    }

    /// Drop all live elements. The version increments unconditionally, even
    /// on an already-empty buffer.
    pub fn clear(&mut self) -> Result<()> {
        self.store_ref()?;
        self.drop_live_prefix();
        self.bump_version();
        Ok(())
    }

    /// Grow the backing store so at least `min` elements fit.
    ///
    /// Logical contents, `len`, and the version are unchanged; the backing
    /// store's identity may change but is never an observable contract.
    pub fn ensure_capacity(&mut self, min: usize) -> Result<()> {
        if self.store_ref()?.len() < min {
            self.grow_to(min)?;
        }
        Ok(())
    }

    /// Set the element count directly: truncating drops the tail, extending
    /// default-fills. Bumps the version only when the count changes.
    pub fn set_count(&mut self, value: usize) -> Result<()>
    where
        T: Default,
    {
        self.store_ref()?;
        if value == self.count {
            return Ok(());
        }
        if value > self.count {
            self.ensure_capacity(value)?;
            let start = self.count;
            let store = self.store_mut()?;
            // SAFETY: capacity >= value; slots [start, value) are
            // uninitialized and in bounds.
            unsafe {
                let base = store.as_mut_ptr();
                for i in start..value {
                    base.add(i).write(T::default());
                }
            }
        } else if mem::needs_drop::<T>() {
            let old_count = self.count;
            let store = self.store_mut()?;
            // SAFETY: [value, old_count) is initialized; dropped exactly once.
            unsafe {
                let tail =
                    slice::from_raw_parts_mut(store.as_mut_ptr().add(value), old_count - value);
                ptr::drop_in_place(tail);
            }
        }
        self.count = value;
        self.bump_version();
        Ok(())
    }

    /// Append clones of every element in `items` with a single version bump
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()>
    where
        T: Clone,
    {
        self.store_ref()?;
        if items.is_empty() {
            return Ok(());
        }
        let new_count = self
            .count
            .checked_add(items.len())
            .ok_or(PoolError::CapacityOverflow {
                requested: self.count as u128 + items.len() as u128,
            })?;
        self.ensure_capacity(new_count)?;
        let start = self.count;
        let store = self.store_mut()?;
        // SAFETY: capacity >= new_count; the written range is uninitialized.
        // A panicking Clone leaks the clones written so far (count is not yet
        // raised), never double-drops.
        unsafe {
            let base = store.as_mut_ptr();
            for (offset, item) in items.iter().enumerate() {
                base.add(start + offset).write(item.clone());
            }
        }
        self.count = new_count;
        self.bump_version();
        Ok(())
    }

    /// Index of the first element equal to `item`
    pub fn index_of(&self, item: &T) -> Result<Option<usize>>
    where
        T: PartialEq,
    {
        Ok(self.as_slice()?.iter().position(|x| x == item))
    }

    /// Index of the first element equal to `item` at or after `start`.
    ///
    /// `start == len` searches nothing and finds nothing; `start > len` is
    /// `IndexOutOfRange`.
    pub fn index_of_from(&self, item: &T, start: usize) -> Result<Option<usize>>
    where
        T: PartialEq,
    {
        let slice = self.as_slice()?;
        if start > slice.len() {
            return Err(PoolError::IndexOutOfRange {
                index: start,
                len: slice.len(),
            });
        }
        Ok(slice[start..]
            .iter()
            .position(|x| x == item)
            .map(|offset| start + offset))
    }

    /// Check whether any element equals `item`
    pub fn contains(&self, item: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        Ok(self.index_of(item)?.is_some())
    }

    /// Copy the live elements into a fresh `Vec`
    pub fn to_vec(&self) -> Result<Vec<T>>
    where
        T: Clone,
    {
        Ok(self.as_slice()?.to_vec())
    }

    /// Dispose the buffer: drop live elements, release the backing store to
    /// the pool, and mark the instance unusable.
    ///
    /// Idempotent; a second call is a safe no-op. Every later operation
    /// except `len`/`capacity`/`version` queries returns `UseAfterDispose`.
    pub fn dispose(&mut self) {
        if self.store.is_none() {
            return;
        }
        self.drop_live_prefix();
        if let Some(store) = self.store.take() {
            if let Err(err) = self.pool.release(store) {
                error!("failed to release backing store on dispose: {err}");
            }
        }
        self.bump_version();
    }

    /// Request a detached snapshot cursor over the current contents.
    ///
    /// Each call produces a fresh, independent snapshot of `(version, len)`.
    pub fn cursor(&self) -> VersionedCursor {
        VersionedCursor::new(self)
    }

    /// Iterate the live elements. Each call yields a fresh snapshot sequence
    /// over `[0, len)`; a disposed buffer iterates as empty.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().unwrap_or(&[]).iter()
    }

    fn drop_live_prefix(&mut self) {
        let count = self.count;
        self.count = 0;
        if count > 0 && mem::needs_drop::<T>() {
            if let Some(store) = self.store.as_mut() {
                // SAFETY: [0, count) was the initialized prefix; count is
                // already zeroed so a panicking element Drop leaks the rest
                // instead of double-dropping.
                unsafe {
                    ptr::drop_in_place(slice::from_raw_parts_mut(store.as_mut_ptr(), count));
                }
            }
        }
    }

    /// Rent a larger store per the growth policy, move the live prefix over,
    /// and release the old store.
    fn grow_to(&mut self, min: usize) -> Result<()> {
        let capacity = self.store_ref()?.len();
        let Some(target) = growth::grow(capacity, min) else {
            return Ok(());
        };
        let target = target.min(ExactSizePool::<T>::max_len());
        if target < min {
            return Err(PoolError::CapacityOverflow {
                requested: min as u128,
            });
        }

        let mut next = self.pool.rent(target)?;
        let old = match self.store.take() {
            Some(store) => store,
            None => return Err(PoolError::UseAfterDispose),
        };
        // SAFETY: both stores are distinct allocations; the old initialized
        // prefix is moved, leaving the old store fully uninitialized for
        // release.
        unsafe {
            ptr::copy_nonoverlapping(old.as_ptr(), next.as_mut_ptr(), self.count);
        }
        self.store = Some(next);
        self.pool.release(old)?;
        debug!("buffer grew {capacity} -> {target}");
        Ok(())
    }

    // Recycler plumbing. The flag distinguishes wrappers with recycler
    // provenance from directly constructed ones.

    #[inline]
    pub(crate) fn is_recyclable(&self) -> bool {
        self.recyclable
    }

    #[inline]
    pub(crate) fn mark_recyclable(&mut self) {
        self.recyclable = true;
    }

    #[inline]
    pub(crate) fn recycle_tag(&self) -> Option<RecycleTag> {
        self.recycle
    }

    #[inline]
    pub(crate) fn set_recycle_tag(&mut self, tag: Option<RecycleTag>) {
        self.recycle = tag;
    }

    /// Reinitialize a parked wrapper exactly as fresh construction would
    pub(crate) fn reinit(&mut self, capacity: usize, pool: Arc<ExactSizePool<T>>) -> Result<()> {
        self.dispose();
        self.pool = pool;
        self.store = Some(self.pool.rent(capacity.max(MIN_CAPACITY))?);
        self.count = 0;
        self.version = 0;
        Ok(())
    }
}

impl<T> Drop for PooledVec<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<'a, T> IntoIterator for &'a PooledVec<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for PooledVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledVec")
            .field("len", &self.count)
            .field("capacity", &self.capacity())
            .field("version", &self.version)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vec<T>() -> PooledVec<T> {
        PooledVec::with_capacity(0, Arc::new(ExactSizePool::new())).unwrap()
    }

    #[test]
    fn test_capacity_floored_to_sixteen() {
        let vec: PooledVec<i32> = new_vec();
        assert_eq!(vec.capacity(), MIN_CAPACITY);
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.version(), 0);
    }

    #[test]
    fn test_push_and_index_thousand() {
        let mut vec = new_vec();
        for i in 0..1000 {
            vec.push(i).unwrap();
        }
        assert_eq!(vec.len(), 1000);
        assert!(vec.capacity() >= 1000);
        for i in 0..1000usize {
            assert_eq!(*vec.get(i).unwrap(), i);
        }

        vec.dispose();
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 0);
        assert!(matches!(vec.get(0), Err(PoolError::UseAfterDispose)));
    }

    #[test]
    fn test_amortized_reallocation_count() {
        let mut vec = new_vec();
        let mut reallocations = 0;
        let mut capacity = vec.capacity();
        for i in 0..10_000 {
            vec.push(i).unwrap();
            if vec.capacity() != capacity {
                reallocations += 1;
                capacity = vec.capacity();
            }
        }
        // Doubling from 16 to >= 10_000 takes ceil(log2(10000/16)) ≈ 10 steps.
        assert!(reallocations <= 11, "saw {reallocations} reallocations");
    }

    #[test]
    fn test_insert_bounds() {
        let mut vec = new_vec();
        vec.push(1).unwrap();
        vec.push(3).unwrap();
        vec.insert(1, 2).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &[1, 2, 3]);
        vec.insert(3, 4).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &[1, 2, 3, 4]);
        assert!(matches!(
            vec.insert(6, 9),
            Err(PoolError::IndexOutOfRange { index: 6, len: 4 })
        ));
    }

    #[test]
    fn test_remove_at_shifts_left() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[10, 20, 30, 40]).unwrap();
        assert_eq!(vec.remove_at(1).unwrap(), 20);
        assert_eq!(vec.as_slice().unwrap(), &[10, 30, 40]);
        assert!(matches!(
            vec.remove_at(3),
            Err(PoolError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_remove_by_value() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2, 2, 3]).unwrap();
        assert!(vec.remove(&2).unwrap());
        assert_eq!(vec.as_slice().unwrap(), &[1, 2, 3]);
        assert!(!vec.remove(&9).unwrap());
    }

    #[test]
    fn test_remove_all_evens() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2, 3, 4, 5, 6]).unwrap();
        let version_before = vec.version();
        let removed = vec.remove_all(|x| x % 2 == 0).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(vec.as_slice().unwrap(), &[1, 3, 5]);
        assert_eq!(vec.version(), version_before + 1);
    }

    #[test]
    fn test_remove_all_no_match_keeps_version() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 3, 5]).unwrap();
        let version_before = vec.version();
        assert_eq!(vec.remove_all(|x| x % 2 == 0).unwrap(), 0);
        assert_eq!(vec.version(), version_before);
        assert_eq!(vec.as_slice().unwrap(), &[1, 3, 5]);
    }

    #[test]
    fn test_remove_range_single_compaction() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2, 3, 4, 5, 6]).unwrap();
        let version = vec.version();
        vec.remove_range(1, 3).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &[1, 5, 6]);
        assert_eq!(vec.version(), version + 1);

        vec.remove_range(0, 3).unwrap();
        assert!(vec.is_empty());
    }

    #[test]
    fn test_remove_range_zero_count_keeps_version() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2]).unwrap();
        let version = vec.version();
        vec.remove_range(2, 0).unwrap();
        assert_eq!(vec.version(), version);
        assert_eq!(vec.as_slice().unwrap(), &[1, 2]);
    }

    #[test]
    fn test_remove_range_malformed_rejected() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2, 3]).unwrap();
        assert!(matches!(
            vec.remove_range(1, 3),
            Err(PoolError::InvalidArgument(_))
        ));
        assert!(matches!(
            vec.remove_range(4, 0),
            Err(PoolError::InvalidArgument(_))
        ));
        // index + count overflowing usize is malformed, not a panic.
        assert!(matches!(
            vec.remove_range(usize::MAX, 2),
            Err(PoolError::InvalidArgument(_))
        ));
        assert_eq!(vec.as_slice().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_remove_range_drops_owned_elements() {
        let mut vec: PooledVec<String> = new_vec();
        vec.extend_from_slice(&["a".into(), "b".into(), "c".into(), "d".into()])
            .unwrap();
        vec.remove_range(0, 2).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_clear_bumps_version_even_when_empty() {
        let mut vec: PooledVec<String> = new_vec();
        let version_before = vec.version();
        vec.clear().unwrap();
        assert_eq!(vec.version(), version_before + 1);
        vec.push("a".to_string()).unwrap();
        vec.clear().unwrap();
        assert!(vec.is_empty());
    }

    #[test]
    fn test_ensure_capacity_changes_nothing_observable() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[7, 8, 9]).unwrap();
        let version_before = vec.version();
        vec.ensure_capacity(500).unwrap();
        assert!(vec.capacity() >= 500);
        assert_eq!(vec.len(), 3);
        assert_eq!(vec.version(), version_before);
        assert_eq!(vec.as_slice().unwrap(), &[7, 8, 9]);
    }

    #[test]
    fn test_set_count_extends_and_truncates() {
        let mut vec: PooledVec<u32> = new_vec();
        vec.set_count(4).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &[0, 0, 0, 0]);
        vec.set_count(1).unwrap();
        assert_eq!(vec.as_slice().unwrap(), &[0]);
        let version = vec.version();
        vec.set_count(1).unwrap();
        assert_eq!(vec.version(), version);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let pool: Arc<ExactSizePool<i32>> = Arc::new(ExactSizePool::new());
        let mut vec = PooledVec::with_capacity(8, Arc::clone(&pool)).unwrap();
        vec.push(1).unwrap();
        vec.dispose();
        let retained = pool.retained(MIN_CAPACITY);
        vec.dispose();
        // No double release of the same store.
        assert_eq!(pool.retained(MIN_CAPACITY), retained);
        assert!(vec.is_disposed());
    }

    #[test]
    fn test_operations_after_dispose() {
        let mut vec = new_vec();
        vec.push(1).unwrap();
        vec.dispose();
        assert!(matches!(vec.push(2), Err(PoolError::UseAfterDispose)));
        assert!(matches!(vec.insert(0, 2), Err(PoolError::UseAfterDispose)));
        assert!(matches!(vec.remove_at(0), Err(PoolError::UseAfterDispose)));
        assert!(matches!(vec.clear(), Err(PoolError::UseAfterDispose)));
        assert!(matches!(
            vec.remove_range(0, 0),
            Err(PoolError::UseAfterDispose)
        ));
        assert!(matches!(vec.as_slice(), Err(PoolError::UseAfterDispose)));
        assert!(matches!(
            vec.ensure_capacity(4),
            Err(PoolError::UseAfterDispose)
        ));
        assert_eq!(vec.iter().count(), 0);
    }

    #[test]
    fn test_growth_reuses_pool() {
        let pool: Arc<ExactSizePool<u8>> = Arc::new(ExactSizePool::new());
        let mut vec = PooledVec::with_capacity(16, Arc::clone(&pool)).unwrap();
        for i in 0..17u8 {
            vec.push(i).unwrap();
        }
        // Growth released the 16-slot store back to the pool's fast slot.
        assert_eq!(pool.retained(16), 1);
    }

    #[test]
    fn test_drop_releases_store() {
        let pool: Arc<ExactSizePool<u64>> = Arc::new(ExactSizePool::new());
        {
            let mut vec = PooledVec::with_capacity(16, Arc::clone(&pool)).unwrap();
            vec.push(5).unwrap();
        }
        assert_eq!(pool.retained(16), 1);
    }

    #[test]
    fn test_owned_elements_dropped_on_clear() {
        let mut vec: PooledVec<Vec<u8>> = new_vec();
        vec.push(vec![1, 2, 3]).unwrap();
        vec.push(vec![4]).unwrap();
        vec.clear().unwrap();
        assert!(vec.is_empty());
        vec.push(vec![9]).unwrap();
        assert_eq!(vec.get(0).unwrap(), &[9]);
    }

    #[test]
    fn test_version_increments_once_per_mutation() {
        let mut vec = new_vec();
        let v0 = vec.version();
        vec.push(1).unwrap();
        assert_eq!(vec.version(), v0 + 1);
        vec.insert(0, 0).unwrap();
        assert_eq!(vec.version(), v0 + 2);
        vec.remove_at(0).unwrap();
        assert_eq!(vec.version(), v0 + 3);
        vec.extend_from_slice(&[2, 3]).unwrap();
        assert_eq!(vec.version(), v0 + 4);
        vec.extend_from_slice(&[]).unwrap();
        assert_eq!(vec.version(), v0 + 4);
    }

    #[test]
    fn test_index_of_and_contains() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[5, 6, 7]).unwrap();
        assert_eq!(vec.index_of(&6).unwrap(), Some(1));
        assert_eq!(vec.index_of(&9).unwrap(), None);
        assert!(vec.contains(&7).unwrap());
        assert!(!vec.contains(&4).unwrap());
    }

    #[test]
    fn test_index_of_from_offset() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[5, 6, 5, 7]).unwrap();
        assert_eq!(vec.index_of_from(&5, 0).unwrap(), Some(0));
        assert_eq!(vec.index_of_from(&5, 1).unwrap(), Some(2));
        assert_eq!(vec.index_of_from(&5, 3).unwrap(), None);
        assert_eq!(vec.index_of_from(&7, 4).unwrap(), None);
        assert!(matches!(
            vec.index_of_from(&5, 5),
            Err(PoolError::IndexOutOfRange { index: 5, len: 4 })
        ));
    }

    #[test]
    fn test_capacity_overflow_reports_request() {
        let mut vec: PooledVec<u64> = new_vec();
        let request = usize::MAX / 2;
        match vec.ensure_capacity(request) {
            Err(PoolError::CapacityOverflow { requested }) => {
                assert_eq!(requested, request as u128);
            }
            other => panic!("expected capacity overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_to_vec_snapshot() {
        let mut vec = new_vec();
        vec.extend_from_slice(&[1, 2, 3]).unwrap();
        let copy = vec.to_vec().unwrap();
        vec.push(4).unwrap();
        assert_eq!(copy, vec![1, 2, 3]);
    }
}
