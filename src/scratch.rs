/*!
 * Scratch Guard
 * Fixed-length transient view, borrowed or pool-backed, released on drop
 */

use crate::errors::Result;
use crate::pool::{ExactSizePool, Store};
use log::error;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::slice;
use std::sync::Arc;

enum Inner<'a, T> {
    /// Caller-supplied storage; release is a no-op
    Borrowed(&'a mut [T]),
    /// Rented at exactly the requested length; cleared and returned on drop
    Pooled {
        store: Option<Store<T>>,
        len: usize,
        pool: Arc<ExactSizePool<T>>,
    },
}

/// Fixed-length scratch buffer with deterministic release.
///
/// Either wraps a caller-supplied slice (genuine short-lived local storage)
/// or rents a block of exactly the requested length from a pool. Both expose
/// the same flat indexable view and the same release behavior through `Drop`,
/// so release happens on every exit path, including unwinding.
///
/// No growth API: the length is fixed for the guard's entire lifetime.
///
/// # Example
///
/// ```ignore
/// let mut scratch = if size <= 64 {
///     ScratchGuard::borrowed(&mut local)
/// } else {
///     ScratchGuard::pooled(size, ExactSizePool::shared())?
/// };
/// scratch[0] = seed;
/// // released (or not, for borrowed storage) when `scratch` drops
/// ```
pub struct ScratchGuard<'a, T> {
    inner: Inner<'a, T>,
}

impl<'a, T> ScratchGuard<'a, T> {
    /// Wrap caller-supplied storage
    pub fn borrowed(slice: &'a mut [T]) -> Self {
        Self {
            inner: Inner::Borrowed(slice),
        }
    }

    /// Rent a block of exactly `len` slots and default-initialize it
    pub fn pooled(len: usize, pool: Arc<ExactSizePool<T>>) -> Result<Self>
    where
        T: Default,
    {
        let mut store = pool.rent(len)?;
        // SAFETY: every slot in [0, len) is written before the guard exposes
        // the view; a panicking Default leaks written slots, never
        // double-drops.
        unsafe {
            let base = store.as_mut_ptr();
            for i in 0..len {
                base.add(i).write(T::default());
            }
        }
        Ok(Self {
            inner: Inner::Pooled {
                store: Some(store),
                len,
                pool,
            },
        })
    }

    /// Length of the view, fixed for the guard's lifetime
    #[inline]
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Borrowed(slice) => slice.len(),
            Inner::Pooled { len, .. } => *len,
        }
    }

    /// Check if the view has zero length
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether the storage came from a pool
    #[inline]
    pub fn is_pooled(&self) -> bool {
        matches!(self.inner, Inner::Pooled { .. })
    }
}

impl<'a, T> Deref for ScratchGuard<'a, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        match &self.inner {
            Inner::Borrowed(slice) => slice,
            Inner::Pooled { store, len, .. } => match store {
                // SAFETY: the full [0, len) range was initialized at rent.
                Some(store) => unsafe { slice::from_raw_parts(store.as_ptr(), *len) },
                None => &[],
            },
        }
    }
}

impl<'a, T> DerefMut for ScratchGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        match &mut self.inner {
            Inner::Borrowed(slice) => slice,
            Inner::Pooled { store, len, .. } => match store {
                // SAFETY: see `deref`; `&mut self` gives exclusive access.
                Some(store) => unsafe { slice::from_raw_parts_mut(store.as_mut_ptr(), *len) },
                None => &mut [],
            },
        }
    }
}

impl<'a, T> Drop for ScratchGuard<'a, T> {
    fn drop(&mut self) {
        if let Inner::Pooled { store, len, pool } = &mut self.inner {
            if let Some(mut store) = store.take() {
                if mem::needs_drop::<T>() {
                    // SAFETY: the full [0, len) range is initialized; the
                    // store must hold no live elements when released.
                    unsafe {
                        ptr::drop_in_place(slice::from_raw_parts_mut(store.as_mut_ptr(), *len));
                    }
                }
                if let Err(err) = pool.release(store) {
                    error!("failed to release scratch store: {err}");
                }
            }
        }
    }
}

impl<'a, T> From<&'a mut [T]> for ScratchGuard<'a, T> {
    fn from(slice: &'a mut [T]) -> Self {
        Self::borrowed(slice)
    }
}
