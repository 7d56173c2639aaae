/*!
 * Shared Pool Registry
 * One process-wide pool per element type, created on first use
 */

use super::exact::ExactSizePool;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

type Registry = DashMap<TypeId, Arc<dyn Any + Send + Sync>, RandomState>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

impl<T: Send + 'static> ExactSizePool<T> {
    /// The process-wide shared pool for this element type.
    ///
    /// Created once on first use with the default configuration and lives for
    /// the process lifetime; there is no teardown. Buffers default to this
    /// pool unless constructed with an explicit one.
    pub fn shared() -> Arc<ExactSizePool<T>> {
        let registry = REGISTRY.get_or_init(|| DashMap::with_hasher(RandomState::new()));
        let entry = registry
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(ExactSizePool::<T>::new()) as Arc<dyn Any + Send + Sync>);
        let erased = Arc::clone(entry.value());
        drop(entry);
        match erased.downcast::<ExactSizePool<T>>() {
            Ok(pool) => pool,
            Err(_) => unreachable!("shared-pool registry entry matches its TypeId key"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_pool_is_per_type_singleton() {
        let a = ExactSizePool::<u64>::shared();
        let b = ExactSizePool::<u64>::shared();
        assert!(Arc::ptr_eq(&a, &b));

        let c = ExactSizePool::<u32>::shared();
        let store = c.rent(3).unwrap();
        assert_eq!(store.len(), 3);
        c.release(store).unwrap();
    }

    #[test]
    fn test_shared_pool_rents() {
        let pool = ExactSizePool::<i32>::shared();
        let store = pool.rent(12).unwrap();
        assert_eq!(store.len(), 12);
        pool.release(store).unwrap();
    }
}
