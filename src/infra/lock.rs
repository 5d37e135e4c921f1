//! Poison-tolerant guards for the catalog cache lock.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                hint = "cached catalog may be stale after panic in another thread",
                "Recovered from poisoned catalog lock"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                hint = "cached catalog may be stale after panic in another thread",
                "Recovered from poisoned catalog lock"
            );
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use super::*;

    #[test]
    fn poisoned_catalog_lock_stays_usable() {
        let lock = Arc::new(RwLock::new(HashMap::from([("slides", 1_u32)])));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().expect("write");
            panic!("poison the lock");
        })
        .join();
        assert!(lock.is_poisoned());

        assert_eq!(rw_read(&lock, "test", "read").get("slides"), Some(&1));
        rw_write(&lock, "test", "write").insert("infographics", 2);
        assert_eq!(rw_read(&lock, "test", "read").len(), 2);
    }
}
