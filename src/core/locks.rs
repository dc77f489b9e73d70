use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutexes keyed by identity, so operations on one key are serialized
/// while different keys proceed in parallel
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash + Clone> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub async fn lock(&self, key: &K) -> KeyGuard<'_, K> {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently holding a lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held lock; the map entry is dropped once nobody else is waiting on it
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_released() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        {
            let _a = locks.lock(&"a".to_string()).await;
            let _b = locks.lock(&"b".to_string()).await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks: Arc<KeyedLocks<String>> = Arc::new(KeyedLocks::new());
        let counter = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&"player".to_string()).await;
                counter.lock().await.push(format!("start-{}", i));
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.lock().await.push(format!("end-{}", i));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every start is immediately followed by its own end
        let log = counter.lock().await;
        for pair in log.chunks(2) {
            assert_eq!(pair[0].replace("start", "end"), pair[1]);
        }
    }
}
