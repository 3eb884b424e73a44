//! Thread-Safe Sharded Store
//!
//! This module implements the keyspace shared by every connection task and
//! the background expiry sweeper. Each key maps to one [`Object`].
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: 64 independent `RwLock<HashMap>` shards; a key always
//!    hashes to the same shard, so operations on one key are serialized while
//!    operations on unrelated keys rarely contend.
//! 2. **Closure Access**: [`Store::read`] and [`Store::update`] run a closure
//!    while the shard lock is held. A handler that checks a key's type and
//!    then mutates it does so under a single lock acquisition.
//! 3. **Passive Expiry**: `read`, `update`, `exists` and `delete` never expose
//!    an expired object. `update` also drops it from the map.
//! 4. **Raw Access**: `get`, `has_expired` and `get_expiry` report what is
//!    physically stored and leave the expiry decision to the caller.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Locks are never held across an `.await`; every operation is a short
//! synchronous critical section.

use crate::storage::object::{now_ms, Object};
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of shards for the store.
const NUM_SHARDS: usize = 64;

type ShardMap = HashMap<Bytes, Object>;

/// The raw expiry state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Nothing is stored under the key
    Missing,
    /// The key is stored without a TTL
    Persistent,
    /// The key expires at this instant (ms since the epoch)
    At(u64),
}

/// A single shard containing a portion of the keyspace.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<ShardMap>,
}

impl Shard {
    // Map mutations are single calls, and `update` writes its slot back even
    // when the closure panics, so a poisoned guard still protects a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, ShardMap> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ShardMap> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the slot of an in-progress [`Store::update`] back into the shard on
/// drop, including during unwinding.
struct WriteBack<'a> {
    data: &'a mut ShardMap,
    key: &'a Bytes,
    slot: Option<Object>,
}

impl Drop for WriteBack<'_> {
    fn drop(&mut self) {
        if let Some(object) = self.slot.take() {
            self.data.insert(self.key.clone(), object);
        }
    }
}

/// The shared keyspace.
///
/// Wrap it in an `Arc` and hand a clone to the dispatcher and the expiry
/// sweeper. Independent instances are fully isolated from each other.
///
/// # Example
///
/// ```
/// use tishkv::storage::{Object, Store, Value};
/// use bytes::Bytes;
///
/// let store = Store::new();
/// let key = Bytes::from("name");
///
/// store.set(key.clone(), Object::new(key.clone(), Value::Str(Bytes::from("tish")), -1));
///
/// let live = store.read(&key, |obj| obj.map(|o| o.value.clone()));
/// assert_eq!(live, Some(Value::Str(Bytes::from("tish"))));
/// ```
pub struct Store {
    shards: Vec<Shard>,

    /// Statistics: objects reclaimed by passive or active expiry
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &self.shards.len())
            .field("keys", &self.len())
            .field("expired", &self.expired_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Returns a copy of the stored object, expired or not.
    ///
    /// No expiry check or deletion happens here; callers combine this with
    /// [`Object::is_expired`] or [`Store::has_expired`].
    pub fn get(&self, key: &[u8]) -> Option<Object> {
        self.shard(key).read().get(key).cloned()
    }

    /// Inserts or replaces the object stored under `key`.
    pub fn set(&self, key: Bytes, object: Object) {
        self.shard(&key).write().insert(key, object);
    }

    /// Returns true iff an object is stored under `key` and its expiry has
    /// passed, whether or not the sweeper has reclaimed it yet.
    pub fn has_expired(&self, key: &[u8]) -> bool {
        let now = now_ms();
        self.shard(key)
            .read()
            .get(key)
            .map(|obj| obj.is_expired(now))
            .unwrap_or(false)
    }

    /// Returns the raw expiry of the stored object.
    pub fn get_expiry(&self, key: &[u8]) -> Expiry {
        match self.shard(key).read().get(key) {
            None => Expiry::Missing,
            Some(obj) => match obj.expires_at {
                None => Expiry::Persistent,
                Some(at) => Expiry::At(at),
            },
        }
    }

    /// Runs `f` against the live object under the shard's read lock.
    ///
    /// An expired object is presented as `None`.
    pub fn read<R>(&self, key: &[u8], f: impl FnOnce(Option<&Object>) -> R) -> R {
        let now = now_ms();
        let data = self.shard(key).read();
        f(data.get(key).filter(|obj| !obj.is_expired(now)))
    }

    /// Runs `f` against the live object under the shard's write lock.
    ///
    /// The slot holds `None` if the key is absent or expired (an expired object
    /// is dropped here). Whatever the slot holds when `f` returns is written
    /// back: `Some` stores the object, `None` removes the key.
    pub fn update<R>(&self, key: &Bytes, f: impl FnOnce(&mut Option<Object>) -> R) -> R {
        let now = now_ms();
        let mut data = self.shard(key).write();

        let mut slot = data.remove(key);
        if slot.as_ref().is_some_and(|obj| obj.is_expired(now)) {
            slot = None;
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }

        let mut write_back = WriteBack {
            data: &mut *data,
            key,
            slot,
        };
        f(&mut write_back.slot)
    }

    /// Deletes a key. Returns `true` if a live object was removed.
    pub fn delete(&self, key: &[u8]) -> bool {
        let now = now_ms();
        match self.shard(key).write().remove(key) {
            Some(obj) if obj.is_expired(now) => {
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Checks whether a live object is stored under `key`.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.read(key, |obj| obj.is_some())
    }

    /// Removes every object that is expired as of the start of the scan.
    ///
    /// Shards are locked one at a time. Returns the number of objects removed.
    pub fn delete_expired_keys(&self) -> u64 {
        let now = now_ms();
        let mut cleaned = 0u64;

        for shard in &self.shards {
            let mut data = shard.write();
            let before = data.len();

            data.retain(|_, obj| !obj.is_expired(now));

            cleaned += (before - data.len()) as u64;
        }

        if cleaned > 0 {
            self.expired_count.fetch_add(cleaned, Ordering::Relaxed);
        }

        cleaned
    }

    /// Returns the number of stored objects, including expired objects that
    /// have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len() as u64,
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of objects currently stored
    pub keys: u64,
    /// Total objects reclaimed by expiry
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::object::Value;
    use crate::storage::set::MemberSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn scalar(key: &str, value: &str, ttl_ms: i64) -> Object {
        Object::new(Bytes::from(key.to_string()), Value::Str(Bytes::from(value.to_string())), ttl_ms)
    }

    fn put(store: &Store, key: &str, value: &str, ttl_ms: i64) {
        store.set(Bytes::from(key.to_string()), scalar(key, value, ttl_ms));
    }

    fn live_value(store: &Store, key: &str) -> Option<Value> {
        store.read(key.as_bytes(), |obj| obj.map(|o| o.value.clone()))
    }

    #[test]
    fn test_set_and_get() {
        let store = Store::new();
        put(&store, "key", "value", -1);

        let obj = store.get(b"key").unwrap();
        assert_eq!(obj.value, Value::Str(Bytes::from("value")));
        assert_eq!(obj.expires_at, None);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = Store::new();
        assert_eq!(store.get(b"nonexistent"), None);
        assert_eq!(live_value(&store, "nonexistent"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = Store::new();
        put(&store, "key", "first", -1);
        put(&store, "key", "second", -1);

        assert_eq!(live_value(&store, "key"), Some(Value::Str(Bytes::from("second"))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = Store::new();
        put(&store, "key", "value", -1);

        assert!(store.delete(b"key"));
        assert_eq!(store.get(b"key"), None);
        assert!(!store.delete(b"key")); // Already deleted
    }

    #[test]
    fn test_delete_expired_reports_false() {
        let store = Store::new();
        put(&store, "key", "value", 0);

        assert!(!store.delete(b"key"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_exists() {
        let store = Store::new();

        assert!(!store.exists(b"key"));
        put(&store, "key", "value", -1);
        assert!(store.exists(b"key"));
    }

    #[test]
    fn test_passive_expiry_hides_unswept_key() {
        let store = Store::new();
        put(&store, "key", "value", 50);

        assert!(store.exists(b"key"));
        assert!(!store.has_expired(b"key"));

        std::thread::sleep(Duration::from_millis(100));

        // Still physically present, never visible
        assert!(store.get(b"key").is_some());
        assert!(store.has_expired(b"key"));
        assert_eq!(live_value(&store, "key"), None);
        assert!(!store.exists(b"key"));
    }

    #[test]
    fn test_persistent_key_never_expires() {
        let store = Store::new();
        put(&store, "key", "value", -1);

        std::thread::sleep(Duration::from_millis(20));

        assert!(!store.has_expired(b"key"));
        assert_eq!(store.delete_expired_keys(), 0);
        assert_eq!(live_value(&store, "key"), Some(Value::Str(Bytes::from("value"))));
    }

    #[test]
    fn test_has_expired_absent_key() {
        let store = Store::new();
        assert!(!store.has_expired(b"missing"));
    }

    #[test]
    fn test_get_expiry() {
        let store = Store::new();
        assert_eq!(store.get_expiry(b"missing"), Expiry::Missing);

        put(&store, "persistent", "v", -1);
        assert_eq!(store.get_expiry(b"persistent"), Expiry::Persistent);

        let before = now_ms();
        put(&store, "volatile", "v", 10_000);
        match store.get_expiry(b"volatile") {
            Expiry::At(at) => assert!(at >= before + 10_000),
            other => panic!("unexpected expiry: {:?}", other),
        }
    }

    #[test]
    fn test_update_creates_and_mutates() {
        let store = Store::new();
        let key = Bytes::from("set");

        for member in ["a", "b", "a"] {
            store.update(&key, |slot| {
                let obj = slot.get_or_insert_with(|| {
                    Object::persistent(key.clone(), Value::Set(MemberSet::new()))
                });
                if let Value::Set(set) = &mut obj.value {
                    set.add(Bytes::from(member));
                }
            });
        }

        let len = store.read(&key, |obj| match obj.map(|o| &o.value) {
            Some(Value::Set(set)) => set.len(),
            _ => 0,
        });
        assert_eq!(len, 2);
    }

    #[test]
    fn test_update_clearing_slot_removes_key() {
        let store = Store::new();
        put(&store, "key", "value", -1);

        let existed = store.update(&Bytes::from("key"), |slot| slot.take().is_some());

        assert!(existed);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_drops_expired_object() {
        let store = Store::new();
        put(&store, "key", "stale", 0);

        let seen = store.update(&Bytes::from("key"), |slot| slot.is_some());

        assert!(!seen);
        assert!(store.is_empty());
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn test_delete_expired_keys() {
        let store = Store::new();

        put(&store, "key1", "value1", 10);
        put(&store, "key2", "value2", 10);
        put(&store, "key3", "value3", -1); // No expiry
        put(&store, "key4", "value4", 60_000); // Live TTL

        std::thread::sleep(Duration::from_millis(50));

        let cleaned = store.delete_expired_keys();
        assert_eq!(cleaned, 2);
        assert_eq!(store.len(), 2);
        assert!(store.exists(b"key3"));
        assert!(store.exists(b"key4"));
        assert_eq!(store.stats(), StoreStats { keys: 2, expired: 2 });
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = Arc::new(Store::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    put(&store, &key, "value", -1);
                    assert!(store.exists(key.as_bytes()));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_concurrent_writes_same_key_never_mix() {
        use std::thread;

        let store = Arc::new(Store::new());
        let handles: Vec<_> = ["v1", "v2"]
            .into_iter()
            .map(|value| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        put(&store, "shared", value, -1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = live_value(&store, "shared");
        assert!(
            value == Some(Value::Str(Bytes::from("v1")))
                || value == Some(Value::Str(Bytes::from("v2")))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_updates_same_key_lose_nothing() {
        use std::thread;

        const THREADS: usize = 8;
        const ITERS: usize = 250;

        let store = Arc::new(Store::new());
        let key = Bytes::from("shared");

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = Arc::clone(&store);
                let key = key.clone();
                thread::spawn(move || {
                    for i in 0..ITERS {
                        let member = Bytes::from(format!("m-{}-{}", t, i));
                        store.update(&key, |slot| {
                            let object = slot.get_or_insert_with(|| {
                                Object::persistent(key.clone(), Value::Set(MemberSet::new()))
                            });
                            if let Value::Set(set) = &mut object.value {
                                set.add(member);
                            }
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let members = store.read(&key, |obj| match obj.map(|o| &o.value) {
            Some(Value::Set(set)) => set.len(),
            _ => 0,
        });
        assert_eq!(members, THREADS * ITERS);
    }

    #[test]
    fn test_update_panic_keeps_object() {
        let store = Store::new();
        put(&store, "key", "value", -1);

        let key = Bytes::from("key");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.update(&key, |_slot| panic!("handler bug"));
        }));
        assert!(result.is_err());

        assert_eq!(
            live_value(&store, "key"),
            Some(Value::Str(Bytes::from("value")))
        );
    }

    #[test]
    fn test_sweep_concurrent_with_writers() {
        use std::thread;

        let store = Arc::new(Store::new());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..500 {
                    put(&store, &format!("live-{}", i), "v", -1);
                    put(&store, &format!("dead-{}", i), "v", 0);
                }
            })
        };

        for _ in 0..20 {
            store.delete_expired_keys();
        }
        writer.join().unwrap();
        store.delete_expired_keys();

        assert_eq!(store.len(), 500);
        assert!((0..500).all(|i| store.exists(format!("live-{}", i).as_bytes())));
    }
}
