//! # Entity Store
//!
//! The one shared mutable resource in the system. The trait mirrors the
//! persisted-state collaborator contract: `has`, `get` (fails on a missing
//! key), `set`, `delete`, all over opaque UTF-8 keys.
//!
//! ## Total Aborts
//!
//! Operations never write to the base store directly. The runtime opens a
//! [`StoreTxn`] per call; writes buffer in the overlay and land on the base
//! store only through `commit`. Dropping the transaction on an error path
//! discards every staged write, which is what makes a rejection total.

use std::collections::HashMap;

use crate::error::{CoreResult, StoreError};

/// Byte-keyed persistent storage collaborator.
pub trait EntityStore {
    /// True if a record exists under `key`.
    fn has(&self, key: &str) -> bool;

    /// Returns the record under `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no record exists.
    fn get(&self, key: &str) -> CoreResult<Vec<u8>>;

    /// Writes the record under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// Removes the record under `key`. Removing a missing key is a no-op.
    fn delete(&mut self, key: &str);
}

/// In-memory reference store used by tests and the local runtime.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    map: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn get(&self, key: &str) -> CoreResult<Vec<u8>> {
        self.map
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.map.insert(key.to_owned(), value);
    }

    fn delete(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// Staged transaction over any [`EntityStore`].
///
/// Reads fall through the overlay to the base store; writes and deletes
/// buffer in the overlay until [`StoreTxn::commit`] applies them
/// all-or-nothing. Dropping the transaction discards the overlay.
#[derive(Debug)]
pub struct StoreTxn<'a, S: EntityStore + ?Sized> {
    base: &'a mut S,
    /// `Some(bytes)` = staged write, `None` = staged delete.
    overlay: HashMap<String, Option<Vec<u8>>>,
}

impl<'a, S: EntityStore + ?Sized> StoreTxn<'a, S> {
    /// Opens a transaction over `base`.
    #[must_use]
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            overlay: HashMap::new(),
        }
    }

    /// Number of staged writes and deletes.
    #[must_use]
    pub fn staged(&self) -> usize {
        self.overlay.len()
    }

    /// Applies every staged write to the base store and consumes the
    /// transaction.
    pub fn commit(self) {
        let Self { base, overlay } = self;
        for (key, entry) in overlay {
            match entry {
                Some(bytes) => base.set(&key, bytes),
                None => base.delete(&key),
            }
        }
    }
}

impl<S: EntityStore + ?Sized> EntityStore for StoreTxn<'_, S> {
    fn has(&self, key: &str) -> bool {
        match self.overlay.get(key) {
            Some(Some(_)) => true,
            Some(None) => false,
            None => self.base.has(key),
        }
    }

    fn get(&self, key: &str) -> CoreResult<Vec<u8>> {
        match self.overlay.get(key) {
            Some(Some(bytes)) => Ok(bytes.clone()),
            Some(None) => Err(StoreError::NotFound(key.to_owned())),
            None => self.base.get(key),
        }
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.overlay.insert(key.to_owned(), Some(value));
    }

    fn delete(&mut self, key: &str) {
        self.overlay.insert(key.to_owned(), None);
    }
}

// ============================================================================
// Scalar helpers - counters and flags
// ============================================================================

/// Reads a u64 counter, defaulting to 0 when the key is absent.
///
/// # Errors
///
/// `StoreError::Corrupt` if the stored value is not 8 bytes.
pub fn read_counter<S: EntityStore + ?Sized>(store: &S, key: &str) -> CoreResult<u64> {
    if !store.has(key) {
        return Ok(0);
    }
    let bytes = store.get(key)?;
    let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| StoreError::Corrupt {
        key: key.to_owned(),
        reason: format!("counter is {} bytes, expected 8", bytes.len()),
    })?;
    Ok(u64::from_le_bytes(raw))
}

/// Writes a u64 counter.
pub fn write_counter<S: EntityStore + ?Sized>(store: &mut S, key: &str, value: u64) {
    store.set(key, value.to_le_bytes().to_vec());
}

/// Increments a u64 counter and returns the new value.
///
/// # Errors
///
/// `StoreError::CounterOverflow` at `u64::MAX`; `StoreError::Corrupt` on a
/// malformed stored value.
pub fn bump_counter<S: EntityStore + ?Sized>(store: &mut S, key: &str) -> CoreResult<u64> {
    let next = read_counter(store, key)?
        .checked_add(1)
        .ok_or_else(|| StoreError::CounterOverflow(key.to_owned()))?;
    write_counter(store, key, next);
    Ok(next)
}

/// Reads a u128 amount counter (treasury), defaulting to 0 when absent.
///
/// # Errors
///
/// `StoreError::Corrupt` if the stored value is not 16 bytes.
pub fn read_amount<S: EntityStore + ?Sized>(store: &S, key: &str) -> CoreResult<u128> {
    if !store.has(key) {
        return Ok(0);
    }
    let bytes = store.get(key)?;
    let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| StoreError::Corrupt {
        key: key.to_owned(),
        reason: format!("amount is {} bytes, expected 16", bytes.len()),
    })?;
    Ok(u128::from_le_bytes(raw))
}

/// Writes a u128 amount counter.
pub fn write_amount<S: EntityStore + ?Sized>(store: &mut S, key: &str, value: u128) {
    store.set(key, value.to_le_bytes().to_vec());
}

/// Adds to a u128 amount counter, saturating at the top of the range.
///
/// # Errors
///
/// `StoreError::Corrupt` on a malformed stored value.
pub fn add_amount<S: EntityStore + ?Sized>(
    store: &mut S,
    key: &str,
    delta: u128,
) -> CoreResult<u128> {
    let next = read_amount(store, key)?.saturating_add(delta);
    write_amount(store, key, next);
    Ok(next)
}

/// Presence-based boolean flag.
#[must_use]
pub fn flag<S: EntityStore + ?Sized>(store: &S, key: &str) -> bool {
    store.has(key)
}

/// Sets or clears a presence-based flag.
pub fn set_flag<S: EntityStore + ?Sized>(store: &mut S, key: &str, value: bool) {
    if value {
        store.set(key, vec![1]);
    } else {
        store.delete(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_contract() {
        let mut store = MemoryStore::new();
        assert!(!store.has("k"));
        assert_eq!(store.get("k"), Err(StoreError::NotFound("k".into())));

        store.set("k", vec![1, 2, 3]);
        assert!(store.has("k"));
        assert_eq!(store.get("k").unwrap(), vec![1, 2, 3]);

        store.delete("k");
        assert!(!store.has("k"));
    }

    #[test]
    fn test_txn_commit_applies_writes() {
        let mut store = MemoryStore::new();
        store.set("keep", vec![0]);
        store.set("gone", vec![0]);

        let mut txn = StoreTxn::new(&mut store);
        txn.set("new", vec![7]);
        txn.delete("gone");
        assert!(txn.has("new"));
        assert!(!txn.has("gone"));
        assert!(txn.has("keep"));
        txn.commit();

        assert_eq!(store.get("new").unwrap(), vec![7]);
        assert!(!store.has("gone"));
        assert!(store.has("keep"));
    }

    #[test]
    fn test_txn_drop_discards_writes() {
        let mut store = MemoryStore::new();
        store.set("gone", vec![0]);
        {
            let mut txn = StoreTxn::new(&mut store);
            txn.set("new", vec![7]);
            txn.delete("gone");
        }
        assert!(!store.has("new"));
        assert!(store.has("gone"));
    }

    #[test]
    fn test_counters_and_flags() {
        let mut store = MemoryStore::new();
        assert_eq!(read_counter(&store, "n").unwrap(), 0);
        assert_eq!(bump_counter(&mut store, "n").unwrap(), 1);
        assert_eq!(bump_counter(&mut store, "n").unwrap(), 2);

        assert!(!flag(&store, "paused"));
        set_flag(&mut store, "paused", true);
        assert!(flag(&store, "paused"));
        set_flag(&mut store, "paused", false);
        assert!(!flag(&store, "paused"));

        assert_eq!(add_amount(&mut store, "treasury", 150).unwrap(), 150);
        assert_eq!(read_amount(&store, "treasury").unwrap(), 150);
    }
}
