//! Typed key/value store shared between nodes.
//!
//! A [`Blackboard`] maps integer keys to type-tagged slots. The first write
//! to a key binds it to the written type; later writes and typed reads must
//! use that same type or they fail with
//! [`BehaviorTreeError::TypeMismatch`]. [`Blackboard::reset_with_type`] is
//! the only way to rebind a key to another type.
//!
//! `Blackboard` is a handle: cloning it shares the underlying storage. This
//! is how a global or per-tree blackboard is shared between several tree
//! instances while each instance keeps its own private one.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{BehaviorTreeError, Result};

/// Integer key addressing a blackboard slot.
///
/// Keys are usually declared once as constants next to the code that owns
/// them:
///
/// ```rust
/// use behavior_tree::BlackboardKey;
///
/// const TARGET_DISTANCE: BlackboardKey = BlackboardKey::new(1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlackboardKey(u32);

impl BlackboardKey {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for BlackboardKey {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BlackboardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Slot {
    fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Box::new(value),
        }
    }

    fn holds<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    fn mismatch<T>(&self, key: BlackboardKey) -> BehaviorTreeError {
        BehaviorTreeError::TypeMismatch {
            key,
            bound: self.type_name,
            requested: type_name::<T>(),
        }
    }
}

/// Shared, runtime-typed key/value store.
///
/// Accessors never hand out lock guards. Closures passed to
/// [`Blackboard::with_data`] run while the store is read-locked and must not
/// write to the same blackboard.
#[derive(Clone, Default)]
pub struct Blackboard {
    slots: Arc<RwLock<HashMap<BlackboardKey, Slot>>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or updates the slot for `key`.
    ///
    /// # Errors
    ///
    /// [`BehaviorTreeError::TypeMismatch`] if `key` is already bound to a
    /// type other than `T`. The stored value is left untouched.
    pub fn set<T: Send + Sync + 'static>(&self, key: BlackboardKey, value: T) -> Result<()> {
        let mut slots = self.write();
        match slots.entry(key) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if !slot.holds::<T>() {
                    return Err(slot.mismatch::<T>(key));
                }
                slot.value = Box::new(value);
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot::new(value));
            }
        }
        Ok(())
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`BehaviorTreeError::KeyNotFound`] if nothing is stored under `key`
    /// - [`BehaviorTreeError::TypeMismatch`] if `key` holds another type
    pub fn get<T: Clone + 'static>(&self, key: BlackboardKey) -> Result<T> {
        self.with_data(key, T::clone)
    }

    /// Borrows the value stored under `key` for the duration of `f`.
    pub fn with_data<T: 'static, R>(&self, key: BlackboardKey, f: impl FnOnce(&T) -> R) -> Result<R> {
        let slots = self.read();
        let slot = slots
            .get(&key)
            .ok_or(BehaviorTreeError::KeyNotFound { key })?;
        slot.value
            .downcast_ref::<T>()
            .map(f)
            .ok_or_else(|| slot.mismatch::<T>(key))
    }

    /// Non-failing variant of [`Blackboard::get`].
    pub fn try_get<T: Clone + 'static>(&self, key: BlackboardKey) -> Option<T> {
        self.read()
            .get(&key)
            .and_then(|slot| slot.value.downcast_ref::<T>())
            .cloned()
    }

    /// Returns the stored value, or `fallback` when the key is absent or
    /// bound to another type.
    pub fn get_or<T: Clone + 'static>(&self, key: BlackboardKey, fallback: T) -> T {
        self.try_get(key).unwrap_or(fallback)
    }

    pub fn get_or_default<T: Clone + Default + 'static>(&self, key: BlackboardKey) -> T {
        self.try_get(key).unwrap_or_default()
    }

    /// Returns `true` if any value is stored under `key`.
    pub fn contains_key(&self, key: BlackboardKey) -> bool {
        self.read().contains_key(&key)
    }

    /// Returns `true` if `key` is bound to `T`.
    pub fn contains_key_of<T: 'static>(&self, key: BlackboardKey) -> bool {
        self.read().get(&key).is_some_and(Slot::holds::<T>)
    }

    /// Discards any existing binding for `key` and rebinds it to `T`.
    pub fn reset_with_type<T: Send + Sync + 'static>(&self, key: BlackboardKey, value: T) {
        self.write().insert(key, Slot::new(value));
    }

    /// Removes the slot for `key`, returning whether it existed.
    pub fn remove(&self, key: BlackboardKey) -> bool {
        self.write().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns `true` if both handles share the same storage.
    pub fn ptr_eq(&self, other: &Blackboard) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BlackboardKey, Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BlackboardKey, Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.read();
        let mut keys: Vec<_> = slots.keys().copied().collect();
        keys.sort();
        f.debug_struct("Blackboard").field("keys", &keys).finish()
    }
}
