//! Category-keyed registry of pending listeners.
//!
//! Callers register interest in a future inbound event of some category; the
//! dispatcher later resolves and removes matching listeners. Both the
//! dispatcher and the original caller (on timeout or cancellation) may try to
//! remove the same listener, so removal of a missing entry is a normal
//! `false` outcome rather than an error.
//!
//! All operations take a single short-lived lock and never suspend.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;

use crate::lock_ignore_poison;

/// A record of interest in an inbound event category.
///
/// Everything beyond the category (filters, resolution targets) belongs to
/// the implementor and is opaque to the registry.
pub trait Listener {
    type Category: Eq + Hash + Clone;

    fn category(&self) -> &Self::Category;
}

/// Thread-safe map from category to listeners in registration order.
pub struct ListenerRegistry<L: Listener> {
    entries: Mutex<HashMap<L::Category, VecDeque<L>>>,
}

impl<L: Listener> ListenerRegistry<L> {
    // ---

    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Append `listener` to the queue for `category`.
    ///
    /// `category` must equal `listener.category()`: removal looks the
    /// listener up by its own category. Debug builds assert this; release
    /// builds file the listener under `listener.category()`.
    pub fn register(&self, category: L::Category, listener: L) {
        // ---
        debug_assert!(
            &category == listener.category(),
            "listener registered under a category other than its own"
        );

        let key = listener.category().clone();
        let mut entries = lock_ignore_poison(&self.entries);
        entries.entry(key).or_default().push_back(listener);
    }

    /// Remove the first listener equal to `probe` from `probe.category()`.
    ///
    /// Returns `false` when the category or listener is not present, which
    /// happens routinely when the dispatcher resolved it first.
    pub fn remove<Q>(&self, probe: &Q) -> bool
    where
        Q: Listener<Category = L::Category> + ?Sized,
        L: PartialEq<Q>,
    {
        self.take(probe).is_some()
    }

    /// Like [`remove`](Self::remove), but hands back the removed record.
    pub fn take<Q>(&self, probe: &Q) -> Option<L>
    where
        Q: Listener<Category = L::Category> + ?Sized,
        L: PartialEq<Q>,
    {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        let category = probe.category();
        let queue = entries.get_mut(category)?;

        let index = queue.iter().position(|listener| listener == probe)?;
        let removed = queue.remove(index);

        if queue.is_empty() {
            entries.remove(category);
        }
        removed
    }

    /// Remove and return the oldest listener in `category` accepted by `predicate`.
    pub fn resolve_first<F>(&self, category: &L::Category, mut predicate: F) -> Option<L>
    where
        F: FnMut(&L) -> bool,
    {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        let queue = entries.get_mut(category)?;

        let index = queue.iter().position(|listener| predicate(listener))?;
        let resolved = queue.remove(index);

        if queue.is_empty() {
            entries.remove(category);
        }
        resolved
    }

    /// Remove and return every listener in `category` accepted by `predicate`,
    /// oldest first.
    pub fn resolve_all<F>(&self, category: &L::Category, mut predicate: F) -> Vec<L>
    where
        F: FnMut(&L) -> bool,
    {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        let Some(queue) = entries.get_mut(category) else {
            return Vec::new();
        };

        // Evaluate every predicate before touching the queue, so a panicking
        // predicate leaves it intact.
        let hits: Vec<bool> = queue.iter().map(|listener| predicate(listener)).collect();

        let mut resolved = Vec::new();
        let mut kept = VecDeque::with_capacity(queue.len());
        for (listener, hit) in queue.drain(..).zip(hits) {
            if hit {
                resolved.push(listener);
            } else {
                kept.push_back(listener);
            }
        }

        let now_empty = kept.is_empty();
        *queue = kept;
        if now_empty {
            entries.remove(category);
        }
        resolved
    }

    /// Run `f` over the listeners of `category` while holding the lock.
    ///
    /// Unknown categories are presented as an empty queue.
    pub fn with_listeners<F, R>(&self, category: &L::Category, f: F) -> R
    where
        F: FnOnce(&VecDeque<L>) -> R,
    {
        // ---
        let entries = lock_ignore_poison(&self.entries);
        match entries.get(category) {
            Some(queue) => f(queue),
            None => f(&VecDeque::new()),
        }
    }

    /// Number of listeners registered under `category`.
    pub fn len_of(&self, category: &L::Category) -> usize {
        lock_ignore_poison(&self.entries)
            .get(category)
            .map_or(0, VecDeque::len)
    }

    /// Total number of listeners across all categories.
    pub fn len(&self) -> usize {
        lock_ignore_poison(&self.entries)
            .values()
            .map(VecDeque::len)
            .sum()
    }

    /// `true` when no listener is registered under any category.
    pub fn is_empty(&self) -> bool {
        lock_ignore_poison(&self.entries).is_empty()
    }

    /// Remove every listener, returning them.
    pub fn drain(&self) -> Vec<L> {
        // ---
        let mut entries = lock_ignore_poison(&self.entries);
        entries.drain().flat_map(|(_, queue)| queue).collect()
    }
}

impl<L: Listener> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}
