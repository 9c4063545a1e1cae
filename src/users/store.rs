//! Concurrent in-memory user store.
//!
//! # Responsibilities
//! - Own every stored `User`
//! - Insert-if-absent, compare-and-swap update and remove, each atomic
//! - Filtered listing without sorting
//!
//! # Design Decisions
//! - Backed by `DashMap`: operations lock a single shard, never the whole map
//! - Reads hand out clones so callers can never mutate stored records

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::model::{ListFilter, User};

/// A thread-safe map of user id to user record.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<DashMap<i32, User>>,
}

impl UserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the three sample users.
    pub fn with_sample_users() -> Self {
        let store = Self::new();
        store.seed();
        store
    }

    /// Insert the sample users, skipping ids already present.
    pub fn seed(&self) {
        for user in [
            User::new(1, "John", "Doe", 30, true),
            User::new(2, "Jane", "Smith", 25, false),
            User::new(3, "Alex", "Johnson", 40, true),
        ] {
            self.try_add(user.id, user);
        }
        tracing::debug!(count = self.len(), "Seeded sample users");
    }

    /// Insert `user` under `id` unless the id is taken.
    pub fn try_add(&self, id: i32, user: User) -> bool {
        match self.inner.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(user);
                true
            }
        }
    }

    /// Get a copy of the user stored under `id`.
    pub fn get(&self, id: i32) -> Option<User> {
        self.inner.get(&id).map(|r| r.value().clone())
    }

    /// Replace the user under `id` only if it still equals `expected`.
    ///
    /// Returns false when the id is absent or the stored value changed since
    /// `expected` was read.
    pub fn try_update(&self, id: i32, new_user: User, expected: &User) -> bool {
        match self.inner.get_mut(&id) {
            Some(mut current) if *current == *expected => {
                *current = new_user;
                true
            }
            _ => false,
        }
    }

    /// Remove and return the user stored under `id`.
    pub fn try_remove(&self, id: i32) -> Option<User> {
        self.inner.remove(&id).map(|(_, user)| user)
    }

    /// Copies of every user matching `filter`, in map order.
    pub fn list_all(&self, filter: &ListFilter) -> Vec<User> {
        let matches = filter.predicate();
        self.inner
            .iter()
            .filter(|r| matches(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
