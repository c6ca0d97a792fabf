//! Store of error pages.
//!
//! Two maps, one keyed by status code and one by failure type name, each behind its own
//! `RwLock`. Requests only take read locks. Configuration reload takes the write lock, which is
//! also what makes `remove` a single compare-and-remove step.

use http::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error_page::{ErrorPage, ErrorPageKey};

#[derive(Debug, Default)]
pub struct ErrorPageRegistry {
    status_pages: RwLock<HashMap<StatusCode, Arc<ErrorPage>>>,
    failure_pages: RwLock<HashMap<String, Arc<ErrorPage>>>,
}

impl ErrorPageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: impl IntoIterator<Item = ErrorPage>) -> Self {
        pages.into_iter().collect()
    }

    /// Register a page, replacing any page under the same key. Returns the replaced page.
    pub fn add(&self, page: ErrorPage) -> Option<Arc<ErrorPage>> {
        match page.key().clone() {
            ErrorPageKey::Status(status) => write(&self.status_pages).insert(status, Arc::new(page)),
            ErrorPageKey::Failure(name) => write(&self.failure_pages).insert(name, Arc::new(page)),
        }
    }

    /// Unregister a page, only if the page currently stored under its key is equal to `page`.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, page: &ErrorPage) -> bool {
        match page.key() {
            ErrorPageKey::Status(status) => remove_if_current(&mut write(&self.status_pages), status, page),
            ErrorPageKey::Failure(name) => remove_if_current(&mut write(&self.failure_pages), name.as_str(), page),
        }
    }

    pub fn find_by_status(&self, status: StatusCode) -> Option<Arc<ErrorPage>> {
        read(&self.status_pages).get(&status).cloned()
    }

    /// Exact lookup by failure type name, no ancestry. See `find_by_failure`.
    pub fn find_by_failure_type(&self, name: &str) -> Option<Arc<ErrorPage>> {
        read(&self.failure_pages).get(name).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.status_pages).len() + read(&self.failure_pages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        write(&self.status_pages).clear();
        write(&self.failure_pages).clear();
    }
}

impl std::iter::FromIterator<ErrorPage> for ErrorPageRegistry {
    fn from_iter<I: IntoIterator<Item = ErrorPage>>(iter: I) -> Self {
        let registry = Self::new();
        for page in iter {
            registry.add(page);
        }
        registry
    }
}

fn remove_if_current<K, Q>(map: &mut HashMap<K, Arc<ErrorPage>>, key: &Q, expected: &ErrorPage) -> bool
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: std::hash::Hash + Eq + ?Sized,
{
    match map.get(key) {
        Some(current) if **current == *expected => {
            map.remove(key);
            true
        },
        _ => false,
    }
}

// A panic while holding the lock can't leave a map half-updated, so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
