//! Durable per-origin key/value storage with change notifications.
//!
//! Every execution context (browser tab, window) gets its own handle onto
//! the shared storage. A write that changes a key's value is announced to
//! the listeners of every *other* context as a [`StorageChange`]; the
//! writing context never hears about its own writes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;

/// A key's new value as seen from another context; `None` after removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: Option<String>,
}

pub type ChangeListener = Box<dyn Fn(&StorageChange)>;

pub trait DurableStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Listen for writes made by other contexts
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// Registration guard; dropping it stops delivery
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel
    pub fn detached() -> Self {
        Subscription { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Local change callbacks, run after a value owned by this context moves
#[derive(Default)]
pub struct Observers {
    list: RefCell<Vec<(u64, Rc<dyn Fn()>)>>,
    next_id: Cell<u64>,
}

impl Observers {
    /// Register `listener` until the returned subscription drops
    pub fn observe(this: &Rc<Self>, listener: impl Fn() + 'static) -> Subscription {
        let id = this.next_id.get();
        this.next_id.set(id + 1);
        this.list.borrow_mut().push((id, Rc::new(listener)));

        let weak = Rc::downgrade(this);
        Subscription::new(move || {
            if let Some(observers) = weak.upgrade() {
                observers.list.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }

    /// Run every callback; callbacks may register or drop observers
    pub fn notify(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> =
            self.list.borrow().iter().map(|(_, o)| o.clone()).collect();
        for callback in callbacks {
            callback();
        }
    }
}

struct ListenerEntry {
    id: u64,
    context: u64,
    listener: Rc<dyn Fn(&StorageChange)>,
}

#[derive(Default)]
struct OriginInner {
    items: RefCell<HashMap<String, String>>,
    listeners: RefCell<Vec<ListenerEntry>>,
    next_id: Cell<u64>,
    quota: Cell<Option<usize>>,
}

impl OriginInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Deliver to every context except `from`. Listeners are collected first
    /// so they may read or write storage while being notified.
    fn broadcast(&self, from: u64, change: StorageChange) {
        let targets: Vec<Rc<dyn Fn(&StorageChange)>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.context != from)
            .map(|entry| entry.listener.clone())
            .collect();
        for listener in targets {
            listener(&change);
        }
    }
}

/// In-memory origin shared by any number of contexts
#[derive(Clone, Default)]
pub struct MemoryOrigin {
    inner: Rc<OriginInner>,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new execution context on this origin
    pub fn context(&self) -> MemoryStorage {
        MemoryStorage {
            origin: self.inner.clone(),
            context: self.inner.next_id(),
        }
    }

    /// Limit total stored bytes (keys plus values); writes beyond it fail
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.inner.quota.set(bytes);
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.items.borrow().get(key).cloned()
    }
}

/// One context's handle onto a [`MemoryOrigin`]
#[derive(Clone)]
pub struct MemoryStorage {
    origin: Rc<OriginInner>,
    context: u64,
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.origin.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.origin.items.borrow().get(key).cloned();
        if previous.as_deref() == Some(value) {
            return Ok(());
        }

        if let Some(quota) = self.origin.quota.get() {
            let freed = previous.as_ref().map_or(0, |p| key.len() + p.len());
            let needed = self.origin.used_bytes() - freed + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    reason: format!("quota of {quota} bytes exceeded"),
                });
            }
        }

        self.origin
            .items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.origin.broadcast(
            self.context,
            StorageChange {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let removed = self.origin.items.borrow_mut().remove(key);
        if removed.is_some() {
            self.origin.broadcast(
                self.context,
                StorageChange {
                    key: key.to_string(),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = self.origin.next_id();
        self.origin.listeners.borrow_mut().push(ListenerEntry {
            id,
            context: self.context,
            listener: Rc::from(listener),
        });

        let origin = Rc::downgrade(&self.origin);
        Subscription::new(move || {
            if let Some(origin) = origin.upgrade() {
                origin.listeners.borrow_mut().retain(|entry| entry.id != id);
            }
        })
    }
}
