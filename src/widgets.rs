//! Field-level search inputs.
//!
//! Each input keeps its draft text under its own storage key, restores it
//! on mount and follows edits made in other contexts, telling its observers
//! when one lands. Submitting sanitizes
//! the draft and hands back the query string to run, if any.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::catalog::CatalogClient;
use crate::config::InputConfig;
use crate::parse;
use crate::storage::{DurableStorage, Observers, StorageChange, Subscription};

/// Maximum number of ingredient suggestions shown at once
pub const MAX_SUGGESTIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Ingredient,
    Identifier,
}

impl FieldKind {
    /// Normalized query for `raw`, or `None` when nothing should be emitted.
    /// Names always emit, even when blank.
    pub fn sanitize(self, raw: &str, max_len: usize) -> Option<String> {
        match self {
            FieldKind::Name => Some(parse::truncate_trim(raw, max_len)),
            FieldKind::Ingredient => {
                Some(parse::truncate_trim(raw, max_len)).filter(|s| !s.is_empty())
            }
            FieldKind::Identifier => parse::normalize_id(raw)
                .map(|digits| digits.chars().take(max_len).collect()),
        }
    }
}

struct DraftInner {
    kind: FieldKind,
    config: InputConfig,
    storage: Rc<dyn DurableStorage>,
    value: RefCell<String>,
    observers: Rc<Observers>,
    _sync: RefCell<Option<Subscription>>,
}

/// One mounted input field; dropping it stops cross-context syncing
#[derive(Clone)]
pub struct DraftInput {
    inner: Rc<DraftInner>,
}

impl DraftInput {
    pub fn mount(kind: FieldKind, config: InputConfig, storage: Rc<dyn DurableStorage>) -> Self {
        let value = storage
            .get_item(&config.storage_key)
            .unwrap_or_else(|e| {
                debug!("Draft for {} unavailable: {e}", config.storage_key);
                None
            })
            .unwrap_or_default();

        let input = DraftInput {
            inner: Rc::new(DraftInner {
                kind,
                config,
                storage,
                value: RefCell::new(value),
                observers: Rc::new(Observers::default()),
                _sync: RefCell::new(None),
            }),
        };

        let weak: Weak<DraftInner> = Rc::downgrade(&input.inner);
        let subscription = input
            .inner
            .storage
            .subscribe(Box::new(move |change: &StorageChange| {
                if let Some(inner) = weak.upgrade() {
                    DraftInput { inner }.follow(change);
                }
            }));
        *input.inner._sync.borrow_mut() = Some(subscription);

        input
    }

    pub fn value(&self) -> String {
        self.inner.value.borrow().clone()
    }

    /// Keystroke: replace the draft and persist it
    pub fn input(&self, text: &str) {
        *self.inner.value.borrow_mut() = text.to_string();
        if let Err(e) = self
            .inner
            .storage
            .set_item(&self.inner.config.storage_key, text)
        {
            warn!("Failed to persist draft: {e}");
        }
    }

    /// Sanitized current draft, if it should be searched for
    pub fn submit(&self) -> Option<String> {
        self.inner.kind.sanitize(&self.value(), self.inner.config.max_len)
    }

    /// Empty the field and forget its persisted draft
    pub fn clear(&self) {
        self.inner.value.borrow_mut().clear();
        if let Err(e) = self.inner.storage.remove_item(&self.inner.config.storage_key) {
            warn!("Failed to remove draft: {e}");
        }
    }

    fn follow(&self, change: &StorageChange) {
        if change.key != self.inner.config.storage_key {
            return;
        }
        let incoming = change.new_value.clone().unwrap_or_default();
        if *self.inner.value.borrow() != incoming {
            *self.inner.value.borrow_mut() = incoming;
            self.inner.observers.notify();
        }
    }

    /// Run `listener` whenever another context changes this draft
    pub fn observe(&self, listener: impl Fn() + 'static) -> Subscription {
        Observers::observe(&self.inner.observers, listener)
    }
}

/// Ingredient input with suggestions from the catalog's ingredient list
#[derive(Clone)]
pub struct IngredientPicker {
    input: DraftInput,
    ingredients: Rc<RefCell<Vec<String>>>,
}

impl IngredientPicker {
    pub fn mount(config: InputConfig, storage: Rc<dyn DurableStorage>) -> Self {
        IngredientPicker {
            input: DraftInput::mount(FieldKind::Ingredient, config, storage),
            ingredients: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Fetch the ingredient list once; failures leave it empty
    pub async fn load_ingredients(&self, catalog: &dyn CatalogClient) {
        match catalog.list_ingredients().await {
            Ok(names) => *self.ingredients.borrow_mut() = names,
            Err(e) => warn!("Failed to load ingredient list: {e}"),
        }
    }

    pub fn input(&self) -> &DraftInput {
        &self.input
    }

    /// Case-insensitive substring matches for the current draft
    pub fn suggestions(&self) -> Vec<String> {
        let query = self.input.value().trim().to_lowercase();
        self.ingredients
            .borrow()
            .iter()
            .filter(|name| name.to_lowercase().contains(&query))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    /// Picking a suggestion fills the field and searches for it
    pub fn select(&self, option: &str) -> Option<String> {
        self.input.input(option);
        self.input.submit()
    }
}
