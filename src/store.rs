//! Synchronized search store.
//!
//! Holds the search results, paging cursor, favorites and display filter of
//! one execution context. Every state change is written to durable storage
//! under a single key, and writes to that key from other contexts replace
//! the local state wholesale (last write wins).
//!
//! The store is a cheap `Rc` handle; clones share state. Queries are async
//! and may overlap: whichever catalog response completes last sets the
//! results, even if it belongs to an older query.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use crate::catalog::CatalogClient;
use crate::config::StoreConfig;
use crate::error::{CatalogError, StoreError};
use crate::paging;
use crate::parse;
use crate::snapshot::{self, Coercion};
use crate::storage::{DurableStorage, Observers, StorageChange, Subscription};
use crate::types::{CocktailSummary, SearchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Name,
    Ingredient,
    Identifier,
}

struct StoreInner {
    config: StoreConfig,
    catalog: Rc<dyn CatalogClient>,
    storage: Rc<dyn DurableStorage>,
    state: RefCell<SearchState>,
    loading: Cell<bool>,
    observers: Rc<Observers>,
    _sync: RefCell<Option<Subscription>>,
}

#[derive(Clone)]
pub struct CocktailsStore {
    inner: Rc<StoreInner>,
}

impl CocktailsStore {
    /// Restore state and start listening to other contexts.
    /// Use [`CocktailsStore::open`] to also load initial results.
    pub fn new(
        config: StoreConfig,
        catalog: Rc<dyn CatalogClient>,
        storage: Rc<dyn DurableStorage>,
    ) -> Self {
        let state = restore(&config, storage.as_ref());
        let store = CocktailsStore {
            inner: Rc::new(StoreInner {
                config,
                catalog,
                storage,
                state: RefCell::new(state),
                loading: Cell::new(false),
                observers: Rc::new(Observers::default()),
                _sync: RefCell::new(None),
            }),
        };

        let weak: Weak<StoreInner> = Rc::downgrade(&store.inner);
        let subscription = store
            .inner
            .storage
            .subscribe(Box::new(move |change: &StorageChange| {
                if let Some(inner) = weak.upgrade() {
                    CocktailsStore { inner }.reconcile(change);
                }
            }));
        *store.inner._sync.borrow_mut() = Some(subscription);

        store
    }

    /// Construct, then search for the current term if nothing was restored
    pub async fn open(
        config: StoreConfig,
        catalog: Rc<dyn CatalogClient>,
        storage: Rc<dyn DurableStorage>,
    ) -> Self {
        let store = Self::new(config, catalog, storage);
        store.bootstrap().await;
        store
    }

    pub async fn bootstrap(&self) {
        let (empty, term) = {
            let state = self.inner.state.borrow();
            (state.results.is_empty(), state.search_term.clone())
        };
        if empty {
            info!(term = %term, "No restored results, running initial search");
            self.search(&term).await;
        }
    }

    /// Name search; a blank term searches for the default term
    pub async fn search(&self, term: &str) {
        let term = parse::normalize_term(term)
            .unwrap_or_else(|| self.inner.config.default_search_term.clone());
        self.run_query(QueryKind::Name, term).await;
    }

    /// Ingredient search; a blank term does nothing
    pub async fn search_by_ingredient(&self, term: &str) {
        match parse::normalize_term(term) {
            Some(term) => self.run_query(QueryKind::Ingredient, term).await,
            None => debug!("Ignoring blank ingredient search"),
        }
    }

    /// Identifier search on the digits of `raw`; nothing left means no-op
    pub async fn search_by_id(&self, raw: &str) {
        match parse::normalize_id(raw) {
            Some(id) => self.run_query(QueryKind::Identifier, id).await,
            None => debug!(raw, "Ignoring identifier search without digits"),
        }
    }

    async fn run_query(&self, kind: QueryKind, term: String) {
        info!(?kind, term = %term, "Searching catalog");
        self.inner.loading.set(true);
        self.commit(|state| {
            state.search_term = term.clone();
            state.page = 1;
        });

        let catalog = self.inner.catalog.clone();
        let outcome = match kind {
            QueryKind::Name => catalog.search_by_name(&term).await,
            QueryKind::Ingredient => catalog.filter_by_ingredient(&term).await,
            QueryKind::Identifier => catalog.lookup_by_id(&term).await,
        };

        let results = outcome.unwrap_or_else(|e: CatalogError| {
            warn!(?kind, term = %term, "Search failed: {}", StoreError::from(e));
            Vec::new()
        });

        self.inner.loading.set(false);
        self.commit(|state| state.results = results);
    }

    /// Show one more page, only while more results are hidden
    pub fn load_more(&self) {
        if self.has_more() {
            self.commit(|state| state.page += 1);
        }
    }

    /// Add `id` to favorites, or remove it if already there
    pub fn toggle_favorite(&self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.commit(|state| {
            if let Some(pos) = state.favorites.iter().position(|f| f == id) {
                state.favorites.remove(pos);
            } else {
                state.favorites.push(id.to_string());
            }
        });
    }

    pub fn is_favorited(&self, id: &str) -> bool {
        !id.is_empty() && self.inner.state.borrow().favorites.iter().any(|f| f == id)
    }

    /// Flip the favorites-only filter and start over at page 1
    pub fn toggle_favorites_only(&self) {
        self.commit(|state| {
            state.show_favorites_only = !state.show_favorites_only;
            state.page = 1;
        });
    }

    /// Results after the favorites filter, before paging
    pub fn visible_source(&self) -> Vec<CocktailSummary> {
        let state = self.inner.state.borrow();
        paging::visible_source(&state.results, &state.favorites, state.show_favorites_only)
    }

    pub fn displayed_results(&self) -> Vec<CocktailSummary> {
        let page = self.inner.state.borrow().page;
        paging::page_window(&self.visible_source(), page, self.page_size())
    }

    pub fn has_more(&self) -> bool {
        let page = self.inner.state.borrow().page;
        paging::has_more(page, self.page_size(), self.visible_source().len())
    }

    pub fn search_term(&self) -> String {
        self.inner.state.borrow().search_term.clone()
    }

    pub fn results(&self) -> Vec<CocktailSummary> {
        self.inner.state.borrow().results.clone()
    }

    pub fn page(&self) -> u32 {
        self.inner.state.borrow().page
    }

    pub fn favorites(&self) -> Vec<String> {
        self.inner.state.borrow().favorites.clone()
    }

    pub fn show_favorites_only(&self) -> bool {
        self.inner.state.borrow().show_favorites_only
    }

    pub fn loading(&self) -> bool {
        self.inner.loading.get()
    }

    pub fn page_size(&self) -> usize {
        self.inner.config.page_size.max(1)
    }

    pub fn snapshot(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Run `listener` after every state change until the subscription drops
    pub fn observe(&self, listener: impl Fn() + 'static) -> Subscription {
        Observers::observe(&self.inner.observers, listener)
    }

    /// Apply another context's write to the state key.
    /// Unparsable payloads and `null` are dropped and local state is kept.
    pub fn reconcile(&self, change: &StorageChange) {
        if change.key != self.inner.config.storage_key {
            return;
        }
        let Some(raw) = change.new_value.as_deref().filter(|v| !v.is_empty()) else {
            return;
        };

        match snapshot::decode(raw, &self.inner.config.default_search_term, Coercion::Reconcile) {
            Ok(incoming) => {
                debug!(term = %incoming.search_term, "Reconciling state from another context");
                *self.inner.state.borrow_mut() = incoming;
                self.inner.observers.notify();
            }
            Err(e) => warn!("Discarding state from another context: {e}"),
        }
    }

    /// Mutate, persist once, then notify observers
    fn commit(&self, mutate: impl FnOnce(&mut SearchState)) {
        mutate(&mut self.inner.state.borrow_mut());
        if let Err(e) = self.persist() {
            error!("Error persisting state: {e}");
        }
        self.inner.observers.notify();
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&*self.inner.state.borrow())?;
        self.inner
            .storage
            .set_item(&self.inner.config.storage_key, &json)?;
        Ok(())
    }
}

/// Startup restoration: defaults for anything missing or malformed
fn restore(config: &StoreConfig, storage: &dyn DurableStorage) -> SearchState {
    let fallback = SearchState::with_term(config.default_search_term.clone());
    let raw = match storage.get_item(&config.storage_key) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return fallback,
        Err(e) => {
            error!("Error restoring state: {e}");
            return fallback;
        }
    };

    snapshot::decode(&raw, &config.default_search_term, Coercion::Restore).unwrap_or_else(|e| {
        error!("Error restoring state: {e}");
        fallback
    })
}
