//! Presentation controller for the cocktails page.
//!
//! Rendering is left to the host; this wires the inputs to the store,
//! guards infinite scrolling, remembers the scroll offset and opens detail
//! views.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use crate::storage::{DurableStorage, Observers, StorageChange, Subscription};
use crate::store::CocktailsStore;
use crate::types::{CocktailDetail, CocktailSummary, IngredientLine, Language};
use crate::widgets::{DraftInput, FieldKind, IngredientPicker};

struct ScrollInner {
    key: String,
    storage: Rc<dyn DurableStorage>,
    offset: Cell<f64>,
    observers: Rc<Observers>,
    _sync: Cell<Option<Subscription>>,
}

/// Last known scroll offset of the results viewport, shared across contexts
#[derive(Clone)]
pub struct ScrollMemory {
    inner: Rc<ScrollInner>,
}

fn parse_offset(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

impl ScrollMemory {
    pub fn mount(key: impl Into<String>, storage: Rc<dyn DurableStorage>) -> Self {
        let key = key.into();
        let saved = storage.get_item(&key).ok().flatten();
        let memory = ScrollMemory {
            inner: Rc::new(ScrollInner {
                offset: Cell::new(parse_offset(saved.as_deref())),
                key,
                storage,
                observers: Rc::new(Observers::default()),
                _sync: Cell::new(None),
            }),
        };

        let weak: Weak<ScrollInner> = Rc::downgrade(&memory.inner);
        let subscription = memory
            .inner
            .storage
            .subscribe(Box::new(move |change: &StorageChange| {
                if let Some(inner) = weak.upgrade() {
                    if change.key != inner.key {
                        return;
                    }
                    let offset = parse_offset(change.new_value.as_deref());
                    if offset != inner.offset.get() {
                        inner.offset.set(offset);
                        inner.observers.notify();
                    }
                }
            }));
        memory.inner._sync.set(Some(subscription));

        memory
    }

    pub fn offset(&self) -> f64 {
        self.inner.offset.get()
    }

    /// Run `listener` whenever another context scrolls
    pub fn observe(&self, listener: impl Fn() + 'static) -> Subscription {
        Observers::observe(&self.inner.observers, listener)
    }

    /// Record a scroll event
    pub fn on_scroll(&self, offset: f64) {
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        self.inner.offset.set(offset);
        if let Err(e) = self
            .inner
            .storage
            .set_item(&self.inner.key, &offset.to_string())
        {
            debug!("Failed to persist scroll offset: {e}");
        }
    }
}

/// Detail dialog contents for one cocktail
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub detail: Option<CocktailDetail>,
    pub language: Language,
}

impl DetailView {
    /// Fetch the detail for `id`; blank ids, misses and failures yield no detail
    pub async fn open(catalog: &dyn CatalogClient, id: &str) -> Self {
        let id = id.trim();
        let detail = if id.is_empty() {
            None
        } else {
            catalog.fetch_detail(id).await.unwrap_or_else(|e| {
                warn!(id, "Failed to fetch detail: {e}");
                None
            })
        };
        DetailView {
            detail,
            language: Language::default(),
        }
    }

    pub fn select_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn instructions(&self) -> Option<&str> {
        self.detail.as_ref()?.instructions(self.language)
    }

    pub fn ingredients(&self) -> &[IngredientLine] {
        self.detail
            .as_ref()
            .map(|d| d.ingredient_lines.as_slice())
            .unwrap_or(&[])
    }
}

/// Everything one browser context shows: store, inputs and scroll position
#[derive(Clone)]
pub struct CocktailsPage {
    store: CocktailsStore,
    catalog: Rc<dyn CatalogClient>,
    name: DraftInput,
    ingredient: IngredientPicker,
    identifier: DraftInput,
    scroll: ScrollMemory,
}

impl CocktailsPage {
    /// Build the page for one context and load its initial content
    pub async fn mount(
        config: &AppConfig,
        catalog: Rc<dyn CatalogClient>,
        storage: Rc<dyn DurableStorage>,
    ) -> Self {
        let page = Self::new(config, catalog, storage);
        page.load().await;
        page
    }

    /// Restore stored state and drafts without touching the catalog
    pub fn new(
        config: &AppConfig,
        catalog: Rc<dyn CatalogClient>,
        storage: Rc<dyn DurableStorage>,
    ) -> Self {
        let store =
            CocktailsStore::new(config.store.clone(), catalog.clone(), storage.clone());
        CocktailsPage {
            name: DraftInput::mount(FieldKind::Name, config.inputs.name.clone(), storage.clone()),
            ingredient: IngredientPicker::mount(config.inputs.ingredient.clone(), storage.clone()),
            identifier: DraftInput::mount(
                FieldKind::Identifier,
                config.inputs.identifier.clone(),
                storage.clone(),
            ),
            scroll: ScrollMemory::mount(config.scroll_key.clone(), storage),
            store,
            catalog,
        }
    }

    /// Initial search (unless results were restored) and ingredient list
    pub async fn load(&self) {
        self.store.bootstrap().await;
        self.ingredient.load_ingredients(self.catalog.as_ref()).await;
    }

    /// Run `listener` after any store change and whenever another context
    /// edits a draft or scrolls
    pub fn observe(&self, listener: impl Fn() + 'static) -> Vec<Subscription> {
        let listener: Rc<dyn Fn()> = Rc::new(listener);
        let forward = || {
            let listener = listener.clone();
            move || listener()
        };
        vec![
            self.store.observe(forward()),
            self.name.observe(forward()),
            self.ingredient.input().observe(forward()),
            self.identifier.observe(forward()),
            self.scroll.observe(forward()),
        ]
    }

    pub fn store(&self) -> &CocktailsStore {
        &self.store
    }

    pub fn name_input(&self) -> &DraftInput {
        &self.name
    }

    pub fn ingredient_input(&self) -> &IngredientPicker {
        &self.ingredient
    }

    pub fn id_input(&self) -> &DraftInput {
        &self.identifier
    }

    pub fn scroll(&self) -> &ScrollMemory {
        &self.scroll
    }

    pub async fn submit_name(&self) {
        if let Some(term) = self.name.submit() {
            self.store.search(&term).await;
        }
    }

    pub async fn submit_ingredient(&self) {
        if let Some(term) = self.ingredient.input().submit() {
            self.store.search_by_ingredient(&term).await;
        }
    }

    pub async fn select_ingredient(&self, option: &str) {
        if let Some(term) = self.ingredient.select(option) {
            self.store.search_by_ingredient(&term).await;
        }
    }

    pub async fn submit_id(&self) {
        if let Some(id) = self.identifier.submit() {
            self.store.search_by_id(&id).await;
        }
    }

    /// The end-of-list sentinel scrolled into view
    pub fn on_sentinel_visible(&self) {
        if !self.store.loading() && self.store.has_more() {
            self.store.load_more();
        }
    }

    pub fn rows(&self) -> Vec<CocktailSummary> {
        self.store.displayed_results()
    }

    pub async fn inspect(&self, id: &str) -> DetailView {
        DetailView::open(self.catalog.as_ref(), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::storage::MemoryOrigin;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct StubCatalog {
        calls: RefCell<Vec<String>>,
        detail: Option<CocktailDetail>,
        fail_detail: bool,
    }

    #[async_trait(?Send)]
    impl CatalogClient for StubCatalog {
        async fn search_by_name(&self, name: &str) -> Result<Vec<CocktailSummary>, CatalogError> {
            self.calls.borrow_mut().push(format!("name:{name}"));
            Ok((1..=25)
                .map(|i| CocktailSummary::new(i.to_string(), name))
                .collect())
        }

        async fn filter_by_ingredient(
            &self,
            ingredient: &str,
        ) -> Result<Vec<CocktailSummary>, CatalogError> {
            self.calls.borrow_mut().push(format!("ingredient:{ingredient}"));
            Ok(vec![CocktailSummary::new("9", ingredient)])
        }

        async fn lookup_by_id(&self, id: &str) -> Result<Vec<CocktailSummary>, CatalogError> {
            self.calls.borrow_mut().push(format!("id:{id}"));
            Ok(vec![CocktailSummary::new(id, "Found")])
        }

        async fn fetch_detail(&self, id: &str) -> Result<Option<CocktailDetail>, CatalogError> {
            self.calls.borrow_mut().push(format!("detail:{id}"));
            if self.fail_detail {
                return Err(CatalogError::Status(500));
            }
            Ok(self.detail.clone())
        }

        async fn list_ingredients(&self) -> Result<Vec<String>, CatalogError> {
            Ok(vec!["Gin".to_string(), "Ginger ale".to_string()])
        }
    }

    fn mount(origin: &MemoryOrigin, catalog: Rc<StubCatalog>) -> CocktailsPage {
        block_on(CocktailsPage::mount(
            &AppConfig::default(),
            catalog,
            Rc::new(origin.context()),
        ))
    }

    fn sample_detail() -> CocktailDetail {
        let mut instructions = BTreeMap::new();
        instructions.insert(Language::En, "Stir.".to_string());
        instructions.insert(Language::It, "Mescolare.".to_string());
        CocktailDetail {
            id: "7".into(),
            name: "Negroni".into(),
            category: None,
            thumbnail_url: None,
            instructions_by_language: instructions,
            ingredient_lines: vec![IngredientLine {
                ingredient: "Gin".into(),
                measure: Some("1 oz".into()),
            }],
        }
    }

    #[test]
    fn test_mount_loads_default_search_and_suggestions() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog::default());
        let page = mount(&origin, catalog.clone());

        assert_eq!(*catalog.calls.borrow(), vec!["name:margarita"]);
        assert_eq!(page.rows().len(), 10);
        page.ingredient_input().input().input("ginger");
        assert_eq!(page.ingredient_input().suggestions(), vec!["Ginger ale"]);
    }

    #[test]
    fn test_inputs_route_to_store_queries() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog::default());
        let page = mount(&origin, catalog.clone());

        page.id_input().input("#110");
        block_on(page.submit_id());
        assert_eq!(page.store().search_term(), "110");

        page.ingredient_input().input().input("   ");
        block_on(page.submit_ingredient());

        block_on(page.select_ingredient("Gin"));
        assert_eq!(page.store().search_term(), "Gin");

        page.name_input().input("  ");
        block_on(page.submit_name());
        assert_eq!(page.store().search_term(), "margarita");

        assert_eq!(
            *catalog.calls.borrow(),
            vec!["name:margarita", "id:110", "ingredient:Gin", "name:margarita"]
        );
    }

    #[test]
    fn test_sentinel_loads_more_until_exhausted() {
        let origin = MemoryOrigin::new();
        let page = mount(&origin, Rc::new(StubCatalog::default()));

        page.on_sentinel_visible();
        assert_eq!(page.rows().len(), 20);
        page.on_sentinel_visible();
        assert_eq!(page.rows().len(), 25);
        page.on_sentinel_visible();
        assert_eq!(page.store().page(), 3);
    }

    #[test]
    fn test_scroll_offset_is_remembered_and_shared() {
        let origin = MemoryOrigin::new();
        let tab_a = ScrollMemory::mount("scroll", Rc::new(origin.context()));
        let tab_b = ScrollMemory::mount("scroll", Rc::new(origin.context()));

        tab_a.on_scroll(240.5);
        assert_eq!(origin.peek("scroll").as_deref(), Some("240.5"));
        assert_eq!(tab_b.offset(), 240.5);

        let reopened = ScrollMemory::mount("scroll", Rc::new(origin.context()));
        assert_eq!(reopened.offset(), 240.5);
    }

    #[test]
    fn test_scroll_observer_hears_other_contexts() {
        let origin = MemoryOrigin::new();
        let local = ScrollMemory::mount("scroll", Rc::new(origin.context()));
        let remote = ScrollMemory::mount("scroll", Rc::new(origin.context()));
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _sub = local.observe(move || counter.set(counter.get() + 1));

        local.on_scroll(10.0);
        assert_eq!(hits.get(), 0);

        remote.on_scroll(80.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(local.offset(), 80.0);
    }

    #[test]
    fn test_page_observer_covers_store_drafts_and_scroll() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog::default());
        let page = CocktailsPage::new(
            &AppConfig::default(),
            catalog.clone(),
            Rc::new(origin.context()),
        );
        let other_tab = mount(&origin, catalog);
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _subs = page.observe(move || counter.set(counter.get() + 1));

        other_tab.name_input().input("sour");
        assert_eq!(hits.get(), 1);
        other_tab.id_input().input("42");
        other_tab.ingredient_input().input().input("lime");
        other_tab.scroll().on_scroll(120.0);
        assert_eq!(hits.get(), 4);

        page.store().toggle_favorite("3");
        assert_eq!(hits.get(), 5);
        assert_eq!(page.name_input().value(), "sour");
    }

    #[test]
    fn test_new_defers_catalog_calls_to_load() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog::default());
        let page = CocktailsPage::new(
            &AppConfig::default(),
            catalog.clone(),
            Rc::new(origin.context()),
        );
        assert!(catalog.calls.borrow().is_empty());
        assert!(page.rows().is_empty());

        block_on(page.load());
        assert_eq!(*catalog.calls.borrow(), vec!["name:margarita"]);
        assert_eq!(page.rows().len(), 10);
    }

    #[test]
    fn test_unparsable_scroll_offset_starts_at_top() {
        let origin = MemoryOrigin::new();
        origin.context().set_item("scroll", "NaN px").unwrap();

        let memory = ScrollMemory::mount("scroll", Rc::new(origin.context()));

        assert_eq!(memory.offset(), 0.0);
    }

    #[test]
    fn test_detail_view_language_fallback() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog {
            detail: Some(sample_detail()),
            ..StubCatalog::default()
        });
        let page = mount(&origin, catalog);

        let mut view = block_on(page.inspect(" 7 "));
        assert_eq!(view.instructions(), Some("Stir."));
        assert_eq!(view.ingredients().len(), 1);

        view.select_language(Language::It);
        assert_eq!(view.instructions(), Some("Mescolare."));
        view.select_language(Language::Fr);
        assert_eq!(view.instructions(), Some("Stir."));
    }

    #[test]
    fn test_detail_view_without_detail() {
        let origin = MemoryOrigin::new();
        let catalog = Rc::new(StubCatalog {
            fail_detail: true,
            ..StubCatalog::default()
        });
        let page = mount(&origin, catalog.clone());

        let failed = block_on(page.inspect("7"));
        assert_eq!(failed.detail, None);
        assert!(failed.ingredients().is_empty());

        let blank = block_on(page.inspect("  "));
        assert_eq!(blank.instructions(), None);
        assert_eq!(
            catalog.calls.borrow().iter().filter(|c| c.starts_with("detail")).count(),
            1
        );
    }
}
