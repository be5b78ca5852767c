//! JavaScript-facing application handle.
//!
//! Mutating calls return immediately and finish in the background; register
//! a callback with `onChange` to re-render when state moves.

use std::rc::Rc;

use js_sys::{Function, Promise};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::browser::{local_storage, FetchTransport};
use crate::catalog::{CatalogClient, HttpCatalog};
use crate::config::AppConfig;
use crate::logging;
use crate::page::CocktailsPage;
use crate::storage::Subscription;
use crate::types::Language;

#[wasm_bindgen]
pub struct CocktailsApp {
    page: CocktailsPage,
    watchers: Vec<Subscription>,
}

/// Build the app from a JSON config (empty string for defaults).
/// The initial search and ingredient list load in the background.
#[wasm_bindgen(js_name = openApp)]
pub async fn open_app(config_json: String) -> Result<CocktailsApp, JsError> {
    let config = AppConfig::from_json(&config_json)
        .map_err(|e| JsError::new(&format!("Failed to parse config: {}", e)))?;
    logging::init(&config.log_filter);

    let storage =
        local_storage().map_err(|e| JsError::new(&format!("Storage unavailable: {}", e)))?;
    let catalog: Rc<dyn CatalogClient> = Rc::new(HttpCatalog::new(FetchTransport::new(
        config.catalog.base_url.clone(),
    )));

    info!("Mounting cocktails page");
    let page = CocktailsPage::new(&config, catalog, storage);
    let loader = page.clone();
    spawn_local(async move { loader.load().await });

    Ok(CocktailsApp {
        page,
        watchers: Vec::new(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[wasm_bindgen]
impl CocktailsApp {
    /// Call `callback` after every state change and whenever another tab
    /// edits a draft or scrolls
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: Function) {
        let subscriptions = self.page.observe(move || {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                warn!("Change callback threw: {:?}", e);
            }
        });
        self.watchers.extend(subscriptions);
    }

    pub fn search(&self, term: String) {
        let store = self.page.store().clone();
        spawn_local(async move { store.search(&term).await });
    }

    #[wasm_bindgen(js_name = searchByIngredient)]
    pub fn search_by_ingredient(&self, term: String) {
        let store = self.page.store().clone();
        spawn_local(async move { store.search_by_ingredient(&term).await });
    }

    #[wasm_bindgen(js_name = searchById)]
    pub fn search_by_id(&self, raw: String) {
        let store = self.page.store().clone();
        spawn_local(async move { store.search_by_id(&raw).await });
    }

    #[wasm_bindgen(js_name = submitName)]
    pub fn submit_name(&self) {
        let page = self.page.clone();
        spawn_local(async move { page.submit_name().await });
    }

    #[wasm_bindgen(js_name = submitIngredient)]
    pub fn submit_ingredient(&self) {
        let page = self.page.clone();
        spawn_local(async move { page.submit_ingredient().await });
    }

    #[wasm_bindgen(js_name = selectIngredient)]
    pub fn select_ingredient(&self, option: String) {
        let page = self.page.clone();
        spawn_local(async move { page.select_ingredient(&option).await });
    }

    #[wasm_bindgen(js_name = submitId)]
    pub fn submit_id(&self) {
        let page = self.page.clone();
        spawn_local(async move { page.submit_id().await });
    }

    /// Keystroke in one of the inputs: "name", "ingredient" or "id"
    #[wasm_bindgen(js_name = setDraft)]
    pub fn set_draft(&self, field: &str, text: &str) {
        match field {
            "name" => self.page.name_input().input(text),
            "ingredient" => self.page.ingredient_input().input().input(text),
            "id" => self.page.id_input().input(text),
            other => warn!("Unknown input field {other}"),
        }
    }

    #[wasm_bindgen(js_name = clearDraft)]
    pub fn clear_draft(&self, field: &str) {
        match field {
            "name" => self.page.name_input().clear(),
            "ingredient" => self.page.ingredient_input().input().clear(),
            "id" => self.page.id_input().clear(),
            other => warn!("Unknown input field {other}"),
        }
    }

    /// Current draft texts as JSON `{name, ingredient, id}`
    pub fn drafts(&self) -> String {
        to_json(&serde_json::json!({
            "name": self.page.name_input().value(),
            "ingredient": self.page.ingredient_input().input().value(),
            "id": self.page.id_input().value(),
        }))
    }

    /// Ingredient suggestions for the current draft as a JSON array
    pub fn suggestions(&self) -> String {
        to_json(&self.page.ingredient_input().suggestions())
    }

    #[wasm_bindgen(js_name = loadMore)]
    pub fn load_more(&self) {
        self.page.store().load_more();
    }

    #[wasm_bindgen(js_name = onSentinelVisible)]
    pub fn on_sentinel_visible(&self) {
        self.page.on_sentinel_visible();
    }

    #[wasm_bindgen(js_name = toggleFavorite)]
    pub fn toggle_favorite(&self, id: &str) {
        self.page.store().toggle_favorite(id);
    }

    #[wasm_bindgen(js_name = isFavorited)]
    pub fn is_favorited(&self, id: &str) -> bool {
        self.page.store().is_favorited(id)
    }

    #[wasm_bindgen(js_name = toggleFavoritesOnly)]
    pub fn toggle_favorites_only(&self) {
        self.page.store().toggle_favorites_only();
    }

    #[wasm_bindgen(js_name = showFavoritesOnly)]
    pub fn show_favorites_only(&self) -> bool {
        self.page.store().show_favorites_only()
    }

    /// Rows to render as a JSON array of summaries
    #[wasm_bindgen(js_name = displayedResults)]
    pub fn displayed_results(&self) -> String {
        to_json(&self.page.rows())
    }

    #[wasm_bindgen(js_name = hasMore)]
    pub fn has_more(&self) -> bool {
        self.page.store().has_more()
    }

    pub fn loading(&self) -> bool {
        self.page.store().loading()
    }

    #[wasm_bindgen(js_name = searchTerm)]
    pub fn search_term(&self) -> String {
        self.page.store().search_term()
    }

    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&self, offset: f64) {
        self.page.scroll().on_scroll(offset);
    }

    #[wasm_bindgen(js_name = scrollOffset)]
    pub fn scroll_offset(&self) -> f64 {
        self.page.scroll().offset()
    }

    /// Resolves to `{detail, ingredients, instructions}` JSON for `id` in `lang`
    pub fn inspect(&self, id: String, lang: String) -> Promise {
        let page = self.page.clone();
        future_to_promise(async move {
            let mut view = page.inspect(&id).await;
            view.select_language(Language::from_code(&lang).unwrap_or_default());
            let json = to_json(&serde_json::json!({
                "detail": view.detail,
                "ingredients": view.ingredients(),
                "instructions": view.instructions(),
            }));
            Ok(JsValue::from_str(&json))
        })
    }
}
