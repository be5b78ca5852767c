//! Cocktail search with favorites, kept in sync across browser tabs.
//!
//! The core is [`store::CocktailsStore`]: search results, paging cursor,
//! favorites and the favorites-only filter, persisted under one storage key
//! and reconciled whenever another context writes that key. The catalog and
//! the storage are traits, so the same store runs against `fetch` and
//! `localStorage` in the browser and against in-memory fakes in tests.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod paging;
pub mod parse;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod types;
pub mod widgets;

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod exports;

pub use catalog::{CatalogClient, HttpCatalog, Transport};
pub use config::AppConfig;
pub use page::{CocktailsPage, DetailView, ScrollMemory};
pub use storage::{DurableStorage, MemoryOrigin, Observers, StorageChange, Subscription};
pub use store::CocktailsStore;
pub use types::{CocktailDetail, CocktailSummary, IngredientLine, Language, SearchState};
pub use widgets::{DraftInput, FieldKind, IngredientPicker};
