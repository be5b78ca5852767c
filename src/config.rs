use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1";
pub const DEFAULT_SEARCH_TERM: &str = "margarita";
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Application configuration, usually handed over from JavaScript as JSON.
/// Every field is optional; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub inputs: InputsConfig,
    pub scroll_key: String,
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub storage_key: String,
    pub default_search_term: String,
    pub page_size: usize,
}

/// Draft persistence settings for one input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    pub storage_key: String,
    pub max_len: usize,
}

/// Per-field draft settings; each field may override either setting alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InputsOverrides")]
pub struct InputsConfig {
    pub name: InputConfig,
    pub ingredient: InputConfig,
    pub identifier: InputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InputOverrides {
    storage_key: Option<String>,
    max_len: Option<usize>,
}

impl InputOverrides {
    fn apply(self, base: InputConfig) -> InputConfig {
        InputConfig {
            storage_key: self.storage_key.unwrap_or(base.storage_key),
            max_len: self.max_len.unwrap_or(base.max_len),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InputsOverrides {
    name: InputOverrides,
    ingredient: InputOverrides,
    identifier: InputOverrides,
}

impl From<InputsOverrides> for InputsConfig {
    fn from(overrides: InputsOverrides) -> Self {
        let defaults = InputsConfig::default();
        InputsConfig {
            name: overrides.name.apply(defaults.name),
            ingredient: overrides.ingredient.apply(defaults.ingredient),
            identifier: overrides.identifier.apply(defaults.identifier),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            catalog: CatalogConfig::default(),
            store: StoreConfig::default(),
            inputs: InputsConfig::default(),
            scroll_key: "cocktails_scroll_top_v1".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            storage_key: "cocktails_state_v1".to_string(),
            default_search_term: DEFAULT_SEARCH_TERM.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for InputsConfig {
    fn default() -> Self {
        InputsConfig {
            name: InputConfig {
                storage_key: "cocktails_search_input_v1".to_string(),
                max_len: 50,
            },
            ingredient: InputConfig {
                storage_key: "cocktails_ingredient_search_input_v1".to_string(),
                max_len: 50,
            },
            identifier: InputConfig {
                storage_key: "cocktails_id_search_input_v1".to_string(),
                max_len: 20,
            },
        }
    }
}

impl AppConfig {
    /// Parse a JSON config document; blank input yields the defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            info!("No config given, using defaults");
            return Ok(AppConfig::default());
        }

        let mut config: AppConfig = serde_json::from_str(json)?;
        config.store.page_size = config.store.page_size.max(1);
        if config.store.default_search_term.trim().is_empty() {
            info!("Empty default search term, using {DEFAULT_SEARCH_TERM}");
            config.store.default_search_term = DEFAULT_SEARCH_TERM.to_string();
        }

        Ok(config)
    }
}
