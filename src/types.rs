use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimal cocktail record used in list views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CocktailSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl CocktailSummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CocktailSummary {
            id: id.into(),
            name: name.into(),
            thumbnail_url: None,
        }
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// Instruction languages offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    En,
    Es,
    De,
    Fr,
    It,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Es,
        Language::De,
        Language::Fr,
        Language::It,
    ];

    /// Catalog field holding the instructions for this language
    pub fn instructions_field(self) -> &'static str {
        match self {
            Language::En => "strInstructions",
            Language::Es => "strInstructionsES",
            Language::De => "strInstructionsDE",
            Language::Fr => "strInstructionsFR",
            Language::It => "strInstructionsIT",
        }
    }

    /// Parse a language code such as "EN" or "fr"
    pub fn from_code(code: &str) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Es => "ES",
            Language::De => "DE",
            Language::Fr => "FR",
            Language::It => "IT",
        }
    }
}

/// One (ingredient, measure) pair of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub ingredient: String,
    pub measure: Option<String>,
}

/// Full cocktail record derived from a lookup response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CocktailDetail {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub thumbnail_url: Option<String>,
    pub instructions_by_language: BTreeMap<Language, String>,
    pub ingredient_lines: Vec<IngredientLine>,
}

impl CocktailDetail {
    /// Instructions in `language`, falling back to English
    pub fn instructions(&self, language: Language) -> Option<&str> {
        self.instructions_by_language
            .get(&language)
            .or_else(|| self.instructions_by_language.get(&Language::En))
            .map(String::as_str)
    }
}

/// Composite state persisted under the store's durable key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub search_term: String,
    pub results: Vec<CocktailSummary>,
    pub page: u32,
    pub favorites: Vec<String>,
    pub show_favorites_only: bool,
}

impl SearchState {
    /// Fresh state for a context with nothing persisted
    pub fn with_term(search_term: impl Into<String>) -> Self {
        SearchState {
            search_term: search_term.into(),
            results: Vec::new(),
            page: 1,
            favorites: Vec::new(),
            show_favorites_only: false,
        }
    }
}

/// Catalog response envelope: `drinks` is an array, null, or missing
#[derive(Debug, Clone, Deserialize)]
pub struct DrinksEnvelope {
    #[serde(default)]
    pub drinks: Option<serde_json::Value>,
}

/// Summary fields shared by the name, ingredient and identifier endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RawDrink {
    #[serde(rename = "idDrink")]
    pub id: String,
    #[serde(rename = "strDrink")]
    pub name: String,
    #[serde(rename = "strDrinkThumb", default)]
    pub thumbnail: Option<String>,
}

/// Ingredient listing record
#[derive(Debug, Clone, Deserialize)]
pub struct RawIngredient {
    #[serde(rename = "strIngredient1", default)]
    pub name: Option<String>,
}

/// Raw detail record: indexed ingredient/measure fields are read by name
pub type RawDetail = serde_json::Map<String, serde_json::Value>;

/// Maximum number of indexed ingredient/measure pairs in a detail record
pub const MAX_INGREDIENTS: usize = 15;
