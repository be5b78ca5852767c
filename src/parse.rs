use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::error::CatalogError;
use crate::types::{
    CocktailDetail, CocktailSummary, DrinksEnvelope, IngredientLine, Language, RawDetail,
    RawDrink, RawIngredient, MAX_INGREDIENTS,
};

/// Trim a free-text search term; `None` when nothing is left
pub fn normalize_term(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Keep only ASCII digits (e.g. "  a1b2c  " -> "12"); `None` when nothing is left
pub fn normalize_id(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Cut to at most `max_len` characters, then trim
pub fn truncate_trim(raw: &str, max_len: usize) -> String {
    let cut: String = raw.chars().take(max_len).collect();
    cut.trim().to_string()
}

/// Pull the `drinks` array out of a catalog response.
/// Null, missing or non-array `drinks` all mean "no results".
fn drinks(body: &str) -> Result<Vec<Value>, CatalogError> {
    let envelope: DrinksEnvelope = serde_json::from_str(body)?;
    match envelope.drinks {
        Some(Value::Array(items)) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Map a catalog response to summaries, keeping thumbnails only when asked
pub fn summaries(body: &str, keep_thumbnail: bool) -> Result<Vec<CocktailSummary>, CatalogError> {
    drinks(body)?
        .into_iter()
        .map(|item| -> Result<CocktailSummary, CatalogError> {
            let raw: RawDrink = serde_json::from_value(item)?;
            Ok(CocktailSummary {
                id: raw.id,
                name: raw.name,
                thumbnail_url: if keep_thumbnail { raw.thumbnail } else { None },
            })
        })
        .collect()
}

/// Distinct ingredient names from the listing endpoint, in catalog order
pub fn ingredient_names(body: &str) -> Result<Vec<String>, CatalogError> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for item in drinks(body)? {
        let raw: RawIngredient = serde_json::from_value(item)?;
        if let Some(name) = raw.name.filter(|n| !n.trim().is_empty()) {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// First full detail record of a lookup response, if any
pub fn first_detail(body: &str) -> Result<Option<CocktailDetail>, CatalogError> {
    let Some(first) = drinks(body)?.into_iter().next() else {
        return Ok(None);
    };
    let raw: RawDetail = serde_json::from_value(first)?;
    detail_from_raw(&raw).map(Some)
}

fn text(raw: &RawDetail, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

fn non_blank(raw: &RawDetail, field: &str) -> Option<String> {
    text(raw, field).filter(|s| !s.trim().is_empty())
}

pub fn detail_from_raw(raw: &RawDetail) -> Result<CocktailDetail, CatalogError> {
    let summary: RawDrink = serde_json::from_value(Value::Object(raw.clone()))?;

    let instructions_by_language: BTreeMap<Language, String> = Language::ALL
        .into_iter()
        .filter_map(|lang| Some((lang, non_blank(raw, lang.instructions_field())?)))
        .collect();

    let ingredient_lines = (1..=MAX_INGREDIENTS)
        .filter_map(|i| {
            let ingredient = non_blank(raw, &format!("strIngredient{i}"))?;
            Some(IngredientLine {
                ingredient,
                measure: text(raw, &format!("strMeasure{i}")),
            })
        })
        .collect();

    Ok(CocktailDetail {
        id: summary.id,
        name: summary.name,
        category: non_blank(raw, "strCategory"),
        thumbnail_url: summary.thumbnail.filter(|t| !t.trim().is_empty()),
        instructions_by_language,
        ingredient_lines,
    })
}
