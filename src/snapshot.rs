//! Decoding of persisted state blobs.
//!
//! The same blob is read in two situations with slightly different
//! leniency:
//!
//! - [`Coercion::Restore`] at startup keeps a field only when it has the
//!   expected type (a blank search term counts as missing).
//! - [`Coercion::Reconcile`] when another context wrote the key: every field
//!   is overwritten, the search term is taken from any string and the
//!   favorites flag is coerced by truthiness.
//!
//! In both modes results and favorites that are not arrays become empty,
//! a non-numeric page becomes 1, and duplicate favorites are dropped.
//! `null` is rejected in both modes; other non-object values are rejected
//! on restore but reconcile to an all-default state.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::SnapshotError;
use crate::types::{CocktailSummary, SearchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Restore,
    Reconcile,
}

/// Decode a serialized [`SearchState`], filling gaps with defaults
pub fn decode(
    raw: &str,
    default_term: &str,
    coercion: Coercion,
) -> Result<SearchState, SnapshotError> {
    let fields = match (serde_json::from_str::<Value>(raw)?, coercion) {
        (Value::Object(fields), _) => fields,
        (Value::Null, _) | (_, Coercion::Restore) => return Err(SnapshotError::NotAnObject),
        (_, Coercion::Reconcile) => Map::new(),
    };

    Ok(SearchState {
        search_term: search_term(&fields, default_term, coercion),
        results: results(fields.get("results")),
        page: page(fields.get("page")),
        favorites: favorites(fields.get("favorites")),
        show_favorites_only: show_favorites_only(fields.get("showFavoritesOnly"), coercion),
    })
}

fn search_term(fields: &Map<String, Value>, default_term: &str, coercion: Coercion) -> String {
    match (fields.get("searchTerm"), coercion) {
        (Some(Value::String(term)), Coercion::Reconcile) => term.clone(),
        (Some(Value::String(term)), Coercion::Restore) if !term.is_empty() => term.clone(),
        _ => default_term.to_string(),
    }
}

fn results(value: Option<&Value>) -> Vec<CocktailSummary> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn page(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 1.0)
        .map(|p| p.min(u32::MAX as f64) as u32)
        .unwrap_or(1)
}

fn favorites(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn show_favorites_only(value: Option<&Value>, coercion: Coercion) -> bool {
    match coercion {
        Coercion::Restore => value.and_then(Value::as_bool).unwrap_or(false),
        Coercion::Reconcile => value.is_some_and(truthy),
    }
}

/// JavaScript truthiness of a JSON value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "margarita";

    #[test]
    fn test_valid_payload_is_taken_verbatim() {
        let raw = r#"{"searchTerm":"gin","results":[{"id":"1","name":"X"}],"page":2,"favorites":["1"],"showFavoritesOnly":true}"#;
        let state = decode(raw, DEFAULT, Coercion::Reconcile).unwrap();
        assert_eq!(
            state,
            SearchState {
                search_term: "gin".into(),
                results: vec![CocktailSummary::new("1", "X")],
                page: 2,
                favorites: vec!["1".into()],
                show_favorites_only: true,
            }
        );
    }

    #[test]
    fn test_malformed_fields_fall_back_to_defaults() {
        let raw = r#"{"results":"nope","page":"3","favorites":{"a":1},"showFavoritesOnly":"yes"}"#;
        let state = decode(raw, DEFAULT, Coercion::Reconcile).unwrap();
        assert_eq!(state.search_term, DEFAULT);
        assert!(state.results.is_empty());
        assert_eq!(state.page, 1);
        assert!(state.favorites.is_empty());
        assert!(state.show_favorites_only, "non-empty string is truthy");

        let state = decode(raw, DEFAULT, Coercion::Restore).unwrap();
        assert!(!state.show_favorites_only, "restore only accepts booleans");
    }

    #[test]
    fn test_blank_term_differs_between_modes() {
        let raw = r#"{"searchTerm":""}"#;
        assert_eq!(
            decode(raw, DEFAULT, Coercion::Restore).unwrap().search_term,
            DEFAULT
        );
        assert_eq!(decode(raw, DEFAULT, Coercion::Reconcile).unwrap().search_term, "");
    }

    #[test]
    fn test_page_is_never_below_one() {
        assert_eq!(decode(r#"{"page":0}"#, DEFAULT, Coercion::Restore).unwrap().page, 1);
        assert_eq!(decode(r#"{"page":-4}"#, DEFAULT, Coercion::Restore).unwrap().page, 1);
        assert_eq!(decode(r#"{"page":3.7}"#, DEFAULT, Coercion::Restore).unwrap().page, 3);
    }

    #[test]
    fn test_favorites_are_deduplicated() {
        let raw = r#"{"favorites":["1","2","1",3,""]}"#;
        let state = decode(raw, DEFAULT, Coercion::Reconcile).unwrap();
        assert_eq!(state.favorites, vec!["1", "2"]);
    }

    #[test]
    fn test_bad_result_entries_are_skipped() {
        let raw = r#"{"results":[{"id":"1","name":"A"},{"name":"no id"},{"id":"2","name":"B","thumbnailUrl":"t"}]}"#;
        let state = decode(raw, DEFAULT, Coercion::Restore).unwrap();
        assert_eq!(
            state.results,
            vec![
                CocktailSummary::new("1", "A"),
                CocktailSummary::new("2", "B").with_thumbnail("t"),
            ]
        );
    }

    #[test]
    fn test_unparsable_payload_is_an_error() {
        assert!(matches!(
            decode("{oops", DEFAULT, Coercion::Reconcile),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            decode("null", DEFAULT, Coercion::Reconcile),
            Err(SnapshotError::NotAnObject)
        ));
        assert!(matches!(
            decode("[]", DEFAULT, Coercion::Restore),
            Err(SnapshotError::NotAnObject)
        ));
    }

    #[test]
    fn test_non_object_reconciles_to_defaults() {
        for raw in ["[]", "5", r#""x""#, "true"] {
            assert_eq!(
                decode(raw, DEFAULT, Coercion::Reconcile).unwrap(),
                SearchState::with_term(DEFAULT),
                "payload {raw}"
            );
        }
    }
}
