use std::collections::HashSet;

use crate::types::CocktailSummary;

/// Results the window is cut from: everything, or only favorites.
/// Relative order of `results` is kept either way.
pub fn visible_source(
    results: &[CocktailSummary],
    favorites: &[String],
    favorites_only: bool,
) -> Vec<CocktailSummary> {
    if !favorites_only {
        return results.to_vec();
    }
    let favorites: HashSet<&str> = favorites.iter().map(String::as_str).collect();
    results
        .iter()
        .filter(|c| favorites.contains(c.id.as_str()))
        .cloned()
        .collect()
}

/// Length of the visible prefix for `page` pages of `page_size` items
pub fn window_len(page: u32, page_size: usize, source_len: usize) -> usize {
    (page.max(1) as usize)
        .saturating_mul(page_size)
        .min(source_len)
}

/// First `page * page_size` items of `source`
pub fn page_window<T: Clone>(source: &[T], page: u32, page_size: usize) -> Vec<T> {
    source[..window_len(page, page_size, source.len())].to_vec()
}

/// Whether the window is strictly shorter than its source
pub fn has_more(page: u32, page_size: usize, source_len: usize) -> bool {
    window_len(page, page_size, source_len) < source_len
}
