//! Focal derived views: the pure filter/sort stage.
//!
//! `derive_view` is total over any well-formed input and never errors: free
//! text narrows by case-insensitive substring across the entity's designated
//! haystacks (OR within, no tokenization, no fuzziness), categorical filters
//! compose conjunctively with an `all` sentinel, and the final order is a
//! stable sort on a typed per-field key. The output is always a fresh
//! sequence; the input collection is only read.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::time::Instant;

use focal_core::{Entity, Filters, Sort, SortDirection, SortKey, ALL};

/// Stage counts surfaced by the frontends' `--explain` mode.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct DeriveDebug {
    pub total: usize,
    pub after_query: usize,
    pub after_categories: usize,
}

pub fn derive_view<T: Entity>(items: &[T], filters: &Filters, sort: &Sort<T::SortField>) -> Vec<T> {
    derive_view_with_debug(items, filters, sort).0
}

pub fn derive_view_with_debug<T: Entity>(
    items: &[T],
    filters: &Filters,
    sort: &Sort<T::SortField>,
) -> (Vec<T>, DeriveDebug) {
    let t0 = Instant::now();
    let total = items.len();

    let needle = filters.query.to_lowercase();
    let mut kept: Vec<&T> = items.iter().filter(|t| matches_query(*t, &needle)).collect();
    let after_query = kept.len();

    for (dim, value) in filters.categories.iter() {
        if value == ALL {
            continue;
        }
        kept.retain(|t| t.category(dim).as_deref() == Some(value.as_str()));
    }
    let after_categories = kept.len();

    // Decorate once with the comparison key, then a stable sort. Entities with
    // equal keys keep their relative input order; missing keys go last in both
    // directions.
    let mut decorated: Vec<(Option<SortKey>, &T)> =
        kept.into_iter().map(|t| (t.sort_key(sort.field), t)).collect();
    decorated.sort_by(|(a, _), (b, _)| compare_keys(a, b, sort.direction));

    let out: Vec<T> = decorated.into_iter().map(|(_, t)| t.clone()).collect();
    metrics::histogram!(
        "view_derive_ms",
        t0.elapsed().as_secs_f64() * 1_000.0,
        "kind" => T::KIND.as_str()
    );
    (out, DeriveDebug { total, after_query, after_categories })
}

fn matches_query<T: Entity>(t: &T, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    t.haystacks().iter().any(|h| h.to_lowercase().contains(needle))
}

fn compare_keys(a: &Option<SortKey>, b: &Option<SortKey>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.cmp(b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse a list query in the console's token syntax: `dim:value` pairs for
/// dimensions the kind knows about (values normalized to canonical casing,
/// `all` kept as the sentinel), everything else joined back into free text.
pub fn parse_query<T: Entity>(raw: &str) -> Filters {
    let mut categories: Vec<(String, String)> = Vec::new();
    let mut free: Vec<&str> = Vec::new();
    for tok in raw.split_whitespace() {
        if let Some((dim, value)) = tok.split_once(':') {
            if !dim.is_empty() && !value.is_empty() {
                match T::canonical_category(dim, value) {
                    Some(_) if value.eq_ignore_ascii_case(ALL) => {
                        categories.push((dim.to_string(), ALL.to_string()));
                        continue;
                    }
                    Some(canon) => {
                        categories.push((dim.to_string(), canon));
                        continue;
                    }
                    None => {}
                }
            }
        }
        free.push(tok);
    }
    Filters { query: free.join(" "), categories }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focal_core::User;

    #[test]
    fn parse_query_splits_tokens_and_free_text() {
        let f = parse_query::<User>("status:active role:photographer anna");
        assert_eq!(f.query, "anna");
        assert_eq!(
            f.categories,
            vec![
                ("status".to_string(), "Active".to_string()),
                ("role".to_string(), "Photographer".to_string()),
            ]
        );
    }

    #[test]
    fn parse_query_keeps_all_sentinel() {
        let f = parse_query::<User>("status:ALL");
        assert_eq!(f.categories, vec![("status".to_string(), ALL.to_string())]);
        assert!(f.is_identity());
    }

    #[test]
    fn parse_query_unknown_dimension_falls_back_to_free_text() {
        let f = parse_query::<User>("city:berlin bob");
        assert!(f.categories.is_empty());
        assert_eq!(f.query, "city:berlin bob");
    }

    #[test]
    fn parse_query_unparseable_value_stays_exact() {
        // A bogus status for a known dimension must filter everything out
        // rather than turn into free text.
        let f = parse_query::<User>("status:banana");
        assert_eq!(f.categories, vec![("status".to_string(), "banana".to_string())]);
    }
}
