//! Filtering, sorting and paging over the unindexed legacy mod list.

use domain::protocol::{LegacyMod, LegacyModDetails};
use domain::{ModSortDirection, ModSortType, SearchModsRequest};
use std::cmp::Ordering;
use std::collections::HashMap;

pub(crate) const DEFAULT_SEARCH_TAKE: usize = 25;

type Comparator = fn(&LegacyMod, &LegacyMod) -> Ordering;

fn by_created(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.mod_id.cmp(&b.mod_id)
}

fn by_downloads(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.downloads.cmp(&b.downloads)
}

fn by_comments(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.comments.cmp(&b.comments)
}

fn by_trending(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.trending_points.cmp(&b.trending_points)
}

fn by_name(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.name
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.name.chars().flat_map(char::to_lowercase))
}

fn by_updated(a: &LegacyMod, b: &LegacyMod) -> Ordering {
    a.last_released.cmp(&b.last_released)
}

const SORT_TABLE: [(ModSortType, Comparator); 6] = [
    (ModSortType::Created, by_created),
    (ModSortType::Downloads, by_downloads),
    (ModSortType::Comments, by_comments),
    (ModSortType::Trending, by_trending),
    (ModSortType::Name, by_name),
    (ModSortType::Updated, by_updated),
];

fn comparator(sort: ModSortType) -> Comparator {
    SORT_TABLE
        .iter()
        .find(|(key, _)| *key == sort)
        .map(|(_, cmp)| *cmp)
        .unwrap_or(by_name)
}

/// Stable sort: equal keys keep upstream order in both directions.
pub(crate) fn sort_mods(mods: &mut [&LegacyMod], sort: ModSortType, direction: ModSortDirection) {
    let cmp = comparator(sort);
    match direction {
        ModSortDirection::Ascending => mods.sort_by(|a, b| cmp(a, b)),
        ModSortDirection::Descending => mods.sort_by(|a, b| cmp(b, a)),
    }
}

pub(crate) fn paginate<T>(items: Vec<T>, skip: usize, take: usize) -> Vec<T> {
    items.into_iter().skip(skip).take(take).collect()
}

/// A parsed free-text query. `"quoted"` text (longer than the quotes alone)
/// only matches a whole field or a whole word of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextQuery {
    term: String,
    exact: bool,
}

impl TextQuery {
    pub(crate) fn parse(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        let exact = text.len() > 2 && text.starts_with('"') && text.ends_with('"');
        let term = if exact { &text[1..text.len() - 1] } else { text };
        Some(Self {
            term: term.to_lowercase(),
            exact,
        })
    }

    fn matches_field(&self, field: &str) -> bool {
        if field.trim().is_empty() {
            return false;
        }
        let field = field.to_lowercase();
        if self.exact {
            field == self.term || field.split_whitespace().any(|word| word == self.term)
        } else {
            field.contains(&self.term)
        }
    }

    pub(crate) fn matches(&self, m: &LegacyMod) -> bool {
        self.matches_field(&m.name)
            || m.summary.as_deref().is_some_and(|s| self.matches_field(s))
            || m.url_alias.as_deref().is_some_and(|s| self.matches_field(s))
            || self.matches_field(&m.author)
    }
}

pub(crate) fn author_contains(m: &LegacyMod, author: &str) -> bool {
    m.author.to_lowercase().contains(&author.to_lowercase())
}

fn has_all_tags(m: &LegacyMod, tags: &[String]) -> bool {
    tags.iter().all(|wanted| {
        let wanted = wanted.to_lowercase();
        m.tags.iter().any(|t| t.to_lowercase() == wanted)
    })
}

fn passes_details_filters(
    details: Option<&LegacyModDetails>,
    side: Option<&str>,
    versions: &[&str],
) -> bool {
    let Some(details) = details else {
        return false;
    };
    if let Some(side) = side {
        if details.side.to_lowercase() != side.to_lowercase() {
            return false;
        }
    }
    versions.is_empty()
        || details
            .releases
            .iter()
            .any(|r| versions.iter().any(|v| r.tags.iter().any(|t| t == v)))
}

/// Applies every filter of `request` and the optional sort. Returns the
/// filtered set before pagination.
///
/// Side and game-version filters need the hydrated details map; without it
/// they match nothing.
pub(crate) fn filter_mods<'a>(
    mods: &'a [LegacyMod],
    request: &SearchModsRequest,
    details: Option<&HashMap<i64, LegacyModDetails>>,
) -> Vec<&'a LegacyMod> {
    let text = request.text.as_deref().and_then(TextQuery::parse);
    let author = request
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());
    let side = request.requested_side();
    let versions = request.requested_game_versions();
    let needs_details = side.is_some() || !versions.is_empty();

    let mut filtered: Vec<&LegacyMod> = mods
        .iter()
        .filter(|m| text.as_ref().map_or(true, |q| q.matches(m)))
        .filter(|m| author.map_or(true, |a| author_contains(m, a)))
        .filter(|m| has_all_tags(m, &request.tags))
        .filter(|m| {
            !needs_details
                || passes_details_filters(
                    details.and_then(|d| d.get(&m.mod_id)),
                    side,
                    &versions,
                )
        })
        .collect();

    if let Some(sort) = request.sort {
        sort_mods(&mut filtered, sort, request.direction.unwrap_or_default());
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::testing::{legacy_details as details, legacy_mod};

    fn names(mods: &[&LegacyMod]) -> Vec<String> {
        mods.iter().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn name_sort_then_take_two() {
        let mods = vec![
            legacy_mod(1, "Banana"),
            legacy_mod(2, "apple"),
            legacy_mod(3, "Cherry"),
        ];
        let request = SearchModsRequest {
            sort: Some(ModSortType::Name),
            direction: Some(ModSortDirection::Ascending),
            ..Default::default()
        };

        let filtered = filter_mods(&mods, &request, None);
        assert_eq!(filtered.len(), 3);
        assert_eq!(names(&paginate(filtered, 0, 2)), vec!["apple", "Banana"]);
    }

    #[test]
    fn descending_sort_keeps_ties_in_upstream_order() {
        let mut a = legacy_mod(1, "A");
        a.downloads = 5;
        let mut b = legacy_mod(2, "B");
        b.downloads = 9;
        let mut c = legacy_mod(3, "C");
        c.downloads = 5;
        let mods = vec![a, b, c];

        let mut refs: Vec<&LegacyMod> = mods.iter().collect();
        sort_mods(&mut refs, ModSortType::Downloads, ModSortDirection::Descending);
        assert_eq!(names(&refs), vec!["B", "A", "C"]);
    }

    #[test]
    fn exact_search_needs_whole_word() {
        let mut farm = legacy_mod(1, "Farm Life");
        farm.summary = Some("Better farming".into());
        let farming = legacy_mod(2, "Farming Tweaks");
        let mods = vec![farm, farming];

        let exact = SearchModsRequest {
            text: Some("\"farm\"".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter_mods(&mods, &exact, None)), vec!["Farm Life"]);

        let loose = SearchModsRequest {
            text: Some("FARM".into()),
            ..Default::default()
        };
        assert_eq!(filter_mods(&mods, &loose, None).len(), 2);
    }

    #[test]
    fn short_quoted_text_is_not_exact() {
        assert_eq!(
            TextQuery::parse("\"\""),
            Some(TextQuery {
                term: "\"\"".into(),
                exact: false
            })
        );
        assert_eq!(TextQuery::parse("   "), None);
    }

    #[test]
    fn tag_filter_is_and_and_case_insensitive() {
        let mut both = legacy_mod(1, "Both");
        both.tags = vec!["QoL".into(), "Storage".into()];
        let mut one = legacy_mod(2, "One");
        one.tags = vec!["qol".into()];
        let mods = vec![both, one];

        let request = SearchModsRequest {
            tags: vec!["qol".into(), "STORAGE".into()],
            ..Default::default()
        };
        assert_eq!(names(&filter_mods(&mods, &request, None)), vec!["Both"]);
    }

    #[test]
    fn tag_filter_folds_non_ascii_letters() {
        let mut eco = legacy_mod(1, "Eco");
        eco.tags = vec!["Ökologie".into()];
        let mods = vec![eco, legacy_mod(2, "Plain")];

        let request = SearchModsRequest {
            tags: vec!["ökologie".into()],
            ..Default::default()
        };
        assert_eq!(names(&filter_mods(&mods, &request, None)), vec!["Eco"]);
    }

    #[test]
    fn version_filter_without_details_matches_nothing() {
        let mods = vec![legacy_mod(1, "A"), legacy_mod(2, "B")];
        let request = SearchModsRequest {
            game_versions: vec!["1.19.8".into()],
            ..Default::default()
        };
        assert!(filter_mods(&mods, &request, None).is_empty());
    }

    #[test]
    fn side_filter_without_details_matches_nothing() {
        let mods = vec![legacy_mod(1, "A"), legacy_mod(2, "B")];
        let request = SearchModsRequest {
            side: Some("Client".into()),
            ..Default::default()
        };
        assert!(filter_mods(&mods, &request, None).is_empty());

        let any = SearchModsRequest {
            side: Some("any".into()),
            ..Default::default()
        };
        assert_eq!(filter_mods(&mods, &any, None).len(), 2);
    }

    #[test]
    fn side_and_version_filters_use_details() {
        let mods = vec![legacy_mod(1, "A"), legacy_mod(2, "B"), legacy_mod(3, "C")];
        let map: HashMap<i64, LegacyModDetails> = [
            (1, details(1, "client", &["1.19.8"])),
            (2, details(2, "both", &["1.19.8", "1.20.0"])),
            (3, details(3, "both", &["1.18.0"])),
        ]
        .into_iter()
        .collect();

        let request = SearchModsRequest {
            side: Some("Both".into()),
            game_versions: vec!["1.20.0".into(), "1.19.8".into()],
            ..Default::default()
        };
        assert_eq!(names(&filter_mods(&mods, &request, Some(&map))), vec!["B"]);

        let version_only = SearchModsRequest {
            game_version: Some("1.19.8".into()),
            ..Default::default()
        };
        assert_eq!(
            names(&filter_mods(&mods, &version_only, Some(&map))),
            vec!["A", "B"]
        );
    }

    #[test]
    fn pagination_never_exceeds_take() {
        let items: Vec<i32> = (0..10).collect();
        assert_eq!(paginate(items.clone(), 8, 5), vec![8, 9]);
        assert_eq!(paginate(items.clone(), 20, 5), Vec::<i32>::new());
        assert_eq!(paginate(items, 0, 0), Vec::<i32>::new());
    }
}
