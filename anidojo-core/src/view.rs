//! View engine
//!
//! Pure projection of a store snapshot through a view configuration:
//! filter by tab, then by search text, then sort. The engine holds no state
//! of its own — it is re-invoked on every render with the latest snapshot —
//! and all sorts are stable, so the collection order is the tiebreaker.
//! Determinism here is a contract, not a nicety.

use anidojo_common::models::{ListEntry, Review, ReviewStatus, WatchStatus};
use serde::{Deserialize, Serialize};

/// Status tab over the list, including the pass-everything wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListTab {
    All,
    Status(WatchStatus),
}

/// Sort orders for list entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListSortKey {
    TitleAsc,
    TitleDesc,
    ScoreHigh,
    ScoreLow,
    /// Most recently added first
    DateAdded,
    /// Most recently touched first
    LastUpdated,
    /// Highest watch progress first
    Progress,
}

/// Ephemeral view configuration for the list; owned by the caller, never
/// persisted
#[derive(Debug, Clone)]
pub struct ListViewConfig {
    pub tab: ListTab,
    pub search: String,
    pub sort: ListSortKey,
}

impl Default for ListViewConfig {
    fn default() -> Self {
        Self {
            tab: ListTab::All,
            search: String::new(),
            sort: ListSortKey::LastUpdated,
        }
    }
}

/// Lifecycle tab over reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewTab {
    All,
    Status(ReviewStatus),
}

/// Sort orders for reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSortKey {
    /// Most recently saved first
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
    MostHelpful,
}

#[derive(Debug, Clone)]
pub struct ReviewViewConfig {
    pub tab: ReviewTab,
    pub search: String,
    pub sort: ReviewSortKey,
}

impl Default for ReviewViewConfig {
    fn default() -> Self {
        Self {
            tab: ReviewTab::All,
            search: String::new(),
            sort: ReviewSortKey::Newest,
        }
    }
}

/// Project list entries through tab filter → text search → stable sort
pub fn project_list<'a>(entries: &'a [ListEntry], config: &ListViewConfig) -> Vec<&'a ListEntry> {
    let query = config.search.trim().to_lowercase();

    let mut view: Vec<&ListEntry> = entries
        .iter()
        .filter(|entry| match config.tab {
            ListTab::All => true,
            ListTab::Status(status) => entry.watch_status == status,
        })
        .filter(|entry| query.is_empty() || entry_matches(entry, &query))
        .collect();

    sort_list(&mut view, config.sort);
    view
}

/// Project reviews through the same pipeline
pub fn project_reviews<'a>(reviews: &'a [Review], config: &ReviewViewConfig) -> Vec<&'a Review> {
    let query = config.search.trim().to_lowercase();

    let mut view: Vec<&Review> = reviews
        .iter()
        .filter(|review| match config.tab {
            ReviewTab::All => true,
            ReviewTab::Status(status) => review.lifecycle_status == status,
        })
        .filter(|review| query.is_empty() || review_matches(review, &query))
        .collect();

    sort_reviews(&mut view, config.sort);
    view
}

/// Case-insensitive substring match over the fixed searchable fields:
/// title, English title, notes, tags. Any one hit matches the entry.
fn entry_matches(entry: &ListEntry, query: &str) -> bool {
    if entry.title.to_lowercase().contains(query) {
        return true;
    }
    if let Some(english) = &entry.title_english {
        if english.to_lowercase().contains(query) {
            return true;
        }
    }
    if let Some(notes) = &entry.notes {
        if notes.to_lowercase().contains(query) {
            return true;
        }
    }
    entry.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

/// Searchable review fields: title, body, tags
fn review_matches(review: &Review, query: &str) -> bool {
    review.title.to_lowercase().contains(query)
        || review.body.to_lowercase().contains(query)
        || review.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

fn sort_list(view: &mut [&ListEntry], sort: ListSortKey) {
    match sort {
        ListSortKey::TitleAsc => {
            view.sort_by(|a, b| sort_title(a).cmp(&sort_title(b)));
        }
        ListSortKey::TitleDesc => {
            view.sort_by(|a, b| sort_title(b).cmp(&sort_title(a)));
        }
        ListSortKey::ScoreHigh => {
            // Unscored entries sort as 0, i.e. last
            view.sort_by(|a, b| b.user_score.unwrap_or(0).cmp(&a.user_score.unwrap_or(0)));
        }
        ListSortKey::ScoreLow => {
            view.sort_by(|a, b| a.user_score.unwrap_or(0).cmp(&b.user_score.unwrap_or(0)));
        }
        ListSortKey::DateAdded => {
            view.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        }
        ListSortKey::LastUpdated => {
            view.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        }
        ListSortKey::Progress => {
            view.sort_by(|a, b| b.progress().total_cmp(&a.progress()));
        }
    }
}

fn sort_reviews(view: &mut [&Review], sort: ReviewSortKey) {
    match sort {
        ReviewSortKey::Newest => view.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        ReviewSortKey::Oldest => view.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        ReviewSortKey::RatingHigh => view.sort_by(|a, b| {
            b.overall_rating
                .unwrap_or(0)
                .cmp(&a.overall_rating.unwrap_or(0))
        }),
        ReviewSortKey::RatingLow => view.sort_by(|a, b| {
            a.overall_rating
                .unwrap_or(0)
                .cmp(&b.overall_rating.unwrap_or(0))
        }),
        ReviewSortKey::MostHelpful => view.sort_by(|a, b| b.helpful_votes.cmp(&a.helpful_votes)),
    }
}

/// Sort key for titles: English title when present, case-folded
fn sort_title(entry: &ListEntry) -> String {
    entry.display_title().to_lowercase()
}
