//! Domain model types
//!
//! Persisted shapes use camelCase field names: the list and review regions
//! are browser-heritage JSON documents and stay readable by their original
//! consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Airing status of an anime as reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AirStatus {
    Airing,
    Finished,
    NotYetAired,
}

/// User watch status for a tracked anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl WatchStatus {
    /// All statuses, in display order
    pub const ALL: [WatchStatus; 5] = [
        WatchStatus::Watching,
        WatchStatus::Completed,
        WatchStatus::OnHold,
        WatchStatus::Dropped,
        WatchStatus::PlanToWatch,
    ];
}

/// Watch priority for plan-to-watch entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Reviewer's overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationLevel {
    HighlyRecommend,
    Recommend,
    Mixed,
    NotRecommend,
    StronglyNotRecommend,
}

/// Review lifecycle: drafts are private and unvalidated, published reviews
/// have passed full validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    Draft,
    Published,
}

/// Normalized catalog record.
///
/// Produced by the catalog normalizer, consumed by the recommendation scorer
/// and the add-to-list path. Never persisted; re-fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSummary {
    /// Stable external catalog identifier
    pub id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub image_url: Option<String>,
    /// TV / Movie / OVA / ONA / Special, as reported by the catalog
    pub media_type: Option<String>,
    /// `None` means the catalog does not know yet, not zero episodes
    pub total_episodes: Option<u32>,
    pub air_status: AirStatus,
    pub year: Option<i32>,
    /// Source order preserved
    #[serde(default)]
    pub genres: Vec<String>,
    /// Community score, 0.0-10.0
    pub score: Option<f64>,
}

/// One anime on the user's personal list.
///
/// Owned exclusively by the list store; nothing else constructs or destroys
/// these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    /// Catalog id; unique within the list
    pub anime_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub image_url: Option<String>,
    pub media_type: Option<String>,
    pub total_episodes: Option<u32>,
    pub watch_status: WatchStatus,
    pub episodes_watched: u32,
    /// Integer 0-10
    pub user_score: Option<u8>,
    /// Free-form notes, at most 500 characters
    pub notes: Option<String>,
    /// At most 5 distinct tags, case-sensitive, insertion order kept
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub rewatch_count: u32,
    pub priority: Option<Priority>,
    /// Set once at creation, never changed afterwards
    pub date_added: DateTime<Utc>,
    /// Refreshed on every mutation
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub year: Option<i32>,
}

impl ListEntry {
    /// Watch progress in [0.0, 1.0]; unknown episode totals count as 0
    pub fn progress(&self) -> f64 {
        match self.total_episodes {
            Some(total) if total > 0 => f64::from(self.episodes_watched) / f64::from(total),
            _ => 0.0,
        }
    }

    /// Title used for display and sorting: English title when available
    pub fn display_title(&self) -> &str {
        self.title_english.as_deref().unwrap_or(&self.title)
    }
}

/// Per-aspect ratings inside a review, each 1-5 when present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRatings {
    pub story: Option<u8>,
    pub animation: Option<u8>,
    pub sound: Option<u8>,
    pub character: Option<u8>,
    pub enjoyment: Option<u8>,
}

/// A user review of one anime.
///
/// At most one review per (user, anime) pair; the review store enforces
/// this. `id` is the persistence key — updates match on it, never on
/// `anime_id` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub anime_id: i64,
    pub user_id: String,
    /// Integer 1-5; required to publish, optional while drafting
    pub overall_rating: Option<u8>,
    #[serde(default)]
    pub sub_ratings: SubRatings,
    /// Required, at most 100 characters
    pub title: String,
    /// 100-10,000 characters to publish; unrestricted for drafts
    pub body: String,
    #[serde(default)]
    pub contains_spoilers: bool,
    /// Reviewer's watch status at time of writing; may diverge from the
    /// list entry's status
    pub watch_status: WatchStatus,
    pub episodes_watched: Option<u32>,
    /// At most 5 distinct tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub recommendation: Option<RecommendationLevel>,
    pub lifecycle_status: ReviewStatus,
    /// Set once at creation, never changed afterwards
    pub created_at: DateTime<Utc>,
    /// Refreshed on every save
    pub updated_at: DateTime<Utc>,
    /// Never decremented
    #[serde(default)]
    pub helpful_votes: u32,
}
