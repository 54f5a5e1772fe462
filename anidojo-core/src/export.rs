//! JSON export
//!
//! On-demand serialization of the full list or a selected subset of reviews
//! into a pretty-printed JSON document for download. Pure serialization, no
//! schema negotiation; the caller does any filtering beforehand.

use anidojo_common::models::{ListEntry, Review};
use anidojo_common::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListExport<'a> {
    exported_at: DateTime<Utc>,
    total_anime: usize,
    entries: &'a [ListEntry],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewExport<'a> {
    exported_at: DateTime<Utc>,
    total_reviews: usize,
    reviews: &'a [Review],
}

/// Serialize the full list to a downloadable JSON document
pub fn export_list(entries: &[ListEntry]) -> Result<String> {
    let document = ListExport {
        exported_at: Utc::now(),
        total_anime: entries.len(),
        entries,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Serialize a selected subset of reviews to a downloadable JSON document
pub fn export_reviews(reviews: &[Review]) -> Result<String> {
    let document = ReviewExport {
        exported_at: Utc::now(),
        total_reviews: reviews.len(),
        reviews,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anidojo_common::models::WatchStatus;

    fn entry(anime_id: i64) -> ListEntry {
        ListEntry {
            anime_id,
            title: format!("Anime {}", anime_id),
            title_english: None,
            title_japanese: None,
            image_url: None,
            media_type: None,
            total_episodes: Some(12),
            watch_status: WatchStatus::Watching,
            episodes_watched: 3,
            user_score: None,
            notes: None,
            tags: vec![],
            favorite: false,
            rewatch_count: 0,
            priority: None,
            date_added: Utc::now(),
            last_updated: Utc::now(),
            genres: vec![],
            year: None,
        }
    }

    #[test]
    fn test_export_list_contains_entries_and_count() {
        let entries = vec![entry(1), entry(2)];
        let json = export_list(&entries).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["totalAnime"], 2);
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["entries"][0]["animeId"], 1);
        assert!(parsed["exportedAt"].is_string());
    }

    #[test]
    fn test_export_empty_list() {
        let json = export_list(&[]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["totalAnime"], 0);
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_export_reviews_round_trips_entries() {
        use anidojo_common::models::{ReviewStatus, SubRatings};
        use uuid::Uuid;

        let review = Review {
            id: Uuid::new_v4(),
            anime_id: 1,
            user_id: "local".to_string(),
            overall_rating: Some(5),
            sub_ratings: SubRatings::default(),
            title: "Great".to_string(),
            body: "b".repeat(120),
            contains_spoilers: false,
            watch_status: WatchStatus::Completed,
            episodes_watched: None,
            tags: vec![],
            pros: vec![],
            cons: vec![],
            recommendation: None,
            lifecycle_status: ReviewStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            helpful_votes: 2,
        };

        let json = export_reviews(std::slice::from_ref(&review)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["totalReviews"], 1);
        assert_eq!(parsed["reviews"][0]["overallRating"], 5);
        assert_eq!(parsed["reviews"][0]["lifecycleStatus"], "published");
    }
}
