//! Statistics engine
//!
//! Aggregates over a full store snapshot in one deterministic pass. Nothing
//! here is cached: every call recomputes from scratch, so the numbers can
//! never drift from the collection they describe. Empty inputs yield zeros,
//! never NaN or a division error.

use std::collections::HashMap;

use anidojo_common::models::{ListEntry, Review, ReviewStatus, WatchStatus};
use serde::Serialize;

/// Count for one genre bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreCount {
    pub genre: String,
    pub count: u32,
}

/// Aggregate statistics over the list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStatistics {
    pub total_anime: u32,
    pub watching: u32,
    pub completed: u32,
    pub on_hold: u32,
    pub dropped: u32,
    pub plan_to_watch: u32,
    pub total_episodes_watched: u64,
    pub favorites: u32,
    /// Mean over entries that actually have a score; unscored entries are
    /// excluded from both sides of the division
    pub mean_score: f64,
    /// Population standard deviation of scored entries
    pub standard_deviation: f64,
    /// One bucket per genre, in first-encountered order; an entry with N
    /// genres contributes to N buckets
    pub genre_counts: Vec<GenreCount>,
}

impl ListStatistics {
    /// Top-N genres by count. Ties keep first-encountered order (the sort
    /// is stable over `genre_counts`).
    pub fn top_genres(&self, n: usize) -> Vec<GenreCount> {
        let mut ranked = self.genre_counts.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

/// Aggregate statistics over reviews
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatistics {
    pub total_reviews: u32,
    pub drafts: u32,
    pub published: u32,
    /// Mean overall rating over reviews that have one
    pub mean_rating: f64,
    /// Counts of overall ratings 1 through 5
    pub rating_distribution: [u32; 5],
    pub total_helpful_votes: u64,
}

/// Compute list statistics in a single pass over the snapshot
pub fn compute_list_stats(entries: &[ListEntry]) -> ListStatistics {
    let mut stats = ListStatistics {
        total_anime: entries.len() as u32,
        watching: 0,
        completed: 0,
        on_hold: 0,
        dropped: 0,
        plan_to_watch: 0,
        total_episodes_watched: 0,
        favorites: 0,
        mean_score: 0.0,
        standard_deviation: 0.0,
        genre_counts: Vec::new(),
    };

    let mut genre_index: HashMap<String, usize> = HashMap::new();
    let mut scored = 0u32;
    let mut score_sum = 0.0f64;
    let mut score_sum_sq = 0.0f64;

    for entry in entries {
        match entry.watch_status {
            WatchStatus::Watching => stats.watching += 1,
            WatchStatus::Completed => stats.completed += 1,
            WatchStatus::OnHold => stats.on_hold += 1,
            WatchStatus::Dropped => stats.dropped += 1,
            WatchStatus::PlanToWatch => stats.plan_to_watch += 1,
        }

        stats.total_episodes_watched += u64::from(entry.episodes_watched);
        if entry.favorite {
            stats.favorites += 1;
        }

        if let Some(score) = entry.user_score {
            scored += 1;
            let score = f64::from(score);
            score_sum += score;
            score_sum_sq += score * score;
        }

        for genre in &entry.genres {
            match genre_index.get(genre) {
                Some(&index) => stats.genre_counts[index].count += 1,
                None => {
                    genre_index.insert(genre.clone(), stats.genre_counts.len());
                    stats.genre_counts.push(GenreCount {
                        genre: genre.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    if scored > 0 {
        let n = f64::from(scored);
        stats.mean_score = score_sum / n;
        // Population variance; clamp tiny negative fp residue before sqrt
        let variance = (score_sum_sq / n - stats.mean_score * stats.mean_score).max(0.0);
        stats.standard_deviation = variance.sqrt();
    }

    stats
}

/// Compute review statistics in a single pass over the snapshot
pub fn compute_review_stats(reviews: &[Review]) -> ReviewStatistics {
    let mut stats = ReviewStatistics {
        total_reviews: reviews.len() as u32,
        drafts: 0,
        published: 0,
        mean_rating: 0.0,
        rating_distribution: [0; 5],
        total_helpful_votes: 0,
    };

    let mut rated = 0u32;
    let mut rating_sum = 0u64;

    for review in reviews {
        match review.lifecycle_status {
            ReviewStatus::Draft => stats.drafts += 1,
            ReviewStatus::Published => stats.published += 1,
        }
        stats.total_helpful_votes += u64::from(review.helpful_votes);

        if let Some(rating) = review.overall_rating {
            if (1..=5).contains(&rating) {
                stats.rating_distribution[usize::from(rating) - 1] += 1;
                rated += 1;
                rating_sum += u64::from(rating);
            }
        }
    }

    if rated > 0 {
        stats.mean_rating = rating_sum as f64 / f64::from(rated);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(
        anime_id: i64,
        status: WatchStatus,
        score: Option<u8>,
        genres: &[&str],
    ) -> ListEntry {
        ListEntry {
            anime_id,
            title: format!("Anime {}", anime_id),
            title_english: None,
            title_japanese: None,
            image_url: None,
            media_type: None,
            total_episodes: Some(12),
            watch_status: status,
            episodes_watched: 4,
            user_score: score,
            notes: None,
            tags: vec![],
            favorite: false,
            rewatch_count: 0,
            priority: None,
            date_added: Utc::now(),
            last_updated: Utc::now(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            year: None,
        }
    }

    #[test]
    fn test_empty_list_yields_zeros_without_error() {
        let stats = compute_list_stats(&[]);
        assert_eq!(stats.total_anime, 0);
        assert_eq!(stats.mean_score, 0.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.watching, 0);
        assert!(stats.genre_counts.is_empty());
        assert!(!stats.mean_score.is_nan());
    }

    #[test]
    fn test_status_counts() {
        let entries = vec![
            entry(1, WatchStatus::Watching, None, &[]),
            entry(2, WatchStatus::Completed, None, &[]),
            entry(3, WatchStatus::Completed, None, &[]),
            entry(4, WatchStatus::PlanToWatch, None, &[]),
        ];
        let stats = compute_list_stats(&entries);
        assert_eq!(stats.total_anime, 4);
        assert_eq!(stats.watching, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.plan_to_watch, 1);
        assert_eq!(stats.on_hold, 0);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_unscored_entries_excluded_from_mean() {
        let entries = vec![
            entry(1, WatchStatus::Completed, Some(8), &[]),
            entry(2, WatchStatus::Completed, Some(6), &[]),
            entry(3, WatchStatus::Completed, None, &[]),
        ];
        let stats = compute_list_stats(&entries);
        // (8 + 6) / 2, not / 3
        assert_eq!(stats.mean_score, 7.0);
        assert_eq!(stats.standard_deviation, 1.0);
    }

    #[test]
    fn test_standard_deviation_is_population() {
        let entries = vec![
            entry(1, WatchStatus::Completed, Some(2), &[]),
            entry(2, WatchStatus::Completed, Some(4), &[]),
            entry(3, WatchStatus::Completed, Some(6), &[]),
        ];
        let stats = compute_list_stats(&entries);
        assert_eq!(stats.mean_score, 4.0);
        // sqrt(((2-4)^2 + 0 + (6-4)^2) / 3) = sqrt(8/3)
        assert!((stats.standard_deviation - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_genre_buckets_first_encounter_order() {
        let entries = vec![
            entry(1, WatchStatus::Completed, None, &["Action", "Drama"]),
            entry(2, WatchStatus::Completed, None, &["Drama", "Romance"]),
            entry(3, WatchStatus::Completed, None, &["Drama"]),
        ];
        let stats = compute_list_stats(&entries);
        let buckets: Vec<(&str, u32)> = stats
            .genre_counts
            .iter()
            .map(|g| (g.genre.as_str(), g.count))
            .collect();
        assert_eq!(
            buckets,
            vec![("Action", 1), ("Drama", 3), ("Romance", 1)]
        );
    }

    #[test]
    fn test_top_genres_ties_break_by_first_encounter() {
        let entries = vec![
            entry(1, WatchStatus::Completed, None, &["Action", "Drama"]),
            entry(2, WatchStatus::Completed, None, &["Drama", "Action", "Romance"]),
        ];
        let stats = compute_list_stats(&entries);
        let top = stats.top_genres(2);
        // Action and Drama both count 2; Action was seen first
        assert_eq!(top[0].genre, "Action");
        assert_eq!(top[1].genre, "Drama");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let entries = vec![
            entry(1, WatchStatus::Watching, Some(7), &["Action"]),
            entry(2, WatchStatus::Completed, Some(9), &["Drama", "Action"]),
        ];
        let first = compute_list_stats(&entries);
        let second = compute_list_stats(&entries);
        assert_eq!(first, second);
        // Byte-identical serialized output
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    mod reviews {
        use super::*;
        use anidojo_common::models::SubRatings;
        use uuid::Uuid;

        fn review(status: ReviewStatus, rating: Option<u8>, votes: u32) -> Review {
            Review {
                id: Uuid::new_v4(),
                anime_id: 1,
                user_id: "local".to_string(),
                overall_rating: rating,
                sub_ratings: SubRatings::default(),
                title: "t".to_string(),
                body: "b".to_string(),
                contains_spoilers: false,
                watch_status: WatchStatus::Completed,
                episodes_watched: None,
                tags: vec![],
                pros: vec![],
                cons: vec![],
                recommendation: None,
                lifecycle_status: status,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                helpful_votes: votes,
            }
        }

        #[test]
        fn test_empty_reviews_yield_zeros() {
            let stats = compute_review_stats(&[]);
            assert_eq!(stats.total_reviews, 0);
            assert_eq!(stats.mean_rating, 0.0);
            assert_eq!(stats.rating_distribution, [0; 5]);
        }

        #[test]
        fn test_lifecycle_and_rating_distribution() {
            let reviews = vec![
                review(ReviewStatus::Published, Some(5), 3),
                review(ReviewStatus::Published, Some(4), 1),
                review(ReviewStatus::Draft, None, 0),
                review(ReviewStatus::Published, Some(5), 0),
            ];
            let stats = compute_review_stats(&reviews);
            assert_eq!(stats.total_reviews, 4);
            assert_eq!(stats.drafts, 1);
            assert_eq!(stats.published, 3);
            assert_eq!(stats.rating_distribution, [0, 0, 0, 1, 2]);
            assert!((stats.mean_rating - 14.0 / 3.0).abs() < 1e-12);
            assert_eq!(stats.total_helpful_votes, 4);
        }
    }
}
