//! Recommendation scorer
//!
//! Scores catalog results against a set of selected moods (named genre
//! clusters) and optional filter constraints, producing a 0-100 match
//! percentage per anime, a ranked list, and a single top pick. Selecting no
//! moods is an input error; the scorer is never invoked without at least
//! one.
//!
//! Scoring runs up to five criteria per anime:
//! - mood-genre overlap, scaled to 100 by the fraction of mood-associated
//!   genres present on the anime
//! - flat 20 points each for score-in-range, year-in-range, media-type
//!   match, and air-status match
//!
//! The final score is the rounded mean over the criteria actually
//! evaluated: score/year range criteria only count when the corresponding
//! filter bound is set (and, for score, the anime has one); type/status
//! criteria always count, passing automatically when the filter is unset.

use anidojo_common::models::{AirStatus, AnimeSummary};
use anidojo_common::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Flat contribution of each filter criterion
const FILTER_CRITERION_POINTS: f64 = 20.0;

/// A named cluster of genres used to bias scoring
#[derive(Debug, Clone, Copy)]
pub struct Mood {
    pub id: &'static str,
    pub label: &'static str,
    pub genres: &'static [&'static str],
}

/// Built-in mood table
pub static MOODS: Lazy<Vec<Mood>> = Lazy::new(|| {
    vec![
        Mood {
            id: "action-packed",
            label: "Action-Packed",
            genres: &["Action", "Adventure", "Martial Arts"],
        },
        Mood {
            id: "chill",
            label: "Chill & Cozy",
            genres: &["Slice of Life", "Iyashikei", "Comedy"],
        },
        Mood {
            id: "dark",
            label: "Dark & Gritty",
            genres: &["Thriller", "Horror", "Psychological"],
        },
        Mood {
            id: "emotional",
            label: "Emotional",
            genres: &["Drama", "Romance"],
        },
        Mood {
            id: "funny",
            label: "Laugh Out Loud",
            genres: &["Comedy", "Parody", "Gag Humor"],
        },
        Mood {
            id: "epic",
            label: "Epic Worlds",
            genres: &["Fantasy", "Sci-Fi", "Adventure"],
        },
        Mood {
            id: "romantic",
            label: "Romantic",
            genres: &["Romance", "Shoujo"],
        },
        Mood {
            id: "mysterious",
            label: "Mysterious",
            genres: &["Mystery", "Suspense", "Thriller"],
        },
    ]
});

/// Look up a built-in mood by id
pub fn mood_by_id(id: &str) -> Option<&'static Mood> {
    MOODS.iter().find(|m| m.id == id)
}

/// Optional constraints applied alongside mood scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationFilters {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    /// Empty means any media type
    #[serde(default)]
    pub media_types: Vec<String>,
    /// Empty means any airing status
    #[serde(default)]
    pub air_statuses: Vec<AirStatus>,
}

/// One scored catalog result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAnime {
    pub anime: AnimeSummary,
    /// 0-100 match percentage
    pub match_percent: u8,
}

/// Ranked scoring output: the single best match, split out from the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRecommendations {
    pub top_pick: Option<ScoredAnime>,
    /// Remaining results, best match first
    pub recommendations: Vec<ScoredAnime>,
}

/// Compute the 0-100 match percentage for one anime
pub fn match_score(
    anime: &AnimeSummary,
    moods: &[&Mood],
    filters: &RecommendationFilters,
) -> Result<u8> {
    if moods.is_empty() {
        return Err(Error::MoodRequired);
    }

    let mut contributions: Vec<f64> = Vec::with_capacity(5);

    contributions.push(mood_overlap(anime, moods));

    // Score range: evaluated only when a bound is configured and the anime
    // has a score to compare
    if (filters.min_score.is_some() || filters.max_score.is_some()) && anime.score.is_some() {
        let score = anime.score.unwrap_or(0.0);
        let in_range = filters.min_score.map_or(true, |min| score >= min)
            && filters.max_score.map_or(true, |max| score <= max);
        contributions.push(if in_range { FILTER_CRITERION_POINTS } else { 0.0 });
    }

    // Year range: evaluated only when a bound is configured
    if filters.min_year.is_some() || filters.max_year.is_some() {
        let in_range = anime.year.map_or(false, |year| {
            filters.min_year.map_or(true, |min| year >= min)
                && filters.max_year.map_or(true, |max| year <= max)
        });
        contributions.push(if in_range { FILTER_CRITERION_POINTS } else { 0.0 });
    }

    // Media type: always evaluated; an unset filter passes everything
    let type_matches = filters.media_types.is_empty()
        || anime.media_type.as_deref().map_or(false, |t| {
            filters
                .media_types
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(t))
        });
    contributions.push(if type_matches { FILTER_CRITERION_POINTS } else { 0.0 });

    // Air status: always evaluated; an unset filter passes everything
    let status_matches =
        filters.air_statuses.is_empty() || filters.air_statuses.contains(&anime.air_status);
    contributions.push(if status_matches { FILTER_CRITERION_POINTS } else { 0.0 });

    let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
    Ok(mean.round() as u8)
}

/// Score a whole result set and rank it.
///
/// Stable sort, best match first, raw catalog score as the secondary key,
/// collection order as the final tiebreaker. The highest-scored item becomes
/// the top pick and is excluded from the remaining list.
pub fn rank(
    candidates: &[AnimeSummary],
    mood_ids: &[String],
    filters: &RecommendationFilters,
) -> Result<RankedRecommendations> {
    let moods: Vec<&Mood> = mood_ids.iter().filter_map(|id| mood_by_id(id)).collect();
    if moods.is_empty() {
        return Err(Error::MoodRequired);
    }

    let mut scored: Vec<ScoredAnime> = candidates
        .iter()
        .map(|anime| {
            Ok(ScoredAnime {
                anime: anime.clone(),
                match_percent: match_score(anime, &moods, filters)?,
            })
        })
        .collect::<Result<_>>()?;

    scored.sort_by(|a, b| {
        b.match_percent.cmp(&a.match_percent).then(
            b.anime
                .score
                .unwrap_or(0.0)
                .total_cmp(&a.anime.score.unwrap_or(0.0)),
        )
    });

    let mut rest = scored.into_iter();
    let top_pick = rest.next();

    Ok(RankedRecommendations {
        top_pick,
        recommendations: rest.collect(),
    })
}

/// Fraction of the selected moods' genres present on the anime, scaled to
/// 100. Genres are compared case-insensitively; duplicates across moods
/// count once.
fn mood_overlap(anime: &AnimeSummary, moods: &[&Mood]) -> f64 {
    let mut wanted: Vec<&str> = Vec::new();
    for mood in moods {
        for genre in mood.genres {
            if !wanted.iter().any(|w| w.eq_ignore_ascii_case(genre)) {
                wanted.push(genre);
            }
        }
    }
    if wanted.is_empty() {
        return 0.0;
    }

    let present = wanted
        .iter()
        .filter(|wanted| {
            anime
                .genres
                .iter()
                .any(|genre| genre.eq_ignore_ascii_case(wanted))
        })
        .count();

    present as f64 / wanted.len() as f64 * 100.0
}
