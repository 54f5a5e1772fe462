//! Catalog record normalization
//!
//! The catalog returns loosely-shaped JSON with plenty of nullable fields.
//! This module validates and coerces those payloads into the strongly-typed
//! `AnimeSummary` at the boundary; nothing downstream sees raw catalog
//! shapes. Normalization is a pure transform and never fails: missing
//! optional fields stay `None`, unknown status strings fall back to
//! `not-yet-aired`.

use anidojo_common::models::{AirStatus, AnimeSummary};
use serde::Deserialize;

/// Raw catalog anime record, as delivered by the API
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnime {
    pub mal_id: i64,
    pub title: Option<String>,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub images: Option<RawImages>,
    /// TV / Movie / OVA / ONA / Special
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    /// `None` means episode count not yet known, not zero
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub year: Option<i32>,
    pub aired: Option<RawAired>,
    #[serde(default)]
    pub genres: Vec<RawGenre>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImages {
    pub jpg: Option<RawImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAired {
    /// ISO-8601 datetime string, e.g. "1998-04-03T00:00:00+00:00"
    pub from: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGenre {
    pub name: String,
}

/// Convert one raw catalog record into the internal summary shape.
///
/// Tolerates every optional field being absent. Maps the catalog's airing
/// status strings onto the three-value `AirStatus`; anything unrecognized
/// becomes `NotYetAired` rather than an error.
pub fn normalize(raw: &RawAnime) -> AnimeSummary {
    let title = raw
        .title
        .clone()
        .or_else(|| raw.title_english.clone())
        .unwrap_or_default();

    let image_url = raw
        .images
        .as_ref()
        .and_then(|i| i.jpg.as_ref())
        .and_then(|j| j.image_url.clone().or_else(|| j.large_image_url.clone()));

    let year = raw.year.or_else(|| year_from_aired(raw.aired.as_ref()));

    AnimeSummary {
        id: raw.mal_id,
        title,
        title_english: raw.title_english.clone(),
        title_japanese: raw.title_japanese.clone(),
        image_url,
        media_type: raw.media_type.clone(),
        total_episodes: raw.episodes,
        air_status: normalize_status(raw.status.as_deref()),
        year,
        genres: raw.genres.iter().map(|g| g.name.clone()).collect(),
        score: raw.score,
    }
}

/// Map catalog status strings to the internal enum
fn normalize_status(status: Option<&str>) -> AirStatus {
    match status {
        Some("Currently Airing") => AirStatus::Airing,
        Some("Finished Airing") => AirStatus::Finished,
        _ => AirStatus::NotYetAired,
    }
}

/// Fall back to the first air date's year when the catalog omits `year`
fn year_from_aired(aired: Option<&RawAired>) -> Option<i32> {
    let from = aired?.from.as_deref()?;
    from.get(0..4)?.parse().ok()
}
