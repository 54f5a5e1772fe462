//! List store
//!
//! The authoritative, persisted collection of the user's list entries: one
//! entry per tracked anime, keyed by catalog id. Every mutating operation
//! rewrites the whole region synchronously before returning and emits a
//! `StoreEvent`, so the presentation layer can redraw and statistics can be
//! recomputed.

use anidojo_common::events::{self, StoreEvent};
use anidojo_common::models::{AnimeSummary, ListEntry, Priority, WatchStatus};
use anidojo_common::storage::{load_collection, Region, LIST_REGION};
use anidojo_common::{Error, Result, ValidationError};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{RemoveOutcome, Saved};

/// Maximum length of the free-form notes field
const MAX_NOTES_CHARS: usize = 500;
/// Maximum number of distinct tags per entry
const MAX_TAGS: usize = 5;
/// Maximum user score
const MAX_USER_SCORE: u8 = 10;

/// Time source seam; tests inject a deterministic clock
type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Input for creating a new list entry
#[derive(Debug, Clone)]
pub struct NewListEntry {
    pub anime_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub image_url: Option<String>,
    pub media_type: Option<String>,
    pub total_episodes: Option<u32>,
    pub watch_status: WatchStatus,
    pub episodes_watched: u32,
    pub user_score: Option<u8>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub priority: Option<Priority>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
}

impl NewListEntry {
    /// The usual add-to-list path: a normalized catalog record plus the
    /// initial watch status
    pub fn from_summary(summary: &AnimeSummary, watch_status: WatchStatus) -> Self {
        Self {
            anime_id: summary.id,
            title: summary.title.clone(),
            title_english: summary.title_english.clone(),
            title_japanese: summary.title_japanese.clone(),
            image_url: summary.image_url.clone(),
            media_type: summary.media_type.clone(),
            total_episodes: summary.total_episodes,
            watch_status,
            episodes_watched: 0,
            user_score: None,
            notes: None,
            tags: Vec::new(),
            favorite: false,
            priority: None,
            genres: summary.genres.clone(),
            year: summary.year,
        }
    }
}

/// Partial update for an existing entry. `None` leaves a field untouched;
/// the double-`Option` fields can also clear a value.
#[derive(Debug, Clone, Default)]
pub struct ListEntryPatch {
    pub watch_status: Option<WatchStatus>,
    pub episodes_watched: Option<u32>,
    pub user_score: Option<Option<u8>>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
    pub rewatch_count: Option<u32>,
    pub priority: Option<Option<Priority>>,
}

/// The persisted list-entry collection
pub struct ListStore {
    entries: Vec<ListEntry>,
    region: Box<dyn Region>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
}

impl ListStore {
    /// Open the store over a region, loading whatever is already persisted.
    /// An absent or corrupt region starts the list empty.
    pub fn open(region: Box<dyn Region>) -> Self {
        Self::with_clock(region, Box::new(Utc::now))
    }

    /// Open with an injected time source (tests)
    pub fn with_clock(region: Box<dyn Region>, clock: Clock) -> Self {
        let entries = load_collection(region.as_ref(), LIST_REGION);
        let (events, _) = events::channel();
        Self {
            entries,
            region,
            events,
            clock,
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Current collection snapshot, in insertion order
    pub fn snapshot(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for one anime, if tracked
    pub fn get(&self, anime_id: i64) -> Option<&ListEntry> {
        self.entries.iter().find(|e| e.anime_id == anime_id)
    }

    /// Add a new entry. Fails with `DuplicateEntry` if the anime is already
    /// tracked; the caller decides whether to fall back to an update.
    pub fn add(&mut self, new: NewListEntry) -> Result<Saved<ListEntry>> {
        if self.get(new.anime_id).is_some() {
            return Err(Error::DuplicateEntry(new.anime_id));
        }

        let tags = normalize_tags(new.tags);
        validate_entry_fields(new.notes.as_deref(), &tags, new.user_score)?;

        let now = (self.clock)();
        let mut entry = ListEntry {
            anime_id: new.anime_id,
            title: new.title,
            title_english: new.title_english,
            title_japanese: new.title_japanese,
            image_url: new.image_url,
            media_type: new.media_type,
            total_episodes: new.total_episodes,
            watch_status: new.watch_status,
            episodes_watched: new.episodes_watched,
            user_score: new.user_score,
            notes: new.notes,
            tags,
            favorite: new.favorite,
            rewatch_count: 0,
            priority: new.priority,
            date_added: now,
            last_updated: now,
            genres: new.genres,
            year: new.year,
        };
        apply_episode_cap(&mut entry);

        debug!(anime_id = entry.anime_id, "adding list entry");
        self.entries.push(entry.clone());
        let persisted = self.persist();
        self.emit(StoreEvent::ListEntryAdded {
            anime_id: entry.anime_id,
            timestamp: now,
        });

        Ok(Saved {
            value: entry,
            persisted,
        })
    }

    /// Merge a patch over an existing entry. `lastUpdated` is always bumped,
    /// whatever the patch contains. Raising `episodesWatched` to a known
    /// total transitions the entry to `completed` here, not in the caller.
    pub fn update(&mut self, anime_id: i64, patch: ListEntryPatch) -> Result<Saved<ListEntry>> {
        // Resolve the entry first: an unknown id is NotFound even when the
        // patch itself would not validate
        let index = self
            .entries
            .iter()
            .position(|e| e.anime_id == anime_id)
            .ok_or_else(|| Error::NotFound(format!("anime {} is not in the list", anime_id)))?;

        let tags = patch.tags.map(normalize_tags);
        let notes = patch.notes.clone();
        validate_entry_fields(
            notes.as_ref().and_then(|n| n.as_deref()),
            tags.as_deref().unwrap_or(&[]),
            patch.user_score.flatten(),
        )?;

        let now = (self.clock)();
        let entry = &mut self.entries[index];

        if let Some(status) = patch.watch_status {
            entry.watch_status = status;
        }
        if let Some(episodes) = patch.episodes_watched {
            entry.episodes_watched = episodes;
        }
        if let Some(score) = patch.user_score {
            entry.user_score = score;
        }
        if let Some(new_notes) = notes {
            entry.notes = new_notes;
        }
        if let Some(new_tags) = tags {
            entry.tags = new_tags;
        }
        if let Some(favorite) = patch.favorite {
            entry.favorite = favorite;
        }
        if let Some(rewatch) = patch.rewatch_count {
            entry.rewatch_count = rewatch;
        }
        if let Some(priority) = patch.priority {
            entry.priority = priority;
        }
        entry.last_updated = now;
        apply_episode_cap(entry);

        let updated = entry.clone();
        let persisted = self.persist();
        self.emit(StoreEvent::ListEntryUpdated {
            anime_id,
            timestamp: now,
        });

        Ok(Saved {
            value: updated,
            persisted,
        })
    }

    /// Bump the episode counter by one, clamped to the known total. Already
    /// at the cap is a no-op on the counter but still refreshes
    /// `lastUpdated` and persists.
    pub fn increment_episode(&mut self, anime_id: i64) -> Result<Saved<ListEntry>> {
        let current = self
            .get(anime_id)
            .ok_or_else(|| Error::NotFound(format!("anime {} is not in the list", anime_id)))?;

        let next = match current.total_episodes {
            Some(total) => current.episodes_watched.saturating_add(1).min(total),
            None => current.episodes_watched.saturating_add(1),
        };

        self.update(
            anime_id,
            ListEntryPatch {
                episodes_watched: Some(next),
                ..Default::default()
            },
        )
    }

    /// Flip the favorite flag
    pub fn toggle_favorite(&mut self, anime_id: i64) -> Result<Saved<ListEntry>> {
        let favorite = !self
            .get(anime_id)
            .ok_or_else(|| Error::NotFound(format!("anime {} is not in the list", anime_id)))?
            .favorite;

        self.update(
            anime_id,
            ListEntryPatch {
                favorite: Some(favorite),
                ..Default::default()
            },
        )
    }

    /// Remove one entry. Idempotent: removing an absent id is a no-op that
    /// reports `NotFound` without failing.
    pub fn remove(&mut self, anime_id: i64) -> Saved<RemoveOutcome> {
        let before = self.entries.len();
        self.entries.retain(|e| e.anime_id != anime_id);

        if self.entries.len() == before {
            return Saved {
                value: RemoveOutcome::NotFound,
                persisted: true,
            };
        }

        debug!(anime_id, "removed list entry");
        let persisted = self.persist();
        self.emit(StoreEvent::ListEntriesRemoved {
            anime_ids: vec![anime_id],
            timestamp: (self.clock)(),
        });
        Saved {
            value: RemoveOutcome::Removed,
            persisted,
        }
    }

    /// Remove all matching entries in one persisted write, ignoring absent
    /// ids. Returns how many entries were actually removed.
    pub fn bulk_remove(&mut self, anime_ids: &[i64]) -> Saved<usize> {
        let removed: Vec<i64> = self
            .entries
            .iter()
            .filter(|e| anime_ids.contains(&e.anime_id))
            .map(|e| e.anime_id)
            .collect();

        if removed.is_empty() {
            return Saved {
                value: 0,
                persisted: true,
            };
        }

        self.entries.retain(|e| !anime_ids.contains(&e.anime_id));
        debug!(count = removed.len(), "bulk removed list entries");
        let persisted = self.persist();
        self.emit(StoreEvent::ListEntriesRemoved {
            anime_ids: removed.clone(),
            timestamp: (self.clock)(),
        });
        Saved {
            value: removed.len(),
            persisted,
        }
    }

    /// Rewrite the whole region. A failure keeps the in-memory state and is
    /// reported through `Saved::persisted` so the caller can warn the user.
    fn persist(&self) -> bool {
        let payload = match serde_json::to_string(&self.entries) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "list region serialization failed");
                return false;
            }
        };
        match self.region.write(&payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "list region write failed, change not persisted");
                false
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Collapse duplicate tags, keeping first-seen order (set semantics)
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Field-level constraints shared by add and update
fn validate_entry_fields(
    notes: Option<&str>,
    tags: &[String],
    user_score: Option<u8>,
) -> Result<()> {
    let mut v = ValidationError::new();
    if let Some(notes) = notes {
        if notes.chars().count() > MAX_NOTES_CHARS {
            v.add("notes", "too long");
        }
    }
    if tags.len() > MAX_TAGS {
        v.add("tags", "too many");
    }
    if let Some(score) = user_score {
        if score > MAX_USER_SCORE {
            v.add("userScore", "out of range");
        }
    }
    v.into_result()
}

/// Clamp the episode counter to a known total and auto-complete. A total of
/// zero (catalog placeholder) still clamps the counter but never completes.
fn apply_episode_cap(entry: &mut ListEntry) {
    if let Some(total) = entry.total_episodes {
        if entry.episodes_watched > total {
            entry.episodes_watched = total;
        }
        if total > 0 && entry.episodes_watched == total {
            entry.watch_status = WatchStatus::Completed;
        }
    }
}
