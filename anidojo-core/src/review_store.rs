//! Review store
//!
//! The authoritative, persisted collection of user reviews: at most one per
//! (user, anime) pair. Drafts save with only structural checks; publishing
//! runs full field validation first and persists nothing on failure.
//! Persistence discipline is identical to the list store: whole-region
//! rewrite after every mutation, change event afterwards.

use anidojo_common::events::{self, StoreEvent};
use anidojo_common::models::{RecommendationLevel, Review, ReviewStatus, SubRatings, WatchStatus};
use anidojo_common::storage::{load_collection, Region, REVIEWS_REGION};
use anidojo_common::{Error, Result, ValidationError};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{RemoveOutcome, Saved};

/// Maximum review title length
const MAX_TITLE_CHARS: usize = 100;
/// Body length bounds for publishing
const MIN_BODY_CHARS: usize = 100;
const MAX_BODY_CHARS: usize = 10_000;
/// Maximum number of distinct tags per review
const MAX_TAGS: usize = 5;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Editable review content, as it comes from the review form.
///
/// `id` is `None` for a brand-new review; the store also matches on
/// (user, anime) so re-saving without the id still updates in place.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub id: Option<Uuid>,
    pub anime_id: i64,
    pub overall_rating: Option<u8>,
    pub sub_ratings: SubRatings,
    pub title: String,
    pub body: String,
    pub contains_spoilers: bool,
    pub watch_status: WatchStatus,
    pub episodes_watched: Option<u32>,
    pub tags: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub recommendation: Option<RecommendationLevel>,
}

/// The persisted review collection
pub struct ReviewStore {
    reviews: Vec<Review>,
    region: Box<dyn Region>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
}

impl ReviewStore {
    /// Open the store over a region; absent or corrupt regions start empty
    pub fn open(region: Box<dyn Region>) -> Self {
        Self::with_clock(region, Box::new(Utc::now))
    }

    /// Open with an injected time source (tests)
    pub fn with_clock(region: Box<dyn Region>, clock: Clock) -> Self {
        let reviews = load_collection(region.as_ref(), REVIEWS_REGION);
        let (events, _) = events::channel();
        Self {
            reviews,
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
    pub fn snapshot(&self) -> &[Review] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Review by id
    pub fn get(&self, id: Uuid) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    /// The user's review of one anime, if any. Used to pre-populate edit
    /// forms; never mutates.
    pub fn find_by_anime(&self, anime_id: i64, user_id: &str) -> Option<&Review> {
        self.reviews
            .iter()
            .find(|r| r.anime_id == anime_id && r.user_id == user_id)
    }

    /// Save as draft: structural checks only (tag cap, rating ranges), no
    /// content requirements. Always persists when structurally valid.
    pub fn save_draft(&mut self, user_id: &str, input: ReviewInput) -> Result<Saved<Review>> {
        let input = normalize_input(input);
        validate_structure(&input)?;
        self.upsert(user_id, input, ReviewStatus::Draft)
    }

    /// Publish: full validation first — missing rating, empty or overlong
    /// title, body outside the publishable bounds — and no persistence at
    /// all on failure.
    pub fn publish(&mut self, user_id: &str, input: ReviewInput) -> Result<Saved<Review>> {
        let input = normalize_input(input);
        validate_structure(&input)?;
        validate_for_publish(&input)?;
        self.upsert(user_id, input, ReviewStatus::Published)
    }

    /// Delete one review. Idempotent.
    pub fn delete(&mut self, id: Uuid) -> Saved<RemoveOutcome> {
        let before = self.reviews.len();
        self.reviews.retain(|r| r.id != id);

        if self.reviews.len() == before {
            return Saved {
                value: RemoveOutcome::NotFound,
                persisted: true,
            };
        }

        debug!(review_id = %id, "deleted review");
        let persisted = self.persist();
        self.emit(StoreEvent::ReviewsDeleted {
            review_ids: vec![id],
            timestamp: (self.clock)(),
        });
        Saved {
            value: RemoveOutcome::Removed,
            persisted,
        }
    }

    /// Delete all matching reviews in one persisted write, ignoring absent
    /// ids. Returns how many were actually deleted.
    pub fn bulk_delete(&mut self, ids: &[Uuid]) -> Saved<usize> {
        let deleted: Vec<Uuid> = self
            .reviews
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| r.id)
            .collect();

        if deleted.is_empty() {
            return Saved {
                value: 0,
                persisted: true,
            };
        }

        self.reviews.retain(|r| !ids.contains(&r.id));
        debug!(count = deleted.len(), "bulk deleted reviews");
        let persisted = self.persist();
        self.emit(StoreEvent::ReviewsDeleted {
            review_ids: deleted.clone(),
            timestamp: (self.clock)(),
        });
        Saved {
            value: deleted.len(),
            persisted,
        }
    }

    /// Count one helpful vote. Votes only ever go up.
    pub fn mark_helpful(&mut self, id: Uuid) -> Result<Saved<u32>> {
        let now = (self.clock)();
        let review = self
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("review {} does not exist", id)))?;

        review.helpful_votes += 1;
        review.updated_at = now;
        let votes = review.helpful_votes;
        let anime_id = review.anime_id;

        let persisted = self.persist();
        self.emit(StoreEvent::ReviewSaved {
            review_id: id,
            anime_id,
            timestamp: now,
        });
        Ok(Saved {
            value: votes,
            persisted,
        })
    }

    /// Update-in-place when the review already exists (matched by id, or by
    /// (user, anime) for id-less saves), otherwise create. `createdAt` and
    /// `helpfulVotes` survive updates; `updatedAt` is always refreshed.
    fn upsert(
        &mut self,
        user_id: &str,
        input: ReviewInput,
        lifecycle_status: ReviewStatus,
    ) -> Result<Saved<Review>> {
        let now = (self.clock)();

        let existing_index = match input.id {
            Some(id) => {
                let index = self
                    .reviews
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or_else(|| Error::NotFound(format!("review {} does not exist", id)))?;

                // Retargeting an edit at an anime the user already reviewed
                // would leave two reviews for the same (user, anime) pair
                let collides = self.reviews.iter().any(|r| {
                    r.id != id && r.anime_id == input.anime_id && r.user_id == user_id
                });
                if collides {
                    return Err(Error::DuplicateEntry(input.anime_id));
                }

                Some(index)
            }
            None => self
                .reviews
                .iter()
                .position(|r| r.anime_id == input.anime_id && r.user_id == user_id),
        };

        let review = match existing_index {
            Some(index) => {
                let existing = &mut self.reviews[index];
                existing.anime_id = input.anime_id;
                existing.overall_rating = input.overall_rating;
                existing.sub_ratings = input.sub_ratings;
                existing.title = input.title;
                existing.body = input.body;
                existing.contains_spoilers = input.contains_spoilers;
                existing.watch_status = input.watch_status;
                existing.episodes_watched = input.episodes_watched;
                existing.tags = input.tags;
                existing.pros = input.pros;
                existing.cons = input.cons;
                existing.recommendation = input.recommendation;
                existing.lifecycle_status = lifecycle_status;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let review = Review {
                    id: Uuid::new_v4(),
                    anime_id: input.anime_id,
                    user_id: user_id.to_string(),
                    overall_rating: input.overall_rating,
                    sub_ratings: input.sub_ratings,
                    title: input.title,
                    body: input.body,
                    contains_spoilers: input.contains_spoilers,
                    watch_status: input.watch_status,
                    episodes_watched: input.episodes_watched,
                    tags: input.tags,
                    pros: input.pros,
                    cons: input.cons,
                    recommendation: input.recommendation,
                    lifecycle_status,
                    created_at: now,
                    updated_at: now,
                    helpful_votes: 0,
                };
                self.reviews.push(review.clone());
                review
            }
        };

        debug!(review_id = %review.id, anime_id = review.anime_id, status = ?lifecycle_status, "saved review");
        let persisted = self.persist();
        self.emit(StoreEvent::ReviewSaved {
            review_id: review.id,
            anime_id: review.anime_id,
            timestamp: now,
        });
        Ok(Saved {
            value: review,
            persisted,
        })
    }

    fn persist(&self) -> bool {
        let payload = match serde_json::to_string(&self.reviews) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "review region serialization failed");
                return false;
            }
        };
        match self.region.write(&payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "review region write failed, change not persisted");
                false
            }
        }
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

/// Collapse duplicate tags, keeping first-seen order
fn normalize_input(mut input: ReviewInput) -> ReviewInput {
    let mut tags: Vec<String> = Vec::with_capacity(input.tags.len());
    for tag in input.tags.drain(..) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    input.tags = tags;
    input
}

/// Structural checks that apply to drafts and published reviews alike
fn validate_structure(input: &ReviewInput) -> Result<()> {
    let mut v = ValidationError::new();
    if input.tags.len() > MAX_TAGS {
        v.add("tags", "too many");
    }
    if let Some(rating) = input.overall_rating {
        if !(1..=5).contains(&rating) {
            v.add("overallRating", "out of range");
        }
    }
    for (field, rating) in [
        ("story", input.sub_ratings.story),
        ("animation", input.sub_ratings.animation),
        ("sound", input.sub_ratings.sound),
        ("character", input.sub_ratings.character),
        ("enjoyment", input.sub_ratings.enjoyment),
    ] {
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                v.add(field, "out of range");
            }
        }
    }
    v.into_result()
}

/// Content requirements for publishing
fn validate_for_publish(input: &ReviewInput) -> Result<()> {
    let mut v = ValidationError::new();

    if input.overall_rating.is_none() {
        v.add("overallRating", "required");
    }

    let title_len = input.title.chars().count();
    if input.title.trim().is_empty() {
        v.add("title", "required");
    } else if title_len > MAX_TITLE_CHARS {
        v.add("title", "too long");
    }

    let body_len = input.body.chars().count();
    if body_len < MIN_BODY_CHARS {
        v.add("body", "too short");
    } else if body_len > MAX_BODY_CHARS {
        v.add("body", "too long");
    }

    v.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anidojo_common::storage::MemoryRegion;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    const USER: &str = "local";

    fn ticking_clock() -> Clock {
        let ticks = Arc::new(AtomicI64::new(0));
        Box::new(move || {
            let t = ticks.fetch_add(1, Ordering::SeqCst);
            DateTime::from_timestamp(1_700_000_000 + t, 0).unwrap()
        })
    }

    fn store() -> ReviewStore {
        ReviewStore::with_clock(Box::new(MemoryRegion::new()), ticking_clock())
    }

    fn input(anime_id: i64) -> ReviewInput {
        ReviewInput {
            id: None,
            anime_id,
            overall_rating: Some(4),
            sub_ratings: SubRatings::default(),
            title: "A thoughtful space western".to_string(),
            body: "b".repeat(200),
            contains_spoilers: false,
            watch_status: WatchStatus::Completed,
            episodes_watched: Some(26),
            tags: vec![],
            pros: vec![],
            cons: vec![],
            recommendation: Some(RecommendationLevel::Recommend),
        }
    }

    #[test]
    fn test_publish_creates_review() {
        let mut store = store();
        let saved = store.publish(USER, input(1)).unwrap();
        assert!(saved.persisted);
        assert_eq!(saved.value.lifecycle_status, ReviewStatus::Published);
        assert_eq!(saved.value.helpful_votes, 0);
        assert_eq!(saved.value.created_at, saved.value.updated_at);
    }

    #[test]
    fn test_publish_validation_failure_persists_nothing() {
        let region = Arc::new(MemoryRegion::new());

        struct Shared(Arc<MemoryRegion>);
        impl Region for Shared {
            fn read(&self) -> anidojo_common::Result<Option<String>> {
                self.0.read()
            }
            fn write(&self, payload: &str) -> anidojo_common::Result<()> {
                self.0.write(payload)
            }
        }

        let mut store =
            ReviewStore::with_clock(Box::new(Shared(region.clone())), ticking_clock());
        let mut bad = input(1);
        bad.title = String::new();
        bad.body = "x".repeat(40);

        match store.publish(USER, bad) {
            Err(Error::Validation(v)) => {
                assert_eq!(v.field("title"), Some("required"));
                assert_eq!(v.field("body"), Some("too short"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(store.is_empty());
        // Nothing was written to the region either
        assert!(region.read().unwrap().is_none());
    }

    #[test]
    fn test_publish_requires_rating() {
        let mut store = store();
        let mut bad = input(1);
        bad.overall_rating = None;
        match store.publish(USER, bad) {
            Err(Error::Validation(v)) => {
                assert_eq!(v.field("overallRating"), Some("required"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_draft_skips_content_validation() {
        let mut store = store();
        let mut draft = input(1);
        draft.title = String::new();
        draft.body = "short".to_string();
        draft.overall_rating = None;

        let saved = store.save_draft(USER, draft).unwrap();
        assert_eq!(saved.value.lifecycle_status, ReviewStatus::Draft);
    }

    #[test]
    fn test_one_review_per_user_anime_pair() {
        let mut store = store();
        let first = store.save_draft(USER, input(1)).unwrap().value;

        // Saving again without an id still updates the same review
        let mut again = input(1);
        again.title = "Revised title".to_string();
        let second = store.save_draft(USER, again).unwrap().value;

        assert_eq!(store.len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.title, "Revised title");
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_update_by_id_preserves_created_at_and_votes() {
        let mut store = store();
        let created = store.publish(USER, input(1)).unwrap().value;
        store.mark_helpful(created.id).unwrap();

        let mut edit = input(1);
        edit.id = Some(created.id);
        edit.body = "c".repeat(150);
        let updated = store.publish(USER, edit).unwrap().value;

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.helpful_votes, 1);
    }

    #[test]
    fn test_edit_cannot_retarget_onto_already_reviewed_anime() {
        let mut store = store();
        store.publish(USER, input(1)).unwrap();
        let b = store.publish(USER, input(2)).unwrap().value;

        // Editing review B to point at anime 1 would leave two reviews for
        // (local, anime 1)
        let mut edit = input(1);
        edit.id = Some(b.id);
        match store.publish(USER, edit) {
            Err(Error::DuplicateEntry(1)) => {}
            other => panic!("expected duplicate error, got {:?}", other),
        }

        // Store unchanged: still one review per anime
        assert_eq!(store.len(), 2);
        assert_eq!(
            store
                .snapshot()
                .iter()
                .filter(|r| r.anime_id == 1 && r.user_id == USER)
                .count(),
            1
        );
        assert_eq!(store.get(b.id).unwrap().anime_id, 2);
    }

    #[test]
    fn test_edit_keeping_its_own_anime_id_is_fine() {
        let mut store = store();
        let created = store.publish(USER, input(1)).unwrap().value;

        let mut edit = input(1);
        edit.id = Some(created.id);
        edit.title = "Second thoughts".to_string();
        let updated = store.publish(USER, edit).unwrap().value;

        assert_eq!(store.len(), 1);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Second thoughts");
    }

    #[test]
    fn test_save_with_unknown_id_is_not_found() {
        let mut store = store();
        let mut edit = input(1);
        edit.id = Some(Uuid::new_v4());
        assert!(matches!(
            store.save_draft(USER, edit),
            Err(Error::NotFound(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_different_users_can_review_same_anime() {
        let mut store = store();
        store.save_draft("alice", input(1)).unwrap();
        store.save_draft("bob", input(1)).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.find_by_anime(1, "alice").is_some());
        assert!(store.find_by_anime(1, "bob").is_some());
        assert!(store.find_by_anime(1, "carol").is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = store();
        let review = store.publish(USER, input(1)).unwrap().value;

        assert_eq!(store.delete(review.id).value, RemoveOutcome::Removed);
        assert_eq!(store.delete(review.id).value, RemoveOutcome::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn test_bulk_delete_ignores_absent_ids() {
        let mut store = store();
        let a = store.publish(USER, input(1)).unwrap().value;
        let b = store.publish(USER, input(2)).unwrap().value;
        let c = store.publish(USER, input(3)).unwrap().value;

        let saved = store.bulk_delete(&[a.id, c.id, Uuid::new_v4()]);
        assert_eq!(saved.value, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].id, b.id);
    }

    #[test]
    fn test_mark_helpful_never_decrements() {
        let mut store = store();
        let review = store.publish(USER, input(1)).unwrap().value;
        store.mark_helpful(review.id).unwrap();
        store.mark_helpful(review.id).unwrap();
        assert_eq!(store.get(review.id).unwrap().helpful_votes, 2);
    }

    #[test]
    fn test_mark_helpful_missing_review_is_not_found() {
        let mut store = store();
        assert!(matches!(
            store.mark_helpful(Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_title_too_long_rejected_on_publish() {
        let mut store = store();
        let mut bad = input(1);
        bad.title = "t".repeat(101);
        match store.publish(USER, bad) {
            Err(Error::Validation(v)) => assert_eq!(v.field("title"), Some("too long")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_body_too_long_rejected_on_publish() {
        let mut store = store();
        let mut bad = input(1);
        bad.body = "b".repeat(10_001);
        match store.publish(USER, bad) {
            Err(Error::Validation(v)) => assert_eq!(v.field("body"), Some("too long")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_rating_out_of_range_rejected_even_for_drafts() {
        let mut store = store();
        let mut bad = input(1);
        bad.sub_ratings.story = Some(6);
        match store.save_draft(USER, bad) {
            Err(Error::Validation(v)) => assert_eq!(v.field("story"), Some("out of range")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
