//! Search and recommendation history
//!
//! Two small persisted regions alongside the main stores: the user's recent
//! search terms (most recent first, capped) and saved recommendation sets.
//! Same persistence discipline as the stores: whole-region rewrite on every
//! mutation, tolerant loading, change event afterwards.

use anidojo_common::events::{self, StoreEvent};
use anidojo_common::models::AnimeSummary;
use anidojo_common::storage::{
    load_collection, Region, RECOMMENDATION_HISTORY_REGION, SEARCH_HISTORY_REGION,
};
use anidojo_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::recommend::RecommendationFilters;
use crate::{RemoveOutcome, Saved};

/// How many recent search terms are kept
pub const MAX_SEARCH_TERMS: usize = 10;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Recent search terms, most recent first
pub struct SearchHistory {
    terms: Vec<String>,
    region: Box<dyn Region>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
}

impl SearchHistory {
    pub fn open(region: Box<dyn Region>) -> Self {
        Self::with_clock(region, Box::new(Utc::now))
    }

    pub fn with_clock(region: Box<dyn Region>, clock: Clock) -> Self {
        let terms = load_collection(region.as_ref(), SEARCH_HISTORY_REGION);
        let (events, _) = events::channel();
        Self {
            terms,
            region,
            events,
            clock,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Terms, most recent first
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Record a search. Repeating an existing term moves it to the front;
    /// the list is capped at `MAX_SEARCH_TERMS`. Blank input is ignored.
    pub fn record(&mut self, term: &str) -> Saved<()> {
        let term = term.trim();
        if term.is_empty() {
            return Saved {
                value: (),
                persisted: true,
            };
        }

        self.terms.retain(|t| t != term);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(MAX_SEARCH_TERMS);

        let persisted = self.persist();
        let _ = self.events.send(StoreEvent::SearchHistoryChanged {
            timestamp: (self.clock)(),
        });
        Saved {
            value: (),
            persisted,
        }
    }

    /// Forget everything
    pub fn clear(&mut self) -> Saved<()> {
        self.terms.clear();
        let persisted = self.persist();
        let _ = self.events.send(StoreEvent::SearchHistoryChanged {
            timestamp: (self.clock)(),
        });
        Saved {
            value: (),
            persisted,
        }
    }

    fn persist(&self) -> bool {
        persist_region(self.region.as_ref(), &self.terms, "search history")
    }
}

/// One saved recommendation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    /// Mood ids the run was scored against
    pub moods: Vec<String>,
    pub filters: RecommendationFilters,
    /// The ranked results as shown, top pick first
    pub recommendations: Vec<AnimeSummary>,
    /// Optional user-given name
    pub name: Option<String>,
}

/// Saved recommendation sets, most recent first
pub struct RecommendationHistory {
    sets: Vec<RecommendationSet>,
    region: Box<dyn Region>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
}

impl RecommendationHistory {
    pub fn open(region: Box<dyn Region>) -> Self {
        Self::with_clock(region, Box::new(Utc::now))
    }

    pub fn with_clock(region: Box<dyn Region>, clock: Clock) -> Self {
        let sets = load_collection(region.as_ref(), RECOMMENDATION_HISTORY_REGION);
        let (events, _) = events::channel();
        Self {
            sets,
            region,
            events,
            clock,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Saved sets, most recent first
    pub fn sets(&self) -> &[RecommendationSet] {
        &self.sets
    }

    /// Save one recommendation run
    pub fn save(
        &mut self,
        moods: Vec<String>,
        filters: RecommendationFilters,
        recommendations: Vec<AnimeSummary>,
    ) -> Saved<RecommendationSet> {
        let set = RecommendationSet {
            id: Uuid::new_v4(),
            date: (self.clock)(),
            moods,
            filters,
            recommendations,
            name: None,
        };
        self.sets.insert(0, set.clone());

        let persisted = self.persist();
        self.emit();
        Saved {
            value: set,
            persisted,
        }
    }

    /// Give a saved set a name
    pub fn rename(&mut self, id: Uuid, name: &str) -> Result<Saved<RecommendationSet>> {
        let set = self
            .sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("recommendation set {} does not exist", id)))?;

        set.name = Some(name.to_string());
        let renamed = set.clone();

        let persisted = self.persist();
        self.emit();
        Ok(Saved {
            value: renamed,
            persisted,
        })
    }

    /// Delete one set. Idempotent.
    pub fn delete(&mut self, id: Uuid) -> Saved<RemoveOutcome> {
        let before = self.sets.len();
        self.sets.retain(|s| s.id != id);

        if self.sets.len() == before {
            return Saved {
                value: RemoveOutcome::NotFound,
                persisted: true,
            };
        }

        let persisted = self.persist();
        self.emit();
        Saved {
            value: RemoveOutcome::Removed,
            persisted,
        }
    }

    fn persist(&self) -> bool {
        persist_region(self.region.as_ref(), &self.sets, "recommendation history")
    }

    fn emit(&self) {
        let _ = self.events.send(StoreEvent::RecommendationHistoryChanged {
            timestamp: (self.clock)(),
        });
    }
}

/// Shared whole-region rewrite with the persist-failure contract
fn persist_region<T: Serialize>(region: &dyn Region, items: &[T], what: &str) -> bool {
    let payload = match serde_json::to_string(items) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(region = what, error = %e, "region serialization failed");
            return false;
        }
    };
    match region.write(&payload) {
        Ok(()) => true,
        Err(e) => {
            warn!(region = what, error = %e, "region write failed, change not persisted");
            false
        }
    }
}
