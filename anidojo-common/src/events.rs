//! Store change events
//!
//! Every successful store mutation emits one event after persisting, so the
//! presentation layer can subscribe and redraw. The core never depends on a
//! subscriber being present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast channel capacity for store events.
///
/// Subscribers that fall further behind than this lose the oldest events;
/// they can always recover by re-reading the store snapshot.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// AniDojo store change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// A list entry was added
    ListEntryAdded {
        anime_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A list entry was updated (quick edit, episode increment, favorite
    /// toggle)
    ListEntryUpdated {
        anime_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// One or more list entries were removed
    ListEntriesRemoved {
        anime_ids: Vec<i64>,
        timestamp: DateTime<Utc>,
    },

    /// A review was created or saved (draft or published)
    ReviewSaved {
        review_id: Uuid,
        anime_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// One or more reviews were deleted
    ReviewsDeleted {
        review_ids: Vec<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// Search history changed
    SearchHistoryChanged {
        timestamp: DateTime<Utc>,
    },

    /// Recommendation history changed
    RecommendationHistoryChanged {
        timestamp: DateTime<Utc>,
    },
}

/// Create the store event channel.
///
/// The sender lives inside a store; receivers belong to the presentation
/// layer.
pub fn channel() -> (broadcast::Sender<StoreEvent>, broadcast::Receiver<StoreEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
