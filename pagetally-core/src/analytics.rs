//! Aggregation queries over the store
//!
//! Plain filter/group/count logic over the in-memory sequences. Two
//! queries: trailing-window [`statistics`] and per-user
//! [`user_journey`]. Both read a [`Store`] handle and never mutate.
//!
//! ## Window semantics
//!
//! The window is `[now - hours, ∞)`: an inclusive lower bound with no
//! upper bound, where "now" is evaluated once per call. Zero or
//! negative hours places the bound at or after now, which typically
//! yields empty windows; that is a valid query, not an error. Windows
//! wider than the representable time range clamp to the datetime
//! bounds instead of overflowing.

use crate::store::Store;
use crate::types::{Event, PageView};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Window length used when the caller supplies no usable `hours`.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Aggregate statistics over a trailing time window.
///
/// The breakdown maps iterate in first-occurrence insertion order,
/// not sorted; consumers that want a ranking sort for themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Window length this was computed for
    pub period_hours: i64,
    /// Start of the window (now - periodHours at call time)
    pub since: DateTime<Utc>,
    /// Page views inside the window
    pub total_page_views: usize,
    /// Events inside the window
    pub total_events: usize,
    /// Distinct userIds among windowed page views. Users that appear
    /// only in events are deliberately not counted; changing this
    /// would change observable statistics.
    pub unique_users: usize,
    /// All-time registered user count, unfiltered
    pub total_users: usize,
    /// Page path → view count, restricted to the window
    pub page_views: Map<String, Value>,
    /// Event name → count, restricted to the window
    pub events: Map<String, Value>,
}

/// A single user's activity, time-ordered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJourney {
    pub user_id: String,
    /// Page views for the user, ascending by timestamp
    pub page_views: Vec<PageView>,
    /// Events for the user, ascending by timestamp
    pub events: Vec<Event>,
    /// len(pageViews) + len(events)
    pub total_actions: usize,
}

/// Compute aggregate statistics for the trailing `hours` window.
pub fn statistics(store: &Store, hours: i64) -> Statistics {
    let since = window_start(Utc::now(), hours);

    let windowed_views: Vec<&PageView> = store
        .page_views()
        .iter()
        .filter(|pv| pv.timestamp >= since)
        .collect();
    let windowed_events: Vec<&Event> = store
        .events()
        .iter()
        .filter(|e| e.timestamp >= since)
        .collect();

    let unique_users: HashSet<&str> = windowed_views
        .iter()
        .map(|pv| pv.user_id.as_str())
        .collect();

    let mut page_breakdown = Map::new();
    for pv in &windowed_views {
        bump(&mut page_breakdown, &pv.page);
    }

    let mut event_breakdown = Map::new();
    for event in &windowed_events {
        bump(&mut event_breakdown, &event.event_name);
    }

    Statistics {
        period_hours: hours,
        since,
        total_page_views: windowed_views.len(),
        total_events: windowed_events.len(),
        unique_users: unique_users.len(),
        total_users: store.users().len(),
        page_views: page_breakdown,
        events: event_breakdown,
    }
}

/// Collect the time-ordered journey of a single user.
///
/// No window is applied. The sorts are stable, so records with equal
/// timestamps keep their insertion order. An unknown `user_id` yields
/// an empty journey rather than an error.
pub fn user_journey(store: &Store, user_id: &str) -> UserJourney {
    let mut page_views: Vec<PageView> = store
        .page_views()
        .iter()
        .filter(|pv| pv.user_id == user_id)
        .cloned()
        .collect();
    let mut events: Vec<Event> = store
        .events()
        .iter()
        .filter(|e| e.user_id == user_id)
        .cloned()
        .collect();

    page_views.sort_by_key(|pv| pv.timestamp);
    events.sort_by_key(|e| e.timestamp);

    let total_actions = page_views.len() + events.len();
    UserJourney {
        user_id: user_id.to_string(),
        page_views,
        events,
        total_actions,
    }
}

/// Compute `now - hours`, clamping instead of overflowing.
///
/// `hours` arrives unchecked from the query string, so extreme values
/// must not panic: a window wider than the representable past clamps
/// to the minimum datetime (everything included), and a huge negative
/// value clamps to the maximum (nothing included).
fn window_start(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(if hours >= 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// Increment an integer tally inside a JSON map, starting at 1.
fn bump(map: &mut Map<String, Value>, key: &str) {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::from(0u64));
    let next = slot.as_u64().unwrap_or(0) + 1;
    *slot = Value::from(next);
}
