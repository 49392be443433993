//! Core domain types for pagetally
//!
//! These types are the canonical records held by the [`Store`] and the
//! loosely-typed inputs accepted at the HTTP boundary.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **PageView** | A single page load reported by a tracked site |
//! | **Event** | A named custom action (click, signup, ...) with open properties |
//! | **User** | A registered visitor, keyed by `userId` |
//! | **Session** | A visit grouping; present in the snapshot shape but not yet populated |
//! | **Snapshot** | The complete persisted JSON form of the store |
//!
//! ## Wire format
//!
//! Everything crosses the HTTP boundary and lands in the snapshot file
//! as camelCase JSON, so all records serialize with
//! `rename_all = "camelCase"`.
//!
//! ## Input records
//!
//! The `*Input` types mirror the stored records with every field
//! optional. Absent fields are defaulted at ingest time rather than
//! rejected; the only rejection path is malformed JSON at the
//! transport boundary.
//!
//! [`Store`]: crate::store::Store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ============================================
// Id generation
// ============================================

/// Generate a fresh record id: millisecond epoch prefix plus a random
/// UUIDv4 suffix.
///
/// Unique with overwhelming probability across the process lifetime;
/// no counter or lock involved. The time prefix keeps ids roughly
/// sortable when eyeballing the snapshot file.
pub fn fresh_id(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

// ============================================
// Page views
// ============================================

/// A single page load reported by a tracked site.
///
/// Immutable once created; the store only ever appends these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    /// Unique identifier (see [`fresh_id`])
    pub id: String,
    /// When the view happened
    pub timestamp: DateTime<Utc>,
    /// Page path, e.g. "/pricing"
    pub page: String,
    /// Reporting user, "anonymous" when not identified
    pub user_id: String,
    /// Session this view belongs to; generated when the client sends none
    pub session_id: String,
    /// Referrer URL, may be empty
    #[serde(default)]
    pub referrer: String,
    /// Browser user-agent string, may be empty
    #[serde(default)]
    pub user_agent: String,
}

/// Loosely-typed page view input as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewInput {
    pub page: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    /// Explicit timestamp for backfilled data; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================
// Events
// ============================================

/// A named custom action with open-ended properties.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier (see [`fresh_id`])
    pub id: String,
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Event name, "custom_event" when the client sends none
    pub event_name: String,
    /// Grouping category, "general" when the client sends none
    pub category: String,
    /// Reporting user, "anonymous" when not identified
    pub user_id: String,
    /// Session this event belongs to; generated when the client sends none
    pub session_id: String,
    /// Arbitrary JSON properties attached by the client
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Loosely-typed event input as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub event_name: Option<String>,
    pub category: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub properties: Option<Map<String, Value>>,
    /// Explicit timestamp for backfilled data; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================
// Users
// ============================================

/// A registered visitor, keyed by `user_id`.
///
/// Mutable through [`register_user`]: re-registering the same
/// `user_id` overwrites email, name and metadata and bumps
/// `last_seen`, but `registered_at` is set once and never changes.
///
/// [`register_user`]: crate::ingest::register_user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique key across the users sequence
    pub user_id: String,
    /// Contact email, may be empty
    #[serde(default)]
    pub email: String,
    /// Display name, may be empty
    #[serde(default)]
    pub name: String,
    /// First registration time; never overwritten
    pub registered_at: DateTime<Utc>,
    /// Most recent registration time
    pub last_seen: DateTime<Utc>,
    /// Open metadata; replaced wholesale on each registration, not merged
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Loosely-typed user registration input as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

// ============================================
// Sessions
// ============================================

/// A visit grouping.
///
/// Declared in the persisted snapshot shape but not populated by any
/// current operation; kept so existing snapshot files stay valid once
/// session tracking lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier
    pub id: String,
    /// User this session belongs to
    pub user_id: String,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// Most recent activity in the session
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Extensible metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}
