//! Ingest operations: validate, default, append, persist
//!
//! Each operation takes a mutable [`Store`] handle, applies the input
//! with its defaults, persists the whole snapshot, and returns the
//! stored record so the HTTP layer can echo it back.
//!
//! Inputs are loosely typed: any absent field is defaulted rather than
//! rejected. The only rejection path is malformed JSON, which never
//! reaches these functions.

use crate::store::Store;
use crate::types::{fresh_id, Event, EventInput, PageView, PageViewInput, User, UserInput};
use chrono::Utc;
use serde_json::Map;

/// Record a page view.
///
/// Defaults: `page` → "/", `userId` → "anonymous", `sessionId` →
/// freshly generated, `referrer`/`userAgent` → empty, `timestamp` →
/// now. Appends to the page view sequence and persists.
pub fn track_page_view(store: &mut Store, input: PageViewInput) -> PageView {
    let page_view = PageView {
        id: fresh_id("pv"),
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
        page: input.page.unwrap_or_else(|| "/".to_string()),
        user_id: input.user_id.unwrap_or_else(|| "anonymous".to_string()),
        session_id: input.session_id.unwrap_or_else(|| fresh_id("sess")),
        referrer: input.referrer.unwrap_or_default(),
        user_agent: input.user_agent.unwrap_or_default(),
    };

    tracing::debug!(id = %page_view.id, page = %page_view.page, "Tracking page view");
    store.push_page_view(page_view.clone());
    store.save();
    page_view
}

/// Record a custom event.
///
/// Defaults: `eventName` → "custom_event", `category` → "general",
/// `userId` → "anonymous", `sessionId` → freshly generated,
/// `properties` → empty, `timestamp` → now.
pub fn track_event(store: &mut Store, input: EventInput) -> Event {
    let event = Event {
        id: fresh_id("evt"),
        timestamp: input.timestamp.unwrap_or_else(Utc::now),
        event_name: input
            .event_name
            .unwrap_or_else(|| "custom_event".to_string()),
        category: input.category.unwrap_or_else(|| "general".to_string()),
        user_id: input.user_id.unwrap_or_else(|| "anonymous".to_string()),
        session_id: input.session_id.unwrap_or_else(|| fresh_id("sess")),
        properties: input.properties.unwrap_or_default(),
    };

    tracing::debug!(id = %event.id, event_name = %event.event_name, "Tracking event");
    store.push_event(event.clone());
    store.save();
    event
}

/// Register a user, or update an existing one (upsert by `userId`).
///
/// Existing user: email, name and metadata are overwritten (metadata
/// replaced wholesale, never merged), `lastSeen` is bumped and
/// `registeredAt` is preserved. New user: a `userId` is synthesized
/// when absent and `registeredAt` = `lastSeen` = now.
pub fn register_user(store: &mut Store, input: UserInput) -> User {
    let now = Utc::now();
    let user_id = input.user_id.unwrap_or_else(|| fresh_id("user"));
    let email = input.email.unwrap_or_default();
    let name = input.name.unwrap_or_default();
    let metadata = input.metadata.unwrap_or_else(Map::new);

    // Linear-scan upsert; the users sequence is small by design.
    let stored = match store.users().iter().position(|u| u.user_id == user_id) {
        Some(idx) => {
            let user = &mut store.users_mut()[idx];
            user.email = email;
            user.name = name;
            user.metadata = metadata;
            user.last_seen = now;
            tracing::debug!(user_id = %user.user_id, "Updated existing user");
            user.clone()
        }
        None => {
            let user = User {
                user_id,
                email,
                name,
                registered_at: now,
                last_seen: now,
                metadata,
            };
            tracing::debug!(user_id = %user.user_id, "Registered new user");
            store.push_user(user.clone());
            user
        }
    };

    store.save();
    stored
}
