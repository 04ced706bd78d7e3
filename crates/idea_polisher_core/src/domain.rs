//! crates/idea_polisher_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The category a draft falls back to before classification has run.
pub const DEFAULT_CATEGORY: &str = "General";

/// The lifecycle of the primary "polish" flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStatus {
    Idle,
    Polishing,
    Success,
    Error,
}

/// The user's working text plus everything derived from it.
///
/// At most one draft is live at a time; a new polish request replaces the
/// outline, expansion and category together, never piecemeal.
#[derive(Debug, Clone)]
pub struct Draft {
    pub raw_notes: String,
    pub polished_outline: String,
    pub expansion_ideas: String,
    pub category: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            raw_notes: String::new(),
            polished_outline: String::new(),
            expansion_ideas: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Represents an authenticated user, as reported by the hosted auth service.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// A persisted snapshot of a draft. Created on an explicit archive action
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ArchivedItem {
    pub user_id: Uuid,
    pub title: String,
    pub original_notes: String,
    pub polished_outline: String,
    pub expansion_ideas: String,
    pub recipient_email: Option<String>,
    pub category: String,
    pub archive_id: String,
    pub created_at: DateTime<Utc>,
}

/// Audio handed back by a capture handle when it stops.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}
