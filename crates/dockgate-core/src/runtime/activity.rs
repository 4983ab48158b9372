// crates/dockgate-core/src/runtime/activity.rs
// ============================================================================
// Module: Dockgate Activity Log
// Description: Bounded in-memory record of recent operator activity.
// Purpose: Back the `recentActivity` field of the status surface.
// Dependencies: time
// ============================================================================

//! ## Overview
//! [`ActivityLog`] keeps the newest entries up to a fixed capacity, each
//! stamped with an RFC 3339 UTC timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Mutex;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of retained entries.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

// ============================================================================
// SECTION: Activity Log
// ============================================================================

/// Bounded FIFO of formatted activity lines.
#[derive(Debug)]
pub struct ActivityLog {
    /// Entries, oldest first.
    entries: Mutex<VecDeque<String>>,
    /// Maximum retained entries.
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl ActivityLog {
    /// Creates a log retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn record(&self, text: impl AsRef<str>) {
        if self.capacity == 0 {
            return;
        }
        let line = format!("{} {}", timestamp(), text.as_ref());
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(line);
    }

    /// Returns entries oldest first.
    #[must_use]
    pub fn recent(&self) -> Vec<String> {
        self.entries.lock().map(|entries| entries.iter().cloned().collect()).unwrap_or_default()
    }
}

/// Formats the current UTC time as RFC 3339.
fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
