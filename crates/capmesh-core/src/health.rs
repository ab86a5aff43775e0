// crates/capmesh-core/src/health.rs
// ============================================================================
// Module: Health Records
// Description: Bounded per-service history of health observations.
// Purpose: Track liveness and recent outcomes for registered capabilities.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Each registered capability instance owns an [`ActivityRecord`]: a last-seen
//! timestamp plus a capacity-bounded [`HealthHistory`] ring of
//! [`HealthRecord`] observations. Records are ordered by insertion; the ring
//! evicts the oldest record first once it reaches capacity. Appends never
//! fail and never grow beyond the configured capacity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::identifiers::ServiceId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel reason recorded for healthy observations.
pub const HEALTHY_REASON: &str = "healthy";

/// Default bound on the number of retained health records per service.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

// ============================================================================
// SECTION: Health Record
// ============================================================================

/// One health observation for a capability instance.
///
/// # Invariants
/// - `reason` is the [`HEALTHY_REASON`] sentinel when `healthy` is true.
/// - `timestamp` reflects observation creation, not arrival; ordering is by
///   insertion into the history, not by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Time the observation was produced.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Whether the service considered the observed operation successful.
    pub healthy: bool,
    /// Sentinel when healthy, free-text cause otherwise.
    pub reason: String,
}

impl HealthRecord {
    /// Creates a healthy observation stamped with the current time.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            healthy: true,
            reason: HEALTHY_REASON.to_string(),
        }
    }

    /// Creates an unhealthy observation with a cause.
    #[must_use]
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            healthy: false,
            reason: reason.into(),
        }
    }

    /// Creates the record appended when a service deregisters.
    #[must_use]
    pub fn inactive() -> Self {
        Self::unhealthy("service deregistered")
    }

    /// Creates the record synthesized for services that registered but never
    /// reported state or pinged.
    #[must_use]
    pub fn missing_in_action() -> Self {
        Self::unhealthy("service registered but never reported state")
    }
}

// ============================================================================
// SECTION: Health History
// ============================================================================

/// Capacity-bounded FIFO ring of health records.
///
/// # Invariants
/// - Never holds more than `capacity` records.
/// - Eviction is strictly oldest-first; insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthHistory {
    /// Retained records, oldest first.
    records: VecDeque<HealthRecord>,
    /// Maximum number of retained records.
    capacity: usize,
}

impl HealthHistory {
    /// Creates an empty history with the given capacity.
    ///
    /// A zero capacity is clamped to one so appends remain observable.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest when at capacity.
    pub fn push(&mut self, record: HealthRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Returns up to `limit` records, most recent first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HealthRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Returns the number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HealthHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

// ============================================================================
// SECTION: Activity Record
// ============================================================================

/// Liveness summary for one registered capability instance.
///
/// # Invariants
/// - `id` matches the owning registry entry.
/// - `last_seen` is refreshed by pings and registration, never rewound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Identifier of the instance this record belongs to.
    pub id: ServiceId,
    /// Last time the instance registered or pinged.
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    /// Whether the instance is considered active.
    pub active: bool,
    /// Bounded ring of health observations.
    pub states: HealthHistory,
}

impl ActivityRecord {
    /// Creates a fresh record for a newly registered instance.
    #[must_use]
    pub fn new(id: ServiceId, history_capacity: usize) -> Self {
        Self {
            id,
            last_seen: OffsetDateTime::now_utc(),
            active: true,
            states: HealthHistory::with_capacity(history_capacity),
        }
    }

    /// Marks the instance as seen now and active.
    pub fn touch(&mut self) {
        self.last_seen = OffsetDateTime::now_utc();
        self.active = true;
    }

    /// Marks the instance as gone after deregistration.
    pub fn retire(&mut self) {
        self.last_seen = OffsetDateTime::now_utc();
        self.active = false;
        self.states.push(HealthRecord::inactive());
    }
}
