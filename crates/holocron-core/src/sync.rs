//! Outcome and report types for sync runs.
//!
//! Pure bookkeeping, no I/O. The coordinator in `holocron-db` fills these in.

use std::time::Duration;

use serde::Serialize;

/// What the upsert engine did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row matched the natural key; one was inserted.
    Created(i64),
    /// An existing row was found and brought up to date.
    Updated(i64),
}

impl UpsertOutcome {
    /// Local id of the affected row.
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

/// Per-kind counters for one sync run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.created += 1,
            UpsertOutcome::Updated(_) => self.updated += 1,
        }
    }

    /// Returns the total number of processed records.
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Result of a committed sync run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    pub bodies: SyncStats,
    pub productions: SyncStats,
    pub characters: SyncStats,
    /// Cross-references that named a record absent from the fetched data.
    pub dangling_references: usize,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records processed across all three kinds.
    pub fn total(&self) -> usize {
        self.bodies.total() + self.productions.total() + self.characters.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_stats_default() {
        let stats = SyncStats::new();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_sync_stats_record() {
        let mut stats = SyncStats::new();
        stats.record(UpsertOutcome::Created(1));
        stats.record(UpsertOutcome::Created(2));
        stats.record(UpsertOutcome::Updated(1));

        assert_eq!(stats.created, 2);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_upsert_outcome_id() {
        assert_eq!(UpsertOutcome::Created(7).id(), 7);
        assert_eq!(UpsertOutcome::Updated(9).id(), 9);
    }

    #[test]
    fn test_report_total() {
        let report = SyncReport {
            bodies: SyncStats {
                created: 3,
                updated: 1,
            },
            productions: SyncStats {
                created: 0,
                updated: 2,
            },
            characters: SyncStats {
                created: 5,
                updated: 0,
            },
            dangling_references: 1,
            duration: Duration::ZERO,
        };
        assert_eq!(report.total(), 11);
    }

    #[test]
    fn test_report_serializes_without_duration() {
        let value = serde_json::to_value(SyncReport::new()).unwrap();
        assert_eq!(value["bodies"]["created"], 0);
        assert!(value.get("duration").is_none());
    }
}
