//! Import report models.
//!
//! An [`ImportReport`] holds one [`RowOutcome`] per row the importer attempted
//! or rejected, in source order, so it can be printed line by line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::node::BomNode;

/// Reason text recorded for a node whose ancestor part failed to resolve.
pub const PARENT_UNRESOLVED: &str = "parent unresolved";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Why a row failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Same part number repeated under the same parent
    DuplicatePartAtLevel,
    /// Row sat below a discarded duplicate
    DiscardedWithDuplicate,
    PartCreation,
    LinkCreation,
    /// An ancestor's part never resolved, so no link was attempted
    ParentUnresolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowOutcome {
    pub row_number: usize,
    pub part_number: String,
    pub level: u32,
    pub outcome: Outcome,
    pub failure: Option<FailureKind>,
    pub reason: Option<String>,
}

impl RowOutcome {
    pub fn success(node: &BomNode) -> Self {
        Self {
            row_number: node.row_number,
            part_number: node.part_number.clone(),
            level: node.level,
            outcome: Outcome::Success,
            failure: None,
            reason: None,
        }
    }

    pub fn failure(
        row_number: usize,
        part_number: impl Into<String>,
        level: u32,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            part_number: part_number.into(),
            level,
            outcome: Outcome::Failure,
            failure: Some(kind),
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

impl std::fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let row = if self.row_number == 0 {
            "top".to_string()
        } else {
            format!("row {}", self.row_number)
        };
        match self.outcome {
            Outcome::Success => {
                write!(f, "[OK]   {} level {} {}", row, self.level, self.part_number)
            }
            Outcome::Failure => write!(
                f,
                "[FAIL] {} level {} {}: {}",
                row,
                self.level,
                self.part_number,
                self.reason.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of one import run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<RowOutcome>,
    pub parts_created: usize,
    pub parts_reused: usize,
    pub links_created: usize,
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            parts_created: 0,
            parts_reused: 0,
            links_created: 0,
        }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    /// Merges outcomes recorded elsewhere, keeping source row order.
    pub fn merge(&mut self, outcomes: impl IntoIterator<Item = RowOutcome>) {
        self.outcomes.extend(outcomes);
        // Stable, so equal row numbers keep their recorded order
        self.outcomes.sort_by_key(|o| o.row_number);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn summary(&self) -> ImportSummary {
        let succeeded = self.outcomes.iter().filter(|o| o.is_success()).count();
        ImportSummary {
            total: self.outcomes.len(),
            succeeded,
            failed: self.outcomes.len() - succeeded,
        }
    }
}
