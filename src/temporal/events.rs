//! Event sequences — an ordered log of labelled events grouped into
//! sequences, used to mine recurring patterns. Orthogonal to edge
//! invalidation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::types::{GraphError, GraphResult};

/// One event inside a sequence.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceEvent {
    /// Stable identifier.
    pub id: String,
    /// Event label ("ordered_coffee", "boarded_train", ...).
    pub label: String,
    /// When the event was recorded.
    pub at: DateTime<Utc>,
    /// Ids of events this one was caused by.
    pub caused_by: Vec<String>,
}

/// An ordered group of events.
#[derive(Debug, Clone, Serialize)]
pub struct EventSequence {
    /// Stable identifier.
    pub id: String,
    /// Sequence name ("morning_commute", ...).
    pub name: String,
    /// When the sequence was started.
    pub started_at: DateTime<Utc>,
    /// When the sequence was completed, if it has been.
    pub completed_at: Option<DateTime<Utc>>,
    /// Events in recording order.
    pub events: Vec<SequenceEvent>,
}

/// A recurring label pattern mined from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPattern {
    /// The consecutive labels forming the pattern.
    pub labels: Vec<String>,
    /// How many times the pattern occurs across all sequences.
    pub occurrences: usize,
}

/// The event-sequence log.
pub struct EventSequenceLog {
    sequences: HashMap<String, EventSequence>,
    order: Vec<String>,
}

impl EventSequenceLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            sequences: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Start a new sequence, returning its id.
    pub fn start_sequence(&mut self, name: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sequences.insert(
            id.clone(),
            EventSequence {
                id: id.clone(),
                name: name.into(),
                started_at: Utc::now(),
                completed_at: None,
                events: Vec::new(),
            },
        );
        self.order.push(id.clone());
        id
    }

    /// Append an event to an open sequence, returning the event id.
    pub fn add_event(
        &mut self,
        sequence_id: &str,
        label: impl Into<String>,
        caused_by: Vec<String>,
    ) -> GraphResult<String> {
        let sequence = self
            .sequences
            .get_mut(sequence_id)
            .ok_or_else(|| GraphError::InvalidArgument(format!(
                "unknown sequence {sequence_id}"
            )))?;
        if sequence.completed_at.is_some() {
            return Err(GraphError::InvalidArgument(format!(
                "sequence {sequence_id} is already completed"
            )));
        }
        let id = uuid::Uuid::new_v4().to_string();
        sequence.events.push(SequenceEvent {
            id: id.clone(),
            label: label.into(),
            at: Utc::now(),
            caused_by,
        });
        Ok(id)
    }

    /// Mark a sequence completed. Completing twice is a no-op.
    pub fn complete_sequence(&mut self, sequence_id: &str) -> GraphResult<()> {
        let sequence = self
            .sequences
            .get_mut(sequence_id)
            .ok_or_else(|| GraphError::InvalidArgument(format!(
                "unknown sequence {sequence_id}"
            )))?;
        if sequence.completed_at.is_none() {
            sequence.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Get a sequence by id.
    pub fn get(&self, sequence_id: &str) -> Option<&EventSequence> {
        self.sequences.get(sequence_id)
    }

    /// All sequences in start order. Copies.
    pub fn all(&self) -> Vec<EventSequence> {
        self.order
            .iter()
            .filter_map(|id| self.sequences.get(id))
            .cloned()
            .collect()
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Mine recurring consecutive label pairs across all sequences.
    /// Returns patterns with at least `min_occurrences` occurrences,
    /// most frequent first.
    pub fn recurring_patterns(&self, min_occurrences: usize) -> Vec<EventPattern> {
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for sequence in self.sequences.values() {
            for pair in sequence.events.windows(2) {
                let key = (pair[0].label.clone(), pair[1].label.clone());
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        let mut patterns: Vec<EventPattern> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|((a, b), occurrences)| EventPattern {
                labels: vec![a, b],
                occurrences,
            })
            .collect();
        patterns.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.labels.cmp(&b.labels)));
        patterns
    }

    /// Clear the log.
    pub fn clear(&mut self) {
        self.sequences.clear();
        self.order.clear();
    }
}

impl Default for EventSequenceLog {
    fn default() -> Self {
        Self::new()
    }
}
