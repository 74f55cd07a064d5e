use std::collections::HashMap;

use crate::types::*;

/// Pool for accumulating and managing evidence of validator misbehavior.
#[derive(Debug, Clone, Default)]
pub struct EvidencePool {
    /// Evidence records keyed by their hash for deduplication.
    records: HashMap<[u8; 32], EvidenceRecord>,
}

impl EvidencePool {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Submit a new piece of evidence. Returns the evidence hash on success.
    pub fn submit_evidence(&mut self, evidence: EvidenceRecord) -> SlashingResult<[u8; 32]> {
        // Basic validation.
        if evidence.data.is_empty() {
            return Err(SlashingError::InvalidEvidence(
                "evidence data must not be empty".into(),
            ));
        }

        let hash = evidence.hash();

        // Dedup check.
        if self.records.contains_key(&hash) {
            return Err(SlashingError::DuplicateEvidence);
        }

        tracing::info!(
            offender = ?evidence.offender,
            offense = %evidence.offense,
            height = evidence.height,
            "evidence submitted"
        );

        self.records.insert(hash, evidence);
        Ok(hash)
    }

    /// Get all pending (unprocessed) evidence records.
    pub fn get_pending_evidence(&self) -> Vec<&EvidenceRecord> {
        self.records
            .values()
            .filter(|e| !e.processed)
            .collect()
    }

    /// Mark an evidence record as processed.
    pub fn mark_processed(&mut self, hash: &[u8; 32]) -> bool {
        if let Some(record) = self.records.get_mut(hash) {
            record.processed = true;
            true
        } else {
            false
        }
    }

    /// Get an evidence record by hash.
    pub fn get(&self, hash: &[u8; 32]) -> Option<&EvidenceRecord> {
        self.records.get(hash)
    }

    /// Total evidence count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
