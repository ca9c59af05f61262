//! Duplicate-work detection for the enrichment pipeline.

use glimpse_enrich::EnrichedFileRecord;

/// What to do with a file that is about to be enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// No enriched record exists yet; do the full workflow.
    Process,
    /// An up-to-date record exists; spend nothing on this file.
    Skip,
    /// A record exists but cannot be trusted to match the current content;
    /// redo the workflow and replace it.
    Reprocess,
}

/// Flag-driven dedup policy, evaluated per file.
#[derive(Debug, Clone, Copy)]
pub struct DedupPolicy {
    pub skip_duplicates: bool,
    pub track_fingerprint: bool,
}

impl DedupPolicy {
    /// Decide based on the existing vector record (if any) and the
    /// candidate's content fingerprint.
    ///
    /// Skipping requires all of: both flags on, a fingerprint on the
    /// candidate, and an equal fingerprint recorded on the existing record.
    /// Anything less means the content may have changed, so reprocess.
    pub fn decide(
        &self,
        existing: Option<&EnrichedFileRecord>,
        candidate_fingerprint: Option<&str>,
    ) -> DedupDecision {
        let Some(existing) = existing else {
            return DedupDecision::Process;
        };
        if !(self.skip_duplicates && self.track_fingerprint) {
            return DedupDecision::Reprocess;
        }
        match candidate_fingerprint {
            Some(fingerprint) if existing.fingerprint() == Some(fingerprint) => DedupDecision::Skip,
            _ => DedupDecision::Reprocess,
        }
    }
}
