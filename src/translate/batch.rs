//! Batching planner: partitions cue texts into bounded, order-preserving
//! groups for rate-limit-friendly translation calls.

use crate::subtitle::Cue;

/// One ordered group of cue texts tagged with enough position data to scatter
/// results back to the right cues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueBatch {
    /// Position of this batch in the plan, 0-based.
    pub index: usize,
    /// Indices of the cues this batch covers, in source order.
    pub cue_indices: Vec<usize>,
    /// The cues' source texts, parallel to `cue_indices`.
    pub texts: Vec<String>,
}

impl CueBatch {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Positions within the batch whose text is worth sending to the
    /// provider. Blank entries stay in the batch for index alignment but are
    /// elided from the request payload.
    pub fn payload_positions(&self) -> Vec<usize> {
        self.texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Group cues into contiguous runs of at most `batch_size`, preserving source
/// order; the last batch may be smaller. A zero batch size is clamped to 1.
pub fn plan_batches(cues: &[Cue], batch_size: usize) -> Vec<CueBatch> {
    let batch_size = batch_size.max(1);

    cues.chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| CueBatch {
            index,
            cue_indices: chunk.iter().map(|c| c.index).collect(),
            texts: chunk.iter().map(|c| c.text.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_cues(texts: &[&str]) -> Vec<Cue> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Cue::new(
                    i,
                    Duration::from_secs(i as u64),
                    Duration::from_secs(i as u64 + 1),
                    t.to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_plan_batches_groups_and_preserves_order() {
        let cues = make_cues(&["a", "b", "c", "d", "e"]);
        let batches = plan_batches(&cues, 2);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].texts, vec!["a", "b"]);
        assert_eq!(batches[1].texts, vec!["c", "d"]);
        assert_eq!(batches[2].texts, vec!["e"]);
        assert_eq!(batches[2].cue_indices, vec![4]);
        assert_eq!(batches[1].index, 1);
    }

    #[test]
    fn test_plan_batches_single_batch_when_large() {
        let cues = make_cues(&["a", "b"]);
        let batches = plan_batches(&cues, 50);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn test_plan_batches_empty_input() {
        assert!(plan_batches(&[], 10).is_empty());
    }

    #[test]
    fn test_plan_batches_clamps_zero_batch_size() {
        let cues = make_cues(&["a", "b"]);
        let batches = plan_batches(&cues, 0);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_payload_positions_elide_blank_entries() {
        let cues = make_cues(&["a", "  ", "c"]);
        let batches = plan_batches(&cues, 10);
        assert_eq!(batches[0].payload_positions(), vec![0, 2]);
        // The blank cue stays in the batch for alignment.
        assert_eq!(batches[0].len(), 3);
    }
}
