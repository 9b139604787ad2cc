use std::collections::HashSet;

use crate::batch::Batch;
use crate::engine::{DecodeError, InferenceEngine};

/// In-memory engine for scheduler and session tests: records every batch,
/// tracks which (sequence, position) cache slots are occupied, and can be
/// told to fail after N successful decodes.
pub struct MockEngine {
    pub vocab: u32,
    pub max_batch: usize,
    pub batches: Vec<Batch>,
    pub cache: HashSet<(i32, u32)>,
    pub fail_after: Option<usize>,
    pub logits: Vec<f32>,
}

impl MockEngine {
    pub fn new(vocab: u32, max_batch: usize) -> Self {
        MockEngine {
            vocab,
            max_batch,
            batches: Vec::new(),
            cache: HashSet::new(),
            fail_after: None,
            logits: vec![0.0; vocab as usize],
        }
    }
}

impl InferenceEngine for MockEngine {
    fn decode(&mut self, batch: &Batch) -> Result<(), DecodeError> {
        if let Some(limit) = self.fail_after {
            if self.batches.len() >= limit {
                return Err(DecodeError { status: -1 });
            }
        }
        for (&seq, &pos) in batch.sequence_ids.iter().zip(&batch.positions) {
            self.cache.insert((seq, pos));
        }
        self.batches.push(batch.clone());
        Ok(())
    }

    fn logits(&self, _index: usize) -> &[f32] {
        &self.logits
    }

    fn vocab_size(&self) -> u32 {
        self.vocab
    }

    fn eos_token(&self) -> u32 {
        2
    }

    fn newline_token(&self) -> u32 {
        1
    }

    fn kv_cache_remove(&mut self, sequence_id: i32, pos_start: u32, pos_end: Option<u32>) {
        let end = pos_end.unwrap_or(u32::MAX);
        self.cache
            .retain(|&(seq, pos)| seq != sequence_id || pos < pos_start || pos >= end);
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch
    }

    fn context_size(&self) -> usize {
        4096
    }
}

mod tests {
    use super::*;
    use crate::scheduler;

    #[test]
    fn test_bounded_cache_removal_frees_positions() {
        let mut engine = MockEngine::new(8, 16);
        let tokens: Vec<u32> = (0..12).collect();
        scheduler::decode_prompt(&mut engine, &tokens, 1, 0, false).unwrap();

        engine.kv_cache_remove(1, 0, Some(10));
        assert!((0..10).all(|pos| !engine.cache.contains(&(1, pos))));
        assert!(engine.cache.contains(&(1, 10)));
        assert!(engine.cache.contains(&(1, 11)));

        // The freed range accepts a fresh decode at position 0.
        scheduler::decode_one(&mut engine, 5, 1, 0).unwrap();
        assert!(engine.cache.contains(&(1, 0)));
    }
}
