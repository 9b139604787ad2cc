/// One forward-call worth of tokens for the engine.
///
/// All four vectors run in lockstep; length never exceeds the engine's
/// maximum batch width (the scheduler enforces that).
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub tokens: Vec<u32>,
    pub positions: Vec<u32>,
    pub sequence_ids: Vec<i32>,
    /// Which positions should produce retrievable logits.
    pub want_logits: Vec<bool>,
}

impl Batch {
    /// Build a batch for a contiguous chunk of one sequence starting at
    /// `start_pos`. With `logits_all` false only the final position requests
    /// logits when `last_chunk` is set; prompt-interior chunks request none.
    pub fn chunk(
        tokens: &[u32],
        start_pos: u32,
        sequence_id: i32,
        last_chunk: bool,
        logits_all: bool,
    ) -> Self {
        let n = tokens.len();
        let mut want_logits = vec![logits_all; n];
        if !logits_all && last_chunk && n > 0 {
            want_logits[n - 1] = true;
        }
        Batch {
            tokens: tokens.to_vec(),
            positions: (start_pos..start_pos + n as u32).collect(),
            sequence_ids: vec![sequence_id; n],
            want_logits,
        }
    }

    /// The chunk-of-one case used for incremental decode after sampling.
    pub fn single(token: u32, position: u32, sequence_id: i32) -> Self {
        Batch {
            tokens: vec![token],
            positions: vec![position],
            sequence_ids: vec![sequence_id],
            want_logits: vec![true],
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
