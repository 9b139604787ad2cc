use thiserror::Error;

use crate::batch::Batch;

/// A failed forward call, carrying the engine's status code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("engine decode failed with status {status}")]
pub struct DecodeError {
    pub status: i32,
}

/// The inference engine collaborator: forward pass, logits retrieval and
/// KV-cache bookkeeping.
///
/// Exactly one decode may be in flight per engine; all calls block. The
/// model/tensor internals behind this trait are out of scope for this
/// workspace.
pub trait InferenceEngine {
    /// Run one decode step over the batch, populating retrievable logits.
    fn decode(&mut self, batch: &Batch) -> Result<(), DecodeError>;

    /// Logits for one decoded position; index 0 is the default (last
    /// logits-bearing position of the previous decode). Length equals
    /// `vocab_size()`.
    fn logits(&self, index: usize) -> &[f32];

    fn vocab_size(&self) -> u32;

    fn eos_token(&self) -> u32;

    fn newline_token(&self) -> u32;

    /// Remove cached key/value entries for `[pos_start, pos_end)` of a
    /// sequence. `pos_end = None` means "to end of cache".
    fn kv_cache_remove(&mut self, sequence_id: i32, pos_start: u32, pos_end: Option<u32>);

    /// Maximum number of tokens one `decode` call accepts.
    fn max_batch_size(&self) -> usize;

    /// Context window length in tokens.
    fn context_size(&self) -> usize;
}
