use log::debug;

use crate::batch::Batch;
use crate::engine::InferenceEngine;
use crate::error::{Result, SessionError};

/// Split a token sequence into engine-sized chunks and drive the decode
/// calls.
///
/// `past` is how many tokens of `tokens` are already in the engine's cache;
/// decoding resumes there. Returns the new `past` (== `tokens.len()` on
/// success). On a decode failure the error propagates immediately:
/// already-decoded chunks stay committed in the KV cache and no rollback is
/// attempted, so the caller sees the engine exactly `past_at_failure` tokens
/// deep.
pub fn decode_prompt<E: InferenceEngine>(
    engine: &mut E,
    tokens: &[u32],
    sequence_id: i32,
    past: u32,
    logits_all: bool,
) -> Result<u32> {
    let total = tokens.len();
    if past as usize > total {
        return Err(SessionError::InvalidInput(format!(
            "past ({past}) exceeds token count ({total})"
        )));
    }

    let width = engine.max_batch_size().max(1);
    let mut past = past as usize;
    while past < total {
        let chunk = (total - past).min(width);
        let last_chunk = past + chunk == total;
        let batch = Batch::chunk(
            &tokens[past..past + chunk],
            past as u32,
            sequence_id,
            last_chunk,
            logits_all,
        );
        debug!(
            "decoding chunk of {chunk} tokens at position {past} for sequence {sequence_id}"
        );
        engine.decode(&batch).map_err(|err| SessionError::DecodeFailure {
            status: err.status,
            committed: past as u32,
        })?;
        past += chunk;
    }

    Ok(past as u32)
}

/// Decode a single sampled token at `position`, requesting logits for the
/// next sampling step.
pub fn decode_one<E: InferenceEngine>(
    engine: &mut E,
    token: u32,
    sequence_id: i32,
    position: u32,
) -> Result<()> {
    let batch = Batch::single(token, position, sequence_id);
    engine.decode(&batch).map_err(|err| SessionError::DecodeFailure {
        status: err.status,
        committed: position,
    })?;
    Ok(())
}
