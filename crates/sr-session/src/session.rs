use std::collections::HashMap;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sr_grammar::{GrammarConstraint, GrammarState, GrammarTable};
use sr_sampler::{sample_token, Candidates, PenaltyFilter, SamplerState, SamplingParams};

use crate::engine::InferenceEngine;
use crate::error::{Result, SessionError};
use crate::scheduler;

/// Position bookkeeping for one logical generation stream.
///
/// `cursor` is how many tokens have been pushed into the engine's KV cache
/// for this sequence; `history` is the prompt plus every sampled token, from
/// which the penalty window is cut. `history[i]` sits at position `i`.
#[derive(Debug, Clone)]
pub struct SequenceState {
    pub sequence_id: i32,
    pub cursor: u32,
    pub history: Vec<u32>,
}

/// A stream's grammar cursor plus the trail of tokens it has accepted,
/// keyed by history position so a rewind can replay the kept prefix.
struct StreamGrammar {
    state: GrammarState,
    accepted: Vec<(usize, u32)>,
}

struct Stream {
    state: SequenceState,
    sampler: SamplerState,
    grammar: Option<StreamGrammar>,
    rng: StdRng,
    seeded_with: Option<u64>,
}

/// An owned model context with its active generation streams.
///
/// Replaces the global model/context/grammar pointers of a classic C binding
/// layer: everything a sampling or decode call touches hangs off this struct,
/// so multiple sessions can coexist and nothing leaks between streams. The
/// compiled grammar table is shared read-only; each stream carries its own
/// cursor, mirostat state and random source. All calls are synchronous;
/// exactly one decode is in flight per session, and concurrent callers must
/// serialize externally.
pub struct InferenceSession<E> {
    engine: E,
    grammar: Option<GrammarConstraint>,
    rng: StdRng,
    streams: HashMap<i32, Stream>,
}

impl<E: InferenceEngine> InferenceSession<E> {
    pub fn new(engine: E) -> Self {
        Self::with_seed(engine, rand::random())
    }

    /// A fixed seed makes stream random sources reproducible across runs.
    pub fn with_seed(engine: E, seed: u64) -> Self {
        InferenceSession {
            engine,
            grammar: None,
            rng: StdRng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Logits for one decoded position, straight from the engine.
    pub fn logits(&self, index: usize) -> &[f32] {
        self.engine.logits(index)
    }

    /// Install a compiled grammar for subsequent sampling, or clear it.
    ///
    /// `None` (the compiler found no usable rules) disables the constraint
    /// and is not an error. Active streams restart at the root rule.
    /// Returns whether a grammar is now active.
    pub fn load_grammar(&mut self, table: Option<Box<dyn GrammarTable>>) -> bool {
        self.grammar = table.map(GrammarConstraint::new);
        for stream in self.streams.values_mut() {
            stream.grammar = self.grammar.as_ref().map(|g| StreamGrammar {
                state: g.start(),
                accepted: Vec::new(),
            });
        }
        self.grammar.is_some()
    }

    /// Open a new generation stream.
    pub fn begin(&mut self, sequence_id: i32) -> Result<()> {
        if self.streams.contains_key(&sequence_id) {
            return Err(SessionError::InvalidInput(format!(
                "sequence {sequence_id} is already active"
            )));
        }
        self.streams.insert(
            sequence_id,
            Stream {
                state: SequenceState {
                    sequence_id,
                    cursor: 0,
                    history: Vec::new(),
                },
                sampler: SamplerState::default(),
                grammar: self.grammar.as_ref().map(|g| StreamGrammar {
                    state: g.start(),
                    accepted: Vec::new(),
                }),
                rng: StdRng::seed_from_u64(self.rng.gen()),
                seeded_with: None,
            },
        );
        Ok(())
    }

    /// Close a stream and drop its cache entries.
    pub fn end(&mut self, sequence_id: i32) -> Result<()> {
        self.streams
            .remove(&sequence_id)
            .ok_or(SessionError::UninitializedContext(sequence_id))?;
        self.engine.kv_cache_remove(sequence_id, 0, None);
        debug!("sequence {sequence_id} ended, cache cleared");
        Ok(())
    }

    /// Rewind a stream to `keep` tokens: cache entries past it are removed,
    /// the cursor and history shrink, mirostat state starts over, and the
    /// grammar cursor is replayed over the kept prefix.
    pub fn truncate(&mut self, sequence_id: i32, keep: u32) -> Result<()> {
        let stream = self
            .streams
            .get_mut(&sequence_id)
            .ok_or(SessionError::UninitializedContext(sequence_id))?;
        if keep > stream.state.cursor {
            return Err(SessionError::InvalidInput(format!(
                "cannot keep {keep} tokens, only {} are cached",
                stream.state.cursor
            )));
        }
        self.engine.kv_cache_remove(sequence_id, keep, None);
        stream.state.cursor = keep;
        stream.state.history.truncate(keep as usize);
        stream.sampler.reset();
        if let (Some(constraint), Some(grammar)) =
            (self.grammar.as_ref(), stream.grammar.as_mut())
        {
            grammar.accepted.retain(|&(pos, _)| pos < keep as usize);
            grammar.state = constraint.replay(grammar.accepted.iter().map(|&(_, t)| t));
        }
        Ok(())
    }

    /// Decode the stream's token sequence in engine-sized chunks.
    ///
    /// `tokens` is the full sequence from position 0; decoding resumes at the
    /// stream's cursor. With `logits_all`, every position produces
    /// retrievable logits instead of only the final one. On failure the
    /// cursor still advances to the committed prefix, since those chunks
    /// stay in the engine's cache.
    pub fn decode_prompt(
        &mut self,
        sequence_id: i32,
        tokens: &[u32],
        logits_all: bool,
    ) -> Result<u32> {
        let context_size = self.engine.context_size();
        let stream = self
            .streams
            .get_mut(&sequence_id)
            .ok_or(SessionError::UninitializedContext(sequence_id))?;
        if tokens.len() > context_size {
            warn!(
                "requested tokens ({}) exceed context window of {context_size}",
                tokens.len()
            );
            return Err(SessionError::InvalidInput(format!(
                "requested tokens ({}) exceed context window of {context_size}",
                tokens.len()
            )));
        }

        match scheduler::decode_prompt(
            &mut self.engine,
            tokens,
            sequence_id,
            stream.state.cursor,
            logits_all,
        ) {
            Ok(past) => {
                stream.state.cursor = past;
                stream.state.history = tokens.to_vec();
                Ok(past)
            }
            Err(SessionError::DecodeFailure { status, committed }) => {
                stream.state.cursor = committed;
                stream.state.history = tokens[..committed as usize].to_vec();
                Err(SessionError::DecodeFailure { status, committed })
            }
            Err(other) => Err(other),
        }
    }

    /// Push one sampled token through the engine at the stream's cursor.
    ///
    /// The token was already recorded in the history by [`sample`](Self::sample);
    /// this call only advances the engine and the cursor.
    pub fn decode_one(&mut self, sequence_id: i32, token: u32) -> Result<()> {
        let context_size = self.engine.context_size();
        let stream = self
            .streams
            .get_mut(&sequence_id)
            .ok_or(SessionError::UninitializedContext(sequence_id))?;
        if stream.state.cursor as usize >= context_size {
            warn!("context window exhausted for sequence {sequence_id}");
            return Err(SessionError::InvalidInput(format!(
                "context window of {context_size} exhausted"
            )));
        }

        let position = stream.state.cursor;
        scheduler::decode_one(&mut self.engine, token, sequence_id, position)?;
        stream.state.cursor += 1;
        Ok(())
    }

    /// Sample the next token for a stream from a logits vector.
    ///
    /// Pipeline: logit bias, penalties (with newline preservation), grammar
    /// mask, strategy selection, grammar accept. The emitted token is
    /// recorded in the stream's history; pushing it through the engine is a
    /// separate [`decode_one`](Self::decode_one) call. A `params.seed`
    /// reseeds the stream's random source once, so the draw sequence from
    /// that point is reproducible.
    pub fn sample(
        &mut self,
        sequence_id: i32,
        logits: &[f32],
        params: &SamplingParams,
    ) -> Result<u32> {
        let vocab_size = self.engine.vocab_size() as usize;
        let newline_token = self.engine.newline_token();
        let stream = self
            .streams
            .get_mut(&sequence_id)
            .ok_or(SessionError::UninitializedContext(sequence_id))?;

        if let Some(seed) = params.seed {
            if stream.seeded_with != Some(seed) {
                stream.rng = StdRng::seed_from_u64(seed);
                stream.seeded_with = Some(seed);
            }
        }

        let mut candidates =
            Candidates::from_logits_with_bias(logits, vocab_size, &params.logit_bias)?;

        let history = &stream.state.history;
        let window_start = history.len().saturating_sub(params.last_tokens_size);
        PenaltyFilter {
            history: &history[window_start..],
            repeat_penalty: params.repeat_penalty,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            penalize_nl: params.penalize_nl,
            newline_token,
        }
        .apply(&mut candidates);

        if let (Some(constraint), Some(grammar)) =
            (self.grammar.as_ref(), stream.grammar.as_ref())
        {
            if constraint.mask(&grammar.state, &mut candidates) == 0 {
                return Err(SessionError::InvalidInput(
                    "grammar has no legal continuation".into(),
                ));
            }
        }

        let token = sample_token(&mut candidates, params, &mut stream.sampler, &mut stream.rng);

        if let (Some(constraint), Some(grammar)) =
            (self.grammar.as_ref(), stream.grammar.as_mut())
        {
            let position = stream.state.history.len();
            constraint.accept(&mut grammar.state, token)?;
            grammar.accepted.push((position, token));
        }

        stream.state.history.push(token);
        Ok(token)
    }

    /// The bookkeeping for an active stream, if any.
    pub fn sequence(&self, sequence_id: i32) -> Option<&SequenceState> {
        self.streams.get(&sequence_id).map(|s| &s.state)
    }

    /// The mirostat state of an active stream, if any.
    pub fn sampler_state(&self, sequence_id: i32) -> Option<&SamplerState> {
        self.streams.get(&sequence_id).map(|s| &s.sampler)
    }

    /// The grammar cursor of an active stream, if a grammar is loaded.
    pub fn grammar_state(&self, sequence_id: i32) -> Option<&GrammarState> {
        self.streams
            .get(&sequence_id)?
            .grammar
            .as_ref()
            .map(|g| &g.state)
    }
}
