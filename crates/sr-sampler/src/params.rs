use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Generation-time sampling configuration.
///
/// Defaults match the conventional llama.cpp parameter set. A stage is
/// disabled by its neutral value: `top_k <= 0` keeps the whole vocabulary,
/// `tsf`/`typical` at 1.0 skip those stages, `min_p <= 0` skips min-p, and
/// `dynatemp_range <= 0` selects flat temperature scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// `<= 0` selects greedy decoding and ignores every other knob.
    pub temperature: f32,
    pub repeat_penalty: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// When false, the newline logit is restored after penalization.
    pub penalize_nl: bool,
    pub top_k: i32,
    pub top_p: f32,
    /// Tail-free sampling parameter z.
    pub tsf: f32,
    /// Locally typical sampling parameter p.
    pub typical: f32,
    pub min_p: f32,
    /// 0 = disabled, 1 = mirostat v1, 2 = mirostat v2. Out-of-range values
    /// fall back to plain stochastic sampling.
    pub mirostat_mode: i32,
    pub mirostat_tau: f32,
    pub mirostat_eta: f32,
    /// Number of top candidates used for the v1 surprise estimate.
    pub mirostat_m: usize,
    pub dynatemp_range: f32,
    pub dynatemp_exponent: f32,
    /// Size of the recent-token window fed to the penalty filter.
    pub last_tokens_size: usize,
    /// Additive per-token logit adjustments; `-inf` bans a token.
    pub logit_bias: HashMap<u32, f32>,
    /// Pins the stream's random source: on first use the stream is reseeded
    /// so its draw sequence is reproducible. `None` keeps the stream's own
    /// source.
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        SamplingParams {
            temperature: 0.8,
            repeat_penalty: 1.1,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            penalize_nl: true,
            top_k: 40,
            top_p: 0.9,
            tsf: 1.0,
            typical: 1.0,
            min_p: 0.05,
            mirostat_mode: 0,
            mirostat_tau: 5.0,
            mirostat_eta: 0.1,
            mirostat_m: 100,
            dynatemp_range: 0.0,
            dynatemp_exponent: 1.0,
            last_tokens_size: 64,
            logit_bias: HashMap::new(),
            seed: None,
        }
    }
}
