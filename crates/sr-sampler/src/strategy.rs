use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::candidates::Candidates;
use crate::mirostat;
use crate::params::SamplingParams;
use crate::shaper::ShaperPipeline;

/// Persistent sampler state for one generation stream.
///
/// Carries the mirostat `mu` running estimate. The state is owned by the
/// stream and must never be shared between streams: `mu` is a feedback value
/// and cross-stream reuse contaminates both. A fresh (or reset) state holds
/// `None`, which the mirostat strategies initialize to `2 * tau` on first
/// use.
#[derive(Debug, Clone, Default)]
pub struct SamplerState {
    pub mu: Option<f32>,
}

impl SamplerState {
    pub fn reset(&mut self) {
        self.mu = None;
    }

    fn mu_or_init(&mut self, tau: f32) -> &mut f32 {
        self.mu.get_or_insert(2.0 * tau)
    }
}

/// The branch of the sampling state machine a parameter set selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Greedy,
    Stochastic,
    MirostatV1,
    MirostatV2,
}

impl Strategy {
    /// `temperature <= 0` wins over everything else; out-of-range mirostat
    /// modes fall back to plain stochastic sampling.
    pub fn select(params: &SamplingParams) -> Self {
        if params.temperature <= 0.0 {
            return Strategy::Greedy;
        }
        match params.mirostat_mode {
            1 => Strategy::MirostatV1,
            2 => Strategy::MirostatV2,
            _ => Strategy::Stochastic,
        }
    }
}

/// Select the next token from a penalized (and possibly grammar-masked)
/// candidate set.
///
/// Greedy ignores the shaping pipeline entirely. The mirostat branches apply
/// temperature only; the stochastic branch runs the full pipeline and draws
/// from the shaped distribution.
pub fn sample_token<R: Rng>(
    candidates: &mut Candidates,
    params: &SamplingParams,
    state: &mut SamplerState,
    rng: &mut R,
) -> u32 {
    match Strategy::select(params) {
        Strategy::Greedy => candidates.argmax().unwrap_or(0),
        Strategy::Stochastic => {
            ShaperPipeline::from_params(params).apply(candidates);
            candidates.softmax();
            draw(candidates, rng)
        }
        Strategy::MirostatV1 => {
            candidates.scale_logits(params.temperature);
            let sampler = mirostat::MirostatV1 {
                tau: params.mirostat_tau,
                eta: params.mirostat_eta,
                m: params.mirostat_m,
            };
            sampler.sample(candidates, state.mu_or_init(params.mirostat_tau), rng)
        }
        Strategy::MirostatV2 => {
            candidates.scale_logits(params.temperature);
            let sampler = mirostat::MirostatV2 {
                tau: params.mirostat_tau,
                eta: params.mirostat_eta,
            };
            sampler.sample(candidates, state.mu_or_init(params.mirostat_tau), rng)
        }
    }
}

/// Draw one token from the candidates' normalized probabilities.
///
/// Falls back to argmax when the weights are degenerate (all zero or
/// non-finite), mirroring the behavior of a failed `WeightedIndex` build.
pub fn draw<R: Rng>(candidates: &Candidates, rng: &mut R) -> u32 {
    let weights = candidates.as_slice().iter().map(|c| c.prob);
    match WeightedIndex::new(weights) {
        Ok(dist) => candidates.as_slice()[dist.sample(rng)].id,
        Err(_) => candidates.argmax().unwrap_or(0),
    }
}
