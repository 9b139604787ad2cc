use rand::Rng;

use crate::candidates::Candidates;
use crate::strategy::draw;

/// Mirostat v1 (https://arxiv.org/abs/2007.14966): feedback-controlled
/// sampling that targets a constant surprise `tau`.
///
/// Estimates the Zipf exponent over the top `m` candidates, derives a top-k
/// cutoff from the running `mu` estimate, draws from the survivors, and then
/// moves `mu` against the observed surprise error.
pub struct MirostatV1 {
    pub tau: f32,
    pub eta: f32,
    pub m: usize,
}

impl MirostatV1 {
    pub fn sample<R: Rng>(&self, candidates: &mut Candidates, mu: &mut f32, rng: &mut R) -> u32 {
        candidates.softmax();

        let n = candidates.len();
        if n > 1 {
            let pairs = self.m.min(n - 1);
            let mut sum_ti_bi = 0.0f32;
            let mut sum_ti_sq = 0.0f32;
            for i in 0..pairs {
                let t_i = ((i + 2) as f32 / (i + 1) as f32).ln();
                let b_i =
                    (candidates.as_slice()[i].prob / candidates.as_slice()[i + 1].prob).ln();
                sum_ti_bi += t_i * b_i;
                sum_ti_sq += t_i * t_i;
            }
            let s_hat = sum_ti_bi / sum_ti_sq;

            let epsilon_hat = s_hat - 1.0;
            let k = ((epsilon_hat * mu.powi(2)) / (1.0 - (n as f32).powf(-epsilon_hat)))
                .powf(1.0 / s_hat);
            if k.is_finite() {
                candidates.truncate((k as usize).clamp(1, n));
                candidates.softmax();
            }
        }

        let token = draw(candidates, rng);
        update_mu(candidates, token, self.tau, self.eta, mu);
        token
    }
}

/// Mirostat v2: the same control law as v1 with a simplified single-pass
/// cutoff instead of the Zipf-derived top-k search.
pub struct MirostatV2 {
    pub tau: f32,
    pub eta: f32,
}

impl MirostatV2 {
    pub fn sample<R: Rng>(&self, candidates: &mut Candidates, mu: &mut f32, rng: &mut R) -> u32 {
        candidates.softmax();

        // Reject candidates whose surprise already exceeds mu.
        let cut = candidates
            .as_slice()
            .iter()
            .position(|c| -c.prob.log2() > *mu)
            .unwrap_or(candidates.len());
        candidates.truncate(cut.max(1));
        candidates.softmax();

        let token = draw(candidates, rng);
        update_mu(candidates, token, self.tau, self.eta, mu);
        token
    }
}

fn update_mu(candidates: &Candidates, token: u32, tau: f32, eta: f32, mu: &mut f32) {
    let prob = candidates
        .as_slice()
        .iter()
        .find(|c| c.id == token)
        .map(|c| c.prob)
        .unwrap_or(f32::MIN_POSITIVE);
    let observed_surprise = -prob.log2();
    *mu -= eta * (observed_surprise - tau);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_v1_single_candidate_updates_mu() {
        let mut c = Candidates::from_logits(&[1.0], 1).unwrap();
        let sampler = MirostatV1 {
            tau: 5.0,
            eta: 0.1,
            m: 100,
        };
        let mut mu = 10.0;
        let mut rng = StdRng::seed_from_u64(0);
        let token = sampler.sample(&mut c, &mut mu, &mut rng);
        assert_eq!(token, 0);
        // Certain token: surprise 0, so mu moves up by eta * tau.
        assert_relative_eq!(mu, 10.0 + 0.1 * 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_v2_truncates_high_surprise_tail() {
        // Tight mu: only the dominant token's surprise stays under it.
        let mut c = Candidates::from_logits(&[10.0, 0.0, 0.0, 0.0], 4).unwrap();
        let sampler = MirostatV2 { tau: 5.0, eta: 0.1 };
        let mut mu = 1.0;
        let mut rng = StdRng::seed_from_u64(1);
        let token = sampler.sample(&mut c, &mut mu, &mut rng);
        assert_eq!(token, 0);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_mu_is_pure_in_observed_surprises() {
        // Same candidates, same seed: identical draws, identical mu path.
        let sampler = MirostatV2 { tau: 3.0, eta: 0.2 };
        let mut trajectories = Vec::new();
        for _ in 0..2 {
            let mut mu = 2.0 * 3.0;
            let mut rng = StdRng::seed_from_u64(42);
            let mut path = Vec::new();
            for _ in 0..5 {
                let mut c = Candidates::from_logits(&[2.0, 1.0, 0.5, 0.0], 4).unwrap();
                sampler.sample(&mut c, &mut mu, &mut rng);
                path.push(mu);
            }
            trajectories.push(path);
        }
        assert_eq!(trajectories[0], trajectories[1]);
    }
}
