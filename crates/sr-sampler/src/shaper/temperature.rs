use super::Shaper;
use crate::candidates::Candidates;

/// Temperature scaling, flat or entropy-driven.
///
/// With `dynatemp_range > 0` the effective temperature is interpolated
/// between `temperature - range` and `temperature + range` (clamped at zero)
/// by the normalized entropy of the current distribution raised to
/// `dynatemp_exponent`. Otherwise all logits are divided by `temperature`.
///
/// `temperature <= 0` is the greedy signal and is short-circuited by the
/// sampling strategy before this stage ever runs.
pub struct Temperature {
    pub temperature: f32,
    pub dynatemp_range: f32,
    pub dynatemp_exponent: f32,
}

impl Shaper for Temperature {
    fn name(&self) -> &str {
        "temperature"
    }

    fn apply(&self, candidates: &mut Candidates) {
        if self.dynatemp_range > 0.0 {
            self.apply_dynamic(candidates);
        } else if self.temperature > 0.0 {
            candidates.scale_logits(self.temperature);
        }
    }
}

impl Temperature {
    fn apply_dynamic(&self, candidates: &mut Candidates) {
        if candidates.len() <= 1 {
            return;
        }

        let min_temp = (self.temperature - self.dynatemp_range).max(0.0);
        let max_temp = (self.temperature + self.dynatemp_range).max(0.0);

        candidates.softmax();

        let max_entropy = (candidates.len() as f64).ln();
        let entropy: f64 = candidates
            .as_slice()
            .iter()
            .filter(|c| c.prob > 0.0)
            .map(|c| {
                let p = f64::from(c.prob);
                -p * p.ln()
            })
            .sum();

        let normalized = entropy / max_entropy;
        let dyn_temp = f64::from(min_temp)
            + f64::from(max_temp - min_temp) * normalized.powf(f64::from(self.dynatemp_exponent));
        if dyn_temp > 0.0 {
            candidates.scale_logits(dyn_temp as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_scaling() {
        let mut c = Candidates::from_logits(&[2.0, -2.0], 2).unwrap();
        Temperature {
            temperature: 2.0,
            dynatemp_range: 0.0,
            dynatemp_exponent: 1.0,
        }
        .apply(&mut c);
        assert_relative_eq!(c.as_slice()[0].logit, 1.0, epsilon = 1e-6);
        assert_relative_eq!(c.as_slice()[1].logit, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dynamic_near_uniform_uses_high_temperature() {
        // A near-uniform distribution has normalized entropy near 1, so the
        // effective temperature approaches max_temp = 1.5.
        let mut c = Candidates::from_logits(&[1.0, 1.0, 1.0, 1.0], 4).unwrap();
        Temperature {
            temperature: 1.0,
            dynatemp_range: 0.5,
            dynatemp_exponent: 1.0,
        }
        .apply(&mut c);
        assert_relative_eq!(c.as_slice()[0].logit, 1.0 / 1.5, epsilon = 1e-4);
    }

    #[test]
    fn test_dynamic_peaked_uses_low_temperature() {
        let mut uniform = Candidates::from_logits(&[1.0, 1.0, 1.0, 1.0], 4).unwrap();
        let mut peaked = Candidates::from_logits(&[10.0, 0.0, 0.0, 0.0], 4).unwrap();
        let temp = Temperature {
            temperature: 1.0,
            dynatemp_range: 0.5,
            dynatemp_exponent: 1.0,
        };
        temp.apply(&mut uniform);
        temp.apply(&mut peaked);
        // Lower entropy means a lower divisor, so the peaked head keeps a
        // larger scaled logit than flat 1/1.5 scaling would give it.
        assert!(peaked.as_slice()[0].logit > 10.0 / 1.5);
    }
}
