use super::Shaper;
use crate::candidates::Candidates;

/// Nucleus sampling: keeps the smallest prefix of the probability-sorted
/// candidates whose cumulative probability reaches `p`.
///
/// `p >= 1` disables the stage.
pub struct TopP {
    pub p: f32,
}

impl Shaper for TopP {
    fn name(&self) -> &str {
        "top_p"
    }

    fn apply(&self, candidates: &mut Candidates) {
        if self.p >= 1.0 {
            return;
        }

        candidates.softmax();

        let mut cum = 0.0f64;
        let mut cutoff = candidates.len();
        for (i, candidate) in candidates.as_slice().iter().enumerate() {
            cum += f64::from(candidate.prob);
            if cum >= f64::from(self.p) {
                cutoff = i + 1;
                break;
            }
        }

        candidates.truncate(cutoff);
        candidates.softmax();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disabled_at_one() {
        let mut c = Candidates::from_logits(&[1.0, 2.0, 3.0], 3).unwrap();
        TopP { p: 1.0 }.apply(&mut c);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_keeps_smallest_covering_prefix() {
        // Heavily peaked: the top token alone carries most of the mass.
        let mut c = Candidates::from_logits(&[10.0, 1.0, 0.5, 0.1], 4).unwrap();
        TopP { p: 0.5 }.apply(&mut c);
        assert_eq!(c.len(), 1);
        assert_eq!(c.as_slice()[0].id, 0);
        assert_relative_eq!(c.as_slice()[0].prob, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_distribution() {
        let mut c = Candidates::from_logits(&[1.0, 1.0, 1.0, 1.0], 4).unwrap();
        TopP { p: 0.5 }.apply(&mut c);
        // Two tokens of 0.25 each reach the 0.5 threshold.
        assert_eq!(c.len(), 2);
    }
}
