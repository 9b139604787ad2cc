use super::Shaper;
use crate::candidates::Candidates;

/// Tail-free sampling: drops the low-curvature tail of the sorted
/// probability curve.
///
/// The cutoff runs over the normalized absolute second derivative of the
/// sorted probabilities; candidates past the point where its cumulative sum
/// exceeds `z` are discarded. `z >= 1` disables the stage.
pub struct TailFree {
    pub z: f32,
}

impl Shaper for TailFree {
    fn name(&self) -> &str {
        "tail_free"
    }

    fn apply(&self, candidates: &mut Candidates) {
        if self.z >= 1.0 || candidates.len() <= 2 {
            return;
        }

        candidates.softmax();

        let probs: Vec<f32> = candidates.as_slice().iter().map(|c| c.prob).collect();
        let first: Vec<f32> = probs.windows(2).map(|w| w[0] - w[1]).collect();
        let mut second: Vec<f32> = first.windows(2).map(|w| (w[0] - w[1]).abs()).collect();

        let sum: f64 = second.iter().map(|&x| f64::from(x)).sum();
        if sum > 1e-6 {
            for value in &mut second {
                *value /= sum as f32;
            }
        } else {
            let uniform = 1.0 / second.len() as f32;
            second.fill(uniform);
        }

        let mut cum = 0.0f64;
        let mut last_idx = candidates.len();
        for (i, &value) in second.iter().enumerate() {
            cum += f64::from(value);
            if cum > f64::from(self.z) && i >= 1 {
                last_idx = i;
                break;
            }
        }

        candidates.truncate(last_idx);
        candidates.softmax();
    }
}
