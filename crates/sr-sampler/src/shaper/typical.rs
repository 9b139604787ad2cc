use super::Shaper;
use crate::candidates::Candidates;

/// Locally typical sampling (https://arxiv.org/abs/2202.00666).
///
/// Candidates are ranked by how close their surprise (-ln p) sits to the
/// distribution's entropy; the closest are kept until the cumulative
/// probability reaches `p`. `p >= 1` disables the stage.
pub struct Typical {
    pub p: f32,
}

impl Shaper for Typical {
    fn name(&self) -> &str {
        "typical"
    }

    fn apply(&self, candidates: &mut Candidates) {
        if self.p >= 1.0 || candidates.len() <= 1 {
            return;
        }

        candidates.softmax();

        let entropy: f64 = candidates
            .as_slice()
            .iter()
            .filter(|c| c.prob > 0.0)
            .map(|c| {
                let p = f64::from(c.prob);
                -p * p.ln()
            })
            .sum();

        let scores: Vec<f64> = candidates
            .as_slice()
            .iter()
            .map(|c| (-f64::from(c.prob).ln() - entropy).abs())
            .collect();

        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        indices.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cum = 0.0f64;
        let mut last_idx = indices.len();
        for (i, &index) in indices.iter().enumerate() {
            cum += f64::from(candidates.as_slice()[index].prob);
            if cum >= f64::from(self.p) {
                last_idx = i + 1;
                break;
            }
        }

        let kept: Vec<_> = indices
            .into_iter()
            .take(last_idx)
            .map(|index| candidates.as_slice()[index])
            .collect();
        candidates.replace(kept, false);
        candidates.softmax();
    }
}
