use super::Shaper;
use crate::candidates::Candidates;

/// Min-p sampling: drops candidates whose probability falls below
/// `p * max_probability`.
///
/// `p <= 0` disables the stage.
pub struct MinP {
    pub p: f32,
}

impl Shaper for MinP {
    fn name(&self) -> &str {
        "min_p"
    }

    fn apply(&self, candidates: &mut Candidates) {
        if self.p <= 0.0 || candidates.is_empty() {
            return;
        }

        candidates.softmax();

        let threshold = self.p * candidates.as_slice()[0].prob;
        candidates.retain(|candidate| candidate.prob >= threshold);
        candidates.softmax();
    }
}
