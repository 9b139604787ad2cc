use super::Shaper;
use crate::candidates::Candidates;

/// Keeps only the `k` highest-logit candidates.
///
/// `k <= 0` means "keep all": the effective k becomes the vocabulary size and
/// the stage does nothing.
pub struct TopK {
    pub k: i32,
}

impl Shaper for TopK {
    fn name(&self) -> &str {
        "top_k"
    }

    fn apply(&self, candidates: &mut Candidates) {
        let k = if self.k <= 0 {
            candidates.len()
        } else {
            self.k as usize
        };
        if k >= candidates.len() {
            return;
        }

        candidates.sort_by_logit();
        candidates.truncate(k);
        candidates.softmax();
    }
}
