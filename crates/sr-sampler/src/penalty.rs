use std::collections::HashMap;

use crate::candidates::Candidates;

/// Applies repetition, frequency and presence penalties using the last-N
/// emitted tokens.
///
/// The newline logit is captured before penalization and restored afterwards
/// when `penalize_nl` is false. This must happen before any shaping stage:
/// truncation may later drop the newline candidate entirely, at which point
/// the original value is unrecoverable.
pub struct PenaltyFilter<'a> {
    pub history: &'a [u32],
    pub repeat_penalty: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub penalize_nl: bool,
    pub newline_token: u32,
}

impl PenaltyFilter<'_> {
    pub fn apply(&self, candidates: &mut Candidates) {
        if self.history.is_empty() {
            return;
        }

        let mut counts: HashMap<u32, u32> = HashMap::new();
        for &token in self.history {
            *counts.entry(token).or_insert(0) += 1;
        }

        let nl_logit = (!self.penalize_nl)
            .then(|| candidates.logit(self.newline_token))
            .flatten();

        let repeat = self.repeat_penalty;
        let frequency = self.frequency_penalty;
        let presence = self.presence_penalty;
        candidates.for_each_mut(|candidate| {
            let Some(&count) = counts.get(&candidate.id) else {
                return;
            };
            // Dividing positive logits and multiplying negative ones always
            // moves the score away from selection for penalty > 1.
            if repeat != 1.0 && repeat > 0.0 {
                if candidate.logit > 0.0 {
                    candidate.logit /= repeat;
                } else {
                    candidate.logit *= repeat;
                }
            }
            candidate.logit -= count as f32 * frequency + presence;
        });

        if let Some(logit) = nl_logit {
            candidates.set_logit(self.newline_token, logit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filter(history: &[u32]) -> PenaltyFilter<'_> {
        PenaltyFilter {
            history,
            repeat_penalty: 1.1,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            penalize_nl: true,
            newline_token: 0,
        }
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut c = Candidates::from_logits(&[1.0, -1.0], 2).unwrap();
        filter(&[]).apply(&mut c);
        assert_eq!(c.as_slice()[0].logit, 1.0);
        assert_eq!(c.as_slice()[1].logit, -1.0);
    }

    #[test]
    fn test_repetition_penalty_direction() {
        let mut c = Candidates::from_logits(&[2.0, -2.0, 1.0], 3).unwrap();
        filter(&[0, 1]).apply(&mut c);
        // Positive logits shrink, negative logits grow more negative.
        assert_relative_eq!(c.as_slice()[0].logit, 2.0 / 1.1, epsilon = 1e-6);
        assert_relative_eq!(c.as_slice()[1].logit, -2.0 * 1.1, epsilon = 1e-6);
        // Unseen token untouched.
        assert_eq!(c.as_slice()[2].logit, 1.0);
    }

    #[test]
    fn test_frequency_and_presence() {
        let mut c = Candidates::from_logits(&[1.0, 1.0], 2).unwrap();
        let f = PenaltyFilter {
            history: &[1, 1, 1],
            repeat_penalty: 1.0,
            frequency_penalty: 0.2,
            presence_penalty: 0.5,
            penalize_nl: true,
            newline_token: 0,
        };
        f.apply(&mut c);
        assert_eq!(c.as_slice()[0].logit, 1.0);
        assert_relative_eq!(c.as_slice()[1].logit, 1.0 - 3.0 * 0.2 - 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_newline_logit_preserved() {
        let mut c = Candidates::from_logits(&[3.0, 1.0], 2).unwrap();
        let f = PenaltyFilter {
            history: &[0, 0],
            repeat_penalty: 1.5,
            frequency_penalty: 0.3,
            presence_penalty: 0.3,
            penalize_nl: false,
            newline_token: 0,
        };
        f.apply(&mut c);
        assert_eq!(c.as_slice()[0].logit, 3.0);
    }
}
