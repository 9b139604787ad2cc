use std::collections::HashMap;

use crate::error::{Result, SamplerError};

/// A token id paired with its current logit and probability.
///
/// `prob` is zero until a normalizing step ([`Candidates::softmax`]) runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: u32,
    pub logit: f32,
    pub prob: f32,
}

/// The working set of candidate tokens for one sampling call.
///
/// Built from a single logits vector with one entry per vocabulary token.
/// Shaping stages may shrink the set, but it is owned by exactly one sampling
/// call and never shared across threads.
#[derive(Debug, Clone)]
pub struct Candidates {
    data: Vec<Candidate>,
    sorted: bool,
}

impl Candidates {
    /// Build the candidate set from a raw logits vector.
    ///
    /// Returns an error if the vector length does not match the engine's
    /// reported vocabulary size.
    pub fn from_logits(logits: &[f32], vocab_size: usize) -> Result<Self> {
        if vocab_size == 0 {
            return Err(SamplerError::EmptyVocab);
        }
        if logits.len() != vocab_size {
            return Err(SamplerError::LogitsLengthMismatch {
                expected: vocab_size,
                got: logits.len(),
            });
        }

        let data = logits
            .iter()
            .enumerate()
            .map(|(id, &logit)| Candidate {
                id: id as u32,
                logit,
                prob: 0.0,
            })
            .collect();

        Ok(Candidates {
            data,
            sorted: false,
        })
    }

    /// Build the candidate set and add per-token logit biases.
    ///
    /// A bias of `f32::NEG_INFINITY` bans a token outright.
    pub fn from_logits_with_bias(
        logits: &[f32],
        vocab_size: usize,
        bias: &HashMap<u32, f32>,
    ) -> Result<Self> {
        let mut candidates = Self::from_logits(logits, vocab_size)?;
        for (&token, &value) in bias {
            if token as usize >= vocab_size {
                return Err(SamplerError::TokenOutOfRange { token, vocab_size });
            }
            candidates.data[token as usize].logit += value;
        }
        Ok(candidates)
    }

    /// Number of surviving candidates.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the set is currently sorted by descending logit.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.data
    }

    /// Look up the current logit of a token, if it is still in the set.
    pub fn logit(&self, token: u32) -> Option<f32> {
        self.position(token).map(|i| self.data[i].logit)
    }

    /// Overwrite the logit of a token, if it is still in the set.
    pub fn set_logit(&mut self, token: u32, logit: f32) {
        if let Some(i) = self.position(token) {
            self.data[i].logit = logit;
            self.sorted = false;
        }
    }

    fn position(&self, token: u32) -> Option<usize> {
        // Before any shaping the set is in id order, so try a direct index.
        let idx = token as usize;
        if idx < self.data.len() && self.data[idx].id == token {
            return Some(idx);
        }
        self.data.iter().position(|c| c.id == token)
    }

    /// Apply a transformation to every surviving logit.
    ///
    /// Monotone transforms (such as temperature scaling) preserve order, so
    /// the sorted flag is left untouched.
    pub fn scale_logits(&mut self, divisor: f32) {
        for candidate in &mut self.data {
            candidate.logit /= divisor;
        }
    }

    /// Visit each candidate mutably. Clears the sorted flag.
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut Candidate)) {
        self.data.iter_mut().for_each(f);
        self.sorted = false;
    }

    /// Keep only candidates matching the predicate. Relative order is
    /// preserved, so the sorted flag survives. Returns the surviving count.
    pub fn retain(&mut self, f: impl FnMut(&Candidate) -> bool) -> usize {
        self.data.retain(f);
        self.data.len()
    }

    /// Sort by descending logit.
    pub fn sort_by_logit(&mut self) {
        if self.sorted {
            return;
        }
        self.data.sort_by(|a, b| {
            b.logit
                .partial_cmp(&a.logit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.sorted = true;
    }

    /// Sort by descending logit and normalize probabilities over the
    /// surviving candidates.
    pub fn softmax(&mut self) {
        if self.data.is_empty() {
            return;
        }
        self.sort_by_logit();

        let max_logit = self.data[0].logit;
        let mut sum = 0.0f64;
        for candidate in &mut self.data {
            candidate.prob = (candidate.logit - max_logit).exp();
            sum += candidate.prob as f64;
        }
        for candidate in &mut self.data {
            candidate.prob /= sum as f32;
        }
    }

    /// Truncate to the first `k` candidates, keeping at least one.
    pub fn truncate(&mut self, k: usize) {
        self.data.truncate(k.max(1));
    }

    /// Replace the surviving set with a reordered subset. Used by shaping
    /// stages that rank by a derived score rather than by logit.
    pub(crate) fn replace(&mut self, data: Vec<Candidate>, sorted: bool) {
        self.data = data;
        self.sorted = sorted;
    }

    /// The id of the candidate with the highest logit.
    pub fn argmax(&self) -> Option<u32> {
        if self.sorted {
            return self.data.first().map(|c| c.id);
        }
        self.data
            .iter()
            .max_by(|a, b| {
                a.logit
                    .partial_cmp(&b.logit)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|c| c.id)
    }
}
