use sr_sampler::Candidates;

use crate::error::{GrammarError, Result};
use crate::table::{GrammarState, GrammarTable};

/// Filters candidate tokens against a compiled grammar.
///
/// The constraint itself is immutable and shared by every stream; each
/// stream owns its [`GrammarState`] cursor and passes it in. `mask` runs
/// before distribution shaping so the shaper renormalizes over grammar-legal
/// tokens only; `accept` then advances the stream's cursor past the token
/// the strategy actually picked.
pub struct GrammarConstraint {
    table: Box<dyn GrammarTable>,
}

impl GrammarConstraint {
    pub fn new(table: Box<dyn GrammarTable>) -> Self {
        GrammarConstraint { table }
    }

    /// A fresh cursor at the root rule.
    pub fn start(&self) -> GrammarState {
        self.table.start()
    }

    /// Remove candidates that cannot extend any rule reachable from `state`.
    /// Returns the surviving count; zero means the grammar has no legal
    /// continuation and the caller must treat the step as a dead end.
    pub fn mask(&self, state: &GrammarState, candidates: &mut Candidates) -> usize {
        candidates.retain(|candidate| self.table.advance(state, candidate.id).is_some())
    }

    /// Advance a stream's cursor past an emitted token.
    ///
    /// Fails if the token is not legal at the current position. This cannot
    /// happen when `mask` preceded the selection, but it is checked anyway:
    /// an unmasked caller (or a buggy table) must not corrupt the cursor.
    pub fn accept(&self, state: &mut GrammarState, token: u32) -> Result<()> {
        match self.table.advance(state, token) {
            Some(next) => {
                *state = next;
                Ok(())
            }
            None => Err(GrammarError::Violation { token }),
        }
    }

    /// Rebuild a cursor by re-accepting a token prefix from the root.
    ///
    /// Used when a stream rewinds: every token in the prefix was accepted
    /// once already, so with a deterministic table the fold reproduces the
    /// cursor exactly.
    pub fn replay(&self, tokens: impl IntoIterator<Item = u32>) -> GrammarState {
        let mut state = self.table.start();
        for token in tokens {
            match self.table.advance(&state, token) {
                Some(next) => state = next,
                None => break,
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Toy table: a chain grammar that accepts exactly the token sequence
    /// given at construction.
    struct ChainTable {
        sequence: Vec<u32>,
    }

    impl GrammarTable for ChainTable {
        fn start(&self) -> GrammarState {
            GrammarState::new(vec![0])
        }

        fn advance(&self, state: &GrammarState, token: u32) -> Option<GrammarState> {
            let pos = *state.stack.last()?;
            (self.sequence.get(pos) == Some(&token)).then(|| GrammarState::new(vec![pos + 1]))
        }
    }

    fn constraint() -> GrammarConstraint {
        GrammarConstraint::new(Box::new(ChainTable {
            sequence: vec![2, 0, 1],
        }))
    }

    #[test]
    fn test_mask_keeps_only_legal_tokens() {
        let g = constraint();
        let state = g.start();
        let mut c = Candidates::from_logits(&[0.1, 0.2, 0.3], 3).unwrap();
        let kept = g.mask(&state, &mut c);
        assert_eq!(kept, 1);
        assert_eq!(c.as_slice()[0].id, 2);
    }

    #[test]
    fn test_masked_candidates_always_accepted() {
        let g = constraint();
        let mut state = g.start();
        for _ in 0..3 {
            let mut c = Candidates::from_logits(&[0.1, 0.2, 0.3], 3).unwrap();
            let kept = g.mask(&state, &mut c);
            assert!(kept > 0);
            let token = c.as_slice()[0].id;
            g.accept(&mut state, token).unwrap();
        }
    }

    #[test]
    fn test_accept_rejects_illegal_token() {
        let g = constraint();
        let mut state = g.start();
        let err = g.accept(&mut state, 1).unwrap_err();
        assert!(matches!(err, GrammarError::Violation { token: 1 }));
        // The cursor must be unchanged after a rejected accept.
        g.accept(&mut state, 2).unwrap();
    }

    #[test]
    fn test_cursors_advance_independently() {
        let g = constraint();
        let mut first = g.start();
        let second = g.start();
        g.accept(&mut first, 2).unwrap();

        // The untouched cursor still sits at the root and admits only the
        // chain's first token.
        let mut c = Candidates::from_logits(&[0.1, 0.2, 0.3], 3).unwrap();
        g.mask(&second, &mut c);
        assert_eq!(c.as_slice()[0].id, 2);
    }

    #[test]
    fn test_replay_rebuilds_prefix_cursor() {
        let g = constraint();
        let mut state = g.replay([2, 0]);
        g.accept(&mut state, 1).unwrap();

        assert_eq!(g.replay([]), g.start());
    }
}
