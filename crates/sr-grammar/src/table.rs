/// Cursor into a compiled grammar: the stack of currently-reachable rule
/// positions.
///
/// Owned by the stream and mutated only by accepting a token. The element
/// values are meaningful only to the [`GrammarTable`] that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrammarState {
    pub stack: Vec<usize>,
}

impl GrammarState {
    pub fn new(stack: Vec<usize>) -> Self {
        GrammarState { stack }
    }
}

/// A compiled grammar rule table, produced by an external grammar compiler.
///
/// The compiler itself (text to rule table) lives outside this crate; a
/// compile yielding zero rules is "no grammar" upstream and never reaches
/// this trait. Implementations must be deterministic: `advance` answers both
/// "is this token legal here" and "what state follows it".
pub trait GrammarTable: Send {
    /// The initial rule stack for the root rule.
    fn start(&self) -> GrammarState;

    /// Successor state if `token` extends a reachable rule, `None` otherwise.
    fn advance(&self, state: &GrammarState, token: u32) -> Option<GrammarState>;
}
