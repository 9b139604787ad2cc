pub mod constraint;
pub mod error;
pub mod table;

pub use constraint::GrammarConstraint;
pub use error::{GrammarError, Result};
pub use table::{GrammarState, GrammarTable};
