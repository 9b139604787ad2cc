use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("token {token} violates the grammar at the current position")]
    Violation { token: u32 },
}

pub type Result<T> = std::result::Result<T, GrammarError>;
