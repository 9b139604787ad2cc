use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Bad caller input, caught before any engine call.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Sampling or decode attempted on a sequence that was never begun.
    #[error("no active sequence with id {0}")]
    UninitializedContext(i32),
    /// The engine rejected a forward call. `committed` is how many tokens
    /// were already decoded and remain in the KV cache; no rollback happens.
    #[error("engine decode failed with status {status} after {committed} committed tokens")]
    DecodeFailure { status: i32, committed: u32 },
    #[error(transparent)]
    Sampler(#[from] sr_sampler::SamplerError),
    #[error(transparent)]
    Grammar(#[from] sr_grammar::GrammarError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
