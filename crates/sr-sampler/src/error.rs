use thiserror::Error;

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("logits length {got} does not match vocab size {expected}")]
    LogitsLengthMismatch { expected: usize, got: usize },
    #[error("token id {token} out of range for vocab size {vocab_size}")]
    TokenOutOfRange { token: u32, vocab_size: usize },
    #[error("vocab size must be at least 1")]
    EmptyVocab,
}

pub type Result<T> = std::result::Result<T, SamplerError>;
