pub mod batch;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod session;

pub use batch::Batch;
pub use engine::{DecodeError, InferenceEngine};
pub use error::{Result, SessionError};
pub use session::{InferenceSession, SequenceState};

#[cfg(test)]
pub(crate) mod testing;
