pub mod candidates;
pub mod error;
pub mod mirostat;
pub mod params;
pub mod penalty;
pub mod shaper;
pub mod strategy;

pub use candidates::{Candidate, Candidates};
pub use error::{Result, SamplerError};
pub use mirostat::{MirostatV1, MirostatV2};
pub use params::SamplingParams;
pub use penalty::PenaltyFilter;
pub use shaper::{MinP, Shaper, ShaperPipeline, TailFree, Temperature, TopK, TopP, Typical};
pub use strategy::{sample_token, SamplerState, Strategy};
