pub mod min_p;
pub mod tail_free;
pub mod temperature;
pub mod top_k;
pub mod top_p;
pub mod typical;

pub use min_p::MinP;
pub use tail_free::TailFree;
pub use temperature::Temperature;
pub use top_k::TopK;
pub use top_p::TopP;
pub use typical::Typical;

use crate::candidates::Candidates;
use crate::params::SamplingParams;

/// One stage of the distribution-shaping pipeline.
///
/// Stages modify the candidate set in place: truncating it, reordering it, or
/// rescaling logits. Each stage treats its neutral parameter value as a no-op.
pub trait Shaper {
    /// Returns the name of this stage.
    fn name(&self) -> &str;

    /// Apply the stage to the candidate set.
    fn apply(&self, candidates: &mut Candidates);
}

/// The full shaping pipeline in its fixed order:
/// top-k, tail-free, typical, top-p, min-p, temperature.
///
/// The order is load-bearing: running top-k before top-p yields a different
/// distribution than the reverse, so the pipeline is not reorderable.
pub struct ShaperPipeline {
    stages: Vec<Box<dyn Shaper>>,
}

impl ShaperPipeline {
    pub fn from_params(params: &SamplingParams) -> Self {
        let stages: Vec<Box<dyn Shaper>> = vec![
            Box::new(TopK { k: params.top_k }),
            Box::new(TailFree { z: params.tsf }),
            Box::new(Typical { p: params.typical }),
            Box::new(TopP { p: params.top_p }),
            Box::new(MinP { p: params.min_p }),
            Box::new(Temperature {
                temperature: params.temperature,
                dynatemp_range: params.dynatemp_range,
                dynatemp_exponent: params.dynatemp_exponent,
            }),
        ];
        ShaperPipeline { stages }
    }

    pub fn apply(&self, candidates: &mut Candidates) {
        for stage in &self.stages {
            stage.apply(candidates);
        }
    }
}
