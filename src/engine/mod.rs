//! The proposal pipeline: encode → build → simulate → sign → submit.

mod builder;
mod encoder;
mod envelope;
mod error;
mod pipeline;

pub use builder::EnvelopeBuilder;
pub use encoder::{EncodingError, Invocation, PROPOSE_TRANSFER_FN, ProposalRequest, parse_amount};
pub use envelope::{Envelope, EnvelopeError, EnvelopeState};
pub use error::{ProposeError, ProposeResult};
pub use pipeline::{PipelineSettings, ProposalPipeline};
