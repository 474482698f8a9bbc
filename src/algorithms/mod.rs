pub mod conditional;
pub mod identity;
pub mod marginal;

pub use conditional::{ConditionalSampler, SamplerCache, SamplerConfig};
pub use identity::IdentitySampler;
pub use marginal::{MarginalConfig, MarginalSampler, MarginalTrainer};
