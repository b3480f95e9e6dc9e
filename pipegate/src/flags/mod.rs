//! Flag-service abstraction: the decision context a flag is evaluated
//! under and the provider port the handlers evaluate through.

mod context;
mod provider;

pub use context::{ContextKind, DecisionContext, DecisionContextBuilder};
pub use provider::{FlagProvider, SecretSource, FLAG_PIPELINE_VERSION, FLAG_REQUIRED_STAGES};
