pub mod context;
pub mod error;
pub mod gate;
pub mod links;
pub mod normalize;
pub mod preprocess;
pub mod prompts;
pub mod runner;
pub mod stages;

pub use context::{BatchSummary, MessageOutcome};
pub use error::{DropReason, PipelineError};
pub use gate::GatePolicy;
pub use links::LinkResolver;
pub use runner::Pipeline;
