//! Core protocol types: the closed stage enumeration, gate and routing
//! decisions, and the terminal stage work result.

mod decision;
mod stage;

pub use decision::{GateDecision, PipelineVariant, RoutingDecision, StageWorkResult, WorkStatus};
pub use stage::{RequiredStages, StageName};
