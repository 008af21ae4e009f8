//! Traffic campaigns: scenario definitions, outcome classification and the orchestrator
//! that drives scenarios against a target API.

mod orchestrator;
mod outcome;
mod scenario;

pub use orchestrator::{CampaignResult, Orchestrator, ProgressFn};
pub use outcome::{AttemptStatus, RequestAttempt, RequestOutcome, classify};
pub use scenario::{EndpointTemplate, Escape, ExecutionMode, Scenario, ScenarioKind};
