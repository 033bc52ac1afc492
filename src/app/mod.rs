mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::{build_detection_fusion, OrchestratorOptions, TrackcamOrchestrator};
pub use types::{ComponentState, ShutdownReason};
