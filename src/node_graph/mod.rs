pub mod coercion;
mod context;
pub mod effects;
mod engine;
mod executor;
mod graph;
pub mod loops;
mod node;
mod node_execution_context;
mod rows;
mod state;

pub mod nodes;

pub use crate::models::node_graph::*;
pub use context::{FieldRefreshThrottle, GraphStepState};
pub use effects::{
    EffectEvent, EffectKind, EffectSender, Generation, MediaLoader, MediaReply, MediaRequest,
    TimerDriver,
};
pub use engine::{GraphEngine, GraphIntent, IntentOutcome, StepReport};
pub use executor::RunSummary;
pub use graph::Graph;
pub use node::{Node, RowsRemoved};
pub use node_execution_context::NodeExecutionContext;
pub use rows::{InputRow, OutputRow};
pub use state::{AnimationTrack, EphemeralState, MediaSlot, TimerBank};

/// A broken internal contract: fatal in debug builds, logged and survived in release.
pub(crate) fn invariant_violated(context: &str) {
    log::error!("invariant violated: {context}");
    debug_assert!(false, "invariant violated: {context}");
}

#[cfg(test)]
mod tests;
