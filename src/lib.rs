//! Dataflow graph evaluation for interactive prototypes.
//!
//! Nodes hold typed loops of [`PortValue`]s. [`GraphEngine`] owns a graph, applies
//! edit intents, recalculates the downstream closure of whatever changed, and
//! folds timer and media completions back in on its own thread.

pub mod error;
pub mod models;
pub mod node_graph;
pub mod settings;

pub use error::{GraphError, GraphResult};
pub use models::node_kind::{Layer, LayerInputPort, NodeKind, Patch};
pub use models::node_type::NodeType;
pub use models::values::{Loop, PortValue};
pub use node_graph::{GraphEngine, GraphIntent, StepReport};
pub use settings::EngineSettings;
