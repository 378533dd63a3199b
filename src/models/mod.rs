pub mod enums;
pub mod node_graph;
pub mod node_kind;
pub mod node_type;
pub mod schema;
pub mod values;
