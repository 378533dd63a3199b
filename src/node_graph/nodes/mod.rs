use crate::models::node_kind::{Layer, NodeKind, Patch};
use crate::models::node_type::NodeType;
use crate::models::schema::{NodeKindDef, NodeRowDefinitions, PortDef};
use crate::models::values::{Loop, PortValue};

use super::context::GraphStepState;
use super::effects::EffectRequest;
use super::loops::{looped, looped_single, value_at};
use super::node::Node;
use super::state::EphemeralState;
use super::NodeExecutionContext;

mod animation;
mod arithmetic;
mod layers;
mod logic;
mod loop_ops;
mod media;
mod time;
mod value;

pub use time::{delay_decision, DelayDecision};

/// Inputs to outputs, with no access to anything else.
pub type PureEval = fn(&[Loop], Option<NodeType>) -> Vec<Loop>;

/// May read and mutate ephemeral state and request effects.
pub type ImpureEval = fn(&mut NodeExecutionContext<'_>) -> EvalResult;

#[derive(Clone, Copy)]
pub enum NodeEval {
    Pure(PureEval),
    Impure(ImpureEval),
    /// Layers: inputs only, nothing to compute.
    Sink,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvalResult {
    pub outputs: Vec<Loop>,
    /// Evaluate again on the next graph step (animations in flight).
    pub run_again: bool,
}

impl EvalResult {
    pub fn new(outputs: Vec<Loop>) -> Self {
        Self {
            outputs,
            run_again: false,
        }
    }
}

const ARITHMETIC_TYPES: &[NodeType] = &[
    NodeType::Number,
    NodeType::Size,
    NodeType::Position,
    NodeType::Point3D,
];
const ADD_TYPES: &[NodeType] = &[
    NodeType::Number,
    NodeType::String,
    NodeType::Size,
    NodeType::Position,
    NodeType::Point3D,
    NodeType::Color,
];
const EQUATABLE_TYPES: &[NodeType] = &[NodeType::Number, NodeType::String];
const PACKABLE_TYPES: &[NodeType] = &[
    NodeType::Size,
    NodeType::Position,
    NodeType::Point3D,
    NodeType::Point4D,
];
const ANIMATABLE_TYPES: &[NodeType] = &[
    NodeType::Number,
    NodeType::Position,
    NodeType::Size,
    NodeType::Point3D,
    NodeType::Color,
];

impl NodeKind {
    /// Types a polymorphic kind can take. Empty for fixed kinds.
    pub fn supported_types(&self) -> &'static [NodeType] {
        let NodeKind::Patch(patch) = self else {
            return &[];
        };
        match patch {
            Patch::Value
            | Patch::Splitter
            | Patch::OptionPicker
            | Patch::LoopSelect
            | Patch::LoopBuilder
            | Patch::Delay
            | Patch::PulseOnChange => NodeType::ALL,
            Patch::Add => ADD_TYPES,
            Patch::Subtract
            | Patch::Multiply
            | Patch::Divide
            | Patch::Modulo
            | Patch::Power
            | Patch::Max
            | Patch::Min => ARITHMETIC_TYPES,
            Patch::Equals => EQUATABLE_TYPES,
            Patch::Pack | Patch::Unpack => PACKABLE_TYPES,
            Patch::ClassicAnimation => ANIMATABLE_TYPES,
            _ => &[],
        }
    }

    pub fn default_type(&self) -> Option<NodeType> {
        match self {
            NodeKind::Patch(Patch::Pack | Patch::Unpack) => Some(NodeType::Position),
            kind if kind.supported_types().is_empty() => None,
            _ => Some(NodeType::Number),
        }
    }

    /// Time-driven kinds recompute on every graph step.
    pub fn runs_every_graph_step(&self) -> bool {
        matches!(self, NodeKind::Patch(Patch::Time | Patch::RepeatingPulse))
    }

    /// Rows this kind has for `node_type`.
    pub fn row_definitions(&self, node_type: Option<NodeType>) -> NodeRowDefinitions {
        let node_type = node_type.or(self.default_type()).unwrap_or(NodeType::Number);
        match self {
            NodeKind::Layer(layer) => layers::row_definitions(*layer),
            NodeKind::Patch(patch) => match patch {
                Patch::Value | Patch::Splitter | Patch::OptionPicker | Patch::Pack
                | Patch::Unpack | Patch::ColorToHex | Patch::HexToColor => {
                    value::row_definitions(*patch, node_type)
                }
                Patch::Add
                | Patch::Subtract
                | Patch::Multiply
                | Patch::Divide
                | Patch::Modulo
                | Patch::Power
                | Patch::Max
                | Patch::Min
                | Patch::Absolute
                | Patch::Round
                | Patch::Clip => arithmetic::row_definitions(*patch, node_type),
                Patch::Equals
                | Patch::GreaterThan
                | Patch::LessThan
                | Patch::Not
                | Patch::And
                | Patch::Or => logic::row_definitions(*patch, node_type),
                Patch::LoopSelect | Patch::LoopBuilder | Patch::LoopCount => {
                    loop_ops::row_definitions(*patch, node_type)
                }
                Patch::Delay
                | Patch::Time
                | Patch::RepeatingPulse
                | Patch::Counter
                | Patch::PulseOnChange => time::row_definitions(*patch, node_type),
                Patch::ClassicAnimation => animation::row_definitions(node_type),
                Patch::MediaImport => media::row_definitions(),
            },
        }
    }

    /// The one eval associated with this kind.
    pub fn eval(&self) -> NodeEval {
        let NodeKind::Patch(patch) = self else {
            return NodeEval::Sink;
        };
        match patch {
            Patch::Value | Patch::Splitter => NodeEval::Pure(value::identity_eval),
            Patch::OptionPicker => NodeEval::Pure(value::option_picker_eval),
            Patch::Pack => NodeEval::Pure(value::pack_eval),
            Patch::Unpack => NodeEval::Pure(value::unpack_eval),
            Patch::ColorToHex => NodeEval::Pure(value::color_to_hex_eval),
            Patch::HexToColor => NodeEval::Pure(value::hex_to_color_eval),
            Patch::Add => NodeEval::Pure(arithmetic::add_eval),
            Patch::Subtract => NodeEval::Pure(arithmetic::subtract_eval),
            Patch::Multiply => NodeEval::Pure(arithmetic::multiply_eval),
            Patch::Divide => NodeEval::Pure(arithmetic::divide_eval),
            Patch::Modulo => NodeEval::Pure(arithmetic::modulo_eval),
            Patch::Power => NodeEval::Pure(arithmetic::power_eval),
            Patch::Max => NodeEval::Pure(arithmetic::max_eval),
            Patch::Min => NodeEval::Pure(arithmetic::min_eval),
            Patch::Absolute => NodeEval::Pure(arithmetic::absolute_eval),
            Patch::Round => NodeEval::Pure(arithmetic::round_eval),
            Patch::Clip => NodeEval::Pure(arithmetic::clip_eval),
            Patch::Equals => NodeEval::Pure(logic::equals_eval),
            Patch::GreaterThan => NodeEval::Pure(logic::greater_than_eval),
            Patch::LessThan => NodeEval::Pure(logic::less_than_eval),
            Patch::Not => NodeEval::Pure(logic::not_eval),
            Patch::And => NodeEval::Pure(logic::and_eval),
            Patch::Or => NodeEval::Pure(logic::or_eval),
            Patch::LoopSelect => NodeEval::Pure(loop_ops::loop_select_eval),
            Patch::LoopBuilder => NodeEval::Pure(loop_ops::loop_builder_eval),
            Patch::LoopCount => NodeEval::Pure(loop_ops::loop_count_eval),
            Patch::Delay => NodeEval::Impure(time::delay_eval),
            Patch::Time => NodeEval::Impure(time::time_eval),
            Patch::RepeatingPulse => NodeEval::Impure(time::repeating_pulse_eval),
            Patch::Counter => NodeEval::Impure(time::counter_eval),
            Patch::PulseOnChange => NodeEval::Impure(time::pulse_on_change_eval),
            Patch::ClassicAnimation => NodeEval::Impure(animation::classic_animation_eval),
            Patch::MediaImport => NodeEval::Impure(media::media_import_eval),
        }
    }

    pub fn is_impure(&self) -> bool {
        matches!(self.eval(), NodeEval::Impure(_))
    }

    fn describe(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            NodeKind::Layer(layer) => layers::describe(*layer),
            NodeKind::Patch(patch) => value::describe(*patch)
                .or_else(|| arithmetic::describe(*patch))
                .or_else(|| logic::describe(*patch))
                .or_else(|| loop_ops::describe(*patch))
                .or_else(|| time::describe(*patch))
                .or_else(|| animation::describe(*patch))
                .or_else(|| media::describe(*patch))
                .unwrap_or(("Unknown", "", "Other")),
        }
    }
}

/// Runs `node`'s eval over its current input loops.
pub(crate) fn evaluate(
    node: &Node,
    step: &GraphStepState,
    state: &mut EphemeralState,
    effects: &mut Vec<EffectRequest>,
) -> EvalResult {
    let inputs = node.input_loops();
    match node.kind.eval() {
        NodeEval::Pure(eval) => EvalResult::new(eval(&inputs, node.node_type())),
        NodeEval::Impure(eval) => {
            let previous_outputs = node.output_loops();
            let mut ctx = NodeExecutionContext {
                node_id: node.id,
                node_type: node.node_type(),
                inputs: &inputs,
                previous_outputs: &previous_outputs,
                step,
                state,
                effects,
            };
            eval(&mut ctx)
        }
        NodeEval::Sink => EvalResult::new(node.output_loops()),
    }
}

/// Catalog of every node kind, for an insert-node menu.
pub fn get_node_types() -> Vec<NodeKindDef> {
    let kinds = Patch::ALL
        .iter()
        .map(|patch| NodeKind::Patch(*patch))
        .chain(Layer::ALL.iter().map(|layer| NodeKind::Layer(*layer)));
    kinds
        .map(|kind| {
            let (name, description, category) = kind.describe();
            let rows = kind.row_definitions(kind.default_type());
            NodeKindDef {
                kind,
                name: name.into(),
                description: Some(description.into()).filter(|d: &String| !d.is_empty()),
                category: Some(category.into()),
                default_type: kind.default_type(),
                supported_types: kind.supported_types().to_vec(),
                inputs: rows
                    .inputs
                    .iter()
                    .map(|def| PortDef {
                        id: def.port,
                        name: def.label.clone(),
                        node_type: def.node_type(),
                        is_type_static: def.is_type_static,
                    })
                    .collect(),
                outputs: rows
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(i, def)| PortDef {
                        id: crate::models::node_graph::PortId::Index(i),
                        name: def.label.clone(),
                        node_type: def.node_type,
                        is_type_static: true,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Number component of a broadcast argument.
fn number(args: &[PortValue], port: usize) -> f64 {
    args.get(port).map(|v| v.to_number(0.0)).unwrap_or(0.0)
}

fn arg(args: &[PortValue], port: usize) -> PortValue {
    args.get(port).cloned().unwrap_or(PortValue::None)
}
