use std::cmp::Ordering;

use uuid::Uuid;

use super::*;
use crate::models::enums::{DelayStyle, PortValueEnum};
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::node_graph::coercion::compare_values;
use crate::node_graph::loops::longest_loop_length;

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match patch {
        Patch::Delay => (
            "Delay",
            "Holds a changed value back for a number of seconds.",
            "Time",
        ),
        Patch::Time => ("Time", "Seconds and frames since the prototype started.", "Time"),
        Patch::RepeatingPulse => (
            "Repeating Pulse",
            "Pulses every given number of seconds.",
            "Time",
        ),
        Patch::Counter => ("Counter", "Counts pulses up and down.", "Time"),
        Patch::PulseOnChange => ("Pulse On Change", "Pulses when its input changes.", "Time"),
        _ => return None,
    };
    Some(entry)
}

pub(super) fn row_definitions(patch: Patch, node_type: NodeType) -> NodeRowDefinitions {
    match patch {
        Patch::Delay => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::new(0, "Value", node_type.default_value()).copying(),
                InputDefinition::fixed(1, "Delay", PortValue::Number(1.0)),
                InputDefinition::fixed(2, "Style", PortValue::DelayStyle(DelayStyle::Always)),
            ],
            outputs: vec![OutputDefinition::new("Value", node_type)],
        },
        Patch::Time => NodeRowDefinitions {
            inputs: Vec::new(),
            outputs: vec![
                OutputDefinition::new("Time", NodeType::Number),
                OutputDefinition::new("Frame", NodeType::Number),
            ],
        },
        Patch::RepeatingPulse => NodeRowDefinitions {
            inputs: vec![InputDefinition::fixed(0, "Frequency", PortValue::Number(3.0))],
            outputs: vec![OutputDefinition::new("Pulse", NodeType::Pulse)],
        },
        Patch::Counter => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::fixed(0, "Increase", PortValue::Pulse(0.0)),
                InputDefinition::fixed(1, "Decrease", PortValue::Pulse(0.0)),
                InputDefinition::fixed(2, "Jump", PortValue::Pulse(0.0)),
                InputDefinition::fixed(3, "Jump to Number", PortValue::Number(0.0)),
                InputDefinition::fixed(4, "Maximum Count", PortValue::Number(0.0)),
            ],
            outputs: vec![OutputDefinition::new("", NodeType::Number)],
        },
        _ => NodeRowDefinitions {
            inputs: vec![InputDefinition::new(0, "Value", node_type.default_value())],
            outputs: vec![OutputDefinition::new("Pulse", NodeType::Pulse)],
        },
    }
}

/// What a delay does with one loop index.
#[derive(Clone, Debug, PartialEq)]
pub struct DelayDecision {
    pub output: PortValue,
    pub start_timer: bool,
}

/// Decides between holding the current output behind a timer and passing
/// `input` straight through.
///
/// Directional styles only hold values that move in their direction relative
/// to the last value seen; incomparable values always wait.
pub fn delay_decision(
    style: DelayStyle,
    input: &PortValue,
    last_input: Option<&PortValue>,
    current_output: &PortValue,
) -> DelayDecision {
    let favorable = |wanted: Ordering| match last_input {
        None => true,
        Some(last) => compare_values(input, last).map_or(true, |o| o == wanted),
    };
    let start_timer = match style {
        DelayStyle::Always => true,
        DelayStyle::Increasing => favorable(Ordering::Greater),
        DelayStyle::Decreasing => favorable(Ordering::Less),
    };
    DelayDecision {
        output: if start_timer {
            current_output.clone()
        } else {
            input.clone()
        },
        start_timer,
    }
}

pub(super) fn delay_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let node_type = ctx.node_type.unwrap_or(NodeType::Number);
    let node_id = ctx.node_id;
    let len = longest_loop_length(ctx.inputs);
    // Indices past the current loop are gone, along with their timers.
    if let Some(bank) = ctx.state.timers.get_mut(&node_id) {
        bank.pending.retain(|_, index| *index < len);
        bank.fired.retain(|index, _| *index < len);
        bank.last_inputs.retain(|index, _| *index < len);
    }

    let mut outputs = Vec::with_capacity(len);
    let mut requests = Vec::new();
    for i in 0..len {
        let input = value_at(ctx.inputs, 0, i);
        let delay_seconds = value_at(ctx.inputs, 1, i).to_number(0.0);
        let style = match value_at(ctx.inputs, 2, i) {
            PortValue::DelayStyle(style) => style,
            other => DelayStyle::from_number(other.to_number(0.0)),
        };

        let bank = ctx.state.timers.entry(node_id).or_default();
        let mut current = match bank.fired.remove(&i) {
            Some(value) => value,
            None => ctx
                .previous_outputs
                .first()
                .and_then(|values| values.get(i))
                .filter(|value| value.node_type() == node_type)
                .cloned()
                .unwrap_or_else(|| node_type.default_value()),
        };
        if current.node_type() != node_type {
            current = current.coerce(node_type, ctx.step.graph_time);
        }

        let last_input = bank.last_inputs.get(&i);
        let settled = match last_input {
            Some(last) => *last == input,
            None => input == current,
        };
        if settled {
            bank.last_inputs.insert(i, input);
            outputs.push(current);
            continue;
        }

        let decision = delay_decision(style, &input, bank.last_inputs.get(&i), &current);
        bank.last_inputs.insert(i, input.clone());
        if decision.start_timer {
            let timer_id = Uuid::new_v4();
            bank.pending.insert(timer_id, i);
            requests.push(EffectRequest::StartTimer {
                timer_id,
                loop_index: i,
                delay_seconds,
                value: input,
            });
        }
        outputs.push(decision.output);
    }
    for request in requests {
        ctx.request(request);
    }
    EvalResult::new(vec![outputs])
}

pub(super) fn time_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    EvalResult::new(vec![
        vec![PortValue::Number(ctx.step.graph_time)],
        vec![PortValue::Number(ctx.step.frame_count as f64)],
    ])
}

pub(super) fn repeating_pulse_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let now = ctx.graph_time();
    let len = longest_loop_length(ctx.inputs);
    let mut pulses = Vec::with_capacity(len);
    for i in 0..len {
        let frequency = value_at(ctx.inputs, 0, i).to_number(now);
        let key = (ctx.node_id, i);
        let previous = ctx
            .previous_output(0, i, NodeType::Pulse)
            .unwrap_or(PortValue::Pulse(0.0));
        match ctx.state.last_pulses.get(&key).copied() {
            None => {
                ctx.state.last_pulses.insert(key, now);
                pulses.push(previous);
            }
            Some(last) if frequency > 0.0 && now - last >= frequency - 1e-9 => {
                ctx.state.last_pulses.insert(key, now);
                pulses.push(PortValue::Pulse(now));
            }
            Some(_) => pulses.push(previous),
        }
    }
    EvalResult::new(vec![pulses])
}

pub(super) fn counter_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let now = ctx.graph_time();
    let node_id = ctx.node_id;
    let len = longest_loop_length(ctx.inputs);
    let mut counts = Vec::with_capacity(len);
    for i in 0..len {
        // A pulse stays truthy for its whole frame; count each one once.
        let mut pulsed = [false; 3];
        for (port, fired) in pulsed.iter_mut().enumerate() {
            if value_at(ctx.inputs, port, i).is_truthy(now) {
                *fired = ctx
                    .state
                    .consumed_pulses
                    .insert((node_id, i, port), now)
                    .map_or(true, |last| last < now);
            }
        }
        let [increase, decrease, jump] = pulsed;

        let mut count = ctx
            .previous_output(0, i, NodeType::Number)
            .map(|v| v.to_number(now))
            .unwrap_or(0.0);
        if jump {
            count = value_at(ctx.inputs, 3, i).to_number(now);
        }
        if increase {
            count += 1.0;
        }
        if decrease {
            count -= 1.0;
        }
        let max = value_at(ctx.inputs, 4, i).to_number(now);
        if max > 0.0 {
            if count >= max {
                count = 0.0;
            } else if count < 0.0 {
                count = max - 1.0;
            }
        }
        counts.push(PortValue::Number(count));
    }
    ctx.state
        .consumed_pulses
        .retain(|(id, index, _), _| *id != node_id || *index < len);
    EvalResult::new(vec![counts])
}

pub(super) fn pulse_on_change_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let now = ctx.graph_time();
    let len = longest_loop_length(ctx.inputs);
    let mut pulses = Vec::with_capacity(len);
    for i in 0..len {
        let value = value_at(ctx.inputs, 0, i);
        let previous_pulse = ctx
            .previous_output(0, i, NodeType::Pulse)
            .unwrap_or(PortValue::Pulse(0.0));
        let changed = ctx
            .state
            .previous_values
            .insert((ctx.node_id, i), value.clone())
            .is_some_and(|previous| previous != value);
        pulses.push(if changed {
            PortValue::Pulse(now)
        } else {
            previous_pulse
        });
    }
    EvalResult::new(vec![pulses])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_style_holds_the_current_output() {
        let decision = delay_decision(
            DelayStyle::Always,
            &PortValue::Number(1.0),
            Some(&PortValue::Number(0.0)),
            &PortValue::Number(0.0),
        );
        assert_eq!(
            decision,
            DelayDecision {
                output: PortValue::Number(0.0),
                start_timer: true
            }
        );
    }

    #[test]
    fn increasing_style_passes_decreases_through() {
        let rising = delay_decision(
            DelayStyle::Increasing,
            &PortValue::Number(5.0),
            Some(&PortValue::Number(3.0)),
            &PortValue::Number(3.0),
        );
        assert!(rising.start_timer);

        let falling = delay_decision(
            DelayStyle::Increasing,
            &PortValue::Number(1.0),
            Some(&PortValue::Number(3.0)),
            &PortValue::Number(3.0),
        );
        assert_eq!(
            falling,
            DelayDecision {
                output: PortValue::Number(1.0),
                start_timer: false
            }
        );
    }

    #[test]
    fn decreasing_style_waits_on_the_first_value() {
        let first = delay_decision(
            DelayStyle::Decreasing,
            &PortValue::Number(1.0),
            None,
            &PortValue::Number(0.0),
        );
        assert!(first.start_timer);
    }

    #[test]
    fn delay_decision_is_repeatable() {
        let args = (
            DelayStyle::Increasing,
            PortValue::Number(2.0),
            PortValue::Number(4.0),
            PortValue::Number(4.0),
        );
        let first = delay_decision(args.0, &args.1, Some(&args.2), &args.3);
        let second = delay_decision(args.0, &args.1, Some(&args.2), &args.3);
        assert_eq!(first, second);
    }
}
