use super::*;
use crate::models::enums::{AnimationCurve, PortValueEnum};
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::models::values::{Color, LayerSize, Point3D, Position};
use crate::node_graph::loops::longest_loop_length;
use crate::node_graph::state::AnimationTrack;

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    match patch {
        Patch::ClassicAnimation => Some((
            "Classic Animation",
            "Eases from the current value to a new target over a duration.",
            "Animation",
        )),
        _ => None,
    }
}

pub(super) fn row_definitions(node_type: NodeType) -> NodeRowDefinitions {
    NodeRowDefinitions {
        inputs: vec![
            InputDefinition::new(0, "Number", node_type.default_value()),
            InputDefinition::fixed(1, "Duration", PortValue::Number(1.0)),
            InputDefinition::fixed(
                2,
                "Curve",
                PortValue::AnimationCurve(AnimationCurve::Linear),
            ),
        ],
        outputs: vec![OutputDefinition::new("", node_type)],
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Interpolates component-wise; non-interpolable values snap to `to`.
pub(crate) fn interpolate(from: &PortValue, to: &PortValue, t: f64) -> PortValue {
    match (from, to) {
        (PortValue::Number(a), PortValue::Number(b)) => PortValue::Number(lerp(*a, *b, t)),
        (PortValue::Position(a), PortValue::Position(b)) => {
            PortValue::Position(Position::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t)))
        }
        (PortValue::Size(a), PortValue::Size(b)) => PortValue::Size(LayerSize::new(
            lerp(a.width, b.width, t),
            lerp(a.height, b.height, t),
        )),
        (PortValue::Point3D(a), PortValue::Point3D(b)) => PortValue::Point3D(Point3D::new(
            lerp(a.x, b.x, t),
            lerp(a.y, b.y, t),
            lerp(a.z, b.z, t),
        )),
        (PortValue::Color(a), PortValue::Color(b)) => PortValue::Color(Color::new(
            lerp(a.r, b.r, t),
            lerp(a.g, b.g, t),
            lerp(a.b, b.b, t),
            lerp(a.a, b.a, t),
        )),
        _ => to.clone(),
    }
}

pub(super) fn classic_animation_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let node_type = ctx.node_type.unwrap_or(NodeType::Number);
    let now = ctx.graph_time();
    let len = longest_loop_length(ctx.inputs);
    let mut values = Vec::with_capacity(len);
    let mut run_again = false;

    for i in 0..len {
        let target = value_at(ctx.inputs, 0, i);
        let duration = value_at(ctx.inputs, 1, i).to_number(now);
        let curve = match value_at(ctx.inputs, 2, i) {
            PortValue::AnimationCurve(curve) => curve,
            other => AnimationCurve::from_number(other.to_number(now)),
        };
        let current = ctx
            .previous_output(0, i, node_type)
            .unwrap_or_else(|| target.clone());
        let key = (ctx.node_id, i);

        let retarget = ctx
            .state
            .animations
            .get(&key)
            .map_or(true, |track| track.to != target);
        if retarget {
            if current == target {
                ctx.state.animations.remove(&key);
                values.push(target);
                continue;
            }
            ctx.state.animations.insert(
                key,
                AnimationTrack {
                    from: current,
                    to: target.clone(),
                    start_time: now,
                },
            );
        }

        let Some(track) = ctx.state.animations.get(&key) else {
            values.push(target);
            continue;
        };
        let progress = if duration <= 0.0 {
            1.0
        } else {
            ((now - track.start_time) / duration).clamp(0.0, 1.0)
        };
        if progress >= 1.0 {
            ctx.state.animations.remove(&key);
            values.push(target);
        } else {
            values.push(interpolate(&track.from, &track.to, curve.ease(progress)));
            run_again = true;
        }
    }

    EvalResult {
        outputs: vec![values],
        run_again,
    }
}
