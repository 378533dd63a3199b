use super::*;
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::node_graph::loops::longest_loop_length;
use crate::node_graph::state::MediaSlot;

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    match patch {
        Patch::MediaImport => Some((
            "Media Import",
            "Loads media by key through the host.",
            "Media",
        )),
        _ => None,
    }
}

pub(super) fn row_definitions() -> NodeRowDefinitions {
    NodeRowDefinitions {
        inputs: vec![InputDefinition::fixed(0, "Key", PortValue::String(String::new()))],
        outputs: vec![OutputDefinition::new("Media", NodeType::AsyncMedia)],
    }
}

/// Outputs cached media per loop index, requesting a load whenever the key changes.
pub(super) fn media_import_eval(ctx: &mut NodeExecutionContext<'_>) -> EvalResult {
    let node_id = ctx.node_id;
    let len = longest_loop_length(ctx.inputs);
    let mut media = Vec::with_capacity(len);
    let mut requests = Vec::new();

    for i in 0..len {
        let key = value_at(ctx.inputs, 0, i).to_string();
        let slot_key = (node_id, i);
        if key.is_empty() {
            ctx.state.media.remove(&slot_key);
            media.push(PortValue::AsyncMedia(None));
            continue;
        }
        let slot = ctx.state.media.entry(slot_key).or_insert_with(|| MediaSlot {
            key: String::new(),
            media: None,
            loading: false,
        });
        if slot.key != key {
            slot.key = key.clone();
            slot.media = None;
            slot.loading = true;
            requests.push(EffectRequest::LoadMedia { loop_index: i, key });
        }
        media.push(PortValue::AsyncMedia(slot.media.clone()));
    }
    // Slots past the current loop length are stale.
    ctx.state
        .media
        .retain(|(id, index), _| *id != node_id || *index < len);

    for request in requests {
        ctx.request(request);
    }
    EvalResult::new(vec![media])
}
