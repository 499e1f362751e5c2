//! Finds the generated idea inside an untyped stage snapshot.

use std::collections::HashSet;

use crate::model::RawIdea;
use crate::state::{NodeId, StateGraph, StateNode};

const REQUIRED_FIELDS: [&str; 3] = ["title", "hook", "script_outline"];

/// Returns true when `id` is an object with string `title`, `hook` and
/// `script_outline` fields.
pub fn is_idea_shaped(graph: &StateGraph, id: NodeId) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|key| graph.str_field(id, key).is_some())
}

/// Finds the first idea-shaped node in depth-first, pre-order traversal.
///
/// Children are visited in key/index order. Each node is entered at most
/// once, which bounds the search on shared or cyclic graphs.
pub fn locate_idea(graph: &StateGraph) -> Option<NodeId> {
    let mut visited = HashSet::new();
    let mut stack = vec![graph.root()];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if is_idea_shaped(graph, id) {
            return Some(id);
        }
        match graph.get(id) {
            Some(StateNode::Object(entries)) => {
                stack.extend(entries.iter().rev().map(|(_, child)| *child));
            }
            Some(StateNode::Array(items)) => stack.extend(items.iter().rev().copied()),
            _ => {}
        }
    }
    None
}

/// Reads a located node into a `RawIdea`.
pub fn raw_idea_at(graph: &StateGraph, id: NodeId) -> Option<RawIdea> {
    let title = graph.str_field(id, "title")?;
    let hook = graph.str_field(id, "hook")?;
    let script_outline = graph.str_field(id, "script_outline")?;
    let tags = match graph.field(id, "tags") {
        Some(StateNode::Array(items)) => items
            .iter()
            .filter_map(|item| match graph.get(*item) {
                Some(StateNode::String(tag)) => Some(tag.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some(RawIdea {
        title: title.to_string(),
        hook: hook.to_string(),
        script_outline: script_outline.to_string(),
        tags,
        estimated_length: graph.str_field(id, "estimated_length").map(str::to_owned),
    })
}

/// Extracts the idea candidate from a stage snapshot.
///
/// A valid `idea` field at the top level wins; otherwise the whole snapshot
/// is searched.
pub fn idea_from_snapshot(state: &serde_json::Value) -> Option<RawIdea> {
    if let Some(direct) = state.get("idea").and_then(RawIdea::from_json) {
        return Some(direct);
    }
    let graph = StateGraph::from_json(state);
    let id = locate_idea(&graph)?;
    raw_idea_at(&graph, id)
}
