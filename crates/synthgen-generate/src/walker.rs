//! Recursive template walk.
//!
//! The output mirrors the template's shape: objects keep their keys in order,
//! arrays repeat their element pattern `nested_array_size` times, and only
//! primitive leaves are replaced by evaluated values.

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::functions::{EvalContext, evaluate};
use crate::output::json::to_line;

/// Walk `node` once, producing a fresh output tree.
pub fn walk(node: &Value, ctx: &mut EvalContext<'_>) -> Option<Value> {
    match node {
        Value::Object(map) => Some(walk_object(map, ctx)),
        Value::Array(items) => Some(walk_array(items, ctx)),
        Value::Null => Some(Value::Null),
        leaf => {
            let value = evaluate(leaf, ctx);
            match value.to_json() {
                Some(json) => Some(json),
                None => {
                    error!(kind = value.kind(), value = %value, "invalid type, not supported");
                    ctx.report.record_unsupported();
                    None
                }
            }
        }
    }
}

fn walk_object(map: &Map<String, Value>, ctx: &mut EvalContext<'_>) -> Value {
    let mut out = Map::with_capacity(map.len());
    for (key, node) in map {
        if let Some(value) = walk(node, ctx) {
            out.insert(key.clone(), value);
        }
    }
    Value::Object(out)
}

fn walk_array(items: &[Value], ctx: &mut EvalContext<'_>) -> Value {
    let mut out = Vec::with_capacity(items.len() * ctx.nested_array_size);
    for _ in 0..ctx.nested_array_size {
        for node in items {
            if let Some(value) = walk(node, ctx) {
                out.push(value);
            }
        }
    }
    Value::Array(out)
}

/// Output trees for a template: `record_count` objects for an object root,
/// a single repeated array for an array root, nothing otherwise.
pub fn generate_records(
    template: &Value,
    record_count: u64,
    ctx: &mut EvalContext<'_>,
) -> Vec<Value> {
    match template {
        Value::Object(map) => (0..record_count).map(|_| walk_object(map, ctx)).collect(),
        Value::Array(items) => vec![walk_array(items, ctx)],
        _ => {
            warn!("template root must be an object or an array");
            Vec::new()
        }
    }
}

/// Serialized records for a template, see [`generate_records`].
pub fn generate(template: &Value, record_count: u64, ctx: &mut EvalContext<'_>) -> Vec<String> {
    serialize_all(generate_records(template, record_count, ctx))
}

/// `count` serialized objects; non-object templates produce none.
pub fn generate_events(template: &Value, count: u64, ctx: &mut EvalContext<'_>) -> Vec<String> {
    match template {
        Value::Object(map) => serialize_all((0..count).map(|_| walk_object(map, ctx)).collect()),
        _ => Vec::new(),
    }
}

fn serialize_all(records: Vec<Value>) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match to_line(record) {
            Ok(line) => Some(line),
            Err(err) => {
                error!(error = %err, "failed to serialize record");
                None
            }
        })
        .collect()
}
