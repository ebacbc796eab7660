//! Adapters for response shapes served by older backend builds.
//!
//! Older servers returned the post document's `reactionCounts` map instead of
//! the `{ total, reactions }` summary, and the stored reaction document
//! (`reactionType`) instead of `{ type }`. These adapters are only consulted
//! when `api.accept_legacy_shapes` is enabled and the strict decode failed.

use std::collections::BTreeMap;

use serde_json::Value;

use super::types::{ReactionSummary, ReactionType};

/// Convert a legacy counts payload into a summary.
///
/// Accepts `{ "reactionCounts": { .. } }`, optionally with a `total`, or a
/// bare `{ "LIKE": 2, .. }` map. Keys are matched case-insensitively; keys
/// that are not reaction types are ignored, as are negative or non-integer
/// counts. The total is always recomputed from the counts.
pub fn summary_from_legacy(value: &Value) -> Option<ReactionSummary> {
    let object = value.as_object()?;
    let counts = match object.get("reactionCounts") {
        Some(inner) => inner.as_object()?,
        None => object,
    };

    let mut reactions = BTreeMap::new();
    for (key, count) in counts {
        let Ok(reaction) = key.parse::<ReactionType>() else {
            continue;
        };
        if let Some(count) = count.as_u64() {
            reactions.insert(reaction, count);
        }
    }

    if reactions.is_empty() && !counts.is_empty() && !object.contains_key("reactionCounts") {
        // A bare map with nothing recognisable is not a counts payload.
        return None;
    }

    Some(ReactionSummary {
        total: reactions.values().sum(),
        reactions,
    })
}

/// Convert a legacy user-reaction payload.
///
/// Accepts the stored reaction document (`{ "reactionType": "LIKE", .. }`)
/// or a bare string. Returns `None` if the shape is not recognised and
/// `Some(None)` for an explicit absence of a reaction.
pub fn user_reaction_from_legacy(value: &Value) -> Option<Option<ReactionType>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => s.parse().ok().map(Some),
        Value::Object(object) => match object.get("reactionType")? {
            Value::Null => Some(None),
            Value::String(s) => s.parse().ok().map(Some),
            _ => None,
        },
        _ => None,
    }
}
