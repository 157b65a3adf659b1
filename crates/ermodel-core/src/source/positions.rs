//! Placement requests for reordering visible sources.

use crate::context::{expand_context_set, Context};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Anchor column to the columns placed directly after it, in order.
pub type Placement = IndexMap<String, Vec<String>>;

/// A positions request in one of its shorthand notations.
#[derive(Debug, Clone, PartialEq)]
pub enum Positions {
    /// Select contexts without moving anything. An empty list selects all.
    Contexts(Vec<Context>),
    /// One placement applied to every concrete context.
    Flat(Placement),
    /// A placement per context.
    Qualified(IndexMap<Context, Placement>),
}

impl Default for Positions {
    fn default() -> Self {
        Positions::Contexts(Vec::new())
    }
}

impl Positions {
    /// Every context, no placement.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single anchor applied to every context.
    pub fn after(anchor: impl Into<String>, moved: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut placement = Placement::new();
        placement.insert(anchor.into(), moved.into_iter().map(Into::into).collect());
        Positions::Flat(placement)
    }

    /// Parse the JSON notation: a list (or single string) of context names,
    /// a flat `{anchor: [columns]}` object, or `{context: {anchor: [columns]}}`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Positions::Contexts(vec![name.parse::<Context>()?])),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| Error::Deserialization(format!("context {item} is not a string")))?
                        .parse::<Context>()
                })
                .collect::<Result<Vec<Context>>>()
                .map(Positions::Contexts),
            Value::Object(map) => {
                if !map.is_empty() && map.values().all(Value::is_object) {
                    let mut qualified: IndexMap<Context, Placement> = IndexMap::new();
                    for (context, placement) in map {
                        qualified.insert(context.parse::<Context>()?, parse_placement(placement)?);
                    }
                    Ok(Positions::Qualified(qualified))
                } else {
                    parse_placement(value).map(Positions::Flat)
                }
            }
            other => Err(Error::Deserialization(format!("unsupported positions {other}"))),
        }
    }
}

fn parse_placement(value: &Value) -> Result<Placement> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::Deserialization(format!("placement {value} is not an object")))?;
    let mut placement = Placement::new();
    for (anchor, moved) in map {
        let moved = moved
            .as_array()
            .ok_or_else(|| Error::Deserialization(format!("columns after {anchor} are not a list")))?
            .iter()
            .map(|c| {
                c.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::Deserialization(format!("column {c} is not a string")))
            })
            .collect::<Result<Vec<_>>>()?;
        placement.insert(anchor.clone(), moved);
    }
    Ok(placement)
}

/// Reduce any positions notation to one placement per concrete context,
/// in context declaration order.
///
/// Wildcard contexts are expanded; when several entries land on the same
/// context their placements are merged in request order.
pub fn normalize_positions(positions: &Positions) -> IndexMap<Context, Placement> {
    let mut out: IndexMap<Context, Placement> = IndexMap::new();
    match positions {
        Positions::Contexts(contexts) => {
            let selected = if contexts.is_empty() {
                expand_context_set([Context::All])
            } else {
                expand_context_set(contexts.iter().copied())
            };
            for context in selected {
                out.insert(context, Placement::new());
            }
        }
        Positions::Flat(placement) => {
            for context in expand_context_set([Context::All]) {
                out.insert(context, placement.clone());
            }
        }
        Positions::Qualified(map) => {
            for (context, placement) in map {
                for context in expand_context_set([*context]) {
                    let merged = out.entry(context).or_default();
                    for (anchor, moved) in placement {
                        let slot = merged.entry(anchor.clone()).or_default();
                        for column in moved {
                            if !slot.contains(column) {
                                slot.push(column.clone());
                            }
                        }
                    }
                }
            }
            out.sort_keys();
        }
    }
    out
}
