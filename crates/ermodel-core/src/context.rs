//! Display contexts used as keys in visible-source annotations.

use crate::error::{ElementKind, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A named display mode of the web front-end.
///
/// `All` is a wildcard that expands to every concrete context. `Star` (`"*"`)
/// is itself concrete: it is the fallback used when no specific context
/// entry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Context {
    Compact,
    CompactBrief,
    CompactSelect,
    Detailed,
    Entry,
    EntryEdit,
    EntryCreate,
    Filter,
    RowName,
    RowNameTitle,
    RowNameCompact,
    RowNameDetailed,
    Star,
    All,
}

impl Context {
    /// Every concrete context, in declaration order.
    pub const CONCRETE: [Context; 13] = [
        Context::Compact,
        Context::CompactBrief,
        Context::CompactSelect,
        Context::Detailed,
        Context::Entry,
        Context::EntryEdit,
        Context::EntryCreate,
        Context::Filter,
        Context::RowName,
        Context::RowNameTitle,
        Context::RowNameCompact,
        Context::RowNameDetailed,
        Context::Star,
    ];

    /// The annotation key for this context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Compact => "compact",
            Context::CompactBrief => "compact/brief",
            Context::CompactSelect => "compact/select",
            Context::Detailed => "detailed",
            Context::Entry => "entry",
            Context::EntryEdit => "entry/edit",
            Context::EntryCreate => "entry/create",
            Context::Filter => "filter",
            Context::RowName => "row_name",
            Context::RowNameTitle => "row_name/title",
            Context::RowNameCompact => "row_name/compact",
            Context::RowNameDetailed => "row_name/detailed",
            Context::Star => "*",
            Context::All => "all",
        }
    }

    /// Whether this is one of the data-entry contexts.
    pub fn is_entry(&self) -> bool {
        matches!(self, Context::Entry | Context::EntryEdit | Context::EntryCreate)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Context::CONCRETE
            .iter()
            .chain(std::iter::once(&Context::All))
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| Error::not_found(ElementKind::Context, s))
    }
}

impl TryFrom<String> for Context {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Context> for String {
    fn from(value: Context) -> Self {
        value.as_str().to_string()
    }
}

/// Expand a set of contexts into concrete contexts.
///
/// `All` is replaced by every concrete context; it never survives expansion.
/// This is the single place where the wildcard is interpreted.
pub fn expand_context_set(input: impl IntoIterator<Item = Context>) -> BTreeSet<Context> {
    let mut out = BTreeSet::new();
    for context in input {
        if context == Context::All {
            out.extend(Context::CONCRETE);
        } else {
            out.insert(context);
        }
    }
    out
}
