//! Per-context visible-source lists of one table.
//!
//! A [`VisibleSources`] is loaded from the `visible-columns` or
//! `visible-foreign-keys` annotation of a table, edited in memory, and
//! rendered back with [`VisibleSources::to_annotation`]. The catalog handle
//! writes the result back to the table; see
//! [`Catalog::update_visible_sources`](crate::Catalog::update_visible_sources).

use super::positions::{normalize_positions, Placement, Positions};
use super::resolve::SourceResolver;
use super::spec::{RawSource, Source, SourceSpec};
use crate::catalog::{tag, ConstraintName};
use crate::column_map::ColumnMap;
use crate::context::{expand_context_set, Context};
use crate::error::{Error, Result, SourceError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Which visible-source annotation is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Columns,
    ForeignKeys,
}

impl SourceKind {
    /// Annotation tag holding this kind of source list.
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Columns => tag::VISIBLE_COLUMNS,
            SourceKind::ForeignKeys => tag::VISIBLE_FOREIGN_KEYS,
        }
    }
}

/// The value stored under one context key.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// An ordered list of sources.
    Sources(Vec<SourceSpec>),
    /// A facet list, stored as `{"and": [...]}`.
    Facets(Vec<SourceSpec>),
    /// The name of another context whose list is reused. Never edited.
    Alias(String),
}

impl ContextValue {
    /// The editable list, if this is not an alias.
    pub fn specs(&self) -> Option<&[SourceSpec]> {
        match self {
            ContextValue::Sources(specs) | ContextValue::Facets(specs) => Some(specs),
            ContextValue::Alias(_) => None,
        }
    }

    fn specs_mut(&mut self) -> Option<&mut Vec<SourceSpec>> {
        match self {
            ContextValue::Sources(specs) | ContextValue::Facets(specs) => Some(specs),
            ContextValue::Alias(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            ContextValue::Sources(specs) => {
                Value::Array(specs.iter().map(SourceSpec::to_value).collect())
            }
            ContextValue::Facets(specs) => {
                let mut map = Map::new();
                map.insert(
                    "and".to_string(),
                    Value::Array(specs.iter().map(SourceSpec::to_value).collect()),
                );
                Value::Object(map)
            }
            ContextValue::Alias(name) => Value::String(name.clone()),
        }
    }
}

/// Visible sources of one kind on one table, keyed by context.
#[derive(Debug, Clone)]
pub struct VisibleSources<'a> {
    resolver: SourceResolver<'a>,
    kind: SourceKind,
    contexts: IndexMap<Context, ContextValue>,
}

impl<'a> VisibleSources<'a> {
    /// Load and normalize the annotation of the resolver's table. A missing
    /// annotation loads as an empty set.
    pub fn load(resolver: SourceResolver<'a>, kind: SourceKind) -> Result<Self> {
        let mut sources = Self {
            resolver,
            kind,
            contexts: IndexMap::new(),
        };
        let Some(annotation) = resolver.table().def().annotations.get(kind.tag()) else {
            return Ok(sources);
        };
        let map = annotation.as_object().ok_or_else(|| {
            Error::Deserialization(format!("{} on {} is not an object", kind.tag(), resolver.table().name()))
        })?;
        for (key, value) in map {
            let context: Context = key.parse()?;
            let value = match value {
                Value::String(alias) => ContextValue::Alias(alias.clone()),
                Value::Array(items) => ContextValue::Sources(sources.normalize_all(items)?),
                Value::Object(facets) => {
                    let items = facets.get("and").and_then(Value::as_array).ok_or_else(|| {
                        Error::Deserialization(format!("context {key} has no \"and\" list"))
                    })?;
                    ContextValue::Facets(sources.normalize_all(items)?)
                }
                other => {
                    return Err(Error::Deserialization(format!(
                        "context {key} has unsupported value {other}"
                    )))
                }
            };
            sources.contexts.insert(context, value);
        }
        Ok(sources)
    }

    fn normalize_all(&self, items: &[Value]) -> Result<Vec<SourceSpec>> {
        items.iter().map(|v| self.resolver.normalize_value(v)).collect()
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn resolver(&self) -> SourceResolver<'a> {
        self.resolver
    }

    pub fn contexts(&self) -> impl Iterator<Item = Context> + '_ {
        self.contexts.keys().copied()
    }

    pub fn get(&self, context: Context) -> Option<&ContextValue> {
        self.contexts.get(&context)
    }

    /// The source list of a context; `None` for missing or alias contexts.
    pub fn sources(&self, context: Context) -> Option<&[SourceSpec]> {
        self.get(context).and_then(ContextValue::specs)
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Column names of a context's list in display order.
    pub fn column_names(&self, context: Context) -> Vec<String> {
        self.sources(context)
            .map(|specs| specs.iter().map(|s| self.resolver.column_name(s)).collect())
            .unwrap_or_default()
    }

    /// The form a spec is stored in: a column that is the only column of
    /// exactly one outgoing foreign key is shown as that relationship.
    fn preferred(&self, spec: SourceSpec) -> SourceSpec {
        if self.kind != SourceKind::Columns {
            return spec;
        }
        let linked = matches!(
            &spec.source,
            Source::Column(column) if self.resolver.outbound_for_column(column).is_some()
        );
        if linked {
            self.resolver.to_outbound(&spec).unwrap_or(spec)
        } else {
            spec
        }
    }

    /// Existing contexts selected by `contexts`; empty selects all.
    fn selected(&self, contexts: &[Context]) -> Vec<Context> {
        if contexts.is_empty() {
            return self.contexts.keys().copied().collect();
        }
        expand_context_set(contexts.iter().copied())
            .into_iter()
            .filter(|c| self.contexts.contains_key(c))
            .collect()
    }

    /// Set a context's list. An existing list is kept unless `replace`.
    pub fn insert_context(
        &mut self,
        context: Context,
        sources: impl IntoIterator<Item = RawSource>,
        replace: bool,
    ) -> Result<()> {
        let mut specs: Vec<SourceSpec> = Vec::new();
        for raw in sources {
            let spec = self.preferred(self.resolver.normalize(&raw)?);
            if !specs.iter().any(|s| s.source == spec.source) {
                specs.push(spec);
            }
        }
        for context in expand_context_set([context]) {
            if self.contexts.contains_key(&context) && !replace {
                continue;
            }
            let value = if context == Context::Filter && self.kind == SourceKind::Columns {
                ContextValue::Facets(specs.clone())
            } else {
                ContextValue::Sources(specs.clone())
            };
            debug!(context = %context, count = specs.len(), "set visible sources");
            self.contexts.insert(context, value);
        }
        Ok(())
    }

    /// Append sources to the existing contexts selected by `positions`, then
    /// apply its placements.
    ///
    /// Sources already present are skipped, as are asset companion columns
    /// in contexts that suppress them. Placements naming a suppressed column
    /// are dropped in those contexts.
    pub fn insert_sources(
        &mut self,
        sources: impl IntoIterator<Item = RawSource>,
        positions: &Positions,
    ) -> Result<()> {
        let mut specs = Vec::new();
        for raw in sources {
            specs.push(self.preferred(self.resolver.normalize(&raw)?));
        }
        let resolver = self.resolver;
        let kind = self.kind;
        let config = resolver.config();
        let table = resolver.table().def();

        for (context, placement) in normalize_positions(positions) {
            let Some(list) = self.contexts.get_mut(&context).and_then(ContextValue::specs_mut) else {
                continue;
            };
            let mut present: Vec<Source> = list
                .iter()
                .map(|s| preferred_source(resolver, kind, s))
                .collect();
            for spec in &specs {
                if present.contains(&spec.source) {
                    continue;
                }
                if config.suppresses(context)
                    && config.is_asset_companion(table, &resolver.column_name(spec))
                {
                    debug!(context = %context, source = %spec, "suppressed asset companion");
                    continue;
                }
                present.push(spec.source.clone());
                list.push(spec.clone());
            }
            let placement: Placement = if config.suppresses(context) {
                let listed: Vec<String> = list.iter().map(|s| resolver.column_name(s)).collect();
                let suppressed =
                    |column: &String| !listed.contains(column) && config.is_asset_companion(table, column);
                placement
                    .into_iter()
                    .filter(|(anchor, _)| !suppressed(anchor))
                    .map(|(anchor, moved)| {
                        let moved: Vec<String> = moved.into_iter().filter(|c| !suppressed(c)).collect();
                        (anchor, moved)
                    })
                    .collect()
            } else {
                placement
            };
            if !placement.is_empty() {
                *list = reorder_specs(resolver, list, &placement)?;
            }
        }
        Ok(())
    }

    /// Remove every source displaying one of `columns` from the selected
    /// contexts. Absent columns are ignored.
    pub fn delete_visible_source(&mut self, columns: &[&str], contexts: &[Context]) {
        let resolver = self.resolver;
        for context in self.selected(contexts) {
            if let Some(list) = self.contexts.get_mut(&context).and_then(ContextValue::specs_mut) {
                let before = list.len();
                list.retain(|spec| !columns.contains(&resolver.column_name(spec).as_str()));
                if list.len() != before {
                    debug!(context = %context, removed = before - list.len(), "deleted visible sources");
                }
            }
        }
    }

    /// Remove every path source that follows the constraint `name`.
    pub fn delete_paths_through(&mut self, name: &ConstraintName) {
        for list in self.contexts.values_mut().filter_map(ContextValue::specs_mut) {
            list.retain(|spec| !spec.passes_through(name));
        }
    }

    /// Redirect every hop following the constraint `from` to follow `to`.
    pub fn retarget_paths(&mut self, from: &ConstraintName, to: &ConstraintName) {
        for list in self.contexts.values_mut().filter_map(ContextValue::specs_mut) {
            for spec in list.iter_mut().filter(|spec| spec.passes_through(from)) {
                *spec = spec.rename_hops(|name| (name == from).then(|| to.clone()));
            }
        }
    }

    /// The annotation with every source rewritten for `map`. Leaves this set
    /// untouched.
    pub fn rename_columns(&self, map: &ColumnMap) -> Result<Value> {
        let mut renamed = self.clone();
        for list in renamed.contexts.values_mut().filter_map(ContextValue::specs_mut) {
            for spec in list.iter_mut() {
                *spec = self.resolver.rename(spec, map)?;
            }
        }
        Ok(renamed.to_annotation())
    }

    fn convert(
        &mut self,
        column: &str,
        contexts: &[Context],
        f: impl Fn(&SourceResolver<'a>, &SourceSpec) -> Result<SourceSpec>,
    ) -> Result<()> {
        let resolver = self.resolver;
        for context in self.selected(contexts) {
            if let Some(list) = self.contexts.get_mut(&context).and_then(ContextValue::specs_mut) {
                for spec in list.iter_mut() {
                    if resolver.column_name(spec) == column {
                        *spec = f(&resolver, spec)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Show `column` as its outgoing relationship in the selected contexts.
    pub fn make_outbound(&mut self, column: &str, contexts: &[Context]) -> Result<()> {
        self.convert(column, contexts, |r, spec| match spec.source {
            Source::Column(_) => r.to_outbound(spec),
            _ => Ok(spec.clone()),
        })
    }

    /// Show `column` as the bare column in the selected contexts.
    pub fn make_column(&mut self, column: &str, contexts: &[Context]) -> Result<()> {
        self.convert(column, contexts, |r, spec| match spec.single_outbound() {
            Some(_) => r.to_column(spec),
            None => Ok(spec.clone()),
        })
    }

    /// Move columns to follow their anchors in the contexts selected by
    /// `positions`.
    pub fn reorder(&mut self, positions: &Positions) -> Result<()> {
        let resolver = self.resolver;
        for (context, placement) in normalize_positions(positions) {
            if placement.is_empty() {
                continue;
            }
            if let Some(list) = self.contexts.get_mut(&context).and_then(ContextValue::specs_mut) {
                *list = reorder_specs(resolver, list, &placement)?;
            }
        }
        Ok(())
    }

    /// Render the annotation value.
    pub fn to_annotation(&self) -> Value {
        Value::Object(
            self.contexts
                .iter()
                .map(|(context, value)| (context.to_string(), value.to_value()))
                .collect(),
        )
    }
}

fn preferred_source(resolver: SourceResolver<'_>, kind: SourceKind, spec: &SourceSpec) -> Source {
    if kind == SourceKind::Columns {
        if let Source::Column(column) = &spec.source {
            if resolver.outbound_for_column(column).is_some() {
                if let Ok(outbound) = resolver.to_outbound(spec) {
                    return outbound.source;
                }
            }
        }
    }
    spec.source.clone()
}

fn invalid(resolver: SourceResolver<'_>, name: &str, reason: &str) -> Error {
    SourceError::new(resolver.table().name(), name, reason).into()
}

/// Reorder a list by column name. For each anchor in turn, its columns are
/// taken out and reinserted right after it; untouched columns keep their
/// relative order.
fn reorder_specs(
    resolver: SourceResolver<'_>,
    specs: &[SourceSpec],
    placement: &Placement,
) -> Result<Vec<SourceSpec>> {
    let mut names: Vec<String> = specs.iter().map(|s| resolver.column_name(s)).collect();

    for (anchor, moved) in placement {
        if !names.contains(anchor) {
            return Err(invalid(resolver, anchor, "anchor is not in the list"));
        }
        let mut taken: Vec<&String> = Vec::new();
        for column in moved {
            if column == anchor || taken.contains(&column) {
                continue;
            }
            let pos = names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| invalid(resolver, column, "column is not in the list"))?;
            names.remove(pos);
            taken.push(column);
        }
        let at = names
            .iter()
            .position(|n| n == anchor)
            .map(|p| p + 1)
            .ok_or_else(|| invalid(resolver, anchor, "anchor is not in the list"))?;
        for (offset, column) in taken.into_iter().enumerate() {
            names.insert(at + offset, column.clone());
        }
    }

    let mut by_name: HashMap<String, VecDeque<SourceSpec>> = HashMap::new();
    for spec in specs {
        by_name
            .entry(resolver.column_name(spec))
            .or_default()
            .push_back(spec.clone());
    }
    names
        .iter()
        .map(|name| {
            by_name
                .get_mut(name)
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| invalid(resolver, name, "lost while reordering"))
        })
        .collect()
}
