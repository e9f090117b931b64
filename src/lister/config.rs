// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::query::{CompiledPath, PathError};

/// Computed column: derives a cell value from the raw record when a path
/// expression is not enough.
pub type ComputedColumn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Record predicate for relation-filtered listers ("only instances belonging
/// to this group"). Rejected records are discarded before they become entries.
pub type RecordPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Where a column's value comes from: a path evaluated against the record, or
/// a computed function.
#[derive(Clone)]
pub enum ColumnSource {
    Path(CompiledPath),
    Computed(ComputedColumn),
}

impl fmt::Debug for ColumnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(&path.as_str()).finish(),
            Self::Computed(_) => f.debug_tuple("Computed").field(&"<fn>").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    name: String,
    min_width: u16,
    source: ColumnSource,
}

impl ColumnSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_width(&self) -> u16 {
        self.min_width
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    /// Reverse-lexicographic; used by time-ordered resources such as event
    /// streams where the newest row belongs on top.
    Descending,
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// Declarative description of one resource browser, validated eagerly at
/// construction: a malformed config is a programming error in a resource
/// module, not a runtime condition, so it fails fast instead of surfacing
/// mid-refresh.
#[derive(Clone)]
pub struct ListerConfig {
    resource_key: String,
    title: String,
    list_method: String,
    list_args: Map<String, Value>,
    item_path: CompiledPath,
    columns: Vec<ColumnSpec>,
    hidden_columns: Vec<ColumnSpec>,
    primary_key: Option<String>,
    sort: SortSpec,
    next_marker_field: Option<CompiledPath>,
    next_marker_arg: Option<String>,
    matches: Option<RecordPredicate>,
}

// Manual impl because `matches` is an opaque closure.
impl fmt::Debug for ListerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListerConfig")
            .field("resource_key", &self.resource_key)
            .field("list_method", &self.list_method)
            .field("item_path", &self.item_path.as_str())
            .field("primary_key", &self.primary_key)
            .field("sort", &self.sort)
            .finish_non_exhaustive()
    }
}

impl ListerConfig {
    pub fn builder(
        resource_key: impl Into<String>,
        title: impl Into<String>,
        list_method: impl Into<String>,
        item_path: impl Into<String>,
    ) -> ListerConfigBuilder {
        ListerConfigBuilder {
            resource_key: resource_key.into(),
            title: title.into(),
            list_method: list_method.into(),
            item_path: item_path.into(),
            list_args: Map::new(),
            columns: Vec::new(),
            hidden_columns: Vec::new(),
            primary_key: None,
            sort_column: None,
            sort_order: SortOrder::Ascending,
            next_marker_field: None,
            next_marker_arg: None,
            matches: None,
        }
    }

    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn list_method(&self) -> &str {
        &self.list_method
    }

    pub fn list_args(&self) -> &Map<String, Value> {
        &self.list_args
    }

    pub fn item_path(&self) -> &CompiledPath {
        &self.item_path
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn hidden_columns(&self) -> &[ColumnSpec] {
        &self.hidden_columns
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn next_marker(&self) -> Option<(&CompiledPath, &str)> {
        match (&self.next_marker_field, &self.next_marker_arg) {
            (Some(field), Some(arg)) => Some((field, arg.as_str())),
            _ => None,
        }
    }

    pub fn matches(&self) -> Option<&RecordPredicate> {
        self.matches.as_ref()
    }
}

pub struct ListerConfigBuilder {
    resource_key: String,
    title: String,
    list_method: String,
    item_path: String,
    list_args: Map<String, Value>,
    columns: Vec<(String, u16, RawSource)>,
    hidden_columns: Vec<(String, RawSource)>,
    primary_key: Option<String>,
    sort_column: Option<String>,
    sort_order: SortOrder,
    next_marker_field: Option<String>,
    next_marker_arg: Option<String>,
    matches: Option<RecordPredicate>,
}

enum RawSource {
    Path(String),
    Computed(ComputedColumn),
}

impl ListerConfigBuilder {
    pub fn arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.list_args.insert(key.into(), value);
        self
    }

    pub fn column(
        mut self,
        name: impl Into<String>,
        min_width: u16,
        path: impl Into<String>,
    ) -> Self {
        self.columns.push((name.into(), min_width, RawSource::Path(path.into())));
        self
    }

    pub fn computed_column(
        mut self,
        name: impl Into<String>,
        min_width: u16,
        compute: ComputedColumn,
    ) -> Self {
        self.columns.push((name.into(), min_width, RawSource::Computed(compute)));
        self
    }

    pub fn hidden(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.hidden_columns.push((name.into(), RawSource::Path(path.into())));
        self
    }

    pub fn hidden_computed(mut self, name: impl Into<String>, compute: ComputedColumn) -> Self {
        self.hidden_columns.push((name.into(), RawSource::Computed(compute)));
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort_column = Some(column.into());
        self.sort_order = order;
        self
    }

    /// Continuation token wiring: `field` is extracted from each response,
    /// `arg` is the request parameter the token is passed back under. Taking
    /// both in one call keeps them paired by construction.
    pub fn marker(mut self, field: impl Into<String>, arg: impl Into<String>) -> Self {
        self.next_marker_field = Some(field.into());
        self.next_marker_arg = Some(arg.into());
        self
    }

    pub fn matches(mut self, predicate: RecordPredicate) -> Self {
        self.matches = Some(predicate);
        self
    }

    pub fn build(self) -> Result<ListerConfig, ConfigError> {
        let resource = self.resource_key.clone();

        if self.list_method.is_empty() {
            return Err(ConfigError::EmptyMethod { resource });
        }
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns { resource });
        }

        let item_path = compile(&resource, "item_path", &self.item_path)?;

        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, min_width, source) in self.columns {
            let source = resolve_source(&resource, &name, source)?;
            columns.push(ColumnSpec {
                name,
                min_width,
                source,
            });
        }
        let mut hidden_columns = Vec::with_capacity(self.hidden_columns.len());
        for (name, source) in self.hidden_columns {
            let source = resolve_source(&resource, &name, source)?;
            hidden_columns.push(ColumnSpec {
                name,
                min_width: 0,
                source,
            });
        }

        let mut seen = std::collections::BTreeSet::new();
        for spec in columns.iter().chain(hidden_columns.iter()) {
            if !seen.insert(spec.name.clone()) {
                return Err(ConfigError::DuplicateColumn {
                    resource: resource.clone(),
                    column: spec.name.clone(),
                });
            }
        }

        if !columns.iter().any(|spec| spec.name == "name") {
            return Err(ConfigError::MissingNameColumn { resource });
        }

        let known = |column: &str| {
            columns.iter().chain(hidden_columns.iter()).any(|spec| spec.name == column)
        };

        let sort_column = self.sort_column.unwrap_or_else(|| "name".to_owned());
        if !known(&sort_column) {
            return Err(ConfigError::SortColumnMissing {
                resource,
                column: sort_column,
            });
        }

        if let Some(primary_key) = &self.primary_key {
            if !known(primary_key) {
                return Err(ConfigError::PrimaryKeyMissing {
                    resource,
                    column: primary_key.clone(),
                });
            }
        }

        let next_marker_field = match &self.next_marker_field {
            Some(field) => Some(compile(&resource, "next_marker_field", field)?),
            None => None,
        };

        Ok(ListerConfig {
            resource_key: self.resource_key,
            title: self.title,
            list_method: self.list_method,
            list_args: self.list_args,
            item_path,
            columns,
            hidden_columns,
            primary_key: self.primary_key,
            sort: SortSpec {
                column: sort_column,
                order: self.sort_order,
            },
            next_marker_field,
            next_marker_arg: self.next_marker_arg,
            matches: self.matches,
        })
    }
}

fn compile(resource: &str, field: &str, path: &str) -> Result<CompiledPath, ConfigError> {
    CompiledPath::parse(path).map_err(|source| ConfigError::Path {
        resource: resource.to_owned(),
        field: field.to_owned(),
        source,
    })
}

fn resolve_source(
    resource: &str,
    column: &str,
    source: RawSource,
) -> Result<ColumnSource, ConfigError> {
    match source {
        RawSource::Path(path) => {
            let compiled = compile(resource, column, &path)?;
            Ok(ColumnSource::Path(compiled))
        }
        RawSource::Computed(compute) => Ok(ColumnSource::Computed(compute)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyMethod { resource: String },
    NoColumns { resource: String },
    MissingNameColumn { resource: String },
    DuplicateColumn { resource: String, column: String },
    SortColumnMissing { resource: String, column: String },
    PrimaryKeyMissing { resource: String, column: String },
    Path { resource: String, field: String, source: PathError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMethod { resource } => {
                write!(f, "resource {resource}: empty list method")
            }
            Self::NoColumns { resource } => {
                write!(f, "resource {resource}: no visible columns")
            }
            Self::MissingNameColumn { resource } => {
                write!(f, "resource {resource}: visible columns must include \"name\"")
            }
            Self::DuplicateColumn { resource, column } => {
                write!(f, "resource {resource}: duplicate column {column:?}")
            }
            Self::SortColumnMissing { resource, column } => {
                write!(f, "resource {resource}: sort column {column:?} is not a column")
            }
            Self::PrimaryKeyMissing { resource, column } => {
                write!(f, "resource {resource}: primary key {column:?} is not a column")
            }
            Self::Path {
                resource,
                field,
                source,
            } => write!(f, "resource {resource}: invalid path for {field}: {source}"),
        }
    }
}

impl Error for ConfigError {}
