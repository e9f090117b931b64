// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;

/// One displayed row: a name, rendered column values, the original source
/// record (for follow-up actions), and the time the row last changed.
///
/// The column *schema* is fixed at construction; refreshes replace values but
/// never add or remove columns. `columns["name"]` always equals `name`.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    columns: BTreeMap<String, String>,
    controller_data: Value,
    updated_at: Instant,
}

impl Entry {
    /// Builds an entry with `columns = {"name": name} ∪ extra_columns`.
    pub fn new(
        name: impl Into<String>,
        extra_columns: impl IntoIterator<Item = (String, String)>,
        controller_data: Value,
    ) -> Self {
        let name = name.into();
        let mut columns: BTreeMap<String, String> = extra_columns.into_iter().collect();
        columns.insert("name".to_owned(), name.clone());
        Self {
            name,
            columns,
            controller_data,
            updated_at: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self, column: &str) -> Result<&str, ColumnError> {
        self.columns
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| ColumnError::Missing {
                column: column.to_owned(),
            })
    }

    pub fn columns(&self) -> &BTreeMap<String, String> {
        &self.columns
    }

    pub fn controller_data(&self) -> &Value {
        &self.controller_data
    }

    pub fn updated_at(&self) -> Instant {
        self.updated_at
    }

    /// Case-insensitive substring match against every column value. An empty
    /// or missing filter matches everything.
    pub fn matches_filter(&self, filter: Option<&str>) -> bool {
        let needle = match filter {
            None => return true,
            Some(text) if text.is_empty() => return true,
            Some(text) => text.to_lowercase(),
        };
        self.columns
            .values()
            .any(|value| value.to_lowercase().contains(&needle))
    }

    /// Replaces this entry's content with `other`'s and bumps `updated_at`,
    /// but only when the name or any column value actually differs. Identical
    /// content is a strict no-op so the renderer's recent-update highlight does
    /// not flicker on every refresh cycle.
    ///
    /// Returns whether anything changed.
    pub fn merge_from(&mut self, other: Entry) -> bool {
        if self.name == other.name && self.columns == other.columns {
            return false;
        }
        self.name = other.name;
        self.columns = other.columns;
        self.controller_data = other.controller_data;
        self.updated_at = Instant::now();
        true
    }

    /// Whether the entry changed within `within`, used for the live-update
    /// highlight.
    pub fn recently_updated(&self, within: Duration) -> bool {
        self.updated_at.elapsed() <= within
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnError {
    Missing { column: String },
}

impl fmt::Display for ColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { column } => write!(f, "no such column: {column:?}"),
        }
    }
}

impl Error for ColumnError {}
