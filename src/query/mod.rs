// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document extractor.
//!
//! Resource configurations describe columns as small path expressions evaluated
//! against the JSON documents a listing API returns. The supported grammar is a
//! deliberately small subset of the usual query languages:
//!
//! - `Field.Sub`: object field access
//! - `Items[]`: flatten an array into the result stream
//! - `Items[2]`: index into an array
//! - `Tags[?Key==`Name`].Value`: keep array elements whose `Key` equals the
//!   literal, then continue on the kept elements
//!
//! Absence is distinct from a present `null`: a page whose item path is absent
//! indicates a configuration/API mismatch, while an empty array is simply a
//! resource type with no records.

use std::error::Error;
use std::fmt;

use serde_json::Value;


/// A parsed path expression, compiled once at configuration time and evaluated
/// per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    /// Field to descend into before applying the selector; empty means the
    /// selector applies to the current value (only useful in a leading segment).
    name: String,
    selector: Option<Selector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Flatten,
    Index(usize),
    Filter { key: String, value: String },
}

/// Result of evaluating a [`CompiledPath`] against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// The path did not match anything. Distinct from a present `null`.
    Absent,
    One(Value),
    Many(Vec<Value>),
}

impl Extracted {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Interprets the result as a list of records (for item paths).
    ///
    /// `None` means the path was absent; an empty vec means the path matched an
    /// empty collection.
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Self::Absent => None,
            Self::One(Value::Array(items)) => Some(items),
            Self::One(value) => Some(vec![value]),
            Self::Many(items) => Some(items),
        }
    }

    /// Interprets the result as a single scalar, e.g. a continuation token.
    ///
    /// Absent and present-null both yield `None` here; callers that need the
    /// distinction match on the variant instead.
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::Absent | Self::One(Value::Null) => None,
            Self::One(value) => Some(value),
            Self::Many(mut items) => {
                let first = if items.is_empty() { return None } else { items.remove(0) };
                if first.is_null() {
                    None
                } else {
                    Some(first)
                }
            }
        }
    }

    /// Renders the result for a table cell: scalars bare, composites as compact
    /// JSON, multiple matches joined with commas, absence as the empty string.
    pub fn display_string(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::One(value) => scalar_string(value),
            Self::Many(items) => {
                items.iter().map(scalar_string).collect::<Vec<_>>().join(",")
            }
        }
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        composite => composite.to_string(),
    }
}

impl CompiledPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for (index, piece) in split_segments(raw)?.into_iter().enumerate() {
            if piece.is_empty() {
                return Err(PathError::EmptySegment { index });
            }
            segments.push(parse_segment(&piece, index)?);
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn extract(&self, document: &Value) -> Extracted {
        let mut stream = vec![document.clone()];
        let mut projected = false;

        for segment in &self.segments {
            if !segment.name.is_empty() {
                stream = stream
                    .into_iter()
                    .filter_map(|value| value.get(segment.name.as_str()).cloned())
                    .collect();
            }

            match &segment.selector {
                None => {}
                Some(Selector::Index(index)) => {
                    stream = stream
                        .into_iter()
                        .filter_map(|value| value.get(*index).cloned())
                        .collect();
                }
                Some(Selector::Flatten) => {
                    if !stream.is_empty() {
                        projected = true;
                    }
                    let mut flattened = Vec::new();
                    for value in stream {
                        if let Value::Array(items) = value {
                            flattened.extend(items);
                        }
                    }
                    stream = flattened;
                }
                Some(Selector::Filter { key, value: wanted }) => {
                    if !stream.is_empty() {
                        projected = true;
                    }
                    let mut kept = Vec::new();
                    for value in stream {
                        if let Value::Array(items) = value {
                            for item in items {
                                let matches = item
                                    .get(key.as_str())
                                    .and_then(Value::as_str)
                                    .is_some_and(|text| text == wanted);
                                if matches {
                                    kept.push(item);
                                }
                            }
                        }
                    }
                    stream = kept;
                }
            }
        }

        match stream.len() {
            0 if projected => Extracted::Many(Vec::new()),
            0 => Extracted::Absent,
            1 => Extracted::One(stream.remove(0)),
            _ => Extracted::Many(stream),
        }
    }
}

/// Splits on `.` at bracket depth zero so filter literals may contain dots.
fn split_segments(raw: &str) -> Result<Vec<String>, PathError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1).ok_or(PathError::UnbalancedBracket {
                    index: pieces.len(),
                })?;
                current.push(ch);
            }
            '.' if depth == 0 => {
                pieces.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if depth != 0 {
        return Err(PathError::UnbalancedBracket {
            index: pieces.len(),
        });
    }
    pieces.push(current);
    Ok(pieces)
}

fn parse_segment(piece: &str, index: usize) -> Result<Segment, PathError> {
    let (name, rest) = match piece.find('[') {
        Some(at) => (&piece[..at], &piece[at..]),
        None => (piece, ""),
    };

    if name.contains(']') {
        return Err(PathError::BadSegment {
            index,
            text: piece.to_owned(),
        });
    }

    let selector = match rest {
        "" => None,
        "[]" => Some(Selector::Flatten),
        _ => {
            let inner = rest
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| PathError::BadSegment {
                    index,
                    text: piece.to_owned(),
                })?;
            if inner.contains('[') || inner.contains(']') {
                return Err(PathError::BadSegment {
                    index,
                    text: piece.to_owned(),
                });
            }
            if let Some(filter) = inner.strip_prefix('?') {
                let (key, value) = filter.split_once("==").ok_or_else(|| PathError::BadFilter {
                    index,
                    text: inner.to_owned(),
                })?;
                let key = key.trim();
                let value = strip_literal_quotes(value.trim());
                if key.is_empty() {
                    return Err(PathError::BadFilter {
                        index,
                        text: inner.to_owned(),
                    });
                }
                Some(Selector::Filter {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })
            } else {
                let parsed = inner.parse::<usize>().map_err(|_| PathError::BadIndex {
                    index,
                    text: inner.to_owned(),
                })?;
                Some(Selector::Index(parsed))
            }
        }
    };

    if name.is_empty() && selector.is_none() {
        return Err(PathError::EmptySegment { index });
    }

    Ok(Segment {
        name: name.to_owned(),
        selector,
    })
}

/// Filter literals may be backquoted (JMESPath style) or quoted; bare text is
/// accepted as-is.
fn strip_literal_quotes(value: &str) -> &str {
    for quote in ['`', '\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    EmptySegment { index: usize },
    UnbalancedBracket { index: usize },
    BadSegment { index: usize, text: String },
    BadIndex { index: usize, text: String },
    BadFilter { index: usize, text: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty path"),
            Self::EmptySegment { index } => write!(f, "empty segment at position {index}"),
            Self::UnbalancedBracket { index } => {
                write!(f, "unbalanced bracket in segment {index}")
            }
            Self::BadSegment { index, text } => {
                write!(f, "malformed segment {index}: {text:?}")
            }
            Self::BadIndex { index, text } => {
                write!(f, "invalid array index in segment {index}: {text:?}")
            }
            Self::BadFilter { index, text } => {
                write!(f, "invalid filter in segment {index}: {text:?} (expected key==literal)")
            }
        }
    }
}

impl Error for PathError {}
