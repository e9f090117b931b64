// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Column layout and row painting for the resource list pane.

use std::time::Duration;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::lister::{ColumnSpec, Lister};
use crate::model::Entry;

use super::theme::TuiTheme;

/// Rows stay highlighted this long after a merge changed their content.
pub(crate) const RECENT_WINDOW: Duration = Duration::from_secs(3);

const COLUMN_GAP: u16 = 2;

/// Column widths for the current terminal width, recomputed only when the
/// available width changes.
#[derive(Debug, Default)]
pub(crate) struct ColumnLayout {
    widths: Vec<u16>,
    last_width: u16,
}

impl ColumnLayout {
    pub(crate) fn widths(&mut self, columns: &[ColumnSpec], available: u16) -> &[u16] {
        if self.last_width != available || self.widths.len() != columns.len() {
            self.widths = compute_widths(columns, available);
            self.last_width = available;
        }
        &self.widths
    }
}

/// Distributes `available` cells over the columns' minimum widths. A surplus
/// is split evenly with the remainder credited to the first (name) column; a
/// deficit shrinks columns proportionally to their minimums, keeping at least
/// one cell each, with any rounding leftover also credited to the first
/// column.
pub(crate) fn compute_widths(columns: &[ColumnSpec], available: u16) -> Vec<u16> {
    if columns.is_empty() {
        return Vec::new();
    }

    let gaps = COLUMN_GAP * (columns.len() as u16 - 1);
    let usable = available.saturating_sub(gaps);
    let minimums: Vec<u16> = columns.iter().map(|col| col.min_width().max(1)).collect();
    let total_min: u32 = minimums.iter().map(|w| u32::from(*w)).sum();

    if u32::from(usable) >= total_min {
        let surplus = u32::from(usable) - total_min;
        let share = (surplus / columns.len() as u32) as u16;
        let remainder = (surplus % columns.len() as u32) as u16;
        let mut widths: Vec<u16> = minimums.iter().map(|min| min + share).collect();
        widths[0] += remainder;
        return widths;
    }

    // Not enough room: scale every column down by the same ratio.
    let mut widths: Vec<u16> = minimums
        .iter()
        .map(|min| {
            let scaled = u32::from(*min) * u32::from(usable) / total_min.max(1);
            (scaled as u16).max(1)
        })
        .collect();

    // Rounding can leave the row over budget; trim from the widest column.
    let mut used: u32 = widths.iter().map(|w| u32::from(*w)).sum();
    while used > u32::from(usable) {
        let Some(widest) = widths
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| **w)
            .map(|(idx, _)| idx)
        else {
            break;
        };
        if widths[widest] <= 1 {
            break;
        }
        widths[widest] -= 1;
        used -= 1;
    }
    // Floor division can also leave cells unused; those go to the name
    // column so the full row budget is spent.
    if used < u32::from(usable) {
        widths[0] += (u32::from(usable) - used) as u16;
    }
    widths
}

/// Truncates or pads `value` to exactly `width` display cells.
pub(crate) fn cell(value: &str, width: u16) -> String {
    let width = width as usize;
    let mut out: String = value.chars().take(width).collect();
    for _ in out.chars().count()..width {
        out.push(' ');
    }
    out
}

fn row_text(entry: &Entry, columns: &[ColumnSpec], widths: &[u16]) -> String {
    let gap = " ".repeat(COLUMN_GAP as usize);
    let mut parts = Vec::with_capacity(columns.len());
    for (spec, width) in columns.iter().zip(widths) {
        let value = entry.columns().get(spec.name()).map_or("", String::as_str);
        parts.push(cell(value, *width));
    }
    parts.join(&gap)
}

fn header_text(columns: &[ColumnSpec], widths: &[u16]) -> String {
    let gap = " ".repeat(COLUMN_GAP as usize);
    let mut parts = Vec::with_capacity(columns.len());
    for (spec, width) in columns.iter().zip(widths) {
        parts.push(cell(&spec.name().to_uppercase(), *width));
    }
    parts.join(&gap)
}

/// Number of entry rows that fit in the list pane (area minus borders and
/// the header line).
pub(crate) fn visible_rows(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(3))
}

pub(crate) fn render_list(
    frame: &mut Frame<'_>,
    area: Rect,
    lister: &Lister,
    layout: &mut ColumnLayout,
    theme: &TuiTheme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(lister.config().title().to_owned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let columns = lister.config().columns();
    let widths = layout.widths(columns, inner.width).to_vec();

    let mut lines = Vec::with_capacity(usize::from(inner.height));
    lines.push(Line::styled(
        header_text(columns, &widths),
        theme.header_style(),
    ));

    let rows = usize::from(inner.height.saturating_sub(1));
    let entries = lister.filtered();
    let top = lister.top().min(entries.len().saturating_sub(1));
    for (offset, entry) in entries.iter().skip(top).take(rows).enumerate() {
        let index = top + offset;
        let selected = index == lister.selected();
        let recent = entry.recently_updated(RECENT_WINDOW);
        let style = match (selected, recent) {
            (_, true) => theme.recent_style(selected),
            (true, false) => theme.selection_style(),
            (false, false) => theme.base_style(),
        };
        lines.push(Line::styled(row_text(entry, columns, &widths), style));
    }

    let paragraph = Paragraph::new(lines).style(theme.base_style());
    frame.render_widget(paragraph, inner);
}
