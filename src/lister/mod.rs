// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The generic resource lister.
//!
//! One [`Lister`] per open resource view. A refresh cycle pages through the
//! listing API on a worker thread, converts raw records into [`Entry`] rows via
//! the declarative column mappings, and streams each page to the render thread,
//! which merges it into the authoritative list. When the cycle completes, rows
//! whose primary key was not seen again are reconciled away and the list is
//! re-sorted.
//!
//! The authoritative `entries` vec is owned by the render thread; workers only
//! ever talk to it through the coordinator channel. Merges preserve list
//! position for existing keys so selection-by-position survives refreshes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use crate::api::ApiClient;
use crate::model::Entry;

mod config;
mod fetch;
#[cfg(test)]
mod tests;

pub use config::{
    ColumnSource, ColumnSpec, ComputedColumn, ConfigError, ListerConfig, ListerConfigBuilder,
    RecordPredicate, SortOrder, SortSpec,
};

use fetch::{BatchSink, FetchCoordinator, FetchError, FetchEvent};

/// Default interval between automatic refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

pub struct Lister {
    config: ListerConfig,
    client: Arc<dyn ApiClient>,
    entries: Vec<Entry>,
    /// Primary keys seen during the in-flight cycle; consulted by finalize.
    acquired: HashSet<String>,
    filter: Option<String>,
    /// Selection and scroll index into the *filtered* view.
    selected: usize,
    top: usize,
    fetch: FetchCoordinator,
    last_cycle_started: Option<Instant>,
}

impl Lister {
    pub fn new(config: ListerConfig, client: Arc<dyn ApiClient>) -> Self {
        Self {
            config,
            client,
            entries: Vec::new(),
            acquired: HashSet::new(),
            filter: None,
            selected: 0,
            top: 0,
            fetch: FetchCoordinator::new(),
            last_cycle_started: None,
        }
    }

    pub fn config(&self) -> &ListerConfig {
        &self.config
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_updating(&self) -> bool {
        self.fetch.is_updating()
    }

    /// Signals a running worker to stop between pages. Called when the view
    /// closes; the lister accepts no further refreshes afterwards.
    pub fn close(&mut self) {
        self.fetch.close();
    }

    /// Starts a refresh cycle unless one is already in flight, in which case
    /// this is a silent no-op (at-most-one-in-flight, not cancel-and-restart).
    pub fn refresh(&mut self) -> bool {
        if self.fetch.is_updating() || self.fetch.is_closed() {
            return false;
        }

        // A cycle that finished since the last pump may still have undrained
        // events in the channel; apply them before the new cycle replaces it,
        // or the finished cycle's results would be lost.
        if let Some(message) = self.pump() {
            warn!(
                resource = self.config.resource_key(),
                %message,
                "previous cycle failed"
            );
        }

        // Without a primary key there is nothing to merge against, so the
        // cycle starts by wiping the previous rows.
        let clear_first = self.config.primary_key().is_none();
        let client = Arc::clone(&self.client);
        let config = self.config.clone();

        let started = self
            .fetch
            .start(clear_first, move |sink| run_pages(client.as_ref(), &config, sink));
        if started {
            self.acquired.clear();
            self.last_cycle_started = Some(Instant::now());
        }
        started
    }

    /// Kicks off a refresh when the interval elapsed, nothing is in flight and
    /// no modal input (filter entry, dialogs) is active.
    pub fn maybe_auto_refresh(&mut self, interval: Duration, blocked: bool) {
        if blocked || self.fetch.is_updating() {
            return;
        }
        let due = match self.last_cycle_started {
            None => true,
            Some(started) => started.elapsed() >= interval,
        };
        if due {
            self.refresh();
        }
    }

    /// Drains the coordinator channel; called once per render tick, before
    /// painting. Returns a user-visible error message when a worker failed.
    pub fn pump(&mut self) -> Option<String> {
        let mut error = None;
        while let Some(event) = self.fetch.try_event() {
            match event {
                FetchEvent::Error(message) => error = Some(message),
                FetchEvent::Cleared => {
                    self.entries.clear();
                    self.selected = 0;
                    self.top = 0;
                }
                FetchEvent::Batch(batch) => {
                    for entry in batch {
                        self.merge_entry(entry);
                    }
                }
                FetchEvent::Done { complete } => self.finalize(complete),
            }
        }
        error
    }

    /// Merge rule: linear scan for an existing entry with the same primary
    /// key; hit → in-place [`Entry::merge_from`] (position preserved), miss →
    /// append. The key lands in `acquired` either way. Keyless listers only
    /// ever append (the cycle already cleared).
    fn merge_entry(&mut self, entry: Entry) {
        let Some(key_column) = self.config.primary_key().map(str::to_owned) else {
            self.entries.push(entry);
            return;
        };

        // The key column is validated at config build time, so the lookup
        // cannot fail for entries built by this lister.
        let key = entry.column(&key_column).unwrap_or_default().to_owned();
        self.acquired.insert(key.clone());

        let existing = self
            .entries
            .iter_mut()
            .find(|current| current.column(&key_column).ok() == Some(key.as_str()));
        match existing {
            Some(current) => {
                current.merge_from(entry);
            }
            None => self.entries.push(entry),
        }
    }

    /// Reconciliation at cycle end: stale rows (key not re-acquired) are
    /// dropped, then the list is re-sorted. Keyless listers already replaced
    /// wholesale at cycle start. Interrupted cycles (error, view closed) skip
    /// reconciliation entirely; partial results stay merged and rows the
    /// cycle never reached are not dropped.
    fn finalize(&mut self, complete: bool) {
        let acquired = std::mem::take(&mut self.acquired);
        if complete {
            if let Some(key_column) = self.config.primary_key().map(str::to_owned) {
                self.entries
                    .retain(|entry| entry.column(&key_column).is_ok_and(|key| acquired.contains(key)));
            }
            self.sort_entries();
        }
        self.clamp_selection();
    }

    fn sort_entries(&mut self) {
        let sort = self.config.sort().clone();
        // Stable sort: equal keys keep their merge order.
        self.entries.sort_by(|a, b| {
            let left = a.column(&sort.column).unwrap_or_default();
            let right = b.column(&sort.column).unwrap_or_default();
            match sort.order {
                SortOrder::Ascending => left.cmp(right),
                SortOrder::Descending => right.cmp(left),
            }
        });
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Render-time filter; never touches the authoritative list. Changing it
    /// resets selection and scroll to the top.
    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter.filter(|text| !text.is_empty());
        self.selected = 0;
        self.top = 0;
    }

    pub fn filtered(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches_filter(self.filter.as_deref()))
            .collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.matches_filter(self.filter.as_deref()))
            .count()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.filtered().get(self.selected).copied()
    }

    pub fn select_delta(&mut self, delta: isize, rows: usize) {
        let len = self.filtered_len();
        if len == 0 {
            self.selected = 0;
            self.top = 0;
            return;
        }
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, len as isize - 1) as usize;
        self.scroll_into_view(rows);
    }

    pub fn select_page(&mut self, pages: isize, rows: usize) {
        self.select_delta(pages.saturating_mul(rows.max(1) as isize), rows);
    }

    pub fn select_home(&mut self) {
        self.selected = 0;
        self.top = 0;
    }

    pub fn select_end(&mut self, rows: usize) {
        let len = self.filtered_len();
        self.selected = len.saturating_sub(1);
        self.scroll_into_view(rows);
    }

    fn scroll_into_view(&mut self, rows: usize) {
        let rows = rows.max(1);
        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + rows {
            self.top = self.selected + 1 - rows;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_len();
        self.selected = self.selected.min(len.saturating_sub(1));
        self.top = self.top.min(self.selected);
    }
}

/// Pagination loop, run on the worker thread. One `push` per page so the UI
/// observes partial progress between pages.
fn run_pages(
    client: &dyn ApiClient,
    config: &ListerConfig,
    sink: &BatchSink,
) -> Result<(), FetchError> {
    let mut params = config.list_args().clone();

    loop {
        if sink.is_closed() {
            return Err(FetchError::Closed);
        }

        let document = client
            .call(config.list_method(), &params)
            .map_err(FetchError::Api)?;

        let items = match config.item_path().extract(&document).into_items() {
            Some(items) => items,
            None => {
                // Config/API mismatch or genuinely shapeless response; treated
                // as zero results, not retried.
                warn!(
                    resource = config.resource_key(),
                    item_path = config.item_path().as_str(),
                    raw = %document,
                    "item path matched nothing; ending cycle with zero results"
                );
                return Ok(());
            }
        };

        let mut page = Vec::with_capacity(items.len());
        for record in items {
            if sink.is_closed() {
                return Err(FetchError::Closed);
            }
            if let Some(matches) = config.matches() {
                if !matches(&record) {
                    continue;
                }
            }
            page.push(entry_from_record(config, record));
        }
        sink.push(page)?;

        let token = match config.next_marker() {
            None => None,
            Some((field, _)) => field.extract(&document).into_scalar(),
        };
        match (token, config.next_marker()) {
            (Some(token), Some((_, arg))) => {
                params.insert(arg.to_owned(), token);
            }
            _ => return Ok(()),
        }
    }
}

/// Converts one raw record into an [`Entry`] via the column mappings. A column
/// whose path matches nothing renders as the empty string; the record itself
/// is kept (failures are localized to one field, never the page).
fn entry_from_record(config: &ListerConfig, record: Value) -> Entry {
    let mut name = String::new();
    let mut extras = Vec::new();

    for spec in config.columns().iter().chain(config.hidden_columns()) {
        let value = match spec.source() {
            ColumnSource::Path(path) => path.extract(&record).display_string(),
            ColumnSource::Computed(compute) => compute(&record),
        };
        if spec.name() == "name" {
            name = value;
        } else {
            extras.push((spec.name().to_owned(), value));
        }
    }

    Entry::new(name, extras, record)
}
