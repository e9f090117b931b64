// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};

use super::{Lister, ListerConfig, SortOrder};
use crate::api::{ApiClient, ApiError};

/// Serves queued responses in call order and records the parameters of every
/// call. Pagination is driven by the engine, so a queue is all a script needs.
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<Map<String, Value>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<Value, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, response: Result<Value, ApiError>) {
        self.responses.lock().expect("lock").push_back(response);
    }

    fn calls(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().expect("lock").clone()
    }
}

impl ApiClient for ScriptedClient {
    fn call(&self, method: &str, params: &Map<String, Value>) -> Result<Value, ApiError> {
        self.calls.lock().expect("lock").push(params.clone());
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    method: method.to_owned(),
                    message: "script exhausted".to_owned(),
                })
            })
    }
}

/// Blocks every call until released; used to hold a refresh cycle open.
struct BlockingClient {
    release: Mutex<mpsc::Receiver<()>>,
    calls: AtomicUsize,
}

impl BlockingClient {
    fn new() -> (Arc<Self>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Arc::new(Self {
                release: Mutex::new(rx),
                calls: AtomicUsize::new(0),
            }),
            tx,
        )
    }
}

impl ApiClient for BlockingClient {
    fn call(&self, method: &str, _params: &Map<String, Value>) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release
            .lock()
            .expect("lock")
            .recv()
            .map_err(|_| ApiError::Transport {
                method: method.to_owned(),
                message: "release channel closed".to_owned(),
            })?;
        Ok(json!({"Things": []}))
    }
}

fn keyed_config() -> ListerConfig {
    ListerConfig::builder("things", "Things", "list-things", "Things[]")
        .column("name", 8, "Name")
        .column("state", 8, "State")
        .hidden("id", "Id")
        .primary_key("id")
        .sort("name", SortOrder::Ascending)
        .marker("NextToken", "NextToken")
        .build()
        .expect("config")
}

fn keyless_config() -> ListerConfig {
    ListerConfig::builder("events", "Events", "list-things", "Things[]")
        .column("name", 8, "Name")
        .build()
        .expect("config")
}

fn thing(id: u32, name: &str, state: &str) -> Value {
    json!({"Id": id.to_string(), "Name": name, "State": state})
}

fn page(things: Vec<Value>, next: Option<&str>) -> Result<Value, ApiError> {
    let mut document = json!({"Things": things});
    if let Some(next) = next {
        document["NextToken"] = json!(next);
    }
    Ok(document)
}

/// Pumps until the in-flight cycle is fully consumed, returning the last error
/// message surfaced (if any).
fn wait_idle(lister: &mut Lister) -> Option<String> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut error = None;
    loop {
        if let Some(message) = lister.pump() {
            error = Some(message);
        }
        if !lister.is_updating() {
            // `Done` is sent before the updating flag clears, so one final
            // drain is guaranteed to observe it.
            if let Some(message) = lister.pump() {
                error = Some(message);
            }
            return error;
        }
        assert!(Instant::now() < deadline, "refresh cycle did not finish");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn run_cycle(lister: &mut Lister) -> Option<String> {
    assert!(lister.refresh(), "refresh did not start");
    wait_idle(lister)
}

fn names(lister: &Lister) -> Vec<&str> {
    lister.entries().iter().map(|entry| entry.name()).collect()
}

#[test]
fn second_refresh_while_in_flight_is_a_noop() {
    let (client, release) = BlockingClient::new();
    let mut lister = Lister::new(keyed_config(), client.clone());

    assert!(lister.refresh());
    assert!(lister.is_updating());
    assert!(!lister.refresh(), "second refresh must be dropped");
    assert!(!lister.refresh());

    release.send(()).expect("release worker");
    assert_eq!(wait_idle(&mut lister), None);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn refresh_applies_a_finished_cycles_undrained_events() {
    let client = ScriptedClient::new(vec![page(vec![thing(1, "alpha", "running")], None)]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    assert!(lister.refresh());

    // Let the worker finish without pumping a single event.
    let deadline = Instant::now() + Duration::from_secs(5);
    while lister.is_updating() {
        assert!(Instant::now() < deadline, "cycle did not finish");
        std::thread::sleep(Duration::from_millis(1));
    }

    client.push(page(vec![thing(1, "alpha", "stopped")], None));
    assert!(lister.refresh(), "second cycle starts");
    // The first cycle's results were applied before its channel went away.
    assert_eq!(names(&lister), ["alpha"]);
    assert_eq!(lister.entries()[0].column("state").expect("state"), "running");

    assert_eq!(wait_idle(&mut lister), None);
    assert_eq!(lister.entries()[0].column("state").expect("state"), "stopped");
}

#[test]
fn merge_preserves_position_and_skips_unchanged_rows() {
    let client = ScriptedClient::new(vec![page(
        vec![
            thing(1, "alpha", "running"),
            thing(2, "bravo", "running"),
            thing(3, "charlie", "running"),
        ],
        None,
    )]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    assert_eq!(run_cycle(&mut lister), None);
    assert_eq!(names(&lister), ["alpha", "bravo", "charlie"]);

    let bravo_updated_at = lister.entries()[1].updated_at();

    // Second cycle returns the keys reordered, with key 2 byte-identical.
    client.push(page(
        vec![
            thing(1, "alpha", "stopped"),
            thing(3, "charlie", "stopped"),
            thing(2, "bravo", "running"),
        ],
        None,
    ));
    assert_eq!(run_cycle(&mut lister), None);

    assert_eq!(names(&lister), ["alpha", "bravo", "charlie"]);
    assert_eq!(lister.entries()[0].column("state").expect("state"), "stopped");
    assert_eq!(lister.entries()[2].column("state").expect("state"), "stopped");
    // Unchanged content must not look recently updated.
    assert_eq!(lister.entries()[1].updated_at(), bravo_updated_at);
}

#[test]
fn reconciliation_removes_rows_not_reacquired() {
    let client = ScriptedClient::new(vec![page(
        vec![
            thing(1, "alpha", "running"),
            thing(2, "bravo", "running"),
            thing(3, "charlie", "running"),
        ],
        None,
    )]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    run_cycle(&mut lister);

    client.push(page(
        vec![thing(1, "alpha", "running"), thing(3, "charlie", "running")],
        None,
    ));
    run_cycle(&mut lister);

    assert_eq!(names(&lister), ["alpha", "charlie"]);
}

#[test]
fn keyless_lister_fully_replaces_each_cycle() {
    let client = ScriptedClient::new(vec![page(vec![thing(1, "x", "running")], None)]);
    let mut lister = Lister::new(keyless_config(), client.clone());
    run_cycle(&mut lister);
    assert_eq!(names(&lister), ["x"]);

    client.push(page(vec![thing(2, "y", "running")], None));
    run_cycle(&mut lister);
    assert_eq!(names(&lister), ["y"], "no accumulation across cycles");
}

#[test]
fn filter_never_mutates_authoritative_entries() {
    let client = ScriptedClient::new(vec![page(
        vec![
            thing(1, "alpha", "running"),
            thing(2, "bravo", "stopped"),
            thing(3, "charlie", "running"),
        ],
        None,
    )]);
    let mut lister = Lister::new(keyed_config(), client);
    run_cycle(&mut lister);
    lister.select_delta(2, 10);
    assert_eq!(lister.selected(), 2);

    lister.set_filter(Some("running".to_owned()));
    assert_eq!(lister.selected(), 0, "filter change resets selection");
    assert_eq!(lister.filtered_len(), 2);
    assert_eq!(names(&lister), ["alpha", "bravo", "charlie"]);

    lister.set_filter(None);
    lister.set_filter(Some("BRAVO".to_owned()));
    assert_eq!(lister.filtered_len(), 1);
    lister.set_filter(None);

    assert_eq!(names(&lister), ["alpha", "bravo", "charlie"]);
    assert_eq!(lister.filtered_len(), 3);
}

#[test]
fn scenario_two_pages_follow_the_continuation_token() {
    let client = ScriptedClient::new(vec![
        page(vec![thing(1, "a", "running")], Some("page-2")),
        page(vec![thing(2, "b", "running")], None),
    ]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    assert_eq!(run_cycle(&mut lister), None);

    assert_eq!(names(&lister), ["a", "b"]);

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].get("NextToken").is_none());
    assert_eq!(calls[1].get("NextToken"), Some(&json!("page-2")));
}

#[test]
fn scenario_vanished_row_is_dropped_and_update_merged() {
    let client = ScriptedClient::new(vec![
        page(vec![thing(1, "a", "running")], Some("page-2")),
        page(vec![thing(2, "b", "running")], None),
    ]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    run_cycle(&mut lister);
    assert_eq!(names(&lister), ["a", "b"]);

    client.push(page(vec![thing(1, "a2", "running")], None));
    run_cycle(&mut lister);

    assert_eq!(names(&lister), ["a2"]);
    assert_eq!(lister.entries()[0].column("id").expect("id"), "1");
}

#[test]
fn fetch_error_surfaces_message_and_keeps_last_good_data() {
    let client = ScriptedClient::new(vec![page(
        vec![thing(1, "alpha", "running"), thing(2, "bravo", "running")],
        None,
    )]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    run_cycle(&mut lister);

    client.push(Err(ApiError::Transport {
        method: "list-things".to_owned(),
        message: "connection reset".to_owned(),
    }));
    let error = run_cycle(&mut lister).expect("error surfaced");
    assert!(error.contains("connection reset"));

    // The interrupted cycle must not reconcile away rows it never reached.
    assert_eq!(names(&lister), ["alpha", "bravo"]);
    assert!(!lister.is_updating(), "cycle ended despite the error");
}

#[test]
fn partial_page_error_still_merges_staged_pages() {
    let client = ScriptedClient::new(vec![
        page(vec![thing(1, "a", "running")], Some("page-2")),
        Err(ApiError::Transport {
            method: "list-things".to_owned(),
            message: "timeout".to_owned(),
        }),
    ]);
    let mut lister = Lister::new(keyed_config(), client);
    let error = run_cycle(&mut lister).expect("error surfaced");
    assert!(error.contains("timeout"));
    assert_eq!(names(&lister), ["a"]);
}

#[test]
fn absent_item_path_yields_zero_results_and_ends_cycle() {
    let client = ScriptedClient::new(vec![Ok(json!({"Unexpected": "shape"}))]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    assert_eq!(run_cycle(&mut lister), None, "not an error, only a diagnostic");
    assert!(lister.entries().is_empty());
    assert_eq!(client.calls().len(), 1, "the page is not retried");
}

#[test]
fn record_predicate_discards_rejected_records() {
    let config = ListerConfig::builder("things", "Things", "list-things", "Things[]")
        .column("name", 8, "Name")
        .hidden("id", "Id")
        .primary_key("id")
        .matches(Arc::new(|record: &Value| {
            record["State"].as_str() == Some("running")
        }))
        .build()
        .expect("config");
    let client = ScriptedClient::new(vec![page(
        vec![
            thing(1, "alpha", "running"),
            thing(2, "bravo", "stopped"),
            thing(3, "charlie", "running"),
        ],
        None,
    )]);
    let mut lister = Lister::new(config, client);
    run_cycle(&mut lister);

    assert_eq!(names(&lister), ["alpha", "charlie"]);
}

#[test]
fn computed_columns_derive_values_from_the_record() {
    let config = ListerConfig::builder("things", "Things", "list-things", "Things[]")
        .column("name", 8, "Name")
        .computed_column(
            "summary",
            16,
            Arc::new(|record: &Value| {
                format!(
                    "{} ({})",
                    record["Name"].as_str().unwrap_or("?"),
                    record["State"].as_str().unwrap_or("?"),
                )
            }),
        )
        .build()
        .expect("config");
    let client = ScriptedClient::new(vec![page(vec![thing(1, "alpha", "running")], None)]);
    let mut lister = Lister::new(config, client);
    run_cycle(&mut lister);

    assert_eq!(
        lister.entries()[0].column("summary").expect("summary"),
        "alpha (running)"
    );
}

#[test]
fn hidden_computed_column_serves_as_primary_key() {
    let config = ListerConfig::builder("things", "Things", "list-things", "Things[]")
        .column("name", 8, "Name")
        .hidden_computed(
            "key",
            Arc::new(|record: &Value| format!("id-{}", record["Id"].as_str().unwrap_or(""))),
        )
        .primary_key("key")
        .build()
        .expect("config");
    let client = ScriptedClient::new(vec![page(
        vec![thing(1, "alpha", "running"), thing(2, "bravo", "running")],
        None,
    )]);
    let mut lister = Lister::new(config, client.clone());
    run_cycle(&mut lister);
    assert_eq!(lister.entries()[0].column("key").expect("key"), "id-1");

    // Reconciliation keys off the computed value like any other column.
    client.push(page(vec![thing(2, "bravo", "stopped")], None));
    run_cycle(&mut lister);
    assert_eq!(names(&lister), ["bravo"]);
    assert_eq!(lister.entries()[0].column("key").expect("key"), "id-2");
}

#[test]
fn hidden_columns_are_stored_but_separate_from_visible() {
    let client = ScriptedClient::new(vec![page(vec![thing(7, "alpha", "running")], None)]);
    let mut lister = Lister::new(keyed_config(), client);
    run_cycle(&mut lister);

    let entry = &lister.entries()[0];
    assert_eq!(entry.column("id").expect("hidden column"), "7");
    assert!(lister.config().columns().iter().all(|spec| spec.name() != "id"));
}

#[test]
fn controller_data_keeps_the_raw_record() {
    let client = ScriptedClient::new(vec![page(vec![thing(1, "alpha", "running")], None)]);
    let mut lister = Lister::new(keyed_config(), client);
    run_cycle(&mut lister);

    assert_eq!(lister.entries()[0].controller_data()["Id"], json!("1"));
}

#[test]
fn descending_sort_orders_newest_first() {
    let config = ListerConfig::builder("events", "Events", "list-things", "Things[]")
        .column("name", 8, "Name")
        .hidden("id", "Id")
        .primary_key("id")
        .sort("name", SortOrder::Descending)
        .build()
        .expect("config");
    let client = ScriptedClient::new(vec![page(
        vec![thing(1, "2026-01-01", "-"), thing(2, "2026-03-01", "-")],
        None,
    )]);
    let mut lister = Lister::new(config, client);
    run_cycle(&mut lister);

    assert_eq!(names(&lister), ["2026-03-01", "2026-01-01"]);
}

#[test]
fn close_aborts_quietly_between_pages() {
    let client = ScriptedClient::new(vec![
        page(vec![thing(1, "a", "running")], Some("page-2")),
        page(vec![thing(2, "b", "running")], Some("page-3")),
        page(vec![thing(3, "c", "running")], None),
    ]);
    let mut lister = Lister::new(keyed_config(), client);
    assert!(lister.refresh());
    lister.close();

    assert_eq!(wait_idle(&mut lister), None, "cooperative abort is not an error");
    assert!(!lister.refresh(), "closed lister accepts no further refreshes");
    // Whatever pages landed before the close stayed merged; nothing was
    // reconciled away.
    assert!(lister.entries().len() <= 3);
}

#[test]
fn auto_refresh_respects_interval_and_modal_block() {
    let client = ScriptedClient::new(vec![page(vec![thing(1, "a", "running")], None)]);
    let mut lister = Lister::new(keyed_config(), client.clone());

    lister.maybe_auto_refresh(Duration::from_secs(10), true);
    assert!(!lister.is_updating(), "blocked listers do not auto-refresh");

    lister.maybe_auto_refresh(Duration::from_secs(10), false);
    wait_idle(&mut lister);
    assert_eq!(names(&lister), ["a"], "first tick refreshes immediately");

    let calls = client.calls().len();
    lister.maybe_auto_refresh(Duration::from_secs(10), false);
    wait_idle(&mut lister);
    assert_eq!(client.calls().len(), calls, "interval not elapsed yet");

    client.push(page(vec![thing(1, "a", "running")], None));
    lister.maybe_auto_refresh(Duration::from_millis(0), false);
    wait_idle(&mut lister);
    assert_eq!(client.calls().len(), calls + 1);
}

#[test]
fn navigation_clamps_and_keeps_selection_visible() {
    let things: Vec<Value> = (0..20)
        .map(|index| thing(index, &format!("name-{index:02}"), "running"))
        .collect();
    let client = ScriptedClient::new(vec![page(things, None)]);
    let mut lister = Lister::new(keyed_config(), client);
    run_cycle(&mut lister);

    let rows = 5;
    lister.select_delta(-3, rows);
    assert_eq!((lister.selected(), lister.top()), (0, 0));

    lister.select_delta(7, rows);
    assert_eq!(lister.selected(), 7);
    assert_eq!(lister.top(), 3, "window follows the selection down");

    lister.select_page(1, rows);
    assert_eq!(lister.selected(), 12);

    lister.select_end(rows);
    assert_eq!(lister.selected(), 19);
    assert_eq!(lister.top(), 15);

    lister.select_page(-1, rows);
    assert_eq!(lister.selected(), 14);
    assert_eq!(lister.top(), 14, "window follows the selection up");

    lister.select_home();
    assert_eq!((lister.selected(), lister.top()), (0, 0));

    lister.select_delta(500, rows);
    assert_eq!(lister.selected(), 19, "clamped to the last filtered row");
}

#[test]
fn selection_is_clamped_when_rows_disappear() {
    let client = ScriptedClient::new(vec![page(
        vec![
            thing(1, "a", "running"),
            thing(2, "b", "running"),
            thing(3, "c", "running"),
        ],
        None,
    )]);
    let mut lister = Lister::new(keyed_config(), client.clone());
    run_cycle(&mut lister);
    lister.select_end(10);
    assert_eq!(lister.selected(), 2);

    client.push(page(vec![thing(1, "a", "running")], None));
    run_cycle(&mut lister);
    assert_eq!(lister.selected(), 0);
}
