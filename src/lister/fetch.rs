// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Async fetch coordinator.
//!
//! Runs a producer on a detached worker thread and hands its output to the
//! render thread through a channel, one event per pagination page. The render
//! loop drains the channel with `try_recv` once per tick and never blocks.
//!
//! Cross-thread state is two atomics plus the channel itself:
//! - `updating` enforces at-most-one-refresh-in-flight per lister (a second
//!   start while one runs is silently dropped, not queued),
//! - `closed` asks the worker to stop between pages and between records when
//!   the owning view goes away; the worker is never force-joined.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::api::ApiError;
use crate::model::Entry;

/// Events a worker sends to the render thread, consumed once per tick.
#[derive(Debug)]
pub(crate) enum FetchEvent {
    /// Wipe the authoritative entries before merging anything (emitted at
    /// cycle start for listers without a primary key, where no incremental
    /// merge is possible).
    Cleared,
    /// One pagination page worth of entries.
    Batch(Vec<Entry>),
    /// The worker failed; human-readable message for the status line.
    Error(String),
    /// The cycle ended. Sent exactly once per cycle on every exit path.
    /// `complete` is true only for a clean full pass over all pages;
    /// reconciliation must not run after an error or a cooperative abort,
    /// otherwise rows the interrupted cycle never reached would be dropped.
    Done { complete: bool },
}

#[derive(Debug)]
pub(crate) enum FetchError {
    /// The owning view closed (or the receiver vanished); abort quietly.
    Closed,
    Api(ApiError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "fetch aborted: view closed"),
            Self::Api(source) => write!(f, "{source}"),
        }
    }
}

impl Error for FetchError {}

/// Producer-side handle: pushes one page at a time towards the render thread.
pub(crate) struct BatchSink {
    tx: Sender<FetchEvent>,
    closed: Arc<AtomicBool>,
}

impl BatchSink {
    pub(crate) fn push(&self, batch: Vec<Entry>) -> Result<(), FetchError> {
        if self.is_closed() {
            return Err(FetchError::Closed);
        }
        self.tx
            .send(FetchEvent::Batch(batch))
            .map_err(|_| FetchError::Closed)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

/// Clears `updating` and emits `Done` on every worker exit path, including
/// panic unwinds, so a cycle can never wedge the lister in "updating".
struct CycleGuard {
    tx: Sender<FetchEvent>,
    updating: Arc<AtomicBool>,
    complete: bool,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(FetchEvent::Done {
            complete: self.complete,
        });
        self.updating.store(false, Ordering::Release);
    }
}

pub(crate) struct FetchCoordinator {
    rx: Option<Receiver<FetchEvent>>,
    updating: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl FetchCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            rx: None,
            updating: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Signals the worker (if any) to stop between pages. Terminal: a closed
    /// coordinator never fetches again.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Starts a refresh cycle on a detached worker. Returns `false` without
    /// doing anything when a cycle is already in flight or the coordinator is
    /// closed. Replaces the event channel, so callers must drain any events
    /// left over from the previous cycle first (see [`super::Lister::pump`]).
    pub(crate) fn start<F>(&mut self, clear_first: bool, producer: F) -> bool
    where
        F: FnOnce(&BatchSink) -> Result<(), FetchError> + Send + 'static,
    {
        if self.is_closed() {
            return false;
        }
        if self
            .updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);

        let sink = BatchSink {
            tx: tx.clone(),
            closed: self.closed.clone(),
        };
        let guard = CycleGuard {
            tx,
            updating: self.updating.clone(),
            complete: false,
        };

        thread::spawn(move || {
            let mut guard = guard;
            if clear_first {
                let _ = guard.tx.send(FetchEvent::Cleared);
            }
            match producer(&sink) {
                Ok(()) => guard.complete = true,
                Err(FetchError::Closed) => {
                    debug!("fetch worker stopped: view closed");
                }
                Err(err) => {
                    let _ = guard.tx.send(FetchEvent::Error(err.to_string()));
                }
            }
        });

        true
    }

    /// Non-blocking drain, one event at a time. The receiver is dropped after
    /// `Done` so a stale channel never lingers across cycles.
    pub(crate) fn try_event(&mut self) -> Option<FetchEvent> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(event) => {
                if matches!(event, FetchEvent::Done { .. }) {
                    self.rx = None;
                }
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                None
            }
        }
    }
}
