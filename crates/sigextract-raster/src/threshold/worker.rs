// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background thresholding with last-request-wins ordering.
//
// Every submission takes a ticket. A finished pass is handed back only if no
// newer submission (or cancel) happened in the meantime; stale results are
// dropped. Passes run on tokio's blocking pool so a UI thread stays free
// while a large photo is binarized.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sigextract_core::error::{Result, SigextractError};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::bitmap::Bitmap;
use crate::threshold::adaptive::{ThresholdParams, ThresholdStats, threshold_with_stats};

/// A completed, still-current thresholding pass.
#[derive(Debug, Clone)]
pub struct ThresholdOutcome {
    /// Ticket of the submission that produced this pass.
    pub ticket: u64,
    pub bitmap: Bitmap,
    pub stats: ThresholdStats,
    pub params: ThresholdParams,
}

/// Schedules thresholding passes and discards superseded ones.
///
/// Cloning shares the ticket counter, so clones supersede each other.
#[derive(Debug, Clone, Default)]
pub struct ThresholdWorker {
    latest: Arc<AtomicU64>,
}

impl ThresholdWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass over `source` on the blocking pool.
    ///
    /// The source is shared immutably, so it cannot change underneath the
    /// pass. Must be called from within a tokio runtime.
    #[instrument(
        skip(self, source, params),
        fields(width = source.width(), height = source.height(), sensitivity = %params.sensitivity)
    )]
    pub fn submit(&self, source: Arc<Bitmap>, params: ThresholdParams) -> Result<PendingThreshold> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| SigextractError::Worker(format!("no async runtime: {err}")))?;

        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, "threshold pass submitted");

        let handle = runtime.spawn_blocking(move || {
            threshold_with_stats(&source, &params).map(|(bitmap, stats)| ThresholdOutcome {
                ticket,
                bitmap,
                stats,
                params,
            })
        });

        Ok(PendingThreshold {
            ticket,
            latest: Arc::clone(&self.latest),
            handle,
        })
    }

    /// Invalidate every outstanding pass.
    pub fn cancel(&self) {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, "outstanding threshold passes cancelled");
    }

    /// Ticket of the most recent submission or cancel.
    pub fn latest_ticket(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Handle to an in-flight pass.
#[derive(Debug)]
pub struct PendingThreshold {
    ticket: u64,
    latest: Arc<AtomicU64>,
    handle: JoinHandle<Result<ThresholdOutcome>>,
}

impl PendingThreshold {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// True once a newer pass was submitted or the worker was cancelled.
    pub fn is_stale(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.ticket
    }

    /// Wait for the pass. Returns `Ok(None)` if it was superseded, either
    /// before or while it ran.
    pub async fn wait(self) -> Result<Option<ThresholdOutcome>> {
        if self.is_stale() {
            // The blocking task runs to completion on its own; its result is
            // simply never observed.
            warn!(ticket = self.ticket, "stale threshold pass discarded before completion");
            return Ok(None);
        }

        let outcome = self
            .handle
            .await
            .map_err(|err| SigextractError::Worker(err.to_string()))??;

        if self.latest.load(Ordering::SeqCst) != self.ticket {
            warn!(ticket = self.ticket, "stale threshold pass discarded");
            return Ok(None);
        }
        Ok(Some(outcome))
    }
}
