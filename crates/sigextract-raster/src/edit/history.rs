// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded undo history of bitmap snapshots.

use std::collections::VecDeque;

use sigextract_core::types::DEFAULT_HISTORY_LIMIT;
use tracing::debug;

use crate::bitmap::Bitmap;

/// Snapshots ordered oldest → newest. Pushing past the limit evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Bitmap>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// A history holding at most `limit` snapshots (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            snapshots: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Record a snapshot. Returns the evicted oldest snapshot, if any.
    pub fn push(&mut self, snapshot: Bitmap) -> Option<Bitmap> {
        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.limit {
            debug!(limit = self.limit, "history full; oldest snapshot dropped");
            return self.snapshots.pop_front();
        }
        None
    }

    /// Remove and return the newest snapshot.
    pub fn pop(&mut self) -> Option<Bitmap> {
        self.snapshots.pop_back()
    }

    /// Newest snapshot without removing it.
    pub fn peek(&self) -> Option<&Bitmap> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
