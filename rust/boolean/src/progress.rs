// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cooperative cancellation and progress reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Init,
    VertexVertex,
    VertexEdge,
    EdgeEdge,
    VertexFace,
    EdgeFace,
    FaceFace,
    MakeBlocks,
    SplitEdges,
    SplitFaces,
    ClassifyFaces,
    BuildShells,
    BuildSolids,
    History,
}

/// Marker returned by a stage that stopped early. The reason is already in
/// the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Abort;

/// Polled between pairs and between builder steps.
pub trait Progress: Sync {
    /// Returns true when the caller wants the operation to stop.
    fn user_break(&self) -> bool;

    /// Called when a stage starts.
    fn step(&self, _stage: Stage) {}
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn user_break(&self) -> bool {
        false
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Progress for CancellationToken {
    fn user_break(&self) -> bool {
        self.is_cancelled()
    }
}
