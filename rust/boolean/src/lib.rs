// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Paver Boolean
//!
//! Boolean operations on B-rep shapes: common (intersection), fuse
//! (union), cut (difference) and section (intersection edges).
//!
//! An operation runs in two phases over the shapes of one
//! [`ShapeArena`](paver_topology::ShapeArena):
//!
//! 1. The [`PaveFiller`] intersects every pair of sub-shapes of the two
//!    operands whose boxes overlap and records the results (coincident
//!    vertices, vertices on edges, section curves, coplanar faces) in the
//!    intersection data structure.
//! 2. The builder splits edges and faces at those results, classifies each
//!    split face against the other operand and assembles the kept faces
//!    into shells and solids.
//!
//! The operands are never modified. The result is a new shape in the same
//! arena, returned with a [`History`] mapping every operand sub-shape to
//! the result sub-shapes replacing it, and a [`Report`] of everything that
//! went wrong along the way.
//!
//! ## Example
//!
//! ```
//! use paver_boolean::{fuse, Status};
//! use paver_topology::ShapeArena;
//!
//! let mut arena = ShapeArena::new();
//! let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
//! let (b, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
//!
//! let result = fuse(&mut arena, a.into(), b.into()).unwrap();
//! assert_eq!(result.status, Status::Done);
//! let volume = arena.volume(result.shape.unwrap());
//! assert!((volume - 1.5).abs() < 1e-9);
//! ```

pub mod box_tree;
mod builder;
pub mod classifier;
pub mod context;
pub mod ds;
pub mod error;
pub mod history;
pub mod intersect;
pub mod iterator;
pub mod options;
mod parallel;
pub mod pave_filler;
pub mod progress;
pub mod report;
mod union_find;

pub use classifier::SolidClassifier;
pub use error::{Error, Result};
pub use history::{History, HistoryEntry};
pub use intersect::PointState;
pub use options::{BooleanOptions, FailureMode};
pub use pave_filler::PaveFiller;
pub use progress::{CancellationToken, NoProgress, Progress, Stage};
pub use report::{Alert, AlertKind, Report, Severity, Status};

use paver_topology::{ShapeArena, ShapeKey, ShapeType};
use serde::{Deserialize, Serialize};

use crate::builder::Builder;

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Material of both operands.
    Common,
    /// Material of either operand.
    Fuse,
    /// Objects minus tools.
    Cut,
    /// Tools minus objects.
    CutReverse,
    /// Edges where the operands meet.
    Section,
}

/// Outcome of one operation.
#[derive(Debug, Clone)]
pub struct BooleanResult {
    pub status: Status,
    /// The result shape; `None` unless the status is `Done` or
    /// `DoneWithAlerts`.
    pub shape: Option<ShapeKey>,
    pub history: History,
    pub report: Report,
}

impl BooleanResult {
    fn not_done(report: Report) -> Self {
        Self {
            status: Status::NotDone,
            shape: None,
            history: History::default(),
            report,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status != Status::NotDone
    }
}

/// Runs `operation` on two argument lists.
///
/// Returns `Err` only for keys that are not in the arena; every other
/// problem is reported through [`BooleanResult::status`].
pub fn perform(
    arena: &mut ShapeArena,
    operation: Operation,
    objects: &[ShapeKey],
    tools: &[ShapeKey],
    options: &BooleanOptions,
) -> Result<BooleanResult> {
    perform_with_progress(arena, operation, objects, tools, options, &NoProgress)
}

/// [`perform`] with a progress callback that can cancel the run.
pub fn perform_with_progress(
    arena: &mut ShapeArena,
    operation: Operation,
    objects: &[ShapeKey],
    tools: &[ShapeKey],
    options: &BooleanOptions,
    progress: &dyn Progress,
) -> Result<BooleanResult> {
    tracing::info!(
        ?operation,
        objects = objects.len(),
        tools = tools.len(),
        fuzzy = options.fuzzy_value(),
        "Boolean operation started"
    );
    if let Some(&missing) = objects.iter().chain(tools).find(|&&k| !arena.contains(k)) {
        return Err(Error::UnknownShape(missing));
    }

    let report = validate_arguments(arena, operation, objects, tools);
    if report.has_fail() {
        tracing::info!(status = ?Status::NotDone, "Boolean operation rejected");
        return Ok(BooleanResult::not_done(report));
    }

    let mut filler = PaveFiller::new(arena, objects, tools, options, progress)?;
    let outcome = filler
        .run()
        .and_then(|()| Builder::new(&mut filler, operation).build());
    let report = std::mem::take(&mut filler.report);
    let status = report.status();

    let result = match outcome {
        Ok((shape, history)) if status != Status::NotDone => BooleanResult {
            status,
            shape: Some(shape),
            history,
            report,
        },
        _ => BooleanResult::not_done(report),
    };
    tracing::info!(
        status = ?result.status,
        alerts = result.report.alerts().len(),
        "Boolean operation finished"
    );
    Ok(result)
}

/// Argument checks that need no intersection.
fn validate_arguments(
    arena: &ShapeArena,
    operation: Operation,
    objects: &[ShapeKey],
    tools: &[ShapeKey],
) -> Report {
    let mut report = Report::new();
    if objects.is_empty() || tools.is_empty() {
        report.add_fail(AlertKind::TooFewArguments, Vec::new());
        return report;
    }
    for &key in objects.iter().chain(tools) {
        if arena.explode(key, ShapeType::Vertex).is_empty() {
            report.add_fail(AlertKind::NullInputShapes, vec![key]);
        }
    }
    if operation != Operation::Section {
        for list in [objects, tools] {
            if list.iter().all(|&k| arena.explode(k, ShapeType::Solid).is_empty()) {
                report.add_fail(AlertKind::UnsupportedType, list.to_vec());
            }
        }
    }
    report
}

/// Builder-style front end of [`perform`].
///
/// ```
/// use paver_boolean::{BooleanOp, Operation};
/// use paver_topology::ShapeArena;
///
/// let mut arena = ShapeArena::new();
/// let (a, _, _) = arena.make_box([0.0; 3], [2.0; 3]).unwrap();
/// let (b, _, _) = arena.make_box([1.0; 3], [3.0; 3]).unwrap();
///
/// let result = BooleanOp::new(Operation::Common)
///     .object(a)
///     .tool(b)
///     .run(&mut arena)
///     .unwrap();
/// assert!((arena.volume(result.shape.unwrap()) - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct BooleanOp {
    operation: Operation,
    objects: Vec<ShapeKey>,
    tools: Vec<ShapeKey>,
    options: BooleanOptions,
}

impl BooleanOp {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            objects: Vec::new(),
            tools: Vec::new(),
            options: BooleanOptions::default(),
        }
    }

    pub fn object(mut self, shape: impl Into<ShapeKey>) -> Self {
        self.objects.push(shape.into());
        self
    }

    pub fn objects(mut self, shapes: impl IntoIterator<Item = ShapeKey>) -> Self {
        self.objects.extend(shapes);
        self
    }

    pub fn tool(mut self, shape: impl Into<ShapeKey>) -> Self {
        self.tools.push(shape.into());
        self
    }

    pub fn tools(mut self, shapes: impl IntoIterator<Item = ShapeKey>) -> Self {
        self.tools.extend(shapes);
        self
    }

    pub fn options(mut self, options: BooleanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(&self, arena: &mut ShapeArena) -> Result<BooleanResult> {
        perform(arena, self.operation, &self.objects, &self.tools, &self.options)
    }

    pub fn run_with_progress(&self, arena: &mut ShapeArena, progress: &dyn Progress) -> Result<BooleanResult> {
        perform_with_progress(arena, self.operation, &self.objects, &self.tools, &self.options, progress)
    }
}

// --- Shortcuts with default options ---

pub fn common(arena: &mut ShapeArena, object: ShapeKey, tool: ShapeKey) -> Result<BooleanResult> {
    perform(arena, Operation::Common, &[object], &[tool], &BooleanOptions::default())
}

pub fn fuse(arena: &mut ShapeArena, object: ShapeKey, tool: ShapeKey) -> Result<BooleanResult> {
    perform(arena, Operation::Fuse, &[object], &[tool], &BooleanOptions::default())
}

pub fn cut(arena: &mut ShapeArena, object: ShapeKey, tool: ShapeKey) -> Result<BooleanResult> {
    perform(arena, Operation::Cut, &[object], &[tool], &BooleanOptions::default())
}

pub fn section(arena: &mut ShapeArena, object: ShapeKey, tool: ShapeKey) -> Result<BooleanResult> {
    perform(arena, Operation::Section, &[object], &[tool], &BooleanOptions::default())
}
