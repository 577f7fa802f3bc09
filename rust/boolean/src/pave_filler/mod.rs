// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pairwise intersection of the operands.
//!
//! The stages run in a fixed order, each one depending on the results of
//! the previous ones:
//!
//! ```text
//! vertex/vertex -> vertex/edge -> edge/edge -> vertex/face -> edge/face
//!   -> face/face -> make blocks
//! ```
//!
//! Inside a stage the candidate pairs are intersected in parallel into
//! per-pair slots, against a read-only view of the arena and the DS. The
//! slots are then committed one by one in pair order, which is where new
//! vertices, paves and interferences are created. The commit order never
//! depends on the schedule, so repeated runs produce identical results.

mod ee;
mod ef;
mod ff;
mod split;
mod ve;
mod vf;
mod vv;

use paver_topology::{FaceKey, ShapeArena, ShapeKey, ShapeType};

use crate::context::Context;
use crate::ds::{Ds, ShapeId};
use crate::error::Result;
use crate::options::BooleanOptions;
use crate::progress::{Abort, Progress, Stage};
use crate::report::{AlertKind, Report, Status};

/// Runs the intersection stages over one object list and one tool list.
pub struct PaveFiller<'a> {
    pub(crate) arena: &'a mut ShapeArena,
    pub(crate) ds: Ds,
    pub(crate) context: Context,
    pub(crate) report: Report,
    pub(crate) options: BooleanOptions,
    pub(crate) progress: &'a dyn Progress,
}

impl<'a> PaveFiller<'a> {
    /// Indexes the arguments. Fails if a key is not in the arena.
    pub fn new(
        arena: &'a mut ShapeArena,
        objects: &[ShapeKey],
        tools: &[ShapeKey],
        options: &BooleanOptions,
        progress: &'a dyn Progress,
    ) -> Result<Self> {
        let mut ds = Ds::new(options.fuzzy_value());
        ds.index_arguments(arena, objects, tools)?;
        Ok(Self {
            arena,
            ds,
            context: Context::new(),
            report: Report::new(),
            options: options.clone(),
            progress,
        })
    }

    /// Runs every stage. Returns the status implied by the report.
    pub fn perform(&mut self) -> Status {
        // An abort has already been recorded in the report.
        let _ = self.run();
        self.report.status()
    }

    pub(crate) fn run(&mut self) -> std::result::Result<(), Abort> {
        self.step(Stage::Init)?;
        let faces: Vec<FaceKey> = self.shape_keys(ShapeType::Face).filter_map(|k| k.as_face()).collect();
        self.context
            .prepare_faces(self.arena, &faces, self.options.run_parallel);
        tracing::debug!(shapes = self.ds.len(), faces = faces.len(), "Arguments indexed");

        self.perform_vv()?;
        self.perform_ve()?;
        self.perform_ee()?;
        self.perform_vf()?;
        self.perform_ef()?;
        self.perform_ff()?;
        self.make_blocks()?;
        self.check_self_interference();
        self.check_fail()
    }

    /// Records the solids of one argument that touch or overlap each
    /// other. They have been intersected like separate arguments.
    fn check_self_interference(&mut self) {
        let mode = self.options.failure_mode;
        for (a, b) in self.ds.self_interfering_parts() {
            let shapes = vec![self.ds.part_shape(a), self.ds.part_shape(b)];
            self.report
                .add_builder_issue(AlertKind::SelfInterferingShape, shapes, mode);
        }
    }

    pub fn ds(&self) -> &Ds {
        &self.ds
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn arena(&self) -> &ShapeArena {
        self.arena
    }

    // --- Helpers shared by the stages ---

    /// Reports the stage and polls for cancellation.
    pub(crate) fn step(&mut self, stage: Stage) -> std::result::Result<(), Abort> {
        self.progress.step(stage);
        self.check_break()
    }

    /// Records a user break and aborts if the caller asked to stop.
    pub(crate) fn check_break(&mut self) -> std::result::Result<(), Abort> {
        if self.progress.user_break() {
            if !self.report.contains(AlertKind::UserBreak) {
                self.report.add_fail(AlertKind::UserBreak, Vec::new());
            }
            return Err(Abort);
        }
        Ok(())
    }

    /// Aborts if a failure has been recorded, e.g. a builder issue in
    /// strict mode.
    pub(crate) fn check_fail(&self) -> std::result::Result<(), Abort> {
        if self.report.has_fail() {
            Err(Abort)
        } else {
            Ok(())
        }
    }

    pub(crate) fn shape_keys(&self, ty: ShapeType) -> impl Iterator<Item = ShapeKey> + '_ {
        self.ds
            .ids_of_type(ty)
            .into_iter()
            .map(|id| self.ds.info(id).key)
    }

    pub(crate) fn key_of(&self, id: ShapeId) -> ShapeKey {
        self.ds.info(id).key
    }
}
