// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result assembly from a filled DS.
//!
//! ```text
//! split edges -> split faces -> same-domain faces -> classify + select
//!   -> shells -> solids -> history
//! ```
//!
//! A section stops after the edges: its result is the compound of the
//! split section edges.

mod classify;
mod edges;
mod face;
mod section;
mod shell;
mod solid;

use paver_topology::{EdgeKey, FaceKey, ShapeKey};
use rustc_hash::FxHashMap;

use crate::history::History;
use crate::pave_filler::PaveFiller;
use crate::progress::{Abort, Stage};
use crate::Operation;

/// Images of the split sub-shapes, recorded while building.
#[derive(Debug, Clone, Default)]
pub(crate) struct Images {
    /// Edge standing for each pave block, by block index.
    pub blocks: Vec<Option<EdgeKey>>,
    /// Split faces of each operand face. An untouched face maps to itself.
    pub faces: FxHashMap<FaceKey, Vec<FaceKey>>,
    /// Dropped same-domain copy -> surviving copy.
    pub survivors: FxHashMap<FaceKey, FaceKey>,
}

pub(crate) struct Builder<'f, 'a> {
    pub(crate) filler: &'f mut PaveFiller<'a>,
    pub(crate) operation: Operation,
    pub(crate) images: Images,
    /// Groups of split faces of different parts with the same boundary.
    pub(crate) same_domain: Vec<Vec<FaceKey>>,
}

impl<'f, 'a> Builder<'f, 'a> {
    pub(crate) fn new(filler: &'f mut PaveFiller<'a>, operation: Operation) -> Self {
        Self {
            filler,
            operation,
            images: Images::default(),
            same_domain: Vec::new(),
        }
    }

    /// Builds the result shape and its history.
    pub(crate) fn build(mut self) -> Result<(ShapeKey, History), Abort> {
        self.filler.step(Stage::SplitEdges)?;
        self.split_edges();
        self.filler.check_fail()?;

        let shape = if self.operation == Operation::Section {
            self.build_section()?
        } else {
            self.filler.step(Stage::SplitFaces)?;
            self.split_faces()?;
            self.find_same_domain_faces();
            self.filler.check_fail()?;

            self.filler.step(Stage::ClassifyFaces)?;
            let selected = self.select_faces()?;
            self.filler.check_fail()?;

            self.filler.step(Stage::BuildShells)?;
            let shells = self.build_shells(&selected);
            self.filler.check_fail()?;

            self.filler.step(Stage::BuildSolids)?;
            let shape = self.build_solids(&shells)?;
            self.filler.check_fail()?;
            shape
        };

        self.filler.step(Stage::History)?;
        let history = History::build(self.filler.arena, &self.filler.ds, &self.images, shape);
        tracing::debug!(entries = history.len(), "History built");
        Ok((shape, history))
    }

    /// Compound of `children`, or `None` after recording a builder failure.
    pub(crate) fn make_compound(&mut self, children: Vec<ShapeKey>) -> Option<ShapeKey> {
        match self.filler.arena.add_compound(children) {
            Ok(compound) => Some(compound.into()),
            Err(err) => {
                tracing::debug!(%err, "Result compound rejected");
                self.filler
                    .report
                    .add_fail(crate::report::AlertKind::BuilderFailed, Vec::new());
                None
            }
        }
    }
}
