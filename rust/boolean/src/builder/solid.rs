// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid assembly from closed shells.

use paver_topology::{ShapeKey, ShellKey};

use super::Builder;
use crate::classifier::SolidClassifier;
use crate::intersect::PointState;
use crate::progress::Abort;
use crate::report::AlertKind;

/// Shells enclosing less than this are flat.
const VOLUME_EPS: f64 = 1e-12;

impl Builder<'_, '_> {
    /// Solids of the result: every growth shell with the holes it
    /// contains. Zero solids give an empty compound, several a compound.
    pub(super) fn build_solids(&mut self, shells: &[ShellKey]) -> Result<ShapeKey, Abort> {
        let mode = self.filler.options.failure_mode;
        let mut growths: Vec<(ShellKey, f64)> = Vec::new();
        let mut holes: Vec<ShellKey> = Vec::new();
        for &shell in shells {
            let volume = self.filler.arena.shell_signed_volume(shell);
            if volume > VOLUME_EPS {
                growths.push((shell, volume));
            } else if volume < -VOLUME_EPS {
                holes.push(shell);
            } else {
                self.filler
                    .report
                    .add_builder_issue(AlertKind::ShellSplitterFailed, vec![shell.into()], mode);
            }
        }

        let retries = self.filler.options.classifier_retries;
        let classifiers: Vec<Option<SolidClassifier>> = growths
            .iter()
            .map(|&(g, _)| SolidClassifier::from_shells(self.filler.arena, &[g], retries).ok())
            .collect();
        let mut cavities: Vec<Vec<ShellKey>> = vec![Vec::new(); growths.len()];
        for hole in holes {
            match self.innermost_growth(hole, &growths, &classifiers) {
                Some(g) => cavities[g].push(hole),
                None => self
                    .filler
                    .report
                    .add_builder_issue(AlertKind::SolidBuilderUnusedHoles, vec![hole.into()], mode),
            }
        }
        self.filler.check_break()?;

        let mut solids: Vec<ShapeKey> = Vec::with_capacity(growths.len());
        for (&(growth, _), inner) in growths.iter().zip(&cavities) {
            match self.filler.arena.add_solid_with_cavities(growth, inner) {
                Ok(solid) => solids.push(solid.into()),
                Err(err) => {
                    tracing::debug!(%err, "Solid rejected");
                    self.filler
                        .report
                        .add_warning(AlertKind::BuilderFailed, vec![growth.into()]);
                }
            }
        }
        tracing::debug!(
            growths = growths.len(),
            cavities = cavities.iter().map(Vec::len).sum::<usize>(),
            solids = solids.len(),
            "Solids built"
        );

        if solids.len() == 1 {
            return Ok(solids[0]);
        }
        self.make_compound(solids).ok_or(Abort)
    }

    /// Smallest growth shell with the hole inside it, decided by the first
    /// hole face point that is not on the growth.
    fn innermost_growth(
        &self,
        hole: ShellKey,
        growths: &[(ShellKey, f64)],
        classifiers: &[Option<SolidClassifier>],
    ) -> Option<usize> {
        let arena = &*self.filler.arena;
        let fuzzy = self.filler.ds.fuzzy();
        let samples: Vec<_> = arena
            .oriented_faces(hole.into())
            .into_iter()
            .filter_map(|u| {
                let tol = arena.face(u.key)?.tolerance + fuzzy;
                Some((arena.face_interior_point(u.key)?, tol))
            })
            .collect();

        let mut best: Option<(usize, f64)> = None;
        for (g, classifier) in classifiers.iter().enumerate() {
            let Some(classifier) = classifier else {
                continue;
            };
            let state = samples
                .iter()
                .filter_map(|(p, tol)| classifier.classify(p, *tol).ok())
                .find(|s| *s != PointState::On);
            let volume = growths[g].1;
            if state == Some(PointState::In) && best.map_or(true, |(_, v)| volume < v) {
                best = Some((g, volume));
            }
        }
        best.map(|(g, _)| g)
    }
}
