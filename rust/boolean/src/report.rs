// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alerts, reports and the tri-state operation status.
//!
//! Every pipeline stage receives the report by `&mut` and appends to it.
//! Warnings are localized and never stop the pipeline; a failure makes the
//! operation return [`Status::NotDone`].

use paver_topology::ShapeKey;
use serde::Serialize;

use crate::options::FailureMode;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    /// The object or tool argument list is empty.
    TooFewArguments,
    /// An argument contains no shapes.
    NullInputShapes,
    /// An argument does not contain the shape types the operation needs.
    UnsupportedType,
    /// Constructing a result shape failed.
    BuilderFailed,
    /// Cancelled through the progress callback.
    UserBreak,
    /// A shell used for point classification is not closed.
    OpenShellForClassification,
    /// The intersection numerics produced no usable answer for a pair.
    NumericNonConvergence,
    /// A shell used for classification intersects itself.
    SelfInterferingShape,
    /// A split edge shorter than the parametric precision was dropped.
    TinyEdge,
    /// Dangling edges were removed before loop tracing.
    FaceBuilderUnusedEdges,
    /// A hole loop lies in no outer loop of its face.
    FaceBuilderUnusedHoles,
    /// A face could not be classified IN or OUT.
    AmbiguousClassification,
    /// Faces around an edge cannot be given consistent orientation.
    UnableToOrientTheShape,
    /// A closed shell encloses no volume.
    ShellSplitterFailed,
    /// Faces that do not form a closed shell were left out.
    SolidBuilderUnusedFaces,
    /// A hole shell lies in no growth shell.
    SolidBuilderUnusedHoles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Warning,
    Fail,
}

/// One recorded anomaly with the shapes it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub shapes: Vec<ShapeKey>,
}

/// Outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Full success.
    Done,
    /// Result usable, some localized issues recorded.
    DoneWithAlerts,
    /// No usable result; the reason is in the report.
    NotDone,
}

/// Accumulated alerts of one operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    alerts: Vec<Alert>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a recoverable alert.
    pub fn add_warning(&mut self, kind: AlertKind, shapes: Vec<ShapeKey>) {
        tracing::warn!(?kind, shapes = shapes.len(), "Boolean warning");
        self.alerts.push(Alert {
            kind,
            severity: Severity::Warning,
            shapes,
        });
    }

    /// Records an alert that aborts the operation.
    pub fn add_fail(&mut self, kind: AlertKind, shapes: Vec<ShapeKey>) {
        tracing::warn!(?kind, shapes = shapes.len(), "Boolean operation failed");
        self.alerts.push(Alert {
            kind,
            severity: Severity::Fail,
            shapes,
        });
    }

    /// Records a builder-level drop: a warning in best-effort mode, a
    /// failure in strict mode.
    pub fn add_builder_issue(&mut self, kind: AlertKind, shapes: Vec<ShapeKey>, mode: FailureMode) {
        match mode {
            FailureMode::BestEffort => self.add_warning(kind, shapes),
            FailureMode::Strict => self.add_fail(kind, shapes),
        }
    }

    /// Appends all alerts of `other`.
    pub fn merge(&mut self, other: Report) {
        self.alerts.extend(other.alerts);
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn has_fail(&self) -> bool {
        self.alerts.iter().any(|a| a.severity == Severity::Fail)
    }

    pub fn has_warnings(&self) -> bool {
        self.alerts.iter().any(|a| a.severity == Severity::Warning)
    }

    /// Whether an alert of this kind was recorded.
    pub fn contains(&self, kind: AlertKind) -> bool {
        self.alerts.iter().any(|a| a.kind == kind)
    }

    /// Alerts of one kind.
    pub fn of_kind(&self, kind: AlertKind) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.kind == kind)
    }

    /// Status implied by the recorded alerts.
    pub fn status(&self) -> Status {
        if self.has_fail() {
            Status::NotDone
        } else if self.has_warnings() {
            Status::DoneWithAlerts
        } else {
            Status::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_done() {
        assert_eq!(Report::new().status(), Status::Done);
    }

    #[test]
    fn warnings_and_fails() {
        let mut report = Report::new();
        report.add_warning(AlertKind::TinyEdge, Vec::new());
        assert_eq!(report.status(), Status::DoneWithAlerts);

        let mut other = Report::new();
        other.add_fail(AlertKind::UserBreak, Vec::new());
        report.merge(other);
        assert_eq!(report.status(), Status::NotDone);
        assert!(report.contains(AlertKind::UserBreak));
        assert_eq!(report.of_kind(AlertKind::TinyEdge).count(), 1);
    }

    #[test]
    fn builder_issue_follows_failure_mode() {
        let mut lenient = Report::new();
        lenient.add_builder_issue(AlertKind::AmbiguousClassification, Vec::new(), FailureMode::BestEffort);
        assert_eq!(lenient.status(), Status::DoneWithAlerts);

        let mut strict = Report::new();
        strict.add_builder_issue(AlertKind::AmbiguousClassification, Vec::new(), FailureMode::Strict);
        assert_eq!(strict.status(), Status::NotDone);
    }
}
