// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Precision constants for geometric comparisons.

/// Two points closer than this are coincident. Default tolerance of every
/// shape created without an explicit one.
pub const CONFUSION: f64 = 1.0e-7;

/// Angular tolerance for parallelism checks on unit vectors (radians).
pub const ANGULAR: f64 = 1.0e-12;

/// Parallelism threshold used by the intersection numerics. Sines of angles
/// below this are treated as parallel.
pub const PARALLEL: f64 = 1.0e-9;

/// Smallest parameter span (arc length) kept when splitting a curve.
pub const PARAMETRIC: f64 = 1.0e-9;
