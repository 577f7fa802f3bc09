// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration and presets for boolean operations.
//!
//! # Presets
//!
//! - [`BooleanOptions::default()`] - exact input, parallel, best-effort
//! - [`BooleanOptions::strict()`] - abort on the first ambiguous face or shell
//! - [`BooleanOptions::for_noisy_input()`] - adds a fuzzy tolerance for input
//!   whose coincident features are only approximately coincident
//!
//! # Example
//!
//! ```
//! use paver_boolean::{BooleanOptions, FailureMode};
//!
//! let options = BooleanOptions::default()
//!     .with_fuzzy_value(1e-5)
//!     .with_failure_mode(FailureMode::Strict);
//! assert_eq!(options.fuzzy_value(), 1e-5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the builder does with a face or shell it cannot place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Drop the offending face or shell, record a warning and continue.
    #[default]
    BestEffort,
    /// Record a failure and report the whole operation as not done.
    Strict,
}

/// Options of one boolean operation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    /// Additional tolerance added to every coincidence test.
    fuzzy_value: f64,

    /// Whether to use parallel processing (via rayon) for pair categories
    /// and per-face builder steps.
    pub run_parallel: bool,

    /// Policy for ambiguous faces and shells.
    pub failure_mode: FailureMode,

    /// Ray directions tried by the solid classifier before it falls back
    /// to the winding-number test.
    pub classifier_retries: usize,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            fuzzy_value: 0.0,
            run_parallel: true,
            failure_mode: FailureMode::default(),
            classifier_retries: 8,
        }
    }
}

impl BooleanOptions {
    /// Best-effort off: any dropped face or shell aborts the operation.
    pub fn strict() -> Self {
        Self {
            failure_mode: FailureMode::Strict,
            ..Self::default()
        }
    }

    /// Looser coincidence tests for approximately coincident input.
    pub fn for_noisy_input() -> Self {
        Self {
            fuzzy_value: 1e-5,
            classifier_retries: 16,
            ..Self::default()
        }
    }

    /// Sets the fuzzy value. Negative and non-finite values become zero.
    pub fn with_fuzzy_value(mut self, value: f64) -> Self {
        self.fuzzy_value = sanitize_fuzzy(value);
        self
    }

    pub fn with_parallel(mut self, run_parallel: bool) -> Self {
        self.run_parallel = run_parallel;
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Sets the ray retry count (at least one ray is always cast).
    pub fn with_classifier_retries(mut self, retries: usize) -> Self {
        self.classifier_retries = retries.max(1);
        self
    }

    /// The effective fuzzy value, never negative.
    pub fn fuzzy_value(&self) -> f64 {
        sanitize_fuzzy(self.fuzzy_value)
    }

    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut options: Self = serde_json::from_str(text)?;
        options.fuzzy_value = sanitize_fuzzy(options.fuzzy_value);
        options.classifier_retries = options.classifier_retries.max(1);
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn sanitize_fuzzy(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
