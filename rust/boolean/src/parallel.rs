// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slot-indexed parallel map.
//!
//! Every work item writes exactly one output slot at its own index, so the
//! result vector has the same order as the input whatever the schedule.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Maps `f` over `items` into a vector of slots in input order.
///
/// On native targets with `parallel` set the map runs on the rayon pool.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn map_slots<T, R, F>(items: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel && items.len() > 1 {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// On WASM: sequential iteration (no threads available).
#[cfg(target_arch = "wasm32")]
pub(crate) fn map_slots<T, R, F>(items: &[T], _parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.iter().map(f).collect()
}
