// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Process-wide seeded random number generation.

Every core routine takes `&mut impl Rng`, so tests and embedding code can
supply their own generator. Drivers that process many batches in one run
use the generator returned by [`global_rng`], seeded exactly once per run
via [`seed_global`] *before* the first batch: batches are independent
units of work, and reseeding between batches would break run-level
reproducibility.
*/

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;

const DEFAULT_SEED: u64 = 123_456;

static GLOBAL_RNG: Lazy<Mutex<StdRng>> =
    Lazy::new(|| Mutex::new(StdRng::seed_from_u64(DEFAULT_SEED)));

/// Re-seed the process-wide generator. Call once per run, before the
/// first batch is processed.
pub fn seed_global(seed: u64) {
    *GLOBAL_RNG.lock() = StdRng::seed_from_u64(seed);
}

/// Lock the process-wide generator. The guard is held for the duration of
/// a batch; there is no concurrent access within the core.
pub fn global_rng() -> MutexGuard<'static, StdRng> {
    GLOBAL_RNG.lock()
}
