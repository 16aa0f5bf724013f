// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Utility functions that I don't know where to put else

/// Number of decimal places kept for durations.
pub const DURATION_DECIMALS: i32 = 5;

/// Round a duration to five decimal places.
///
/// All durations flowing through the timeline compiler pass through this
/// function, so that sums like `0.2 + 0.2 + 0.6` compare equal to `1.0`.
///
/// # Example
///
/// ```
/// # use syn_grid::util::*;
///
/// assert_eq!(round_duration(0.1 + 0.2), 0.3);
/// assert_eq!(round_duration(0.123456), 0.12346);
/// assert_eq!(round_duration(0.6 + 0.4), 1.0);
/// ```
pub fn round_duration(duration: f64) -> f64 {
    let scale = 10.0f64.powi(DURATION_DECIMALS);
    (duration * scale).round() / scale
}

/// Compute a factor measured in decibels.
///
/// # Example
///
/// ```
/// # use syn_grid::util::*;
///
/// assert_eq!(from_decibels(0.0), 1.0);
/// assert_eq!(from_decibels(-20.0), 1.0 / 100.0);
/// ```
pub fn from_decibels(decibels: f64) -> f64 {
    10.0f64.powf(decibels / 10.0)
}
