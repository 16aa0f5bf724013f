// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Pitches expressed as a ratio relative to an instrument's fundamental frequency.

use std::error::Error;
use std::fmt;

/// A pitch ratio `numerator:denominator`.
///
/// A zero in either position denotes silence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ratio {
    numerator: i64,
    denominator: i64,
}

impl Ratio {
    /// The ratio used for rests and fillers. Paired with amplitude zero.
    pub const UNISON: Ratio = Ratio {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn numerator(self) -> i64 {
        self.numerator
    }

    pub fn denominator(self) -> i64 {
        self.denominator
    }

    pub fn is_silent(self) -> bool {
        self.numerator == 0 || self.denominator == 0
    }

    /// Whether the ratio has a negative component, which is neither a tone nor silence.
    pub fn is_degenerate(self) -> bool {
        self.numerator < 0 || self.denominator < 0
    }

    /// Resolve the ratio against a fundamental frequency, rounded to whole Hz.
    /// Degenerate ratios resolve to the magnitude of their frequency.
    ///
    /// # Examples
    ///
    /// ```
    /// use syn_grid::ratio::*;
    ///
    /// assert_eq!(Ratio::new(1, 1).frequency(196.0), 196.0);
    /// assert_eq!(Ratio::new(3, 2).frequency(131.0), 197.0);
    /// assert_eq!(Ratio::new(0, 5).frequency(196.0), 0.0);
    /// assert_eq!(Ratio::new(-1, 2).frequency(196.0), 98.0);
    /// ```
    pub fn frequency(self, fundamental: f64) -> f64 {
        if self.is_silent() {
            0.0
        } else {
            (self.numerator as f64 / self.denominator as f64 * fundamental)
                .round()
                .abs()
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

/// An error which can be returned when parsing a ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRatioError;

impl Error for ParseRatioError {}

impl fmt::Display for ParseRatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed ratio, expected <int>:<int>")
    }
}

impl std::str::FromStr for Ratio {
    type Err = ParseRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let mut next_int = || -> Result<i64, ParseRatioError> {
            parts
                .next()
                .and_then(|part| part.trim().parse().ok())
                .ok_or(ParseRatioError)
        };
        let numerator = next_int()?;
        let denominator = next_int()?;
        if parts.next().is_some() {
            Err(ParseRatioError)
        } else {
            Ok(Ratio::new(numerator, denominator))
        }
    }
}
