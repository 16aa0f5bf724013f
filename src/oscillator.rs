// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Raw sine sample generation.

use crate::wave::SampleBuffer;

#[derive(Debug, Copy, Clone)]
pub struct Phase(f64);

impl Phase {
    pub const ZERO: Phase = Phase(0.0);

    pub fn new(offset: f64) -> Phase {
        // tiny negative offsets wrap to exactly one
        let offset = offset.rem_euclid(1.0) + 0.0;
        Phase(if offset < 1.0 { offset } else { 0.0 })
    }

    pub fn offset(self) -> f64 {
        self.0
    }

    pub fn step_frequency(self, frequency: f64, sample_rate: f64) -> Phase {
        Phase::new(self.0 + frequency / sample_rate)
    }
}

/// An oscillator sampling a sine wave at a fixed sample rate.
#[derive(Debug)]
pub struct Oscillator {
    sample_rate: f64,
    frequency: f64,
    phase: Phase,
}

impl Oscillator {
    pub fn new(sample_rate: f64, frequency: f64) -> Self {
        Self {
            sample_rate,
            frequency,
            phase: Phase::ZERO,
        }
    }

    pub fn next_sample(&mut self) -> f64 {
        use std::f64::consts::PI;
        let result = (self.phase.offset() * 2.0 * PI).sin();
        self.phase = self.phase.step_frequency(self.frequency, self.sample_rate);
        result
    }
}

/// Produces the raw sine samples every wave is built from.
///
/// The sample rate belongs to the generator, the waves only ever ask for
/// a frequency and a duration.
pub trait SampleGenerator {
    fn sample_rate(&self) -> u32;

    fn sine_samples(&self, frequency: f64, duration: f64) -> SampleBuffer;

    /// Number of samples covering `duration` seconds.
    fn sample_count(&self, duration: f64) -> usize {
        if duration > 0.0 {
            (duration * self.sample_rate() as f64).round() as usize
        } else {
            0
        }
    }
}

/// Generates sine waves by stepping an [`Oscillator`].
///
/// ```
/// use syn_grid::oscillator::*;
///
/// let generator = SineGenerator::new(100);
/// assert_eq!(generator.sine_samples(5.0, 0.5).len(), 50);
/// assert_eq!(generator.sine_samples(0.0, 0.5).peak(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SineGenerator {
    sample_rate: u32,
}

impl SineGenerator {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

/// 44.1 kHz, the usual CD rate.
impl Default for SineGenerator {
    fn default() -> Self {
        Self::new(44100)
    }
}

impl SampleGenerator for SineGenerator {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn sine_samples(&self, frequency: f64, duration: f64) -> SampleBuffer {
        let mut oscillator = Oscillator::new(self.sample_rate as f64, frequency);
        let samples = (0..self.sample_count(duration))
            .map(|_| oscillator.next_sample())
            .collect();
        SampleBuffer::from_samples(samples)
    }
}
