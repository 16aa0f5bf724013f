// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This is the namespace for all parts dealing with data in sampled waves.

use std::ops;

/// A buffer holding mono floating point audio data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f64>,
}

#[allow(clippy::len_without_is_empty)]
impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// A buffer of `sample_count` zero samples.
    pub fn silence(sample_count: usize) -> Self {
        Self {
            samples: vec![0.0; sample_count],
        }
    }

    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// Size of the buffer in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Size of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * std::mem::size_of::<f64>()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    /// The largest absolute sample value, zero for an empty buffer.
    ///
    /// ```
    /// use syn_grid::wave::*;
    ///
    /// assert_eq!(SampleBuffer::from_samples(vec![0.25, -0.5, 0.125]).peak(), 0.5);
    /// assert_eq!(SampleBuffer::new().peak(), 0.0);
    /// ```
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0, |peak, s| s.abs().max(peak))
    }

    /// Rescale the buffer so that its peak equals `amplitude`.
    ///
    /// A buffer without any non-zero sample cannot be rescaled and becomes all zeros.
    ///
    /// ```
    /// use syn_grid::wave::*;
    ///
    /// let buffer = SampleBuffer::from_samples(vec![0.5, -0.25]);
    /// assert_eq!(buffer.normalized(0.25).samples(), &[0.25, -0.125]);
    /// assert_eq!(SampleBuffer::silence(2).normalized(1.0).samples(), &[0.0, 0.0]);
    /// ```
    pub fn normalized(mut self, amplitude: f64) -> Self {
        let peak = self.peak();
        if peak != 0.0 {
            self *= amplitude / peak;
        } else {
            self.samples.iter_mut().for_each(|s| *s = 0.0);
        }
        self
    }

    /// Add `other` onto this buffer sample by sample.
    /// Where one buffer is longer, its tail is kept as is.
    pub fn overlay(&mut self, other: &SampleBuffer) {
        for (sample, add) in self.samples.iter_mut().zip(other.samples.iter()) {
            *sample += add;
        }
        if other.len() > self.len() {
            let tail = &other.samples[self.len()..];
            self.samples.extend_from_slice(tail);
        }
    }

    /// Append `other` after the end of this buffer.
    pub fn append(&mut self, other: &SampleBuffer) {
        self.samples.extend_from_slice(&other.samples);
    }

    /// Mix simultaneously sounding buffers into one, averaging them so that
    /// the mix does not exceed the loudest input.
    pub fn mix(buffers: &[SampleBuffer]) -> SampleBuffer {
        let mut mixed = SampleBuffer::new();
        for buffer in buffers {
            mixed.overlay(buffer);
        }
        if !buffers.is_empty() {
            mixed *= (buffers.len() as f64).recip();
        }
        mixed
    }

    /// Copy the `f64` samples to bytes in little endian order.
    ///
    /// Returns the number of samples that were actually copied.
    /// Might be less than the number of input samples if the output buffer was not large enough.
    pub fn copy_bytes_to(&self, bytes: &mut [u8]) -> usize {
        let mut processed = 0;
        for (sample, target) in self.samples.iter().zip(bytes.chunks_exact_mut(8)) {
            target.copy_from_slice(&sample.to_le_bytes());
            processed += 1;
        }
        processed
    }
}

impl ops::MulAssign<f64> for SampleBuffer {
    fn mul_assign(&mut self, rhs: f64) {
        self.samples.iter_mut().for_each(|s| *s *= rhs);
    }
}

impl ops::Mul<f64> for SampleBuffer {
    type Output = SampleBuffer;

    fn mul(mut self, rhs: f64) -> Self::Output {
        self *= rhs;
        self
    }
}
