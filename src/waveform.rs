// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Composable waves.
//!
//! Every wave-like value can be *overlaid* (sounding at the same time) or
//! *concatenated* (sounding one after another). Rendering a composite wave
//! sums or chains the rendered parts and then rescales the whole buffer so
//! that its peak equals the amplitude of the composite. Parts are therefore
//! never normalized relative to each other, only relative to the whole.

use crate::oscillator::SampleGenerator;
use crate::wave::SampleBuffer;

/// Number of harmonics used to approximate sawtooth and square waves.
pub const HARMONICS: usize = 10;

/// Length in seconds of each chunk of a stuttering note.
pub const STUTTER_CHUNK: f64 = 0.025;

/// Stutter remainders shorter than this are dropped.
const STUTTER_MIN_REMAINDER: f64 = 0.0001;

/// A pure sine wave.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleWave {
    frequency: f64,
    duration: f64,
    amplitude: f64,
}

impl SimpleWave {
    /// Create a sine wave. Amplitudes above one are clamped to one.
    ///
    /// ```
    /// use syn_grid::waveform::*;
    ///
    /// assert_eq!(SimpleWave::new(440.0, 1.0, 2.5).amplitude(), 1.0);
    /// assert_eq!(SimpleWave::new(440.0, 1.0, 0.5).amplitude(), 0.5);
    /// ```
    pub fn new(frequency: f64, duration: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            duration,
            amplitude: if amplitude > 1.0 { 1.0 } else { amplitude },
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        generator
            .sine_samples(self.frequency.round(), self.duration)
            .normalized(self.amplitude)
    }
}

/// Several waves sounding at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexWave {
    components: Vec<Waveform>,
}

impl ComplexWave {
    pub fn new(components: Vec<SimpleWave>) -> Self {
        Self::from_waves(components.into_iter().map(Waveform::Simple).collect())
    }

    pub fn from_waves(components: Vec<Waveform>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Waveform] {
        &self.components
    }

    /// Number of components sounding at the same time.
    pub fn complexity(&self) -> usize {
        self.components.len()
    }

    /// The duration of the longest component.
    pub fn duration(&self) -> f64 {
        self.components
            .iter()
            .map(Waveform::duration)
            .fold(0.0, f64::max)
    }

    /// The amplitude of the loudest component, at most one.
    pub fn amplitude(&self) -> f64 {
        self.components
            .iter()
            .map(|c| c.amplitude().abs())
            .fold(0.0, f64::max)
            .min(1.0)
    }

    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        let mut sum = SampleBuffer::new();
        for component in self.components.iter() {
            sum.overlay(&component.render(generator));
        }
        sum.normalized(self.amplitude())
    }
}

/// The finite harmonic series approximating a wave shape.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Harmonic {
    /// Odd harmonics `(2k - 1) f` at `1 / (2k - 1)` of the amplitude.
    Sawtooth,
    /// All harmonics `k f` at `1 / k` of the amplitude.
    Square,
}

impl Harmonic {
    /// Multiple of the fundamental for the `k`-th harmonic, starting at one.
    fn multiple(self, k: usize) -> f64 {
        match self {
            Harmonic::Sawtooth => (2 * k - 1) as f64,
            Harmonic::Square => k as f64,
        }
    }
}

/// A wave built from the first [`HARMONICS`] terms of a harmonic series.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicWave {
    shape: Harmonic,
    frequency: f64,
    wave: ComplexWave,
}

impl HarmonicWave {
    pub fn new(shape: Harmonic, frequency: f64, duration: f64, amplitude: f64) -> Self {
        let amplitude = if amplitude > 1.0 { 1.0 } else { amplitude };
        let components = (1..=HARMONICS)
            .map(|k| {
                let multiple = shape.multiple(k);
                SimpleWave::new(multiple * frequency, duration, amplitude / multiple)
            })
            .collect();
        Self {
            shape,
            frequency,
            wave: ComplexWave::new(components),
        }
    }

    pub fn sawtooth(frequency: f64, duration: f64, amplitude: f64) -> Self {
        Self::new(Harmonic::Sawtooth, frequency, duration, amplitude)
    }

    pub fn square(frequency: f64, duration: f64, amplitude: f64) -> Self {
        Self::new(Harmonic::Square, frequency, duration, amplitude)
    }

    pub fn shape(&self) -> Harmonic {
        self.shape
    }

    /// The fundamental frequency of the series.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn as_complex(&self) -> &ComplexWave {
        &self.wave
    }
}

/// Silence of a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Rest {
    duration: f64,
}

impl Rest {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The zero-frequency, zero-amplitude sine standing in for this rest.
    pub fn as_simple(&self) -> SimpleWave {
        SimpleWave::new(0.0, self.duration, 0.0)
    }

    /// A buffer of zeros exactly as long as a sine of the same duration.
    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        generator.sine_samples(0.0, self.duration) * 0.0
    }
}

/// Waves played one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    components: Vec<Waveform>,
    amplitude: f64,
}

impl Note {
    pub fn new(components: Vec<Waveform>) -> Self {
        Self {
            components,
            amplitude: 1.0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// A tremolo: [`STUTTER_CHUNK`] long chunks alternating between silence
    /// and a sawtooth, starting with silence.
    ///
    /// The last chunk is shortened to fit the duration, unless it would be
    /// shorter than a tenth of a millisecond, in which case it is dropped.
    pub fn stutter(frequency: f64, duration: f64, amplitude: f64) -> Self {
        let chunk = |index: usize, length: f64| -> Waveform {
            if index % 2 == 1 {
                HarmonicWave::sawtooth(frequency, length, amplitude).into()
            } else {
                Rest::new(length).into()
            }
        };

        let mut components = Vec::new();
        let mut elapsed = 0.0;
        while STUTTER_CHUNK + elapsed <= duration {
            components.push(chunk(components.len(), STUTTER_CHUNK));
            elapsed += STUTTER_CHUNK;
        }
        let remainder = duration - elapsed;
        if remainder > STUTTER_MIN_REMAINDER {
            components.push(chunk(components.len(), remainder));
        }

        Note::new(components).with_amplitude(amplitude.min(1.0))
    }

    pub fn components(&self) -> &[Waveform] {
        &self.components
    }

    /// The sum of all component durations.
    pub fn duration(&self) -> f64 {
        self.components.iter().map(Waveform::duration).sum()
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Play `other` after this note. The louder amplitude of the two is kept.
    pub fn concatenate(mut self, other: Note) -> Note {
        self.components.extend(other.components);
        self.amplitude = self.amplitude.max(other.amplitude);
        self
    }

    /// Renders the components back to back, then rescales the result as a whole.
    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        render_sequence(&self.components, self.amplitude, generator)
    }
}

/// Chain the rendered `waves` and rescale the chain to `amplitude`.
pub fn render_sequence(
    waves: &[Waveform],
    amplitude: f64,
    generator: &dyn SampleGenerator,
) -> SampleBuffer {
    let mut chain = SampleBuffer::new();
    for wave in waves {
        chain.append(&wave.render(generator));
    }
    chain.normalized(amplitude)
}

/// Any wave-like value.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Simple(SimpleWave),
    Complex(ComplexWave),
    Harmonic(HarmonicWave),
    Rest(Rest),
    Note(Note),
}

impl Waveform {
    pub fn duration(&self) -> f64 {
        match self {
            Waveform::Simple(wave) => wave.duration(),
            Waveform::Complex(wave) => wave.duration(),
            Waveform::Harmonic(wave) => wave.as_complex().duration(),
            Waveform::Rest(rest) => rest.duration(),
            Waveform::Note(note) => note.duration(),
        }
    }

    /// The peak the rendered samples are scaled to.
    pub fn amplitude(&self) -> f64 {
        match self {
            Waveform::Simple(wave) => wave.amplitude(),
            Waveform::Complex(wave) => wave.amplitude(),
            Waveform::Harmonic(wave) => wave.as_complex().amplitude(),
            Waveform::Rest(_) => 0.0,
            Waveform::Note(note) => note.amplitude(),
        }
    }

    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        match self {
            Waveform::Simple(wave) => wave.render(generator),
            Waveform::Complex(wave) => wave.render(generator),
            Waveform::Harmonic(wave) => wave.as_complex().render(generator),
            Waveform::Rest(rest) => rest.render(generator),
            Waveform::Note(note) => note.render(generator),
        }
    }

    /// The parts this wave contributes when overlaid with another one.
    /// Composite simultaneous waves are flattened into their components,
    /// a note stays whole so that its parts keep sounding one after another.
    fn overlay_parts(&self) -> Vec<Waveform> {
        match self {
            Waveform::Complex(wave) => wave.components().to_vec(),
            Waveform::Harmonic(wave) => wave.as_complex().components().to_vec(),
            other => vec![other.clone()],
        }
    }

    /// Sound both waves at the same time.
    ///
    /// ```
    /// use syn_grid::waveform::*;
    ///
    /// let chord = Waveform::from(SimpleWave::new(440.0, 1.0, 1.0))
    ///     .overlay(&SimpleWave::new(550.0, 0.5, 0.5).into());
    /// assert_eq!(chord.complexity(), 2);
    /// assert_eq!(chord.duration(), 1.0);
    /// ```
    pub fn overlay(&self, other: &Waveform) -> ComplexWave {
        let mut parts = self.overlay_parts();
        parts.extend(other.overlay_parts());
        ComplexWave::from_waves(parts)
    }

    /// Play `other` after this wave.
    ///
    /// ```
    /// use syn_grid::waveform::*;
    ///
    /// let melody = Waveform::from(SimpleWave::new(440.0, 1.0, 1.0))
    ///     .concatenate(Rest::new(0.5).into());
    /// assert_eq!(melody.duration(), 1.5);
    /// ```
    pub fn concatenate(self, other: Waveform) -> Note {
        self.into_note().concatenate(other.into_note())
    }

    fn into_note(self) -> Note {
        match self {
            Waveform::Note(note) => note,
            other => Note::new(vec![other]),
        }
    }

    /// All sine waves this wave is made of, in order.
    pub fn simple_waves(&self) -> Vec<SimpleWave> {
        match self {
            Waveform::Simple(wave) => vec![wave.clone()],
            Waveform::Complex(wave) => flatten(wave.components()),
            Waveform::Harmonic(wave) => flatten(wave.as_complex().components()),
            Waveform::Rest(rest) => vec![rest.as_simple()],
            Waveform::Note(note) => flatten(note.components()),
        }
    }
}

fn flatten(waves: &[Waveform]) -> Vec<SimpleWave> {
    waves.iter().flat_map(Waveform::simple_waves).collect()
}

impl From<SimpleWave> for Waveform {
    fn from(wave: SimpleWave) -> Self {
        Waveform::Simple(wave)
    }
}

impl From<ComplexWave> for Waveform {
    fn from(wave: ComplexWave) -> Self {
        Waveform::Complex(wave)
    }
}

impl From<HarmonicWave> for Waveform {
    fn from(wave: HarmonicWave) -> Self {
        Waveform::Harmonic(wave)
    }
}

impl From<Rest> for Waveform {
    fn from(rest: Rest) -> Self {
        Waveform::Rest(rest)
    }
}

impl From<Note> for Waveform {
    fn from(note: Note) -> Self {
        Waveform::Note(note)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oscillator::SineGenerator;

    const EPSILON: f64 = 1e-9;

    fn generator() -> SineGenerator {
        SineGenerator::new(8000)
    }

    #[test]
    fn simple_wave_peak_is_amplitude() {
        for &amplitude in &[0.1, 0.7, 1.0] {
            let buffer = SimpleWave::new(440.0, 0.1, amplitude).render(&generator());
            assert_eq!(buffer.len(), 800);
            assert!((buffer.peak() - amplitude).abs() < EPSILON);
        }
    }

    #[test]
    fn silent_simple_wave_is_zero() {
        let buffer = SimpleWave::new(0.0, 0.1, 1.0).render(&generator());
        assert_eq!(buffer.len(), 800);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn simple_wave_equality() {
        let a = SimpleWave::new(440.0, 1.0, 0.5);
        assert_eq!(a, SimpleWave::new(440.0, 1.0, 0.5));
        assert_ne!(a, SimpleWave::new(440.0, 1.0, 0.25));
        assert_ne!(a, SimpleWave::new(441.0, 1.0, 0.5));
        assert_ne!(a, SimpleWave::new(440.0, 2.0, 0.5));
    }

    #[test]
    fn complex_wave_duration_and_amplitude() {
        let wave = ComplexWave::new(vec![
            SimpleWave::new(440.0, 0.5, 0.3),
            SimpleWave::new(550.0, 1.0, 0.6),
        ]);
        assert_eq!(wave.duration(), 1.0);
        assert_eq!(wave.amplitude(), 0.6);
        assert_eq!(wave.complexity(), 2);

        let buffer = wave.render(&generator());
        assert_eq!(buffer.len(), 8000);
        assert!((buffer.peak() - 0.6).abs() < EPSILON);
    }

    #[test]
    fn silent_complex_wave_renders_zeros() {
        let wave = ComplexWave::new(vec![
            SimpleWave::new(0.0, 0.5, 1.0),
            SimpleWave::new(0.0, 0.25, 1.0),
        ]);
        assert_eq!(wave.amplitude(), 1.0);
        let buffer = wave.render(&generator());
        assert_eq!(buffer.len(), 4000);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn sawtooth_series() {
        let wave = HarmonicWave::sawtooth(100.0, 1.0, 0.9);
        let simple = Waveform::from(wave.clone()).simple_waves();
        assert_eq!(simple.len(), HARMONICS);
        for (index, component) in simple.iter().enumerate() {
            let multiple = (2 * index + 1) as f64;
            assert_eq!(component.frequency(), multiple * 100.0);
            assert_eq!(component.amplitude(), 0.9 / multiple);
            assert_eq!(component.duration(), 1.0);
        }
        assert_eq!(wave.as_complex().amplitude(), 0.9);
    }

    #[test]
    fn square_series_clamps_amplitude() {
        let wave = HarmonicWave::square(100.0, 1.0, 4.0);
        let simple = Waveform::from(wave).simple_waves();
        assert_eq!(simple.len(), HARMONICS);
        for (index, component) in simple.iter().enumerate() {
            let multiple = (index + 1) as f64;
            assert_eq!(component.frequency(), multiple * 100.0);
            assert_eq!(component.amplitude(), 1.0 / multiple);
        }
    }

    #[test]
    fn harmonic_render_peak_matches_amplitude() {
        let buffer = Waveform::from(HarmonicWave::square(131.0, 0.2, 0.5)).render(&generator());
        assert!((buffer.peak() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn rest_is_silent_with_matching_length() {
        let rest = Rest::new(0.3);
        let buffer = rest.render(&generator());
        assert_eq!(buffer.len(), SimpleWave::new(440.0, 0.3, 1.0).render(&generator()).len());
        assert_eq!(buffer.peak(), 0.0);
        assert_eq!(Waveform::from(rest).amplitude(), 0.0);
    }

    #[test]
    fn rest_overlays_rather_than_sequences() {
        let overlaid = Waveform::from(Rest::new(1.0)).overlay(&HarmonicWave::sawtooth(100.0, 0.5, 1.0).into());
        assert_eq!(overlaid.complexity(), 1 + HARMONICS);
        assert_eq!(overlaid.duration(), 1.0);
        assert_eq!(overlaid.components()[0], Waveform::Rest(Rest::new(1.0)));
    }

    #[test]
    fn dyad_flattens_both_series() {
        let root = Waveform::from(HarmonicWave::square(100.0, 1.0, 0.5));
        let fifth = Waveform::from(HarmonicWave::square(150.0, 1.0, 0.5));
        assert_eq!(root.overlay(&fifth).complexity(), 2 * HARMONICS);
    }

    #[test]
    fn note_concatenates_buffers() {
        let note = Note::new(vec![
            SimpleWave::new(440.0, 0.1, 1.0).into(),
            Rest::new(0.05).into(),
            SimpleWave::new(440.0, 0.1, 0.5).into(),
        ]);
        assert!((note.duration() - 0.25).abs() < EPSILON);
        assert_eq!(note.amplitude(), 1.0);

        let buffer = note.render(&generator());
        assert_eq!(buffer.len(), 800 + 400 + 800);
        let samples = buffer.samples();
        let first = SampleBuffer::from_samples(samples[..800].to_vec()).peak();
        let silence = SampleBuffer::from_samples(samples[800..1200].to_vec()).peak();
        let last = SampleBuffer::from_samples(samples[1200..].to_vec()).peak();
        // one global rescale, the quieter part stays quieter
        assert!((first - 1.0).abs() < EPSILON);
        assert_eq!(silence, 0.0);
        assert!((last - 0.5).abs() < EPSILON);
    }

    #[test]
    fn note_rescale_is_global() {
        let note = Note::new(vec![
            SimpleWave::new(440.0, 0.1, 0.2).into(),
            SimpleWave::new(440.0, 0.1, 0.1).into(),
        ])
        .with_amplitude(0.8);
        let buffer = note.render(&generator());
        let last = SampleBuffer::from_samples(buffer.samples()[800..].to_vec()).peak();
        assert!((buffer.peak() - 0.8).abs() < EPSILON);
        assert!((last - 0.4).abs() < EPSILON);
    }

    #[test]
    fn note_concatenation_keeps_louder_amplitude() {
        let quiet = Note::new(vec![Rest::new(0.5).into()]).with_amplitude(0.25);
        let loud = Note::new(vec![SimpleWave::new(220.0, 0.5, 1.0).into()]).with_amplitude(0.75);
        let both = quiet.concatenate(loud);
        assert_eq!(both.amplitude(), 0.75);
        assert_eq!(both.components().len(), 2);
        assert_eq!(both.duration(), 1.0);
    }

    #[test]
    fn stutter_alternates_starting_with_rest() {
        let note = Note::stutter(196.0, 0.1, 0.5);
        assert_eq!(note.components().len(), 4);
        for (index, chunk) in note.components().iter().enumerate() {
            match chunk {
                Waveform::Rest(_) => assert_eq!(index % 2, 0),
                Waveform::Harmonic(wave) => {
                    assert_eq!(index % 2, 1);
                    assert_eq!(wave.shape(), Harmonic::Sawtooth);
                    assert_eq!(wave.frequency(), 196.0);
                }
                other => panic!("unexpected chunk {:?}", other),
            }
        }
        assert!((note.duration() - 0.1).abs() < EPSILON);
        assert_eq!(note.amplitude(), 0.5);
    }

    #[test]
    fn stutter_remainder() {
        // 0.01 left over after two chunks: a shortened third chunk, which is a rest
        let note = Note::stutter(196.0, 0.06, 1.0);
        assert_eq!(note.components().len(), 3);
        assert!(matches!(note.components()[2], Waveform::Rest(_)));
        assert!((note.duration() - 0.06).abs() < EPSILON);

        // too short to keep
        let note = Note::stutter(196.0, 0.05005, 1.0);
        assert_eq!(note.components().len(), 2);
        assert!((note.duration() - 0.05).abs() < EPSILON);
    }

    #[test]
    fn stutter_remainder_on_sounding_chunk() {
        let note = Note::stutter(196.0, 0.035, 1.0);
        assert_eq!(note.components().len(), 2);
        assert_eq!(note.components()[0], Waveform::Rest(Rest::new(STUTTER_CHUNK)));
        match &note.components()[1] {
            Waveform::Harmonic(wave) => {
                assert_eq!(wave.shape(), Harmonic::Sawtooth);
                assert!((wave.as_complex().duration() - 0.01).abs() < EPSILON);
            }
            other => panic!("expected a shortened sawtooth, got {:?}", other),
        }
    }

    #[test]
    fn note_overlays_as_one_part() {
        let note = Note::new(vec![
            SimpleWave::new(440.0, 0.5, 1.0).into(),
            SimpleWave::new(550.0, 0.5, 1.0).into(),
        ]);
        let overlaid = Waveform::from(note.clone()).overlay(&SimpleWave::new(220.0, 1.0, 0.5).into());
        assert_eq!(overlaid.complexity(), 2);
        assert_eq!(overlaid.components()[0], Waveform::Note(note));
        assert_eq!(overlaid.duration(), 1.0);
    }
}
