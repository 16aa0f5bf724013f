// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The instruments voices are played on.
//!
//! All instruments share the same way of turning one slot of note events
//! into waves, they only differ in their fundamental frequency and in the
//! kind of wave built for each event.

use std::fmt;

use crate::oscillator::SampleGenerator;
use crate::score::NoteEvent;
use crate::timeline::SLOT_LENGTH;
use crate::util::round_duration;
use crate::wave::SampleBuffer;
use crate::waveform::{self, HarmonicWave, Note, Rest, SimpleWave, Waveform};

/// Frequency factor of the upper voice of a Gaffophone dyad (a perfect fifth).
/// The resulting frequency is truncated to whole Hz.
pub const FIFTH: f64 = 1.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Sawtooth waves at a 196 Hz fundamental.
    Baliset,
    /// Stuttering sawtooth waves at a 65 Hz fundamental.
    Holophonor,
    /// Square wave fifths at a 131 Hz fundamental.
    Gaffophone,
}

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 3] = [
        InstrumentKind::Baliset,
        InstrumentKind::Holophonor,
        InstrumentKind::Gaffophone,
    ];

    /// Look up an instrument by name, ignoring case and whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use syn_grid::instrument::*;
    ///
    /// assert_eq!(InstrumentKind::from_name(" Baliset"), Some(InstrumentKind::Baliset));
    /// assert_eq!(InstrumentKind::from_name("HOLO phonor"), Some(InstrumentKind::Holophonor));
    /// assert_eq!(InstrumentKind::from_name("kazoo"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<InstrumentKind> {
        let normalized: String = name
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        InstrumentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
    }

    pub fn name(self) -> &'static str {
        match self {
            InstrumentKind::Baliset => "baliset",
            InstrumentKind::Holophonor => "holophonor",
            InstrumentKind::Gaffophone => "gaffophone",
        }
    }

    /// The frequency a `1:1` ratio resolves to.
    pub fn fundamental(self) -> f64 {
        match self {
            InstrumentKind::Baliset => 196.0,
            InstrumentKind::Holophonor => 65.0,
            InstrumentKind::Gaffophone => 131.0,
        }
    }

    /// Build the wave this instrument plays for a single event.
    pub fn wave(self, frequency: f64, duration: f64, amplitude: f64) -> Waveform {
        match self {
            InstrumentKind::Baliset => HarmonicWave::sawtooth(frequency, duration, amplitude).into(),
            InstrumentKind::Holophonor => Note::stutter(frequency, duration, amplitude).into(),
            InstrumentKind::Gaffophone => {
                let root = Waveform::from(HarmonicWave::square(frequency, duration, amplitude));
                let fifth = HarmonicWave::square((frequency * FIFTH).trunc(), duration, amplitude);
                root.overlay(&fifth.into()).into()
            }
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instrument holding the waves of the slot it is about to play.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    kind: InstrumentKind,
    timeline: Vec<Waveform>,
}

impl Instrument {
    pub fn new(kind: InstrumentKind) -> Self {
        Self {
            kind,
            timeline: Vec::new(),
        }
    }

    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    pub fn timeline(&self) -> &[Waveform] {
        &self.timeline
    }

    /// Replace the timeline with the waves for one slot of events.
    pub fn next_notes(&mut self, events: &[NoteEvent]) {
        let kind = self.kind;
        self.timeline = fill_slot(events, kind.fundamental(), |frequency, duration, amplitude| {
            kind.wave(frequency, duration, amplitude)
        });
    }

    /// Total duration of the timeline.
    pub fn duration(&self) -> f64 {
        self.timeline.iter().map(Waveform::duration).sum()
    }

    /// Amplitude of the loudest wave in the timeline.
    pub fn amplitude(&self) -> f64 {
        self.timeline
            .iter()
            .map(Waveform::amplitude)
            .fold(0.0, f64::max)
    }

    pub fn simple_waves(&self) -> Vec<SimpleWave> {
        self.timeline
            .iter()
            .flat_map(Waveform::simple_waves)
            .collect()
    }

    /// Render the timeline back to back, rescaled as a whole to the loudest wave.
    pub fn render(&self, generator: &dyn SampleGenerator) -> SampleBuffer {
        waveform::render_sequence(&self.timeline, self.amplitude(), generator)
    }
}

/// Turn the events of one slot into waves spanning exactly one slot.
///
/// Events are taken in order as long as they fit. If the events run out early,
/// the slot is closed with a rest. If the next event does not fit anymore,
/// it is cut short to fill the slot and the remaining events are ignored.
pub fn fill_slot<F>(events: &[NoteEvent], fundamental: f64, build: F) -> Vec<Waveform>
where
    F: Fn(f64, f64, f64) -> Waveform,
{
    if events.is_empty() {
        return vec![Rest::new(SLOT_LENGTH).into()];
    }

    let play = |event: &NoteEvent, duration: f64| {
        if event.ratio.is_silent() {
            build(0.0, duration, 0.0)
        } else {
            build(event.ratio.frequency(fundamental), duration, event.amplitude)
        }
    };

    let mut waves = Vec::with_capacity(events.len() + 1);
    let mut filled = 0.0;
    let mut events = events.iter().peekable();
    while let Some(&event) = events.peek() {
        let total = round_duration(filled + event.duration);
        if total > SLOT_LENGTH {
            break;
        }
        waves.push(play(event, event.duration));
        filled = total;
        events.next();
    }

    let remaining = round_duration(SLOT_LENGTH - filled);
    if remaining > 0.0 {
        match events.next() {
            Some(event) => waves.push(play(event, remaining)),
            None => waves.push(Rest::new(remaining).into()),
        }
    }
    waves
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oscillator::SineGenerator;
    use crate::ratio::Ratio;
    use crate::waveform::{Harmonic, HARMONICS};

    fn event(numerator: i64, denominator: i64, amplitude: f64, duration: f64) -> NoteEvent {
        NoteEvent::new(Ratio::new(numerator, denominator), amplitude, duration)
    }

    fn played(kind: InstrumentKind, events: &[NoteEvent]) -> Instrument {
        let mut instrument = Instrument::new(kind);
        instrument.next_notes(events);
        instrument
    }

    #[test]
    fn baliset_single_beat() {
        let baliset = played(InstrumentKind::Baliset, &[event(1, 1, 1.0, 1.0)]);
        assert_eq!(
            baliset.timeline(),
            &[Waveform::Harmonic(HarmonicWave::sawtooth(196.0, 1.0, 1.0))]
        );
        assert_eq!(baliset.duration(), 1.0);
        assert_eq!(baliset.amplitude(), 1.0);
    }

    #[test]
    fn empty_slot_is_a_rest() {
        let baliset = played(InstrumentKind::Baliset, &[]);
        assert_eq!(baliset.timeline(), &[Waveform::Rest(Rest::new(1.0))]);
        assert_eq!(baliset.amplitude(), 0.0);
    }

    #[test]
    fn short_slot_is_closed_with_rest() {
        let baliset = played(InstrumentKind::Baliset, &[event(3, 2, 0.5, 0.4)]);
        assert_eq!(
            baliset.timeline(),
            &[
                Waveform::Harmonic(HarmonicWave::sawtooth(294.0, 0.4, 0.5)),
                Waveform::Rest(Rest::new(0.6)),
            ]
        );
        assert_eq!(baliset.duration(), 1.0);
    }

    #[test]
    fn overflowing_event_is_cut() {
        let baliset = played(
            InstrumentKind::Baliset,
            &[event(1, 1, 0.5, 0.6), event(2, 1, 0.25, 0.6), event(1, 1, 1.0, 0.2)],
        );
        assert_eq!(
            baliset.timeline(),
            &[
                Waveform::Harmonic(HarmonicWave::sawtooth(196.0, 0.6, 0.5)),
                Waveform::Harmonic(HarmonicWave::sawtooth(392.0, 0.4, 0.25)),
            ]
        );
    }

    #[test]
    fn exact_slot_has_no_filler() {
        let events = [
            event(1, 1, 0.5, 0.2),
            event(1, 1, 0.5, 0.2),
            event(1, 1, 0.5, 0.2),
            event(1, 1, 0.5, 0.4),
        ];
        let gaffophone = played(InstrumentKind::Gaffophone, &events);
        assert_eq!(gaffophone.timeline().len(), 4);
        assert!((gaffophone.duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn silent_ratio_is_silent() {
        let baliset = played(InstrumentKind::Baliset, &[event(0, 1, 0.9, 1.0)]);
        assert_eq!(
            baliset.timeline(),
            &[Waveform::Harmonic(HarmonicWave::sawtooth(0.0, 1.0, 0.0))]
        );
        let buffer = baliset.render(&SineGenerator::new(1000));
        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn gaffophone_plays_fifths() {
        let gaffophone = played(InstrumentKind::Gaffophone, &[event(1, 1, 0.8, 1.0)]);
        let waves = gaffophone.simple_waves();
        assert_eq!(waves.len(), 2 * HARMONICS);
        assert_eq!(waves[0].frequency(), 131.0);
        assert_eq!(waves[HARMONICS].frequency(), 196.0);
        assert_eq!(waves[HARMONICS + 2].frequency(), 588.0);
        assert_eq!(gaffophone.amplitude(), 0.8);
    }

    #[test]
    fn holophonor_stutters() {
        let holophonor = played(InstrumentKind::Holophonor, &[event(2, 1, 0.6, 1.0)]);
        match &holophonor.timeline()[0] {
            Waveform::Note(note) => {
                assert_eq!(note.components().len(), 40);
                match &note.components()[1] {
                    Waveform::Harmonic(wave) => {
                        assert_eq!(wave.shape(), Harmonic::Sawtooth);
                        assert_eq!(wave.frequency(), 130.0);
                    }
                    other => panic!("expected a sawtooth, got {:?}", other),
                }
            }
            other => panic!("expected a stutter note, got {:?}", other),
        }
        assert_eq!(holophonor.amplitude(), 0.6);
    }

    #[test]
    fn next_notes_replaces_timeline() {
        let mut baliset = played(InstrumentKind::Baliset, &[event(1, 1, 1.0, 0.5), event(1, 1, 1.0, 0.5)]);
        assert_eq!(baliset.timeline().len(), 2);
        baliset.next_notes(&[event(1, 1, 0.3, 1.0)]);
        assert_eq!(baliset.timeline().len(), 1);
        assert_eq!(baliset.amplitude(), 0.3);
    }

    #[test]
    fn render_rescales_to_loudest_wave() {
        let baliset = played(InstrumentKind::Baliset, &[event(1, 1, 0.4, 0.5), event(2, 1, 0.2, 0.5)]);
        let buffer = baliset.render(&SineGenerator::new(8000));
        assert_eq!(buffer.len(), 8000);
        assert!((buffer.peak() - 0.4).abs() < 1e-9);
    }
}
