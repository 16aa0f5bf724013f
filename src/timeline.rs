// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Compiling scores into timelines of equally long slots.
//!
//! The notes of a voice have arbitrary durations. For playback, every voice
//! is cut into slots of exactly [`SLOT_LENGTH`] seconds, so that all voices
//! can advance in lockstep: short notes are merged with the notes following
//! them, long notes are split across several slots.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use log::{debug, info};

use crate::instrument::{Instrument, InstrumentKind};
use crate::score::{NoteEvent, Score, ScoreConfig, ScoreError};
use crate::util::round_duration;

/// The length of a slot in seconds.
pub const SLOT_LENGTH: f64 = 1.0;

/// The notes of one voice sounding during one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    events: Vec<NoteEvent>,
}

impl Slot {
    pub fn new(events: Vec<NoteEvent>) -> Self {
        Self { events }
    }

    /// A slot without sound.
    pub fn silent() -> Self {
        Self::new(vec![NoteEvent::rest(SLOT_LENGTH)])
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// The summed duration of the events, rounded like the events themselves.
    pub fn duration(&self) -> f64 {
        round_duration(self.events.iter().map(|e| e.duration).sum())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, event) in self.events.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", event)?;
        }
        Ok(())
    }
}

/// Cut the events of one voice into slots.
///
/// Every slot lasts exactly one [`SLOT_LENGTH`], except for the last one,
/// which may be shorter when the events merged into it run out.
pub fn quantize(events: Vec<NoteEvent>) -> Vec<Slot> {
    let mut pending: VecDeque<NoteEvent> = events.into();
    let mut slots = Vec::new();

    while let Some(event) = pending.pop_front() {
        let duration = event.duration;
        if duration == SLOT_LENGTH {
            slots.push(Slot::new(vec![event]));
        } else if duration > SLOT_LENGTH {
            // the rest of the note is looked at again in the next iteration
            slots.push(Slot::new(vec![event.with_duration(SLOT_LENGTH)]));
            pending.push_front(event.with_duration(duration - SLOT_LENGTH));
        } else if pending.is_empty() {
            let filler = NoteEvent::rest(SLOT_LENGTH - duration);
            slots.push(Slot::new(vec![event, filler]));
        } else {
            slots.push(merge_forward(event, &mut pending));
        }
    }

    slots
}

/// Fill up a slot starting with `first` with the pending events.
/// An event that does not fit entirely is split, its remainder stays pending.
fn merge_forward(first: NoteEvent, pending: &mut VecDeque<NoteEvent>) -> Slot {
    let mut total = first.duration;
    let mut events = vec![first];

    while total < SLOT_LENGTH {
        let next = match pending.pop_front() {
            Some(next) => next,
            None => break,
        };
        let merged = round_duration(total + next.duration);
        if merged <= SLOT_LENGTH {
            events.push(next);
            total = merged;
        } else {
            events.push(next.with_duration(SLOT_LENGTH - total));
            pending.push_front(next.with_duration(merged - SLOT_LENGTH));
            total = SLOT_LENGTH;
        }
    }

    Slot::new(events)
}

/// Append silent slots until all voices have the same number of slots.
/// Every voice ends up with at least one slot.
pub fn pad(voices: &mut [Vec<Slot>]) {
    let rows = voices.iter().map(Vec::len).max().unwrap_or(0).max(1);
    for slots in voices.iter_mut() {
        slots.resize(rows, Slot::silent());
    }
}

/// The slots of a single voice, together with the instruments playing them.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceTimeline {
    instrument: InstrumentKind,
    slots: Vec<Slot>,
    playables: Vec<Instrument>,
}

impl VoiceTimeline {
    /// Prepare one instrument per slot.
    pub fn new(instrument: InstrumentKind, slots: Vec<Slot>) -> Self {
        let playables = slots
            .iter()
            .map(|slot| {
                let mut playable = Instrument::new(instrument);
                playable.next_notes(slot.events());
                playable
            })
            .collect();
        Self {
            instrument,
            slots,
            playables,
        }
    }

    pub fn instrument(&self) -> InstrumentKind {
        self.instrument
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// One instrument per slot, ready to be rendered.
    pub fn playables(&self) -> &[Instrument] {
        &self.playables
    }
}

/// A compiled song: all voices cut into the same number of slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    voices: Vec<VoiceTimeline>,
}

impl Timeline {
    pub fn compile(score: Score) -> Timeline {
        let voices = score.into_voices();
        let instruments: Vec<InstrumentKind> = voices.iter().map(|v| v.instrument).collect();

        let mut slots: Vec<Vec<Slot>> = voices
            .into_iter()
            .enumerate()
            .map(|(index, voice)| {
                let event_count = voice.events.len();
                let slots = quantize(voice.events);
                debug!(
                    "voice {} ({}): {} events in {} slots",
                    index,
                    voice.instrument,
                    event_count,
                    slots.len()
                );
                slots
            })
            .collect();
        pad(&mut slots);

        let voices: Vec<_> = instruments
            .into_iter()
            .zip(slots)
            .map(|(instrument, slots)| VoiceTimeline::new(instrument, slots))
            .collect();
        let timeline = Timeline { voices };
        info!(
            "compiled {} voices into {} rows",
            timeline.voices.len(),
            timeline.row_count()
        );
        timeline
    }

    pub fn voices(&self) -> &[VoiceTimeline] {
        &self.voices
    }

    /// Number of slots in each voice.
    pub fn row_count(&self) -> usize {
        self.voices.first().map_or(0, |v| v.slots.len())
    }

    /// Length of the song in seconds.
    pub fn duration(&self) -> f64 {
        self.row_count() as f64 * SLOT_LENGTH
    }

    /// The instruments of all voices sounding during one slot.
    pub fn row(&self, index: usize) -> Vec<&Instrument> {
        self.voices
            .iter()
            .filter_map(|voice| voice.playables.get(index))
            .collect()
    }

    /// Iterate over the rows in the order they are played.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Instrument>> + '_ {
        (0..self.row_count()).map(move |index| self.row(index))
    }
}

/// Lists the slots of every voice, one line per slot.
impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for voice in self.voices.iter() {
            writeln!(f, "{}", voice.instrument)?;
            for (index, slot) in voice.slots.iter().enumerate() {
                writeln!(f, "{:4} | {}", index, slot)?;
            }
        }
        Ok(())
    }
}

/// Parse and compile a score given as text.
pub fn compile_str(source: &str, config: &ScoreConfig) -> Result<Timeline, ScoreError> {
    Score::parse(source, config).map(Timeline::compile)
}

/// Read and compile a score file.
pub fn compile_file(path: &Path, config: &ScoreConfig) -> Result<Timeline, ScoreError> {
    Score::read(path, config).map(Timeline::compile)
}
