// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Reading scores.
//!
//! A score is a comma separated table. The first row names the instrument of
//! each column, every following row holds at most one cell per instrument:
//!
//! ```text
//! baliset, holophonor
//! 1:1:0.5:1.5, rest1
//! 3:2:0.5:0.5,
//! ```
//!
//! A cell is either `rest<beats>` or `<numerator>:<denominator>:<amplitude>:<beats>`.
//! Empty cells are skipped. Durations are given in beats and converted to
//! seconds using the beat length of the song.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use snafu::{ResultExt, Snafu};

use crate::instrument::InstrumentKind;
use crate::ratio::Ratio;
use crate::util::round_duration;

#[derive(Debug, Snafu)]
pub enum ScoreError {
    #[snafu(display("Could not read score {}: {}", path.display(), source))]
    ReadScore { path: PathBuf, source: io::Error },
    #[snafu(display("The score has no header naming its voices"))]
    MissingHeader,
    #[snafu(display("The beat length must be a positive number of seconds, got {}", beat))]
    InvalidBeat { beat: f64 },
    #[snafu(display("Unknown instrument {:?} in column {}", name, column))]
    UnknownInstrument { column: usize, name: String },
    #[snafu(display("Malformed cell {:?} in line {}, column {}", cell, line, column))]
    MalformedCell {
        line: usize,
        column: usize,
        cell: String,
    },
    #[snafu(display(
        "Line {} has {} cells, but the header only names {} voices",
        line,
        found,
        expected
    ))]
    RowTooWide {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// How a score is read.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScoreConfig {
    /// Length of one beat in seconds.
    pub beat: f64,
    /// Instrument used for unknown names in the header. Unknown names are an error if not set.
    pub fallback_instrument: Option<InstrumentKind>,
}

impl ScoreConfig {
    pub fn new(beat: f64) -> Self {
        Self {
            beat,
            fallback_instrument: None,
        }
    }

    pub fn with_fallback(mut self, instrument: InstrumentKind) -> Self {
        self.fallback_instrument = Some(instrument);
        self
    }
}

/// A single note played by one voice.
///
/// The duration is measured in seconds and always rounded to five decimal places.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoteEvent {
    /// Pitch relative to the fundamental of the instrument
    pub ratio: Ratio,
    /// Loudness between 0 and 1
    pub amplitude: f64,
    /// How long the note is held
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(ratio: Ratio, amplitude: f64, duration: f64) -> Self {
        Self {
            ratio,
            amplitude,
            duration: round_duration(duration),
        }
    }

    /// Silence, a unison ratio at zero amplitude.
    pub fn rest(duration: f64) -> Self {
        Self::new(Ratio::UNISON, 0.0, duration)
    }

    /// The same note held for a different duration.
    pub fn with_duration(self, duration: f64) -> Self {
        Self::new(self.ratio, self.amplitude, duration)
    }
}

/// Formats the event like a score cell, with the duration in seconds instead of beats.
impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.ratio, self.amplitude, self.duration)
    }
}

/// The events of one column of the score, in the order they are played.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceEvents {
    pub instrument: InstrumentKind,
    pub events: Vec<NoteEvent>,
}

/// A parsed score, one entry per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    voices: Vec<VoiceEvents>,
}

impl Score {
    /// Read and parse a score file.
    pub fn read(path: &Path, config: &ScoreConfig) -> Result<Score, ScoreError> {
        let source = std::fs::read_to_string(path).context(ReadScore { path })?;
        debug!("read score {} ({} bytes)", path.display(), source.len());
        Score::parse(&source, config)
    }

    /// Parse the textual representation of a score.
    pub fn parse(source: &str, config: &ScoreConfig) -> Result<Score, ScoreError> {
        let beat = config.beat;
        if !(beat.is_finite() && beat > 0.0) {
            return Err(ScoreError::InvalidBeat { beat });
        }

        // line numbers start at one
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(ScoreError::MissingHeader)?;
        let mut voices = header
            .split(',')
            .enumerate()
            .map(|(index, name)| {
                let instrument = parse_instrument(index + 1, name, config)?;
                Ok(VoiceEvents {
                    instrument,
                    events: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, ScoreError>>()?;

        for (line, row) in lines {
            let cells: Vec<&str> = row.split(',').collect();
            if cells.len() > voices.len() {
                return Err(ScoreError::RowTooWide {
                    line,
                    expected: voices.len(),
                    found: cells.len(),
                });
            }
            for (index, cell) in cells.into_iter().enumerate() {
                let malformed = || ScoreError::MalformedCell {
                    line,
                    column: index + 1,
                    cell: cell.trim().to_string(),
                };
                if let Some(event) = parse_cell(cell, beat).ok_or_else(malformed)? {
                    if event.ratio.is_degenerate() {
                        warn!(
                            "line {}, column {}: ratio {} is negative, using its magnitude",
                            line,
                            index + 1,
                            event.ratio
                        );
                    }
                    voices[index].events.push(event);
                }
            }
        }

        Ok(Score { voices })
    }

    pub fn voices(&self) -> &[VoiceEvents] {
        &self.voices
    }

    pub fn into_voices(self) -> Vec<VoiceEvents> {
        self.voices
    }
}

fn parse_instrument(
    column: usize,
    name: &str,
    config: &ScoreConfig,
) -> Result<InstrumentKind, ScoreError> {
    if let Some(instrument) = InstrumentKind::from_name(name) {
        return Ok(instrument);
    }
    match config.fallback_instrument {
        Some(fallback) => {
            warn!(
                "column {}: unknown instrument {:?}, playing it on the {}",
                column,
                name.trim(),
                fallback
            );
            Ok(fallback)
        }
        None => Err(ScoreError::UnknownInstrument {
            column,
            name: name.trim().to_string(),
        }),
    }
}

/// Parse a single cell, ignoring whitespace and case.
///
/// Returns `None` for malformed cells and `Some(None)` for empty cells.
fn parse_cell(cell: &str, beat: f64) -> Option<Option<NoteEvent>> {
    let cell: String = cell
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if cell.is_empty() {
        return Some(None);
    }

    if let Some(beats) = cell.strip_prefix("rest") {
        let beats = beats.strip_prefix(':').unwrap_or(beats);
        let beats = beats
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(beats);
        let beats = parse_non_negative(beats)?;
        return Some(Some(NoteEvent::rest(beats * beat)));
    }

    let fields: Vec<&str> = cell.split(':').collect();
    if fields.len() != 4 {
        return None;
    }
    let ratio: Ratio = fields[..2].join(":").parse().ok()?;
    let amplitude = round_duration(parse_non_negative(fields[2])?);
    let beats = parse_non_negative(fields[3])?;
    Some(Some(NoteEvent::new(ratio, amplitude, beats * beat)))
}

fn parse_non_negative(input: &str) -> Option<f64> {
    let value: f64 = input.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
