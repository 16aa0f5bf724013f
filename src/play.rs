// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Playing compiled timelines, one row of slots after the other.

use std::io;
use std::path::Path;

use log::{info, trace};
use snafu::{ResultExt, Snafu};

use crate::oscillator::{SampleGenerator, SineGenerator};
use crate::score::{ScoreConfig, ScoreError};
use crate::timeline::{self, Timeline};
use crate::wave::SampleBuffer;

/// Something that audio can be sent to.
///
/// Both methods are expected to block until the audio was consumed,
/// so that rows are heard in the order they are emitted.
pub trait Playback {
    /// Emit a single buffer.
    fn emit(&mut self, buffer: &SampleBuffer) -> io::Result<()>;

    /// Emit buffers that sound at the same time.
    /// By default, they are mixed into one buffer by averaging.
    fn emit_parallel(&mut self, buffers: &[SampleBuffer]) -> io::Result<()> {
        self.emit(&SampleBuffer::mix(buffers))
    }
}

/// Keeps everything that is emitted in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    recording: SampleBuffer,
    emitted: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All emitted audio, back to back.
    pub fn recording(&self) -> &SampleBuffer {
        &self.recording
    }

    /// How many buffers were emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_recording(self) -> SampleBuffer {
        self.recording
    }
}

impl Playback for Recorder {
    fn emit(&mut self, buffer: &SampleBuffer) -> io::Result<()> {
        self.recording.append(buffer);
        self.emitted += 1;
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum PlayError {
    #[snafu(display("{}", source))]
    Compile { source: ScoreError },
    #[snafu(display("Failed to emit audio: {}", source))]
    Emit { source: io::Error },
}

/// Render every row of the timeline and hand it to the playback.
pub fn play_timeline(
    timeline: &Timeline,
    generator: &dyn SampleGenerator,
    playback: &mut dyn Playback,
) -> io::Result<()> {
    info!(
        "playing {} voices at {} Hz",
        timeline.voices().len(),
        generator.sample_rate()
    );
    info!(
        "total length {} rows ({:.2} seconds)",
        timeline.row_count(),
        timeline.duration()
    );

    for (index, row) in timeline.rows().enumerate() {
        let buffers: Vec<SampleBuffer> = row
            .iter()
            .map(|instrument| instrument.render(generator))
            .collect();
        trace!(
            "{:4}: {} voices, {} samples",
            index,
            buffers.len(),
            buffers.iter().map(SampleBuffer::len).max().unwrap_or(0)
        );
        playback.emit_parallel(&buffers)?;
    }
    Ok(())
}

/// Compile a score file and play it at the default sample rate.
pub fn play_song(path: &Path, beat: f64, playback: &mut dyn Playback) -> Result<(), PlayError> {
    let timeline = timeline::compile_file(path, &ScoreConfig::new(beat)).context(Compile)?;
    play_timeline(&timeline, &SineGenerator::default(), playback).context(Emit)
}
