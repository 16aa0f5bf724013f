// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Easy interface for getting sound to play using a sox subprocess.

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use log::{debug, error};

use crate::play::Playback;
use crate::wave::SampleBuffer;

pub enum SoxTarget<'a> {
    /// Play on the default speakers.
    Play,
    /// Write to a file in any format sox supports.
    File(&'a Path),
}

/// Pipes mono `f64` samples into `play` or `sox`.
pub struct SoxSink {
    player: Child,
    audio_stream: Option<ChildStdin>,
    buffer: Vec<u8>,
    gain: f64,
}

impl SoxSink {
    pub fn new(sample_rate: u32, target: SoxTarget) -> io::Result<Self> {
        let sample_rate_str = format!("{}", sample_rate);
        let input_args = &[
            "-R", // make the output reproducible
            "--channels",
            "1",
            "--rate",
            &sample_rate_str,
            "--type",
            "f64",
            "/dev/stdin",
        ];

        // For properly recording the sox dependency on nix:
        let (play, sox): (PathBuf, PathBuf) =
            if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
                debug!("using sox from nix store {}", sox_bin);
                (Path::new(sox_bin).join("play"), Path::new(sox_bin).join("sox"))
            } else {
                ("play".into(), "sox".into())
            };

        let player = match target {
            SoxTarget::Play => Command::new(&play)
                .args(input_args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?,
            SoxTarget::File(outfile) => Command::new(&sox)
                .args(input_args)
                .arg(outfile)
                .stdin(Stdio::piped())
                .spawn()?,
        };

        Self::from_child(player)
    }

    /// Send the samples to the input of an already spawned process.
    fn from_child(mut player: Child) -> io::Result<Self> {
        let audio_stream = player.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "sox did not provide an input stream")
        })?;

        Ok(Self {
            player,
            audio_stream: Some(audio_stream),
            buffer: Vec::new(),
            gain: 1.0,
        })
    }

    /// Scale all emitted samples by a linear factor.
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Close the input stream and wait for sox to finish writing.
    pub fn finish(mut self) -> io::Result<()> {
        drop(self.audio_stream.take());
        let status = self.player.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("sox exited with {}", status),
            ))
        }
    }
}

impl Playback for SoxSink {
    fn emit(&mut self, buffer: &SampleBuffer) -> io::Result<()> {
        let audio_stream = self.audio_stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "sox input already closed")
        })?;

        let scaled = buffer.clone() * self.gain;
        if self.buffer.len() < scaled.byte_len() {
            self.buffer.resize(scaled.byte_len(), 0);
        }
        scaled.copy_bytes_to(&mut self.buffer);

        let status = audio_stream
            .write_all(&self.buffer[..scaled.byte_len()])
            .and_then(|_| audio_stream.flush());
        if let Err(err) = &status {
            error!("Failed to write audio to sox stream: {}", err);
        }
        status
    }
}

/// A sink that was not finished still closes the input and reaps sox.
impl Drop for SoxSink {
    fn drop(&mut self) {
        if let Some(audio_stream) = self.audio_stream.take() {
            drop(audio_stream);
            if let Err(err) = self.player.wait() {
                error!("Failed to wait for sox: {}", err);
            }
        }
    }
}
