// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `gridplay` plays beat grid scores on the speakers or writes them to a file.

use std::io;
use std::io::Write;
use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

use syn_grid::instrument::InstrumentKind;
use syn_grid::oscillator::{SampleGenerator, SineGenerator};
use syn_grid::output::sox::{SoxSink, SoxTarget};
use syn_grid::play::{self, Playback, Recorder};
use syn_grid::score::ScoreConfig;
use syn_grid::timeline;
use syn_grid::util;

#[derive(Debug, StructOpt)]
#[structopt(name = "gridplay", about = "Playing beat grid scores")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The score, one column per voice.
    #[structopt(parse(from_os_str))]
    score: PathBuf,

    /// Length of one beat in seconds.
    #[structopt(short, long, default_value = "0.5")]
    beat: f64,

    /// Final gain in decibels applied to the output of the song.
    #[structopt(short = "g", long = "gain", default_value = "0.0")]
    gain: f64,

    /// Output file (any sox-supported format). Music is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Play voices with unknown instrument names on the gaffophone instead of failing.
    #[structopt(long)]
    lenient: bool,

    /// Dump the compiled timeline.
    #[structopt(long)]
    #[allow(clippy::option_option)]
    dump_timeline: Option<Option<PathBuf>>,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    let mut config = ScoreConfig::new(opt.beat);
    if opt.lenient {
        config = config.with_fallback(InstrumentKind::Gaffophone);
    }
    let timeline = timeline::compile_file(&opt.score, &config)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    let dump_out = opt
        .dump_timeline
        .map(|path| path.unwrap_or_else(|| "/dev/stdout".into()));
    if let Some(dump_out_path) = dump_out {
        let mut f = std::fs::File::create(dump_out_path)?;
        write!(f, "{}", timeline)?;
    }

    let generator = SineGenerator::default();
    let gain = util::from_decibels(opt.gain);
    match opt.output.as_deref() {
        None => {
            let mut sink = SoxSink::new(generator.sample_rate(), SoxTarget::Play)?.with_gain(gain);
            play::play_timeline(&timeline, &generator, &mut sink)?;
            sink.finish()
        }
        Some(path) => {
            let mut recorder = Recorder::new();
            play::play_timeline(&timeline, &generator, &mut recorder)?;
            info!("writing {} samples to {}", recorder.recording().len(), path.display());
            let mut sink = SoxSink::new(generator.sample_rate(), SoxTarget::File(path))?.with_gain(gain);
            sink.emit(recorder.recording())?;
            sink.finish()
        }
    }
}
