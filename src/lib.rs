// syn.grid -- a beat grid score compiler and additive synthesizer
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

// From scores to timelines
pub mod instrument;
pub mod score;
pub mod timeline;

// From timelines to sound
pub mod oscillator;
pub mod output;
pub mod play;
pub mod wave;
pub mod waveform;

// Utility modules
pub mod ratio;
pub mod util;
