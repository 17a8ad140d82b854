// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use hound::{SampleFormat, WavReader};
use tracing::{debug, warn};

use super::{AudioSample, SampleError};
use crate::{keypad::KeySymbol, util};

/// Rates the output is known to play without resampling.
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [44100, 48000];

/// Decodes a WAV file into memory. Integer formats are scaled into [-1.0, 1.0).
pub fn load_sample(path: &Path) -> Result<AudioSample, SampleError> {
    let wav_error = |source| SampleError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    if !SUPPORTED_SAMPLE_RATES.contains(&spec.sample_rate) {
        return Err(SampleError::UnsupportedSampleRate {
            path: path.to_path_buf(),
            rate: spec.sample_rate,
        });
    }

    let data = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, hound::Error>>()
            .map_err(wav_error)?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|sample| sample as f32 / scale))
                .collect::<Result<Vec<f32>, hound::Error>>()
                .map_err(wav_error)?
        }
    };

    debug!(
        path = ?path,
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "Decoded sample."
    );
    Ok(AudioSample::new(
        util::filename_display(path).to_string(),
        data,
        spec.channels,
        spec.sample_rate,
    ))
}

/// Lists the `<KEY>_*.wav` files in a bank directory in file name order. Files whose prefix
/// names no playable key are skipped with a warning.
pub fn scan_bank(bank_dir: &Path) -> Vec<(KeySymbol, PathBuf)> {
    let entries = match fs::read_dir(bank_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = ?bank_dir, err = %e, "Unable to read bank directory.");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && util::has_extension(path, &["wav"]))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            // YELLOW closes the soundboard, so it can't carry a sample.
            let key = util::underscore_prefix(&path)
                .and_then(|prefix| KeySymbol::from_str(prefix).ok())
                .filter(|key| *key != KeySymbol::Yellow);
            match key {
                Some(key) => Some((key, path)),
                None => {
                    warn!(path = ?path, "Sample name doesn't start with a known key, skipping.");
                    None
                }
            }
        })
        .collect()
}
