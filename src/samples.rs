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

//! Audio prompts and soundboard samples.
//!
//! Two kinds of sound live in memory for the lifetime of the process:
//! - Assets: fixed prompts (load chirp, track missing, ...) loaded once at startup.
//! - Bank samples: the soundboard samples of the current bank, replaced on every bank switch.
//!
//! Samples are decoded up front so that playing one never touches the disk.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tracing::{debug, error, info, warn};

use crate::{
    audio::{Output, Playback},
    keypad::KeySymbol,
};

mod loader;

pub use loader::{load_sample, scan_bank, SUPPORTED_SAMPLE_RATES};

/// Errors raised while decoding a sample file.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("{path}: unsupported sample rate {rate} Hz")]
    UnsupportedSampleRate { path: PathBuf, rate: u32 },

    #[error("{path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// The fixed prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKey {
    TrackNotFound,
    Load,
    Missing,
    BankOutOfRange,
    Press,
}

impl AssetKey {
    pub const ALL: [AssetKey; 5] = [
        AssetKey::TrackNotFound,
        AssetKey::Load,
        AssetKey::Missing,
        AssetKey::BankOutOfRange,
        AssetKey::Press,
    ];

    /// The file name the asset is loaded from.
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKey::TrackNotFound => "TrackMissing.wav",
            AssetKey::Load => "Load.wav",
            AssetKey::Missing => "SampleMissing.wav",
            AssetKey::BankOutOfRange => "BankOutOfRange.wav",
            AssetKey::Press => "Press.wav",
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// A decoded sample, held in memory as interleaved f32 frames at its native rate.
#[derive(Clone)]
pub struct AudioSample {
    name: String,
    data: Arc<Vec<f32>>,
    channel_count: u16,
    sample_rate: u32,
}

impl AudioSample {
    pub fn new(name: String, data: Vec<f32>, channel_count: u16, sample_rate: u32) -> AudioSample {
        AudioSample {
            name,
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Arc<Vec<f32>> {
        self.data.clone()
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The play time of the sample.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.data.len() / usize::from(self.channel_count);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

/// Holds the decoded assets and the current soundboard bank.
pub struct SampleCache {
    output: Arc<dyn Output>,
    assets: HashMap<AssetKey, AudioSample>,
    bank: HashMap<KeySymbol, AudioSample>,
    current_bank: Option<u32>,
}

impl SampleCache {
    pub fn new(output: Arc<dyn Output>) -> SampleCache {
        SampleCache {
            output,
            assets: HashMap::new(),
            bank: HashMap::new(),
            current_bank: None,
        }
    }

    /// Loads every asset found in the directory. Missing or undecodable assets are logged
    /// and left unset. Returns the number of assets loaded.
    pub fn load_assets(&mut self, asset_dir: &Path) -> usize {
        for key in AssetKey::ALL {
            let path = asset_dir.join(key.file_name());
            if !path.is_file() {
                warn!(asset = %key, path = ?path, "Asset file not found.");
                continue;
            }
            match load_sample(&path) {
                Ok(sample) => {
                    debug!(asset = %key, duration = ?sample.duration(), "Asset loaded.");
                    self.assets.insert(key, sample);
                }
                Err(e) => error!(asset = %key, err = %e, "Unable to load asset."),
            }
        }

        info!(
            dir = ?asset_dir,
            loaded = self.assets.len(),
            expected = AssetKey::ALL.len(),
            "Assets loaded."
        );
        self.assets.len()
    }

    /// Replaces the soundboard bank with the samples in `<soundboard_dir>/<bank>`. Assets are
    /// left alone. A missing bank directory yields an empty bank. Returns the number of
    /// samples loaded.
    pub fn load_bank(&mut self, soundboard_dir: &Path, bank: u32) -> usize {
        self.bank.clear();
        self.current_bank = Some(bank);

        let bank_dir = soundboard_dir.join(bank.to_string());
        for (key, path) in scan_bank(&bank_dir) {
            match load_sample(&path) {
                Ok(sample) => {
                    if self.bank.insert(key, sample).is_some() {
                        warn!(
                            key = %key,
                            path = ?path,
                            "Duplicate sample for key, keeping the last."
                        );
                    }
                }
                Err(e) => error!(key = %key, err = %e, "Unable to load sample."),
            }
        }

        info!(bank, dir = ?bank_dir, samples = self.bank.len(), "Bank loaded.");
        self.bank.len()
    }

    /// The bank loaded last, if any.
    pub fn current_bank(&self) -> Option<u32> {
        self.current_bank
    }

    pub fn has_asset(&self, key: AssetKey) -> bool {
        self.assets.contains_key(&key)
    }

    pub fn has_sample(&self, key: KeySymbol) -> bool {
        self.bank.contains_key(&key)
    }

    /// The number of samples in the current bank.
    pub fn bank_len(&self) -> usize {
        self.bank.len()
    }

    /// Plays an asset, blocking until it finishes if `wait` is set. An asset that failed to
    /// load falls back to the missing-sample prompt.
    pub fn play_asset(&self, key: AssetKey, wait: bool) -> Playback {
        match self.assets.get(&key) {
            Some(sample) => self.render(sample, wait),
            None => self.play_missing(&key.to_string(), wait),
        }
    }

    /// Plays the current bank's sample for the key, falling back to the missing-sample
    /// prompt.
    pub fn play_sample(&self, key: KeySymbol, wait: bool) -> Playback {
        match self.bank.get(&key) {
            Some(sample) => self.render(sample, wait),
            None => self.play_missing(&key.to_string(), wait),
        }
    }

    fn play_missing(&self, wanted: &str, wait: bool) -> Playback {
        match self.assets.get(&AssetKey::Missing) {
            Some(sample) => {
                debug!(wanted, "No sample loaded, playing the missing prompt.");
                self.render(sample, wait)
            }
            None => {
                warn!(wanted, "No sample loaded and no missing prompt to play.");
                Playback::finished()
            }
        }
    }

    fn render(&self, sample: &AudioSample, wait: bool) -> Playback {
        match self.output.play(sample) {
            Ok(playback) => {
                if wait {
                    playback.wait();
                }
                playback
            }
            Err(e) => {
                error!(
                    sample = sample.name(),
                    output = %self.output,
                    err = %e,
                    "Unable to play sample."
                );
                Playback::finished()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{fs, sync::Arc};

    use super::{AssetKey, SampleCache};
    use crate::{audio, keypad::KeySymbol, test::write_wav};

    fn cache() -> (Arc<audio::mock::Device>, SampleCache) {
        let output = Arc::new(audio::mock::Device::get("mock-audio"));
        (output.clone(), SampleCache::new(output))
    }

    #[test]
    fn test_load_assets_skips_missing_and_unsupported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write_wav(&dir.path().join("Load.wav"), 44100, 441)?;
        write_wav(&dir.path().join("Press.wav"), 48000, 480)?;
        write_wav(&dir.path().join("SampleMissing.wav"), 22050, 220)?;

        let (_, mut cache) = cache();
        assert_eq!(2, cache.load_assets(dir.path()));
        assert!(cache.has_asset(AssetKey::Load));
        assert!(cache.has_asset(AssetKey::Press));
        assert!(!cache.has_asset(AssetKey::Missing));
        assert!(!cache.has_asset(AssetKey::TrackNotFound));
        Ok(())
    }

    #[test]
    fn test_load_bank_keeps_assets() -> Result<(), Box<dyn std::error::Error>> {
        let assets = tempfile::tempdir()?;
        write_wav(&assets.path().join("SampleMissing.wav"), 44100, 441)?;
        let soundboard = tempfile::tempdir()?;
        fs::create_dir(soundboard.path().join("0"))?;
        fs::create_dir(soundboard.path().join("1"))?;
        write_wav(&soundboard.path().join("0").join("1_Horn.wav"), 44100, 441)?;
        write_wav(
            &soundboard.path().join("0").join("RED_Crash.wav"),
            44100,
            441,
        )?;
        write_wav(&soundboard.path().join("1").join("G_Bell.wav"), 48000, 480)?;

        let (_, mut cache) = cache();
        cache.load_assets(assets.path());
        assert_eq!(2, cache.load_bank(soundboard.path(), 0));
        assert!(cache.has_sample(KeySymbol::Digit(1)));
        assert!(cache.has_sample(KeySymbol::Red));

        assert_eq!(1, cache.load_bank(soundboard.path(), 1));
        assert!(!cache.has_sample(KeySymbol::Digit(1)));
        assert!(cache.has_sample(KeySymbol::Confirm));
        assert!(cache.has_asset(AssetKey::Missing));
        assert_eq!(Some(1), cache.current_bank());

        // A bank that doesn't exist empties the bank.
        assert_eq!(0, cache.load_bank(soundboard.path(), 5));
        assert_eq!(0, cache.bank_len());
        assert!(cache.has_asset(AssetKey::Missing));
        Ok(())
    }

    #[test]
    fn test_play_falls_back_to_missing() -> Result<(), Box<dyn std::error::Error>> {
        let assets = tempfile::tempdir()?;
        let soundboard = tempfile::tempdir()?;
        fs::create_dir(soundboard.path().join("0"))?;
        write_wav(&soundboard.path().join("0").join("3_Cheer.wav"), 44100, 441)?;

        let (output, mut cache) = cache();
        cache.load_bank(soundboard.path(), 0);

        // Nothing to fall back to yet.
        assert!(cache.play_sample(KeySymbol::Digit(4), false).is_finished());
        assert!(output.played().is_empty());

        write_wav(&assets.path().join("SampleMissing.wav"), 44100, 441)?;
        cache.load_assets(assets.path());
        cache.play_sample(KeySymbol::Digit(3), true);
        cache.play_sample(KeySymbol::Digit(4), true);
        cache.play_asset(AssetKey::Press, false);
        assert_eq!(
            vec!["3_Cheer.wav", "SampleMissing.wav", "SampleMissing.wav"],
            output.played()
        );
        Ok(())
    }
}
