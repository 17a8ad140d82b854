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
    error::Error,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;

mod audio;
mod bpm;
mod error;
mod gpio;
mod keypad;
mod lights;
mod player;
mod soundboard;

pub use self::audio::Audio;
pub use self::bpm::Bpm;
pub use self::error::ConfigError;
pub use self::gpio::{Gpio, Lamps};
pub use self::keypad::Keypad;
pub use self::lights::Lights;
pub use self::player::Player;
pub use self::soundboard::Soundboard;

/// Prefix of the environment variables that override the configuration file.
const ENV_PREFIX: &str = "JUKEBOX";

/// Soundboard banks live here under the songs directory unless configured otherwise.
const DEFAULT_SOUNDBOARD_DIR: &str = "soundboard";

/// The jukebox configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Jukebox {
    /// The directory holding the numbered tracks.
    songs_path: Option<PathBuf>,

    /// The directory holding one sub-directory per soundboard bank.
    soundboard_path: Option<PathBuf>,

    /// The directory holding the audio prompts.
    assets_path: Option<PathBuf>,

    #[serde(default)]
    gpio: Gpio,

    #[serde(default)]
    keypad: Keypad,

    #[serde(default)]
    lights: Lights,

    #[serde(default)]
    soundboard: Soundboard,

    #[serde(default)]
    bpm: Bpm,

    #[serde(default)]
    player: Player,

    #[serde(default)]
    audio: Audio,
}

impl Jukebox {
    /// Loads the configuration from the optional YAML file, overridden by `JUKEBOX_`
    /// environment variables. Nested keys are separated by `__` in variable names, so
    /// `JUKEBOX_KEYPAD__SAMPLES` sets `keypad.samples`.
    pub fn load(path: Option<&Path>) -> Result<Jukebox, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        Ok(builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Jukebox>()?)
    }

    /// Returns the songs directory, which must exist.
    pub fn songs_path(&self) -> Result<&Path, ConfigError> {
        let path = self
            .songs_path
            .as_deref()
            .ok_or(ConfigError::MissingSongsPath)?;
        if !path.is_dir() {
            return Err(ConfigError::InvalidSongsPath(path.to_path_buf()));
        }
        Ok(path)
    }

    /// Returns the soundboard directory (default: `soundboard` under the songs directory).
    pub fn soundboard_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.soundboard_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.songs_path()?.join(DEFAULT_SOUNDBOARD_DIR)),
        }
    }

    /// Returns the assets directory (default: the songs directory).
    pub fn assets_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.assets_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.songs_path()?.to_path_buf()),
        }
    }

    pub fn gpio(&self) -> &Gpio {
        &self.gpio
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn soundboard(&self) -> &Soundboard {
        &self.soundboard
    }

    pub fn bpm(&self) -> &Bpm {
        &self.bpm
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }
}

/// Parses an optional human duration such as "150ms", falling back to the default.
fn duration_or(value: &Option<String>, default: Duration) -> Result<Duration, Box<dyn Error>> {
    match value {
        Some(value) => Ok(DurationString::from_string(value.clone())?.into()),
        None => Ok(default),
    }
}
