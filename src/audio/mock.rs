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
use std::{error::Error, fmt};

use parking_lot::Mutex;
use tracing::info;

use crate::{
    audio::{Output, Playback},
    samples::AudioSample,
};

/// A mock output. Doesn't actually play anything, just remembers what it was asked to play.
pub struct Device {
    name: String,
    played: Mutex<Vec<String>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            played: Mutex::new(Vec::new()),
        }
    }

    /// Names of every sample played so far, oldest first.
    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }
}

impl Output for Device {
    fn play(&self, sample: &AudioSample) -> Result<Playback, Box<dyn Error>> {
        info!(
            device = self.name,
            sample = sample.name(),
            "Playing sample."
        );
        self.played.lock().push(sample.name().to_string());
        Ok(Playback::finished())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
