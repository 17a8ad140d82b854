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
use std::{error::Error, time::Duration};

use serde::Deserialize;

use super::duration_or;

const DEFAULT_MIN_FRAME_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_IDLE_FRAME: Duration = Duration::from_millis(250);
const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_BLINK: Duration = Duration::from_millis(150);
const DEFAULT_BOOT_BPM: f64 = 240.0;

/// Lamp animation timing.
#[derive(Deserialize, Clone, Default)]
pub struct Lights {
    /// Frames are never shorter than this, however fast the track.
    min_frame_delay: Option<String>,
    /// Length of one frame of the idle animation.
    idle_frame: Option<String>,
    /// How often the idle animation replays.
    idle_interval: Option<String>,
    /// On and off time of a blink.
    blink: Option<String>,
    /// Tempo of the boot animation.
    boot_bpm: Option<f64>,
}

impl Lights {
    pub fn min_frame_delay(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.min_frame_delay, DEFAULT_MIN_FRAME_DELAY)
    }

    pub fn idle_frame(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.idle_frame, DEFAULT_IDLE_FRAME)
    }

    pub fn idle_interval(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.idle_interval, DEFAULT_IDLE_INTERVAL)
    }

    pub fn blink(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.blink, DEFAULT_BLINK)
    }

    pub fn boot_bpm(&self) -> f64 {
        self.boot_bpm.unwrap_or(DEFAULT_BOOT_BPM)
    }
}
