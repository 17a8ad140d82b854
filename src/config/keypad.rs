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

const DEFAULT_SAMPLES: usize = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Keypad sampling and debounce timing.
#[derive(Deserialize, Clone, Default)]
pub struct Keypad {
    /// Number of back-to-back reads majority-voted into one.
    samples: Option<usize>,
    poll_interval: Option<String>,
    debounce: Option<String>,
    /// How long entry waits for the next key.
    timeout: Option<String>,
}

impl Keypad {
    pub fn samples(&self) -> usize {
        self.samples.unwrap_or(DEFAULT_SAMPLES).max(1)
    }

    pub fn poll_interval(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.poll_interval, DEFAULT_POLL_INTERVAL)
    }

    pub fn debounce(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.debounce, DEFAULT_DEBOUNCE)
    }

    pub fn timeout(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.timeout, DEFAULT_TIMEOUT)
    }
}
