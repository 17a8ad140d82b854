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

const DEFAULT_MAX_BANK: u32 = 9;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Soundboard mode settings.
#[derive(Deserialize, Clone, Default)]
pub struct Soundboard {
    /// The highest bank number. Banks run from 0 to this.
    max_bank: Option<u32>,
    /// Soundboard mode exits after this long without a key.
    timeout: Option<String>,
    poll_interval: Option<String>,
}

impl Soundboard {
    pub fn max_bank(&self) -> u32 {
        self.max_bank.unwrap_or(DEFAULT_MAX_BANK)
    }

    pub fn timeout(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.timeout, DEFAULT_TIMEOUT)
    }

    pub fn poll_interval(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.poll_interval, DEFAULT_POLL_INTERVAL)
    }
}
