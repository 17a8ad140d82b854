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

const DEFAULT_COMMAND: &str = "ffplay";
const DEFAULT_ARGS: [&str; 4] = ["-nodisp", "-autoexit", "-loglevel", "quiet"];
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The external track player. It is run as `<command> <args...> <track>` and must exit on
/// its own once the track ends.
#[derive(Deserialize, Clone, Default)]
pub struct Player {
    command: Option<String>,
    args: Option<Vec<String>>,
    /// How often the running player is checked for exit and the cancel key.
    poll_interval: Option<String>,
}

impl Player {
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_COMMAND)
    }

    pub fn args(&self) -> Vec<String> {
        match &self.args {
            Some(args) => args.clone(),
            None => DEFAULT_ARGS.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn poll_interval(&self) -> Result<Duration, Box<dyn Error>> {
        duration_or(&self.poll_interval, DEFAULT_POLL_INTERVAL)
    }
}
