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
use serde::Deserialize;

const DEFAULT_COMMAND: &str = "bpm-tag";
const DEFAULT_FALLBACK_BPM: f64 = 120.0;

/// The external tempo analyzer. It is run as `<command> <args...> <track>`.
#[derive(Deserialize, Clone, Default)]
pub struct Bpm {
    command: Option<String>,
    args: Option<Vec<String>>,
    /// Tempo used when the analyzer fails.
    fallback: Option<f64>,
}

impl Bpm {
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_COMMAND)
    }

    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }

    pub fn fallback(&self) -> f64 {
        self.fallback.unwrap_or(DEFAULT_FALLBACK_BPM)
    }
}
