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
    path::Path,
    process::{Command, Stdio},
};

use tracing::{error, info, warn};

use crate::{config, util};

/// Finds the first `<number> BPM` in the analyzer output.
pub fn parse_bpm(output: &str) -> Option<f64> {
    output
        .match_indices(" BPM")
        .find_map(|(index, _)| {
            let head = &output[..index];
            let start = head
                .char_indices()
                .rev()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
                .map_or(0, |(i, c)| i + c.len_utf8());
            head[start..].parse::<f64>().ok()
        })
        .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
}

/// Runs the external tempo analyzer against a track.
#[derive(Clone)]
pub struct BpmTag {
    command: String,
    args: Vec<String>,
    fallback: f64,
}

impl BpmTag {
    pub fn new(config: &config::Bpm) -> BpmTag {
        BpmTag {
            command: config.command().to_string(),
            args: config.args().to_vec(),
            fallback: config.fallback(),
        }
    }

    /// Returns the tempo of the track. Any failure is logged and yields the fallback tempo.
    pub fn analyze(&self, path: &Path) -> f64 {
        let output = match Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                error!(
                    command = self.command,
                    err = %e,
                    fallback = self.fallback,
                    "Unable to run BPM analyzer."
                );
                return self.fallback;
            }
        };

        if !output.status.success() {
            warn!(command = self.command, status = %output.status, "BPM analyzer failed.");
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        match parse_bpm(&text) {
            Some(bpm) => {
                info!(track = util::filename_display(path), bpm, "Detected tempo.");
                bpm
            }
            None => {
                error!(
                    track = util::filename_display(path),
                    fallback = self.fallback,
                    "No tempo in BPM analyzer output."
                );
                self.fallback
            }
        }
    }
}
