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
use std::{error::Error, fmt, sync::Arc, time::Duration};

use tracing::{error, info, span, warn, Level};

use crate::{
    clock::Clock,
    config,
    keypad::{KeySymbol, Keypad},
    lights::Lamps,
    playsync::CancelHandle,
    samples::{AssetKey, SampleCache},
    tracks::Tracks,
    util,
};

pub mod bpm;
pub mod process;

use self::{
    bpm::BpmTag,
    process::{PlayerProcess, ProcessState},
};

/// How a call to `play` ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayResult {
    /// No file for the track number.
    NotFound,
    /// Stopped by the cancel key or by shutdown.
    Aborted,
    /// The player ran to the end.
    Finished,
    /// The player couldn't be started.
    Failed,
}

impl fmt::Display for PlayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayResult::NotFound => write!(f, "not found"),
            PlayResult::Aborted => write!(f, "aborted"),
            PlayResult::Finished => write!(f, "finished"),
            PlayResult::Failed => write!(f, "failed"),
        }
    }
}

/// Plays tracks through the external player with the tempo-synced light show running.
pub struct Player {
    lamps: Arc<Lamps>,
    keypad: Keypad,
    tracks: Tracks,
    bpm: BpmTag,
    command: String,
    args: Vec<String>,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
    shutdown: CancelHandle,
}

impl Player {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lamps: Arc<Lamps>,
        keypad: Keypad,
        tracks: Tracks,
        bpm: BpmTag,
        config: &config::Player,
        clock: Arc<dyn Clock>,
        shutdown: CancelHandle,
    ) -> Result<Player, Box<dyn Error>> {
        Ok(Player {
            lamps,
            keypad,
            tracks,
            bpm,
            command: config.command().to_string(),
            args: config.args(),
            poll_interval: config.poll_interval()?,
            clock,
            shutdown,
        })
    }

    pub fn tracks(&self) -> &Tracks {
        &self.tracks
    }

    /// Plays the track with the given number and blocks until it ends or is cancelled.
    /// The lamps are off when this returns.
    pub fn play(&self, number: u32, samples: &SampleCache) -> PlayResult {
        let span = span!(Level::INFO, "play", number);
        let _enter = span.enter();

        let path = match self.tracks.resolve(number) {
            Some(path) => path,
            None => {
                warn!(number, "Track not found.");
                let _lit = self.lamps.light_all();
                samples.play_asset(AssetKey::TrackNotFound, true);
                return PlayResult::NotFound;
            }
        };
        let track = util::filename_display(&path);

        let lit = self.lamps.light_all();
        let load = samples.play_asset(AssetKey::Load, false);
        let bpm = self.bpm.analyze(&path);
        // The chirp must be over before the track starts.
        load.wait();

        if self.shutdown.is_cancelled() {
            info!(track, "Shutting down, not starting player.");
            return PlayResult::Aborted;
        }

        let mut process = match PlayerProcess::spawn(&self.command, &self.args, &path) {
            Ok(process) => process,
            Err(e) => {
                error!(command = self.command, track, err = %e, "Unable to start player.");
                return PlayResult::Failed;
            }
        };
        info!(track, bpm, "Playing track.");

        let lights = self.lamps.spawn_bpm_lights(bpm);
        lit.hand_over();
        let mut cancelled_by_key = false;
        while process.poll() == ProcessState::Running {
            if self.shutdown.is_cancelled() {
                info!(track, "Shutting down, stopping player.");
                process.kill();
                break;
            }
            if self.keypad.read_debounced_symbol() == Some(KeySymbol::Red) {
                info!(track, "Cancel pressed, stopping player.");
                process.kill();
                cancelled_by_key = true;
                break;
            }
            self.clock.sleep(self.poll_interval);
        }
        lights.stop();
        self.lamps.set_all(false);

        match process.state() {
            ProcessState::Killed => {
                if cancelled_by_key {
                    self.settle_after_cancel();
                }
                PlayResult::Aborted
            }
            ProcessState::Exited(code) => {
                if code != Some(0) {
                    warn!(track, code, "Player exited with an error.");
                }
                info!(track, "Track finished.");
                PlayResult::Finished
            }
            // The loop only ends once the process has stopped running.
            ProcessState::Running => PlayResult::Aborted,
        }
    }

    /// Keeps the cancel press from being read again as a fresh key by the caller.
    fn settle_after_cancel(&self) {
        if self.keypad.read_debounced_symbol() == Some(KeySymbol::Red) {
            self.keypad.debounce_and_await_release(&self.lamps);
        } else {
            self.clock.sleep(self.keypad.debounce());
        }
    }
}
