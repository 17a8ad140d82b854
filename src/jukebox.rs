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

//! The jukebox run loop.
//!
//! The jukebox is always in exactly one mode:
//! - Boot: a one-off lamp animation.
//! - Idle: the idle animation replays until a key is pressed.
//! - Entry: digits are collected into a track number.
//! - Playback: a track (or a shuffle of tracks) plays.
//! - Soundboard: keys trigger the samples of the selected bank.
//!
//! Every mode runs on the calling thread. The only other threads are the light show during
//! playback and whatever the audio output spawns to render a sample.

use std::{error::Error, fmt, path::PathBuf, sync::Arc, time::Duration};

use rand::seq::SliceRandom;
use tracing::{debug, info, span, warn, Level};

use crate::{
    audio,
    clock::Clock,
    config, gpio,
    keypad::{KeySymbol, Keypad},
    lights::{patterns, Lamps},
    player::{bpm::BpmTag, PlayResult, Player},
    playsync::CancelHandle,
    samples::SampleCache,
    tracks::Tracks,
};

mod entry;
mod soundboard;

use self::entry::{EntryAction, EntryBuffer};
pub use self::soundboard::{BankCursor, SoundboardExit};

/// The number of blinks that acknowledge a cleared entry.
const CLEAR_BLINKS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Boot,
    Idle,
    Entry,
    Playback,
    Soundboard,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Boot => write!(f, "boot"),
            Mode::Idle => write!(f, "idle"),
            Mode::Entry => write!(f, "entry"),
            Mode::Playback => write!(f, "playback"),
            Mode::Soundboard => write!(f, "soundboard"),
        }
    }
}

/// How an entry ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryExit {
    Played { number: u32, result: PlayResult },
    /// Shuffle ran. Carries the number of tracks that played to the end.
    Shuffled { finished: usize },
    Soundboard(SoundboardExit),
    TimedOut,
    Shutdown,
}

/// Resolved mode settings.
struct Settings {
    assets_path: PathBuf,
    soundboard_path: PathBuf,
    idle_frame: Duration,
    idle_interval: Duration,
    blink: Duration,
    boot_bpm: f64,
    max_bank: u32,
    soundboard_timeout: Duration,
    soundboard_poll_interval: Duration,
}

impl Settings {
    fn new(config: &config::Jukebox) -> Result<Settings, Box<dyn Error>> {
        let lights = config.lights();
        let soundboard = config.soundboard();
        Ok(Settings {
            assets_path: config.assets_path()?,
            soundboard_path: config.soundboard_path()?,
            idle_frame: lights.idle_frame()?,
            idle_interval: lights.idle_interval()?,
            blink: lights.blink()?,
            boot_bpm: lights.boot_bpm(),
            max_bank: soundboard.max_bank(),
            soundboard_timeout: soundboard.timeout()?,
            soundboard_poll_interval: soundboard.poll_interval()?,
        })
    }
}

/// The jukebox: keypad in, lamps and sound out.
pub struct Jukebox {
    keypad: Keypad,
    lamps: Arc<Lamps>,
    samples: SampleCache,
    player: Player,
    clock: Arc<dyn Clock>,
    shutdown: CancelHandle,
    settings: Settings,
    mode: Mode,
}

impl Jukebox {
    /// Wires the jukebox up. Fails if the songs directory is missing or a setting doesn't
    /// parse. Once `shutdown` is cancelled every mode winds down and `run` returns.
    pub fn new(
        config: &config::Jukebox,
        gpio: Arc<dyn gpio::Device>,
        output: Arc<dyn audio::Output>,
        clock: Arc<dyn Clock>,
        shutdown: CancelHandle,
    ) -> Result<Jukebox, Box<dyn Error>> {
        let tracks = Tracks::new(config.songs_path()?);
        let settings = Settings::new(config)?;
        let lamps = Arc::new(Lamps::new(
            gpio.clone(),
            clock.clone(),
            config.lights().min_frame_delay()?,
        ));
        let keypad = Keypad::new(gpio, clock.clone(), config.keypad(), shutdown.clone())?;
        let player = Player::new(
            lamps.clone(),
            keypad.clone(),
            tracks,
            BpmTag::new(config.bpm()),
            config.player(),
            clock.clone(),
            shutdown.clone(),
        )?;

        Ok(Jukebox {
            keypad,
            lamps,
            samples: SampleCache::new(output),
            player,
            clock,
            shutdown,
            settings,
            mode: Mode::Boot,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(from = %self.mode, to = %mode, "Mode change.");
            self.mode = mode;
        }
    }

    /// Loads the assets, boots and then cycles between idle and entry until shutdown.
    pub fn run(&mut self) {
        let span = span!(Level::INFO, "jukebox");
        let _enter = span.enter();

        info!("Starting jukebox.");
        self.samples.load_assets(&self.settings.assets_path);
        self.boot();

        let mut animate = true;
        while !self.shutdown.is_cancelled() {
            let key = match self.idle(animate) {
                Some(key) => key,
                None => break,
            };
            animate = false;

            let exit = self.entry(key);
            info!(exit = ?exit, "Back to idle.");
            if exit == EntryExit::Shutdown {
                break;
            }
        }

        self.lamps.set_all(false);
        info!("Jukebox stopped.");
    }

    /// Plays a single track outside the run loop.
    pub fn play_once(&mut self, number: u32) -> PlayResult {
        self.samples.load_assets(&self.settings.assets_path);
        self.play(number)
    }

    fn boot(&mut self) {
        self.set_mode(Mode::Boot);
        self.lamps.show_pattern(&patterns::BLINK_ALL, self.settings.boot_bpm);
        self.lamps.set_all(false);
    }

    /// Replays the idle animation until a key is pressed, returning the acknowledged key.
    /// The first animation is skipped unless `animate` is set. Returns None on shutdown.
    fn idle(&mut self, animate: bool) -> Option<KeySymbol> {
        let span = span!(Level::INFO, "idle");
        let _enter = span.enter();
        self.set_mode(Mode::Idle);
        info!("Idle.");

        let mut skip = !animate;
        loop {
            if !skip {
                for frame in patterns::TETRIS.frames() {
                    self.lamps.show_frame(*frame);
                    if let Some(key) = self.wait_for_key(self.settings.idle_frame) {
                        return Some(key);
                    }
                    if self.shutdown.is_cancelled() {
                        return None;
                    }
                }
                self.lamps.set_all(false);
            }
            skip = false;

            if let Some(key) = self.wait_for_key(self.settings.idle_interval) {
                return Some(key);
            }
            if self.shutdown.is_cancelled() {
                return None;
            }
        }
    }

    /// Polls for a key for up to `duration`, acknowledging it if one comes.
    fn wait_for_key(&self, duration: Duration) -> Option<KeySymbol> {
        let key = self.keypad.poll(duration)?;
        self.keypad.acknowledge(key, &self.lamps, &self.samples);
        Some(key)
    }

    /// Collects a track number, starting with the key that woke the jukebox up.
    fn entry(&mut self, first_key: KeySymbol) -> EntryExit {
        let span = span!(Level::INFO, "entry");
        let _enter = span.enter();
        self.set_mode(Mode::Entry);

        let mut buffer = EntryBuffer::new();
        let mut key = Some(first_key);
        loop {
            let pressed = match key {
                Some(pressed) => pressed,
                None => {
                    if self.shutdown.is_cancelled() {
                        return EntryExit::Shutdown;
                    }
                    info!(input = buffer.as_str(), "No input, leaving entry.");
                    if !buffer.is_empty() {
                        self.clear_animation();
                    }
                    return EntryExit::TimedOut;
                }
            };

            match buffer.apply(pressed) {
                EntryAction::Appended => info!(input = buffer.as_str(), "Input."),
                EntryAction::Cleared(cleared) => {
                    info!(cleared, "Input cleared.");
                    self.clear_animation();
                }
                EntryAction::Play(number) => {
                    info!(number, "Input confirmed.");
                    let result = self.play(number);
                    return EntryExit::Played { number, result };
                }
                EntryAction::Shuffle => {
                    let finished = self.shuffle();
                    return EntryExit::Shuffled { finished };
                }
                EntryAction::Soundboard => {
                    return match self.soundboard() {
                        SoundboardExit::Shutdown => EntryExit::Shutdown,
                        exit => EntryExit::Soundboard(exit),
                    };
                }
                EntryAction::Ignored => debug!(key = %pressed, "Key ignored."),
            }

            key = self.keypad.await_keypress_with_feedback(
                self.keypad.timeout(),
                &self.lamps,
                &self.samples,
            );
        }
    }

    fn clear_animation(&self) {
        self.lamps.blink(CLEAR_BLINKS, self.settings.blink);
    }

    fn play(&mut self, number: u32) -> PlayResult {
        self.set_mode(Mode::Playback);
        let result = self.player.play(number, &self.samples);
        info!(number, result = %result, "Playback over.");
        result
    }

    /// Plays random tracks for as long as each one plays to the end. Returns how many did.
    fn shuffle(&mut self) -> usize {
        let span = span!(Level::INFO, "shuffle");
        let _enter = span.enter();
        info!("Shuffle.");

        let mut rng = rand::thread_rng();
        let mut finished = 0;
        while !self.shutdown.is_cancelled() {
            let numbers = self.player.tracks().numbers();
            let number = match numbers.choose(&mut rng) {
                Some(number) => *number,
                None => {
                    warn!(dir = ?self.player.tracks().dir(), "No tracks to shuffle.");
                    break;
                }
            };

            match self.play(number) {
                PlayResult::Finished => finished += 1,
                result => {
                    info!(result = %result, finished, "Shuffle stopped.");
                    break;
                }
            }
        }
        finished
    }
}

#[cfg(test)]
mod tests;
