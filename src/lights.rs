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
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use rand::Rng;
use tracing::{debug, info, span, Level};

use crate::{
    clock::Clock,
    gpio::{self, Lamp},
    playsync::CancelHandle,
};

pub mod patterns;

pub use patterns::{LightFrame, LightPattern};

/// Tempo used when the analyzer hands us something unusable.
const FALLBACK_BPM: f64 = 120.0;

/// Returns the delay between frames for the given tempo: one beat divided by the multiplier,
/// never shorter than `floor`.
pub fn frame_delay(bpm: f64, multiplier: u32, floor: Duration) -> Duration {
    let bpm = if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        FALLBACK_BPM
    };
    let multiplier = f64::from(multiplier.max(1));
    Duration::from_secs_f64(60.0 / (bpm * multiplier)).max(floor)
}

/// Drives the three lamp banks.
pub struct Lamps {
    device: Arc<dyn gpio::Device>,
    clock: Arc<dyn Clock>,
    min_frame_delay: Duration,
}

impl Lamps {
    pub fn new(
        device: Arc<dyn gpio::Device>,
        clock: Arc<dyn Clock>,
        min_frame_delay: Duration,
    ) -> Lamps {
        Lamps {
            device,
            clock,
            min_frame_delay,
        }
    }

    pub fn set_all(&self, on: bool) {
        self.show_frame(if on {
            LightFrame::ALL_ON
        } else {
            LightFrame::ALL_OFF
        });
    }

    pub fn show_frame(&self, frame: LightFrame) {
        for lamp in Lamp::ALL {
            self.device.set_lamp(lamp, frame.get(lamp));
        }
    }

    /// The frame delay for a tempo, clamped to the configured minimum.
    pub fn frame_delay(&self, bpm: f64, multiplier: u32) -> Duration {
        frame_delay(bpm, multiplier, self.min_frame_delay)
    }

    /// Plays every frame of the pattern once at one frame per beat. Blocks until done.
    pub fn show_pattern(&self, pattern: &LightPattern, bpm: f64) {
        self.show_frames(pattern, self.frame_delay(bpm, 1), None);
    }

    /// Plays the frames of a pattern, stopping early if the cancel handle fires. Returns
    /// false if the pattern was cut short.
    fn show_frames(
        &self,
        pattern: &LightPattern,
        delay: Duration,
        cancel: Option<&CancelHandle>,
    ) -> bool {
        for frame in pattern.frames() {
            if cancel.is_some_and(|cancel| cancel.is_cancelled()) {
                return false;
            }
            self.show_frame(*frame);
            self.clock.sleep(delay);
        }
        true
    }

    /// Flashes all lamps on and off. Lamps end off.
    pub fn blink(&self, times: usize, interval: Duration) {
        for _ in 0..times {
            self.set_all(true);
            self.clock.sleep(interval);
            self.set_all(false);
            self.clock.sleep(interval);
        }
    }

    /// Switches every lamp on. They go back off when the returned guard is dropped, no matter
    /// how the holder exits.
    pub fn light_all(&self) -> LitGuard<'_> {
        self.set_all(true);
        LitGuard { lamps: self }
    }

    /// Starts the tempo-synced light show on its own thread. Each round picks a random
    /// pattern and plays it once or twice at one or two frames per beat.
    pub fn spawn_bpm_lights(self: &Arc<Self>, bpm: f64) -> LightsHandle {
        let cancel = CancelHandle::new();
        let join = {
            let lamps = self.clone();
            let cancel = cancel.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "bpm lights");
                let _enter = span.enter();

                info!(bpm, "Starting light show.");
                let mut rng = rand::thread_rng();
                while !cancel.is_cancelled() {
                    let pattern =
                        patterns::ALL_PATTERNS[rng.gen_range(0..patterns::ALL_PATTERNS.len())];
                    let multiplier: u32 = rng.gen_range(1..=2);
                    let delay = lamps.frame_delay(bpm, multiplier);
                    debug!(pattern = pattern.name(), multiplier, delay = ?delay, "Next pattern.");

                    for _ in 0..multiplier {
                        if !lamps.show_frames(pattern, delay, Some(&cancel)) {
                            break;
                        }
                    }
                }
                info!("Light show stopped.");
            })
        };

        LightsHandle {
            cancel,
            join: Some(join),
        }
    }
}

/// Keeps every lamp lit while held.
#[must_use = "the lamps switch off as soon as the guard is dropped"]
pub struct LitGuard<'a> {
    lamps: &'a Lamps,
}

impl LitGuard<'_> {
    /// Lets go of the lamps without switching them off, for whoever drives them next.
    pub fn hand_over(self) {
        std::mem::forget(self);
    }
}

impl Drop for LitGuard<'_> {
    fn drop(&mut self) {
        self.lamps.set_all(false);
    }
}

/// A running light show. Stops the show when dropped.
pub struct LightsHandle {
    cancel: CancelHandle,
    join: Option<JoinHandle<()>>,
}

impl LightsHandle {
    /// Stops the show and waits for the animation thread to let go of the lamps.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!("Light show thread panicked.");
            }
        }
    }
}

impl Drop for LightsHandle {
    fn drop(&mut self) {
        self.halt();
    }
}
