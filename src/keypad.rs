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

//! Keypad decoding and debouncing.
//!
//! The keypad is a matrix whose buttons each pull a distinct combination of four input lines
//! high. Reads are majority-voted over several instantaneous samples to reject line noise, then
//! looked up in a fixed table. Combinations that no button produces decode to no key.

use std::{error::Error, fmt, str::FromStr, sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{
    clock::Clock,
    config,
    gpio::{self, PinVector},
    lights::Lamps,
    playsync::CancelHandle,
    samples::{AssetKey, SampleCache},
};

/// How long to wait between reads while waiting for every key to be released.
const RELEASE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A button on the keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    /// A number button, 0 through 9.
    Digit(u8),
    /// Clears the entry (labelled R).
    Reset,
    /// Confirms the entry (labelled G).
    Confirm,
    Yellow,
    Blue,
    Red,
}

/// Pin vector to key mapping for the wired keypad.
const KEYPAD_LOOKUP: [(PinVector, KeySymbol); 15] = [
    (PinVector::from_bits([0, 1, 0, 1]), KeySymbol::Digit(0)),
    (PinVector::from_bits([1, 0, 1, 1]), KeySymbol::Digit(1)),
    (PinVector::from_bits([1, 0, 0, 1]), KeySymbol::Digit(2)),
    (PinVector::from_bits([1, 0, 1, 0]), KeySymbol::Digit(3)),
    (PinVector::from_bits([0, 0, 1, 1]), KeySymbol::Digit(4)),
    (PinVector::from_bits([0, 0, 0, 1]), KeySymbol::Digit(5)),
    (PinVector::from_bits([0, 0, 1, 0]), KeySymbol::Digit(6)),
    (PinVector::from_bits([1, 1, 1, 1]), KeySymbol::Digit(7)),
    (PinVector::from_bits([1, 1, 0, 1]), KeySymbol::Digit(8)),
    (PinVector::from_bits([1, 1, 1, 0]), KeySymbol::Digit(9)),
    (PinVector::from_bits([0, 1, 1, 1]), KeySymbol::Reset),
    (PinVector::from_bits([0, 1, 1, 0]), KeySymbol::Confirm),
    (PinVector::from_bits([1, 0, 0, 0]), KeySymbol::Yellow),
    (PinVector::from_bits([0, 1, 0, 0]), KeySymbol::Blue),
    (PinVector::from_bits([1, 1, 0, 0]), KeySymbol::Red),
];

impl KeySymbol {
    /// Looks up the key for a pin vector. Vectors no button produces yield None.
    pub fn decode(vector: PinVector) -> Option<KeySymbol> {
        KEYPAD_LOOKUP
            .iter()
            .find(|(candidate, _)| *candidate == vector)
            .map(|(_, key)| *key)
    }

    /// The pin vector this key produces when held.
    pub fn vector(&self) -> PinVector {
        KEYPAD_LOOKUP
            .iter()
            .find(|(_, key)| key == self)
            .map(|(vector, _)| *vector)
            .unwrap_or(PinVector::RELEASED)
    }

    /// Returns the digit character for number keys.
    pub fn digit(&self) -> Option<char> {
        match self {
            KeySymbol::Digit(digit) => char::from_digit(u32::from(*digit), 10),
            _ => None,
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Digit(digit) => write!(f, "{}", digit),
            KeySymbol::Reset => write!(f, "RESET"),
            KeySymbol::Confirm => write!(f, "CONFIRM"),
            KeySymbol::Yellow => write!(f, "YELLOW"),
            KeySymbol::Blue => write!(f, "BLUE"),
            KeySymbol::Red => write!(f, "RED"),
        }
    }
}

/// Parses the key names used in soundboard file names. R and G are accepted as the labels
/// printed on the reset and confirm buttons.
impl FromStr for KeySymbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "R" | "RESET" => Ok(KeySymbol::Reset),
            "G" | "CONFIRM" => Ok(KeySymbol::Confirm),
            "YELLOW" => Ok(KeySymbol::Yellow),
            "BLUE" => Ok(KeySymbol::Blue),
            "RED" => Ok(KeySymbol::Red),
            other => match other.parse::<u8>() {
                Ok(digit) if digit <= 9 && other.len() == 1 => Ok(KeySymbol::Digit(digit)),
                _ => Err(format!("unknown key '{}'", s)),
            },
        }
    }
}

/// Returns the most frequent vector among the samples. Ties go to the vector seen first.
pub fn majority_vote(samples: &[PinVector]) -> Option<PinVector> {
    let mut best: Option<(PinVector, usize)> = None;
    for (i, candidate) in samples.iter().enumerate() {
        // Only count each distinct vector at its first occurrence.
        if samples[..i].contains(candidate) {
            continue;
        }
        let count = samples[i..].iter().filter(|s| *s == candidate).count();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((*candidate, count));
        }
    }
    best.map(|(vector, _)| vector)
}

/// Reads and debounces the keypad.
#[derive(Clone)]
pub struct Keypad {
    device: Arc<dyn gpio::Device>,
    clock: Arc<dyn Clock>,
    samples: usize,
    poll_interval: Duration,
    debounce: Duration,
    timeout: Duration,
    shutdown: CancelHandle,
}

impl Keypad {
    /// Creates a keypad reader. Every wait gives up early once `shutdown` is cancelled.
    pub fn new(
        device: Arc<dyn gpio::Device>,
        clock: Arc<dyn Clock>,
        config: &config::Keypad,
        shutdown: CancelHandle,
    ) -> Result<Keypad, Box<dyn Error>> {
        Ok(Keypad {
            device,
            clock,
            samples: config.samples(),
            poll_interval: config.poll_interval()?,
            debounce: config.debounce()?,
            timeout: config.timeout()?,
            shutdown,
        })
    }

    /// The entry timeout: how long a prompt waits for the next key.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The settle time applied before and after waiting for a release.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// A single instantaneous read of the keypad lines.
    pub fn read_raw(&self) -> PinVector {
        self.device.read_keypad()
    }

    /// Takes the configured number of back-to-back reads and returns the majority vector.
    pub fn read_sampled(&self) -> PinVector {
        if self.samples <= 1 {
            return self.read_raw();
        }

        let samples: Vec<PinVector> = (0..self.samples).map(|_| self.read_raw()).collect();
        majority_vote(&samples).unwrap_or(PinVector::RELEASED)
    }

    /// The key currently held down, if any.
    pub fn read_debounced_symbol(&self) -> Option<KeySymbol> {
        KeySymbol::decode(self.read_sampled())
    }

    /// Polls for a key until one is seen or the timeout elapses. No feedback, no debounce.
    pub fn poll(&self, timeout: Duration) -> Option<KeySymbol> {
        let deadline = self.clock.deadline(timeout);
        loop {
            if self.shutdown.is_cancelled() {
                return None;
            }
            if let Some(key) = self.read_debounced_symbol() {
                return Some(key);
            }
            if self.clock.expired(deadline) {
                return None;
            }
            self.clock.sleep(self.poll_interval);
        }
    }

    /// Spins until every key reads as released.
    pub fn await_release(&self) {
        while !self.read_raw().is_released() {
            if self.shutdown.is_cancelled() {
                return;
            }
            self.clock.sleep(RELEASE_POLL_INTERVAL);
        }
    }

    /// Lights all lamps, settles, waits for every key to be released, settles again and
    /// switches the lamps back off.
    pub fn debounce_and_await_release(&self, lamps: &Lamps) {
        let _lit = lamps.light_all();
        self.clock.sleep(self.debounce);
        self.await_release();
        self.clock.sleep(self.debounce);
    }

    /// Gives feedback for an accepted key: the press chirp plus the lamp debounce sequence.
    pub fn acknowledge(&self, key: KeySymbol, lamps: &Lamps, samples: &SampleCache) {
        info!(key = %key, "Keypad input.");
        samples.play_asset(AssetKey::Press, false);
        self.debounce_and_await_release(lamps);
    }

    /// Waits for a keypress. On a hit, gives feedback and waits for the release before
    /// returning the key. Returns None on timeout.
    pub fn await_keypress_with_feedback(
        &self,
        timeout: Duration,
        lamps: &Lamps,
        samples: &SampleCache,
    ) -> Option<KeySymbol> {
        let key = self.poll(timeout);
        match key {
            Some(key) => self.acknowledge(key, lamps, samples),
            None => debug!(timeout = ?timeout, "No keypad input."),
        }
        key
    }
}

#[cfg(test)]
mod tests;
