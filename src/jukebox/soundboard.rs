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
use tracing::{info, span, Level};

use super::{Jukebox, Mode};
use crate::{keypad::KeySymbol, samples::AssetKey};

/// The number of times the lamps blink when the soundboard closes.
const CLOSE_BLINKS: u32 = 3;

/// The selected soundboard bank. Banks run from 0 to the maximum and never wrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BankCursor {
    current: u32,
    max: u32,
}

impl BankCursor {
    pub fn new(max: u32) -> BankCursor {
        BankCursor { current: 0, max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Moves to the next bank. Returns false, staying put, at the last bank.
    pub fn next(&mut self) -> bool {
        if self.current >= self.max {
            return false;
        }
        self.current += 1;
        true
    }

    /// Moves to the previous bank. Returns false, staying put, at bank 0.
    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }
}

/// Why the soundboard closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundboardExit {
    /// YELLOW was pressed.
    Closed,
    /// Nothing was pressed for the soundboard timeout.
    TimedOut,
    Shutdown,
}

impl Jukebox {
    /// Runs soundboard mode until YELLOW, the inactivity timeout or shutdown.
    pub(super) fn soundboard(&mut self) -> SoundboardExit {
        let span = span!(Level::INFO, "soundboard");
        let _enter = span.enter();
        self.set_mode(Mode::Soundboard);

        let mut cursor = BankCursor::new(self.settings.max_bank);
        self.load_bank(cursor.current());

        let mut deadline = self.clock.deadline(self.settings.soundboard_timeout);
        loop {
            if self.shutdown.is_cancelled() {
                return SoundboardExit::Shutdown;
            }
            if self.clock.expired(deadline) {
                info!("No input, closing soundboard.");
                return SoundboardExit::TimedOut;
            }

            let key = match self.keypad.read_debounced_symbol() {
                Some(key) => key,
                None => {
                    self.clock.sleep(self.settings.soundboard_poll_interval);
                    continue;
                }
            };
            info!(key = %key, bank = cursor.current(), "Soundboard input.");

            match key {
                KeySymbol::Yellow => {
                    self.samples.play_asset(AssetKey::Press, false);
                    self.close_soundboard();
                    return SoundboardExit::Closed;
                }
                KeySymbol::Red => {
                    self.samples.play_asset(AssetKey::Press, false);
                    if cursor.next() {
                        self.load_bank(cursor.current());
                    } else {
                        self.bank_out_of_range(cursor.current());
                    }
                }
                KeySymbol::Blue => {
                    self.samples.play_asset(AssetKey::Press, false);
                    if cursor.previous() {
                        self.load_bank(cursor.current());
                    } else {
                        self.bank_out_of_range(cursor.current());
                    }
                }
                other => {
                    self.samples.play_sample(other, false);
                }
            }

            deadline = self.clock.deadline(self.settings.soundboard_timeout);
            self.keypad.debounce_and_await_release(&self.lamps);
        }
    }

    /// Replaces the cached samples with the given bank's, lamps lit while loading.
    fn load_bank(&mut self, bank: u32) {
        let _lit = self.lamps.light_all();
        self.samples.load_bank(&self.settings.soundboard_path, bank);
    }

    fn bank_out_of_range(&self, bank: u32) {
        info!(
            bank,
            max_bank = self.settings.max_bank,
            "Bank out of range."
        );
        self.samples.play_asset(AssetKey::BankOutOfRange, true);
    }

    /// Blinks goodbye. The blinks stand in for the usual debounce, topped up if they're
    /// shorter, and the key must be let go before the next mode reads the keypad.
    fn close_soundboard(&self) {
        info!("Closing soundboard.");
        let blink = self.settings.blink;
        self.lamps.blink(CLOSE_BLINKS as usize, blink);
        let blinked = blink * CLOSE_BLINKS * 2;
        self.clock.sleep(self.keypad.debounce().saturating_sub(blinked));
        self.keypad.await_release();
    }
}
