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
use crate::keypad::KeySymbol;

/// Nine digits always fit a track number.
const MAX_DIGITS: usize = 9;

/// What a key did to the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryAction {
    /// A digit was added.
    Appended,
    /// The entry was cleared. Carries what was cleared.
    Cleared(String),
    /// Play this track.
    Play(u32),
    Shuffle,
    Soundboard,
    /// The key means nothing here.
    Ignored,
}

/// The digits typed so far.
#[derive(Debug, Default)]
pub struct EntryBuffer {
    digits: String,
}

impl EntryBuffer {
    pub fn new() -> EntryBuffer {
        EntryBuffer::default()
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Applies a key. Play, shuffle and soundboard end the entry, so they leave the buffer
    /// empty.
    pub fn apply(&mut self, key: KeySymbol) -> EntryAction {
        match key {
            KeySymbol::Digit(_) if self.digits.len() >= MAX_DIGITS => EntryAction::Ignored,
            KeySymbol::Digit(_) => match key.digit() {
                Some(digit) => {
                    self.digits.push(digit);
                    EntryAction::Appended
                }
                None => EntryAction::Ignored,
            },
            KeySymbol::Reset if !self.is_empty() => {
                EntryAction::Cleared(std::mem::take(&mut self.digits))
            }
            KeySymbol::Confirm if !self.is_empty() => {
                match std::mem::take(&mut self.digits).parse::<u32>() {
                    Ok(number) => EntryAction::Play(number),
                    Err(_) => EntryAction::Ignored,
                }
            }
            KeySymbol::Blue => {
                self.digits.clear();
                EntryAction::Shuffle
            }
            KeySymbol::Yellow => {
                self.digits.clear();
                EntryAction::Soundboard
            }
            KeySymbol::Reset | KeySymbol::Confirm | KeySymbol::Red => EntryAction::Ignored,
        }
    }
}
