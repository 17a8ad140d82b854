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
use std::fmt;

use crate::gpio::Lamp;

/// The state of all three lamp banks at one step of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightFrame {
    pub top: bool,
    pub left_right: bool,
    pub bottom: bool,
}

impl LightFrame {
    pub const ALL_ON: LightFrame = LightFrame::from_bits([1, 1, 1]);
    pub const ALL_OFF: LightFrame = LightFrame::from_bits([0, 0, 0]);

    /// Builds a frame from top, left-right and bottom levels.
    pub const fn from_bits(bits: [u8; 3]) -> LightFrame {
        LightFrame {
            top: bits[0] != 0,
            left_right: bits[1] != 0,
            bottom: bits[2] != 0,
        }
    }

    /// Whether the given lamp is lit in this frame.
    pub fn get(&self, lamp: Lamp) -> bool {
        match lamp {
            Lamp::Top => self.top,
            Lamp::LeftRight => self.left_right,
            Lamp::Bottom => self.bottom,
        }
    }
}

/// A named, fixed-length sequence of frames.
#[derive(Debug, PartialEq, Eq)]
pub struct LightPattern {
    name: &'static str,
    frames: &'static [LightFrame],
}

impl LightPattern {
    pub const fn new(name: &'static str, frames: &'static [LightFrame]) -> LightPattern {
        LightPattern { name, frames }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn frames(&self) -> &'static [LightFrame] {
        self.frames
    }
}

impl fmt::Display for LightPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} frames)", self.name, self.frames.len())
    }
}

const fn frame(bits: [u8; 3]) -> LightFrame {
    LightFrame::from_bits(bits)
}

const BLINK_ALL_FRAMES: [LightFrame; 8] = [
    frame([1, 1, 1]),
    frame([0, 0, 0]),
    frame([1, 1, 1]),
    frame([0, 0, 0]),
    frame([1, 1, 1]),
    frame([0, 0, 0]),
    frame([1, 1, 1]),
    frame([0, 0, 0]),
];

pub const BLINK_ALL: LightPattern = LightPattern::new("blink-all", &BLINK_ALL_FRAMES);

const UP_DOWN_FRAMES: [LightFrame; 8] = [
    frame([1, 0, 0]),
    frame([0, 1, 0]),
    frame([0, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 0]),
    frame([0, 1, 0]),
    frame([0, 0, 1]),
    frame([0, 1, 0]),
];

pub const UP_DOWN: LightPattern = LightPattern::new("up-down", &UP_DOWN_FRAMES);

const DOWN_UP_FRAMES: [LightFrame; 8] = [
    frame([0, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 0]),
    frame([0, 1, 0]),
    frame([0, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 0]),
    frame([0, 1, 0]),
];

pub const DOWN_UP: LightPattern = LightPattern::new("down-up", &DOWN_UP_FRAMES);

/// Top and bottom alternate with left-right.
const TOP_BOTTOM_LEFT_RIGHT_FRAMES: [LightFrame; 8] = [
    frame([1, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 1]),
    frame([0, 1, 0]),
    frame([1, 0, 1]),
    frame([0, 1, 0]),
];

pub const TOP_BOTTOM_LEFT_RIGHT: LightPattern =
    LightPattern::new("top-bottom-left-right", &TOP_BOTTOM_LEFT_RIGHT_FRAMES);

/// Lamps stack up from the top, then flash. Also the idle animation.
const TETRIS_FRAMES: [LightFrame; 8] = [
    frame([1, 0, 0]),
    frame([0, 1, 0]),
    frame([0, 0, 1]),
    frame([0, 1, 1]),
    frame([1, 1, 1]),
    frame([0, 0, 0]),
    frame([1, 1, 1]),
    frame([0, 0, 0]),
];

pub const TETRIS: LightPattern = LightPattern::new("tetris", &TETRIS_FRAMES);

/// Patterns the BPM animation chooses from.
pub const ALL_PATTERNS: [&LightPattern; 5] = [
    &BLINK_ALL,
    &DOWN_UP,
    &UP_DOWN,
    &TOP_BOTTOM_LEFT_RIGHT,
    &TETRIS,
];
