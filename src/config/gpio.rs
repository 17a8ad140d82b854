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

use crate::gpio::Lamp;

const DEFAULT_DEVICE: &str = "rppal";
const DEFAULT_TOP_PIN: u8 = 5;
const DEFAULT_LEFT_RIGHT_PIN: u8 = 6;
const DEFAULT_BOTTOM_PIN: u8 = 26;
const DEFAULT_KEYPAD_PINS: [u8; 4] = [14, 15, 23, 24];

/// Lamp output wiring. Pin numbers are BCM numbers.
#[derive(Deserialize, Clone, Default)]
pub struct Lamps {
    top: Option<u8>,
    left_right: Option<u8>,
    bottom: Option<u8>,
    /// True when a low output lights the lamp.
    active_low: Option<bool>,
}

/// The GPIO wiring.
#[derive(Deserialize, Clone, Default)]
pub struct Gpio {
    /// "rppal" for the Raspberry Pi header, or a name starting with "mock".
    device: Option<String>,

    #[serde(default)]
    lamps: Lamps,

    /// The keypad matrix lines, in the order the key table expects them.
    keypad_pins: Option<Vec<u8>>,
}

impl Gpio {
    /// Creates a GPIO configuration for the given device with default wiring.
    pub fn new(device: &str) -> Gpio {
        Gpio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the output pin driving the given lamp bank.
    pub fn lamp_pin(&self, lamp: Lamp) -> u8 {
        match lamp {
            Lamp::Top => self.lamps.top.unwrap_or(DEFAULT_TOP_PIN),
            Lamp::LeftRight => self.lamps.left_right.unwrap_or(DEFAULT_LEFT_RIGHT_PIN),
            Lamp::Bottom => self.lamps.bottom.unwrap_or(DEFAULT_BOTTOM_PIN),
        }
    }

    pub fn active_low(&self) -> bool {
        self.lamps.active_low.unwrap_or(false)
    }

    pub fn keypad_pins(&self) -> Vec<u8> {
        match &self.keypad_pins {
            Some(pins) => pins.clone(),
            None => DEFAULT_KEYPAD_PINS.to_vec(),
        }
    }
}
