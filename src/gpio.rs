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
use std::{error::Error, fmt, sync::Arc};

use tracing::info;

use crate::config;

pub mod mock;
pub mod rppal;

/// The number of keypad matrix lines wired to input pins.
pub const KEYPAD_PIN_COUNT: usize = 4;

/// Typed errors raised while claiming GPIO pins.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("GPIO error: {0}")]
    Rppal(#[from] ::rppal::gpio::Error),

    #[error("expected {expected} keypad pins, got {actual}")]
    KeypadPins { expected: usize, actual: usize },
}

/// One instantaneous sample of every keypad input line, in pin order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinVector([bool; KEYPAD_PIN_COUNT]);

impl PinVector {
    /// The vector read when no key is held down (all lines pulled low).
    pub const RELEASED: PinVector = PinVector([false; KEYPAD_PIN_COUNT]);

    pub const fn new(lines: [bool; KEYPAD_PIN_COUNT]) -> PinVector {
        PinVector(lines)
    }

    /// Builds a vector from 0/1 line levels.
    pub const fn from_bits(bits: [u8; KEYPAD_PIN_COUNT]) -> PinVector {
        PinVector([bits[0] != 0, bits[1] != 0, bits[2] != 0, bits[3] != 0])
    }

    pub fn is_released(&self) -> bool {
        *self == PinVector::RELEASED
    }
}

impl fmt::Display for PinVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.0 {
            write!(f, "{}", if line { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// The three independently switched lamp banks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lamp {
    Top,
    LeftRight,
    Bottom,
}

impl Lamp {
    pub const ALL: [Lamp; 3] = [Lamp::Top, Lamp::LeftRight, Lamp::Bottom];

    /// Position of the lamp within a light frame.
    pub fn index(&self) -> usize {
        match self {
            Lamp::Top => 0,
            Lamp::LeftRight => 1,
            Lamp::Bottom => 2,
        }
    }
}

impl fmt::Display for Lamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lamp::Top => write!(f, "top"),
            Lamp::LeftRight => write!(f, "left-right"),
            Lamp::Bottom => write!(f, "bottom"),
        }
    }
}

/// Digital I/O for the lamp outputs and keypad inputs. Both operations are synchronous and
/// expected to complete well under a millisecond.
pub trait Device: fmt::Display + Send + Sync {
    /// Switches a lamp bank. Wiring polarity is handled by the device.
    fn set_lamp(&self, lamp: Lamp, on: bool);

    /// Samples all keypad lines once.
    fn read_keypad(&self) -> PinVector;

    /// Switches the lamps off and gives the pins back to the system. The device must not
    /// be used afterwards.
    fn release(&self);
}

/// Gets the GPIO device described by the configuration.
pub fn get_device(config: &config::Gpio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        info!(device, "Using mock GPIO device.");
        return Ok(Arc::new(mock::Device::get(device)));
    }

    Ok(Arc::new(rppal::Device::get(config)?))
}
