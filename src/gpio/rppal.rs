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

use parking_lot::Mutex;
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use tracing::{info, span, Level as TraceLevel};

use super::{GpioError, Lamp, PinVector, KEYPAD_PIN_COUNT};
use crate::config;

/// Claimed pins. Dropping them hands the pins back to the system.
struct Pins {
    lamps: [OutputPin; 3],
    keypad: [InputPin; KEYPAD_PIN_COUNT],
}

/// Raspberry Pi GPIO through rppal.
pub struct Device {
    pins: Mutex<Option<Pins>>,
    active_low: bool,
    lamp_numbers: [u8; 3],
    keypad_numbers: [u8; KEYPAD_PIN_COUNT],
}

impl Device {
    /// Claims the lamp outputs and keypad inputs from the configuration. Lamps start off and
    /// the keypad inputs get pull-down bias.
    pub fn get(config: &config::Gpio) -> Result<Device, GpioError> {
        let span = span!(TraceLevel::INFO, "gpio init");
        let _enter = span.enter();

        let keypad_pins = config.keypad_pins();
        let keypad_numbers: [u8; KEYPAD_PIN_COUNT] =
            keypad_pins
                .as_slice()
                .try_into()
                .map_err(|_| GpioError::KeypadPins {
                    expected: KEYPAD_PIN_COUNT,
                    actual: keypad_pins.len(),
                })?;
        let lamp_numbers = Lamp::ALL.map(|lamp| config.lamp_pin(lamp));
        let active_low = config.active_low();

        let gpio = Gpio::new()?;
        let off = Self::level(false, active_low);
        let claim_output = |number: u8| -> Result<OutputPin, GpioError> {
            let mut pin = gpio.get(number)?.into_output();
            pin.write(off);
            Ok(pin)
        };
        let claim_input = |number: u8| -> Result<InputPin, GpioError> {
            Ok(gpio.get(number)?.into_input_pulldown())
        };

        let pins = Pins {
            lamps: [
                claim_output(lamp_numbers[0])?,
                claim_output(lamp_numbers[1])?,
                claim_output(lamp_numbers[2])?,
            ],
            keypad: [
                claim_input(keypad_numbers[0])?,
                claim_input(keypad_numbers[1])?,
                claim_input(keypad_numbers[2])?,
                claim_input(keypad_numbers[3])?,
            ],
        };

        info!(
            lamps = ?lamp_numbers,
            keypad = ?keypad_numbers,
            active_low,
            "GPIO pins initialized."
        );

        Ok(Device {
            pins: Mutex::new(Some(pins)),
            active_low,
            lamp_numbers,
            keypad_numbers,
        })
    }

    fn level(on: bool, active_low: bool) -> Level {
        if on != active_low {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl super::Device for Device {
    fn set_lamp(&self, lamp: Lamp, on: bool) {
        if let Some(pins) = self.pins.lock().as_mut() {
            pins.lamps[lamp.index()].write(Self::level(on, self.active_low));
        }
    }

    fn read_keypad(&self) -> PinVector {
        match self.pins.lock().as_ref() {
            Some(pins) => PinVector::new([
                pins.keypad[0].is_high(),
                pins.keypad[1].is_high(),
                pins.keypad[2].is_high(),
                pins.keypad[3].is_high(),
            ]),
            None => PinVector::RELEASED,
        }
    }

    fn release(&self) {
        let mut pins = self.pins.lock();
        if let Some(claimed) = pins.as_mut() {
            let off = Self::level(false, self.active_low);
            for pin in claimed.lamps.iter_mut() {
                pin.write(off);
            }
        }
        *pins = None;
        info!("GPIO pins released.");
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rppal (lamps {:?}, keypad {:?}{})",
            self.lamp_numbers,
            self.keypad_numbers,
            if self.active_low { ", active low" } else { "" }
        )
    }
}
