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
    collections::VecDeque,
    fmt,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use super::{Lamp, PinVector};
use crate::keypad::KeySymbol;

/// A mock device. Lamp writes are recorded and keypad reads are served from a script.
///
/// Every call to `read_keypad` consumes one scripted vector. Once the script runs dry the
/// keypad reads as released.
pub struct Device {
    name: String,
    lamps: Mutex<[bool; 3]>,
    history: Mutex<Vec<[bool; 3]>>,
    script: Mutex<VecDeque<PinVector>>,
    reads: AtomicUsize,
    released: AtomicBool,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            lamps: Mutex::new([false; 3]),
            history: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            reads: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        }
    }

    /// Scripts the next `reads` keypad reads to return the given vector.
    pub fn hold(&self, vector: PinVector, reads: usize) {
        let mut script = self.script.lock();
        script.extend(std::iter::repeat(vector).take(reads));
    }

    /// Scripts a complete press: the key is held for `reads` reads, then released for one.
    pub fn press(&self, key: KeySymbol, reads: usize) {
        self.hold(key.vector(), reads);
        self.hold(PinVector::RELEASED, 1);
    }

    /// The number of scripted reads that have not been consumed yet.
    pub fn pending_reads(&self) -> usize {
        self.script.lock().len()
    }

    /// Total keypad reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// The current lamp states in frame order (top, left-right, bottom).
    pub fn lamps(&self) -> [bool; 3] {
        *self.lamps.lock()
    }

    /// True if every lamp is off.
    pub fn all_off(&self) -> bool {
        self.lamps().iter().all(|on| !on)
    }

    /// Every distinct lamp state the device went through, oldest first.
    pub fn lamp_history(&self) -> Vec<[bool; 3]> {
        self.history.lock().clone()
    }

    /// The number of times all lamps went from not-all-on to all-on.
    pub fn all_on_count(&self) -> usize {
        let history = self.history.lock();
        let mut previous = [false; 3];
        let mut count = 0;
        for state in history.iter() {
            if *state == [true; 3] && previous != [true; 3] {
                count += 1;
            }
            previous = *state;
        }
        count
    }

    /// True once `release` has been called.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

impl super::Device for Device {
    fn set_lamp(&self, lamp: Lamp, on: bool) {
        let mut lamps = self.lamps.lock();
        if lamps[lamp.index()] == on {
            return;
        }
        lamps[lamp.index()] = on;
        self.history.lock().push(*lamps);
    }

    fn read_keypad(&self) -> PinVector {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.script
            .lock()
            .pop_front()
            .unwrap_or(PinVector::RELEASED)
    }

    fn release(&self) {
        for lamp in Lamp::ALL {
            self.set_lamp(lamp, false);
        }
        self.released.store(true, Ordering::Relaxed);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
