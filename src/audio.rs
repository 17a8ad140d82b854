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
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::info;

use crate::{config, playsync::CancelHandle, samples::AudioSample};

pub mod cpal;
pub mod mock;

/// Plays decoded samples. Every call to `play` gets its own stream, so overlapping plays
/// mix on the sound server.
pub trait Output: fmt::Display + Send + Sync {
    /// Starts playing the sample and returns immediately.
    fn play(&self, sample: &AudioSample) -> Result<Playback, Box<dyn Error>>;
}

/// A sample that has been handed to an output.
pub struct Playback {
    finished: Arc<AtomicBool>,
    cancel_handle: CancelHandle,
}

impl Playback {
    /// Creates a playback. The renderer sets `finished` and calls `notify` on the cancel
    /// handle once the sample has been played out.
    pub fn new(finished: Arc<AtomicBool>, cancel_handle: CancelHandle) -> Playback {
        Playback {
            finished,
            cancel_handle,
        }
    }

    /// A playback that has nothing left to do.
    pub fn finished() -> Playback {
        Playback::new(Arc::new(AtomicBool::new(true)), CancelHandle::new())
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Blocks until the sample has played out.
    pub fn wait(&self) {
        self.cancel_handle.wait(self.finished.clone());
    }
}

/// Gets the output described by the configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Output>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        info!(device, "Using mock audio output.");
        return Ok(Arc::new(mock::Device::get(device)));
    }

    Ok(Arc::new(cpal::Device::get(device)?))
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    use super::{get_device, Playback};
    use crate::{config, playsync::CancelHandle};

    #[test]
    fn test_get_mock_device() -> Result<(), Box<dyn std::error::Error>> {
        let output = get_device(&config::Audio::new("mock-output"))?;
        assert_eq!("mock-output (Mock)", output.to_string());
        Ok(())
    }

    #[test]
    fn test_playback_wait() {
        let finished = Arc::new(AtomicBool::new(false));
        let cancel_handle = CancelHandle::new();
        let playback = Playback::new(finished.clone(), cancel_handle.clone());
        assert!(!playback.is_finished());

        let renderer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            finished.store(true, Ordering::Release);
            cancel_handle.notify();
        });
        playback.wait();
        assert!(playback.is_finished());
        renderer.join().expect("renderer panicked");
        assert!(Playback::finished().is_finished());
    }
}
