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
use std::{error::Error, fs, path::PathBuf, sync::Arc, thread, time::Duration};

use tempfile::TempDir;

use super::{EntryExit, Jukebox, Mode, SoundboardExit};
use crate::{
    audio, clock, config,
    gpio::{self, PinVector},
    keypad::KeySymbol,
    player::PlayResult,
    playsync::CancelHandle,
    test::{eventually, parse_yaml, write_wav},
};

struct Fixture {
    device: Arc<gpio::mock::Device>,
    output: Arc<audio::mock::Device>,
    clock: Arc<clock::mock::Clock>,
    shutdown: CancelHandle,
    jukebox: Jukebox,
    songs: TempDir,
    _soundboard: TempDir,
}

impl Fixture {
    /// Where the player script writes the path it was asked to play.
    fn played_file(songs: &TempDir) -> PathBuf {
        songs.path().join("played.txt")
    }

    fn played_track(&self) -> Option<String> {
        fs::read_to_string(Fixture::played_file(&self.songs))
            .ok()
            .map(|played| played.trim().to_string())
    }

    fn load_assets(&mut self) {
        let assets = self.songs.path().to_path_buf();
        self.jukebox.samples.load_assets(&assets);
    }
}

/// Builds a jukebox on mock hardware. The player runs `sh -c <player_script> <track>`, so
/// the script sees the track as $0. With `record` set the script records the track instead.
fn fixture(player_script: &str, record: bool) -> Result<Fixture, Box<dyn Error>> {
    let songs = tempfile::tempdir()?;
    fs::write(songs.path().join("7_Song.mp3"), "")?;
    for asset in [
        "Press.wav",
        "Load.wav",
        "TrackMissing.wav",
        "BankOutOfRange.wav",
        "SampleMissing.wav",
    ] {
        write_wav(&songs.path().join(asset), 44100, 441)?;
    }

    let soundboard = tempfile::tempdir()?;
    fs::create_dir(soundboard.path().join("0"))?;
    fs::create_dir(soundboard.path().join("1"))?;
    write_wav(&soundboard.path().join("0").join("1_Horn.wav"), 44100, 441)?;
    write_wav(&soundboard.path().join("1").join("2_Bell.wav"), 48000, 480)?;

    let script = if record {
        format!("echo \"$0\" > {}", Fixture::played_file(&songs).display())
    } else {
        player_script.to_string()
    };
    let config: config::Jukebox = parse_yaml(&format!(
        r#"
        songs_path: {}
        soundboard_path: {}
        gpio:
          device: mock-gpio
        audio:
          device: mock-audio
        soundboard:
          max_bank: 1
        bpm:
          command: sh
          args: ['-c', 'echo 120 BPM']
        player:
          command: sh
          args: ['-c', '{}']
        "#,
        songs.path().display(),
        soundboard.path().display(),
        script,
    ));

    let device = Arc::new(gpio::mock::Device::get("mock-gpio"));
    let output = Arc::new(audio::mock::Device::get("mock-audio"));
    let clock = Arc::new(clock::mock::Clock::new());
    let shutdown = CancelHandle::new();
    let jukebox = Jukebox::new(
        &config,
        device.clone(),
        output.clone(),
        clock.clone(),
        shutdown.clone(),
    )?;

    let mut fixture = Fixture {
        device,
        output,
        clock,
        shutdown,
        jukebox,
        songs,
        _soundboard: soundboard,
    };
    fixture.load_assets();
    Ok(fixture)
}

#[test]
fn test_digit_then_confirm_plays_track() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Confirm, 10);

    assert_eq!(
        EntryExit::Played {
            number: 7,
            result: PlayResult::Finished
        },
        fixture.jukebox.entry(KeySymbol::Digit(7))
    );
    let expected = fixture.songs.path().join("7_Song.mp3");
    assert_eq!(Some(expected.display().to_string()), fixture.played_track());
    assert_eq!(vec!["Press.wav", "Load.wav"], fixture.output.played());
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_reset_then_confirm_is_ignored() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Digit(2), 10);
    fixture.device.press(KeySymbol::Reset, 10);
    fixture.device.press(KeySymbol::Confirm, 10);

    assert_eq!(
        EntryExit::TimedOut,
        fixture.jukebox.entry(KeySymbol::Digit(4))
    );
    assert_eq!(None, fixture.played_track());
    assert_eq!(vec!["Press.wav"; 3], fixture.output.played());
    // One flash per acknowledged key plus the three clear blinks.
    assert_eq!(6, fixture.device.all_on_count());
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_timeout_with_digits_blinks() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;

    assert_eq!(
        EntryExit::TimedOut,
        fixture.jukebox.entry(KeySymbol::Digit(3))
    );
    assert_eq!(3, fixture.device.all_on_count());
    assert!(fixture.clock.elapsed() >= Duration::from_secs(5));
    Ok(())
}

#[test]
fn test_unknown_track() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Confirm, 10);

    assert_eq!(
        EntryExit::Played {
            number: 8,
            result: PlayResult::NotFound
        },
        fixture.jukebox.entry(KeySymbol::Digit(8))
    );
    assert_eq!(None, fixture.played_track());
    assert_eq!(
        vec!["Press.wav", "TrackMissing.wav"],
        fixture.output.played()
    );
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_soundboard_banks() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Red, 10);
    fixture.device.press(KeySymbol::Red, 10);
    fixture.device.press(KeySymbol::Digit(2), 10);
    fixture.device.press(KeySymbol::Yellow, 10);

    assert_eq!(
        EntryExit::Soundboard(SoundboardExit::Closed),
        fixture.jukebox.entry(KeySymbol::Yellow)
    );
    assert_eq!(
        vec![
            "Press.wav",
            "Press.wav",
            "BankOutOfRange.wav",
            "2_Bell.wav",
            "Press.wav"
        ],
        fixture.output.played()
    );
    // Going past the last bank kept its samples.
    assert_eq!(Some(1), fixture.jukebox.samples.current_bank());
    assert!(fixture.jukebox.samples.has_sample(KeySymbol::Digit(2)));
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_soundboard_previous_bank_and_missing_sample() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Blue, 10);
    fixture.device.press(KeySymbol::Digit(9), 10);
    fixture.device.press(KeySymbol::Digit(1), 10);
    fixture.device.press(KeySymbol::Yellow, 10);

    assert_eq!(
        EntryExit::Soundboard(SoundboardExit::Closed),
        fixture.jukebox.entry(KeySymbol::Yellow)
    );
    assert_eq!(
        vec![
            "Press.wav",
            "BankOutOfRange.wav",
            "SampleMissing.wav",
            "1_Horn.wav",
            "Press.wav"
        ],
        fixture.output.played()
    );
    assert_eq!(Some(0), fixture.jukebox.samples.current_bank());
    Ok(())
}

#[test]
fn test_soundboard_timeout() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;

    assert_eq!(
        EntryExit::Soundboard(SoundboardExit::TimedOut),
        fixture.jukebox.entry(KeySymbol::Yellow)
    );
    assert!(fixture.clock.elapsed() >= Duration::from_secs(60));
    assert_eq!(Mode::Soundboard, fixture.jukebox.mode());
    Ok(())
}

#[test]
fn test_soundboard_key_resets_timeout() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    // 500 empty polls at 100ms each put the key 50s in.
    fixture.device.hold(PinVector::RELEASED, 500 * 10);
    fixture.device.press(KeySymbol::Digit(1), 10);

    assert_eq!(
        EntryExit::Soundboard(SoundboardExit::TimedOut),
        fixture.jukebox.entry(KeySymbol::Yellow)
    );
    assert_eq!(vec!["1_Horn.wav"], fixture.output.played());
    assert!(fixture.clock.elapsed() >= Duration::from_secs(110));
    Ok(())
}

#[test]
fn test_shuffle_stops_on_abort() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("sleep 10", false)?;
    fixture.device.press(KeySymbol::Red, 10);

    assert_eq!(
        EntryExit::Shuffled { finished: 0 },
        fixture.jukebox.entry(KeySymbol::Blue)
    );
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_shuffle_continues_after_finished_track() -> Result<(), Box<dyn Error>> {
    // The first play exits straight away, the second keeps going until RED.
    let mut fixture = fixture(
        "d=$(dirname $0); if [ -e $d/one ]; then touch $d/two; sleep 10; else touch $d/one; fi",
        false,
    )?;
    let second = fixture.songs.path().join("two");
    let device = fixture.device.clone();
    let stopper = thread::spawn(move || {
        eventually(|| second.exists(), "Second track never started");
        device.press(KeySymbol::Red, 10);
    });

    assert_eq!(
        EntryExit::Shuffled { finished: 1 },
        fixture.jukebox.entry(KeySymbol::Blue)
    );
    stopper.join().expect("stopper panicked");
    assert_eq!(vec!["Load.wav", "Load.wav"], fixture.output.played());
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_shuffle_without_tracks() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fs::remove_file(fixture.songs.path().join("7_Song.mp3"))?;

    assert_eq!(
        EntryExit::Shuffled { finished: 0 },
        fixture.jukebox.entry(KeySymbol::Blue)
    );
    assert_eq!(None, fixture.played_track());
    Ok(())
}

#[test]
fn test_idle_returns_key() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    fixture.device.press(KeySymbol::Digit(5), 10);

    assert_eq!(Some(KeySymbol::Digit(5)), fixture.jukebox.idle(true));
    assert_eq!(Mode::Idle, fixture.jukebox.mode());
    assert_eq!(vec!["Press.wav"], fixture.output.played());
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_idle_waits_before_animating() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    // The key arrives a few polls in.
    fixture.device.hold(PinVector::RELEASED, 10 * 10);
    fixture.device.press(KeySymbol::Digit(1), 10);

    assert_eq!(Some(KeySymbol::Digit(1)), fixture.jukebox.idle(false));
    // Only the acknowledgement lit anything: three lamps on, three off.
    assert_eq!(1, fixture.device.all_on_count());
    assert_eq!(6, fixture.device.lamp_history().len());
    Ok(())
}

#[test]
fn test_idle_animates_after_interval() -> Result<(), Box<dyn Error>> {
    let mut fixture = fixture("", true)?;
    // The 30s interval takes 601 polls at 50ms. The next ten land in the animation's
    // second frame.
    fixture.device.hold(PinVector::RELEASED, 601 * 10 + 10 * 10);
    fixture.device.press(KeySymbol::Digit(1), 10);

    assert_eq!(Some(KeySymbol::Digit(1)), fixture.jukebox.idle(false));
    assert!(fixture.clock.elapsed() >= Duration::from_secs(30));
    let history = fixture.device.lamp_history();
    assert!(history.contains(&[true, false, false]));
    assert!(history.contains(&[false, true, false]));
    Ok(())
}

#[test]
fn test_run_until_shutdown() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("", true)?;
    let Fixture {
        device,
        clock,
        shutdown,
        mut jukebox,
        ..
    } = fixture;

    let join = thread::spawn(move || {
        jukebox.run();
        jukebox.mode()
    });

    // Boot takes eight frames at 240 BPM.
    eventually(
        || clock.elapsed() > Duration::from_secs(3),
        "Jukebox never got past boot",
    );
    shutdown.cancel();

    let mode = join.join().expect("run loop panicked");
    assert_eq!(Mode::Idle, mode);
    assert!(device.all_on_count() >= 4);
    assert!(device.all_off());
    Ok(())
}
