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
use std::{error::Error, str::FromStr, sync::Arc, time::Duration};

use super::{majority_vote, KeySymbol, Keypad, KEYPAD_LOOKUP};
use crate::{
    audio, clock, config,
    gpio::{self, PinVector},
    lights::Lamps,
    playsync::CancelHandle,
    samples::SampleCache,
    test::{parse_yaml, write_wav},
};

struct Fixture {
    device: Arc<gpio::mock::Device>,
    clock: Arc<clock::mock::Clock>,
    shutdown: CancelHandle,
    keypad: Keypad,
    lamps: Lamps,
}

fn fixture(yaml: &str) -> Result<Fixture, Box<dyn Error>> {
    let device = Arc::new(gpio::mock::Device::get("mock-gpio"));
    let clock = Arc::new(clock::mock::Clock::new());
    let shutdown = CancelHandle::new();
    let keypad = Keypad::new(
        device.clone(),
        clock.clone(),
        &parse_yaml::<config::Keypad>(yaml),
        shutdown.clone(),
    )?;
    let lamps = Lamps::new(device.clone(), clock.clone(), Duration::from_millis(100));
    Ok(Fixture {
        device,
        clock,
        shutdown,
        keypad,
        lamps,
    })
}

#[test]
fn test_decode() {
    assert_eq!(
        Some(KeySymbol::Digit(0)),
        KeySymbol::decode(PinVector::from_bits([0, 1, 0, 1]))
    );
    assert_eq!(
        Some(KeySymbol::Digit(7)),
        KeySymbol::decode(PinVector::from_bits([1, 1, 1, 1]))
    );
    assert_eq!(
        Some(KeySymbol::Confirm),
        KeySymbol::decode(PinVector::from_bits([0, 1, 1, 0]))
    );
    assert_eq!(
        Some(KeySymbol::Red),
        KeySymbol::decode(PinVector::from_bits([1, 1, 0, 0]))
    );
    // Every combination except all-low belongs to a button.
    assert_eq!(None, KeySymbol::decode(PinVector::RELEASED));
}

#[test]
fn test_vectors_are_unique() {
    let keys: Vec<KeySymbol> = KEYPAD_LOOKUP.iter().map(|(_, key)| *key).collect();
    assert_eq!(15, keys.len());
    for key in keys.iter() {
        assert_eq!(Some(*key), KeySymbol::decode(key.vector()));
        assert!(!key.vector().is_released());
    }
}

#[test]
fn test_key_names() {
    assert_eq!(Ok(KeySymbol::Reset), KeySymbol::from_str("R"));
    assert_eq!(Ok(KeySymbol::Confirm), KeySymbol::from_str("g"));
    assert_eq!(Ok(KeySymbol::Blue), KeySymbol::from_str("BLUE"));
    assert_eq!(Ok(KeySymbol::Digit(3)), KeySymbol::from_str("3"));
    assert!(KeySymbol::from_str("10").is_err());
    assert!(KeySymbol::from_str("03").is_err());
    assert!(KeySymbol::from_str("PURPLE").is_err());
    assert_eq!("RED", KeySymbol::Red.to_string());
    assert_eq!(Some('4'), KeySymbol::Digit(4).digit());
    assert_eq!(None, KeySymbol::Yellow.digit());
}

#[test]
fn test_majority_vote() {
    let red = KeySymbol::Red.vector();
    let blue = KeySymbol::Blue.vector();

    assert_eq!(None, majority_vote(&[]));
    assert_eq!(Some(red), majority_vote(&[red; 5]));
    assert_eq!(
        Some(red),
        majority_vote(&[PinVector::RELEASED, red, blue, red, red])
    );
    // Ties go to whichever vector showed up first.
    assert_eq!(Some(blue), majority_vote(&[blue, red, red, blue]));
}

#[test]
fn test_read_sampled_rejects_noise() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("samples: 5")?;
    fixture.device.hold(KeySymbol::Digit(8).vector(), 3);
    fixture.device.hold(PinVector::RELEASED, 1);
    fixture.device.hold(KeySymbol::Digit(9).vector(), 1);
    assert_eq!(
        Some(KeySymbol::Digit(8)),
        fixture.keypad.read_debounced_symbol()
    );
    assert_eq!(5, fixture.device.reads());

    // A lone glitch among released reads is outvoted.
    fixture.device.hold(KeySymbol::Digit(8).vector(), 1);
    assert_eq!(None, fixture.keypad.read_debounced_symbol());
    Ok(())
}

#[test]
fn test_single_sample() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("samples: 1")?;
    fixture.device.hold(KeySymbol::Yellow.vector(), 1);
    assert_eq!(
        Some(KeySymbol::Yellow),
        fixture.keypad.read_debounced_symbol()
    );
    assert_eq!(1, fixture.device.reads());
    Ok(())
}

#[test]
fn test_poll_times_out() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("poll_interval: 50ms")?;
    assert_eq!(None, fixture.keypad.poll(Duration::from_secs(5)));
    assert_eq!(Duration::from_secs(5), fixture.clock.elapsed());
    Ok(())
}

#[test]
fn test_poll_stops_on_shutdown() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("samples: 10")?;
    fixture.shutdown.cancel();
    assert_eq!(None, fixture.keypad.poll(Duration::from_secs(3600)));
    assert_eq!(0, fixture.device.reads());
    Ok(())
}

#[test]
fn test_poll_finds_key() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("samples: 10\npoll_interval: 50ms")?;
    fixture.device.hold(PinVector::RELEASED, 20);
    fixture.device.press(KeySymbol::Digit(3), 10);

    assert_eq!(
        Some(KeySymbol::Digit(3)),
        fixture.keypad.poll(Duration::from_secs(5))
    );
    assert_eq!(Duration::from_millis(100), fixture.clock.elapsed());
    // The release is left for whoever waits on it.
    assert_eq!(1, fixture.device.pending_reads());
    Ok(())
}

#[test]
fn test_debounce_and_await_release() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("debounce: 150ms")?;
    fixture.device.hold(KeySymbol::Red.vector(), 20);

    fixture.keypad.debounce_and_await_release(&fixture.lamps);
    assert_eq!(0, fixture.device.pending_reads());
    assert!(fixture.clock.elapsed() >= Duration::from_millis(300));
    assert_eq!(1, fixture.device.all_on_count());
    assert!(fixture.device.all_off());
    Ok(())
}

#[test]
fn test_await_keypress_with_feedback() -> Result<(), Box<dyn Error>> {
    let fixture = fixture("samples: 10")?;
    let assets = tempfile::tempdir()?;
    write_wav(&assets.path().join("Press.wav"), 44100, 441)?;
    let output = Arc::new(audio::mock::Device::get("mock-audio"));
    let mut samples = SampleCache::new(output.clone());
    samples.load_assets(assets.path());

    assert_eq!(
        None,
        fixture
            .keypad
            .await_keypress_with_feedback(Duration::from_secs(1), &fixture.lamps, &samples)
    );
    assert!(output.played().is_empty());
    assert_eq!(0, fixture.device.all_on_count());

    fixture.device.press(KeySymbol::Blue, 10);
    assert_eq!(
        Some(KeySymbol::Blue),
        fixture
            .keypad
            .await_keypress_with_feedback(Duration::from_secs(1), &fixture.lamps, &samples)
    );
    assert_eq!(vec!["Press.wav"], output.played());
    assert_eq!(1, fixture.device.all_on_count());
    assert!(fixture.device.all_off());
    assert_eq!(0, fixture.device.pending_reads());
    Ok(())
}
