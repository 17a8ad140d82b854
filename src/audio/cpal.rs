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
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info, span, Level};

use crate::{
    audio::{Output, Playback},
    playsync::CancelHandle,
    samples::AudioSample,
};

/// Extra time given to the stream beyond the sample length before giving up on the drain.
const DRAIN_MARGIN: Duration = Duration::from_millis(500);

/// Lets the last callback buffer reach the speaker before the stream is torn down.
const TAIL: Duration = Duration::from_millis(50);

/// A small wrapper around a cpal::Device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: Arc<cpal::Device>,
}

impl Device {
    /// Gets the output device with the given name. "default" picks the host's default output.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        let host = cpal::default_host();
        let device = if name == "default" {
            host.default_output_device()
                .ok_or("no default audio output device")?
        } else {
            host.output_devices()?
                .find(|device| device.name().is_ok_and(|n| n == name))
                .ok_or(format!("no audio output device named {}", name))?
        };

        let name = device.name()?;
        info!(
            device = name,
            host = host.id().name(),
            "Using audio output."
        );
        Ok(Device {
            name,
            host_id: host.id(),
            device: Arc::new(device),
        })
    }
}

impl Output for Device {
    fn play(&self, sample: &AudioSample) -> Result<Playback, Box<dyn Error>> {
        let finished = Arc::new(AtomicBool::new(false));
        let cancel_handle = CancelHandle::new();

        let device = self.device.clone();
        let sample = sample.clone();
        let render_finished = finished.clone();
        let render_cancel = cancel_handle.clone();
        // The stream has to be created and dropped on the same thread.
        thread::spawn(move || {
            let span = span!(Level::INFO, "play sample (cpal)");
            let _enter = span.enter();

            if let Err(e) = render(&device, &sample, &render_cancel) {
                error!(sample = sample.name(), err = %e, "Unable to play sample.");
            }
            render_finished.store(true, Ordering::Release);
            render_cancel.notify();
        });

        Ok(Playback::new(finished, cancel_handle))
    }
}

/// Formats the stream can be fed in, most preferred first.
const SAMPLE_FORMATS: [cpal::SampleFormat; 3] = [
    cpal::SampleFormat::F32,
    cpal::SampleFormat::I32,
    cpal::SampleFormat::I16,
];

/// Picks the sample format to open a stream with for the given channel count and rate, if the
/// device supports one we can convert to.
fn choose_sample_format(
    ranges: impl IntoIterator<Item = cpal::SupportedStreamConfigRange>,
    channels: u16,
    sample_rate: u32,
) -> Option<cpal::SampleFormat> {
    let formats: Vec<cpal::SampleFormat> = ranges
        .into_iter()
        .filter(|range| {
            range.channels() == channels
                && range.min_sample_rate().0 <= sample_rate
                && sample_rate <= range.max_sample_rate().0
        })
        .map(|range| range.sample_format())
        .collect();
    SAMPLE_FORMATS
        .into_iter()
        .find(|format| formats.contains(format))
}

/// Streams the sample out and blocks until it has drained.
fn render(
    device: &cpal::Device,
    sample: &AudioSample,
    cancel_handle: &CancelHandle,
) -> Result<(), Box<dyn Error>> {
    let format = choose_sample_format(
        device.supported_output_configs()?,
        sample.channel_count(),
        sample.sample_rate(),
    )
    .ok_or_else(|| {
        format!(
            "output doesn't support {} channel(s) at {} Hz as f32, i32 or i16",
            sample.channel_count(),
            sample.sample_rate()
        )
    })?;
    let config = cpal::StreamConfig {
        channels: sample.channel_count(),
        sample_rate: cpal::SampleRate(sample.sample_rate()),
        buffer_size: cpal::BufferSize::Default,
    };

    let drained = Arc::new(AtomicBool::new(false));
    let stream = match format {
        cpal::SampleFormat::I32 => {
            build_stream::<i32>(device, &config, sample, &drained, cancel_handle)?
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(device, &config, sample, &drained, cancel_handle)?
        }
        _ => build_stream::<f32>(device, &config, sample, &drained, cancel_handle)?,
    };
    stream.play()?;
    debug!(
        sample = sample.name(),
        format = ?format,
        duration = ?sample.duration(),
        "Sample started."
    );

    if !cancel_handle.wait_timeout(drained, sample.duration() + DRAIN_MARGIN) {
        error!(sample = sample.name(), "Audio stream never drained.");
    }
    thread::sleep(TAIL);

    Ok(())
}

/// Builds an output stream that converts the sample's frames to `T` and pads with silence once
/// they run out.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample: &AudioSample,
    drained: &Arc<AtomicBool>,
    cancel_handle: &CancelHandle,
) -> Result<cpal::Stream, Box<dyn Error>>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let data = sample.data();
    let drained = drained.clone();
    let cancel_handle = cancel_handle.clone();
    let mut position = 0;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            let count = (data.len() - position).min(output.len());
            for (out, value) in output.iter_mut().zip(&data[position..position + count]) {
                *out = T::from_sample(*value);
            }
            output[count..].fill(T::EQUILIBRIUM);
            position += count;
            if position >= data.len() && !drained.swap(true, Ordering::AcqRel) {
                cancel_handle.notify();
            }
        },
        |err| error!(err = %err, "Audio stream error."),
        None,
    )?;
    Ok(stream)
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.host_id.name())
    }
}

#[cfg(test)]
mod test {
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize, SupportedStreamConfigRange};

    use super::choose_sample_format;

    fn range(
        channels: u16,
        min: u32,
        max: u32,
        format: SampleFormat,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn test_choose_sample_format() {
        let ranges = vec![
            range(2, 8000, 48000, SampleFormat::I16),
            range(2, 44100, 44100, SampleFormat::I32),
            range(1, 8000, 96000, SampleFormat::F32),
        ];

        assert_eq!(
            Some(SampleFormat::I32),
            choose_sample_format(ranges.clone(), 2, 44100)
        );
        assert_eq!(
            Some(SampleFormat::I16),
            choose_sample_format(ranges.clone(), 2, 48000)
        );
        assert_eq!(
            Some(SampleFormat::F32),
            choose_sample_format(ranges.clone(), 1, 48000)
        );
        // Nothing takes four channels or stereo at 96kHz.
        assert_eq!(None, choose_sample_format(ranges.clone(), 4, 44100));
        assert_eq!(None, choose_sample_format(ranges, 2, 96000));
    }

    #[test]
    fn test_choose_sample_format_skips_unconvertible() {
        let ranges = vec![
            range(2, 8000, 48000, SampleFormat::U8),
            range(2, 8000, 48000, SampleFormat::F64),
        ];
        assert_eq!(None, choose_sample_format(ranges, 2, 44100));
    }
}
