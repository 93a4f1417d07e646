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
    collections::HashMap,
    fmt,
    path::PathBuf,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{error, info, span, Level};

use super::loader::{LoadedSample, SampleLoader};
use super::{PlaybackError, PlaybackPort};
use crate::{
    config,
    pads::{PadId, SoundPad},
};

/// Name that selects the host's default output device.
const DEFAULT_DEVICE: &str = "default";

/// A sound currently playing from a pad. Each pad has at most one.
struct Voice {
    data: Arc<Vec<f32>>,
    channel_count: usize,
    /// Next frame to play.
    position: usize,
}

impl Voice {
    fn new(sample: &LoadedSample) -> Voice {
        Voice {
            data: sample.data(),
            channel_count: sample.channel_count().max(1) as usize,
            position: 0,
        }
    }

    fn is_finished(&self) -> bool {
        self.position * self.channel_count >= self.data.len()
    }

    /// Adds one output frame of this voice into `frame`. Mono sounds are spread to
    /// every output channel; extra output channels reuse the last source channel.
    fn mix_frame(&mut self, frame: &mut [f32]) {
        let base = self.position * self.channel_count;
        for (channel, out) in frame.iter_mut().enumerate() {
            let source_channel = channel.min(self.channel_count - 1);
            *out += self.data.get(base + source_channel).copied().unwrap_or(0.0);
        }
        self.position += 1;
    }
}

type Voices = Arc<Mutex<HashMap<PadId, Voice>>>;

/// A cpal output device playing preloaded pad sounds.
pub struct Device {
    name: String,
    channels: u16,
    sample_rate: u32,
    samples: HashMap<PathBuf, LoadedSample>,
    voices: Voices,
    /// Dropping this stops the output thread.
    _shutdown: mpsc::Sender<()>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) (SampleRate={})",
            self.name, self.channels, self.sample_rate
        )
    }
}

impl Device {
    /// Lists the names of output devices across all hosts.
    pub fn list() -> Result<Vec<String>, PlaybackError> {
        // Suppress noisy backend output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut names: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(device_error)?;
            let devices = match host.output_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in devices {
                if let Ok(name) = device.name() {
                    names.push(format!("{} ({})", name, host_id.name()));
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Opens the configured device and decodes every pad's sound at its sample rate.
    pub fn get(config: &config::Audio, pads: &[SoundPad]) -> Result<Device, PlaybackError> {
        let name = config.device();
        let host = cpal::default_host();
        let device = if name == DEFAULT_DEVICE {
            host.default_output_device()
        } else {
            host.output_devices()
                .map_err(device_error)?
                .find(|device| device.name().is_ok_and(|n| n.trim() == name))
        }
        .ok_or_else(|| PlaybackError::Device(format!("no device found with name {}", name)))?;

        let supported = device.default_output_config().map_err(device_error)?;
        let mut stream_config = supported.config();
        if let Some(sample_rate) = config.sample_rate() {
            stream_config.sample_rate = cpal::SampleRate(sample_rate);
        }
        let channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate.0;

        let mut loader = SampleLoader::new(sample_rate);
        let mut samples = HashMap::new();
        for pad in pads {
            let path = pad.source().path();
            samples.insert(path.to_path_buf(), loader.load(path)?);
        }

        let voices: Voices = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), PlaybackError>>();
        {
            let voices = voices.clone();
            // cpal streams aren't Send everywhere, so the stream lives on its own thread.
            thread::spawn(move || {
                let span = span!(Level::INFO, "cpal output");
                let _enter = span.enter();

                let stream = device.build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        mix_into(&voices, data, channels as usize);
                    },
                    |err| error!("CPAL output stream error: {}", err),
                    None,
                );
                let stream = match stream.map_err(device_error).and_then(|stream| {
                    stream.play().map_err(device_error)?;
                    Ok(stream)
                }) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                info!("CPAL output stream started");
                let _ = ready_tx.send(Ok(()));
                // Blocks until the device is dropped.
                let _ = shutdown_rx.recv();
                drop(stream);
            });
        }

        ready_rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| PlaybackError::Device("output stream never started".to_string()))??;

        Ok(Device {
            name: name.to_string(),
            channels,
            sample_rate,
            samples,
            voices,
            _shutdown: shutdown_tx,
        })
    }
}

/// Mixes all playing voices into an interleaved output buffer, dropping finished ones.
fn mix_into(voices: &Voices, data: &mut [f32], channels: usize) {
    data.fill(0.0);
    // Never block the audio callback; a contended lock yields one silent buffer.
    let Some(mut voices) = voices.try_lock() else {
        return;
    };

    for frame in data.chunks_mut(channels.max(1)) {
        for voice in voices.values_mut() {
            if !voice.is_finished() {
                voice.mix_frame(frame);
            }
        }
    }
    voices.retain(|_, voice| !voice.is_finished());

    for sample in data.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

fn device_error<E: fmt::Display>(e: E) -> PlaybackError {
    PlaybackError::Device(e.to_string())
}

impl PlaybackPort for Device {
    fn start(&self, pad: &SoundPad) -> Result<(), PlaybackError> {
        let sample = self
            .samples
            .get(pad.source().path())
            .ok_or_else(|| PlaybackError::UnknownSource(pad.source().path().to_path_buf()))?;

        // Replacing the voice rewinds a pad that is still sounding.
        self.voices.lock().insert(pad.id(), Voice::new(sample));
        Ok(())
    }

    fn stop(&self, pad: &SoundPad) -> Result<(), PlaybackError> {
        self.voices.lock().remove(&pad.id());
        Ok(())
    }
}
