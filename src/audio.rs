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
use std::{fmt, sync::Arc, time::Duration};

use tracing::debug;

use crate::config;
use crate::pads::SoundPad;

pub mod cpal;
pub mod error;
pub mod loader;
pub mod mock;

pub use error::PlaybackError;

/// Plays pad sounds. Implementations wrap the actual audio output.
pub trait PlaybackPort: fmt::Display + Send + Sync + 'static {
    /// Rewinds the pad's sound to the start and plays it.
    fn start(&self, pad: &SoundPad) -> Result<(), PlaybackError>;

    /// Stops the pad's sound and rewinds it.
    fn stop(&self, pad: &SoundPad) -> Result<(), PlaybackError>;

    /// Fire-and-forget one-shot. A sound that can't start is silently skipped.
    fn trigger(&self, pad: &SoundPad) {
        if let Err(e) = self.start(pad) {
            debug!(note = pad.note(), err = %e, "Playback unavailable, ignoring.");
        }
    }
}

/// Plays the pad for roughly `duration`, then stops and rewinds it whether or not
/// the sound finished on its own. Only a failure to stop is returned.
pub async fn trigger_timed(
    port: &dyn PlaybackPort,
    pad: &SoundPad,
    duration: Duration,
) -> Result<(), PlaybackError> {
    port.trigger(pad);
    tokio::time::sleep(duration).await;
    port.stop(pad)
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, PlaybackError> {
    cpal::Device::list()
}

/// Gets the playback port for the configured device, preloading the pads' sounds.
pub fn get_device(
    config: &config::Audio,
    pads: &[SoundPad],
) -> Result<Arc<dyn PlaybackPort>, PlaybackError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config, pads)?))
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use crate::{
        letter::Letter,
        pads::{PadDefinition, SoundRegistry, SoundSource},
    };

    use super::*;

    fn registry() -> SoundRegistry {
        SoundRegistry::new(vec![PadDefinition {
            note: "C4".to_string(),
            source: SoundSource::new(PathBuf::from("sounds/C4.wav")),
            letter: Letter::new('A').expect("valid letter"),
        }])
        .expect("valid registry")
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_timed_stops_after_duration() -> Result<(), PlaybackError> {
        let registry = registry();
        let pad = &registry.pads()[0];
        let device = mock::Device::get("mock-device");

        let start = tokio::time::Instant::now();
        trigger_timed(&device, pad, Duration::from_millis(350)).await?;

        assert!(start.elapsed() >= Duration::from_millis(350));
        assert_eq!(
            vec![
                mock::Event::Start("C4".to_string()),
                mock::Event::Stop("C4".to_string())
            ],
            device.events()
        );
        assert!(!device.is_playing("C4"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_timed_swallows_start_failure() {
        let registry = registry();
        let pad = &registry.pads()[0];
        let device = mock::Device::get("mock-device");
        device.fail_start(true);

        assert!(trigger_timed(&device, pad, Duration::from_millis(10))
            .await
            .is_ok());
        assert_eq!(vec![mock::Event::Stop("C4".to_string())], device.events());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_timed_reports_stop_failure() {
        let registry = registry();
        let pad = &registry.pads()[0];
        let device = mock::Device::get("mock-device");
        device.fail_stop(true);

        assert!(matches!(
            trigger_timed(&device, pad, Duration::from_millis(10)).await,
            Err(PlaybackError::Rewind { .. })
        ));
    }

    #[test]
    fn test_get_mock_device() -> Result<(), PlaybackError> {
        let device = get_device(&config::Audio::new("mock-device"), &[])?;
        assert_eq!("mock-device (Mock)", device.to_string());
        Ok(())
    }
}
