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
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use super::{PlaybackError, PlaybackPort};
use crate::pads::SoundPad;

/// Something the mock device was asked to do, keyed by note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Start(String),
    Stop(String),
}

/// A mock device. Doesn't actually play anything, but records what it was asked to do.
#[derive(Clone)]
pub struct Device {
    name: String,
    events: Arc<Mutex<Vec<Event>>>,
    playing: Arc<Mutex<HashSet<String>>>,
    fail_start: Arc<AtomicBool>,
    fail_stop: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            events: Arc::new(Mutex::new(Vec::new())),
            playing: Arc::new(Mutex::new(HashSet::new())),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every start fail, as if the environment refused to play audio.
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Makes every stop fail.
    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::Relaxed);
    }

    /// Returns every successful start and stop so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Returns the number of times the note was started.
    pub fn starts(&self, note: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, Event::Start(n) if n == note))
            .count()
    }

    /// Returns true if the note was started and not stopped since.
    pub fn is_playing(&self, note: &str) -> bool {
        self.playing.lock().contains(note)
    }
}

impl PlaybackPort for Device {
    fn start(&self, pad: &SoundPad) -> Result<(), PlaybackError> {
        if self.fail_start.load(Ordering::Relaxed) {
            return Err(PlaybackError::Unavailable(pad.note().to_string()));
        }

        info!(device = %self.name, note = pad.note(), "Playing pad.");
        self.playing.lock().insert(pad.note().to_string());
        self.events.lock().push(Event::Start(pad.note().to_string()));
        Ok(())
    }

    fn stop(&self, pad: &SoundPad) -> Result<(), PlaybackError> {
        if self.fail_stop.load(Ordering::Relaxed) {
            return Err(PlaybackError::Rewind {
                note: pad.note().to_string(),
                message: "mock stop failure".to_string(),
            });
        }

        self.playing.lock().remove(pad.note());
        self.events.lock().push(Event::Stop(pad.note().to_string()));
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
