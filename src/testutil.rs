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
mod audio;
mod polling;

use std::sync::Arc;

use parking_lot::Mutex;

pub use audio::write_wav;
pub use polling::eventually_async;

use crate::{
    announcer::Announcer,
    audio::mock,
    board::Board,
    pads::{self, SoundRegistry},
};

/// The default kit: seven pads on the home row.
pub const KIT: [(&str, char); 7] = [
    ("C4", 'A'),
    ("D4", 'S'),
    ("F4", 'D'),
    ("A4", 'F'),
    ("B4", 'G'),
    ("C5", 'H'),
    ("C6", 'J'),
];

/// Records everything announced, in order.
#[derive(Default)]
pub struct RecordingAnnouncer {
    messages: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, text: &str) {
        self.messages.lock().push(text.to_string());
    }
}

/// Builds a board over the default kit, backed by a mock device.
pub fn board() -> (Arc<Board>, mock::Device, Arc<RecordingAnnouncer>) {
    let registry =
        SoundRegistry::new(pads::test::definitions(&KIT)).expect("failed to build registry");
    let device = mock::Device::get("mock-device");
    let announcer = Arc::new(RecordingAnnouncer::default());
    let board = Board::new(registry, Arc::new(device.clone()), announcer.clone());
    (Arc::new(board), device, announcer)
}
