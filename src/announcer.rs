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
use std::time::Duration;

use tracing::info;

use crate::letter::Letter;

/// How long a transient remap message stays up before the full mapping replaces it.
pub const TRANSIENT_MESSAGE_DURATION: Duration = Duration::from_millis(10);

/// Receives status text for display.
pub trait Announcer: Send + Sync + 'static {
    fn announce(&self, text: &str);
}

/// The one-line message shown right after a successful remap.
pub fn remap_message(note: &str, letter: Letter) -> String {
    format!("Key for {} changed to {}.", note, letter)
}

/// Writes status text to the log and to stdout.
pub struct ConsoleAnnouncer {}

impl ConsoleAnnouncer {
    pub fn new() -> ConsoleAnnouncer {
        ConsoleAnnouncer {}
    }
}

impl Default for ConsoleAnnouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Announcer for ConsoleAnnouncer {
    fn announce(&self, text: &str) {
        info!(status = text, "Status.");
        println!("{}", text);
    }
}
