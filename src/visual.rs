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
    fmt,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

use crate::letter::Letter;

/// The visual state of a single pad: whether it is lit and which letter it shows.
pub struct PadVisual {
    note: String,
    active: AtomicBool,
    label: AtomicU8,
}

impl PadVisual {
    pub fn new(note: &str, letter: Letter) -> PadVisual {
        PadVisual {
            note: note.to_string(),
            active: AtomicBool::new(false),
            label: AtomicU8::new(letter.as_char() as u8),
        }
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Updates the displayed trigger letter.
    pub fn update_key_visual(&self, letter: Letter) {
        self.label.store(letter.as_char() as u8, Ordering::Relaxed);
    }

    /// The letter currently displayed on the pad.
    pub fn label(&self) -> char {
        self.label.load(Ordering::Relaxed) as char
    }
}

impl fmt::Display for PadVisual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}{} {}]",
            if self.is_active() { "*" } else { "" },
            self.label(),
            self.note
        )
    }
}
