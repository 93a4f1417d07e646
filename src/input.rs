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
use std::sync::Arc;

use tracing::debug;

use crate::{board::Board, letter::Letter, pads::PadId};

/// Routes pointer and physical key input to pads.
///
/// Pointer and keyboard holds are tracked separately; both are gated on the
/// board's busy flag for activation, while releases always go through so a pad
/// can never be left lit.
pub struct InputRouter {
    board: Arc<Board>,
}

impl InputRouter {
    pub fn new(board: Arc<Board>) -> InputRouter {
        InputRouter { board }
    }

    /// Pointer pressed on a pad. Returns true if the pad was played.
    pub fn pointer_down(&self, id: PadId) -> bool {
        if self.board.is_busy() {
            debug!(pad = id.index(), "Busy, ignoring pointer press.");
            return false;
        }
        let Some(pad) = self.board.pad(id) else {
            return false;
        };
        // Duplicate press events while already held are ignored.
        if !self.board.hold_pointer(id) {
            return false;
        }

        if let Some(visual) = self.board.visual(id) {
            visual.activate();
        }
        self.board.port().trigger(&pad);
        true
    }

    /// Pointer released over the pad.
    pub fn pointer_up(&self, id: PadId) {
        self.board.release_pointer(id);
        if let Some(visual) = self.board.visual(id) {
            visual.deactivate();
        }
    }

    /// Pointer left the pad, which counts as a release.
    pub fn pointer_leave(&self, id: PadId) {
        self.pointer_up(id);
    }

    /// Physical key pressed. Returns true if a pad was played.
    pub fn key_down(&self, code: Option<&str>, key: &str) -> bool {
        if self.board.is_busy() {
            debug!(key, "Busy, ignoring key press.");
            return false;
        }
        let Some(letter) = Letter::from_key_event(code, key) else {
            return false;
        };
        // OS key repeat arrives as more key-downs while the key is held.
        if self.board.is_key_held(letter) {
            return false;
        }
        let Some(pad) = self.board.pad_for(letter) else {
            debug!(letter = %letter, "Key is not mapped to a pad.");
            return false;
        };
        if !self.board.hold_key(letter) {
            return false;
        }

        if let Some(visual) = self.board.visual(pad.id()) {
            visual.activate();
        }
        self.board.port().trigger(&pad);
        true
    }

    /// Physical key released. Processed even while busy.
    pub fn key_up(&self, code: Option<&str>, key: &str) {
        let Some(letter) = Letter::from_key_event(code, key) else {
            return;
        };
        self.board.release_key(letter);
        if let Some(visual) = self.board.element(letter) {
            visual.deactivate();
        }
    }
}
