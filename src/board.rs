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

//! The process-scoped state shared by every input channel.
//!
//! Pointer input, keyboard input, the mapping editor and the sequence runner all
//! hold an `Arc<Board>`. Locks here are never held across an await point.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::{
    announcer::{self, Announcer, TRANSIENT_MESSAGE_DURATION},
    audio::PlaybackPort,
    letter::Letter,
    pads::{PadId, SoundPad, SoundRegistry},
    visual::PadVisual,
};

/// Where keyboard focus currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    /// The board itself; physical keys play pads.
    Root,
    /// The mapping editor's input.
    Editor,
}

/// The sequence text field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceField {
    pub value: String,
    pub disabled: bool,
}

pub struct Board {
    registry: RwLock<SoundRegistry>,
    visuals: Vec<PadVisual>,
    port: Arc<dyn PlaybackPort>,
    announcer: Arc<dyn Announcer>,
    /// Letters currently held down on the physical keyboard.
    held_keys: Mutex<HashSet<Letter>>,
    /// Whether each pad is held by the pointer, indexed by pad.
    pointer_held: Mutex<Vec<bool>>,
    /// True only while a sequence runs.
    busy: AtomicBool,
    sequence_field: Mutex<SequenceField>,
    focus: Mutex<Focus>,
}

impl Board {
    /// Creates a board with everything released, idle, and focused on the root.
    pub fn new(
        registry: SoundRegistry,
        port: Arc<dyn PlaybackPort>,
        announcer: Arc<dyn Announcer>,
    ) -> Board {
        let visuals: Vec<PadVisual> = registry
            .pads()
            .iter()
            .map(|pad| PadVisual::new(pad.note(), pad.letter()))
            .collect();
        let pointer_held = vec![false; registry.len()];
        info!(pads = visuals.len(), device = %port, "Board ready.");

        Board {
            registry: RwLock::new(registry),
            visuals,
            port,
            announcer,
            held_keys: Mutex::new(HashSet::new()),
            pointer_held: Mutex::new(pointer_held),
            busy: AtomicBool::new(false),
            sequence_field: Mutex::new(SequenceField::default()),
            focus: Mutex::new(Focus::Root),
        }
    }

    /// Read access to the pads. Don't hold this across an await.
    pub fn registry(&self) -> RwLockReadGuard<'_, SoundRegistry> {
        self.registry.read()
    }

    /// Returns a snapshot of the pad bound to the letter.
    pub fn pad_for(&self, letter: Letter) -> Option<SoundPad> {
        self.registry.read().get_by_letter(letter).cloned()
    }

    pub fn pad(&self, id: PadId) -> Option<SoundPad> {
        self.registry.read().get(id).cloned()
    }

    pub fn pad_by_note(&self, note: &str) -> Option<SoundPad> {
        self.registry.read().get_by_note(note).cloned()
    }

    pub fn visual(&self, id: PadId) -> Option<&PadVisual> {
        self.visuals.get(id.index())
    }

    /// Returns the visual of the pad bound to the letter.
    pub fn element(&self, letter: Letter) -> Option<&PadVisual> {
        let id = self.registry.read().get_by_letter(letter).map(SoundPad::id)?;
        self.visual(id)
    }

    pub fn visuals(&self) -> &[PadVisual] {
        &self.visuals
    }

    pub fn port(&self) -> &Arc<dyn PlaybackPort> {
        &self.port
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Marks the board busy and locks the sequence field. Returns false if the
    /// board was already busy.
    pub(crate) fn try_begin_busy(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.sequence_field.lock().disabled = true;
        true
    }

    /// Clears the busy flag and re-enables the sequence field.
    pub(crate) fn end_busy(&self) {
        self.sequence_field.lock().disabled = false;
        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn focus(&self) -> Focus {
        *self.focus.lock()
    }

    pub(crate) fn set_focus(&self, focus: Focus) {
        *self.focus.lock() = focus;
    }

    pub fn sequence_field(&self) -> SequenceField {
        self.sequence_field.lock().clone()
    }

    pub(crate) fn with_sequence_field<R>(&self, f: impl FnOnce(&mut SequenceField) -> R) -> R {
        f(&mut self.sequence_field.lock())
    }

    /// The play control is enabled only with something to play and nothing playing.
    pub fn can_play(&self) -> bool {
        !self.is_busy() && !self.sequence_field.lock().value.is_empty()
    }

    pub fn is_key_held(&self, letter: Letter) -> bool {
        self.held_keys.lock().contains(&letter)
    }

    /// Adds the letter to the held set, returning false if it was already held.
    pub(crate) fn hold_key(&self, letter: Letter) -> bool {
        self.held_keys.lock().insert(letter)
    }

    pub(crate) fn release_key(&self, letter: Letter) {
        self.held_keys.lock().remove(&letter);
    }

    pub fn is_pointer_held(&self, id: PadId) -> bool {
        self.pointer_held
            .lock()
            .get(id.index())
            .copied()
            .unwrap_or(false)
    }

    /// Marks the pad pointer-held, returning false if it already was.
    pub(crate) fn hold_pointer(&self, id: PadId) -> bool {
        let mut held = self.pointer_held.lock();
        match held.get_mut(id.index()) {
            Some(held) if !*held => {
                *held = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn release_pointer(&self, id: PadId) {
        if let Some(held) = self.pointer_held.lock().get_mut(id.index()) {
            *held = false;
        }
    }

    /// Rebinds a pad and notifies everything that depends on the mapping: the pad
    /// label, the held-key set and the status line.
    pub(crate) fn commit_letter(self: &Arc<Self>, id: PadId, letter: Letter) {
        let (note, released) = {
            let mut registry = self.registry.write();
            // Held letters are resolved against the old mapping, before it changes.
            let released = self.release_held_keys_in(&registry);
            registry.set_letter(id, letter);
            (registry.get(id).map(|pad| pad.note().to_string()), released)
        };
        let Some(note) = note else {
            return;
        };

        if let Some(visual) = self.visual(id) {
            visual.update_key_visual(letter);
        }
        info!(note = %note, letter = %letter, released_held_keys = released, "Mapping changed.");

        self.announcer
            .announce(&announcer::remap_message(&note, letter));
        self.schedule_mapping_refresh();
    }

    /// A confirm that kept the pad's letter. Nothing is rebound, but held keys
    /// are still released and the status line is refreshed.
    pub(crate) fn mapping_confirmed(&self) {
        let released = self.release_held_keys_in(&self.registry.read());
        debug!(released_held_keys = released, "Mapping confirmed unchanged.");
        self.announce_mapping();
    }

    /// Drops every held key and turns off the pads they lit, unless the pointer
    /// still holds the pad. Returns how many keys were released.
    fn release_held_keys_in(&self, registry: &SoundRegistry) -> usize {
        let held: Vec<Letter> = self.held_keys.lock().drain().collect();
        for letter in &held {
            let Some(id) = registry.get_by_letter(*letter).map(SoundPad::id) else {
                continue;
            };
            if self.is_pointer_held(id) {
                continue;
            }
            if let Some(visual) = self.visual(id) {
                visual.deactivate();
            }
        }
        held.len()
    }

    /// Announces the full mapping.
    pub fn announce_mapping(&self) {
        let text = self.registry.read().mapping_text();
        self.announcer.announce(&text);
    }

    /// Replaces the transient remap message with the full mapping on the next tick.
    fn schedule_mapping_refresh(self: &Arc<Self>) {
        match Handle::try_current() {
            Ok(handle) => {
                let board = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(TRANSIENT_MESSAGE_DURATION).await;
                    board.announce_mapping();
                });
            }
            Err(_) => {
                debug!("No runtime, refreshing mapping text immediately.");
                self.announce_mapping();
            }
        }
    }
}
