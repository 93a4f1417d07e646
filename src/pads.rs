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
    path::{Path, PathBuf},
};

use crate::letter::Letter;

/// Headroom multiplier for the sequence length relative to the pad count.
const SEQUENCE_LENGTH_MULTIPLIER: usize = 2;

/// Index of a pad within the registry. Pads are never removed, so the index is
/// stable for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PadId(usize);

impl PadId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The audio resource backing a pad. Opaque to everything but the playback port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundSource {
    path: PathBuf,
}

impl SoundSource {
    pub fn new(path: PathBuf) -> SoundSource {
        SoundSource { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A static pad definition used to build the registry.
#[derive(Clone, Debug)]
pub struct PadDefinition {
    pub note: String,
    pub source: SoundSource,
    pub letter: Letter,
}

/// A playable sound pad.
#[derive(Clone, Debug)]
pub struct SoundPad {
    id: PadId,
    note: String,
    source: SoundSource,
    letter: Letter,
}

impl SoundPad {
    pub fn id(&self) -> PadId {
        self.id
    }

    /// The note identity, e.g. `C4`.
    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    /// The current trigger letter.
    pub fn letter(&self) -> Letter {
        self.letter
    }
}

impl fmt::Display for SoundPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Key={}) ({})",
            self.note,
            self.letter,
            self.source.path.display()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("at least one pad must be defined")]
    Empty,

    #[error("key {letter} is assigned to both {first} and {second}")]
    DuplicateLetter {
        letter: Letter,
        first: String,
        second: String,
    },
}

/// Owns the fixed set of pads and the letter index over them.
pub struct SoundRegistry {
    pads: Vec<SoundPad>,
    by_letter: HashMap<Letter, PadId>,
}

impl SoundRegistry {
    /// Creates a registry from pad definitions. Letters must already be distinct.
    pub fn new(definitions: Vec<PadDefinition>) -> Result<SoundRegistry, RegistryError> {
        if definitions.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut pads: Vec<SoundPad> = Vec::with_capacity(definitions.len());
        let mut by_letter = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.into_iter().enumerate() {
            let id = PadId(index);
            if let Some(existing) = by_letter.insert(definition.letter, id) {
                return Err(RegistryError::DuplicateLetter {
                    letter: definition.letter,
                    first: pads[existing.0].note.clone(),
                    second: definition.note,
                });
            }
            pads.push(SoundPad {
                id,
                note: definition.note,
                source: definition.source,
                letter: definition.letter,
            });
        }

        Ok(SoundRegistry { pads, by_letter })
    }

    /// Returns the pad currently bound to the given letter.
    pub fn get_by_letter(&self, letter: Letter) -> Option<&SoundPad> {
        self.by_letter.get(&letter).map(|id| &self.pads[id.0])
    }

    pub fn get(&self, id: PadId) -> Option<&SoundPad> {
        self.pads.get(id.0)
    }

    /// Finds a pad by its note identity.
    pub fn get_by_note(&self, note: &str) -> Option<&SoundPad> {
        self.pads.iter().find(|pad| pad.note == note)
    }

    /// Rebinds a pad to a new letter. The pad and the index change together under
    /// the same borrow, so readers never see one without the other. Uniqueness is
    /// the caller's responsibility; if another pad holds the letter its index
    /// entry is overwritten. Returns the previous letter.
    pub fn set_letter(&mut self, id: PadId, letter: Letter) -> Option<Letter> {
        let pad = self.pads.get_mut(id.0)?;
        let previous = pad.letter;
        if self.by_letter.get(&previous) == Some(&id) {
            self.by_letter.remove(&previous);
        }
        pad.letter = letter;
        self.by_letter.insert(letter, id);
        Some(previous)
    }

    /// Returns true if a pad other than `exclude` holds the letter.
    pub fn is_taken(&self, letter: Letter, exclude: PadId) -> bool {
        self.by_letter.get(&letter).is_some_and(|id| *id != exclude)
    }

    pub fn pads(&self) -> &[SoundPad] {
        &self.pads
    }

    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    /// Returns true if the letter is bound to some pad.
    pub fn is_mapped(&self, letter: Letter) -> bool {
        self.by_letter.contains_key(&letter)
    }

    /// The longest sequence the board accepts.
    pub fn max_sequence_len(&self) -> usize {
        self.pads.len() * SEQUENCE_LENGTH_MULTIPLIER
    }

    /// The full mapping status line, e.g. `Keys: A S → C4 D4`.
    pub fn mapping_text(&self) -> String {
        let keys = self
            .pads
            .iter()
            .map(|pad| pad.letter.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        let notes = self
            .pads
            .iter()
            .map(|pad| pad.note.as_str())
            .collect::<Vec<&str>>()
            .join(" ");
        format!("Keys: {} → {}", keys, notes)
    }
}
