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
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use crate::letter::Letter;
use crate::pads::{PadDefinition, SoundSource};

/// Keys handed out by position to pads that don't name their own.
pub const DEFAULT_KEYS: [char; 7] = ['A', 'S', 'D', 'F', 'G', 'H', 'J'];

/// How long each step of a sequence plays.
pub const DEFAULT_STEP_DURATION: Duration = Duration::from_millis(350);

/// The pads used when the config doesn't list any.
const DEFAULT_KIT: [(&str, &str); 7] = [
    ("C4", "sounds/C4vL.wav"),
    ("D4", "sounds/D4vH.wav"),
    ("F4", "sounds/F4vH.wav"),
    ("A4", "sounds/A4vH.wav"),
    ("B4", "sounds/B4vH.wav"),
    ("C5", "sounds/C5vH.wav"),
    ("C6", "sounds/C6vH.wav"),
];

/// A YAML representation of a single pad.
#[derive(Deserialize, Clone, Debug)]
pub struct Pad {
    /// The note identity shown on the pad.
    note: String,
    /// The sound file, relative to the config file.
    file: String,
    /// The starting trigger key.
    key: Option<String>,
}

impl Pad {
    pub fn new(note: &str, file: &str, key: Option<&str>) -> Pad {
        Pad {
            note: note.to_string(),
            file: file.to_string(),
            key: key.map(str::to_string),
        }
    }
}

/// The configuration for the pad board.
#[derive(Deserialize, Clone, Debug)]
pub struct Board {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,
    /// How long each sequence step plays, e.g. "350ms".
    step_duration: Option<String>,
    /// The pads. When absent, the default kit is used.
    pads: Option<Vec<Pad>>,
}

impl Board {
    /// Parse a board from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Board, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Board>()?)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the sequence step duration (default: 350ms).
    pub fn step_duration(&self) -> Result<Duration, ConfigError> {
        match &self.step_duration {
            Some(step_duration) => Ok(DurationString::from_string(step_duration.clone())
                .map_err(|e| ConfigError::InvalidDuration(format!("{}: {}", step_duration, e)))?
                .into()),
            None => Ok(DEFAULT_STEP_DURATION),
        }
    }

    /// Resolves the pads into definitions: files relative to `base_path`, missing
    /// keys filled from [`DEFAULT_KEYS`], and every key checked to be a distinct letter.
    pub fn pad_definitions(&self, base_path: &Path) -> Result<Vec<PadDefinition>, ConfigError> {
        let pads: Vec<Pad> = match &self.pads {
            Some(pads) if pads.is_empty() => return Err(ConfigError::NoPads),
            Some(pads) => pads.clone(),
            None => DEFAULT_KIT
                .iter()
                .map(|(note, file)| Pad::new(note, file, None))
                .collect(),
        };

        let mut seen: HashMap<Letter, String> = HashMap::new();
        let mut definitions = Vec::with_capacity(pads.len());
        for (index, pad) in pads.into_iter().enumerate() {
            let letter = match &pad.key {
                Some(key) => key.parse::<Letter>().map_err(|_| ConfigError::InvalidKey {
                    note: pad.note.clone(),
                    key: key.clone(),
                })?,
                None => DEFAULT_KEYS
                    .get(index)
                    .and_then(|c| Letter::new(*c))
                    .ok_or_else(|| ConfigError::MissingKey(pad.note.clone()))?,
            };

            if let Some(first) = seen.insert(letter, pad.note.clone()) {
                return Err(ConfigError::DuplicateKey {
                    key: letter.to_string(),
                    first,
                    second: pad.note,
                });
            }

            let file = PathBuf::from(&pad.file);
            let path = if file.is_absolute() {
                file
            } else {
                base_path.join(file)
            };
            definitions.push(PadDefinition {
                note: pad.note,
                source: SoundSource::new(path),
                letter,
            });
        }

        Ok(definitions)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board {
            audio: Audio::default(),
            step_duration: None,
            pads: None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::{fs, path::Path, time::Duration};

    use super::*;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("board.yaml");
        fs::write(&path, contents).expect("failed to write config");
        path
    }

    #[test]
    fn test_deserialize() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = write_config(
            dir.path(),
            r#"
audio:
  device: mock-device
step_duration: 200ms
pads:
  - note: C4
    file: sounds/c4.wav
    key: q
  - note: D4
    file: /abs/d4.wav
"#,
        );

        let board = Board::deserialize(&path)?;
        assert_eq!("mock-device", board.audio().device());
        assert_eq!(Duration::from_millis(200), board.step_duration()?);

        let definitions = board.pad_definitions(dir.path())?;
        assert_eq!(2, definitions.len());
        assert_eq!("C4", definitions[0].note);
        assert_eq!('Q', definitions[0].letter.as_char());
        assert_eq!(
            dir.path().join("sounds/c4.wav"),
            definitions[0].source.path()
        );
        // The second pad takes the second default key.
        assert_eq!('S', definitions[1].letter.as_char());
        assert_eq!(Path::new("/abs/d4.wav"), definitions[1].source.path());
        Ok(())
    }

    #[test]
    fn test_default_kit() -> Result<(), ConfigError> {
        let board = Board::default();
        assert_eq!(DEFAULT_STEP_DURATION, board.step_duration()?);
        assert_eq!("default", board.audio().device());

        let definitions = board.pad_definitions(Path::new("/kit"))?;
        let notes: Vec<&str> = definitions.iter().map(|d| d.note.as_str()).collect();
        let keys: String = definitions.iter().map(|d| d.letter.as_char()).collect();
        assert_eq!(vec!["C4", "D4", "F4", "A4", "B4", "C5", "C6"], notes);
        assert_eq!("ASDFGHJ", keys);
        Ok(())
    }

    #[test]
    fn test_invalid_pads() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;

        let path = write_config(dir.path(), "pads: []\n");
        assert!(matches!(
            Board::deserialize(&path)?.pad_definitions(dir.path()),
            Err(ConfigError::NoPads)
        ));

        let path = write_config(
            dir.path(),
            "pads:\n  - note: C4\n    file: a.wav\n    key: '1'\n",
        );
        assert!(matches!(
            Board::deserialize(&path)?.pad_definitions(dir.path()),
            Err(ConfigError::InvalidKey { .. })
        ));

        let path = write_config(
            dir.path(),
            "pads:\n  - note: C4\n    file: a.wav\n  - note: D4\n    file: b.wav\n    key: A\n",
        );
        assert!(matches!(
            Board::deserialize(&path)?.pad_definitions(dir.path()),
            Err(ConfigError::DuplicateKey { .. })
        ));

        let path = write_config(dir.path(), "step_duration: soon\n");
        assert!(matches!(
            Board::deserialize(&path)?.step_duration(),
            Err(ConfigError::InvalidDuration(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_default_key() {
        let pads: Vec<Pad> = (0..8)
            .map(|i| Pad::new(&format!("N{}", i), "x.wav", None))
            .collect();
        let board = Board {
            pads: Some(pads),
            ..Board::default()
        };
        assert!(matches!(
            board.pad_definitions(Path::new(".")),
            Err(ConfigError::MissingKey(note)) if note == "N7"
        ));
    }
}
