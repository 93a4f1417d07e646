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

//! Trigger letters and the normalization of raw input into them.
//!
//! Every input path (pointer, keyboard, mapping editor, sequence field) reduces
//! its raw text to a [`Letter`] through the functions here, as does a key read
//! from the board config, so there is exactly one definition of what a valid
//! trigger letter is.

use std::{fmt, str::FromStr};

/// Prefix of layout-independent key codes, e.g. `KeyA`.
const KEY_CODE_PREFIX: &str = "Key";

/// A single uppercase trigger letter, `A` through `Z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Letter(u8);

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LetterError {
    #[error("'{0}' is not a single letter A-Z")]
    InvalidLetter(String),
}

impl Letter {
    /// Converts a single character into a letter, folding case. Anything outside
    /// ASCII a-z/A-Z is rejected.
    pub fn new(c: char) -> Option<Letter> {
        if c.is_ascii_alphabetic() {
            Some(Letter(c.to_ascii_uppercase() as u8))
        } else {
            None
        }
    }

    /// Normalizes raw text: surrounding whitespace is ignored and exactly one letter
    /// must remain.
    pub fn parse(raw: &str) -> Option<Letter> {
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Letter::new(c),
            _ => None,
        }
    }

    /// Extracts a letter from a physical key event. The key code (`KeyA`..`KeyZ`)
    /// wins over the produced key text so that keyboard layouts and modifiers
    /// don't change which pad fires.
    pub fn from_key_event(code: Option<&str>, key: &str) -> Option<Letter> {
        if let Some(letter) = code
            .and_then(|code| code.strip_prefix(KEY_CODE_PREFIX))
            .filter(|rest| rest.len() == 1)
            .and_then(|rest| rest.chars().next())
            .filter(char::is_ascii_uppercase)
        {
            return Letter::new(letter);
        }

        Letter::parse(key)
    }

    /// Filters editor input down to its first letter. Non-letters are stripped
    /// rather than rejecting the whole input.
    pub fn extract(raw: &str) -> Option<Letter> {
        raw.chars().find_map(Letter::new)
    }

    /// Returns the letter as an uppercase char.
    pub fn as_char(&self) -> char {
        self.0 as char
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Letter {
    type Err = LetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Letter::parse(s).ok_or_else(|| LetterError::InvalidLetter(s.to_string()))
    }
}
