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

/// Typed error for board config load/validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Pad {note} has invalid key '{key}', expected a single letter A-Z")]
    InvalidKey { note: String, key: String },

    #[error("Key {key} is assigned to both {first} and {second}")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Pad {0} has no key and there is no default key left for it")]
    MissingKey(String),

    #[error("The pad list is empty")]
    NoPads,

    #[error("Invalid step duration: {0}")]
    InvalidDuration(String),
}
