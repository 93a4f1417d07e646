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
use std::path::PathBuf;

/// Error types for the playback boundary.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Playback unavailable for {0}")]
    Unavailable(String),

    #[error("No sound loaded for {0}")]
    UnknownSource(PathBuf),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to stop and rewind {note}: {message}")]
    Rewind { note: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
