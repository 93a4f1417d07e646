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

//! Programmed sequence playback.
//!
//! A run plays one letter per step, strictly one after another, and holds the
//! board busy for its whole length so live input is suppressed. There is no
//! mid-run cancel.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, span, Instrument, Level};

use crate::{
    audio::{self, PlaybackError},
    board::Board,
    letter::Letter,
};

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("step {index} ({letter}) failed: {source}")]
    Step {
        index: usize,
        letter: Letter,
        #[source]
        source: PlaybackError,
    },
}

/// How a call to [`SequenceRunner::run`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step was played or skipped.
    Completed,
    /// Nothing to play.
    Empty,
    /// Another run was already in progress.
    AlreadyRunning,
}

/// Clears the busy state however the run exits.
struct BusyGuard<'a> {
    board: &'a Board,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.board.end_busy();
    }
}

pub struct SequenceRunner {
    board: Arc<Board>,
    step_duration: Duration,
}

impl SequenceRunner {
    pub fn new(board: Arc<Board>, step_duration: Duration) -> SequenceRunner {
        SequenceRunner {
            board,
            step_duration,
        }
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    /// Keeps only letters currently bound to a pad, upper-cased, in order, capped
    /// at the maximum sequence length. Repeats are allowed.
    pub fn normalize(&self, raw: &str) -> String {
        let registry = self.board.registry();
        raw.chars()
            .filter_map(Letter::new)
            .filter(|letter| registry.is_mapped(*letter))
            .take(registry.max_sequence_len())
            .map(|letter| letter.as_char())
            .collect()
    }

    /// Pre-checks a single insertion into the field: it must be one mapped letter
    /// and must not push the field past the maximum length.
    pub fn accepts_insert(&self, current: &str, data: &str) -> bool {
        let registry = self.board.registry();
        match Letter::parse(data) {
            Some(letter) => {
                registry.is_mapped(letter)
                    && current.chars().count() < registry.max_sequence_len()
            }
            None => false,
        }
    }

    /// Inserts typed text at the end of the sequence field. Returns false and
    /// leaves the field untouched if the insertion is rejected.
    pub fn insert_text(&self, data: &str) -> bool {
        let field = self.board.sequence_field();
        if field.disabled || !self.accepts_insert(&field.value, data) {
            debug!(data, "Rejected sequence input.");
            return false;
        }
        let Some(letter) = Letter::parse(data) else {
            return false;
        };
        self.board
            .with_sequence_field(|field| field.value.push(letter.as_char()));
        true
    }

    /// Replaces the whole field (e.g. a paste), keeping only what normalizes.
    pub fn set_text(&self, raw: &str) -> bool {
        let normalized = self.normalize(raw);
        self.board.with_sequence_field(|field| {
            if field.disabled {
                return false;
            }
            field.value = normalized;
            true
        })
    }

    /// Plays whatever is in the sequence field.
    pub async fn run_from_field(&self) -> Result<RunOutcome, SequenceError> {
        let sequence = self.board.sequence_field().value;
        self.run(&sequence).await
    }

    /// Plays the sequence one step at a time. Steps whose letter is no longer
    /// mapped are skipped. A failing step aborts the rest of the run; the busy
    /// flag is cleared on every exit path.
    pub async fn run(&self, sequence: &str) -> Result<RunOutcome, SequenceError> {
        if sequence.is_empty() {
            return Ok(RunOutcome::Empty);
        }
        if !self.board.try_begin_busy() {
            debug!("A sequence is already playing.");
            return Ok(RunOutcome::AlreadyRunning);
        }
        let _guard = BusyGuard {
            board: &self.board,
        };

        let span = span!(Level::INFO, "sequence", steps = sequence.len());
        async {
            info!(sequence, "Playing sequence.");
            for (index, c) in sequence.chars().enumerate() {
                let Some(letter) = Letter::new(c) else {
                    continue;
                };
                self.play_step(index, letter).await?;
            }
            info!("Sequence finished.");
            Ok(RunOutcome::Completed)
        }
        .instrument(span)
        .await
    }

    async fn play_step(&self, index: usize, letter: Letter) -> Result<(), SequenceError> {
        let Some(pad) = self.board.pad_for(letter) else {
            debug!(index, letter = %letter, "Letter no longer mapped, skipping step.");
            return Ok(());
        };
        let visual = self.board.visual(pad.id());

        if let Some(visual) = visual {
            visual.activate();
        }
        let result =
            audio::trigger_timed(self.board.port().as_ref(), &pad, self.step_duration).await;
        if let Some(visual) = visual {
            visual.deactivate();
        }

        result.map_err(|source| {
            error!(index, letter = %letter, err = %source, "Sequence step failed.");
            SequenceError::Step {
                index,
                letter,
                source,
            }
        })
    }
}
