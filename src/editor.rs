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

//! The trigger-letter editor.
//!
//! At most one pad is edited at a time. A failed confirm leaves the session open
//! in its error sub-state so the user can retry; only a successful confirm or a
//! cancel closes it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    board::{Board, Focus},
    letter::Letter,
    pads::PadId,
};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("no key edit is in progress")]
    NotOpen,

    #[error("a key must be a single letter A-Z")]
    InvalidLetter,

    #[error("key {letter} is already used by {note}")]
    DuplicateLetter { letter: Letter, note: String },
}

/// An open edit of one pad's trigger letter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pad: PadId,
    note: String,
    pending: Option<Letter>,
    error: bool,
    /// Bumped on every failed confirm so a repeated failure re-triggers the pulse.
    error_pulses: u32,
}

impl EditSession {
    pub fn pad(&self) -> PadId {
        self.pad
    }

    /// The uncommitted letter, if the input holds one.
    pub fn pending(&self) -> Option<Letter> {
        self.pending
    }

    /// True while in the error sub-state.
    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn error_pulses(&self) -> u32 {
        self.error_pulses
    }

    /// The editor's label.
    pub fn label(&self) -> String {
        format!("Change key for: {}", self.note)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Open(EditSession),
}

/// A key pressed while the editor has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Escape,
    Other,
}

/// Where a pointer press landed, for outside-click dismissal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// Inside the editor itself.
    Editor,
    /// A pad's edit affordance; the follow-up open handles the switch.
    EditAffordance(PadId),
    Elsewhere,
}

pub struct MappingEditor {
    board: Arc<Board>,
    state: Mutex<EditorState>,
}

impl MappingEditor {
    pub fn new(board: Arc<Board>) -> MappingEditor {
        MappingEditor {
            board,
            state: Mutex::new(EditorState::Closed),
        }
    }

    pub fn state(&self) -> EditorState {
        self.state.lock().clone()
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), EditorState::Open(_))
    }

    /// Opens the editor for a pad, seeded with its current letter. Ignored while a
    /// sequence is playing. If another pad is being edited, that edit is
    /// cancelled first.
    pub fn open(&self, id: PadId) -> bool {
        if self.board.is_busy() {
            debug!(pad = id.index(), "Busy, not opening editor.");
            return false;
        }
        let Some(pad) = self.board.pad(id) else {
            return false;
        };

        if self.is_open() {
            self.cancel();
        }

        *self.state.lock() = EditorState::Open(EditSession {
            pad: id,
            note: pad.note().to_string(),
            pending: Some(pad.letter()),
            error: false,
            error_pulses: 0,
        });
        self.board.set_focus(Focus::Editor);
        debug!(note = pad.note(), "Editor opened.");
        true
    }

    /// Replaces the pending letter with the first letter found in the input.
    pub fn type_text(&self, raw: &str) {
        if let EditorState::Open(session) = &mut *self.state.lock() {
            session.pending = Letter::extract(raw);
            session.error = false;
        }
    }

    /// Handles a key pressed in the editor input.
    pub fn key(&self, key: EditorKey) -> Option<Result<Letter, EditError>> {
        match key {
            EditorKey::Enter => Some(self.confirm()),
            EditorKey::Escape => {
                self.cancel();
                None
            }
            EditorKey::Other => {
                if let EditorState::Open(session) = &mut *self.state.lock() {
                    session.error = false;
                }
                None
            }
        }
    }

    /// Commits the pending letter. Fails, leaving the session open in its error
    /// sub-state, if the letter is missing or bound to another pad. Confirming
    /// the pad's own current letter succeeds without changing anything.
    pub fn confirm(&self) -> Result<Letter, EditError> {
        let mut state = self.state.lock();
        let EditorState::Open(session) = &mut *state else {
            return Err(EditError::NotOpen);
        };

        let result = match session.pending {
            None => Err(EditError::InvalidLetter),
            Some(letter) => {
                let registry = self.board.registry();
                if registry.is_taken(letter, session.pad) {
                    let note = registry
                        .get_by_letter(letter)
                        .map(|pad| pad.note().to_string())
                        .unwrap_or_default();
                    Err(EditError::DuplicateLetter { letter, note })
                } else {
                    let unchanged = registry
                        .get(session.pad)
                        .is_some_and(|pad| pad.letter() == letter);
                    Ok((letter, unchanged))
                }
            }
        };

        match result {
            Err(e) => {
                session.error = true;
                session.error_pulses += 1;
                debug!(err = %e, note = %session.note, "Key change rejected.");
                Err(e)
            }
            Ok((letter, unchanged)) => {
                let pad = session.pad;
                *state = EditorState::Closed;
                drop(state);

                if unchanged {
                    debug!(letter = %letter, "Key unchanged.");
                    self.board.mapping_confirmed();
                } else {
                    info!(pad = pad.index(), letter = %letter, "Key changed.");
                    self.board.commit_letter(pad, letter);
                }
                self.board.set_focus(Focus::Root);
                Ok(letter)
            }
        }
    }

    /// Closes the editor without changing anything.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if let EditorState::Open(session) = &*state {
            debug!(note = %session.note, "Editor cancelled.");
            *state = EditorState::Closed;
            self.board.set_focus(Focus::Root);
        }
    }

    /// A pointer press somewhere on the surface. Presses outside the editor close
    /// it, except on an edit affordance, where the following open takes over.
    pub fn click(&self, target: ClickTarget) {
        match target {
            ClickTarget::Elsewhere => self.cancel(),
            ClickTarget::Editor | ClickTarget::EditAffordance(_) => {}
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use crate::{input::InputRouter, testutil};

    use super::*;

    fn letter(c: char) -> Letter {
        Letter::new(c).expect("valid letter")
    }

    fn session(editor: &MappingEditor) -> EditSession {
        match editor.state() {
            EditorState::Open(session) => session,
            EditorState::Closed => panic!("editor should be open"),
        }
    }

    fn assert_unique(board: &Board) {
        let registry = board.registry();
        let letters: HashSet<Letter> = registry.pads().iter().map(|p| p.letter()).collect();
        assert_eq!(registry.len(), letters.len(), "letters must stay unique");
    }

    #[tokio::test]
    async fn test_remap() -> Result<(), EditError> {
        let (board, _, announcer) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();

        assert!(editor.open(c4));
        assert_eq!(Focus::Editor, board.focus());
        assert_eq!(Some(letter('A')), session(&editor).pending());
        assert_eq!("Change key for: C4", session(&editor).label());

        editor.type_text("z");
        assert_eq!(letter('Z'), editor.confirm()?);
        assert_eq!(EditorState::Closed, editor.state());
        assert_eq!(Focus::Root, board.focus());
        assert_eq!(letter('Z'), board.pad(c4).expect("pad").letter());
        assert_eq!('Z', board.visuals()[c4.index()].label());
        assert!(board.pad_for(letter('A')).is_none());
        assert_unique(&board);

        assert_eq!(
            vec!["Key for C4 changed to Z.".to_string()],
            announcer.messages()
        );
        testutil::eventually_async(
            || {
                let announcer = announcer.clone();
                async move {
                    announcer.last().as_deref() == Some("Keys: Z S D F G H J → C4 D4 F4 A4 B4 C5 C6")
                }
            },
            "mapping text never refreshed",
        )
        .await;
        Ok(())
    }

    #[test]
    fn test_self_confirm_is_noop_success() {
        let (board, _, announcer) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let d4 = board.pad_by_note("D4").expect("pad").id();

        assert!(editor.open(d4));
        assert_eq!(Ok(letter('S')), editor.confirm());
        assert!(!editor.is_open());

        editor.open(d4);
        editor.type_text("s");
        assert_eq!(Ok(letter('S')), editor.confirm());
        assert_eq!(letter('S'), board.pad(d4).expect("pad").letter());

        // No remap message, only the mapping line, once per confirm.
        let mapping = "Keys: A S D F G H J → C4 D4 F4 A4 B4 C5 C6".to_string();
        assert_eq!(vec![mapping.clone(), mapping], announcer.messages());
    }

    #[test]
    fn test_self_confirm_releases_held_keys() {
        let (board, device, _) = testutil::board();
        let router = InputRouter::new(board.clone());
        let editor = MappingEditor::new(board.clone());
        let d4 = board.pad_by_note("D4").expect("pad").id();

        assert!(router.key_down(Some("KeyS"), "s"));
        assert!(board.visuals()[d4.index()].is_active());

        editor.open(d4);
        assert_eq!(Ok(letter('S')), editor.confirm());
        assert!(!board.is_key_held(letter('S')));
        assert!(!board.visuals()[d4.index()].is_active());

        // The key is free to fire again without a release first.
        assert!(router.key_down(Some("KeyS"), "s"));
        assert_eq!(2, device.starts("D4"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let (board, _, _) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let d4 = board.pad_by_note("D4").expect("pad").id();

        assert!(editor.open(d4));
        editor.type_text("A");
        assert_eq!(
            Err(EditError::DuplicateLetter {
                letter: letter('A'),
                note: "C4".to_string()
            }),
            editor.confirm()
        );

        let session = session(&editor);
        assert!(session.is_error());
        assert_eq!(1, session.error_pulses());
        assert_eq!(Some(letter('A')), session.pending());
        assert_eq!(letter('S'), board.pad(d4).expect("pad").letter());
        assert_unique(&board);

        // A second failure pulses again.
        assert!(editor.confirm().is_err());
        assert_eq!(2, self::session(&editor).error_pulses());

        // Typing clears the error sub-state and a valid letter then commits.
        editor.type_text("q");
        assert!(!self::session(&editor).is_error());
        assert_eq!(Ok(letter('Q')), editor.confirm());
        assert_unique(&board);
    }

    #[test]
    fn test_invalid_letter_keeps_session_open() {
        let (board, _, _) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();

        editor.open(c4);
        editor.type_text("12");
        assert_eq!(None, session(&editor).pending());
        assert_eq!(Err(EditError::InvalidLetter), editor.confirm());
        assert!(session(&editor).is_error());

        editor.key(EditorKey::Other);
        assert!(!session(&editor).is_error());
        assert_eq!(None, editor.key(EditorKey::Escape));
        assert!(!editor.is_open());
        assert_eq!(letter('A'), board.pad(c4).expect("pad").letter());
    }

    #[test]
    fn test_confirm_when_closed() {
        let (board, _, _) = testutil::board();
        let editor = MappingEditor::new(board);
        assert_eq!(Err(EditError::NotOpen), editor.confirm());
    }

    #[test]
    fn test_busy_blocks_open() {
        let (board, _, _) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();

        assert!(board.try_begin_busy());
        assert!(!editor.open(c4));
        assert!(!editor.is_open());
        board.end_busy();
        assert!(editor.open(c4));
    }

    #[test]
    fn test_click_outside_and_switch_pads() {
        let (board, _, _) = testutil::board();
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();
        let f4 = board.pad_by_note("F4").expect("pad").id();

        editor.open(c4);
        editor.type_text("x");
        editor.click(ClickTarget::Editor);
        assert!(editor.is_open());

        // Clicking another pad's edit button cancels the current edit, then opens.
        editor.click(ClickTarget::EditAffordance(f4));
        assert!(editor.is_open());
        assert!(editor.open(f4));
        assert_eq!(f4, session(&editor).pad());
        assert_eq!(Some(letter('D')), session(&editor).pending());
        assert_eq!(letter('A'), board.pad(c4).expect("pad").letter());

        editor.click(ClickTarget::Elsewhere);
        assert!(!editor.is_open());
        assert_eq!(Focus::Root, board.focus());
    }

    #[test]
    fn test_remap_keeps_pointer_held_pad_lit() {
        let (board, _, _) = testutil::board();
        let router = InputRouter::new(board.clone());
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();

        assert!(router.pointer_down(c4));
        assert!(router.key_down(Some("KeyA"), "a"));

        editor.open(c4);
        editor.type_text("z");
        assert!(editor.confirm().is_ok());
        assert!(!board.is_key_held(letter('A')));
        assert!(board.visuals()[c4.index()].is_active());

        router.pointer_up(c4);
        assert!(!board.visuals()[c4.index()].is_active());
    }

    #[test]
    fn test_remap_clears_held_keys() {
        let (board, device, _) = testutil::board();
        let router = InputRouter::new(board.clone());
        let editor = MappingEditor::new(board.clone());
        let c4 = board.pad_by_note("C4").expect("pad").id();

        assert!(router.key_down(Some("KeyA"), "a"));
        assert!(board.is_key_held(letter('A')));
        assert!(board.visuals()[c4.index()].is_active());

        editor.open(c4);
        editor.type_text("Z");
        assert!(editor.confirm().is_ok());
        assert!(!board.is_key_held(letter('A')));
        assert!(!board.visuals()[c4.index()].is_active());

        // Releasing the old key afterwards must not leave anything lit.
        router.key_up(Some("KeyA"), "a");
        assert!(board.visuals().iter().all(|visual| !visual.is_active()));

        // "A" is now unmapped, so a fresh press does nothing.
        assert!(!router.key_down(Some("KeyA"), "a"));
        assert!(router.key_down(Some("KeyZ"), "z"));
        assert_eq!(2, device.starts("C4"));
    }
}
