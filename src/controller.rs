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
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::board::Board;
use crate::editor::{ClickTarget, EditorKey, MappingEditor};
use crate::input::InputRouter;
use crate::pads::PadId;
use crate::sequence::SequenceRunner;

pub mod keyboard;

/// Input events that will drive the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A physical key went down. The code is the layout-independent key code
    /// (e.g. "KeyA"), if known.
    KeyDown { code: Option<String>, key: String },

    /// A physical key was released.
    KeyUp { code: Option<String>, key: String },

    /// The pointer was pressed on the pad with the given note.
    PointerDown(String),

    /// The pointer was released over the pad with the given note.
    PointerUp(String),

    /// The pointer left the pad with the given note.
    PointerLeave(String),

    /// Opens the mapping editor for the pad with the given note.
    EditOpen(String),

    /// Text typed into the mapping editor.
    EditInput(String),

    /// A key pressed while the mapping editor has focus.
    EditKey(EditorKey),

    /// A pointer press outside the editor.
    ClickOutside,

    /// A single insertion into the sequence field.
    SequenceInsert(String),

    /// Replaces the whole sequence field, as a paste would.
    SequenceSet(String),

    /// Plays the sequence field.
    SequencePlay,

    /// Announces the current mapping.
    ShowMapping,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// The three input channels sharing one board.
struct Channels {
    board: Arc<Board>,
    router: InputRouter,
    editor: MappingEditor,
    runner: Arc<SequenceRunner>,
    runs: Vec<JoinHandle<()>>,
}

impl Channels {
    fn pad(&self, note: &str) -> Option<PadId> {
        let id = self.board.pad_by_note(note).map(|pad| pad.id());
        if id.is_none() {
            warn!(note, "No pad with that note.");
        }
        id
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::KeyDown { code, key } => {
                self.router.key_down(code.as_deref(), &key);
            }
            Event::KeyUp { code, key } => self.router.key_up(code.as_deref(), &key),
            Event::PointerDown(note) => {
                if let Some(id) = self.pad(&note) {
                    self.editor.click(ClickTarget::Elsewhere);
                    self.router.pointer_down(id);
                }
            }
            Event::PointerUp(note) => {
                if let Some(id) = self.pad(&note) {
                    self.router.pointer_up(id);
                }
            }
            Event::PointerLeave(note) => {
                if let Some(id) = self.pad(&note) {
                    self.router.pointer_leave(id);
                }
            }
            Event::EditOpen(note) => {
                if let Some(id) = self.pad(&note) {
                    self.editor.click(ClickTarget::EditAffordance(id));
                    self.editor.open(id);
                }
            }
            Event::EditInput(text) => self.editor.type_text(&text),
            Event::EditKey(key) => {
                if let Some(Err(e)) = self.editor.key(key) {
                    info!(err = %e, "Key not changed.");
                }
            }
            Event::ClickOutside => self.editor.click(ClickTarget::Elsewhere),
            Event::SequenceInsert(text) => {
                self.runner.insert_text(&text);
            }
            Event::SequenceSet(text) => {
                self.runner.set_text(&text);
            }
            Event::SequencePlay => self.play(),
            Event::ShowMapping => self.board.announce_mapping(),
        }
    }

    /// Starts the sequence field on its own task so input keeps flowing (and is
    /// rejected as busy) while it plays.
    fn play(&mut self) {
        if !self.board.can_play() {
            debug!("Nothing to play, or already playing.");
            return;
        }
        let runner = self.runner.clone();
        self.runs.retain(|run| !run.is_finished());
        self.runs.push(tokio::spawn(async move {
            if let Err(e) = runner.run_from_field().await {
                error!(err = %e, "Sequence aborted.");
            }
        }));
    }

    /// Waits for any sequence still playing.
    async fn finish(self) {
        for run in self.runs {
            if let Err(e) = run.await {
                error!("Error waiting for sequence to finish: {}", e);
            }
        }
    }
}

/// Drives a board from input events.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(board: Arc<Board>, step_duration: Duration, driver: Arc<dyn Driver>) -> Controller {
        let channels = Channels {
            router: InputRouter::new(board.clone()),
            editor: MappingEditor::new(board.clone()),
            runner: Arc::new(SequenceRunner::new(board.clone(), step_duration)),
            runs: Vec::new(),
            board,
        };
        Controller {
            handle: tokio::spawn(Controller::trigger_events(channels, driver)),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Dispatches events from the driver until it closes.
    async fn trigger_events(mut channels: Channels, driver: Arc<dyn Driver>) {
        let span = span!(Level::INFO, "controller");
        async move {
            let (events_tx, mut events_rx) = mpsc::channel(1);
            let join_handle = driver.monitor_events(events_tx);

            let pads = channels.board.registry().len();
            info!(pads, "Controller started.");
            channels.board.announce_mapping();

            while let Some(event) = events_rx.recv().await {
                debug!(event = format!("{:?}", event), "Received event.");
                channels.handle(event);
            }

            info!("Controller closing.");
            match join_handle.await {
                Ok(Err(e)) => error!("Event monitor failed: {}", e),
                Err(e) => error!("Error waiting for event monitor to stop: {}", e),
                Ok(Ok(())) => {}
            }
            channels.finish().await;
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod test {
    use std::{io, sync::Arc, time::Duration};

    use tokio::{sync::mpsc::Sender, task::JoinHandle};

    use crate::{
        announcer::remap_message, editor::EditorKey, letter::Letter, testutil,
    };

    use super::{Controller, Driver, Event};

    /// Sends a fixed script of events, then closes.
    struct ScriptDriver {
        events: Vec<Event>,
    }

    impl Driver for ScriptDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let events = self.events.clone();
            tokio::spawn(async move {
                for event in events {
                    events_tx
                        .send(event)
                        .await
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
                Ok(())
            })
        }
    }

    fn key_down(key: &str) -> Event {
        Event::KeyDown {
            code: None,
            key: key.to_string(),
        }
    }

    fn key_up(key: &str) -> Event {
        Event::KeyUp {
            code: None,
            key: key.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller() -> Result<(), Box<dyn std::error::Error>> {
        let (board, device, announcer) = testutil::board();
        let driver = Arc::new(ScriptDriver {
            events: vec![
                key_down("a"),
                key_down("a"),
                key_up("a"),
                Event::PointerDown("F4".to_string()),
                Event::PointerUp("F4".to_string()),
                Event::PointerDown("E9".to_string()),
                Event::EditOpen("C4".to_string()),
                Event::EditInput("z".to_string()),
                Event::EditKey(EditorKey::Enter),
                Event::SequenceSet("zs1a".to_string()),
                Event::SequenceInsert("d".to_string()),
                Event::SequencePlay,
            ],
        });

        let mut controller = Controller::new(board.clone(), Duration::from_millis(350), driver);
        controller.join().await?;

        // One live press, then Z (now C4) in the sequence. A is no longer mapped.
        assert_eq!(2, device.starts("C4"));
        assert_eq!(1, device.starts("D4"));
        assert_eq!(2, device.starts("F4"));
        assert_eq!("ZSD", board.sequence_field().value);
        assert!(!board.is_busy());
        assert!(board
            .visuals()
            .iter()
            .all(|visual| !visual.is_active()));

        let z = Letter::new('Z').expect("valid letter");
        assert!(announcer.messages().contains(&remap_message("C4", z)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_edit_keeps_mapping() -> Result<(), Box<dyn std::error::Error>> {
        let (board, _, _) = testutil::board();
        let driver = Arc::new(ScriptDriver {
            events: vec![
                Event::EditOpen("C4".to_string()),
                Event::EditInput("s".to_string()),
                Event::EditKey(EditorKey::Enter),
                Event::ClickOutside,
                Event::ShowMapping,
            ],
        });

        let mut controller = Controller::new(board.clone(), Duration::from_millis(350), driver);
        controller.join().await?;

        assert_eq!("A", board.pad_by_note("C4").expect("pad").letter().to_string());
        assert_eq!("S", board.pad_by_note("D4").expect("pad").letter().to_string());
        Ok(())
    }
}
