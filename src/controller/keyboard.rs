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

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::editor::EditorKey;

const DOWN: &str = "down";
const UP: &str = "up";
const TAP: &str = "tap";
const PRESS: &str = "press";
const RELEASE: &str = "release";
const LEAVE: &str = "leave";
const EDIT: &str = "edit";
const TYPE: &str = "type";
const ENTER: &str = "enter";
const ESCAPE: &str = "esc";
const OUTSIDE: &str = "outside";
const SEQUENCE: &str = "seq";
const ADD: &str = "add";
const PLAY: &str = "play";
const KEYS: &str = "keys";

/// Drives the board from lines typed on stdin, one command per line. Key
/// commands take the key text (or a code like "KeyA"); pointer and edit
/// commands take a pad's note.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Splits a key argument into a key code and key text.
    fn key(arg: &str) -> (Option<String>, String) {
        match arg.strip_prefix("Key") {
            Some(rest) if rest.len() == 1 => (Some(arg.to_string()), rest.to_lowercase()),
            _ => (None, arg.to_string()),
        }
    }

    /// One-line help listing every command.
    fn usage() -> String {
        let commands = [
            format!("{DOWN}|{UP}|{TAP} <key>"),
            format!("{PRESS}|{RELEASE}|{LEAVE} <note>"),
            format!("{EDIT} <note>, {TYPE} <text>, {ENTER}, {ESCAPE}, {OUTSIDE}"),
            format!("{SEQUENCE} <text>, {ADD} <letter>, {PLAY}, {KEYS}"),
        ];
        format!("Commands: {}", commands.join(", "))
    }

    /// Parses one command line into the events it stands for.
    fn parse(line: &str) -> Option<Vec<Event>> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        let events = match (command.to_lowercase().as_str(), arg.is_empty()) {
            (DOWN, false) => {
                let (code, key) = Self::key(arg);
                vec![Event::KeyDown { code, key }]
            }
            (UP, false) => {
                let (code, key) = Self::key(arg);
                vec![Event::KeyUp { code, key }]
            }
            (TAP, false) => {
                let (code, key) = Self::key(arg);
                vec![
                    Event::KeyDown {
                        code: code.clone(),
                        key: key.clone(),
                    },
                    Event::KeyUp { code, key },
                ]
            }
            (PRESS, false) => vec![Event::PointerDown(arg.to_string())],
            (RELEASE, false) => vec![Event::PointerUp(arg.to_string())],
            (LEAVE, false) => vec![Event::PointerLeave(arg.to_string())],
            (EDIT, false) => vec![Event::EditOpen(arg.to_string())],
            (TYPE, _) => vec![Event::EditInput(arg.to_string())],
            (ENTER, true) => vec![Event::EditKey(EditorKey::Enter)],
            (ESCAPE, true) => vec![Event::EditKey(EditorKey::Escape)],
            (OUTSIDE, true) => vec![Event::ClickOutside],
            (SEQUENCE, _) => vec![Event::SequenceSet(arg.to_string())],
            (ADD, false) => vec![Event::SequenceInsert(arg.to_string())],
            (PLAY, true) => vec![Event::SequencePlay],
            (KEYS, true) => vec![Event::ShowMapping],
            _ => return None,
        };
        Some(events)
    }

    /// Reads and sends one command. Returns false once the input is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "> ")?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }
        if input.trim().is_empty() {
            return Ok(true);
        }

        match Self::parse(&input) {
            Some(events) => {
                for event in events {
                    events_tx
                        .blocking_send(event)
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
            }
            None => {
                warn!(input = input.trim(), "Unrecognized input");
                writeln!(writer, "{}", Self::usage())?;
            }
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Input closed.");
            Ok(())
        })
    }
}
