// input.rs - Keyboard Editing State Machine
//
// Runs on the keyboard thread. Key events are decoded into `Command`s, and
// `InputMachine` turns those into `EditRequest`s posted to the event loop
// thread, which owns the rectangles and their windows. The machine itself
// never touches a rectangle or a surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info, warn};

use crate::constants::step;

/// A decoded key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { dx: i32, dy: i32 },
    Resize { dw: i32, dh: i32 },
    /// Digit key: show the focused rectangle on this monitor
    Monitor(usize),
    /// Confirm the focused rectangle and move on
    Advance,
    /// Ctrl+C or Esc
    Interrupt,
}

impl Command {
    /// Decode a key event. Releases, repeats of unmapped keys and modifier
    /// combinations other than Ctrl+C decode to `None`.
    pub fn from_key(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') | KeyCode::Char('C') => Some(Self::Interrupt),
                _ => None,
            };
        }

        let command = match event.code {
            KeyCode::Esc => Self::Interrupt,
            KeyCode::Enter | KeyCode::Char(' ') => Self::Advance,
            KeyCode::Right => Self::Resize { dw: step::WIDTH, dh: 0 },
            KeyCode::Left => Self::Resize { dw: -step::WIDTH, dh: 0 },
            KeyCode::Up => Self::Resize { dw: 0, dh: step::HEIGHT },
            KeyCode::Down => Self::Resize { dw: 0, dh: -step::HEIGHT },
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'a' => Self::Move { dx: -step::MOVE, dy: 0 },
                'd' => Self::Move { dx: step::MOVE, dy: 0 },
                'w' => Self::Move { dx: 0, dy: -step::MOVE },
                's' => Self::Move { dx: 0, dy: step::MOVE },
                '+' | '=' => Self::Resize { dw: step::WIDTH, dh: step::HEIGHT },
                '-' | '_' => Self::Resize { dw: -step::WIDTH, dh: -step::HEIGHT },
                digit @ '0'..='9' => Self::Monitor(digit as usize - '0' as usize),
                _ => return None,
            },
            _ => return None,
        };
        Some(command)
    }
}

/// Ask the event loop thread to retarget a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetargetRequest {
    pub index: usize,
    pub monitor: usize,
}

/// Work for the thread that owns the rectangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRequest {
    Move { index: usize, dx: i32, dy: i32 },
    Resize { index: usize, dw: i32, dh: i32 },
    /// Persist the slot under the new monitor, then rebuild its surface there
    Retarget(RetargetRequest),
    Focus(Option<usize>),
    /// Close every surface and leave the event loop
    Shutdown,
}

/// Where the machine posts its requests
pub trait RequestSink {
    /// Returns false when the receiving side is gone.
    fn submit(&self, request: EditRequest) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Editing(usize),
    Done,
}

/// What happened to one command, for status output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Digit key naming a monitor that does not exist
    Unavailable { monitor: usize, available: usize },
    FocusChanged(usize),
    /// The last rectangle was confirmed
    Finished,
    /// Command has no effect in the current state
    Ignored,
    /// Shutdown was requested; the keyboard loop should stop
    Exit,
}

/// Single-focus editor over a fixed number of rectangles
#[derive(Debug)]
pub struct InputMachine {
    state: EditState,
    rect_count: usize,
    /// Updated by the event loop thread after every monitor enumeration
    monitor_count: Arc<AtomicUsize>,
}

impl InputMachine {
    pub fn new(rect_count: usize, monitor_count: Arc<AtomicUsize>) -> Self {
        let state = if rect_count == 0 {
            EditState::Done
        } else {
            EditState::Editing(0)
        };
        Self {
            state,
            rect_count,
            monitor_count,
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn handle<R: RequestSink>(&mut self, command: Command, sink: &R) -> Outcome {
        if command == Command::Interrupt {
            info!("Interrupt received, shutting down");
            sink.submit(EditRequest::Shutdown);
            return Outcome::Exit;
        }

        let EditState::Editing(index) = self.state else {
            return Outcome::Ignored;
        };

        let (request, next_state, outcome) = match command {
            Command::Move { dx, dy } => (
                EditRequest::Move { index, dx, dy },
                self.state,
                Outcome::Applied,
            ),
            Command::Resize { dw, dh } => (
                EditRequest::Resize { index, dw, dh },
                self.state,
                Outcome::Applied,
            ),
            Command::Monitor(monitor) => {
                let available = self.monitor_count.load(Ordering::Acquire);
                if monitor >= available {
                    info!("Monitor {} unavailable ({} connected)", monitor, available);
                    return Outcome::Unavailable { monitor, available };
                }
                debug!("Requesting slot {} on monitor {}", index, monitor);
                (
                    EditRequest::Retarget(RetargetRequest { index, monitor }),
                    self.state,
                    Outcome::Applied,
                )
            }
            Command::Advance => {
                let next = index + 1;
                if next >= self.rect_count {
                    (EditRequest::Focus(None), EditState::Done, Outcome::Finished)
                } else {
                    (
                        EditRequest::Focus(Some(next)),
                        EditState::Editing(next),
                        Outcome::FocusChanged(next),
                    )
                }
            }
            Command::Interrupt => return Outcome::Exit,
        };

        if !sink.submit(request) {
            warn!("Event loop is gone, stopping keyboard editing");
            return Outcome::Exit;
        }
        if outcome == Outcome::Finished {
            info!("All {} rectangles placed", self.rect_count);
        }
        self.state = next_state;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letters_move_case_insensitively() {
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('a'))),
            Some(Command::Move { dx: -step::MOVE, dy: 0 })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('D'))),
            Some(Command::Move { dx: step::MOVE, dy: 0 })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('w'))),
            Some(Command::Move { dx: 0, dy: -step::MOVE })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('S'))),
            Some(Command::Move { dx: 0, dy: step::MOVE })
        );
    }

    #[test]
    fn resize_keys() {
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('+'))),
            Some(Command::Resize { dw: step::WIDTH, dh: step::HEIGHT })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Char('-'))),
            Some(Command::Resize { dw: -step::WIDTH, dh: -step::HEIGHT })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Up)),
            Some(Command::Resize { dw: 0, dh: step::HEIGHT })
        );
        assert_eq!(
            Command::from_key(&press(KeyCode::Left)),
            Some(Command::Resize { dw: -step::WIDTH, dh: 0 })
        );
    }

    #[test]
    fn digits_confirm_and_interrupts() {
        assert_eq!(Command::from_key(&press(KeyCode::Char('0'))), Some(Command::Monitor(0)));
        assert_eq!(Command::from_key(&press(KeyCode::Char('7'))), Some(Command::Monitor(7)));
        assert_eq!(Command::from_key(&press(KeyCode::Enter)), Some(Command::Advance));
        assert_eq!(Command::from_key(&press(KeyCode::Esc)), Some(Command::Interrupt));
        assert_eq!(
            Command::from_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Interrupt)
        );
    }

    #[test]
    fn unmapped_and_released_keys_are_ignored() {
        assert_eq!(Command::from_key(&press(KeyCode::Char('z'))), None);
        assert_eq!(Command::from_key(&press(KeyCode::Tab)), None);
        assert_eq!(
            Command::from_key(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)),
            None
        );

        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(Command::from_key(&release), None);
    }
}
