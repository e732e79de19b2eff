// keyboard.rs - Keyboard Reader Thread
//
// Reads keys from the controlling terminal, runs them through the editing
// state machine and forwards the resulting requests to the event loop. The
// terminal is put in raw mode so single keys arrive without Enter and Ctrl+C
// arrives as a key instead of killing the process.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossterm::event::{self, Event};
use crossterm::terminal;
use log::{error, warn};
use winit::event_loop::EventLoopProxy;

use overlay_mirror::constants::KEY_POLL_TIMEOUT;
use overlay_mirror::{Command, EditRequest, InputMachine, Outcome, RequestSink};

/// Posts requests into the winit event loop
pub struct ProxySink(EventLoopProxy<EditRequest>);

impl RequestSink for ProxySink {
    fn submit(&self, request: EditRequest) -> bool {
        self.0.send_event(request).is_ok()
    }
}

/// Start the keyboard thread. It stops on interrupt or once `running` is cleared.
pub fn spawn(
    machine: InputMachine,
    proxy: EventLoopProxy<EditRequest>,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || run(machine, ProxySink(proxy), running))
}

fn run(mut machine: InputMachine, sink: ProxySink, running: Arc<AtomicBool>) {
    let raw = match terminal::enable_raw_mode() {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not enable raw terminal mode: {}", e);
            false
        }
    };

    print_legend();

    while running.load(Ordering::Acquire) {
        match event::poll(KEY_POLL_TIMEOUT) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                error!("Keyboard poll failed, keyboard editing disabled: {}", e);
                break;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                error!("Keyboard read failed, keyboard editing disabled: {}", e);
                break;
            }
        };

        let Some(command) = Command::from_key(&key) else {
            continue;
        };

        let outcome = machine.handle(command, &sink);
        report(outcome);
        if outcome == Outcome::Exit {
            break;
        }
    }

    if raw {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Could not restore terminal mode: {}", e);
        }
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Unavailable { monitor, available } => {
            status(&format!("Monitor {} unavailable ({} connected)", monitor, available))
        }
        Outcome::FocusChanged(index) => status(&format!("Editing rectangle {}", index + 1)),
        Outcome::Finished => status("All rectangles placed. Mirroring continues, Ctrl+C to exit."),
        Outcome::Exit => status("Exiting..."),
        Outcome::Applied | Outcome::Ignored => {}
    }
}

fn print_legend() {
    status("Editing rectangle 1");
    status("  W/A/S/D move   +/- resize   arrows width/height");
    status("  0-9 move to monitor   Enter next rectangle   Ctrl+C/Esc quit");
}

/// Raw mode needs explicit carriage returns
fn status(line: &str) {
    let mut out = io::stdout().lock();
    let _ = write!(out, "{}\r\n", line);
    let _ = out.flush();
}
