/*
[INPUT]:  Output region mutations, message area updates
[OUTPUT]: Tail text on stdout, console messages on stderr
[POS]:    View layer - terminal rendering
[UPDATE]: When changing terminal output format
*/

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use console::style;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::document::RenderSink;
use crate::messages::{MessageArea, MessageLevel};

/// Writes region output to a terminal, `tail -f` style.
///
/// When several regions are rendered, a `==> region <==` header marks each
/// switch. A replace that only extends the previous text prints the suffix.
pub struct TerminalSink<W: Write + Send> {
    out: Mutex<TerminalState<W>>,
}

struct TerminalState<W> {
    writer: W,
    last_region: Option<String>,
    shown: HashMap<String, String>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: Mutex::new(TerminalState {
                writer,
                last_region: None,
                shown: HashMap::new(),
            }),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .writer
    }
}

impl<W: Write> TerminalState<W> {
    fn switch_to(&mut self, region_id: &str) -> io::Result<()> {
        if self.last_region.as_deref() == Some(region_id) {
            return Ok(());
        }
        if self.last_region.is_some() {
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "{}", style(format!("==> {region_id} <==")).bold())?;
        self.last_region = Some(region_id.to_string());
        Ok(())
    }

    fn replace(&mut self, region_id: &str, text: &str) -> io::Result<()> {
        self.switch_to(region_id)?;
        let previous = self.shown.get(region_id).map(String::as_str).unwrap_or("");
        match text.strip_prefix(previous) {
            Some(suffix) if !previous.is_empty() => self.writer.write_all(suffix.as_bytes())?,
            _ => {
                if !previous.is_empty() {
                    writeln!(self.writer, "{}", style("-- output restarted --").dim())?;
                }
                self.writer.write_all(text.as_bytes())?;
            }
        }
        self.shown.insert(region_id.to_string(), text.to_string());
        self.writer.flush()
    }

    fn append(&mut self, region_id: &str, text: &str) -> io::Result<()> {
        self.switch_to(region_id)?;
        self.writer.write_all(text.as_bytes())?;
        self.shown
            .entry(region_id.to_string())
            .or_default()
            .push_str(text);
        self.writer.flush()
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn on_replace(&self, region_id: &str, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.replace(region_id, text) {
            debug!(region = region_id, error = %err, "terminal write failed");
        }
    }

    fn on_append(&self, region_id: &str, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.append(region_id, text) {
            debug!(region = region_id, error = %err, "terminal write failed");
        }
    }
}

/// Print every message-area update to stderr until the area is dropped.
pub fn spawn_message_printer(messages: &Arc<MessageArea>) -> JoinHandle<()> {
    let mut rx = messages.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let Some(message) = rx.borrow_and_update().clone() else {
                continue;
            };
            match message.level {
                MessageLevel::Error => eprintln!("{}", style(&message.text).red().bold()),
                MessageLevel::Info => eprintln!("{}", style(&message.text).cyan()),
            }
        }
    })
}
