//! Operator console.
//!
//! Reads command lines, dispatches them through the console router, and
//! runs the bot's shutdown when input ends or a stop is requested.

use std::io::{BufRead, Write};
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bot::Bot;
use crate::commands::{ConsoleContext, ParsedCommand};

/// Sink for console output.
pub trait ConsoleOutput: Send + Sync {
    fn print(&self, line: &str);
    fn error(&self, line: &str);
}

/// Writes to the process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl ConsoleOutput for StdConsole {
    fn print(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    fn error(&self, line: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "error: {line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    printed: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl CapturedOutput {
    pub fn printed(&self) -> Vec<String> {
        self.printed.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl ConsoleOutput for CapturedOutput {
    fn print(&self, line: &str) {
        self.printed.lock().push(line.to_string());
    }

    fn error(&self, line: &str) {
        self.errors.lock().push(line.to_string());
    }
}

/// Adapt a channel of lines into a stream for [`run`].
pub fn channel_lines(mut rx: mpsc::Receiver<String>) -> impl Stream<Item = String> + Unpin {
    futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx))
}

/// Read stdin on a dedicated thread.
///
/// A blocking read on a runtime thread would hold up runtime shutdown until
/// the operator pressed enter, so the reader lives outside the runtime and
/// is abandoned at exit.
pub fn stdin_lines() -> impl Stream<Item = String> + Unpin {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read console input");
                    break;
                }
            }
        }
    });
    channel_lines(rx)
}

/// Run the console loop until input ends or the bot is stopped, then shut
/// the bot down.
pub async fn run<S>(bot: Arc<Bot>, mut lines: S, out: Arc<dyn ConsoleOutput>)
where
    S: Stream<Item = String> + Unpin,
{
    bot.start();
    let ctx = ConsoleContext::new(bot.clone(), out);

    loop {
        tokio::select! {
            _ = bot.stopped() => {
                debug!("Stop requested");
                break;
            }
            line = lines.next() => match line {
                None => {
                    info!("Console input closed");
                    break;
                }
                Some(line) => {
                    if let Some(cmd) = ParsedCommand::from_console(&line) {
                        bot.console_router().dispatch(&ctx, &cmd).await;
                    }
                }
            },
        }
    }

    bot.shutdown().await;
}
