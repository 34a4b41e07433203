//! Line-based console control surface.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin};

use crate::agent::control::{ControlAction, ControlSource};

/// Reads operator commands line by line. Messages go to stdout.
pub struct ConsoleSource<R> {
    lines: Lines<BufReader<R>>,
}

impl ConsoleSource<Stdin> {
    #[must_use]
    pub fn stdin() -> Self { Self::new(tokio::io::stdin()) }
}

impl<R: AsyncRead + Unpin + Send> ConsoleSource<R> {
    #[must_use]
    pub fn new(reader: R) -> Self { Self { lines: BufReader::new(reader).lines() } }

    async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "could not read control input");
                None
            }
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ControlSource for ConsoleSource<R> {
    async fn next_action(&mut self) -> Option<ControlAction> {
        loop {
            let line = self.next_line().await?;
            let command = line.trim();
            if command.is_empty() {
                continue;
            }

            match ControlAction::parse(command) {
                Some(action) => return Some(action),
                None => self.show(&format!("Unknown command {command:?}. Type \"help\" for the list.")),
            }
        }
    }

    async fn prompt(&mut self, message: &str) -> Option<String> {
        self.show(message);
        self.next_line().await
    }

    fn show(&mut self, message: &str) { println!("{message}"); }
}
