use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tc_core::clipboard::LocalClipboardChanged;
use tc_core::ports::SystemClipboardPort;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Line-oriented clipboard for terminals and pipes.
///
/// Every line read from stdin becomes the clipboard value and is queued as a
/// local change at once, so no polling is needed and no line is skipped.
/// Values written by the sync engine are printed to stdout, one per line.
#[derive(Debug, Clone, Default)]
pub struct StdioClipboard {
    value: Arc<Mutex<Option<String>>>,
}

impl StdioClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed stdin lines into the clipboard and `events` until EOF or
    /// cancellation.
    pub fn spawn_stdin_reader<E>(
        &self,
        events: mpsc::Sender<E>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()>
    where
        E: From<LocalClipboardChanged> + Send + 'static,
    {
        let clipboard = self.clone();
        tokio::spawn(async move {
            clipboard
                .read_lines(BufReader::new(tokio::io::stdin()), &events, cancel)
                .await
        })
    }

    async fn read_lines<R, E>(&self, reader: R, events: &mpsc::Sender<E>, cancel: CancellationToken)
    where
        R: AsyncBufRead + Unpin,
        E: From<LocalClipboardChanged>,
    {
        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) if line.is_empty() => {}
                Ok(Some(line)) => {
                    if let Err(err) = self.store(line.clone()) {
                        warn!(error = %err, "dropping stdin line");
                        continue;
                    }
                    if events.send(LocalClipboardChanged(line).into()).await.is_err() {
                        debug!("event queue closed, stdin reader stopping");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    }

    fn store(&self, text: String) -> Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| anyhow!("stdio clipboard lock poisoned"))?;
        *value = Some(text);
        Ok(())
    }
}

impl SystemClipboardPort for StdioClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        let value = self
            .value
            .lock()
            .map_err(|_| anyhow!("stdio clipboard lock poisoned"))?;
        Ok(value.clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.store(text.to_owned())?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}").context("failed to write to stdout")?;
        stdout.flush().context("failed to flush stdout")
    }
}
