//! Polling clipboard watcher.
//!
//! Turns clipboard changes into events on the sync engine's queue. The value
//! present when the watcher starts is the baseline and is not reported.

use std::sync::Arc;
use std::time::Duration;

use tc_core::clipboard::content_hash;
pub use tc_core::clipboard::LocalClipboardChanged;
use tc_core::ports::SystemClipboardPort;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct ClipboardWatcher<E> {
    clipboard: Arc<dyn SystemClipboardPort>,
    sender: mpsc::Sender<E>,
    poll_interval: Duration,
    last_hash: Option<String>,
}

impl<E> ClipboardWatcher<E>
where
    E: From<LocalClipboardChanged>,
{
    pub fn new(
        clipboard: Arc<dyn SystemClipboardPort>,
        sender: mpsc::Sender<E>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            clipboard,
            sender,
            poll_interval,
            last_hash: None,
        }
    }

    /// Poll until cancelled or until the event queue is closed.
    pub async fn run(mut self, cancel: CancellationToken) {
        self.last_hash = self.read().as_deref().map(content_hash);
        info!(interval = ?self.poll_interval, "clipboard watcher started");

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(change) = self.poll() else {
                continue;
            };
            if self.sender.send(E::from(change)).await.is_err() {
                debug!("event queue closed, watcher exiting");
                break;
            }
        }

        info!("clipboard watcher stopped");
    }

    /// Read once and report a change against the previous read.
    pub fn poll(&mut self) -> Option<LocalClipboardChanged> {
        let text = self.read()?;
        let hash = content_hash(&text);
        if self.last_hash.as_ref() == Some(&hash) {
            return None;
        }
        self.last_hash = Some(hash);
        Some(LocalClipboardChanged(text))
    }

    fn read(&self) -> Option<String> {
        match self.clipboard.read_text() {
            Ok(Some(text)) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "failed to read clipboard");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::InMemoryClipboard;

    fn watcher(
        clipboard: &InMemoryClipboard,
    ) -> (
        ClipboardWatcher<LocalClipboardChanged>,
        mpsc::Receiver<LocalClipboardChanged>,
    ) {
        let (tx, rx) = mpsc::channel(8);
        let watcher = ClipboardWatcher::new(
            Arc::new(clipboard.clone()),
            tx,
            Duration::from_millis(100),
        );
        (watcher, rx)
    }

    #[test]
    fn test_poll_reports_each_change_once() {
        let clipboard = InMemoryClipboard::new();
        let (mut watcher, _rx) = watcher(&clipboard);

        assert_eq!(watcher.poll(), None);
        clipboard.set("a").unwrap();
        assert_eq!(watcher.poll(), Some(LocalClipboardChanged("a".into())));
        assert_eq!(watcher.poll(), None);
        clipboard.set("b").unwrap();
        assert_eq!(watcher.poll(), Some(LocalClipboardChanged("b".into())));
    }

    #[test]
    fn test_empty_text_is_ignored() {
        let clipboard = InMemoryClipboard::with_text("");
        let (mut watcher, _rx) = watcher(&clipboard);
        assert_eq!(watcher.poll(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_skips_baseline() {
        let clipboard = InMemoryClipboard::with_text("already there");
        let (watcher, mut rx) = watcher(&clipboard);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watcher.run(cancel.clone()));

        time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err());

        clipboard.set("new").unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change, LocalClipboardChanged("new".into()));

        cancel.cancel();
        task.await.unwrap();
    }
}
