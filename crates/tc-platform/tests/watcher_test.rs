use std::sync::Arc;
use std::time::Duration;

use tc_platform::{ClipboardWatcher, InMemoryClipboard, LocalClipboardChanged};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq)]
enum Event {
    Local(String),
}

impl From<LocalClipboardChanged> for Event {
    fn from(change: LocalClipboardChanged) -> Self {
        Event::Local(change.into_text())
    }
}

#[tokio::test(start_paused = true)]
async fn test_watcher_feeds_custom_event_queue() {
    let clipboard = InMemoryClipboard::new();
    let (tx, mut rx) = mpsc::channel::<Event>(4);
    let watcher = ClipboardWatcher::new(Arc::new(clipboard.clone()), tx, Duration::from_millis(50));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(watcher.run(cancel.clone()));

    clipboard.set("copied").unwrap();
    assert_eq!(rx.recv().await, Some(Event::Local("copied".into())));

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_watcher_exits_when_queue_closes() {
    let clipboard = InMemoryClipboard::new();
    let (tx, rx) = mpsc::channel::<Event>(4);
    let watcher = ClipboardWatcher::new(Arc::new(clipboard.clone()), tx, Duration::from_millis(50));
    let task = tokio::spawn(watcher.run(CancellationToken::new()));

    drop(rx);
    clipboard.set("nobody listens").unwrap();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("watcher should stop")
        .unwrap();
}
