//! # tc-platform
//!
//! Platform adapters for tcpclipboard.
//!
//! Implements the ports declared in `tc-core`: clipboard access (system,
//! in-memory and stdio), the polling clipboard watcher, the text segmenter
//! and the wall clock.

pub mod clipboard;
pub mod clock;
pub mod segmenter;
pub mod watcher;

pub use clipboard::{InMemoryClipboard, StdioClipboard, SystemClipboard};
pub use clock::SystemClock;
pub use segmenter::ScriptSegmenter;
pub use watcher::{ClipboardWatcher, LocalClipboardChanged};
