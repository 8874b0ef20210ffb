//! Port interfaces implemented by the platform layer.
//!
//! Ports keep the sync logic independent of how the clipboard is reached,
//! how time is read and how text is segmented for diagnostics.

mod clipboard;
mod clock;
mod segmenter;

pub use clipboard::SystemClipboardPort;
pub use clock::ClockPort;
pub use segmenter::{Script, TextSegmenterPort, TextToken};
