//! Clipboard adapters.

mod memory;
mod stdio;
mod system;

pub use memory::InMemoryClipboard;
pub use stdio::StdioClipboard;
pub use system::SystemClipboard;
