//! Text segmentation port.
//!
//! Used for display and diagnostics only. Nothing in the sync path depends
//! on the tokens it produces.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Script {
    Hiragana,
    Katakana,
    Kanji,
    Latin,
    Digit,
    Whitespace,
    Other,
}

impl Script {
    pub fn is_japanese(self) -> bool {
        matches!(self, Self::Hiragana | Self::Katakana | Self::Kanji)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextToken {
    pub surface: String,
    pub script: Script,
}

impl TextToken {
    pub fn new(surface: impl Into<String>, script: Script) -> Self {
        Self {
            surface: surface.into(),
            script,
        }
    }
}

pub trait TextSegmenterPort: Send + Sync {
    /// Split `text` into an ordered sequence of tokens whose surfaces
    /// concatenate back to `text`.
    fn segment(&self, text: &str) -> Vec<TextToken>;
}
