//! Script-aware text segmentation, used for diagnostics only.
//!
//! Text is first split at Unicode word boundaries. Adjacent segments of the
//! same Japanese script are then merged, since word-boundary rules split
//! hiragana and kanji runs into single characters.

use tc_core::ports::{Script, TextSegmenterPort, TextToken};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptSegmenter;

impl ScriptSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl TextSegmenterPort for ScriptSegmenter {
    fn segment(&self, text: &str) -> Vec<TextToken> {
        let mut tokens: Vec<TextToken> = Vec::new();

        for word in text.split_word_bounds() {
            let script = classify_segment(word);
            match tokens.last_mut() {
                Some(last) if last.script == script && script.is_japanese() => {
                    last.surface.push_str(word);
                }
                _ => tokens.push(TextToken::new(word, script)),
            }
        }

        tokens
    }
}

fn classify_segment(segment: &str) -> Script {
    let mut chars = segment.chars().map(classify_char);
    let Some(first) = chars.next() else {
        return Script::Other;
    };
    if chars.all(|script| script == first) {
        first
    } else {
        Script::Other
    }
}

pub fn classify_char(c: char) -> Script {
    match c {
        '\u{3040}'..='\u{309F}' => Script::Hiragana,
        // Includes the prolonged sound mark 'ー' (U+30FC)
        '\u{30A0}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9F}' => Script::Katakana,
        '\u{4E00}'..='\u{9FFF}' | '々' => Script::Kanji,
        c if c.is_whitespace() => Script::Whitespace,
        c if c.is_numeric() => Script::Digit,
        c if c.is_alphabetic() => Script::Latin,
        _ => Script::Other,
    }
}
