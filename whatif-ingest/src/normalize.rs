//! Canonicalizes decoded page text before any pattern runs.
//!
//! Characters stay in logical (memory) order; no visual bidi reordering is done.

use unicode_normalization::UnicodeNormalization;
use whatif_core::script::{is_hebrew_letter, is_latin_letter};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Split page text into normalized, non-empty lines.
    pub fn normalize_page(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(|line| self.normalize_line(line))
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// NFKC, drop invisible direction marks, split glued Hebrew/Latin runs,
    /// collapse whitespace.
    pub fn normalize_line(&self, line: &str) -> String {
        let composed: String = line.nfkc().filter(|c| !is_format_mark(*c)).collect();

        let mut split = String::with_capacity(composed.len());
        let mut prev: Option<char> = None;
        for c in composed.chars() {
            if let Some(p) = prev {
                if (is_hebrew_letter(p) && is_latin_letter(c))
                    || (is_latin_letter(p) && is_hebrew_letter(c))
                {
                    split.push(' ');
                }
            }
            split.push(c);
            prev = Some(c);
        }

        split.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn is_format_mark(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}'
    )
}
