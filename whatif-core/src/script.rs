//! Script detection for mixed Latin/Hebrew statement text.

pub fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c) || ('\u{FB1D}'..='\u{FB4F}').contains(&c)
}

pub fn is_hebrew_letter(c: char) -> bool {
    is_hebrew(c) && c.is_alphabetic()
}

pub fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

pub fn has_latin(s: &str) -> bool {
    s.chars().any(is_latin_letter)
}

pub fn has_hebrew(s: &str) -> bool {
    s.chars().any(is_hebrew_letter)
}

/// Latin text dominates: at least 3 Latin letters and more Latin than Hebrew letters.
pub fn is_latin_dominant(s: &str) -> bool {
    let latin = s.chars().filter(|c| is_latin_letter(*c)).count();
    let hebrew = s.chars().filter(|c| is_hebrew_letter(*c)).count();
    latin >= 3 && latin > hebrew
}
