//! Page sources: the PDF text layer (via lopdf) or pre-extracted text.

use anyhow::{Context, Result, bail};
use lopdf::Document;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use whatif_core::RawPage;

/// Decode the text layer of every page. A page that fails to decode becomes an
/// empty page; only an unreadable document is an error.
pub fn read_pdf_pages(path: impl AsRef<Path>) -> Result<Vec<RawPage>> {
    let path = path.as_ref();
    let document =
        Document::load(path).with_context(|| format!("loading PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for (index, page_number) in document.get_pages().keys().enumerate() {
        let text = match document.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!(page = index, "failed to extract page text: {e}");
                String::new()
            }
        };
        debug!(page = index, chars = text.chars().count(), "decoded page");
        pages.push(RawPage::new(index, text));
    }

    Ok(pages)
}

/// Read text decoded elsewhere, with pages separated by form feeds.
pub fn read_text_pages(path: impl AsRef<Path>) -> Result<Vec<RawPage>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(split_pages(&text))
}

/// Load a statement. A missing file is an error; an unreadable one reads as
/// zero pages and ends in "no transactions found".
pub fn read_pages(path: impl AsRef<Path>, text: bool) -> Result<Vec<RawPage>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("statement not found: {}", path.display());
    }
    let pages = if text {
        read_text_pages(path)
    } else {
        read_pdf_pages(path)
    };
    Ok(pages.unwrap_or_else(|e| {
        warn!("could not read {}: {e:#}", path.display());
        Vec::new()
    }))
}

pub fn split_pages(text: &str) -> Vec<RawPage> {
    text.split('\u{000C}')
        .enumerate()
        .map(|(index, page)| RawPage::new(index, page))
        .collect()
}
