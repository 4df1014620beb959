//! Turns uploaded file bytes into plain text, dispatching on the filename.
//!
//! [`extract`] never fails: a document that cannot be read degrades to an
//! empty string and is logged. The per-format helpers return `Result` so
//! the fallback is decided here, in one place. Parser panics on malformed
//! input are caught and treated the same way.

mod docx;
mod html;
mod pdf;
mod text;

use std::panic::{catch_unwind, UnwindSafe};

use docrag_core::error::Result;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Html,
    Text,
}

impl Format {
    /// Case-insensitive extension match; anything unknown is treated as UTF-8 text.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            Self::Pdf
        } else if lower.ends_with(".docx") {
            Self::Docx
        } else if lower.ends_with(".html") || lower.ends_with(".htm") {
            Self::Html
        } else {
            Self::Text
        }
    }
}

pub fn extract(filename: &str, content: &[u8]) -> String {
    let format = Format::from_filename(filename);
    guarded(filename, format, || match format {
        Format::Pdf => pdf::extract_pages(content).map(|pages| pages.join("\n")),
        Format::Docx => docx::extract_paragraphs(content).map(|paragraphs| paragraphs.join("\n")),
        Format::Html => Ok(html::extract_text(content)),
        Format::Text => Ok(text::decode(content)),
    })
}

fn guarded<F>(filename: &str, format: Format, run: F) -> String
where
    F: FnOnce() -> Result<String> + UnwindSafe,
{
    match catch_unwind(run) {
        Ok(Ok(text)) => {
            debug!(filename, ?format, chars = text.chars().count(), "extracted text");
            text
        }
        Ok(Err(e)) => {
            warn!(filename, ?format, error = %e, "extraction failed; treating document as empty");
            String::new()
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_string());
            warn!(filename, ?format, reason, "extractor panicked; treating document as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::error::Error;

    #[test]
    fn panicking_parser_degrades_to_empty() {
        let text = guarded("boom.pdf", Format::Pdf, || -> Result<String> { panic!("index out of bounds") });
        assert_eq!(text, "");
    }

    #[test]
    fn parser_error_degrades_to_empty() {
        let text = guarded("bad.docx", Format::Docx, || Err(Error::Extraction("no body".into())));
        assert_eq!(text, "");
        assert_eq!(guarded("ok.txt", Format::Text, || Ok("fine".to_string())), "fine");
    }
}
