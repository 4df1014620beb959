use docrag_core::error::{Error, Result};
use lopdf::Document;
use tracing::debug;

/// Text of each page in page order. A page whose text cannot be decoded is
/// left out; only an unreadable document is an error.
pub(crate) fn extract_pages(content: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(content).map_err(|e| Error::Extraction(format!("pdf: {e}")))?;
    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for page_no in pages.keys() {
        match doc.extract_text(&[*page_no]) {
            Ok(text) => texts.push(text),
            Err(e) => debug!(page = page_no, error = %e, "skipping unreadable pdf page"),
        }
    }
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::extract_pages;

    #[test]
    fn garbage_is_an_error() {
        assert!(extract_pages(b"%PDF-1.4 not really").is_err());
        assert!(extract_pages(b"").is_err());
    }
}
