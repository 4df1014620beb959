use std::io::{Cursor, Read};

use docrag_core::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph texts of a `.docx` body in document order, table cells included.
pub(crate) fn extract_paragraphs(content: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content)).map_err(|e| Error::Extraction(format!("docx container: {e}")))?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| Error::Extraction(format!("docx {DOCUMENT_PART}: {e}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| Error::Extraction(format!("docx {DOCUMENT_PART}: {e}")))?;
    paragraphs_from_xml(&xml)
}

/// Walks WordprocessingML: text lives in `w:t` runs inside `w:p`; tabs and
/// breaks are empty elements. Paragraphs may nest (text boxes), so open ones
/// are kept on a stack.
pub(crate) fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let ch = match e.name().as_ref() {
                    b"w:p" => {
                        paragraphs.push(String::new());
                        None
                    }
                    b"w:tab" => Some('\t'),
                    b"w:br" | b"w:cr" => Some('\n'),
                    _ => None,
                };
                if let (Some(ch), Some(current)) = (ch, open.last_mut()) {
                    current.push(ch);
                }
            }
            Ok(Event::Text(t)) if in_text => {
                let s = t.unescape().map_err(|e| Error::Extraction(format!("docx text: {e}")))?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&s);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Extraction(format!("docx xml at {}: {e}", reader.buffer_position()))),
            _ => {}
        }
    }
    Ok(paragraphs)
}
