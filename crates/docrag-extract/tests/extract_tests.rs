use std::io::{Cursor, Write};

use docrag_extract::{extract, Format};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .expect("start file");
    writer.write_all(document_xml.as_bytes()).expect("write xml");
    writer.finish().expect("finish zip").into_inner()
}

fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().expect("encode")));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = i64::try_from(kids.len()).expect("page count");
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

#[test]
fn dispatch_is_case_insensitive() {
    assert_eq!(Format::from_filename("Report.PDF"), Format::Pdf);
    assert_eq!(Format::from_filename("notes.DocX"), Format::Docx);
    assert_eq!(Format::from_filename("index.HTM"), Format::Html);
    assert_eq!(Format::from_filename("page.html"), Format::Html);
    assert_eq!(Format::from_filename("menu.txt"), Format::Text);
    assert_eq!(Format::from_filename("no_extension"), Format::Text);
}

#[test]
fn plain_text_passes_through() {
    assert_eq!(extract("menu.txt", "Soup of the day\n\nTomato".as_bytes()), "Soup of the day\n\nTomato");
}

#[test]
fn docx_paragraphs_are_newline_joined() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Opening hours</w:t></w:r></w:p>
<w:p><w:r><w:t>Mon to Fri</w:t></w:r></w:p>
</w:body></w:document>"#;
    assert_eq!(extract("hours.docx", &docx_bytes(xml)), "Opening hours\nMon to Fri");
}

#[test]
fn broken_docx_degrades_to_empty() {
    assert_eq!(extract("broken.docx", b"definitely not a zip"), "");
    let no_body = {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", zip::write::SimpleFileOptions::default()).expect("start file");
        writer.write_all(b"<x/>").expect("write");
        writer.finish().expect("finish").into_inner()
    };
    assert_eq!(extract("empty.docx", &no_body), "");
}

#[test]
fn html_drops_scripts() {
    let html = b"<html><body><p>Visible</p><script>hidden()</script><style>.h{}</style></body></html>";
    assert_eq!(extract("page.html", html), "Visible");
}

#[test]
fn pdf_pages_are_extracted_in_order() {
    let text = extract("menu.pdf", &pdf_bytes(&["Hello World", "Second page"]));
    let hello = text.find("Hello World").expect("first page text");
    let second = text.find("Second page").expect("second page text");
    assert!(hello < second);
}

#[test]
fn corrupt_pdf_degrades_to_empty() {
    assert_eq!(extract("broken.pdf", b"%PDF-1.7\ngarbage"), "");
}

#[test]
fn byte_corrupted_pdfs_never_escape_extract() {
    let pristine = pdf_bytes(&["Hello World", "Second page"]);
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for _ in 0..3000 {
        let mut bytes = pristine.clone();
        for _ in 0..4 {
            let at = usize::try_from(next() % pristine.len() as u64).expect("index");
            bytes[at] = (next() & 0xff) as u8;
        }
        // any outcome is fine as long as it is a string
        let _ = extract("mutated.pdf", &bytes);
    }
}
