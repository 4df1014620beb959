use scraper::{ElementRef, Html, Node};

use crate::text;

/// Subtrees whose text is never shown to a reader.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text nodes, trimmed, one per line. The parser is lenient, so
/// malformed markup still yields whatever text it contains.
pub(crate) fn extract_text(content: &[u8]) -> String {
    let document = Html::parse_document(&text::decode(content));
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts.join("\n")
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if SKIPPED.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(t) => {
                let s = t.trim();
                if !s.is_empty() {
                    parts.push(s.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::extract_text;

    #[test]
    fn scripts_and_styles_are_dropped() {
        let html = br#"<html><head><title>Menu</title><style>p{color:red}</style></head>
            <body><h1>Hours</h1><script>var x = 1;</script><p>Open  <b>9am</b> daily</p><!-- note --></body></html>"#;
        assert_eq!(extract_text(html), "Menu\nHours\nOpen\n9am\ndaily");
    }

    #[test]
    fn unclosed_markup_is_tolerated() {
        assert_eq!(extract_text(b"<div><p>one<p>two"), "one\ntwo");
    }
}
