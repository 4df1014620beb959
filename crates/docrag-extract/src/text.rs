/// Decodes UTF-8, replacing invalid byte sequences with U+FFFD.
pub(crate) fn decode(content: &[u8]) -> String {
    String::from_utf8_lossy(content).into_owned()
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn invalid_bytes_are_replaced() {
        assert_eq!(decode(b"caf\xc3\xa9 \xffok"), "café \u{FFFD}ok");
        assert_eq!(decode(b"plain"), "plain");
        assert_eq!(decode(b""), "");
    }
}
