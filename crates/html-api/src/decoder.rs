//! Character reference decoding for text nodes and attribute values.
//!
//! The tables and the tolerant reference reader live in the `entities`
//! crate; this module applies them the way HTML text and attribute values
//! require.

pub use entities::HtmlContext;

/// How `attribute_starts_with` compares bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    #[default]
    CaseSensitive,
    AsciiCaseInsensitive,
}

/// Decodes the raw contents of a text node.
///
/// Example:
///
/// ```text
/// "&lt;p&gt; &amp;nbsp; &unknown; &" -> "<p> &nbsp; &unknown; &"
/// ```
pub fn decode_text_node(text: &[u8]) -> Box<[u8]> {
    entities::decode(&HtmlContext::BodyText, text)
}

/// Decodes the raw value of an attribute.
///
/// Named references missing their semicolon are left alone when followed by
/// an alphanumeric or `=`, so `?a=1&copy=2` keeps its query string.
pub fn decode_attribute(text: &[u8]) -> Box<[u8]> {
    entities::decode(&HtmlContext::Attribute, text)
}

/// Reads the character reference starting at `at`, if one starts there.
///
/// Returns the decoded bytes and how many bytes of `text` the reference spans.
pub fn read_character_reference(
    context: HtmlContext,
    text: &[u8],
    at: usize,
) -> Option<(Box<[u8]>, usize)> {
    if at >= text.len() || text[at] != b'&' {
        return None;
    }
    entities::read_character_reference(&context, text, at)
}

/// Indicates whether the decoded form of the raw attribute value `haystack`
/// starts with `search_text`, decoding only as much as needed.
///
/// Example:
///
/// ```text
/// attribute_starts_with(b"&#x6a;avascript&colon;alert(1)", b"javascript:", CaseSensitive) == true
/// ```
pub fn attribute_starts_with(
    haystack: &[u8],
    search_text: &[u8],
    case_sensitivity: CaseSensitivity,
) -> bool {
    let loose_case = case_sensitivity == CaseSensitivity::AsciiCaseInsensitive;
    let bytes_match = |a: &[u8], b: &[u8]| {
        if loose_case {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };

    let search_length = search_text.len();
    let mut search_at = 0;
    let mut haystack_at = 0;

    while search_at < search_length && haystack_at < haystack.len() {
        let next_chunk = if haystack[haystack_at] == b'&' {
            read_character_reference(HtmlContext::Attribute, haystack, haystack_at)
        } else {
            None
        };

        let Some((chunk, token_length)) = next_chunk else {
            if !bytes_match(
                &haystack[haystack_at..=haystack_at],
                &search_text[search_at..=search_at],
            ) {
                return false;
            }
            haystack_at += 1;
            search_at += 1;
            continue;
        };

        // A decoded reference only matches as a whole.
        let remaining = &search_text[search_at..];
        if chunk.len() > remaining.len() || !bytes_match(&chunk, &remaining[..chunk.len()]) {
            return false;
        }

        haystack_at += token_length;
        search_at += chunk.len();
    }

    search_at == search_length
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use CaseSensitivity::*;

    #[test]
    fn decodes_text_nodes() {
        assert_eq!(
            decode_text_node(b"&lt;p&gt; &amp;nbsp; &unknown; &").as_ref(),
            b"<p> &nbsp; &unknown; &"
        );
        assert_eq!(decode_text_node(b"&notin").as_ref(), "¬in".as_bytes());
        assert_eq!(decode_text_node(b"&#x80;&#0;").as_ref(), "€\u{FFFD}".as_bytes());
    }

    #[test]
    fn attributes_keep_ambiguous_ampersands() {
        assert_eq!(
            decode_attribute(b"?a=1&copy=2&amp;b").as_ref(),
            b"?a=1&copy=2&b"
        );
        assert_eq!(decode_attribute(b"&copy ").as_ref(), "© ".as_bytes());
    }

    #[test]
    fn reads_single_references() {
        assert_eq!(
            read_character_reference(HtmlContext::BodyText, b"a &gt; b", 2),
            Some((b">".as_slice().into(), 4))
        );
        assert_eq!(
            read_character_reference(HtmlContext::BodyText, b"a &gt; b", 1),
            None
        );
        assert_eq!(read_character_reference(HtmlContext::BodyText, b"&", 5), None);
    }

    #[test]
    fn prefix_matching_decodes_lazily() {
        assert!(attribute_starts_with(
            b"&#x6a;avascript&colon;alert(1)",
            b"javascript:",
            CaseSensitive
        ));
        assert!(attribute_starts_with(
            b"JAVA&#83;cript:",
            b"javascript:",
            AsciiCaseInsensitive
        ));
        assert!(!attribute_starts_with(
            b"JAVAscript:",
            b"javascript:",
            CaseSensitive
        ));
        assert!(!attribute_starts_with(b"java", b"javascript", CaseSensitive));
        assert!(attribute_starts_with(b"anything", b"", CaseSensitive));
    }

    #[test]
    fn prefix_never_splits_a_reference() {
        let e_acute = "é".as_bytes();
        assert!(attribute_starts_with(b"&eacute;t\xC3\xA9", e_acute, CaseSensitive));
        assert!(!attribute_starts_with(b"&eacute;", &e_acute[..1], CaseSensitive));
        assert!(!attribute_starts_with(b"&lt;&gt;", b"<>>", CaseSensitive));
    }
}
