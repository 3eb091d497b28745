use memchr::memmem;

pub fn substr(s: &[u8], offset: usize, length: usize) -> &[u8] {
    &s[offset..offset + length]
}

/// Finds `pattern` in `s` at or after `offset`.
pub fn strpos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if offset > s.len() {
        return None;
    }
    memmem::find(&s[offset..], pattern).map(|at| at + offset)
}

/// Finds `pattern` in `s` at or after `offset`, ignoring ASCII case.
pub fn stripos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    let p_len = pattern.len();

    if p_len == 0 {
        return (offset <= s.len()).then_some(offset);
    }

    if offset + p_len > s.len() {
        return None;
    }

    let first_lower = pattern[0].to_ascii_lowercase();
    let first_upper = pattern[0].to_ascii_uppercase();
    let mut at = offset;

    while at + p_len <= s.len() {
        at += memchr::memchr2(first_lower, first_upper, &s[at..=s.len() - p_len])?;

        if pattern.eq_ignore_ascii_case(&s[at..at + p_len]) {
            return Some(at);
        }

        at += 1;
    }

    None
}

/// Escapes the bytes which are syntax inside text and quoted attribute values.
pub fn html_special_chars(text: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(text.len());
    for &c in text {
        match c {
            b'&' => escaped.extend_from_slice(b"&amp;"),
            b'<' => escaped.extend_from_slice(b"&lt;"),
            b'>' => escaped.extend_from_slice(b"&gt;"),
            b'"' => escaped.extend_from_slice(b"&quot;"),
            b'\'' => escaped.extend_from_slice(b"&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strpos_finds_pattern_at_end_of_input() {
        assert_eq!(strpos(b"abc-->", b"-->", 0), Some(3));
        assert_eq!(strpos(b"abc-->", b"-->", 4), None);
        assert_eq!(strpos(b"abc", b"", 1), Some(1));
    }

    #[test]
    fn stripos_ignores_ascii_case() {
        assert_eq!(stripos(b"x</SCRIPT>", b"</script", 0), Some(1));
        assert_eq!(stripos(b"</script", b"</script", 0), Some(0));
        assert_eq!(stripos(b"</scrip", b"</script", 0), None);
        assert_eq!(stripos(b"<s </s", b"</s", 1), Some(3));
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            html_special_chars(b"<a href=\"x\">Tom & 'Jerry'</a>"),
            b"&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;".to_vec()
        );
        assert_eq!(html_special_chars("caf\u{e9}".as_bytes()), "caf\u{e9}".as_bytes().to_vec());
    }

    #[test]
    fn spans_count_matching_runs() {
        let input = b"   abc";
        assert_eq!(strspn!(input, b' ', 0), 3);
        assert_eq!(strspn!(input, b' ', 3), 0);
        assert_eq!(strspn!(b"    ", b' ', 1), 3);
        assert_eq!(strspn!(b"    ", b' ', 1, 2), 2);
        assert_eq!(strcspn!(input, b'c', 0), 5);
        assert_eq!(strcspn!(input, b'z', 2), 4);
    }
}
