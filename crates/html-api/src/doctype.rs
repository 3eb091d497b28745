//! DOCTYPE declarations and the document compatibility mode they indicate.
//!
//! All HTML documents should start with `<!DOCTYPE html>`. Other
//! declarations are still parsed, and legacy public and system identifiers
//! select quirks or limited-quirks mode.
//!
//! @see https://html.spec.whatwg.org/#the-doctype
//! @see https://html.spec.whatwg.org/#the-initial-insertion-mode

use crate::compat_mode::CompatMode;

/// Public identifier prefixes which put a document in quirks mode.
const QUIRKS_PUBLIC_ID_PREFIXES: &[&[u8]] = &[
    b"+//silmaril//dtd html pro v0r11 19970101//",
    b"-//as//dtd html 3.0 aswedit + extensions//",
    b"-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    b"-//ietf//dtd html 2.0 level 1//",
    b"-//ietf//dtd html 2.0 level 2//",
    b"-//ietf//dtd html 2.0 strict level 1//",
    b"-//ietf//dtd html 2.0 strict level 2//",
    b"-//ietf//dtd html 2.0 strict//",
    b"-//ietf//dtd html 2.0//",
    b"-//ietf//dtd html 2.1e//",
    b"-//ietf//dtd html 3.0//",
    b"-//ietf//dtd html 3.2 final//",
    b"-//ietf//dtd html 3.2//",
    b"-//ietf//dtd html 3//",
    b"-//ietf//dtd html level 0//",
    b"-//ietf//dtd html level 1//",
    b"-//ietf//dtd html level 2//",
    b"-//ietf//dtd html level 3//",
    b"-//ietf//dtd html strict level 0//",
    b"-//ietf//dtd html strict level 1//",
    b"-//ietf//dtd html strict level 2//",
    b"-//ietf//dtd html strict level 3//",
    b"-//ietf//dtd html strict//",
    b"-//ietf//dtd html//",
    b"-//metrius//dtd metrius presentational//",
    b"-//microsoft//dtd internet explorer 2.0 html strict//",
    b"-//microsoft//dtd internet explorer 2.0 html//",
    b"-//microsoft//dtd internet explorer 2.0 tables//",
    b"-//microsoft//dtd internet explorer 3.0 html strict//",
    b"-//microsoft//dtd internet explorer 3.0 html//",
    b"-//microsoft//dtd internet explorer 3.0 tables//",
    b"-//netscape comm. corp.//dtd html//",
    b"-//netscape comm. corp.//dtd strict html//",
    b"-//o'reilly and associates//dtd html 2.0//",
    b"-//o'reilly and associates//dtd html extended 1.0//",
    b"-//o'reilly and associates//dtd html extended relaxed 1.0//",
    b"-//sq//dtd html 2.0 hotmetal + extensions//",
    b"-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    b"-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    b"-//spyglass//dtd html 2.0 extended//",
    b"-//sun microsystems corp.//dtd hotjava html//",
    b"-//sun microsystems corp.//dtd hotjava strict html//",
    b"-//w3c//dtd html 3 1995-03-24//",
    b"-//w3c//dtd html 3.2 draft//",
    b"-//w3c//dtd html 3.2 final//",
    b"-//w3c//dtd html 3.2//",
    b"-//w3c//dtd html 3.2s draft//",
    b"-//w3c//dtd html 4.0 frameset//",
    b"-//w3c//dtd html 4.0 transitional//",
    b"-//w3c//dtd html experimental 19960712//",
    b"-//w3c//dtd html experimental 970421//",
    b"-//w3c//dtd w3 html//",
    b"-//w3o//dtd w3 html 3.0//",
    b"-//webtechs//dtd mozilla html 2.0//",
    b"-//webtechs//dtd mozilla html//",
];

/// Prefixes which mean quirks mode without a system identifier and
/// limited-quirks mode with one.
const HTML_401_PUBLIC_ID_PREFIXES: &[&[u8]] = &[
    b"-//w3c//dtd html 4.01 frameset//",
    b"-//w3c//dtd html 4.01 transitional//",
];

const LIMITED_QUIRKS_PUBLIC_ID_PREFIXES: &[&[u8]] = &[
    b"-//w3c//dtd xhtml 1.0 frameset//",
    b"-//w3c//dtd xhtml 1.0 transitional//",
];

/// A parsed DOCTYPE declaration.
///
/// `None` identifiers were missing from the declaration, which differs from
/// an empty quoted identifier.
///
/// ```text
/// <!DOCTYPE html PUBLIC "public id goes here in quotes" "system id goes here in quotes">
///           │  │         ╰─── public identifier ─────╯   ╰──── system identifier ────╯
///           ╰──┴── name is "html".
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDoctypeInfo {
    /// Lowercased name; should be "html" for HTML documents.
    pub name: Option<Box<[u8]>>,
    pub public_identifier: Option<Box<[u8]>>,
    pub system_identifier: Option<Box<[u8]>>,
    /// Mode a parser would choose if nothing else had determined it.
    pub indicated_compat_mode: CompatMode,
}

/// Where the declaration grammar resumes after the name.
enum DoctypePhase {
    PublicIdentifier,
    SystemIdentifier,
    Done,
}

impl HtmlDoctypeInfo {
    fn new(
        name: Option<Box<[u8]>>,
        public_identifier: Option<Box<[u8]>>,
        system_identifier: Option<Box<[u8]>>,
        force_quirks_flag: bool,
    ) -> Self {
        let indicated_compat_mode = indicated_compat_mode(
            name.as_deref(),
            public_identifier.as_deref(),
            system_identifier.as_deref(),
            force_quirks_flag,
        );
        Self {
            name,
            public_identifier,
            system_identifier,
            indicated_compat_mode,
        }
    }

    /// Parses a complete raw DOCTYPE token such as `<!DOCTYPE html>`.
    ///
    /// The declaration need not be valid, but the input must be exactly one
    /// DOCTYPE token: it starts with `<!DOCTYPE` and its only `>` is the last
    /// byte. Anything else returns `None`.
    ///
    /// Example:
    ///
    /// ```text
    /// from_doctype_token(b"<!DOCTYPE html>")              -> no-quirks
    /// from_doctype_token(b"<!doctypeJSON SILLY \"x'>")    -> quirks
    /// from_doctype_token(b" <!DOCTYPE>")                  -> None
    /// ```
    pub fn from_doctype_token(doctype_html: &[u8]) -> Option<Self> {
        if doctype_html.len() < 10 || !doctype_html[0..9].eq_ignore_ascii_case(b"<!DOCTYPE") {
            return None;
        }

        let mut at: usize = 9;
        if b'>' != doctype_html[doctype_html.len() - 1]
            || at + strcspn!(doctype_html, b'>', at) < doctype_html.len() - 1
        {
            return None;
        }

        let doctype_html = normalize_doctype_bytes(doctype_html);
        let doctype_html = doctype_html.as_slice();
        let end = doctype_html.len() - 1;

        let mut name = None;
        let mut public_identifier = None;
        let mut system_identifier = None;

        macro_rules! finish {
            ($force_quirks:expr) => {
                return Some(Self::new(
                    name,
                    public_identifier,
                    system_identifier,
                    $force_quirks,
                ))
            };
        }

        // Before DOCTYPE name.
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            finish!(true);
        }

        let name_length = strcspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at);
        let name_length = name_length.min(end - at);
        name = Some(doctype_html[at..at + name_length].to_ascii_lowercase().into());

        // After DOCTYPE name.
        at += name_length;
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            finish!(false);
        }

        if at + 6 > end {
            finish!(true);
        }

        let keyword = &doctype_html[at..at + 6];
        let mut phase = if keyword.eq_ignore_ascii_case(b"PUBLIC") {
            DoctypePhase::PublicIdentifier
        } else if keyword.eq_ignore_ascii_case(b"SYSTEM") {
            DoctypePhase::SystemIdentifier
        } else {
            finish!(true);
        };

        at += 6;
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at, end - at);
        if at >= end {
            finish!(true);
        }

        loop {
            phase = match phase {
                DoctypePhase::PublicIdentifier | DoctypePhase::SystemIdentifier => {
                    let closer_quote = doctype_html[at];
                    if b'"' != closer_quote && b'\'' != closer_quote {
                        finish!(true);
                    }

                    at += 1;
                    let identifier_length =
                        strcspn!(doctype_html, x if x == closer_quote, at).min(end - at);
                    let identifier = Some(doctype_html[at..at + identifier_length].into());
                    let is_public = matches!(phase, DoctypePhase::PublicIdentifier);
                    if is_public {
                        public_identifier = identifier;
                    } else {
                        system_identifier = identifier;
                    }

                    at += identifier_length;
                    if at >= end {
                        finish!(true);
                    }
                    at += 1;

                    if !is_public {
                        DoctypePhase::Done
                    } else {
                        // Between public and system identifiers.
                        at += strspn!(
                            doctype_html,
                            b' ' | b'\t' | b'\n' | 0x0c | b'\r',
                            at,
                            end - at
                        );
                        if at >= end {
                            finish!(false);
                        }
                        DoctypePhase::SystemIdentifier
                    }
                }
                // Anything after the system identifier is bogus but harmless.
                DoctypePhase::Done => finish!(false),
            }
        }
    }
}

/// Normalizes newlines and replaces NULL bytes inside a DOCTYPE token.
fn normalize_doctype_bytes(doctype_html: &[u8]) -> Vec<u8> {
    let mut normalized = Vec::with_capacity(doctype_html.len());
    let mut bytes = doctype_html.iter().peekable();
    while let Some(&c) = bytes.next() {
        match c {
            b'\r' => {
                bytes.next_if_eq(&&b'\n');
                normalized.push(b'\n');
            }
            b'\0' => normalized.extend_from_slice("\u{FFFD}".as_bytes()),
            _ => normalized.push(c),
        }
    }
    normalized
}

/// Compatibility mode selected by a DOCTYPE token.
///
/// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
fn indicated_compat_mode(
    name: Option<&[u8]>,
    public_identifier: Option<&[u8]>,
    system_identifier: Option<&[u8]>,
    force_quirks_flag: bool,
) -> CompatMode {
    if force_quirks_flag || name != Some(b"html".as_slice()) {
        return CompatMode::Quirks;
    }

    // Normative documents skip the identifier tables.
    if public_identifier.is_none() && system_identifier.is_none() {
        return CompatMode::NoQuirks;
    }

    let public_id = public_identifier.unwrap_or_default().to_ascii_lowercase();
    let system_id = system_identifier.unwrap_or_default().to_ascii_lowercase();
    let system_identifier_is_missing = system_identifier.is_none();
    let starts_with_any = |prefixes: &[&[u8]]| prefixes.iter().any(|p| public_id.starts_with(p));

    if matches!(
        public_id.as_slice(),
        b"-//w3o//dtd w3 html strict 3.0//en//" | b"-/w3c/dtd html 4.0 transitional/en" | b"html"
    ) || system_id == b"http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"
    {
        return CompatMode::Quirks;
    }

    if public_id.is_empty() {
        return CompatMode::NoQuirks;
    }

    if starts_with_any(QUIRKS_PUBLIC_ID_PREFIXES)
        || (system_identifier_is_missing && starts_with_any(HTML_401_PUBLIC_ID_PREFIXES))
    {
        return CompatMode::Quirks;
    }

    if starts_with_any(LIMITED_QUIRKS_PUBLIC_ID_PREFIXES)
        || (!system_identifier_is_missing && starts_with_any(HTML_401_PUBLIC_ID_PREFIXES))
    {
        return CompatMode::LimitedQuirks;
    }

    CompatMode::NoQuirks
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    macro_rules! test_doctype_info {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (html, mode, name, public_id, system_id): (&str, CompatMode, Option<&str>, Option<&str>, Option<&str>) = $value;
                let doctype = HtmlDoctypeInfo::from_doctype_token(html.as_bytes())
                    .unwrap_or_else(|| panic!("Should have parsed {html:?}"));

                assert_eq!(mode, doctype.indicated_compat_mode, "compat mode of {html:?}");
                assert_eq!(name.map(|v| v.as_bytes().into()), doctype.name, "name of {html:?}");
                assert_eq!(
                    public_id.map(|v| v.as_bytes().into()),
                    doctype.public_identifier,
                    "public identifier of {html:?}"
                );
                assert_eq!(
                    system_id.map(|v| v.as_bytes().into()),
                    doctype.system_identifier,
                    "system identifier of {html:?}"
                );
            }
        )*
        }
    }

    test_doctype_info! {
        missing_doctype_name:                          ( "<!DOCTYPE>",                                                                                              CompatMode::Quirks,        None,                    None,                                     None ),
        html5_doctype:                                 ( "<!DOCTYPE html>",                                                                                         CompatMode::NoQuirks,      Some("html"),            None,                                     None ),
        html5_doctype_no_whitespace_before_name:       ( "<!DOCTYPEhtml>",                                                                                          CompatMode::NoQuirks,      Some("html"),            None,                                     None ),
        legacy_compat_doctype:                         ( r#"<!DOCTYPE html SYSTEM "about:legacy-compat">"#,                                                         CompatMode::NoQuirks,      Some("html"),            None,                                     Some("about:legacy-compat") ),
        html401_strict_doctype:                        ( r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,           CompatMode::NoQuirks,      Some("html"),            Some("-//W3C//DTD HTML 4.01//EN"),        Some("http://www.w3.org/TR/html4/strict.dtd") ),
        svg_doctype:                                   ( r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,   CompatMode::Quirks,        Some("svg"),             Some("-//W3C//DTD SVG 1.1//EN"),          Some("http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd") ),
        doctype_with_null_byte_replacement:            ( "<!DOCTYPE null-\0 PUBLIC '\0' '\0\0'>",                                                                   CompatMode::Quirks,        Some("null-\u{FFFD}"),   Some("\u{FFFD}"),                         Some("\u{FFFD}\u{FFFD}") ),
        uppercase_doctype:                             ( "<!DOCTYPE UPPERCASE>",                                                                                    CompatMode::Quirks,        Some("uppercase"),       None,                                     None ),
        doctype_with_whitespace:                       ( "<!DOCTYPE\n\thtml\x0c\rPUBLIC\r\n''\t''>",                                                                CompatMode::NoQuirks,      Some("html"),            Some(""),                                 Some("") ),
        doctype_trailing_characters:                   ( "<!DOCTYPE html PUBLIC '' '' Anything (except closing angle bracket) is just fine here !!!>",              CompatMode::NoQuirks,      Some("html"),            Some(""),                                 Some("") ),
        an_ugly_no_quirks_doctype:                     ( "<!dOcTyPehtml\tPublIC\"pub-id\"'sysid'>",                                                                 CompatMode::NoQuirks,      Some("html"),            Some("pub-id"),                           Some("sysid") ),
        missing_public_id:                             ( "<!DOCTYPE html PUBLIC>",                                                                                  CompatMode::Quirks,        Some("html"),            None,                                     None ),
        missing_system_id:                             ( "<!DOCTYPE html SYSTEM>",                                                                                  CompatMode::Quirks,        Some("html"),            None,                                     None ),
        missing_close_quote_public_id:                 ( "<!DOCTYPE html PUBLIC 'xyz>",                                                                             CompatMode::Quirks,        Some("html"),            Some("xyz"),                              None ),
        missing_close_quote_system_id_with_public:     ( "<!DOCTYPE html PUBLIC 'abc' 'xyz>",                                                                       CompatMode::Quirks,        Some("html"),            Some("abc"),                              Some("xyz") ),
        bogus_keyword_after_name:                      ( "<!DOCTYPE html FOOBAR>",                                                                                  CompatMode::Quirks,        Some("html"),            None,                                     None ),
        bogus_characters_instead_of_public_quote:      ( "<!DOCTYPE html PUBLIC x ''''>",                                                                           CompatMode::Quirks,        Some("html"),            None,                                     None ),
        bogus_characters_instead_of_system_quote:      ( "<!DOCTYPE html PUBLIC ''x''>",                                                                            CompatMode::Quirks,        Some("html"),            Some(""),                                 None ),
        quirks_html401_without_system_id:              ( r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Frameset//">"#,                                            CompatMode::Quirks,        Some("html"),            Some("-//W3C//DTD HTML 4.01 Frameset//"), None ),
        limited_quirks_html401_with_system_id:         ( r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Frameset//" "">"#,                                         CompatMode::LimitedQuirks, Some("html"),            Some("-//W3C//DTD HTML 4.01 Frameset//"), Some("") ),
        limited_quirks_xhtml_transitional:             ( r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN">"#,                                      CompatMode::LimitedQuirks, Some("html"),            Some("-//W3C//DTD XHTML 1.0 Transitional//EN"), None ),
    }

    #[test]
    fn rejects_anything_but_one_doctype_token() {
        let test_cases = [
            b"".as_slice(),
            b"<div>",
            b"x<!DOCTYPE>",
            b"<!DOCTYPE>x",
            b"<!DOCTYPE",
            b"<!DOCTYPE html PUBLIC \">\">",
        ];

        for html in test_cases {
            assert!(
                HtmlDoctypeInfo::from_doctype_token(html).is_none(),
                "Should return None for invalid input: {:?}",
                String::from_utf8_lossy(html)
            );
        }
    }
}
