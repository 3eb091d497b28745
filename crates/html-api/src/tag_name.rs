use std::{fmt, rc::Rc};

use crate::tag_processor::ParsingNamespace;

macro_rules! tag_names {
    ($($variant:ident => $name:literal,)+) => {
        /// Uppercase HTML tag name.
        ///
        /// Names the processors reason about get their own variant; everything
        /// else is carried as uppercase bytes in `Arbitrary`.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum TagName {
            $($variant,)+
            Arbitrary(Rc<[u8]>),
        }

        impl TagName {
            fn from_uppercase(name: &[u8]) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Uppercase bytes of the tag name.
            pub fn as_bytes(&self) -> &[u8] {
                match self {
                    $(Self::$variant => $name.as_slice(),)+
                    Self::Arbitrary(name) => name,
                }
            }
        }
    };
}

tag_names! {
    A => b"A",
    ADDRESS => b"ADDRESS",
    ANNOTATION_XML => b"ANNOTATION-XML",
    APPLET => b"APPLET",
    AREA => b"AREA",
    ARTICLE => b"ARTICLE",
    ASIDE => b"ASIDE",
    B => b"B",
    BASE => b"BASE",
    BASEFONT => b"BASEFONT",
    BGSOUND => b"BGSOUND",
    BIG => b"BIG",
    BLOCKQUOTE => b"BLOCKQUOTE",
    BODY => b"BODY",
    BR => b"BR",
    BUTTON => b"BUTTON",
    CAPTION => b"CAPTION",
    CENTER => b"CENTER",
    CODE => b"CODE",
    COL => b"COL",
    COLGROUP => b"COLGROUP",
    DD => b"DD",
    DESC => b"DESC",
    DETAILS => b"DETAILS",
    DIALOG => b"DIALOG",
    DIR => b"DIR",
    DIV => b"DIV",
    DL => b"DL",
    DT => b"DT",
    EM => b"EM",
    EMBED => b"EMBED",
    FIELDSET => b"FIELDSET",
    FIGCAPTION => b"FIGCAPTION",
    FIGURE => b"FIGURE",
    FONT => b"FONT",
    FOOTER => b"FOOTER",
    FOREIGNOBJECT => b"FOREIGNOBJECT",
    FORM => b"FORM",
    FRAME => b"FRAME",
    FRAMESET => b"FRAMESET",
    H1 => b"H1",
    H2 => b"H2",
    H3 => b"H3",
    H4 => b"H4",
    H5 => b"H5",
    H6 => b"H6",
    HEAD => b"HEAD",
    HEADER => b"HEADER",
    HGROUP => b"HGROUP",
    HR => b"HR",
    HTML => b"HTML",
    I => b"I",
    IFRAME => b"IFRAME",
    IMAGE => b"IMAGE",
    IMG => b"IMG",
    INPUT => b"INPUT",
    KEYGEN => b"KEYGEN",
    LI => b"LI",
    LINK => b"LINK",
    LISTING => b"LISTING",
    MAIN => b"MAIN",
    MALIGNMARK => b"MALIGNMARK",
    MARQUEE => b"MARQUEE",
    MATH => b"MATH",
    MENU => b"MENU",
    META => b"META",
    MGLYPH => b"MGLYPH",
    MI => b"MI",
    MN => b"MN",
    MO => b"MO",
    MS => b"MS",
    MTEXT => b"MTEXT",
    NAV => b"NAV",
    NOBR => b"NOBR",
    NOEMBED => b"NOEMBED",
    NOFRAMES => b"NOFRAMES",
    NOSCRIPT => b"NOSCRIPT",
    OBJECT => b"OBJECT",
    OL => b"OL",
    OPTGROUP => b"OPTGROUP",
    OPTION => b"OPTION",
    P => b"P",
    PARAM => b"PARAM",
    PLAINTEXT => b"PLAINTEXT",
    PRE => b"PRE",
    RB => b"RB",
    RP => b"RP",
    RT => b"RT",
    RTC => b"RTC",
    RUBY => b"RUBY",
    S => b"S",
    SCRIPT => b"SCRIPT",
    SEARCH => b"SEARCH",
    SECTION => b"SECTION",
    SELECT => b"SELECT",
    SMALL => b"SMALL",
    SOURCE => b"SOURCE",
    SPAN => b"SPAN",
    STRIKE => b"STRIKE",
    STRONG => b"STRONG",
    STYLE => b"STYLE",
    SUB => b"SUB",
    SUMMARY => b"SUMMARY",
    SUP => b"SUP",
    SVG => b"SVG",
    TABLE => b"TABLE",
    TBODY => b"TBODY",
    TD => b"TD",
    TEMPLATE => b"TEMPLATE",
    TEXTAREA => b"TEXTAREA",
    TFOOT => b"TFOOT",
    TH => b"TH",
    THEAD => b"THEAD",
    TITLE => b"TITLE",
    TR => b"TR",
    TRACK => b"TRACK",
    TT => b"TT",
    U => b"U",
    UL => b"UL",
    VAR => b"VAR",
    WBR => b"WBR",
    XMP => b"XMP",
}

/// Longest name with a dedicated variant, `ANNOTATION-XML`.
const LONGEST_KNOWN_NAME: usize = 14;

impl TagName {
    /// Tag name as written in its namespace.
    ///
    /// HTML names stay uppercase, MathML names are lowercase, and SVG names
    /// receive the camelCase adjustments from the HTML parsing rules.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inforeign
    pub fn qualified_name(&self, namespace: &ParsingNamespace) -> Box<[u8]> {
        let lower = self.as_bytes().to_ascii_lowercase();
        match namespace {
            ParsingNamespace::Html => self.as_bytes().into(),
            ParsingNamespace::MathML => lower.into(),
            ParsingNamespace::Svg => match svg_tag_name_adjustment(&lower) {
                Some(adjusted) => adjusted.into(),
                None => lower.into(),
            },
        }
    }
}

fn svg_tag_name_adjustment(lower: &[u8]) -> Option<&'static [u8]> {
    let adjusted: &[u8] = match lower {
        b"altglyph" => b"altGlyph",
        b"altglyphdef" => b"altGlyphDef",
        b"altglyphitem" => b"altGlyphItem",
        b"animatecolor" => b"animateColor",
        b"animatemotion" => b"animateMotion",
        b"animatetransform" => b"animateTransform",
        b"clippath" => b"clipPath",
        b"feblend" => b"feBlend",
        b"fecolormatrix" => b"feColorMatrix",
        b"fecomponenttransfer" => b"feComponentTransfer",
        b"fecomposite" => b"feComposite",
        b"feconvolvematrix" => b"feConvolveMatrix",
        b"fediffuselighting" => b"feDiffuseLighting",
        b"fedisplacementmap" => b"feDisplacementMap",
        b"fedistantlight" => b"feDistantLight",
        b"fedropshadow" => b"feDropShadow",
        b"feflood" => b"feFlood",
        b"fefunca" => b"feFuncA",
        b"fefuncb" => b"feFuncB",
        b"fefuncg" => b"feFuncG",
        b"fefuncr" => b"feFuncR",
        b"fegaussianblur" => b"feGaussianBlur",
        b"feimage" => b"feImage",
        b"femerge" => b"feMerge",
        b"femergenode" => b"feMergeNode",
        b"femorphology" => b"feMorphology",
        b"feoffset" => b"feOffset",
        b"fepointlight" => b"fePointLight",
        b"fespecularlighting" => b"feSpecularLighting",
        b"fespotlight" => b"feSpotLight",
        b"fetile" => b"feTile",
        b"feturbulence" => b"feTurbulence",
        b"foreignobject" => b"foreignObject",
        b"glyphref" => b"glyphRef",
        b"lineargradient" => b"linearGradient",
        b"radialgradient" => b"radialGradient",
        b"textpath" => b"textPath",
        _ => return None,
    };
    Some(adjusted)
}

impl From<&[u8]> for TagName {
    fn from(name: &[u8]) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.len() <= LONGEST_KNOWN_NAME {
            if let Some(known) = Self::from_uppercase(&upper) {
                return known;
            }
        }
        Self::Arbitrary(upper.into())
    }
}

impl From<&str> for TagName {
    fn from(name: &str) -> Self {
        name.as_bytes().into()
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&TagName> for String {
    fn from(tag_name: &TagName) -> Self {
        tag_name.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_names_are_case_insensitive() {
        assert_eq!(TagName::from("div"), TagName::DIV);
        assert_eq!(TagName::from(b"DiV".as_slice()), TagName::DIV);
        assert_eq!(TagName::from("annotation-xml"), TagName::ANNOTATION_XML);
        assert_eq!(TagName::ANNOTATION_XML.to_string(), "ANNOTATION-XML");
    }

    #[test]
    fn unknown_names_are_uppercased() {
        let custom = TagName::from("my-element");
        assert_eq!(custom, TagName::Arbitrary(b"MY-ELEMENT".as_slice().into()));
        assert_eq!(custom.to_string(), "MY-ELEMENT");
        assert_eq!(
            TagName::from("a-very-long-custom-element-name").as_bytes(),
            b"A-VERY-LONG-CUSTOM-ELEMENT-NAME"
        );
    }

    #[test]
    fn qualified_names_follow_namespace() {
        let name = TagName::from("foreignobject");
        assert_eq!(&*name.qualified_name(&ParsingNamespace::Svg), b"foreignObject");
        assert_eq!(&*name.qualified_name(&ParsingNamespace::MathML), b"foreignobject");
        assert_eq!(&*TagName::DIV.qualified_name(&ParsingNamespace::Html), b"DIV");
        assert_eq!(
            &*TagName::from("feGaussianBlur").qualified_name(&ParsingNamespace::Svg),
            b"feGaussianBlur"
        );
    }
}
