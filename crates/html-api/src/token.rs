use std::{fmt, rc::Rc};

use crate::{span::HtmlSpan, tag_name::TagName};

/// Kind of the token a processor is paused on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    Tag,
    Text,
    CdataSection,
    Comment,
    Doctype,
    PresumptuousTag,
    FunkyComment,
}

impl From<&TokenType> for &str {
    fn from(token_type: &TokenType) -> Self {
        match token_type {
            TokenType::Tag => "#tag",
            TokenType::Text => "#text",
            TokenType::CdataSection => "#cdata-section",
            TokenType::Comment => "#comment",
            TokenType::Doctype => "#doctype",
            TokenType::PresumptuousTag => "#presumptuous-tag",
            TokenType::FunkyComment => "#funky-comment",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.into())
    }
}

/// Name of a node: the tag name for elements, otherwise the token type.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum NodeName {
    Tag(TagName),
    Token(TokenType),
}

impl NodeName {
    pub fn tag(&self) -> Option<&TagName> {
        match self {
            NodeName::Tag(tag_name) => Some(tag_name),
            NodeName::Token(_) => None,
        }
    }
}

impl From<TagName> for NodeName {
    fn from(tag_name: TagName) -> Self {
        NodeName::Tag(tag_name)
    }
}

impl From<TokenType> for NodeName {
    fn from(token_type: TokenType) -> Self {
        NodeName::Token(token_type)
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeName::Tag(tag_name) => tag_name.fmt(f),
            NodeName::Token(token_type) => token_type.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentType {
    /// Created when encountering an abruptly-closed HTML comment.
    ///
    /// Example:
    ///
    /// ```text
    /// <!-->
    /// <!--->
    /// ```
    AbruptlyClosedComment,

    /// A comment that would be a CDATA node were HTML to allow CDATA nodes
    /// outside of foreign content.
    ///
    /// Example:
    ///
    /// ```text
    /// <![CDATA[This is a CDATA node.]]>
    /// ```
    CdataLookalike,

    /// Normative HTML comment syntax.
    ///
    /// Example:
    ///
    /// ```text
    /// <!-- this is a comment -->
    /// ```
    HtmlComment,

    /// A comment that would be a Processing Instruction node were they to
    /// exist within HTML.
    ///
    /// Example:
    ///
    /// ```text
    /// <?wp __( 'Like' ) ?>
    /// ```
    PiNodeLookalike,

    /// A so-called "bogus comment" created from invalid HTML input.
    ///
    /// Example:
    ///
    /// ```text
    /// <?nothing special>
    /// <!{nothing special}>
    /// ```
    InvalidHtml,
}

/// Value of an attribute on the current tag.
///
/// Attributes without a value, e.g. `<input disabled>`, are `BooleanTrue`.
/// Absent attributes are reported as `None` by the lookup functions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AttributeValue {
    BooleanTrue,
    String(Rc<[u8]>),
}

impl AttributeValue {
    /// Decoded value as bytes, empty for boolean attributes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeValue::BooleanTrue => b"",
            AttributeValue::String(value) => value,
        }
    }
}

/// How the HTML Processor should treat a text node.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum TextNodeClassification {
    #[default]
    Generic,
    /// Only NULL bytes.
    NullSequence,
    /// Only whitespace, possibly written as character references.
    Whitespace,
}

/// An attribute as it appears in the source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Attribute {
    /// Name as written, without case folding.
    pub name: Box<[u8]>,
    /// The whole attribute, from the name to the end of the value.
    pub span: HtmlSpan,
    /// Raw value bytes; `None` for boolean attributes.
    pub value_span: Option<HtmlSpan>,
}

/// A lexical token, with the fields that apply to its kind.
///
/// Text carried by a token is its modifiable text, already decoded or
/// normalized the way `get_modifiable_text()` reports it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Tag {
        name: TagName,
        is_closer: bool,
        has_self_closing_flag: bool,
        span: HtmlSpan,
        attributes: Vec<Attribute>,
    },
    Text {
        span: HtmlSpan,
        text: Box<[u8]>,
        classification: TextNodeClassification,
    },
    Comment {
        comment_type: CommentType,
        span: HtmlSpan,
        text: Box<[u8]>,
    },
    Doctype {
        span: HtmlSpan,
        text: Box<[u8]>,
    },
    CdataSection {
        span: HtmlSpan,
        text: Box<[u8]>,
    },
    PresumptuousTag {
        span: HtmlSpan,
    },
    FunkyComment {
        span: HtmlSpan,
        text: Box<[u8]>,
    },
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self {
            Token::Tag { .. } => TokenType::Tag,
            Token::Text { .. } => TokenType::Text,
            Token::Comment { .. } => TokenType::Comment,
            Token::Doctype { .. } => TokenType::Doctype,
            Token::CdataSection { .. } => TokenType::CdataSection,
            Token::PresumptuousTag { .. } => TokenType::PresumptuousTag,
            Token::FunkyComment { .. } => TokenType::FunkyComment,
        }
    }

    pub fn span(&self) -> HtmlSpan {
        match self {
            Token::Tag { span, .. }
            | Token::Text { span, .. }
            | Token::Comment { span, .. }
            | Token::Doctype { span, .. }
            | Token::CdataSection { span, .. }
            | Token::PresumptuousTag { span }
            | Token::FunkyComment { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_names_display_like_token_names() {
        assert_eq!(NodeName::from(TagName::DIV).to_string(), "DIV");
        assert_eq!(NodeName::from(TokenType::Text).to_string(), "#text");
        assert_eq!(
            NodeName::from(TokenType::PresumptuousTag).to_string(),
            "#presumptuous-tag"
        );
    }

    #[test]
    fn boolean_attributes_have_no_bytes() {
        assert_eq!(AttributeValue::BooleanTrue.as_bytes(), b"");
        assert_eq!(
            AttributeValue::String(b"x".as_slice().into()).as_bytes(),
            b"x"
        );
    }
}
