//! Streaming, byte-exact HTML tokenizer with lazy in-place edits.
//!
//! The Tag Processor walks an HTML document token by token without building
//! a tree. Edits such as setting an attribute are queued as byte-range
//! replacements and only materialized when the updated HTML is requested,
//! when seeking, or when the cursor moves past them.
//!
//! Example:
//!
//! ```text
//! let mut processor = TagProcessor::new(b"<div><img src=a.png></div>");
//! while processor.next_tag(Some(&TagName::IMG.into())) {
//!     processor.set_attribute("alt", "A picture");
//! }
//! processor.get_updated_html(); // <div><img alt="A picture" src=a.png></div>
//! ```

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::{
    attributes::qualified_attribute_name,
    compat_mode::CompatMode,
    config::ProcessorConfig,
    decoder::{decode_attribute, decode_text_node, read_character_reference, HtmlContext},
    doctype::HtmlDoctypeInfo,
    errors::BookmarkError,
    span::HtmlSpan,
    str_fns::{html_special_chars, stripos, strpos, substr},
    tag_name::TagName,
    text_replacement::{apply_replacements, remap_span, shift_position, HtmlTextReplacement},
    token::{
        Attribute, AttributeValue, CommentType, NodeName, TextNodeClassification, Token,
        TokenType,
    },
};

const LOG_TARGET: &str = "html_api::tag_processor";

const REPLACEMENT_CHARACTER: &[u8] = "\u{FFFD}".as_bytes();

#[derive(Default, Clone)]
pub struct TagProcessor {
    attributes: Vec<AttributeToken>,
    duplicate_attributes: Vec<(Box<[u8]>, HtmlSpan)>,
    bytes_already_parsed: usize,
    comment_type: Option<CommentType>,
    pub(crate) html_bytes: Box<[u8]>,
    is_closing_tag: Option<bool>,

    /// Replacements no longer tied to a name on the current token.
    lexical_updates: Vec<HtmlTextReplacement>,

    /// Replacements for the current token which a later call may supersede.
    named_updates: Vec<(UpdateKey, HtmlTextReplacement)>,

    /// Pending `add_class()` and `remove_class()` calls, in call order.
    classname_updates: Vec<(Box<[u8]>, ClassUpdate)>,

    pub(crate) parser_state: ParserState,
    parsing_namespace: ParsingNamespace,

    /// Where a text node whose leading newline is ignored would start.
    ///
    /// LISTING, PRE and TEXTAREA ignore one newline right after the opener:
    ///
    /// ```text
    /// <pre>
    /// This text starts on its own line.</pre>
    /// ```
    skip_newline_at: Option<usize>,
    tag_name_length: Option<usize>,
    tag_name_starts_at: Option<usize>,
    text_length: Option<usize>,
    pub(crate) text_node_classification: TextNodeClassification,
    text_starts_at: Option<usize>,
    token_length: Option<usize>,
    token_starts_at: Option<usize>,

    /// Indicates if the document is in quirks mode or no-quirks mode.
    ///
    /// In quirks mode CSS class selectors match ASCII case-insensitively,
    /// and a TABLE opener does not implicitly close an open P element.
    pub(crate) compat_mode: CompatMode,

    bookmarks: FxHashMap<Rc<str>, HtmlSpan>,

    /// Node bookmarks owned by the HTML Processor. Not capped.
    internal_bookmarks: FxHashMap<u32, HtmlSpan>,

    seek_count: usize,
    config: ProcessorConfig,
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum ParsingNamespace {
    #[default]
    Html,
    Svg,
    MathML,
}

impl From<&ParsingNamespace> for &str {
    fn from(namespace: &ParsingNamespace) -> Self {
        match namespace {
            ParsingNamespace::Html => "html",
            ParsingNamespace::Svg => "svg",
            ParsingNamespace::MathML => "math",
        }
    }
}

impl std::fmt::Display for ParsingNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

/// Which tags `next_tag()` stops on.
///
/// Every field is optional; the default query finds the next tag opener.
#[derive(Default, Debug, Clone)]
pub struct TagQuery<'a> {
    /// Tag to find, or any tag when `None`.
    pub tag_name: Option<TagName>,
    pub tag_closers: VisitClosers,
    /// Find the Nth match: 1 for the first, 3 for the third.
    pub match_offset: Option<usize>,
    /// Tag must contain this whole class name.
    pub class_name: Option<&'a str>,
    /// Path of tag names ending at the matched tag, e.g. `["FIGURE", "IMG"]`,
    /// where `*` matches any single element. Only the HTML Processor knows
    /// the document structure, so the Tag Processor ignores this field.
    pub breadcrumbs: Option<Vec<&'a str>>,
}

impl From<TagName> for TagQuery<'_> {
    fn from(tag_name: TagName) -> Self {
        Self {
            tag_name: Some(tag_name),
            ..Default::default()
        }
    }
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum VisitClosers {
    Visit,
    #[default]
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UpdateKey {
    /// Lowercase attribute name.
    Attribute(Box<[u8]>),
    ModifiableText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassUpdate {
    Add,
    Remove,
}

impl TagProcessor {
    pub fn new(html: &[u8]) -> Self {
        Self::with_config(html, ProcessorConfig::default())
    }

    pub fn with_config(html: &[u8], config: ProcessorConfig) -> Self {
        Self {
            html_bytes: html.into(),
            config,
            ..Default::default()
        }
    }

    /// Finds the next token in the HTML document.
    ///
    /// An HTML document can be viewed as a stream of tokens: tags, text
    /// nodes, comments, DOCTYPE declarations and the like. This finds the
    /// next one and reports whether it did.
    ///
    /// If the document ends in the middle of a token the processor rewinds to
    /// the start of that token and pauses; see `paused_at_incomplete_token()`.
    pub fn next_token(&mut self) -> bool {
        self.base_class_next_token()
    }

    /// Finds the next token without any of the HTML Processor's semantics.
    ///
    /// Used internally to re-parse the current token after applying edits
    /// without moving the cursor.
    fn base_class_next_token(&mut self) -> bool {
        self.after_tag();
        let was_at = self.bytes_already_parsed;

        if ParserState::Complete == self.parser_state
            || ParserState::IncompleteInput == self.parser_state
        {
            return false;
        }

        // Clear the state so it doesn't linger from the previous step.
        self.parser_state = ParserState::Ready;

        if self.bytes_already_parsed >= self.html_bytes.len() {
            self.parser_state = ParserState::Complete;
            return false;
        }

        if !self.parse_next_tag() {
            if self.parser_state == ParserState::IncompleteInput {
                self.pause_at_incomplete_token(was_at);
            }
            return false;
        }

        // Only tags carry attributes and special content.
        if ParserState::MatchedTag != self.parser_state {
            return true;
        }

        while self.parse_next_attribute() {}

        // Ensure that the tag closes before the end of the document.
        if ParserState::IncompleteInput == self.parser_state
            || self.bytes_already_parsed >= self.html_bytes.len()
        {
            self.pause_at_incomplete_token(was_at);
            return false;
        }

        let Some(tag_ends_at) = strpos(&self.html_bytes, b">", self.bytes_already_parsed) else {
            self.pause_at_incomplete_token(was_at);
            return false;
        };
        let (Some(token_starts_at), Some(tag_name_starts_at), Some(tag_name_length)) = (
            self.token_starts_at,
            self.tag_name_starts_at,
            self.tag_name_length,
        ) else {
            return false;
        };
        self.parser_state = ParserState::MatchedTag;
        self.bytes_already_parsed = tag_ends_at + 1;
        self.token_length = Some(self.bytes_already_parsed - token_starts_at);

        /*
         * Certain tags require additional processing. The first-letter pre-check
         * avoids allocating a tag name for most tags.
         *
         *  - IFRAME, LISTING, NOEMBED, NOFRAMES, PRE, SCRIPT,
         *    STYLE, TEXTAREA, TITLE, XMP
         */
        if self.is_closing_tag.unwrap_or(false)
            || ParsingNamespace::Html != self.parsing_namespace
            || !matches!(
                self.html_bytes[tag_name_starts_at],
                b'i' | b'I' | b'l' | b'L' | b'n' | b'N' | b'p' | b'P' | b's' | b'S' | b't' | b'T'
                    | b'x' | b'X'
            )
        {
            return true;
        }

        let tag: TagName = substr(&self.html_bytes, tag_name_starts_at, tag_name_length).into();

        if tag == TagName::LISTING || tag == TagName::PRE {
            self.skip_newline_at = Some(self.bytes_already_parsed);
            return true;
        }

        /*
         * Elements whose contents are RCDATA, RAWTEXT or script data consume
         * their closing tag along with the opener. The skip functions move the
         * tag name pointers onto the closer, so the opener's values are kept
         * here and restored afterwards.
         */
        let attributes = std::mem::take(&mut self.attributes);
        let duplicate_attributes = std::mem::take(&mut self.duplicate_attributes);

        let found_closer = match tag {
            TagName::SCRIPT => self.skip_script_data(),

            TagName::TEXTAREA | TagName::TITLE => self.skip_rcdata(&tag),

            /*
             * A browser would include NOSCRIPT here, but the Tag Processor
             * runs with scripting disabled and descends into NOSCRIPT.
             */
            TagName::IFRAME
            | TagName::NOEMBED
            | TagName::NOFRAMES
            | TagName::STYLE
            | TagName::XMP => self.skip_rawtext(&tag),

            _ => {
                self.attributes = attributes;
                self.duplicate_attributes = duplicate_attributes;
                return true;
            }
        };

        if !found_closer {
            self.pause_at_incomplete_token(was_at);
            return false;
        }

        // The closer's `<` is where the modifiable text ends.
        let closer_starts_at = self.tag_name_starts_at.unwrap_or(self.bytes_already_parsed);

        self.token_starts_at = Some(was_at);
        self.token_length = Some(self.bytes_already_parsed - was_at);
        self.text_starts_at = Some(tag_ends_at + 1);
        self.text_length = Some(closer_starts_at - (tag_ends_at + 1));
        self.tag_name_starts_at = Some(tag_name_starts_at);
        self.tag_name_length = Some(tag_name_length);
        self.attributes = attributes;
        self.duplicate_attributes = duplicate_attributes;

        true
    }

    fn pause_at_incomplete_token(&mut self, was_at: usize) {
        log::debug!(
            target: LOG_TARGET,
            "Paused at incomplete token starting at byte {was_at}"
        );
        self.parser_state = ParserState::IncompleteInput;
        self.bytes_already_parsed = was_at;
    }

    /// Flushes edits tied to the current token and forgets it.
    fn after_tag(&mut self) {
        /*
         * Lexical updates keyed by attribute name must not leak onto the next
         * tag, which may have an attribute with the same name. Flush them out
         * into anonymous updates.
         */
        self.class_name_updates_to_attributes_updates();

        let pending_updates = self.lexical_updates.len() + self.named_updates.len();
        let has_update_after_cursor = self
            .lexical_updates
            .iter()
            .chain(self.named_updates.iter().map(|(_, update)| update))
            .any(|update| update.start >= self.bytes_already_parsed);

        // Updates after the cursor would be overlooked once it moves on.
        if pending_updates > self.config.max_pending_updates || has_update_after_cursor {
            self.get_updated_html();
        } else {
            let named_updates = std::mem::take(&mut self.named_updates);
            self.lexical_updates
                .extend(named_updates.into_iter().map(|(_, update)| update));
        }

        self.token_starts_at = None;
        self.token_length = None;
        self.tag_name_starts_at = None;
        self.tag_name_length = None;
        self.text_starts_at = None;
        self.text_length = None;
        self.is_closing_tag = None;
        self.attributes.clear();
        self.duplicate_attributes.clear();
        self.comment_type = None;
        self.text_node_classification = TextNodeClassification::Generic;
    }

    /// Returns the HTML with all pending edits applied.
    ///
    /// Edits are applied in one pass, bookmarks and the cursor are remapped,
    /// and the current token is parsed again so reads reflect the new HTML.
    /// Without edits this is exactly the input document.
    pub fn get_updated_html(&mut self) -> Box<[u8]> {
        if self.classname_updates.is_empty()
            && self.lexical_updates.is_empty()
            && self.named_updates.is_empty()
        {
            return self.html_bytes.clone();
        }

        // The position right before the current token, for re-parsing it.
        let before_current_tag = self.token_starts_at.unwrap_or(0);

        self.class_name_updates_to_attributes_updates();
        let before_current_tag = self.apply_lexical_updates(before_current_tag);

        // Rewind to before the current token and reparse its updated form.
        self.bytes_already_parsed = before_current_tag;
        self.base_class_next_token();

        self.html_bytes.clone()
    }

    /// Applies every pending replacement and returns where `shift_this_point`
    /// moved to.
    fn apply_lexical_updates(&mut self, shift_this_point: usize) -> usize {
        let mut updates = std::mem::take(&mut self.lexical_updates);
        updates.extend(
            std::mem::take(&mut self.named_updates)
                .into_iter()
                .map(|(_, update)| update),
        );

        if updates.is_empty() {
            return shift_this_point;
        }

        self.html_bytes = apply_replacements(&self.html_bytes, &mut updates).into_boxed_slice();

        self.bookmarks.retain(|name, span| {
            let Some(remapped) = remap_span(&updates, span) else {
                log::debug!(target: LOG_TARGET, "Released bookmark {name:?}: its token was replaced");
                return false;
            };
            *span = remapped;
            true
        });
        self.internal_bookmarks
            .retain(|_, span| match remap_span(&updates, span) {
                Some(remapped) => {
                    *span = remapped;
                    true
                }
                None => false,
            });

        shift_position(&updates, shift_this_point)
    }

    /// Reads the next tag, text node, comment, or other token.
    fn parse_next_tag(&mut self) -> bool {
        let doc_length = self.html_bytes.len();
        let was_at = self.bytes_already_parsed;
        let mut at = was_at;

        while at < doc_length {
            let Some(next_at) = strpos(&self.html_bytes, b"<", at) else {
                break;
            };
            at = next_at;

            if at > was_at {
                /*
                 * A "<" only starts a token when the following character can.
                 * Otherwise, as with "<3", it's part of the text.
                 *
                 * @see https://html.spec.whatwg.org/#tag-open-state
                 */
                if at + 1 < doc_length
                    && !matches!(
                        self.html_bytes[at + 1],
                        b'!' | b'/' | b'?' | b'a'..=b'z' | b'A'..=b'Z'
                    )
                {
                    at += 1;
                    continue;
                }

                self.parser_state = ParserState::TextNode;
                self.token_starts_at = Some(was_at);
                self.token_length = Some(at - was_at);
                self.text_starts_at = Some(was_at);
                self.text_length = Some(at - was_at);
                self.bytes_already_parsed = at;
                return true;
            }

            self.token_starts_at = Some(at);

            if at + 1 < doc_length && b'/' == self.html_bytes[at + 1] {
                self.is_closing_tag = Some(true);
                at += 1;
            } else {
                self.is_closing_tag = Some(false);
            }
            let is_closing_tag = self.is_closing_tag == Some(true);

            // HTML tag names must start with [a-zA-Z] otherwise they are not tags.
            let tag_name_prefix_length = strspn!(self.html_bytes, b'a'..=b'z' | b'A'..=b'Z', at + 1);

            if tag_name_prefix_length > 0 {
                at += 1;
                let tag_name_length = tag_name_prefix_length
                    + strcspn!(
                        self.html_bytes,
                        b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>',
                        at + tag_name_prefix_length
                    );
                self.parser_state = ParserState::MatchedTag;
                self.tag_name_starts_at = Some(at);
                self.tag_name_length = Some(tag_name_length);
                self.bytes_already_parsed = at + tag_name_length;
                return true;
            }

            // Nothing after the `<` or `</` yet.
            if at + 1 >= doc_length {
                self.parser_state = ParserState::IncompleteInput;
                return false;
            }

            // `<!` transitions to markup declaration open state.
            if !is_closing_tag && b'!' == self.html_bytes[at + 1] {
                if doc_length > at + 3
                    && b'-' == self.html_bytes[at + 2]
                    && b'-' == self.html_bytes[at + 3]
                {
                    return self.parse_html_comment(at);
                }

                // `<!DOCTYPE` is ASCII case-insensitive; skip to the nearest `>`.
                if doc_length > at + 8 && self.html_bytes[at + 2..at + 9].eq_ignore_ascii_case(b"DOCTYPE") {
                    let Some(closer_at) = strpos(&self.html_bytes, b">", at + 9) else {
                        self.parser_state = ParserState::IncompleteInput;
                        return false;
                    };

                    self.parser_state = ParserState::Doctype;
                    self.token_length = Some(closer_at + 1 - at);
                    self.text_starts_at = Some(at + 9);
                    self.text_length = Some(closer_at - (at + 9));
                    self.bytes_already_parsed = closer_at + 1;
                    return true;
                }

                // Real CDATA sections only exist in foreign content.
                if self.parsing_namespace != ParsingNamespace::Html
                    && doc_length > at + 8
                    && &self.html_bytes[at + 2..at + 9] == b"[CDATA["
                {
                    let Some(closer_at) = strpos(&self.html_bytes, b"]]>", at + 9) else {
                        self.parser_state = ParserState::IncompleteInput;
                        return false;
                    };

                    self.parser_state = ParserState::CDATANode;
                    self.token_length = Some(closer_at + 3 - at);
                    self.text_starts_at = Some(at + 9);
                    self.text_length = Some(closer_at - (at + 9));
                    self.bytes_already_parsed = closer_at + 3;
                    return true;
                }

                // Anything else is a bogus comment running to the nearest `>`.
                let Some(closer_at) = strpos(&self.html_bytes, b">", at + 1) else {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                };

                self.parser_state = ParserState::Comment;
                self.comment_type = Some(CommentType::InvalidHtml);
                self.token_length = Some(closer_at + 1 - at);
                self.text_starts_at = Some(at + 2);
                self.text_length = Some(closer_at - (at + 2));
                self.bytes_already_parsed = closer_at + 1;

                /*
                 * Identify nodes that would be CDATA if HTML had CDATA sections.
                 * The bogus comment already ends at the first `>`, so a CDATA
                 * lookalike can never contain one.
                 */
                if closer_at + 1 - at >= 10
                    && &self.html_bytes[at + 2..at + 9] == b"[CDATA["
                    && &self.html_bytes[closer_at - 2..closer_at] == b"]]"
                {
                    self.comment_type = Some(CommentType::CdataLookalike);
                    self.text_starts_at = Some(at + 9);
                    self.text_length = Some(closer_at - 2 - (at + 9));
                }

                return true;
            }

            /*
             * `</>` is a missing end tag name, which is ignored. It was known as
             * the "presumptuous empty tag" as it was proposed to close the
             * nearest open element.
             *
             * @see https://html.spec.whatwg.org/#parse-error-missing-end-tag-name
             */
            if b'>' == self.html_bytes[at + 1] {
                // `<>` is plaintext.
                if !is_closing_tag {
                    at += 1;
                    continue;
                }

                self.parser_state = ParserState::PresumptuousTag;
                self.token_length = Some(at + 2 - (at - 1));
                self.bytes_already_parsed = at + 2;
                return true;
            }

            // `<?` is a bogus comment running to the nearest `>`.
            if !is_closing_tag && b'?' == self.html_bytes[at + 1] {
                let Some(closer_at) = strpos(&self.html_bytes, b">", at + 2) else {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                };

                self.parser_state = ParserState::Comment;
                self.comment_type = Some(CommentType::InvalidHtml);
                self.token_length = Some(closer_at + 1 - at);
                self.text_starts_at = Some(at + 2);
                self.text_length = Some(closer_at - (at + 2));
                self.bytes_already_parsed = closer_at + 1;

                /*
                 * Identify a Processing Instruction node were HTML to have them.
                 * Only ASCII target names are recognized; others stay bogus
                 * comments, which doesn't change the document structure.
                 *
                 * @see https://www.w3.org/TR/2006/REC-xml11-20060816/#NT-PITarget
                 */
                if closer_at + 1 - at >= 5 && b'?' == self.html_bytes[closer_at - 1] {
                    let comment_text = &self.html_bytes[at + 2..closer_at - 1];
                    let mut pi_target_length =
                        strspn!(comment_text, b'a'..=b'z' | b'A'..=b'Z' | b':' | b'_', 0);

                    if pi_target_length > 0 {
                        pi_target_length += strspn!(
                            comment_text,
                            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b':' | b'_' | b'-' | b'.',
                            pi_target_length
                        );

                        self.comment_type = Some(CommentType::PiNodeLookalike);
                        self.tag_name_starts_at = Some(at + 2);
                        self.tag_name_length = Some(pi_target_length);
                        self.text_starts_at = Some(at + 2 + pi_target_length);
                        self.text_length =
                            Some(closer_at - (at + 2) - (pi_target_length + 1));
                    }
                }

                return true;
            }

            /*
             * A closer whose name doesn't start with a letter is a comment up
             * to the first `>`. These are made available as "funky comments".
             *
             * @see https://html.spec.whatwg.org/#parse-error-invalid-first-character-of-tag-name
             */
            if is_closing_tag {
                let Some(closer_at) = strpos(&self.html_bytes, b">", at + 2) else {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                };

                let token_starts_at = at - 1;
                self.parser_state = ParserState::FunkyComment;
                self.token_length = Some(closer_at + 1 - token_starts_at);
                self.text_starts_at = Some(token_starts_at + 2);
                self.text_length = Some(closer_at - (token_starts_at + 2));
                self.bytes_already_parsed = closer_at + 1;
                return true;
            }

            at += 1;
        }

        // Nothing but a text node remains.
        self.parser_state = ParserState::TextNode;
        self.token_starts_at = Some(was_at);
        self.token_length = Some(doc_length - was_at);
        self.text_starts_at = Some(was_at);
        self.text_length = Some(doc_length - was_at);
        self.bytes_already_parsed = doc_length;

        true
    }

    /// Parses a comment opened with `<!--` at `at`.
    fn parse_html_comment(&mut self, at: usize) -> bool {
        let doc_length = self.html_bytes.len();
        let mut closer_at = at + 4;

        // Abruptly-closed empty comments are a sequence of dashes followed by `>`.
        let span_of_dashes = strspn!(self.html_bytes, b'-', closer_at);
        if closer_at + span_of_dashes >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        if b'>' == self.html_bytes[closer_at + span_of_dashes] {
            self.parser_state = ParserState::Comment;
            self.comment_type = Some(CommentType::AbruptlyClosedComment);
            self.token_length = Some(closer_at + span_of_dashes + 1 - at);

            // Only long enough tokens carry modifiable text.
            if span_of_dashes >= 2 {
                self.comment_type = Some(CommentType::HtmlComment);
                self.text_starts_at = Some(at + 4);
                self.text_length = Some(span_of_dashes - 2);
            }

            self.bytes_already_parsed = closer_at + span_of_dashes + 1;
            return true;
        }

        /*
         * Comments close at the first `-->` or the invalid `--!>`.
         *
         * @see https://html.spec.whatwg.org/#parse-error-incorrectly-closed-comment
         */
        while closer_at < doc_length {
            let Some(next_closer) = strpos(&self.html_bytes, b"--", closer_at) else {
                break;
            };
            closer_at = next_closer;

            let closer_length = if closer_at + 2 < doc_length && b'>' == self.html_bytes[closer_at + 2] {
                3
            } else if closer_at + 3 < doc_length && &self.html_bytes[closer_at + 2..closer_at + 4] == b"!>" {
                4
            } else {
                closer_at += 1;
                continue;
            };

            self.parser_state = ParserState::Comment;
            self.comment_type = Some(CommentType::HtmlComment);
            self.token_length = Some(closer_at + closer_length - at);
            self.text_starts_at = Some(at + 4);
            self.text_length = Some(closer_at - (at + 4));
            self.bytes_already_parsed = closer_at + closer_length;
            return true;
        }

        self.parser_state = ParserState::IncompleteInput;
        false
    }

    /// Parses the next attribute of the current tag, if there is one.
    fn parse_next_attribute(&mut self) -> bool {
        let doc_length = self.html_bytes.len();

        // Skip whitespace and slashes.
        self.bytes_already_parsed += strspn!(
            self.html_bytes,
            b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/',
            self.bytes_already_parsed
        );
        if self.bytes_already_parsed >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        /*
         * Treat the equal sign as a part of the attribute
         * name if it is the first encountered byte.
         *
         * @see https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state
         */
        let start_shift = usize::from(self.html_bytes[self.bytes_already_parsed] == b'=');
        let name_length = start_shift
            + strcspn!(
                self.html_bytes,
                b'=' | b'/' | b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                self.bytes_already_parsed + start_shift
            );

        // No attribute, just tag closer.
        if 0 == name_length || self.bytes_already_parsed + name_length >= doc_length {
            return false;
        }

        let attribute_start = self.bytes_already_parsed;
        self.bytes_already_parsed += name_length;

        self.skip_whitespace();
        if self.bytes_already_parsed >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        let has_value = b'=' == self.html_bytes[self.bytes_already_parsed];
        let (value_starts_at, value_length, attribute_end) = if has_value {
            self.bytes_already_parsed += 1;
            self.skip_whitespace();
            if self.bytes_already_parsed >= doc_length {
                self.parser_state = ParserState::IncompleteInput;
                return false;
            }

            match self.html_bytes[self.bytes_already_parsed] {
                quote @ (b'\'' | b'"') => {
                    let value_starts_at = self.bytes_already_parsed + 1;
                    let end_quote_at =
                        strpos(&self.html_bytes, &[quote], value_starts_at).unwrap_or(doc_length);
                    self.bytes_already_parsed = end_quote_at + 1;
                    (value_starts_at, end_quote_at - value_starts_at, end_quote_at + 1)
                }

                _ => {
                    let value_starts_at = self.bytes_already_parsed;
                    let value_length = strcspn!(
                        self.html_bytes,
                        b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                        value_starts_at
                    );
                    self.bytes_already_parsed = value_starts_at + value_length;
                    (value_starts_at, value_length, value_starts_at + value_length)
                }
            }
        } else {
            (self.bytes_already_parsed, 0, attribute_start + name_length)
        };

        if attribute_end >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        if self.is_closing_tag.unwrap_or(false) {
            return true;
        }

        /*
         * > There must never be two or more attributes on
         * > the same start tag whose names are an ASCII
         * > case-insensitive match for each other.
         *     - HTML 5 spec
         *
         * Later duplicates are ignored but remembered, so that removing the
         * attribute removes every copy.
         */
        let name: Box<[u8]> = self.html_bytes[attribute_start..attribute_start + name_length]
            .to_ascii_lowercase()
            .into();
        let span = HtmlSpan::new(attribute_start, attribute_end - attribute_start);

        if self.attributes.iter().any(|attribute| attribute.name == name) {
            self.duplicate_attributes.push((name, span));
            return true;
        }

        self.attributes.push(AttributeToken {
            name,
            name_length,
            value_starts_at,
            value_length,
            start: span.start,
            length: span.length,
            is_true: !has_value,
        });

        true
    }

    /// Move the internal cursor past any immediate successive whitespace.
    fn skip_whitespace(&mut self) {
        self.bytes_already_parsed += strspn!(
            self.html_bytes,
            b' ' | b'\t' | 0x0c | b'\r' | b'\n',
            self.bytes_already_parsed
        );
    }

    /// Skips contents of SCRIPT elements.
    ///
    /// Returns whether the closing tag was found before the end of the document.
    ///
    /// @see https://html.spec.whatwg.org/#script-data-state
    fn skip_script_data(&mut self) -> bool {
        let mut state = ScriptState::Unescaped;
        let doc_length = self.html_bytes.len();
        let mut at = self.bytes_already_parsed;

        while at < doc_length {
            at += strcspn!(self.html_bytes, b'-' | b'<', at);

            // In every state a "-->" returns to the unescaped state.
            if at + 2 < doc_length && &self.html_bytes[at..at + 3] == b"-->" {
                at += 3;
                state = ScriptState::Unescaped;
                continue;
            }

            if at + 1 >= doc_length {
                return false;
            }

            // Everything else of interest starts with "<".
            at += 1;
            if self.html_bytes[at - 1] != b'<' {
                continue;
            }

            // "<!--" only enters the escaped state from the unescaped one.
            if at + 2 < doc_length && &self.html_bytes[at..at + 3] == b"!--" {
                at += 3;
                if state == ScriptState::Unescaped {
                    state = ScriptState::Escaped;
                }
                continue;
            }

            let closer_potentially_starts_at = at - 1;
            let is_closing = self.html_bytes[at] == b'/';
            if is_closing {
                at += 1;
            }

            // Only <script> and </script> change state from here on.
            if !(at + 6 < doc_length && self.html_bytes[at..at + 6].eq_ignore_ascii_case(b"script"))
            {
                at += 1;
                continue;
            }

            // "<script123" must not match.
            at += 6;
            if !matches!(
                self.html_bytes[at],
                b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>'
            ) {
                at += 1;
                continue;
            }

            if state == ScriptState::Escaped && !is_closing {
                state = ScriptState::DoubleEscaped;
                continue;
            }

            if state == ScriptState::DoubleEscaped && is_closing {
                state = ScriptState::Escaped;
                continue;
            }

            if is_closing {
                self.bytes_already_parsed = at;
                self.tag_name_starts_at = Some(closer_potentially_starts_at);

                while self.parse_next_attribute() {}

                if self.bytes_already_parsed >= doc_length {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                if b'>' == self.html_bytes[self.bytes_already_parsed] {
                    self.bytes_already_parsed += 1;
                    return true;
                }
            }

            at += 1;
        }

        false
    }

    /// Skips contents of RCDATA elements, namely TITLE and TEXTAREA.
    ///
    /// Returns whether the closing tag was found before the end of the document.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state
    fn skip_rcdata(&mut self, tag_name: &TagName) -> bool {
        let tag_name = tag_name.as_bytes();
        let doc_length = self.html_bytes.len();
        let mut at = self.bytes_already_parsed;

        while at < doc_length {
            let Some(closer_at) = strpos(&self.html_bytes, b"</", at) else {
                return false;
            };
            self.tag_name_starts_at = Some(closer_at);

            at = closer_at + 2;
            let name_ends_at = at + tag_name.len();
            if name_ends_at >= doc_length {
                return false;
            }

            if !self.html_bytes[at..name_ends_at].eq_ignore_ascii_case(tag_name) {
                continue;
            }

            // "</textarearug" must not close a TEXTAREA.
            at = name_ends_at;
            if !matches!(
                self.html_bytes[at],
                b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>'
            ) {
                continue;
            }

            self.bytes_already_parsed = at;
            while self.parse_next_attribute() {}

            at = self.bytes_already_parsed;
            if at >= doc_length {
                return false;
            }

            if self.html_bytes[at] == b'>' {
                self.bytes_already_parsed = at + 1;
                return true;
            }

            if at + 1 >= doc_length {
                return false;
            }

            if &self.html_bytes[at..at + 2] == b"/>" {
                self.bytes_already_parsed = at + 2;
                return true;
            }
        }

        false
    }

    /// Skips contents of generic RAWTEXT elements.
    ///
    /// RAWTEXT differs from RCDATA only in whether character references are
    /// decoded, which matters when reading the text, not when skipping it.
    ///
    /// @see https://html.spec.whatwg.org/#generic-raw-text-element-parsing-algorithm
    fn skip_rawtext(&mut self, tag_name: &TagName) -> bool {
        self.skip_rcdata(tag_name)
    }

    /// Finds the next tag matching the query.
    ///
    /// With no query this finds the next tag opener.
    pub fn next_tag(&mut self, query: Option<&TagQuery>) -> bool {
        let default_query = TagQuery::default();
        let query = query.unwrap_or(&default_query);
        let match_offset = query.match_offset.filter(|&n| n > 0).unwrap_or(1);
        let mut already_found = 0;

        while already_found < match_offset {
            if !self.next_token() {
                return false;
            }

            if self.parser_state != ParserState::MatchedTag {
                continue;
            }

            if self.matches(query) {
                already_found += 1;
            }
        }

        true
    }

    fn matches(&self, query: &TagQuery) -> bool {
        if self.is_closing_tag.unwrap_or(false) && query.tag_closers == VisitClosers::Skip {
            return false;
        }

        if let Some(sought_tag_name) = &query.tag_name {
            let (Some(at), Some(length)) = (self.tag_name_starts_at, self.tag_name_length) else {
                return false;
            };
            if !substr(&self.html_bytes, at, length).eq_ignore_ascii_case(sought_tag_name.as_bytes()) {
                return false;
            }
        }

        if let Some(class_name) = query.class_name {
            if !self.has_class(class_name).unwrap_or(false) {
                return false;
            }
        }

        true
    }

    /// Indicates if the processor stopped because the document ended
    /// in the middle of a token.
    ///
    /// More input may complete the token; until then nothing more can be read.
    pub fn paused_at_incomplete_token(&self) -> bool {
        self.parser_state == ParserState::IncompleteInput
    }

    /// Uppercase name of the matched tag.
    pub fn get_tag(&self) -> Option<TagName> {
        if self.parser_state != ParserState::MatchedTag {
            return None;
        }
        let at = self.tag_name_starts_at?;
        let length = self.tag_name_length?;
        Some(substr(&self.html_bytes, at, length).into())
    }

    /// Target of a processing-instruction lookalike, as written.
    fn get_pi_target(&self) -> Option<&[u8]> {
        if self.get_comment_type() != Some(CommentType::PiNodeLookalike) {
            return None;
        }
        Some(substr(
            &self.html_bytes,
            self.tag_name_starts_at?,
            self.tag_name_length?,
        ))
    }

    /// Indicates the kind of matched token, if any.
    ///
    /// This differs from `get_token_name()` in that it always reports the
    /// kind of token, never a name derived from the token itself.
    pub fn get_token_type(&self) -> Option<TokenType> {
        match self.parser_state {
            ParserState::MatchedTag => Some(TokenType::Tag),
            ParserState::Doctype => Some(TokenType::Doctype),
            ParserState::TextNode => Some(TokenType::Text),
            ParserState::CDATANode => Some(TokenType::CdataSection),
            ParserState::Comment => Some(TokenType::Comment),
            ParserState::PresumptuousTag => Some(TokenType::PresumptuousTag),
            ParserState::FunkyComment => Some(TokenType::FunkyComment),

            ParserState::Ready | ParserState::Complete | ParserState::IncompleteInput => None,
        }
    }

    /// Tag name for tags, otherwise the token type.
    pub fn get_token_name(&self) -> Option<NodeName> {
        match self.parser_state {
            ParserState::MatchedTag => self.get_tag().map(NodeName::Tag),
            _ => self.get_token_type().map(NodeName::Token),
        }
    }

    /// Indicates if the current tag token is a tag closer.
    ///
    /// `</br>` is treated as a BR opener, as browsers do.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = TagProcessor::new(b"<div></div>");
    /// processor.next_token();
    /// processor.is_tag_closer() == false;
    ///
    /// processor.next_token();
    /// processor.is_tag_closer() == true;
    /// ```
    pub fn is_tag_closer(&self) -> bool {
        self.parser_state == ParserState::MatchedTag
            && self.is_closing_tag.unwrap_or(false)
            && (self.parsing_namespace != ParsingNamespace::Html
                || self.get_tag() != Some(TagName::BR))
    }

    /// Indicates if the currently matched tag opener contains the self-closing flag.
    ///
    /// The flag is only syntax: void elements close regardless, other HTML
    /// elements ignore it, and foreign elements honor it.
    ///
    /// ```text
    /// <figure />
    ///         ^ the solidus right before the closing ">"
    /// ```
    pub fn has_self_closing_flag(&self) -> bool {
        if self.parser_state != ParserState::MatchedTag || self.is_closing_tag.unwrap_or(true) {
            return false;
        }

        // Elements with special content end their opener where the text starts.
        let opener_ends_at = match (self.text_starts_at, self.token_starts_at, self.token_length) {
            (Some(text_starts_at), ..) => text_starts_at,
            (None, Some(starts_at), Some(length)) => starts_at + length,
            _ => return false,
        };

        opener_ends_at >= 2 && b'/' == self.html_bytes[opener_ends_at - 2]
    }

    /// Builds a standalone copy of the current token.
    pub fn get_token(&self) -> Option<Token> {
        let span = self.current_token_span()?;
        let token = match self.parser_state {
            ParserState::MatchedTag => Token::Tag {
                name: self.get_tag()?,
                is_closer: self.is_tag_closer(),
                has_self_closing_flag: self.has_self_closing_flag(),
                span,
                attributes: self
                    .attributes
                    .iter()
                    .map(|attribute| Attribute {
                        name: substr(&self.html_bytes, attribute.start, attribute.name_length).into(),
                        span: HtmlSpan::new(attribute.start, attribute.length),
                        value_span: (!attribute.is_true).then(|| {
                            HtmlSpan::new(attribute.value_starts_at, attribute.value_length)
                        }),
                    })
                    .collect(),
            },
            ParserState::TextNode => Token::Text {
                span,
                text: self.get_modifiable_text(),
                classification: self.text_node_classification,
            },
            ParserState::Comment => Token::Comment {
                comment_type: self.comment_type?,
                span,
                text: self.get_modifiable_text(),
            },
            ParserState::Doctype => Token::Doctype {
                span,
                text: self.get_modifiable_text(),
            },
            ParserState::CDATANode => Token::CdataSection {
                span,
                text: self.get_modifiable_text(),
            },
            ParserState::PresumptuousTag => Token::PresumptuousTag { span },
            ParserState::FunkyComment => Token::FunkyComment {
                span,
                text: self.get_modifiable_text(),
            },
            ParserState::Ready | ParserState::Complete | ParserState::IncompleteInput => {
                return None
            }
        };

        Some(token)
    }

    /// Span of the whole current token.
    pub(crate) fn current_token_span(&self) -> Option<HtmlSpan> {
        if matches!(
            self.parser_state,
            ParserState::Ready | ParserState::Complete | ParserState::IncompleteInput
        ) {
            return None;
        }
        Some(HtmlSpan::new(self.token_starts_at?, self.token_length?))
    }

    /// Span of the current token's modifiable text, if it has any.
    pub(crate) fn modifiable_text_span(&self) -> Option<HtmlSpan> {
        self.current_token_span()?;
        Some(HtmlSpan::new(self.text_starts_at?, self.text_length?))
    }

    pub fn get_comment_type(&self) -> Option<CommentType> {
        match self.parser_state {
            ParserState::Comment => self.comment_type,
            _ => None,
        }
    }

    /// Parses the current DOCTYPE token.
    pub fn get_doctype_info(&self) -> Option<HtmlDoctypeInfo> {
        if self.parser_state != ParserState::Doctype {
            return None;
        }
        let span = self.current_token_span()?;
        HtmlDoctypeInfo::from_doctype_token(&self.html_bytes[span.start..span.end()])
    }

    /// Namespace the processor currently parses tags in.
    pub fn get_namespace(&self) -> ParsingNamespace {
        self.parsing_namespace
    }

    /// Switches the namespace for subsequent tokens.
    ///
    /// Foreign content has real CDATA sections, and its SCRIPT, STYLE and
    /// other elements have no special content.
    pub fn change_parsing_namespace(&mut self, namespace: ParsingNamespace) -> bool {
        self.parsing_namespace = namespace;
        true
    }

    /// Tag name adjusted for the namespace: uppercase in HTML, lowercase in
    /// MathML, and camelCase where SVG requires it.
    pub fn get_qualified_tag_name(&self) -> Option<Box<[u8]>> {
        Some(self.get_tag()?.qualified_name(&self.parsing_namespace))
    }

    /// Attribute name adjusted for the namespace of the matched tag.
    pub fn get_qualified_attribute_name(&self, attribute_name: &[u8]) -> Option<Box<[u8]>> {
        if self.parser_state != ParserState::MatchedTag {
            return None;
        }
        Some(qualified_attribute_name(attribute_name, &self.parsing_namespace))
    }

    fn find_attribute(&self, comparable_name: &[u8]) -> Option<&AttributeToken> {
        self.attributes
            .iter()
            .find(|attribute| &*attribute.name == comparable_name)
    }

    fn attribute_value(&self, attribute: &AttributeToken) -> AttributeValue {
        if attribute.is_true {
            return AttributeValue::BooleanTrue;
        }
        let raw_value = substr(
            &self.html_bytes,
            attribute.value_starts_at,
            attribute.value_length,
        );
        AttributeValue::String(decode_attribute(raw_value).into())
    }

    /// Returns the value of a requested attribute from the matched tag opener.
    ///
    /// Names are matched ASCII case-insensitively and the first occurrence of
    /// a duplicated attribute wins. Pending edits are reflected.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = TagProcessor::new(br#"<div enabled class="test" data-test-id="14">Test</div>"#);
    /// processor.next_tag(None);
    /// processor.get_attribute(b"data-test-id") == Some(AttributeValue::String("14"))
    /// processor.get_attribute(b"enabled") == Some(AttributeValue::BooleanTrue)
    /// processor.get_attribute(b"aria-label") == None
    /// ```
    pub fn get_attribute(&self, name: &[u8]) -> Option<AttributeValue> {
        if self.parser_state != ParserState::MatchedTag {
            return None;
        }

        let comparable_name = name.to_ascii_lowercase();

        // `add_class()` and `remove_class()` build on the `class` attribute.
        if comparable_name == b"class" {
            if let Some(class) = self.pending_class_value() {
                return class.map(|class| AttributeValue::String(class.into()));
            }
        }

        if let Some(enqueued_value) = self.get_enqueued_attribute_value(&comparable_name) {
            return enqueued_value;
        }

        let attribute = self.find_attribute(&comparable_name)?;
        Some(self.attribute_value(attribute))
    }

    /// Value of an attribute as set by a pending edit.
    ///
    /// `None` when no edit is pending, `Some(None)` when the attribute is
    /// being removed.
    fn get_enqueued_attribute_value(&self, comparable_name: &[u8]) -> Option<Option<AttributeValue>> {
        let enqueued_text = &self
            .named_updates
            .iter()
            .find(|(key, _)| matches!(key, UpdateKey::Attribute(name) if &**name == comparable_name))?
            .1
            .text;

        // Removed attributes erase the entire span.
        if enqueued_text.is_empty() {
            return Some(None);
        }

        // Boolean attributes are the name alone, e.g. `<input checked>`.
        let Some(equals_at) = memchr::memchr(b'=', enqueued_text) else {
            return Some(Some(AttributeValue::BooleanTrue));
        };

        // Values written by `set_attribute()` are always double-quoted.
        let value = enqueued_text
            .get(equals_at + 2..enqueued_text.len() - 1)
            .unwrap_or_default();
        Some(Some(AttributeValue::String(decode_attribute(value).into())))
    }

    /// Gets lowercase names of all attributes matching a given prefix in the current tag.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = TagProcessor::new(br#"<div data-ENABLED class="test" DATA-test-id="14">Test</div>"#);
    /// processor.next_tag(None);
    /// processor.get_attribute_names_with_prefix(b"data-") == Some(vec!["data-enabled", "data-test-id"])
    /// ```
    pub fn get_attribute_names_with_prefix(&self, prefix: &[u8]) -> Option<Vec<Box<[u8]>>> {
        if self.parser_state != ParserState::MatchedTag || self.is_closing_tag.unwrap_or(true) {
            return None;
        }

        let comparable_prefix = prefix.to_ascii_lowercase();
        Some(
            self.attributes
                .iter()
                .filter(|attribute| attribute.name.starts_with(&comparable_prefix))
                .map(|attribute| attribute.name.clone())
                .collect(),
        )
    }

    fn is_modifiable_tag_opener(&self) -> bool {
        self.parser_state == ParserState::MatchedTag && !self.is_closing_tag.unwrap_or(true)
    }

    /// Replaces a pending update with the same key, or enqueues a new one.
    fn set_named_update(&mut self, key: UpdateKey, replacement: HtmlTextReplacement) {
        match self.named_updates.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = replacement,
            None => self.named_updates.push((key, replacement)),
        }
    }

    /// Updates or creates a new attribute on the currently matched tag.
    ///
    /// The value is escaped and double-quoted. For duplicated attributes only
    /// the first occurrence is replaced.
    ///
    /// Example:
    ///
    /// ```text
    /// <input type=text>  ->  set_attribute("type", "checkbox")  ->  <input type="checkbox">
    /// ```
    ///
    /// Returns whether the update was enqueued.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        if !self.is_modifiable_tag_opener() || !is_valid_attribute_name(name) {
            return false;
        }

        let escaped_value = html_special_chars(value.as_bytes());
        let mut updated_attribute = Vec::with_capacity(name.len() + escaped_value.len() + 3);
        updated_attribute.extend_from_slice(name.as_bytes());
        updated_attribute.extend_from_slice(b"=\"");
        updated_attribute.extend_from_slice(&escaped_value);
        updated_attribute.push(b'"');

        self.enqueue_attribute_update(name.as_bytes(), updated_attribute);
        true
    }

    /// Sets a valueless attribute when `value` is true, otherwise removes it.
    ///
    /// ```text
    /// <input>  ->  set_boolean_attribute("checked", true)  ->  <input checked>
    /// ```
    pub fn set_boolean_attribute(&mut self, name: &str, value: bool) -> bool {
        if !value {
            return self.remove_attribute(name);
        }

        if !self.is_modifiable_tag_opener() || !is_valid_attribute_name(name) {
            return false;
        }

        self.enqueue_attribute_update(name.as_bytes(), name.as_bytes().to_vec());
        true
    }

    fn enqueue_attribute_update(&mut self, name: &[u8], updated_attribute: Vec<u8>) {
        let comparable_name: Box<[u8]> = name.to_ascii_lowercase().into();

        let replacement = match self.find_attribute(&comparable_name) {
            Some(existing) => {
                HtmlTextReplacement::new(existing.start, existing.length, updated_attribute)
            }
            None => {
                let (Some(at), Some(length)) = (self.tag_name_starts_at, self.tag_name_length) else {
                    return;
                };
                let mut text = Vec::with_capacity(updated_attribute.len() + 1);
                text.push(b' ');
                text.extend_from_slice(&updated_attribute);
                HtmlTextReplacement::new(at + length, 0, text)
            }
        };

        // Setting `class` directly discards pending class edits.
        if &*comparable_name == b"class" {
            self.classname_updates.clear();
        }

        self.set_named_update(UpdateKey::Attribute(comparable_name), replacement);
    }

    /// Removes an attribute, and all of its duplicates, from the currently matched tag.
    ///
    /// Returns whether an attribute present in the document was removed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        if !self.is_modifiable_tag_opener() {
            return false;
        }

        let comparable_name: Box<[u8]> = name.as_bytes().to_ascii_lowercase().into();

        if &*comparable_name == b"class" {
            self.classname_updates.clear();
        }

        // An attribute only set by a pending edit just loses that edit.
        let Some(existing) = self.find_attribute(&comparable_name) else {
            self.named_updates.retain(
                |(key, _)| !matches!(key, UpdateKey::Attribute(name) if *name == comparable_name),
            );
            return false;
        };
        let removal = HtmlTextReplacement::new(existing.start, existing.length, b"".as_slice());

        for (_, span) in self
            .duplicate_attributes
            .iter()
            .filter(|(name, _)| *name == comparable_name)
        {
            self.lexical_updates
                .push(HtmlTextReplacement::new(span.start, span.length, b"".as_slice()));
        }

        self.set_named_update(UpdateKey::Attribute(comparable_name), removal);
        true
    }

    /// Adds a class name to the currently matched tag.
    ///
    /// Class edits are merged into a single `class` update when flushed.
    pub fn add_class(&mut self, class_name: &str) -> bool {
        self.enqueue_class_update(class_name, ClassUpdate::Add)
    }

    /// Removes a class name from the currently matched tag.
    pub fn remove_class(&mut self, class_name: &str) -> bool {
        self.enqueue_class_update(class_name, ClassUpdate::Remove)
    }

    fn enqueue_class_update(&mut self, class_name: &str, operation: ClassUpdate) -> bool {
        if !self.is_modifiable_tag_opener() {
            return false;
        }

        /*
         * In quirks mode class names match ASCII case-insensitively, so an
         * enqueued case variant is updated in place. The casing of the first
         * provided name is kept.
         */
        let is_quirks = self.compat_mode == CompatMode::Quirks;
        let existing = self.classname_updates.iter_mut().find(|(name, _)| {
            if is_quirks {
                name.eq_ignore_ascii_case(class_name.as_bytes())
            } else {
                **name == *class_name.as_bytes()
            }
        });

        match existing {
            Some((_, existing_operation)) => *existing_operation = operation,
            None => self
                .classname_updates
                .push((class_name.as_bytes().into(), operation)),
        }

        true
    }

    /// The `class` value resulting from pending class edits.
    ///
    /// `None` when they leave the attribute unchanged, `Some(None)` when the
    /// attribute ends up empty and should be removed.
    ///
    /// Whitespace between kept classes is preserved, removed and duplicated
    /// classes are dropped, and new classes are appended with a single space.
    fn pending_class_value(&self) -> Option<Option<Vec<u8>>> {
        if self.classname_updates.is_empty() {
            return None;
        }

        let existing_class: Vec<u8> = match self.get_enqueued_attribute_value(b"class") {
            Some(Some(AttributeValue::String(value))) => value.to_vec(),
            Some(_) => Vec::new(),
            None => match self.find_attribute(b"class") {
                Some(attribute) => self.attribute_value(attribute).as_bytes().to_vec(),
                None => Vec::new(),
            },
        };

        let is_quirks = self.compat_mode == CompatMode::Quirks;
        let comparable = |name: &[u8]| -> Vec<u8> {
            if is_quirks {
                name.to_ascii_lowercase()
            } else {
                name.to_vec()
            }
        };

        let to_remove: Vec<Vec<u8>> = self
            .classname_updates
            .iter()
            .filter(|(_, operation)| *operation == ClassUpdate::Remove)
            .map(|(name, _)| comparable(name))
            .collect();

        let mut class = Vec::with_capacity(existing_class.len());
        let mut seen: Vec<Vec<u8>> = Vec::new();
        let mut modified = false;
        let mut at = 0;

        while at < existing_class.len() {
            let whitespace_at = at;
            at += strspn!(existing_class, b' ' | b'\t' | 0x0c | b'\r' | b'\n', at);
            if at >= existing_class.len() {
                break;
            }

            let name_length = strcspn!(existing_class, b' ' | b'\t' | 0x0c | b'\r' | b'\n', at);
            let name = &existing_class[at..at + name_length];
            let comparable_name = comparable(name);
            at += name_length;

            if to_remove.contains(&comparable_name) {
                modified = true;
                continue;
            }

            if seen.contains(&comparable_name) {
                continue;
            }
            seen.push(comparable_name);

            if !class.is_empty() {
                class.extend_from_slice(&existing_class[whitespace_at..at - name_length]);
            }
            class.extend_from_slice(name);
        }

        for (name, operation) in &self.classname_updates {
            let comparable_name = comparable(&name[..]);
            if *operation == ClassUpdate::Add && !seen.contains(&comparable_name) {
                modified = true;
                if !class.is_empty() {
                    class.push(b' ');
                }
                class.extend_from_slice(name);
                seen.push(comparable_name);
            }
        }

        if !modified {
            return None;
        }

        Some((!class.is_empty()).then_some(class))
    }

    /// Converts pending class edits into one `class` attribute update.
    fn class_name_updates_to_attributes_updates(&mut self) {
        let class = self.pending_class_value();
        self.classname_updates.clear();

        match class {
            None => {}
            Some(Some(class)) => {
                let mut updated_attribute = b"class=\"".to_vec();
                updated_attribute.extend_from_slice(&html_special_chars(&class));
                updated_attribute.push(b'"');
                self.enqueue_attribute_update(b"class", updated_attribute);
            }
            Some(None) => {
                self.remove_attribute("class");
            }
        }
    }

    /// Returns the class names of the matched tag opener, deduplicated.
    ///
    /// NULL bytes become U+FFFD, and names are lowercased in quirks mode.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = TagProcessor::new(b"<div class='free &lt;egg&lt;\tlang-en'>");
    /// processor.next_tag(None);
    /// processor.class_list() == Some(vec!["free", "<egg<", "lang-en"])
    /// ```
    pub fn class_list(&self) -> Option<Vec<Box<[u8]>>> {
        if !self.is_modifiable_tag_opener() {
            return None;
        }

        let Some(AttributeValue::String(class)) = self.get_attribute(b"class") else {
            return Some(Vec::new());
        };

        let is_quirks = self.compat_mode == CompatMode::Quirks;
        let mut seen: Vec<Box<[u8]>> = Vec::new();
        let mut at = 0;

        while at < class.len() {
            at += strspn!(class, b' ' | b'\t' | 0x0c | b'\r' | b'\n', at);
            if at >= class.len() {
                break;
            }

            let length = strcspn!(class, b' ' | b'\t' | 0x0c | b'\r' | b'\n', at);
            let mut name = replace_null_bytes(&class[at..at + length]).into_vec();
            if is_quirks {
                name.make_ascii_lowercase();
            }
            at += length;

            if !seen.iter().any(|existing| **existing == *name) {
                seen.push(name.into());
            }
        }

        Some(seen)
    }

    /// Returns if a matched tag contains the given class name.
    ///
    /// Returns `None` when not paused on a tag opener.
    pub fn has_class(&self, wanted_class: &str) -> Option<bool> {
        let class_list = self.class_list()?;
        let is_quirks = self.compat_mode == CompatMode::Quirks;

        Some(class_list.iter().any(|class_name| {
            if is_quirks {
                class_name.eq_ignore_ascii_case(wanted_class.as_bytes())
            } else {
                **class_name == *wanted_class.as_bytes()
            }
        }))
    }

    /// Returns the modifiable text for a matched token, or an empty string.
    ///
    /// Modifiable text is text content that may be read and changed without
    /// changing the HTML structure of the document:
    ///
    ///  - the text of text nodes, with character references decoded;
    ///  - the content of SCRIPT, STYLE and other raw text elements;
    ///  - the decoded content of TEXTAREA and TITLE;
    ///  - the data of comments and other comment-like tokens.
    ///
    /// Newlines are normalized, and NULL bytes are removed from HTML text
    /// nodes and replaced by U+FFFD everywhere else.
    pub fn get_modifiable_text(&self) -> Box<[u8]> {
        let enqueued_text = self
            .named_updates
            .iter()
            .find(|(key, _)| *key == UpdateKey::ModifiableText)
            .map(|(_, update)| update.text.as_ref());

        let raw_text = match (enqueued_text, self.text_starts_at, self.text_length) {
            (Some(text), ..) => text,
            (None, Some(at), Some(length)) if length > 0 => substr(&self.html_bytes, at, length),
            _ => return Box::default(),
        };

        let text = normalize_newlines(raw_text);

        // Comment data is not decoded.
        if matches!(
            self.parser_state,
            ParserState::CDATANode
                | ParserState::Comment
                | ParserState::Doctype
                | ParserState::FunkyComment
        ) {
            return replace_null_bytes(&text);
        }

        // Script data and RAWTEXT are not decoded.
        let tag = self.get_tag();
        if matches!(
            tag,
            Some(
                TagName::SCRIPT
                    | TagName::IFRAME
                    | TagName::NOEMBED
                    | TagName::NOFRAMES
                    | TagName::STYLE
                    | TagName::XMP
            )
        ) {
            return replace_null_bytes(&text);
        }

        let mut decoded = decode_text_node(&text).into_vec();
        let is_text_node = self.parser_state == ParserState::TextNode;

        // The skipped newline may have been written as a character reference.
        let skips_leading_newline = (is_text_node
            && self.skip_newline_at.is_some()
            && self.skip_newline_at == self.token_starts_at)
            || tag == Some(TagName::TEXTAREA);
        if skips_leading_newline && decoded.first() == Some(&b'\n') {
            decoded.remove(0);
        }

        if is_text_node && self.parsing_namespace == ParsingNamespace::Html {
            decoded.retain(|&byte| byte != 0);
            return decoded.into();
        }

        replace_null_bytes(&decoded)
    }

    /// Sets the modifiable text for the matched token, if possible.
    ///
    /// Text nodes, TEXTAREA and TITLE contents are escaped. Updates which
    /// could change the document structure are rejected: comment text that
    /// would close the comment, and SCRIPT contents containing a script tag.
    /// In STYLE contents `</style` is escaped as the CSS `\3c\2fstyle`.
    ///
    /// Returns whether the update was enqueued.
    pub fn set_modifiable_text(&mut self, plaintext_content: &str) -> bool {
        let content = plaintext_content.as_bytes();

        let (Some(text_starts_at), Some(text_length)) = (self.text_starts_at, self.text_length)
        else {
            return false;
        };

        let updated_text: Vec<u8> = match self.parser_state {
            ParserState::TextNode => html_special_chars(content),

            ParserState::Comment if self.comment_type == Some(CommentType::HtmlComment) => {
                if contains_comment_closer(content) {
                    return false;
                }
                content.to_vec()
            }

            ParserState::MatchedTag => match self.get_tag() {
                Some(TagName::SCRIPT) => {
                    if stripos(content, b"</script", 0).is_some()
                        || stripos(content, b"<script", 0).is_some()
                    {
                        return false;
                    }
                    content.to_vec()
                }
                Some(TagName::STYLE) => escape_style_closers(content),
                Some(TagName::TEXTAREA | TagName::TITLE) => html_special_chars(content),
                _ => return false,
            },

            _ => return false,
        };

        self.set_named_update(
            UpdateKey::ModifiableText,
            HtmlTextReplacement::new(text_starts_at, text_length, updated_text),
        );
        true
    }

    /// Returns the full text of a comment-like token, as it would appear in
    /// an HTML comment.
    ///
    /// ```text
    /// <![CDATA[x]]>   -> "[CDATA[x]]"
    /// <?xml version?> -> "?xml version?"
    /// <?bogus>        -> "?bogus"
    /// </#funky>       -> "#funky"
    /// ```
    pub fn get_full_comment_text(&self) -> Option<Box<[u8]>> {
        if self.parser_state == ParserState::FunkyComment {
            return Some(self.get_modifiable_text());
        }

        let text = self.get_modifiable_text();
        let full_text: Vec<u8> = match self.get_comment_type()? {
            CommentType::HtmlComment | CommentType::AbruptlyClosedComment => return Some(text),
            CommentType::CdataLookalike => {
                [b"[CDATA[".as_slice(), &text[..], b"]]".as_slice()].concat()
            }
            CommentType::PiNodeLookalike => {
                [b"?".as_slice(), self.get_pi_target()?, &text[..], b"?".as_slice()].concat()
            }
            CommentType::InvalidHtml => {
                let text_starts_at = self.text_starts_at?;
                let is_pi_opener = text_starts_at > 0 && b'?' == self.html_bytes[text_starts_at - 1];
                if is_pi_opener {
                    [b"?".as_slice(), &text[..]].concat()
                } else {
                    return Some(text);
                }
            }
        };

        Some(full_text.into())
    }

    /// Splits leading NULL bytes or leading whitespace off the current text
    /// node into a token of their own.
    ///
    /// Anything else leaves the remainder of the text node intact as generic
    /// text, which the next call to `next_token()` will read.
    ///
    /// Example:
    ///
    /// ```text
    /// "\0Apples & Oranges"
    ///  ^^ NullSequence, then "Apples & Oranges"
    ///
    /// "&#x20; \r\n\tMore"
    ///  ^^^^^^^^^^^^^ Whitespace, then "More"
    /// ```
    ///
    /// Returns whether the text node was subdivided.
    pub(crate) fn subdivide_text_appropriately(&mut self) -> bool {
        if self.parser_state != ParserState::TextNode {
            return false;
        }

        self.text_node_classification = TextNodeClassification::Generic;

        let (Some(text_starts_at), Some(text_length)) = (self.text_starts_at, self.text_length)
        else {
            return false;
        };

        // NULL bytes differ from `&#x00;`, which decodes to U+FFFD.
        let leading_nulls = strspn!(self.html_bytes, b'\0', text_starts_at, text_length);
        if leading_nulls > 0 {
            self.token_length = Some(leading_nulls);
            self.text_length = Some(leading_nulls);
            self.bytes_already_parsed = text_starts_at + leading_nulls;
            self.text_node_classification = TextNodeClassification::NullSequence;
            return true;
        }

        // Find the longest run of whitespace, including character references to whitespace.
        let end = text_starts_at + text_length;
        let mut at = text_starts_at;
        while at < end {
            at += strspn!(
                self.html_bytes,
                b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                at,
                end - at
            );

            if at < end && b'&' == self.html_bytes[at] {
                if let Some((replacement, matched_length)) =
                    read_character_reference(HtmlContext::BodyText, &self.html_bytes, at)
                {
                    if replacement.len() == 1
                        && matches!(replacement[0], b' ' | b'\t' | 0x0c | b'\r' | b'\n')
                    {
                        at += matched_length;
                        continue;
                    }
                }
            }

            break;
        }

        if at > text_starts_at {
            let new_length = at - text_starts_at;
            self.token_length = Some(new_length);
            self.text_length = Some(new_length);
            self.bytes_already_parsed = at;
            self.text_node_classification = TextNodeClassification::Whitespace;
            return true;
        }

        false
    }

    /// Sets a bookmark on the current token.
    ///
    /// Bookmarks track a token as edits shift the document around it, and
    /// allow seeking back to it later. A bookmark is released automatically
    /// when an edit replaces its token.
    ///
    /// Example:
    ///
    /// ```text
    /// <main><h2>Surprising fact you may not know!</h2></main>
    ///       ^  ^
    ///        \-|-- this `H2` opener bookmark tracks the token
    ///
    /// <main class="clickbait"><h2>Surprising fact you may no…
    ///                         ^  ^
    ///                          \-|-- it shifts with edits
    /// ```
    ///
    /// Bookmarks are remapped on every flush of edits, so only a few may
    /// exist at once; release them when they are no longer needed.
    pub fn set_bookmark(&mut self, name: &str) -> Result<(), BookmarkError> {
        let span = self.current_token_span().ok_or(BookmarkError::NoToken)?;

        if !self.bookmarks.contains_key(name) && self.bookmarks.len() >= self.config.max_bookmarks
        {
            log::warn!(
                target: LOG_TARGET,
                "Too many bookmarks: cannot create {name:?} with {} already set",
                self.bookmarks.len()
            );
            return Err(BookmarkError::Exhausted);
        }

        self.bookmarks.insert(name.into(), span);
        Ok(())
    }

    /// Removes a bookmark that is no longer needed.
    ///
    /// Returns whether the bookmark existed.
    pub fn release_bookmark(&mut self, name: &str) -> bool {
        self.bookmarks.remove(name).is_some()
    }

    pub fn has_bookmark(&self, name: &str) -> bool {
        self.bookmarks.contains_key(name)
    }

    /// Moves the cursor back or forward to a bookmarked token and reads it.
    ///
    /// Pending edits are applied first. Seeks are limited per processor to
    /// prevent accidental infinite loops.
    pub fn seek(&mut self, name: &str) -> bool {
        if !self.bookmarks.contains_key(name) {
            log::warn!(target: LOG_TARGET, "Unknown bookmark name {name:?}");
            return false;
        }

        if !self.rewind_to_bookmark_position(|processor| processor.bookmarks.get(name).copied()) {
            return false;
        }

        self.next_token()
    }

    /// Counts a seek, flushes edits, and moves the cursor to the start of the
    /// span `find_span` returns after the flush.
    fn rewind_to_bookmark_position(
        &mut self,
        find_span: impl FnOnce(&Self) -> Option<HtmlSpan>,
    ) -> bool {
        if !self.count_seek() {
            return false;
        }

        self.get_updated_html();

        let Some(span) = find_span(self) else {
            return false;
        };

        self.after_tag();
        self.bytes_already_parsed = span.start;
        self.parser_state = ParserState::Ready;
        true
    }

    /// Counts one seek against `max_seek_ops`, returning false once exhausted.
    pub(crate) fn count_seek(&mut self) -> bool {
        self.seek_count += 1;
        if self.seek_count > self.config.max_seek_ops {
            log::warn!(
                target: LOG_TARGET,
                "Too many calls to seek(): exceeded the limit of {}",
                self.config.max_seek_ops
            );
            return false;
        }
        true
    }

    pub(crate) fn bookmark_span(&self, name: &str) -> Option<HtmlSpan> {
        self.bookmarks.get(name).copied()
    }

    /// Moves the cursor to the start of the document without reading a token.
    pub(crate) fn rewind_to_start(&mut self) -> bool {
        self.rewind_to_bookmark_position(|_| Some(HtmlSpan::default()))
    }

    /// Bookmarks the current token under a node id.
    pub(crate) fn set_internal_bookmark(&mut self, id: u32) -> Result<(), BookmarkError> {
        let span = self.current_token_span().ok_or(BookmarkError::NoToken)?;
        self.internal_bookmarks.insert(id, span);
        Ok(())
    }

    pub(crate) fn insert_internal_bookmark(&mut self, id: u32, span: HtmlSpan) {
        self.internal_bookmarks.insert(id, span);
    }

    pub(crate) fn release_internal_bookmark(&mut self, id: u32) -> bool {
        self.internal_bookmarks.remove(&id).is_some()
    }

    pub(crate) fn retain_internal_bookmarks(&mut self, keep: impl Fn(u32) -> bool) {
        self.internal_bookmarks.retain(|id, _| keep(*id));
    }

    /// Applies a raw replacement ending at or before the cursor, bypassing
    /// all escaping.
    ///
    /// Parsing continues after the new text, which is never visited. A current
    /// token overlapped by the replacement is forgotten.
    pub(crate) fn apply_raw_replacement(&mut self, replacement: HtmlTextReplacement) {
        let replaced_end = replacement.end();
        self.lexical_updates.push(replacement);

        if self.token_starts_at.is_some_and(|at| at >= replaced_end) {
            self.get_updated_html();
            return;
        }

        self.class_name_updates_to_attributes_updates();
        self.bytes_already_parsed = self.apply_lexical_updates(self.bytes_already_parsed);
        self.after_tag();
    }
}

/// Validates a name for `set_attribute()`.
///
/// Rejects syntax characters, whitespace, controls and noncharacters, which
/// would break out of the attribute or produce an unreadable name.
///
/// @see https://html.spec.whatwg.org/#attributes-2
fn is_valid_attribute_name(name: &str) -> bool {
    let is_valid = !name.is_empty()
        && name.chars().all(|c| {
            !matches!(
                c,
                '"' | '\'' | '>' | '&' | '<' | '/' | '=' | ' '
                    | '\0'..='\x1f'
                    | '\x7f'
                    | '\u{FDD0}'..='\u{FDEF}'
            ) && ((c as u32) & 0xFFFE) != 0xFFFE
        });

    if !is_valid {
        log::warn!(target: LOG_TARGET, "Invalid attribute name {name:?}");
    }
    is_valid
}

fn contains_comment_closer(text: &[u8]) -> bool {
    memchr::memmem::find_iter(text, b"--").any(|at| {
        let rest = &text[at + 2..];
        rest.starts_with(b">") || rest.starts_with(b"!>")
    })
}

/// Escapes `</style` as `\3c\2fstyle` so that text can't close a STYLE
/// element, keeping the case of the tag name as written.
fn escape_style_closers(text: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(text.len());
    let mut at = 0;
    while let Some(closer_at) = stripos(text, b"</style", at) {
        escaped.extend_from_slice(&text[at..closer_at]);
        escaped.extend_from_slice(b"\\3c\\2f");
        escaped.extend_from_slice(&text[closer_at + 2..closer_at + 7]);
        at = closer_at + 7;
    }
    escaped.extend_from_slice(&text[at..]);
    escaped
}

/// Converts CRLF and lone CR into LF.
fn normalize_newlines(text: &[u8]) -> Vec<u8> {
    if memchr::memchr(b'\r', text).is_none() {
        return text.to_vec();
    }

    let mut normalized = Vec::with_capacity(text.len());
    let mut bytes = text.iter().peekable();
    while let Some(&c) = bytes.next() {
        if c == b'\r' {
            bytes.next_if_eq(&&b'\n');
            normalized.push(b'\n');
        } else {
            normalized.push(c);
        }
    }
    normalized
}

fn replace_null_bytes(text: &[u8]) -> Box<[u8]> {
    let mut replaced = Vec::with_capacity(text.len());
    for &c in text {
        if c == 0 {
            replaced.extend_from_slice(REPLACEMENT_CHARACTER);
        } else {
            replaced.push(c);
        }
    }
    replaced.into()
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum ParserState {
    #[default]
    Ready,
    Complete,
    IncompleteInput,
    MatchedTag,
    TextNode,
    CDATANode,
    Comment,
    Doctype,
    PresumptuousTag,
    FunkyComment,
}

#[derive(Debug, Clone)]
struct AttributeToken {
    /// Lowercase name, for case-insensitive lookup.
    name: Box<[u8]>,

    /// The byte length of the name as written.
    name_length: usize,

    /// The byte offset where the attribute value starts.
    value_starts_at: usize,

    /// The byte length of the attribute value.
    value_length: usize,

    /// The byte offset where the attribute name starts.
    start: usize,

    /// Byte length of text spanning the attribute inside a tag.
    ///
    /// This span starts at the first character of the attribute name
    /// and it ends after one of three cases:
    ///
    ///  - at the end of the attribute name for boolean attributes.
    ///  - at the end of the value for unquoted attributes.
    ///  - at the final single or double quote for quoted attributes.
    ///
    /// Example:
    ///
    /// ```text
    /// <div class="post">
    ///      ------------ length is 12, including quotes
    ///
    /// <input type="checked" checked id="selector">
    ///                       ------- length is 7
    ///
    /// <a rel=noopener>
    ///    ------------ length is 12
    /// ```
    length: usize,

    /// Whether the attribute is a boolean attribute with value `true`.
    is_true: bool,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum ScriptState {
    Unescaped,
    Escaped,
    DoubleEscaped,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    fn updated_html(processor: &mut TagProcessor) -> String {
        text(&processor.get_updated_html())
    }

    fn attribute(processor: &TagProcessor, name: &str) -> Option<String> {
        processor
            .get_attribute(name.as_bytes())
            .map(|value| text(value.as_bytes()))
    }

    #[test]
    fn test_base_next_token() {
        let mut processor = TagProcessor::new(b"<p>Hello world!</p>");
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Tag));
        assert_eq!(processor.get_token_name(), Some(TagName::P.into()));
        assert_eq!(processor.get_tag(), Some(TagName::P));
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.get_token_name(), Some(TokenType::Text.into()));
        assert_eq!(text(&processor.get_modifiable_text()), "Hello world!");
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::P));
        assert!(processor.is_tag_closer());
        assert!(!processor.next_token());
        assert!(!processor.paused_at_incomplete_token());
    }

    #[test]
    fn lone_less_than_signs_are_text() {
        let mut processor = TagProcessor::new(b"I <3 HTML <> and </3 too>");
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(text(&processor.get_modifiable_text()), "I <3 HTML <> and ");

        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::FunkyComment));
        assert_eq!(text(&processor.get_modifiable_text()), "3 too");
        assert!(!processor.next_token());
        assert!(!processor.paused_at_incomplete_token());
    }

    #[test]
    fn classifies_comment_syntax() {
        let cases: &[(&str, CommentType, &str, &str)] = &[
            ("<!-- comment -->", CommentType::HtmlComment, " comment ", " comment "),
            ("<!-- not --!> closed", CommentType::HtmlComment, " not ", " not "),
            ("<!---->", CommentType::HtmlComment, "", ""),
            ("<!-->", CommentType::AbruptlyClosedComment, "", ""),
            ("<!--->", CommentType::AbruptlyClosedComment, "", ""),
            ("<![CDATA[data]]>", CommentType::CdataLookalike, "data", "[CDATA[data]]"),
            ("<?xml version=\"1.0\"?>", CommentType::PiNodeLookalike, " version=\"1.0\"", "?xml version=\"1.0\"?"),
            ("<?bogus>", CommentType::InvalidHtml, "bogus", "?bogus"),
            ("<!bogus>", CommentType::InvalidHtml, "bogus", "bogus"),
        ];

        for (html, comment_type, modifiable_text, full_text) in cases {
            let mut processor = TagProcessor::new(html.as_bytes());
            assert!(processor.next_token(), "{html}");
            assert_eq!(processor.get_token_type(), Some(TokenType::Comment), "{html}");
            assert_eq!(processor.get_comment_type(), Some(*comment_type), "{html}");
            assert_eq!(text(&processor.get_modifiable_text()), *modifiable_text, "{html}");
            assert_eq!(
                processor.get_full_comment_text().map(|t| text(&t)),
                Some(full_text.to_string()),
                "{html}"
            );
        }
    }

    #[test]
    fn other_markup_tokens() {
        let mut processor = TagProcessor::new(b"<!DOCTYPE html></></#funky>");
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Doctype));
        assert_eq!(
            processor.get_doctype_info().map(|info| info.indicated_compat_mode),
            Some(CompatMode::NoQuirks)
        );
        assert_eq!(text(&processor.get_modifiable_text()), " html");

        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::PresumptuousTag));
        assert_eq!(processor.get_token(), Some(Token::PresumptuousTag { span: HtmlSpan::new(15, 3) }));

        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::FunkyComment));
        assert_eq!(
            processor.get_full_comment_text().map(|t| text(&t)),
            Some("#funky".to_string())
        );
    }

    #[test]
    fn cdata_sections_only_exist_in_foreign_content() {
        let mut processor = TagProcessor::new(b"<![CDATA[x<y]]>");
        processor.next_token();
        assert_eq!(processor.get_token_type(), Some(TokenType::Comment));
        assert_eq!(text(&processor.get_modifiable_text()), "x<y");
        assert_eq!(
            processor.get_full_comment_text().map(|t| text(&t)),
            Some("[CDATA[x<y]]".to_string())
        );

        let mut processor = TagProcessor::new(b"<![CDATA[x<y]]>");
        processor.change_parsing_namespace(ParsingNamespace::Svg);
        processor.next_token();
        assert_eq!(processor.get_token_type(), Some(TokenType::CdataSection));
        assert_eq!(text(&processor.get_modifiable_text()), "x<y");
    }

    #[test]
    fn pauses_at_incomplete_input() {
        for html in ["<div class=\"x", "<div", "<!-- open", "<", "text<p", "<!DOCTYPE html", "<title>x</title"] {
            let mut processor = TagProcessor::new(html.as_bytes());
            while processor.next_token() {}
            assert!(processor.paused_at_incomplete_token(), "{html}");
            assert!(!processor.next_token(), "{html}");
            assert!(processor.paused_at_incomplete_token(), "{html}");
            assert_eq!(updated_html(&mut processor), html);
        }
    }

    #[test]
    fn script_data_handles_escaped_states() {
        let html = b"<script><!--<script></script>--></script><p>";
        let mut processor = TagProcessor::new(html);
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::SCRIPT));
        assert_eq!(
            text(&processor.get_modifiable_text()),
            "<!--<script></script>-->"
        );
        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::P));
    }

    #[test]
    fn rcdata_is_decoded_and_rawtext_is_not() {
        let mut processor = TagProcessor::new(
            b"<textarea id=a>\n&lt;b&gt;</textarea x=1><style>&lt;</STYLE ><title>a</titlex></title>",
        );
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::TEXTAREA));
        assert_eq!(text(&processor.get_modifiable_text()), "<b>");
        assert_eq!(attribute(&processor, "id"), Some("a".to_string()));
        assert_eq!(attribute(&processor, "x"), None);

        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::STYLE));
        assert_eq!(text(&processor.get_modifiable_text()), "&lt;");

        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::TITLE));
        assert_eq!(text(&processor.get_modifiable_text()), "a</titlex>");
        assert!(!processor.next_token());
    }

    #[test]
    fn special_elements_are_plain_in_foreign_content() {
        let mut processor = TagProcessor::new(b"<title><b></b></title>");
        processor.change_parsing_namespace(ParsingNamespace::Svg);
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::TITLE));
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some(TagName::B));
    }

    #[test]
    fn modifiable_text_normalizes_text() {
        let mut processor = TagProcessor::new(b"<pre>\nline\r\nnext\r</pre>a\0b<pre>&#x0a;x</pre><script>\0</script>");
        processor.next_token();
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "line\nnext\n");

        processor.next_token();
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "ab");

        processor.next_token();
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "x");

        processor.next_token();
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "\u{FFFD}");
    }

    #[test]
    fn attributes_are_case_insensitive_and_first_wins() {
        let mut processor =
            TagProcessor::new(br#"<div ID=one id=two data-x="&amp;" checked DATA-y='&copy=1'>"#);
        assert!(processor.next_tag(None));
        assert_eq!(attribute(&processor, "id"), Some("one".to_string()));
        assert_eq!(attribute(&processor, "data-x"), Some("&".to_string()));
        assert_eq!(attribute(&processor, "data-y"), Some("&copy=1".to_string()));
        assert_eq!(
            processor.get_attribute(b"checked"),
            Some(AttributeValue::BooleanTrue)
        );
        assert_eq!(processor.get_attribute(b"missing"), None);
        assert_eq!(
            processor.get_attribute_names_with_prefix(b"DATA-"),
            Some(vec![b"data-x".as_slice().into(), b"data-y".as_slice().into()])
        );
    }

    #[test]
    fn closers_have_no_attributes() {
        let mut processor = TagProcessor::new(b"<div></div id=x>");
        processor.next_tag(None);
        assert!(processor.next_tag(Some(&TagQuery {
            tag_closers: VisitClosers::Visit,
            ..Default::default()
        })));
        assert!(processor.is_tag_closer());
        assert_eq!(processor.get_attribute(b"id"), None);
        assert!(!processor.set_attribute("id", "y"));
        assert!(!processor.add_class("x"));
    }

    #[test]
    fn set_attribute_escapes_and_replaces_first_occurrence() {
        let mut processor = TagProcessor::new(b"<div id=one ID=two>");
        processor.next_tag(None);
        assert!(processor.set_attribute("id", "<\"new\" & 'old'>"));
        assert_eq!(
            attribute(&processor, "id"),
            Some("<\"new\" & 'old'>".to_string())
        );
        assert_eq!(
            updated_html(&mut processor),
            "<div id=\"&lt;&quot;new&quot; &amp; &apos;old&apos;&gt;\" ID=two>"
        );
        assert_eq!(
            attribute(&processor, "id"),
            Some("<\"new\" & 'old'>".to_string())
        );
    }

    #[test]
    fn set_attribute_adds_new_attributes() {
        let mut processor = TagProcessor::new(b"<div><img>");
        processor.next_tag(None);
        assert!(processor.set_attribute("data-count", "3"));
        assert!(processor.set_boolean_attribute("hidden", true));
        assert_eq!(processor.get_attribute(b"hidden"), Some(AttributeValue::BooleanTrue));
        processor.next_tag(None);
        assert!(processor.set_attribute("alt", ""));
        assert_eq!(
            updated_html(&mut processor),
            "<div data-count=\"3\" hidden><img alt=\"\">"
        );
    }

    #[test]
    fn rejects_invalid_attribute_names() {
        let mut processor = TagProcessor::new(b"<div>");
        processor.next_tag(None);
        for name in ["", "a b", "on\"x", "x>", "a=b", "a/b", "\u{7}", "\u{FDD0}", "\u{FFFE}"] {
            assert!(!processor.set_attribute(name, "x"), "{name:?}");
        }
        assert!(processor.set_attribute("data-ü", "x"));
    }

    #[test]
    fn remove_attribute_removes_duplicates() {
        let mut processor = TagProcessor::new(b"<div id=one ID=two class=x>");
        processor.next_tag(None);
        assert!(processor.remove_attribute("Id"));
        assert_eq!(processor.get_attribute(b"id"), None);
        assert!(!processor.remove_attribute("title"));
        assert_eq!(updated_html(&mut processor), "<div   class=x>");
    }

    #[test]
    fn removing_a_set_attribute_drops_the_edit() {
        let mut processor = TagProcessor::new(b"<div>");
        processor.next_tag(None);
        processor.set_attribute("title", "x");
        assert!(!processor.remove_attribute("title"));
        assert_eq!(updated_html(&mut processor), "<div>");
    }

    #[test]
    fn class_edits_merge_into_one_update() {
        let mut processor = TagProcessor::new(b"<div class=\"one  two one THREE\">");
        processor.next_tag(None);
        assert!(processor.add_class("four"));
        assert!(processor.remove_class("two"));
        assert_eq!(
            attribute(&processor, "class"),
            Some("one THREE four".to_string())
        );
        assert_eq!(processor.has_class("three"), Some(false));
        assert_eq!(processor.has_class("THREE"), Some(true));
        assert_eq!(
            updated_html(&mut processor),
            "<div class=\"one THREE four\">"
        );
        assert_eq!(
            processor.class_list(),
            Some(vec![
                b"one".as_slice().into(),
                b"THREE".as_slice().into(),
                b"four".as_slice().into()
            ])
        );
    }

    #[test]
    fn removing_every_class_removes_the_attribute() {
        let mut processor = TagProcessor::new(b"<div class=only id=x>");
        processor.next_tag(None);
        processor.remove_class("only");
        assert_eq!(processor.get_attribute(b"class"), None);
        assert_eq!(updated_html(&mut processor), "<div  id=x>");
    }

    #[test]
    fn class_matching_ignores_case_in_quirks_mode() {
        let mut processor = TagProcessor::new(b"<div class=\"One two\">");
        processor.compat_mode = CompatMode::Quirks;
        processor.next_tag(None);
        assert_eq!(processor.has_class("ONE"), Some(true));
        processor.remove_class("ONE");
        processor.add_class("TWO");
        assert_eq!(updated_html(&mut processor), "<div class=\"two\">");
    }

    #[test]
    fn setting_class_discards_class_edits() {
        let mut processor = TagProcessor::new(b"<div class=a>");
        processor.next_tag(None);
        processor.add_class("b");
        processor.set_attribute("class", "c");
        assert_eq!(updated_html(&mut processor), "<div class=\"c\">");
    }

    #[test]
    fn next_tag_filters_matches() {
        let html = b"<div class=x><p class='x y'></p><p class=y><P class=X></P></div>";
        let mut processor = TagProcessor::new(html);
        assert!(processor.next_tag(Some(&TagQuery {
            tag_name: Some(TagName::P),
            class_name: Some("y"),
            match_offset: Some(2),
            ..Default::default()
        })));
        assert_eq!(attribute(&processor, "class"), Some("y".to_string()));

        let mut processor = TagProcessor::new(html);
        let query = TagQuery {
            tag_name: Some(TagName::P),
            tag_closers: VisitClosers::Visit,
            ..Default::default()
        };
        let mut visited = Vec::new();
        while processor.next_tag(Some(&query)) {
            visited.push(processor.is_tag_closer());
        }
        assert_eq!(visited, vec![false, true, false, false, true]);
    }

    #[test]
    fn zero_match_offset_finds_the_next_tag() {
        let mut processor = TagProcessor::new(b"<a><b>");
        let query = TagQuery {
            match_offset: Some(0),
            ..Default::default()
        };
        let mut tags = Vec::new();
        while processor.next_tag(Some(&query)) {
            tags.push(processor.get_tag());
        }
        assert_eq!(tags, vec![Some(TagName::A), Some(TagName::B)]);
    }

    #[test]
    fn br_closers_are_openers() {
        let mut processor = TagProcessor::new(b"</br></div><br/>");
        processor.next_token();
        assert!(!processor.is_tag_closer());
        processor.next_token();
        assert!(processor.is_tag_closer());
        assert!(!processor.has_self_closing_flag());
        processor.next_token();
        assert!(processor.has_self_closing_flag());
    }

    #[test]
    fn set_modifiable_text_keeps_structure() {
        let mut processor = TagProcessor::new(
            b"<p>old</p><!--c--><script>s</script><style>x</style><textarea>t</textarea>",
        );
        processor.next_token();
        processor.next_token();
        assert!(processor.set_modifiable_text("a < b"));
        assert_eq!(text(&processor.get_modifiable_text()), "a < b");

        processor.next_token();
        processor.next_token();
        assert!(!processor.set_modifiable_text("x --> y"));
        assert!(!processor.set_modifiable_text("x --!> y"));
        assert!(processor.set_modifiable_text("fine - > ok"));

        processor.next_token();
        assert!(!processor.set_modifiable_text("</SCRIPT>"));
        assert!(processor.set_modifiable_text("a && b"));

        processor.next_token();
        assert!(processor.set_modifiable_text("</Style>"));

        processor.next_token();
        assert!(processor.set_modifiable_text("</textarea>"));

        assert_eq!(
            updated_html(&mut processor),
            "<p>a &lt; b</p><!--fine - > ok--><script>a && b</script><style>\\3c\\2fStyle></style><textarea>&lt;/textarea&gt;</textarea>"
        );
        assert_eq!(text(&processor.get_modifiable_text()), "</textarea>");
    }

    #[test]
    fn bookmarks_survive_edits_before_them() {
        let mut processor =
            TagProcessor::new(b"<button twenty_one_characters 7_chars></button><button></button>");
        processor.next_tag(None);
        processor.set_bookmark("first").unwrap();
        processor.next_tag(None);
        processor.set_bookmark("second").unwrap();

        assert!(processor.seek("first"));
        assert!(processor.remove_attribute("twenty_one_characters"));
        assert!(processor.remove_attribute("7_chars"));

        assert!(processor.seek("second"));
        assert_eq!(processor.get_tag(), Some(TagName::BUTTON));
        assert!(processor.next_token());
        assert!(processor.is_tag_closer());
        assert_eq!(
            updated_html(&mut processor),
            "<button  ></button><button></button>"
        );
    }

    #[test]
    fn bookmark_limits() {
        let mut processor = TagProcessor::with_config(
            b"<a><b>",
            ProcessorConfig {
                max_bookmarks: 1,
                max_seek_ops: 2,
                ..Default::default()
            },
        );
        assert_eq!(processor.set_bookmark("early"), Err(BookmarkError::NoToken));
        processor.next_tag(None);
        assert_eq!(processor.set_bookmark("a"), Ok(()));
        assert_eq!(processor.set_bookmark("a"), Ok(()));
        assert_eq!(processor.set_bookmark("b"), Err(BookmarkError::Exhausted));
        assert!(processor.has_bookmark("a"));
        assert!(!processor.seek("b"));

        assert!(processor.seek("a"));
        assert!(processor.seek("a"));
        assert!(!processor.seek("a"));

        assert!(processor.release_bookmark("a"));
        assert!(!processor.release_bookmark("a"));
        assert!(!processor.has_bookmark("a"));
    }

    #[test]
    fn subdivides_null_and_whitespace_prefixes() {
        let mut processor = TagProcessor::new(b"\0\0Apples");
        processor.next_token();
        assert!(processor.subdivide_text_appropriately());
        assert_eq!(
            processor.text_node_classification,
            TextNodeClassification::NullSequence
        );
        assert_eq!(processor.current_token_span(), Some(HtmlSpan::new(0, 2)));
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "Apples");
        assert!(!processor.subdivide_text_appropriately());

        let mut processor = TagProcessor::new(b"&#x20; \r\n\tMore");
        processor.next_token();
        assert!(processor.subdivide_text_appropriately());
        assert_eq!(
            processor.text_node_classification,
            TextNodeClassification::Whitespace
        );
        assert_eq!(text(&processor.get_modifiable_text()), "  \n\t");
        processor.next_token();
        assert_eq!(text(&processor.get_modifiable_text()), "More");
    }

    #[test]
    fn tokens_carry_their_fields() {
        let mut processor = TagProcessor::new(b"<img src=a.png alt>");
        processor.next_token();
        assert_eq!(
            processor.get_token(),
            Some(Token::Tag {
                name: TagName::IMG,
                is_closer: false,
                has_self_closing_flag: false,
                span: HtmlSpan::new(0, 19),
                attributes: vec![
                    Attribute {
                        name: b"src".as_slice().into(),
                        span: HtmlSpan::new(5, 9),
                        value_span: Some(HtmlSpan::new(9, 5)),
                    },
                    Attribute {
                        name: b"alt".as_slice().into(),
                        span: HtmlSpan::new(15, 3),
                        value_span: None,
                    },
                ],
            })
        );
    }

    #[test]
    fn qualified_names_follow_the_namespace() {
        let mut processor = TagProcessor::new(b"<foreignObject viewbox=x>");
        processor.change_parsing_namespace(ParsingNamespace::Svg);
        processor.next_tag(None);
        assert_eq!(processor.get_namespace(), ParsingNamespace::Svg);
        assert_eq!(
            processor.get_qualified_tag_name().as_deref(),
            Some(b"foreignObject".as_slice())
        );
        assert_eq!(
            processor.get_qualified_attribute_name(b"viewbox").as_deref(),
            Some(b"viewBox".as_slice())
        );
    }

    #[quickcheck]
    fn unedited_html_round_trips(html: String) -> bool {
        let mut processor = TagProcessor::new(html.as_bytes());
        let mut covered = 0;
        while processor.next_token() {
            match processor.current_token_span() {
                Some(span) if span.start == covered => covered = span.end(),
                _ => return false,
            }
        }
        let covered_all = processor.paused_at_incomplete_token() || covered == html.len();
        covered_all && *processor.get_updated_html() == *html.as_bytes()
    }

    #[quickcheck]
    fn modifiable_text_reads_are_idempotent(html: String) -> bool {
        let mut processor = TagProcessor::new(html.as_bytes());
        while processor.next_token() {
            if processor.get_modifiable_text() != processor.get_modifiable_text() {
                return false;
            }
        }
        true
    }
}
