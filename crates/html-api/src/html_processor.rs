//! HTML Processor: a Tag Processor that understands the structure of HTML.
//!
//! Tokens are run through the tree construction rules of the HTML standard
//! without building a tree. Instead, every push onto and pop off of the stack
//! of open elements is reported through `next_token()`, including elements
//! the rules imply but which never appear in the input. Those are "virtual".
//!
//! When the input requires a rule that is not implemented, the processor
//! stops with an error rather than guessing at the structure.
//!
//! @see https://html.spec.whatwg.org/#tree-construction

mod active_formatting_elements;
mod html_stack_event;
mod html_token;
mod insertion_mode;
mod insertion_modes;
mod processor_state;
mod stack_of_open_elements;

use std::{collections::VecDeque, rc::Rc};

use active_formatting_elements::ActiveFormattingElement;
use html_stack_event::{HTMLStackEvent, StackOperation, StackProvenance};
use insertion_mode::InsertionMode;
use processor_state::ProcessorState;

pub use html_token::{HTMLToken, IntegrationNodeType};

use crate::{
    attributes::qualified_attribute_name,
    compat_mode::CompatMode,
    config::ProcessorConfig,
    doctype::HtmlDoctypeInfo,
    errors::{BookmarkError, HtmlProcessorError, SerializeError, UnsupportedException},
    span::HtmlSpan,
    str_fns::html_special_chars,
    tag_name::TagName,
    tag_processor::{ParserState, ParsingNamespace, TagProcessor, TagQuery, VisitClosers},
    text_replacement::HtmlTextReplacement,
    token::{AttributeValue, CommentType, NodeName, TextNodeClassification, TokenType},
};

const LOG_TARGET: &str = "html_api::html_processor";

/// Whether a step processed a token, or why it could not.
type StepResult = Result<bool, HtmlProcessorError>;

/// @see https://html.spec.whatwg.org/#concept-encoding-confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EncodingConfidence {
    Tentative,
    Certain,
    Irrelevant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeToProcess {
    ProcessNextNode,
    ReprocessCurrentNode,
}

/// The current token as the tree construction rules see it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    TagPush(TagName),
    TagPop(TagName),
    Token(TokenType),
}

/// Everything needed to rewind to the state right after construction.
#[derive(Debug, Clone, Default)]
struct ResetPoint {
    state: ProcessorState,
    breadcrumbs: Vec<NodeName>,
    bookmark_counter: u32,
    namespace: ParsingNamespace,
    compat_mode: CompatMode,
}

/// Where the markup of the current element lies in the updated document.
struct RawMarkup {
    html: Box<[u8]>,
    outer: HtmlSpan,
    inner: HtmlSpan,
    /// The processor once it has visited the element's closer.
    past_element: HtmlProcessor,
}

#[derive(Clone)]
pub struct HtmlProcessor {
    tag_processor: TagProcessor,
    state: ProcessorState,
    last_error: Option<HtmlProcessorError>,

    /// Stack events waiting to be visited by `next_token()`.
    element_queue: VecDeque<HTMLStackEvent>,
    current_element: Option<HTMLStackEvent>,
    breadcrumbs: Vec<NodeName>,

    /// Last internal bookmark index handed out to a node.
    bookmark_counter: u32,

    /// Element in whose context a fragment is parsed.
    ///
    /// @see https://html.spec.whatwg.org/#concept-frag-parse-context
    context_node: Option<HTMLToken>,

    reset_point: Rc<ResetPoint>,
}

impl HtmlProcessor {
    fn new(html: &[u8], config: ProcessorConfig) -> Self {
        Self {
            tag_processor: TagProcessor::with_config(html, config),
            state: ProcessorState::default(),
            last_error: None,
            element_queue: VecDeque::new(),
            current_element: None,
            breadcrumbs: Vec::new(),
            bookmark_counter: 0,
            context_node: None,
            reset_point: Rc::default(),
        }
    }

    /// Creates a processor for an HTML fragment parsed inside `<body>`, or
    /// inside the given context element.
    ///
    /// The context is itself parsed as HTML and its last opened element
    /// becomes the context node, so `"<body>"`, `"<div class=x>"` and
    /// `"<svg>"` are all valid contexts. Void elements and elements with
    /// special content, like SCRIPT or TEXTAREA, cannot be contexts.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = HtmlProcessor::create_fragment(b"<li>One<li>Two", "<ul>")?;
    /// processor.next_tag(None);
    /// processor.get_breadcrumbs() == [HTML, UL, LI]
    /// ```
    pub fn create_fragment(html: &[u8], context: &str) -> Option<Self> {
        Self::create_fragment_with_config(html, context, "UTF-8", ProcessorConfig::default())
    }

    pub fn create_fragment_with_config(
        html: &[u8],
        context: &str,
        encoding: &str,
        config: ProcessorConfig,
    ) -> Option<Self> {
        if encoding != "UTF-8" {
            log::warn!(target: LOG_TARGET, "Unsupported fragment encoding {encoding:?}");
            return None;
        }

        let context_html = format!("<!DOCTYPE html>{context}");
        let mut context_processor =
            Self::create_full_parser_with_config(context_html.as_bytes(), "UTF-8", config.clone())?;

        while context_processor.next_tag(None) {
            if !context_processor.is_virtual() {
                context_processor.set_bookmark("final_node").ok()?;
            }
        }

        if !context_processor.has_bookmark("final_node") || !context_processor.seek("final_node") {
            log::warn!(target: LOG_TARGET, "No valid context element found in {context:?}");
            return None;
        }

        context_processor.create_fragment_at_current_node(html, config)
    }

    /// Creates a processor for a full HTML document.
    ///
    /// Only UTF-8 is supported.
    pub fn create_full_parser(html: &[u8]) -> Option<Self> {
        Self::create_full_parser_with_config(html, "UTF-8", ProcessorConfig::default())
    }

    pub fn create_full_parser_with_config(
        html: &[u8],
        known_definite_encoding: &str,
        config: ProcessorConfig,
    ) -> Option<Self> {
        if known_definite_encoding != "UTF-8" {
            log::warn!(
                target: LOG_TARGET,
                "Unsupported document encoding {known_definite_encoding:?}"
            );
            return None;
        }

        let mut processor = Self::new(html, config);
        processor.state.encoding = known_definite_encoding.into();
        processor.state.encoding_confidence = EncodingConfidence::Certain;
        processor.capture_reset_point();
        Some(processor)
    }

    /// Creates a fragment parser for `html` using the currently matched
    /// element as its context.
    ///
    /// @see https://html.spec.whatwg.org/#html-fragment-parsing-algorithm
    pub fn create_fragment_at_current_node(
        &self,
        html: &[u8],
        config: ProcessorConfig,
    ) -> Option<Self> {
        if self.get_token_type() != Some(TokenType::Tag) || self.is_tag_closer() {
            log::warn!(target: LOG_TARGET, "Fragment contexts must be opening tags");
            return None;
        }

        let context = self.current_element.as_ref()?.token.clone();
        let tag_name = context.node_name.tag()?.clone();
        if context.namespace == ParsingNamespace::Html
            && (Self::is_void(&tag_name)
                || matches!(
                    tag_name,
                    TagName::IFRAME
                        | TagName::NOEMBED
                        | TagName::NOFRAMES
                        | TagName::SCRIPT
                        | TagName::STYLE
                        | TagName::TEXTAREA
                        | TagName::TITLE
                        | TagName::XMP
                        | TagName::PLAINTEXT
                ))
        {
            log::warn!(target: LOG_TARGET, "{tag_name} cannot be a fragment context");
            return None;
        }

        let mut fragment = Self::new(html, config);
        fragment.tag_processor.compat_mode = self.tag_processor.compat_mode;

        // The root HTML element and the context share the empty span at 0.
        fragment
            .tag_processor
            .insert_internal_bookmark(0, HtmlSpan::new(0, 0));
        let root_node = HTMLToken {
            is_root_node: true,
            ..HTMLToken::new(0, TagName::HTML.into(), false)
        };
        fragment.push(root_node);

        fragment
            .tag_processor
            .insert_internal_bookmark(1, HtmlSpan::new(0, 0));
        fragment.bookmark_counter = 1;
        fragment.context_node = Some(HTMLToken {
            node_id: 1,
            ..context.clone()
        });

        if tag_name == TagName::TEMPLATE {
            fragment
                .state
                .stack_of_template_insertion_modes
                .push(InsertionMode::IN_TEMPLATE);
        }

        fragment.breadcrumbs = vec![TagName::HTML.into(), tag_name.into()];
        fragment.reset_insertion_mode_appropriately();

        // > Set the parser's form element pointer to the nearest node to the
        // > context element that is a form element.
        if let Some(form) = self
            .state
            .stack_of_open_elements
            .walk_up()
            .find(|node| node.is_html_element(&[TagName::FORM]))
        {
            fragment.bookmark_counter += 1;
            fragment.state.form_element = Some(HTMLToken {
                node_id: fragment.bookmark_counter,
                ..form.clone()
            });
        }

        fragment.state.encoding_confidence = EncodingConfidence::Irrelevant;
        fragment
            .tag_processor
            .change_parsing_namespace(match context.integration_node_type {
                Some(_) => ParsingNamespace::Html,
                None => context.namespace,
            });

        fragment.element_queue.clear();
        fragment.capture_reset_point();
        Some(fragment)
    }

    /// Parses `html` as the contents of BODY and serializes it back out.
    ///
    /// The output is well-formed: implied elements are made explicit, every
    /// element is closed, attribute values are double-quoted and text is
    /// escaped.
    ///
    /// Example:
    ///
    /// ```text
    /// HtmlProcessor::normalize(b"<p>One<p>Two") == Ok("<p>One</p><p>Two</p>")
    /// ```
    pub fn normalize(html: &[u8]) -> Result<String, SerializeError> {
        Self::create_fragment(html, "<body>")
            .ok_or(SerializeError::InvalidContext)?
            .serialize()
    }

    /// Serializes the whole document from the beginning.
    ///
    /// Only a processor that has not yet advanced can serialize.
    pub fn serialize(&mut self) -> Result<String, SerializeError> {
        if self.tag_processor.parser_state != ParserState::Ready {
            log::warn!(
                target: LOG_TARGET,
                "Cannot serialize a processor that has already started"
            );
            return Err(SerializeError::AlreadyStarted);
        }

        let mut html = String::new();
        while self.next_token() {
            self.serialize_token(&mut html);
        }

        match self.last_error {
            Some(error) => Err(error.into()),
            None => Ok(html),
        }
    }

    /// Appends the normalized form of the current token to `html`.
    fn serialize_token(&self, html: &mut String) {
        match self.get_token_type() {
            None | Some(TokenType::PresumptuousTag) => {}
            Some(TokenType::Doctype) => {
                if let Some(doctype) = self.get_doctype_info() {
                    serialize_doctype(&doctype, html);
                }
            }
            Some(TokenType::Text) => push_escaped(html, &self.get_modifiable_text()),
            Some(TokenType::Comment | TokenType::FunkyComment) => {
                html.push_str("<!--");
                push_lossy(html, &self.get_full_comment_text().unwrap_or_default());
                html.push_str("-->");
            }
            Some(TokenType::CdataSection) => {
                html.push_str("<![CDATA[");
                push_lossy(html, &self.get_modifiable_text());
                html.push_str("]]>");
            }
            Some(TokenType::Tag) => self.serialize_tag(html),
        }
    }

    fn serialize_tag(&self, html: &mut String) {
        let Some(tag_name) = self.get_tag() else {
            return;
        };
        let namespace = self.get_namespace();
        let in_html = namespace == ParsingNamespace::Html;
        let qualified_name = if in_html {
            tag_name.as_bytes().to_ascii_lowercase().into()
        } else {
            tag_name.qualified_name(&namespace)
        };

        if self.is_tag_closer() {
            html.push_str("</");
            push_lossy(html, &qualified_name);
            html.push('>');
            return;
        }

        html.push('<');
        push_lossy(html, &qualified_name);
        for name in self.get_attribute_names_with_prefix(b"").unwrap_or_default() {
            html.push(' ');
            push_lossy(html, &qualified_attribute_name(&name, &namespace));
            if let Some(AttributeValue::String(value)) = self.get_attribute(&name) {
                html.push_str("=\"");
                push_escaped(html, &value);
                html.push('"');
            }
        }
        if !in_html && self.has_self_closing_flag() {
            html.push_str(" /");
        }
        html.push('>');

        if in_html
            && matches!(
                tag_name,
                TagName::IFRAME
                    | TagName::NOEMBED
                    | TagName::NOFRAMES
                    | TagName::SCRIPT
                    | TagName::STYLE
                    | TagName::TEXTAREA
                    | TagName::TITLE
                    | TagName::XMP
            )
        {
            match tag_name {
                TagName::IFRAME | TagName::NOEMBED | TagName::NOFRAMES => {}
                TagName::SCRIPT | TagName::STYLE => push_lossy(html, &self.get_modifiable_text()),
                _ => push_escaped(html, &self.get_modifiable_text()),
            }
            html.push_str("</");
            push_lossy(html, &qualified_name);
            html.push('>');
        }
    }

    /// Finds the next tag matching the query.
    ///
    /// Without a query, this finds the next tag opener. Tag closers are only
    /// visited when the query asks for them and holds no breadcrumbs.
    ///
    /// Example:
    ///
    /// ```text
    /// let mut processor = HtmlProcessor::create_fragment(b"<div><figure><img></figure></div>", "<body>")?;
    /// processor.next_tag(Some(&TagQuery {
    ///     breadcrumbs: Some(vec!["FIGURE", "IMG"]),
    ///     ..Default::default()
    /// })) == true
    /// ```
    pub fn next_tag(&mut self, query: Option<&TagQuery>) -> bool {
        let default_query = TagQuery::default();
        let query = query.unwrap_or(&default_query);
        let visit_closers =
            query.tag_closers == VisitClosers::Visit && query.breadcrumbs.is_none();
        let match_offset = query.match_offset.filter(|&n| n > 0).unwrap_or(1);

        let mut already_found = 0;
        while already_found < match_offset {
            if !self.next_token() {
                return false;
            }

            if self.get_token_type() != Some(TokenType::Tag) {
                continue;
            }

            if self.is_tag_closer() && !visit_closers {
                continue;
            }

            if let Some(tag_name) = &query.tag_name {
                if self.get_tag().as_ref() != Some(tag_name) {
                    continue;
                }
            }

            if let Some(class_name) = query.class_name {
                if self.has_class(class_name) != Some(true) {
                    continue;
                }
            }

            if let Some(breadcrumbs) = &query.breadcrumbs {
                if !self.matches_breadcrumbs(breadcrumbs) {
                    continue;
                }
            }

            already_found += 1;
        }

        true
    }

    /// Moves to the next token, real or virtual.
    ///
    /// Returns `false` at the end of the document, or once an unsupported
    /// construct has stopped the processor.
    pub fn next_token(&mut self) -> bool {
        self.next_visitable_token()
    }

    fn next_visitable_token(&mut self) -> bool {
        loop {
            self.current_element = None;

            if self.last_error.is_some() {
                return false;
            }

            if self.element_queue.is_empty() && self.step_or_halt(NodeToProcess::ProcessNextNode) {
                continue;
            }

            if self.last_error.is_some() {
                return false;
            }

            let Some(event) = self.element_queue.pop_front() else {
                // The document has ended; close everything still open.
                while self.pop().is_some() {}
                if self.element_queue.is_empty() {
                    return false;
                }
                continue;
            };

            // The fragment root is never visited.
            if event.token.is_root_node {
                continue;
            }

            let is_pop = event.operation == StackOperation::Pop;
            if is_pop {
                self.breadcrumbs.pop();
            } else {
                self.breadcrumbs.push(event.token.node_name.clone());
            }

            // Nodes without closers are only visited when opened.
            if is_pop && !Self::node_expects_closer(&event.token) {
                continue;
            }

            self.current_element = Some(event);
            return true;
        }
    }

    fn step_or_halt(&mut self, node_to_process: NodeToProcess) -> bool {
        match self.step(node_to_process) {
            Ok(processed) => processed,
            Err(error) => {
                log::debug!(target: LOG_TARGET, "Stopped processing: {error}");
                self.last_error = Some(error);
                false
            }
        }
    }

    /// Runs the tree construction rules for one token.
    fn step(&mut self, node_to_process: NodeToProcess) -> StepResult {
        if let Some(error) = self.last_error {
            return Err(error);
        }

        if node_to_process == NodeToProcess::ProcessNextNode {
            // Elements without closers are popped once the next token arrives.
            if self
                .state
                .stack_of_open_elements
                .current_node()
                .is_some_and(|node| !Self::node_expects_closer(node))
            {
                self.pop();
            }

            if !self.tag_processor.next_token() {
                return Ok(false);
            }

            let token_name = self
                .get_token_name()
                .ok_or(HtmlProcessorError::CannotBookmarkToken)?;
            let node_id = self.bookmark_token()?;
            self.state.current_token = Some(HTMLToken::new(
                node_id,
                token_name,
                self.tag_processor.has_self_closing_flag(),
            ));
        }

        let Some(op) = self.make_op() else {
            return Ok(false);
        };

        if self.is_parsed_in_current_insertion_mode(&op) {
            self.step_in_current_insertion_mode(&op)
        } else {
            self.step_in_foreign_content(&op)
        }
    }

    fn make_op(&self) -> Option<Op> {
        let token = self.state.current_token.as_ref()?;
        Some(match &token.node_name {
            NodeName::Tag(tag_name) if self.tag_processor.is_tag_closer() => {
                Op::TagPop(tag_name.clone())
            }
            NodeName::Tag(tag_name) => Op::TagPush(tag_name.clone()),
            NodeName::Token(token_type) => Op::Token(*token_type),
        })
    }

    /// @see https://html.spec.whatwg.org/#tree-construction-dispatcher
    fn is_parsed_in_current_insertion_mode(&self, op: &Op) -> bool {
        let Some(node) = self.get_adjusted_current_node() else {
            return true;
        };

        let is_start_tag = matches!(op, Op::TagPush(_));
        let is_text = op == &Op::Token(TokenType::Text);

        node.namespace == ParsingNamespace::Html
            || (node.integration_node_type == Some(IntegrationNodeType::MathML)
                && ((is_start_tag
                    && !matches!(op, Op::TagPush(TagName::MALIGNMARK | TagName::MGLYPH)))
                    || is_text))
            || (node.namespace == ParsingNamespace::MathML
                && node.node_name.tag() == Some(&TagName::ANNOTATION_XML)
                && op == &Op::TagPush(TagName::SVG))
            || (node.integration_node_type == Some(IntegrationNodeType::HTML)
                && (is_start_tag || is_text))
    }

    fn step_in_current_insertion_mode(&mut self, op: &Op) -> StepResult {
        log::trace!(target: LOG_TARGET, "{op:?} in {:?}", self.state.insertion_mode);

        match self.state.insertion_mode {
            InsertionMode::INITIAL => self.step_initial(op),
            InsertionMode::BEFORE_HTML => self.step_before_html(op),
            InsertionMode::BEFORE_HEAD => self.step_before_head(op),
            InsertionMode::IN_HEAD => self.step_in_head(op),
            InsertionMode::IN_HEAD_NOSCRIPT => self.step_in_head_noscript(op),
            InsertionMode::AFTER_HEAD => self.step_after_head(op),
            InsertionMode::IN_BODY => self.step_in_body(op),
            InsertionMode::IN_TABLE => self.step_in_table(op),
            InsertionMode::IN_TABLE_TEXT => self.step_in_table_text(op),
            InsertionMode::IN_CAPTION => self.step_in_caption(op),
            InsertionMode::IN_COLUMN_GROUP => self.step_in_column_group(op),
            InsertionMode::IN_TABLE_BODY => self.step_in_table_body(op),
            InsertionMode::IN_ROW => self.step_in_row(op),
            InsertionMode::IN_CELL => self.step_in_cell(op),
            InsertionMode::IN_SELECT => self.step_in_select(op),
            InsertionMode::IN_SELECT_IN_TABLE => self.step_in_select_in_table(op),
            InsertionMode::IN_TEMPLATE => self.step_in_template(op),
            InsertionMode::AFTER_BODY => self.step_after_body(op),
            InsertionMode::IN_FRAMESET => self.step_in_frameset(op),
            InsertionMode::AFTER_FRAMESET => self.step_after_frameset(op),
            InsertionMode::AFTER_AFTER_BODY => self.step_after_after_body(op),
            InsertionMode::AFTER_AFTER_FRAMESET => self.step_after_after_frameset(op),
        }
    }

    /// Reserves the next node id and bookmarks the current token under it.
    fn bookmark_token(&mut self) -> Result<u32, HtmlProcessorError> {
        let node_id = self
            .bookmark_counter
            .checked_add(1)
            .ok_or(HtmlProcessorError::ExceededMaxBookmarks)?;
        self.tag_processor
            .set_internal_bookmark(node_id)
            .map_err(|_| HtmlProcessorError::CannotBookmarkToken)?;
        self.bookmark_counter = node_id;
        Ok(node_id)
    }

    /*
     * Token information.
     */

    /// Whether the current token was implied by the tree rules rather than
    /// found in the input.
    pub fn is_virtual(&self) -> bool {
        self.current_element
            .as_ref()
            .is_some_and(|event| event.provenance == StackProvenance::Virtual)
    }

    /// Returns the uppercase name of the current tag.
    ///
    /// An IMAGE tag in HTML content is reported as IMG, as the tree rules
    /// rename it.
    pub fn get_tag(&self) -> Option<TagName> {
        if self.last_error.is_some() {
            return None;
        }

        if self.is_virtual() {
            return self.current_element.as_ref()?.token.node_name.tag().cloned();
        }

        match self.tag_processor.get_tag()? {
            TagName::IMAGE if self.get_namespace() == ParsingNamespace::Html => Some(TagName::IMG),
            tag_name => Some(tag_name),
        }
    }

    pub fn get_token_type(&self) -> Option<TokenType> {
        if self.is_virtual() {
            return Some(TokenType::Tag);
        }
        self.tag_processor.get_token_type()
    }

    pub fn get_token_name(&self) -> Option<NodeName> {
        match self.get_token_type()? {
            TokenType::Tag => self.get_tag().map(NodeName::Tag),
            token_type => Some(NodeName::Token(token_type)),
        }
    }

    /// Namespace of the current element, or the namespace in which the next
    /// token will be parsed.
    pub fn get_namespace(&self) -> ParsingNamespace {
        match &self.current_element {
            Some(event) => event.token.namespace,
            None => self.tag_processor.get_namespace(),
        }
    }

    pub fn is_tag_closer(&self) -> bool {
        match &self.current_element {
            Some(event) if event.provenance == StackProvenance::Virtual => {
                event.operation == StackOperation::Pop && event.token.node_name.tag().is_some()
            }
            _ => self.tag_processor.is_tag_closer(),
        }
    }

    pub fn has_self_closing_flag(&self) -> bool {
        !self.is_virtual() && self.tag_processor.has_self_closing_flag()
    }

    /// Whether the current element will be closed by a later token.
    ///
    /// Void elements, elements whose content is a single raw text token,
    /// self-closing foreign elements and non-element nodes have no closer.
    pub fn expects_closer(&self) -> Option<bool> {
        let event = self.current_element.as_ref()?;
        Some(Self::node_expects_closer(&event.token))
    }

    fn node_expects_closer(node: &HTMLToken) -> bool {
        let NodeName::Tag(tag_name) = &node.node_name else {
            return false;
        };

        match node.namespace {
            ParsingNamespace::Html => {
                !Self::is_void(tag_name)
                    && !matches!(
                        tag_name,
                        TagName::IFRAME
                            | TagName::NOEMBED
                            | TagName::NOFRAMES
                            | TagName::SCRIPT
                            | TagName::STYLE
                            | TagName::TEXTAREA
                            | TagName::TITLE
                            | TagName::XMP
                    )
            }
            _ => !node.has_self_closing_flag,
        }
    }

    pub fn get_qualified_tag_name(&self) -> Option<Box<[u8]>> {
        Some(self.get_tag()?.qualified_name(&self.get_namespace()))
    }

    pub fn get_qualified_attribute_name(&self, attribute_name: &[u8]) -> Option<Box<[u8]>> {
        if self.is_virtual() || self.get_token_type() != Some(TokenType::Tag) {
            return None;
        }
        Some(qualified_attribute_name(attribute_name, &self.get_namespace()))
    }

    pub fn get_comment_type(&self) -> Option<CommentType> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.get_comment_type()
    }

    pub fn get_full_comment_text(&self) -> Option<Box<[u8]>> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.get_full_comment_text()
    }

    pub fn get_doctype_info(&self) -> Option<HtmlDoctypeInfo> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.get_doctype_info()
    }

    pub fn paused_at_incomplete_token(&self) -> bool {
        self.tag_processor.paused_at_incomplete_token()
    }

    /// Names of the open elements from the root down to the current node.
    pub fn get_breadcrumbs(&self) -> &[NodeName] {
        &self.breadcrumbs
    }

    pub fn get_current_depth(&self) -> usize {
        self.breadcrumbs.len()
    }

    /// Whether the path to the current tag ends with `breadcrumbs`.
    ///
    /// Names compare ASCII case-insensitively and `*` matches any one
    /// element.
    ///
    /// ```text
    /// <div><span><figure><img></figure></span></div>
    ///
    /// ["SPAN", "*", "IMG"]  matches the IMG
    /// ["SPAN", "IMG"]       does not
    /// ```
    pub fn matches_breadcrumbs(&self, breadcrumbs: &[&str]) -> bool {
        let Some(last) = breadcrumbs.last() else {
            return true;
        };

        if *last != "*"
            && !self
                .get_tag()
                .is_some_and(|tag_name| tag_name.as_bytes().eq_ignore_ascii_case(last.as_bytes()))
        {
            return false;
        }

        let mut crumbs = breadcrumbs.iter().rev();
        for node_name in self.breadcrumbs.iter().rev() {
            let Some(crumb) = crumbs.next() else {
                return true;
            };

            if *crumb == "*" {
                continue;
            }

            let matches = match node_name {
                NodeName::Tag(tag_name) => tag_name.as_bytes().eq_ignore_ascii_case(crumb.as_bytes()),
                NodeName::Token(token_type) => {
                    <&str>::from(token_type).eq_ignore_ascii_case(crumb)
                }
            };
            if !matches {
                return false;
            }
        }

        crumbs.next().is_none()
    }

    /// The unsupported construct that stopped the processor, if any.
    pub fn get_unsupported_exception(&self) -> Option<UnsupportedException> {
        match self.last_error {
            Some(HtmlProcessorError::Unsupported(exception)) => Some(exception),
            _ => None,
        }
    }

    pub fn get_last_error(&self) -> Option<HtmlProcessorError> {
        self.last_error
    }

    /*
     * Reading and modifying the current token.
     *
     * Virtual tokens have no attributes or text and cannot be modified.
     */

    pub fn get_attribute(&self, name: &[u8]) -> Option<AttributeValue> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.get_attribute(name)
    }

    pub fn get_attribute_names_with_prefix(&self, prefix: &[u8]) -> Option<Vec<Box<[u8]>>> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.get_attribute_names_with_prefix(prefix)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        !self.is_virtual() && self.tag_processor.set_attribute(name, value)
    }

    pub fn set_boolean_attribute(&mut self, name: &str, value: bool) -> bool {
        !self.is_virtual() && self.tag_processor.set_boolean_attribute(name, value)
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        !self.is_virtual() && self.tag_processor.remove_attribute(name)
    }

    pub fn add_class(&mut self, class_name: &str) -> bool {
        !self.is_virtual() && self.tag_processor.add_class(class_name)
    }

    pub fn remove_class(&mut self, class_name: &str) -> bool {
        !self.is_virtual() && self.tag_processor.remove_class(class_name)
    }

    pub fn has_class(&self, class_name: &str) -> Option<bool> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.has_class(class_name)
    }

    pub fn class_list(&self) -> Option<Vec<Box<[u8]>>> {
        if self.is_virtual() {
            return None;
        }
        self.tag_processor.class_list()
    }

    pub fn get_modifiable_text(&self) -> Box<[u8]> {
        if self.is_virtual() {
            return Box::default();
        }
        self.tag_processor.get_modifiable_text()
    }

    pub fn set_modifiable_text(&mut self, text: &str) -> bool {
        !self.is_virtual() && self.tag_processor.set_modifiable_text(text)
    }

    /// Applies pending edits and returns the updated document.
    pub fn get_updated_html(&mut self) -> Box<[u8]> {
        let html = self.tag_processor.get_updated_html();
        if self.tag_processor.parser_state == ParserState::TextNode {
            self.tag_processor.subdivide_text_appropriately();
        }
        html
    }

    /*
     * Raw markup.
     */

    /// Returns the markup between the current element's opener and closer.
    ///
    /// An element closed implicitly ends where the token that closed it
    /// starts, or at the end of the document.
    ///
    /// Example:
    ///
    /// ```text
    /// <div><p>One</p>Two</div>
    ///  ^ on DIV: inner is "<p>One</p>Two"
    /// ```
    pub fn get_raw_inner_markup(&self) -> Option<Box<[u8]>> {
        let markup = self.locate_raw_markup()?;
        Some(markup.html.get(markup.inner.start..markup.inner.end())?.into())
    }

    /// Returns the markup of the current element, its opener and closer included.
    pub fn get_raw_outer_markup(&self) -> Option<Box<[u8]>> {
        let markup = self.locate_raw_markup()?;
        Some(markup.html.get(markup.outer.start..markup.outer.end())?.into())
    }

    /// Replaces the markup between the current element's opener and closer.
    ///
    /// The processor moves on to the element's closer. The new markup is
    /// not visited until the document is processed again.
    pub fn set_raw_inner_markup(&mut self, html: &str) -> bool {
        self.replace_raw_markup(html, |markup| markup.inner)
    }

    /// Replaces the current element, its opener and closer included.
    ///
    /// The processor moves on to where the element was closed, so nothing
    /// inside the removed element is visited or modified afterward.
    pub fn set_raw_outer_markup(&mut self, html: &str) -> bool {
        self.replace_raw_markup(html, |markup| markup.outer)
    }

    fn replace_raw_markup(
        &mut self,
        html: &str,
        select: impl Fn(&RawMarkup) -> HtmlSpan,
    ) -> bool {
        self.get_updated_html();
        let Some(markup) = self.locate_raw_markup() else {
            return false;
        };
        let span = select(&markup);

        *self = markup.past_element;
        self.tag_processor.apply_raw_replacement(HtmlTextReplacement::new(
            span.start,
            span.length,
            html.as_bytes(),
        ));
        if self.tag_processor.parser_state == ParserState::TextNode
            && self.tag_processor.current_token_span().is_some()
        {
            self.tag_processor.subdivide_text_appropriately();
        }
        true
    }

    /// Scans a copy of the processor ahead to the current element's closer.
    fn locate_raw_markup(&self) -> Option<RawMarkup> {
        let event = self.current_element.as_ref()?;
        if event.provenance != StackProvenance::Real
            || event.operation != StackOperation::Push
            || event.token.node_name.tag().is_none()
        {
            return None;
        }
        let node = event.token.clone();

        let mut scanner = self.clone();
        let html = scanner.get_updated_html();
        let opener = scanner.tag_processor.current_token_span()?;

        if !Self::node_expects_closer(&node) {
            let has_text = node.namespace == ParsingNamespace::Html
                && node.node_name.tag().is_some_and(|tag_name| {
                    matches!(
                        tag_name,
                        TagName::IFRAME
                            | TagName::NOEMBED
                            | TagName::NOFRAMES
                            | TagName::SCRIPT
                            | TagName::STYLE
                            | TagName::TEXTAREA
                            | TagName::TITLE
                            | TagName::XMP
                    )
                });
            let inner = match scanner.tag_processor.modifiable_text_span() {
                Some(span) if has_text => span,
                _ => HtmlSpan::new(opener.end(), 0),
            };
            return Some(RawMarkup {
                html,
                outer: opener,
                inner,
                past_element: scanner,
            });
        }

        while scanner.next_token() {
            let Some(event) = &scanner.current_element else {
                continue;
            };
            if event.operation != StackOperation::Pop || !event.token.is_same_node(&node) {
                continue;
            }

            let (inner_end, outer_end) = match event.provenance {
                StackProvenance::Real => {
                    let closer = scanner.tag_processor.current_token_span()?;
                    (closer.start, closer.end())
                }
                StackProvenance::Virtual => {
                    let at = scanner
                        .tag_processor
                        .current_token_span()
                        .map_or(html.len(), |span| span.start);
                    (at, at)
                }
            };

            return Some(RawMarkup {
                outer: HtmlSpan::new(opener.start, outer_end.checked_sub(opener.start)?),
                inner: HtmlSpan::new(opener.end(), inner_end.checked_sub(opener.end())?),
                html,
                past_element: scanner,
            });
        }

        None
    }

    /*
     * Bookmarks.
     */

    /// Sets a bookmark on the current token so that `seek()` can return to it.
    ///
    /// Virtual tokens cannot be bookmarked.
    pub fn set_bookmark(&mut self, name: &str) -> Result<(), BookmarkError> {
        if self.is_virtual() {
            return Err(BookmarkError::VirtualToken);
        }
        self.tag_processor.set_bookmark(&format!("_{name}"))
    }

    pub fn release_bookmark(&mut self, name: &str) -> bool {
        self.tag_processor.release_bookmark(&format!("_{name}"))
    }

    pub fn has_bookmark(&self, name: &str) -> bool {
        self.tag_processor.has_bookmark(&format!("_{name}"))
    }

    /// Moves the processor to a bookmarked token, with the breadcrumbs and
    /// tree state it had when first visited.
    ///
    /// Moving backward replays the document from the start.
    pub fn seek(&mut self, name: &str) -> bool {
        if self.last_error.is_some() {
            log::warn!(target: LOG_TARGET, "Cannot seek after processing has stopped");
            return false;
        }

        let internal_name = format!("_{name}");
        if !self.tag_processor.has_bookmark(&internal_name) {
            log::warn!(target: LOG_TARGET, "Unknown bookmark name {name:?}");
            return false;
        }

        self.get_updated_html();
        let Some(target) = self.tag_processor.bookmark_span(&internal_name) else {
            return false;
        };

        let current_start = match self.tag_processor.current_token_span() {
            Some(span) => span.start,
            None if self.tag_processor.parser_state == ParserState::Ready => 0,
            None => usize::MAX,
        };

        if target.start <= current_start {
            if !self.tag_processor.rewind_to_start() {
                return false;
            }
            self.restore_reset_point();
        } else if !self.tag_processor.count_seek() {
            return false;
        }

        while self.next_token() {
            if self.is_virtual() {
                continue;
            }
            if self
                .tag_processor
                .current_token_span()
                .is_some_and(|span| span.start == target.start)
            {
                return true;
            }
        }

        false
    }

    fn capture_reset_point(&mut self) {
        self.reset_point = Rc::new(ResetPoint {
            state: self.state.clone(),
            breadcrumbs: self.breadcrumbs.clone(),
            bookmark_counter: self.bookmark_counter,
            namespace: self.tag_processor.get_namespace(),
            compat_mode: self.tag_processor.compat_mode,
        });
    }

    fn restore_reset_point(&mut self) {
        let reset_point = Rc::clone(&self.reset_point);
        self.state = reset_point.state.clone();
        self.breadcrumbs = reset_point.breadcrumbs.clone();
        self.bookmark_counter = reset_point.bookmark_counter;
        self.element_queue.clear();
        self.current_element = None;

        let initial_counter = reset_point.bookmark_counter;
        self.tag_processor
            .retain_internal_bookmarks(|node_id| node_id <= initial_counter);
        self.tag_processor
            .change_parsing_namespace(reset_point.namespace);
        self.tag_processor.compat_mode = reset_point.compat_mode;
    }

    /*
     * Stack of open elements.
     */

    fn push(&mut self, token: HTMLToken) {
        let provenance = match &self.state.current_token {
            Some(current) if current.is_same_node(&token) && !self.tag_processor.is_tag_closer() => {
                StackProvenance::Real
            }
            _ => StackProvenance::Virtual,
        };

        self.tag_processor
            .change_parsing_namespace(match token.integration_node_type {
                Some(_) => ParsingNamespace::Html,
                None => token.namespace,
            });

        self.state.stack_of_open_elements.push(token.clone());
        self.element_queue.push_back(HTMLStackEvent {
            operation: StackOperation::Push,
            token,
            provenance,
        });
    }

    fn pop(&mut self) -> Option<HTMLToken> {
        let token = self.state.stack_of_open_elements.pop()?;
        self.after_pop(token.clone());
        Some(token)
    }

    fn after_pop(&mut self, token: HTMLToken) {
        let provenance = match &self.state.current_token {
            Some(current)
                if current.node_name == token.node_name && self.tag_processor.is_tag_closer() =>
            {
                StackProvenance::Real
            }
            _ => StackProvenance::Virtual,
        };

        self.tag_processor.release_internal_bookmark(token.node_id);

        let namespace = match self.get_adjusted_current_node() {
            Some(node) if node.integration_node_type.is_none() => node.namespace,
            _ => ParsingNamespace::Html,
        };
        self.tag_processor.change_parsing_namespace(namespace);

        self.element_queue.push_back(HTMLStackEvent {
            operation: StackOperation::Pop,
            token,
            provenance,
        });
    }

    /// Pops nodes until an HTML element with the given name has been popped.
    fn pop_until(&mut self, tag_name: &TagName) -> bool {
        while let Some(token) = self.pop() {
            if token.is_html_element(std::slice::from_ref(tag_name)) {
                return true;
            }
        }
        false
    }

    fn pop_until_node(&mut self, node: &HTMLToken) {
        while let Some(token) = self.pop() {
            if token.is_same_node(node) {
                break;
            }
        }
    }

    fn pop_until_any_h1_to_h6(&mut self) {
        while let Some(token) = self.pop() {
            if token.is_html_element(&[
                TagName::H1,
                TagName::H2,
                TagName::H3,
                TagName::H4,
                TagName::H5,
                TagName::H6,
            ]) {
                break;
            }
        }
    }

    fn remove_node_from_stack_of_open_elements(&mut self, node: &HTMLToken) -> bool {
        match self.state.stack_of_open_elements.remove_node(node) {
            Some(token) => {
                self.after_pop(token);
                true
            }
            None => false,
        }
    }

    /// The context element stands in for the root while it is the only node.
    ///
    /// @see https://html.spec.whatwg.org/#adjusted-current-node
    fn get_adjusted_current_node(&self) -> Option<&HTMLToken> {
        match &self.context_node {
            Some(context_node) if self.state.stack_of_open_elements.count() == 1 => {
                Some(context_node)
            }
            _ => self.state.stack_of_open_elements.current_node(),
        }
    }

    /// @see https://html.spec.whatwg.org/#insert-an-html-element
    fn insert_html_element(&mut self, token: HTMLToken) {
        self.push(token);
    }

    fn insert_current_token(&mut self) {
        if let Some(token) = self.state.current_token.clone() {
            self.insert_html_element(token);
        }
    }

    /// @see https://html.spec.whatwg.org/#insert-a-foreign-element
    fn insert_foreign_element(&mut self) {
        let namespace = self
            .get_adjusted_current_node()
            .map_or(ParsingNamespace::Html, |node| node.namespace);
        let Some(mut token) = self.state.current_token.clone() else {
            return;
        };

        token.namespace = namespace;
        token.integration_node_type = if self.is_mathml_integration_point(&token) {
            Some(IntegrationNodeType::MathML)
        } else if self.is_html_integration_point(&token) {
            Some(IntegrationNodeType::HTML)
        } else {
            None
        };

        self.state.current_token = Some(token.clone());
        self.insert_html_element(token);
    }

    /// Inserts an element the tree rules imply at the current position.
    fn insert_virtual_node(&mut self, tag_name: TagName) -> Result<HTMLToken, HtmlProcessorError> {
        let node_id = self
            .bookmark_counter
            .checked_add(1)
            .ok_or(HtmlProcessorError::ExceededMaxBookmarks)?;
        let at = self
            .tag_processor
            .current_token_span()
            .map_or(self.tag_processor.html_bytes.len(), |span| span.start);
        self.tag_processor
            .insert_internal_bookmark(node_id, HtmlSpan::new(at, 0));
        self.bookmark_counter = node_id;

        let token = HTMLToken::new(node_id, tag_name.into(), false);
        self.insert_html_element(token.clone());
        Ok(token)
    }

    /// @see https://html.spec.whatwg.org/#mathml-text-integration-point
    fn is_mathml_integration_point(&self, token: &HTMLToken) -> bool {
        token.namespace == ParsingNamespace::MathML
            && token.node_name.tag().is_some_and(|tag_name| {
                matches!(
                    tag_name,
                    TagName::MI | TagName::MO | TagName::MN | TagName::MS | TagName::MTEXT
                )
            })
    }

    /// Checks the current token, so must run while it is the one being inserted.
    ///
    /// @see https://html.spec.whatwg.org/#html-integration-point
    fn is_html_integration_point(&self, token: &HTMLToken) -> bool {
        let Some(tag_name) = token.node_name.tag() else {
            return false;
        };

        match token.namespace {
            ParsingNamespace::MathML if *tag_name == TagName::ANNOTATION_XML => {
                match self.tag_processor.get_attribute(b"encoding") {
                    Some(AttributeValue::String(encoding)) => {
                        encoding.eq_ignore_ascii_case(b"application/xhtml+xml")
                            || encoding.eq_ignore_ascii_case(b"text/html")
                    }
                    _ => false,
                }
            }
            ParsingNamespace::Svg => matches!(
                tag_name,
                TagName::DESC | TagName::FOREIGNOBJECT | TagName::TITLE
            ),
            _ => false,
        }
    }

    /*
     * Shared tree construction algorithms.
     */

    /// @see https://html.spec.whatwg.org/#close-a-p-element
    fn close_a_p_element(&mut self) {
        self.generate_implied_end_tags(Some(&TagName::P));
        self.pop_until(&TagName::P);
    }

    /// @see https://html.spec.whatwg.org/#generate-implied-end-tags
    fn generate_implied_end_tags(&mut self, except_for_this_element: Option<&TagName>) {
        const ELEMENTS_WITH_IMPLIED_END_TAGS: [TagName; 10] = [
            TagName::DD,
            TagName::DT,
            TagName::LI,
            TagName::OPTGROUP,
            TagName::OPTION,
            TagName::P,
            TagName::RB,
            TagName::RP,
            TagName::RT,
            TagName::RTC,
        ];

        while let Some(node) = self.state.stack_of_open_elements.current_node() {
            if !node.is_html_element(&ELEMENTS_WITH_IMPLIED_END_TAGS)
                || except_for_this_element.is_some_and(|except| {
                    node.is_html_element(std::slice::from_ref(except))
                })
            {
                break;
            }
            self.pop();
        }
    }

    /// @see https://html.spec.whatwg.org/#generate-all-implied-end-tags-thoroughly
    fn generate_implied_end_tags_thoroughly(&mut self) {
        const ELEMENTS_WITH_IMPLIED_END_TAGS: [TagName; 16] = [
            TagName::CAPTION,
            TagName::COLGROUP,
            TagName::DD,
            TagName::DT,
            TagName::LI,
            TagName::OPTGROUP,
            TagName::OPTION,
            TagName::P,
            TagName::RB,
            TagName::RP,
            TagName::RT,
            TagName::RTC,
            TagName::TBODY,
            TagName::TD,
            TagName::TFOOT,
            TagName::TH,
        ];

        while let Some(node) = self.state.stack_of_open_elements.current_node() {
            if !node.is_html_element(&ELEMENTS_WITH_IMPLIED_END_TAGS)
                && !node.is_html_element(&[TagName::THEAD, TagName::TR])
            {
                break;
            }
            self.pop();
        }
    }

    /// Returns whether anything was reconstructed.
    ///
    /// Only the cases needing no work are supported.
    ///
    /// @see https://html.spec.whatwg.org/#reconstruct-the-active-formatting-elements
    fn reconstruct_active_formatting_elements(&self) -> StepResult {
        match self.state.active_formatting_elements.current_node() {
            None | Some(ActiveFormattingElement::Marker) => Ok(false),
            Some(ActiveFormattingElement::Token(entry))
                if self.state.stack_of_open_elements.contains_node(entry) =>
            {
                Ok(false)
            }
            Some(_) => Err(
                UnsupportedException::ActiveFormattingElementsWhenAdvancingAndRewindingIsRequired
                    .into(),
            ),
        }
    }

    fn push_current_token_to_active_formatting_elements(&mut self) {
        if let Some(token) = self.state.current_token.clone() {
            self.state.active_formatting_elements.push(token);
        }
    }

    /// @see https://html.spec.whatwg.org/#reset-the-insertion-mode-appropriately
    fn reset_insertion_mode_appropriately(&mut self) {
        self.state.insertion_mode = self.appropriate_insertion_mode();
    }

    fn appropriate_insertion_mode(&self) -> InsertionMode {
        let stack = &self.state.stack_of_open_elements;
        let count = stack.count();

        for (index, stack_node) in stack.walk_up().enumerate() {
            let last = index + 1 == count;
            let node = match &self.context_node {
                Some(context_node) if last => context_node,
                _ => stack_node,
            };

            if node.namespace != ParsingNamespace::Html {
                continue;
            }
            let Some(tag_name) = node.node_name.tag() else {
                continue;
            };

            match tag_name {
                TagName::SELECT => {
                    if !last {
                        for ancestor in stack.walk_up().skip(index + 1) {
                            if ancestor.is_html_element(&[TagName::TEMPLATE]) {
                                break;
                            }
                            if ancestor.is_html_element(&[TagName::TABLE]) {
                                return InsertionMode::IN_SELECT_IN_TABLE;
                            }
                        }
                    }
                    return InsertionMode::IN_SELECT;
                }
                TagName::TD | TagName::TH if !last => return InsertionMode::IN_CELL,
                TagName::TR => return InsertionMode::IN_ROW,
                TagName::TBODY | TagName::THEAD | TagName::TFOOT => {
                    return InsertionMode::IN_TABLE_BODY
                }
                TagName::CAPTION => return InsertionMode::IN_CAPTION,
                TagName::COLGROUP => return InsertionMode::IN_COLUMN_GROUP,
                TagName::TABLE => return InsertionMode::IN_TABLE,
                TagName::TEMPLATE => {
                    return self
                        .state
                        .stack_of_template_insertion_modes
                        .last()
                        .copied()
                        .unwrap_or(InsertionMode::IN_BODY)
                }
                TagName::HEAD if !last => return InsertionMode::IN_HEAD,
                TagName::BODY => return InsertionMode::IN_BODY,
                TagName::FRAMESET => return InsertionMode::IN_FRAMESET,
                TagName::HTML => {
                    return match self.state.head_element {
                        None => InsertionMode::BEFORE_HEAD,
                        Some(_) => InsertionMode::AFTER_HEAD,
                    }
                }
                _ => {}
            }

            if last {
                return InsertionMode::IN_BODY;
            }
        }

        InsertionMode::IN_BODY
    }

    /// Supports only the cases which close the formatting element in place.
    ///
    /// @see https://html.spec.whatwg.org/#adoption-agency-algorithm
    fn run_adoption_agency_algorithm(
        &mut self,
        subject: &TagName,
    ) -> Result<(), HtmlProcessorError> {
        // > If the current node is an HTML element whose tag name is subject,
        // > and the current node is not in the list of active formatting
        // > elements, then pop the current node off the stack of open elements
        // > and return.
        if let Some(current_node) = self.state.stack_of_open_elements.current_node() {
            if current_node.is_html_element(std::slice::from_ref(subject))
                && !self
                    .state
                    .active_formatting_elements
                    .contains_node(current_node)
            {
                self.pop();
                return Ok(());
            }
        }

        // > Let formatting element be the last element in the list of active
        // > formatting elements that is between the end of the list and the
        // > last marker in the list, if any, or the start of the list
        // > otherwise, and has the tag name subject.
        let Some(formatting_element) = self
            .state
            .active_formatting_elements
            .last_after_marker(subject)
            .cloned()
        else {
            return Err(UnsupportedException::AdoptionAgencyWhenAnyOtherEndTagIsRequired.into());
        };

        // > If formatting element is not in the stack of open elements, then
        // > this is a parse error; remove the element from the list, and return.
        if !self
            .state
            .stack_of_open_elements
            .contains_node(&formatting_element)
        {
            self.state
                .active_formatting_elements
                .remove_node(&formatting_element);
            return Ok(());
        }

        // > If formatting element is in the stack of open elements, but the
        // > element is not in scope, then this is a parse error; return.
        if !self.state.stack_of_open_elements.has_element_in_scope(subject) {
            return Ok(());
        }

        // > Let furthest block be the topmost node in the stack of open
        // > elements that is lower in the stack than formatting element, and is
        // > an element in the special category.
        let has_furthest_block = self
            .state
            .stack_of_open_elements
            .walk_down()
            .skip_while(|node| !node.is_same_node(&formatting_element))
            .skip(1)
            .any(Self::node_is_special);

        // > If there is no furthest block, then the UA must first pop all the
        // > nodes from the bottom of the stack of open elements, from the
        // > current node up to and including formatting element, then remove
        // > formatting element from the list of active formatting elements,
        // > and finally return.
        if !has_furthest_block {
            self.pop_until_node(&formatting_element);
            self.state
                .active_formatting_elements
                .remove_node(&formatting_element);
            return Ok(());
        }

        Err(UnsupportedException::AdoptionAgencyCannotExtractCommonAncestor.into())
    }

    /// @see https://html.spec.whatwg.org/#close-the-cell
    fn close_cell(&mut self) {
        self.generate_implied_end_tags(None);
        while let Some(token) = self.pop() {
            if token.is_html_element(&[TagName::TD, TagName::TH]) {
                break;
            }
        }
        self.state
            .active_formatting_elements
            .clear_up_to_last_marker();
        self.state.insertion_mode = InsertionMode::IN_ROW;
    }

    /// @see https://html.spec.whatwg.org/#clear-the-stack-back-to-a-table-context
    fn clear_to_table_context(&mut self) {
        self.pop_while_current_node_is_not(&[TagName::TABLE, TagName::TEMPLATE, TagName::HTML]);
    }

    /// @see https://html.spec.whatwg.org/#clear-the-stack-back-to-a-table-body-context
    fn clear_to_table_body_context(&mut self) {
        self.pop_while_current_node_is_not(&[
            TagName::TBODY,
            TagName::TFOOT,
            TagName::THEAD,
            TagName::TEMPLATE,
            TagName::HTML,
        ]);
    }

    /// @see https://html.spec.whatwg.org/#clear-the-stack-back-to-a-table-row-context
    fn clear_to_table_row_context(&mut self) {
        self.pop_while_current_node_is_not(&[TagName::TR, TagName::TEMPLATE, TagName::HTML]);
    }

    fn pop_while_current_node_is_not(&mut self, tag_names: &[TagName]) {
        while let Some(node) = self.state.stack_of_open_elements.current_node() {
            if node.is_html_element(tag_names) {
                break;
            }
            self.pop();
        }
    }

    fn text_node_classification(&self) -> TextNodeClassification {
        self.tag_processor.text_node_classification
    }

    /*
     * Element categories.
     */

    /// @see https://html.spec.whatwg.org/#void-elements
    pub fn is_void(tag_name: &TagName) -> bool {
        matches!(
            tag_name,
            TagName::AREA
                | TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::BR
                | TagName::COL
                | TagName::EMBED
                | TagName::FRAME
                | TagName::HR
                | TagName::IMG
                | TagName::INPUT
                | TagName::KEYGEN
                | TagName::LINK
                | TagName::META
                | TagName::PARAM
                | TagName::SOURCE
                | TagName::TRACK
                | TagName::WBR
        )
    }

    /// @see https://html.spec.whatwg.org/#special
    pub fn is_special(tag_name: &TagName, namespace: ParsingNamespace) -> bool {
        match namespace {
            ParsingNamespace::Html => matches!(
                tag_name,
                TagName::ADDRESS
                    | TagName::APPLET
                    | TagName::AREA
                    | TagName::ARTICLE
                    | TagName::ASIDE
                    | TagName::BASE
                    | TagName::BASEFONT
                    | TagName::BGSOUND
                    | TagName::BLOCKQUOTE
                    | TagName::BODY
                    | TagName::BR
                    | TagName::BUTTON
                    | TagName::CAPTION
                    | TagName::CENTER
                    | TagName::COL
                    | TagName::COLGROUP
                    | TagName::DD
                    | TagName::DETAILS
                    | TagName::DIR
                    | TagName::DIV
                    | TagName::DL
                    | TagName::DT
                    | TagName::EMBED
                    | TagName::FIELDSET
                    | TagName::FIGCAPTION
                    | TagName::FIGURE
                    | TagName::FOOTER
                    | TagName::FORM
                    | TagName::FRAME
                    | TagName::FRAMESET
                    | TagName::H1
                    | TagName::H2
                    | TagName::H3
                    | TagName::H4
                    | TagName::H5
                    | TagName::H6
                    | TagName::HEAD
                    | TagName::HEADER
                    | TagName::HGROUP
                    | TagName::HR
                    | TagName::HTML
                    | TagName::IFRAME
                    | TagName::IMG
                    | TagName::INPUT
                    | TagName::KEYGEN
                    | TagName::LI
                    | TagName::LINK
                    | TagName::LISTING
                    | TagName::MAIN
                    | TagName::MARQUEE
                    | TagName::MENU
                    | TagName::META
                    | TagName::NAV
                    | TagName::NOEMBED
                    | TagName::NOFRAMES
                    | TagName::NOSCRIPT
                    | TagName::OBJECT
                    | TagName::OL
                    | TagName::P
                    | TagName::PARAM
                    | TagName::PLAINTEXT
                    | TagName::PRE
                    | TagName::SCRIPT
                    | TagName::SEARCH
                    | TagName::SECTION
                    | TagName::SELECT
                    | TagName::SOURCE
                    | TagName::STYLE
                    | TagName::SUMMARY
                    | TagName::TABLE
                    | TagName::TBODY
                    | TagName::TD
                    | TagName::TEMPLATE
                    | TagName::TEXTAREA
                    | TagName::TFOOT
                    | TagName::TH
                    | TagName::THEAD
                    | TagName::TITLE
                    | TagName::TR
                    | TagName::TRACK
                    | TagName::UL
                    | TagName::WBR
                    | TagName::XMP
            ),
            ParsingNamespace::MathML => matches!(
                tag_name,
                TagName::MI
                    | TagName::MO
                    | TagName::MN
                    | TagName::MS
                    | TagName::MTEXT
                    | TagName::ANNOTATION_XML
            ),
            ParsingNamespace::Svg => matches!(
                tag_name,
                TagName::DESC | TagName::FOREIGNOBJECT | TagName::TITLE
            ),
        }
    }

    fn node_is_special(node: &HTMLToken) -> bool {
        node.node_name
            .tag()
            .is_some_and(|tag_name| Self::is_special(tag_name, node.namespace))
    }
}

fn push_lossy(html: &mut String, bytes: &[u8]) {
    html.push_str(&String::from_utf8_lossy(bytes).replace('\0', "\u{FFFD}"));
}

fn push_escaped(html: &mut String, bytes: &[u8]) {
    let text = String::from_utf8_lossy(bytes);
    push_lossy(html, &html_special_chars(text.as_bytes()));
}

fn serialize_doctype(doctype: &HtmlDoctypeInfo, html: &mut String) {
    html.push_str("<!DOCTYPE");

    if let Some(name) = &doctype.name {
        html.push(' ');
        push_lossy(html, name);
    }

    let quoted = |html: &mut String, identifier: &[u8]| {
        let quote = if identifier.contains(&b'"') { '\'' } else { '"' };
        html.push(quote);
        push_lossy(html, identifier);
        html.push(quote);
    };

    if let Some(public_identifier) = &doctype.public_identifier {
        html.push_str(" PUBLIC ");
        quoted(html, public_identifier);
    }

    if let Some(system_identifier) = &doctype.system_identifier {
        if doctype.public_identifier.is_none() {
            html.push_str(" SYSTEM");
        }
        html.push(' ');
        quoted(html, system_identifier);
    }

    html.push('>');
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn fragment(html: &str) -> HtmlProcessor {
        HtmlProcessor::create_fragment(html.as_bytes(), "<body>")
            .expect("BODY is a valid context")
    }

    fn crumbs(tag_names: &[TagName]) -> Vec<NodeName> {
        tag_names.iter().cloned().map(NodeName::Tag).collect()
    }

    fn target(processor: &mut HtmlProcessor) -> bool {
        while processor.next_tag(None) {
            if processor.get_attribute(b"target").is_some() {
                return true;
            }
        }
        false
    }

    #[test]
    fn list_items_close_open_siblings() {
        let mut processor = fragment("<li><li><li target>");
        assert!(target(&mut processor));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::LI])
        );
    }

    #[test]
    fn list_items_do_not_close_across_special_elements() {
        let mut processor = fragment("<dd><dd><blockquote><dd target>");
        assert!(target(&mut processor));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[
                TagName::HTML,
                TagName::BODY,
                TagName::DD,
                TagName::BLOCKQUOTE,
                TagName::DD
            ])
        );
    }

    #[test]
    fn fragments_start_inside_their_context() {
        let mut processor = HtmlProcessor::create_fragment(b"<li>One<li>Two", "<ul>").unwrap();
        assert!(processor.next_tag(None));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::UL, TagName::LI])
        );
        assert_eq!(processor.get_current_depth(), 3);
    }

    #[test]
    fn rejects_invalid_contexts() {
        assert!(HtmlProcessor::create_fragment(b"text", "<br>").is_none());
        assert!(HtmlProcessor::create_fragment(b"text", "<textarea>").is_none());
        assert!(HtmlProcessor::create_fragment(b"text", "").is_none());
        assert!(HtmlProcessor::create_fragment_with_config(
            b"text",
            "<body>",
            "ISO-8859-1",
            ProcessorConfig::default()
        )
        .is_none());
        assert!(HtmlProcessor::create_full_parser_with_config(
            b"text",
            "windows-1252",
            ProcessorConfig::default()
        )
        .is_none());
    }

    #[test]
    fn normalizes_implied_and_missing_closers() {
        assert_eq!(HtmlProcessor::normalize(b"<div>").unwrap(), "<div></div>");
        assert_eq!(
            HtmlProcessor::normalize(b"<p>One<p>Two").unwrap(),
            "<p>One</p><p>Two</p>"
        );
        assert_eq!(
            HtmlProcessor::normalize(b"<table><tr><td>x</table>").unwrap(),
            "<table><tbody><tr><td>x</td></tr></tbody></table>"
        );
    }

    #[test]
    fn normalizes_attributes() {
        assert_eq!(
            HtmlProcessor::normalize(br#"<br class="clear"/>"#).unwrap(),
            r#"<br class="clear">"#
        );
        assert_eq!(
            HtmlProcessor::normalize(br#"<div one=1 one="one">"#).unwrap(),
            r#"<div one="1"></div>"#
        );
        assert_eq!(
            HtmlProcessor::normalize(b"<input disabled value='a&b'>").unwrap(),
            r#"<input disabled value="a&amp;b">"#
        );
    }

    #[test]
    fn normalizes_foreign_content() {
        assert_eq!(
            HtmlProcessor::normalize(
                b"<svg><foreignobject><p>x</p></foreignobject><circle/></svg>"
            )
            .unwrap(),
            "<svg><foreignObject><p>x</p></foreignObject><circle /></svg>"
        );
    }

    #[test]
    fn normalize_reports_unsupported_markup() {
        assert_eq!(
            HtmlProcessor::normalize(b"<table>x"),
            Err(SerializeError::Unsupported(HtmlProcessorError::Unsupported(
                UnsupportedException::FosterParenting
            )))
        );
    }

    macro_rules! test_normalize {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (html, expected): (&str, &str) = $value;
                assert_eq!(
                    HtmlProcessor::normalize(html.as_bytes()).as_deref(),
                    Ok(expected),
                    "normalized form of {html:?}"
                );
            }
        )*
        }
    }

    test_normalize! {
        normalize_caption_closed_by_row: (
            "<table><caption>c<tr><td>x</table>",
            "<table><caption>c</caption><tbody><tr><td>x</td></tr></tbody></table>",
        ),
        normalize_col_implies_column_group: (
            "<table><col><tr><td>x</table>",
            "<table><colgroup><col></colgroup><tbody><tr><td>x</td></tr></tbody></table>",
        ),
        normalize_cell_closes_select_in_table: (
            "<table><tr><td><select><option>a<td>b</table>",
            "<table><tbody><tr><td><select><option>a</option></select></td><td>b</td></tr></tbody></table>",
        ),
        normalize_table_whitespace: (
            "<table> <tr></table>",
            "<table> <tbody><tr></tr></tbody></table>",
        ),
        normalize_hidden_input_in_table: (
            "<table><input type=HIDDEN></table>",
            r#"<table><input type="HIDDEN"></table>"#,
        ),
        normalize_presentational_font_leaves_svg: (
            "<svg><font color=red>",
            r#"<svg></svg><font color="red"></font>"#,
        ),
        normalize_plain_font_stays_in_svg: (
            "<svg><font>",
            "<svg><font></font></svg>",
        ),
        normalize_nested_anchor_closes_outer: (
            "<a>1<a>2",
            "<a>1</a><a>2</a>",
        ),
    }

    macro_rules! test_normalize_bails {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (html, exception): (&str, UnsupportedException) = $value;
                assert_eq!(
                    HtmlProcessor::normalize(html.as_bytes()),
                    Err(SerializeError::Unsupported(HtmlProcessorError::Unsupported(exception))),
                    "normalizing {html:?}"
                );
            }
        )*
        }
    }

    test_normalize_bails! {
        normalize_bails_on_input_in_table: (
            "<table><input>",
            UnsupportedException::FosterParenting,
        ),
        normalize_bails_on_form_closer_with_open_children: (
            "<form><div></form>",
            UnsupportedException::CannotCloseFormWithOtherElementsOpen,
        ),
    }

    #[test]
    fn frameset_documents_allow_only_whitespace_after_frameset() {
        let mut processor = HtmlProcessor::create_full_parser(
            b"<frameset><frame></frameset> <noframes>n</noframes>x",
        )
        .unwrap();
        assert!(processor.next_tag(Some(&TagName::NOFRAMES.into())));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::NOFRAMES])
        );

        while processor.next_token() {}
        assert_eq!(
            processor.get_unsupported_exception(),
            Some(UnsupportedException::NonWhitespaceCharsAfterFrameset)
        );
    }

    #[test]
    fn serializes_only_from_the_start() {
        let mut processor = fragment("<div>");
        assert!(processor.next_tag(None));
        assert_eq!(processor.serialize(), Err(SerializeError::AlreadyStarted));
    }

    #[test]
    fn wildcard_breadcrumbs_match_one_level() {
        let mut processor = fragment("<div><span><figure><img></figure></span></div>");
        assert!(processor.next_tag(Some(&TagName::IMG.into())));
        assert!(processor.matches_breadcrumbs(&["SPAN", "*", "IMG"]));
        assert!(processor.matches_breadcrumbs(&["span", "figure", "img"]));
        assert!(!processor.matches_breadcrumbs(&["SPAN", "IMG"]));
        assert!(!processor.matches_breadcrumbs(&["DIV", "*", "IMG"]));

        let mut processor = fragment("<div><span><figure><img></figure></span></div>");
        assert!(processor.next_tag(Some(&TagQuery {
            breadcrumbs: Some(vec!["FIGURE", "IMG"]),
            ..Default::default()
        })));
        assert_eq!(processor.get_tag(), Some(TagName::IMG));
    }

    #[test]
    fn implied_elements_are_virtual() {
        let mut processor = fragment("<table><tr class=row>");
        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::TABLE));
        assert!(!processor.is_virtual());

        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::TBODY));
        assert!(processor.is_virtual());
        assert_eq!(processor.get_attribute_names_with_prefix(b""), None);
        assert!(!processor.set_attribute("id", "body"));
        assert_eq!(processor.set_bookmark("tbody"), Err(BookmarkError::VirtualToken));

        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::TR));
        assert_eq!(processor.has_class("row"), Some(true));
    }

    #[test]
    fn full_documents_imply_html_head_and_body() {
        let mut processor =
            HtmlProcessor::create_full_parser(b"<!DOCTYPE html><title>T</title><p>").unwrap();

        let mut tags = Vec::new();
        while processor.next_tag(None) {
            tags.push((processor.get_tag().unwrap(), processor.is_virtual()));
        }
        assert_eq!(
            tags,
            [
                (TagName::HTML, true),
                (TagName::HEAD, true),
                (TagName::TITLE, false),
                (TagName::BODY, true),
                (TagName::P, false),
            ]
        );
    }

    #[test]
    fn quirks_mode_tables_stay_inside_paragraphs() {
        let mut processor = HtmlProcessor::create_full_parser(b"<p><table>").unwrap();
        assert!(processor.next_tag(Some(&TagName::TABLE.into())));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::P, TagName::TABLE])
        );

        let mut processor =
            HtmlProcessor::create_full_parser(b"<!DOCTYPE html><p><table>").unwrap();
        assert!(processor.next_tag(Some(&TagName::TABLE.into())));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::TABLE])
        );
    }

    #[test]
    fn template_contents_follow_their_own_modes() {
        let mut processor = fragment("<template><td>x</td></template><p>");
        assert!(processor.next_tag(Some(&TagName::TD.into())));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::TEMPLATE, TagName::TD])
        );

        assert!(processor.next_tag(Some(&TagName::P.into())));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::P])
        );
    }

    #[test]
    fn errors_stop_processing() {
        let mut processor = fragment("<table>x<div>");
        assert!(processor.next_tag(None));
        assert!(!processor.next_tag(None));
        assert_eq!(
            processor.get_unsupported_exception(),
            Some(UnsupportedException::FosterParenting)
        );
        assert_eq!(processor.get_tag(), None);
        assert!(!processor.next_token());

        let mut processor = fragment("<b><p></b>");
        while processor.next_token() {}
        assert_eq!(
            processor.get_unsupported_exception(),
            Some(UnsupportedException::AdoptionAgencyCannotExtractCommonAncestor)
        );

        let mut processor = fragment("<form><div></form>");
        while processor.next_token() {}
        assert_eq!(
            processor.get_unsupported_exception(),
            Some(UnsupportedException::CannotCloseFormWithOtherElementsOpen)
        );
    }

    #[test]
    fn formatting_elements_close_in_place() {
        assert_eq!(
            HtmlProcessor::normalize(b"<b>bold<i>both</i></b>plain").unwrap(),
            "<b>bold<i>both</i></b>plain"
        );
    }

    #[test]
    fn seeks_backward_and_forward() {
        let mut processor = fragment("<div><span id=a></span><em id=b></em></div>");
        assert!(processor.next_tag(Some(&TagName::SPAN.into())));
        processor.set_bookmark("a").unwrap();
        assert!(processor.next_tag(Some(&TagName::EM.into())));
        processor.set_bookmark("b").unwrap();
        assert!(!processor.next_tag(None));

        assert!(processor.seek("a"));
        assert_eq!(processor.get_tag(), Some(TagName::SPAN));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::DIV, TagName::SPAN])
        );

        assert!(processor.seek("b"));
        assert_eq!(processor.get_tag(), Some(TagName::EM));
        assert_eq!(
            processor.get_breadcrumbs(),
            crumbs(&[TagName::HTML, TagName::BODY, TagName::DIV, TagName::EM])
        );

        assert!(processor.release_bookmark("a"));
        assert!(!processor.has_bookmark("a"));
        assert!(!processor.seek("a"));
    }

    #[test]
    fn reads_raw_markup() {
        let mut processor = fragment("<div><p>One</p>Two</div><hr>");
        assert!(processor.next_tag(None));
        assert_eq!(
            processor.get_raw_inner_markup().as_deref(),
            Some(b"<p>One</p>Two".as_slice())
        );
        assert_eq!(
            processor.get_raw_outer_markup().as_deref(),
            Some(b"<div><p>One</p>Two</div>".as_slice())
        );

        assert!(processor.next_tag(None));
        assert_eq!(
            processor.get_raw_outer_markup().as_deref(),
            Some(b"<p>One</p>".as_slice())
        );

        // Closed implicitly at the end of the document.
        let mut processor = fragment("<section>Open");
        assert!(processor.next_tag(None));
        assert_eq!(
            processor.get_raw_inner_markup().as_deref(),
            Some(b"Open".as_slice())
        );
    }

    #[test]
    fn replaces_raw_markup() {
        let mut processor = fragment("<div><p>One</p>Two</div><hr>");
        assert!(processor.next_tag(None));
        assert!(processor.set_raw_inner_markup("<em>New</em>"));
        assert_eq!(
            processor.get_updated_html().as_ref(),
            b"<div><em>New</em></div><hr>"
        );

        let mut processor = fragment("<div><p>One</p>Two</div><hr>");
        assert!(processor.next_tag(Some(&TagName::P.into())));
        assert!(processor.set_raw_outer_markup(""));
        assert_eq!(processor.get_updated_html().as_ref(), b"<div>Two</div><hr>");
    }

    #[test]
    fn skips_over_replaced_markup() {
        let mut processor = fragment("<div><p class=a>x</p></div><i>y</i>");
        assert!(processor.next_tag(None));
        assert!(processor.set_raw_outer_markup("<b>"));

        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::I));
        assert!(processor.set_attribute("class", "z"));
        assert_eq!(
            processor.get_updated_html().as_ref(),
            b"<b><i class=\"z\">y</i>"
        );

        let mut processor = fragment("<div><p class=a>x</p></div><i>y</i>");
        assert!(processor.next_tag(None));
        assert!(processor.set_raw_inner_markup("<em>New</em>"));
        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::I));
        assert_eq!(
            processor.get_updated_html().as_ref(),
            b"<div><em>New</em></div><i>y</i>"
        );
    }

    #[test]
    fn finds_nth_match_by_class() {
        let mut processor = fragment(r#"<p class=x><p><p class="x y">"#);
        assert!(processor.next_tag(Some(&TagQuery {
            class_name: Some("x"),
            match_offset: Some(2),
            ..Default::default()
        })));
        assert_eq!(processor.has_class("y"), Some(true));
        assert!(!processor.next_tag(Some(&TagQuery {
            class_name: Some("x"),
            ..Default::default()
        })));
    }

    #[test]
    fn zero_match_offset_finds_the_next_tag() {
        let mut processor = fragment("<a><b>");
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
    fn visits_closers_when_asked() {
        let mut processor = fragment("<div><img></div>");
        let query = TagQuery {
            tag_closers: VisitClosers::Visit,
            ..Default::default()
        };

        let mut tags = Vec::new();
        while processor.next_tag(Some(&query)) {
            tags.push((processor.get_tag().unwrap(), processor.is_tag_closer()));
        }
        assert_eq!(
            tags,
            [
                (TagName::DIV, false),
                (TagName::IMG, false),
                (TagName::DIV, true),
            ]
        );
    }

    #[test]
    fn renames_image_to_img() {
        let mut processor = fragment("<image src=a.png>");
        assert!(processor.next_tag(None));
        assert_eq!(processor.get_tag(), Some(TagName::IMG));
        assert_eq!(processor.expects_closer(), Some(false));
    }

    #[test]
    fn tracks_depth_through_text() {
        let mut processor = fragment("<div><span>text</span></div>");
        assert!(processor.next_tag(Some(&TagName::SPAN.into())));
        assert_eq!(processor.get_current_depth(), 4);
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.get_current_depth(), 5);
        assert_eq!(processor.get_modifiable_text().as_ref(), b"text");
    }

    #[quickcheck]
    fn scanning_leaves_the_document_unchanged(html: String) -> bool {
        let mut processor = fragment(&html);
        while processor.next_token() {}
        processor.get_updated_html().as_ref() == html.as_bytes()
    }
}
