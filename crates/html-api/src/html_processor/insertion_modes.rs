//! Tree construction rules for each insertion mode, and for foreign content.
//!
//! Each step receives the current token as an [`Op`] and returns whether
//! the token was processed. Ignored tokens count as processed: the next
//! step simply moves on. Rules that are not supported bail with an
//! [`UnsupportedException`], which stops the processor.

use super::{
    insertion_mode::InsertionMode, HtmlProcessor, NodeToProcess, Op, StepResult,
};
use crate::{
    compat_mode::CompatMode,
    errors::UnsupportedException,
    tag_name::TagName,
    tag_processor::ParsingNamespace,
    token::{AttributeValue, TextNodeClassification, TokenType},
};

fn bail(exception: UnsupportedException) -> StepResult {
    Err(exception.into())
}

impl HtmlProcessor {
    fn reprocess(&mut self) -> StepResult {
        self.step(NodeToProcess::ReprocessCurrentNode)
    }

    fn is_whitespace_text(&self, op: &Op) -> bool {
        op == &Op::Token(TokenType::Text)
            && self.text_node_classification() == TextNodeClassification::Whitespace
    }

    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    pub(super) fn step_initial(&mut self, op: &Op) -> StepResult {
        match op {
            // > A character token that is one of U+0009 CHARACTER TABULATION,
            // > U+000A LINE FEED (LF), U+000C FORM FEED (FF), U+000D CARRIAGE
            // > RETURN (CR), or U+0020 SPACE
            //
            // Ignore the token.
            _ if self.is_whitespace_text(op) => Ok(true),

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => {
                if self
                    .tag_processor
                    .get_doctype_info()
                    .is_some_and(|doctype| doctype.indicated_compat_mode == CompatMode::Quirks)
                {
                    self.tag_processor.compat_mode = CompatMode::Quirks;
                }

                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::BEFORE_HTML;
                Ok(true)
            }

            // > Anything else
            _ => {
                self.tag_processor.compat_mode = CompatMode::Quirks;
                self.state.insertion_mode = InsertionMode::BEFORE_HTML;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-before-html-insertion-mode
    pub(super) fn step_before_html(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Doctype) => Ok(true),

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            _ if self.is_whitespace_text(op) => Ok(true),

            Op::TagPush(TagName::HTML) => {
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::BEFORE_HEAD;
                Ok(true)
            }

            // > Any other end tag
            Op::TagPop(tag_name)
                if !matches!(
                    tag_name,
                    TagName::HEAD | TagName::BODY | TagName::HTML | TagName::BR
                ) =>
            {
                Ok(true)
            }

            // > Create an html element whose node document is the Document
            // > object. Append it to the Document object. Put this element in
            // > the stack of open elements.
            _ => {
                self.insert_virtual_node(TagName::HTML)?;
                self.state.insertion_mode = InsertionMode::BEFORE_HEAD;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-before-head-insertion-mode
    pub(super) fn step_before_head(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => Ok(true),

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::HEAD) => {
                self.insert_current_token();
                self.state.head_element = self.state.current_token.clone();
                self.state.insertion_mode = InsertionMode::IN_HEAD;
                Ok(true)
            }

            Op::TagPop(tag_name)
                if !matches!(
                    tag_name,
                    TagName::HEAD | TagName::BODY | TagName::HTML | TagName::BR
                ) =>
            {
                Ok(true)
            }

            _ => {
                let head = self.insert_virtual_node(TagName::HEAD)?;
                self.state.head_element = Some(head);
                self.state.insertion_mode = InsertionMode::IN_HEAD;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inhead
    pub(super) fn step_in_head(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::BASE | TagName::BASEFONT | TagName::BGSOUND | TagName::LINK) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::META) => {
                self.insert_current_token();

                // > If the active speculative HTML parser is null, then:
                // >   - If the element has a charset attribute, and getting an
                // >     encoding from its value results in an encoding, and the
                // >     confidence is currently tentative, then change the
                // >     encoding to the resulting encoding.
                let is_tentative =
                    self.state.encoding_confidence == super::EncodingConfidence::Tentative;

                if is_tentative
                    && matches!(self.get_attribute(b"charset"), Some(AttributeValue::String(_)))
                {
                    return bail(UnsupportedException::MetaTagCharsetDetermineEncoding);
                }

                // >   - Otherwise, if the element has an http-equiv attribute
                // >     whose value is an ASCII case-insensitive match for the
                // >     string "Content-Type", and the element has a content
                // >     attribute, ... and the confidence is currently
                // >     tentative, then change the encoding to the extracted
                // >     encoding.
                let is_content_type = matches!(
                    self.get_attribute(b"http-equiv"),
                    Some(AttributeValue::String(value)) if value.eq_ignore_ascii_case(b"Content-Type")
                );
                if is_tentative
                    && is_content_type
                    && matches!(self.get_attribute(b"content"), Some(AttributeValue::String(_)))
                {
                    return bail(UnsupportedException::MetaTagHttpEquivDetermineEncoding);
                }

                Ok(true)
            }

            // Raw text elements carry their text in the opening token.
            Op::TagPush(TagName::TITLE | TagName::NOFRAMES | TagName::STYLE | TagName::SCRIPT) => {
                self.insert_current_token();
                Ok(true)
            }

            // Scripting is disabled.
            Op::TagPush(TagName::NOSCRIPT) => {
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_HEAD_NOSCRIPT;
                Ok(true)
            }

            Op::TagPop(TagName::HEAD) => {
                self.pop();
                self.state.insertion_mode = InsertionMode::AFTER_HEAD;
                Ok(true)
            }

            Op::TagPush(TagName::TEMPLATE) => {
                self.state.active_formatting_elements.insert_marker();
                self.state.frameset_ok = false;
                self.state.insertion_mode = InsertionMode::IN_TEMPLATE;
                self.state
                    .stack_of_template_insertion_modes
                    .push(InsertionMode::IN_TEMPLATE);
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPop(TagName::TEMPLATE) => {
                if !self.state.stack_of_open_elements.contains(&TagName::TEMPLATE) {
                    return Ok(true);
                }

                self.generate_implied_end_tags_thoroughly();
                self.pop_until(&TagName::TEMPLATE);
                self.state
                    .active_formatting_elements
                    .clear_up_to_last_marker();
                self.state.stack_of_template_insertion_modes.pop();
                self.reset_insertion_mode_appropriately();
                Ok(true)
            }

            Op::TagPush(TagName::HEAD) => Ok(true),

            Op::TagPop(tag_name)
                if !matches!(tag_name, TagName::BODY | TagName::HTML | TagName::BR) =>
            {
                Ok(true)
            }

            _ => {
                self.pop();
                self.state.insertion_mode = InsertionMode::AFTER_HEAD;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inheadnoscript
    pub(super) fn step_in_head_noscript(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPop(TagName::NOSCRIPT) => {
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_HEAD;
                Ok(true)
            }

            _ if self.is_whitespace_text(op) => self.step_in_head(op),

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag)
            | Op::TagPush(
                TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::STYLE,
            ) => self.step_in_head(op),

            Op::TagPush(TagName::HEAD | TagName::NOSCRIPT) => Ok(true),

            Op::TagPop(tag_name) if *tag_name != TagName::BR => Ok(true),

            _ => {
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_HEAD;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-head-insertion-mode
    pub(super) fn step_after_head(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::BODY) => {
                self.insert_current_token();
                self.state.frameset_ok = false;
                self.state.insertion_mode = InsertionMode::IN_BODY;
                Ok(true)
            }

            Op::TagPush(TagName::FRAMESET) => {
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_FRAMESET;
                Ok(true)
            }

            // > Push the node pointed to by the head element pointer onto the
            // > stack of open elements.
            //
            // Reopening HEAD would rewrite the breadcrumbs of visited tokens.
            Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            ) => bail(UnsupportedException::AfterHeadElementsReopenHead),

            Op::TagPop(TagName::TEMPLATE) => self.step_in_head(op),

            Op::TagPush(TagName::HEAD) => Ok(true),

            Op::TagPop(tag_name)
                if !matches!(tag_name, TagName::BODY | TagName::HTML | TagName::BR) =>
            {
                Ok(true)
            }

            _ => {
                self.insert_virtual_node(TagName::BODY)?;
                self.state.insertion_mode = InsertionMode::IN_BODY;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inbody
    pub(super) fn step_in_body(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Text) => {
                // > A character token that is U+0000 NULL
                //
                // Ignore the token.
                if self.text_node_classification() == TextNodeClassification::NullSequence {
                    return Ok(true);
                }

                self.reconstruct_active_formatting_elements()?;

                // Whitespace-only text does not affect the frameset-ok flag.
                if self.text_node_classification() == TextNodeClassification::Generic {
                    self.state.frameset_ok = false;
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::Token(
                TokenType::Comment
                | TokenType::FunkyComment
                | TokenType::PresumptuousTag
                | TokenType::CdataSection,
            ) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            // > If there is a template element on the stack of open elements,
            // > then ignore the token. Otherwise, for each attribute on the
            // > token, check to see if the attribute is already present on the
            // > top element of the stack of open elements...
            //
            // Attributes are not merged; there is no tree to merge them into.
            Op::TagPush(TagName::HTML) => Ok(true),

            Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            )
            | Op::TagPop(TagName::TEMPLATE) => self.step_in_head(op),

            // Attributes are not merged into the existing BODY.
            Op::TagPush(TagName::BODY) => Ok(true),

            Op::TagPush(TagName::FRAMESET) => {
                // > If the stack of open elements has only one node on it, or
                // > if the second element on the stack of open elements is not
                // > a body element, then ignore the token. (fragment case or
                // > there is a template element on the stack)
                //
                // > If the frameset-ok flag is set to "not ok", ignore the token.
                let second_is_body = self
                    .state
                    .stack_of_open_elements
                    .at(2)
                    .is_some_and(|node| node.is_html_element(&[TagName::BODY]));
                if self.state.stack_of_open_elements.count() == 1
                    || !second_is_body
                    || !self.state.frameset_ok
                {
                    return Ok(true);
                }

                bail(UnsupportedException::CannotProcessNonIgnoredFrameset)
            }

            Op::TagPop(TagName::BODY) => {
                if !self.state.stack_of_open_elements.has_element_in_scope(&TagName::BODY) {
                    return Ok(true);
                }

                self.state.insertion_mode = InsertionMode::AFTER_BODY;
                Ok(true)
            }

            Op::TagPop(TagName::HTML) => {
                if !self.state.stack_of_open_elements.has_element_in_scope(&TagName::BODY) {
                    return Ok(true);
                }

                self.state.insertion_mode = InsertionMode::AFTER_BODY;
                self.reprocess()
            }

            Op::TagPush(
                TagName::ADDRESS
                | TagName::ARTICLE
                | TagName::ASIDE
                | TagName::BLOCKQUOTE
                | TagName::CENTER
                | TagName::DETAILS
                | TagName::DIALOG
                | TagName::DIR
                | TagName::DIV
                | TagName::DL
                | TagName::FIELDSET
                | TagName::FIGCAPTION
                | TagName::FIGURE
                | TagName::FOOTER
                | TagName::HEADER
                | TagName::HGROUP
                | TagName::MAIN
                | TagName::MENU
                | TagName::NAV
                | TagName::OL
                | TagName::P
                | TagName::SEARCH
                | TagName::SECTION
                | TagName::SUMMARY
                | TagName::UL,
            ) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(
                TagName::H1 | TagName::H2 | TagName::H3 | TagName::H4 | TagName::H5 | TagName::H6,
            ) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                // > If the current node is an HTML element whose tag name is one
                // > of "h1", "h2", "h3", "h4", "h5", or "h6", then this is a
                // > parse error; pop the current node off the stack of open
                // > elements.
                if self.state.stack_of_open_elements.current_node().is_some_and(|node| {
                    node.is_html_element(&[
                        TagName::H1,
                        TagName::H2,
                        TagName::H3,
                        TagName::H4,
                        TagName::H5,
                        TagName::H6,
                    ])
                }) {
                    self.pop();
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::PRE | TagName::LISTING) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                // A leading newline is dropped by the tokenizer when reading
                // the modifiable text.
                self.insert_current_token();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPush(TagName::FORM) => {
                let has_template = self.state.stack_of_open_elements.contains(&TagName::TEMPLATE);
                if self.state.form_element.is_some() && !has_template {
                    return Ok(true);
                }

                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                self.insert_current_token();
                if !has_template {
                    self.state.form_element = self.state.current_token.clone();
                }
                Ok(true)
            }

            Op::TagPush(TagName::LI) => self.start_list_item(&[TagName::LI]),

            Op::TagPush(TagName::DD | TagName::DT) => {
                self.start_list_item(&[TagName::DD, TagName::DT])
            }

            Op::TagPush(TagName::PLAINTEXT) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                // Everything after PLAINTEXT is text, which the tokenizer
                // does not support.
                bail(UnsupportedException::CannotProcessPlaintextElements)
            }

            Op::TagPush(TagName::BUTTON) => {
                if self
                    .state
                    .stack_of_open_elements
                    .has_element_in_scope(&TagName::BUTTON)
                {
                    self.generate_implied_end_tags(None);
                    self.pop_until(&TagName::BUTTON);
                }

                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPop(
                tag_name @ (TagName::ADDRESS
                | TagName::ARTICLE
                | TagName::ASIDE
                | TagName::BLOCKQUOTE
                | TagName::BUTTON
                | TagName::CENTER
                | TagName::DETAILS
                | TagName::DIALOG
                | TagName::DIR
                | TagName::DIV
                | TagName::DL
                | TagName::FIELDSET
                | TagName::FIGCAPTION
                | TagName::FIGURE
                | TagName::FOOTER
                | TagName::HEADER
                | TagName::HGROUP
                | TagName::LISTING
                | TagName::MAIN
                | TagName::MENU
                | TagName::NAV
                | TagName::OL
                | TagName::PRE
                | TagName::SEARCH
                | TagName::SECTION
                | TagName::SUMMARY
                | TagName::UL),
            ) => {
                if !self.state.stack_of_open_elements.has_element_in_scope(tag_name) {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);
                self.pop_until(tag_name);
                Ok(true)
            }

            Op::TagPop(TagName::FORM) => {
                if self.state.stack_of_open_elements.contains(&TagName::TEMPLATE) {
                    if !self
                        .state
                        .stack_of_open_elements
                        .has_element_in_scope(&TagName::FORM)
                    {
                        return Ok(true);
                    }

                    self.generate_implied_end_tags(None);
                    self.pop_until(&TagName::FORM);
                    return Ok(true);
                }

                // > Let node be the element that the form element pointer is
                // > set to, or null if it is not set to an element.
                // > Set the form element pointer to null.
                let Some(node) = self.state.form_element.take() else {
                    return Ok(true);
                };

                // > If node is null or if the stack of open elements does not
                // > have node in scope, then this is a parse error; return and
                // > ignore the token.
                if !self.state.stack_of_open_elements.contains_node(&node)
                    || !self
                        .state
                        .stack_of_open_elements
                        .has_element_in_scope(&TagName::FORM)
                {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);

                // > If the current node is not node, then this is a parse
                // > error; remove node from the stack of open elements.
                //
                // Removing an element from the middle of the stack would
                // reorder the breadcrumbs of its descendants.
                if !self
                    .state
                    .stack_of_open_elements
                    .current_node()
                    .is_some_and(|current| current.is_same_node(&node))
                {
                    return bail(UnsupportedException::CannotCloseFormWithOtherElementsOpen);
                }

                self.remove_node_from_stack_of_open_elements(&node);
                Ok(true)
            }

            Op::TagPop(TagName::P) => {
                // > If the stack of open elements does not have a p element in
                // > button scope, then this is a parse error; insert an HTML
                // > element for a "p" start tag token with no attributes.
                if !self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.insert_current_token();
                }

                self.close_a_p_element();
                Ok(true)
            }

            Op::TagPop(TagName::LI) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_list_item_scope(&TagName::LI)
                {
                    return Ok(true);
                }

                self.generate_implied_end_tags(Some(&TagName::LI));
                self.pop_until(&TagName::LI);
                Ok(true)
            }

            Op::TagPop(tag_name @ (TagName::DD | TagName::DT)) => {
                if !self.state.stack_of_open_elements.has_element_in_scope(tag_name) {
                    return Ok(true);
                }

                self.generate_implied_end_tags(Some(tag_name));
                self.pop_until(tag_name);
                Ok(true)
            }

            Op::TagPop(
                TagName::H1 | TagName::H2 | TagName::H3 | TagName::H4 | TagName::H5 | TagName::H6,
            ) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_any_h1_to_h6_element_in_scope()
                {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);
                self.pop_until_any_h1_to_h6();
                Ok(true)
            }

            Op::TagPush(TagName::A) => {
                // > If the list of active formatting elements contains an a
                // > element between the end of the list and the last marker on
                // > the list (or the start of the list if there is no marker on
                // > the list), then this is a parse error; run the adoption
                // > agency algorithm for the token, then remove that element
                // > from the list of active formatting elements and the stack
                // > of open elements if the adoption agency algorithm didn't
                // > already remove it.
                if let Some(anchor) = self
                    .state
                    .active_formatting_elements
                    .last_after_marker(&TagName::A)
                    .cloned()
                {
                    self.run_adoption_agency_algorithm(&TagName::A)?;
                    self.state.active_formatting_elements.remove_node(&anchor);
                    self.remove_node_from_stack_of_open_elements(&anchor);
                }

                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.push_current_token_to_active_formatting_elements();
                Ok(true)
            }

            Op::TagPush(
                TagName::B
                | TagName::BIG
                | TagName::CODE
                | TagName::EM
                | TagName::FONT
                | TagName::I
                | TagName::S
                | TagName::SMALL
                | TagName::STRIKE
                | TagName::STRONG
                | TagName::TT
                | TagName::U,
            ) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.push_current_token_to_active_formatting_elements();
                Ok(true)
            }

            Op::TagPush(TagName::NOBR) => {
                self.reconstruct_active_formatting_elements()?;

                if self
                    .state
                    .stack_of_open_elements
                    .has_element_in_scope(&TagName::NOBR)
                {
                    self.run_adoption_agency_algorithm(&TagName::NOBR)?;
                    self.reconstruct_active_formatting_elements()?;
                }

                self.insert_current_token();
                self.push_current_token_to_active_formatting_elements();
                Ok(true)
            }

            Op::TagPop(
                tag_name @ (TagName::A
                | TagName::B
                | TagName::BIG
                | TagName::CODE
                | TagName::EM
                | TagName::FONT
                | TagName::I
                | TagName::NOBR
                | TagName::S
                | TagName::SMALL
                | TagName::STRIKE
                | TagName::STRONG
                | TagName::TT
                | TagName::U),
            ) => {
                self.run_adoption_agency_algorithm(tag_name)?;
                Ok(true)
            }

            Op::TagPush(TagName::APPLET | TagName::MARQUEE | TagName::OBJECT) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.state.active_formatting_elements.insert_marker();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPop(tag_name @ (TagName::APPLET | TagName::MARQUEE | TagName::OBJECT)) => {
                if !self.state.stack_of_open_elements.has_element_in_scope(tag_name) {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);
                self.pop_until(tag_name);
                self.state
                    .active_formatting_elements
                    .clear_up_to_last_marker();
                Ok(true)
            }

            Op::TagPush(TagName::TABLE) => {
                // > If the Document is not set to quirks mode, and the stack of
                // > open elements has a p element in button scope, then close a
                // > p element.
                if self.tag_processor.compat_mode != CompatMode::Quirks
                    && self.state.stack_of_open_elements.has_p_in_button_scope()
                {
                    self.close_a_p_element();
                }

                self.insert_current_token();
                self.state.frameset_ok = false;
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                Ok(true)
            }

            Op::TagPush(
                TagName::AREA
                | TagName::BR
                | TagName::EMBED
                | TagName::IMG
                | TagName::KEYGEN
                | TagName::WBR,
            ) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPush(TagName::INPUT) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();

                // > If the token does not have an attribute with the name
                // > "type", or if it does, but that attribute's value is not an
                // > ASCII case-insensitive match for the string "hidden", then:
                // > set the frameset-ok flag to "not ok".
                if !self.is_hidden_input() {
                    self.state.frameset_ok = false;
                }
                Ok(true)
            }

            Op::TagPush(TagName::PARAM | TagName::SOURCE | TagName::TRACK) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::HR) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                self.insert_current_token();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPush(TagName::TEXTAREA) => {
                self.insert_current_token();
                self.state.frameset_ok = false;
                Ok(true)
            }

            Op::TagPush(TagName::XMP) => {
                if self.state.stack_of_open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }

                self.reconstruct_active_formatting_elements()?;
                self.state.frameset_ok = false;
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::IFRAME) => {
                self.state.frameset_ok = false;
                self.insert_current_token();
                Ok(true)
            }

            // Scripting is disabled, so NOSCRIPT holds regular markup.
            Op::TagPush(TagName::NOEMBED) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::SELECT) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                self.state.frameset_ok = false;

                self.state.insertion_mode = match self.state.insertion_mode {
                    InsertionMode::IN_TABLE
                    | InsertionMode::IN_CAPTION
                    | InsertionMode::IN_TABLE_BODY
                    | InsertionMode::IN_ROW
                    | InsertionMode::IN_CELL => InsertionMode::IN_SELECT_IN_TABLE,
                    _ => InsertionMode::IN_SELECT,
                };
                Ok(true)
            }

            Op::TagPush(TagName::OPTGROUP | TagName::OPTION) => {
                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTION)
                {
                    self.pop();
                }

                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::RB | TagName::RTC) => {
                if self
                    .state
                    .stack_of_open_elements
                    .has_element_in_scope(&TagName::RUBY)
                {
                    self.generate_implied_end_tags(None);
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::RP | TagName::RT) => {
                if self
                    .state
                    .stack_of_open_elements
                    .has_element_in_scope(&TagName::RUBY)
                {
                    self.generate_implied_end_tags(Some(&TagName::RTC));
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(tag_name @ (TagName::MATH | TagName::SVG)) => {
                self.reconstruct_active_formatting_elements()?;

                let namespace = match tag_name {
                    TagName::MATH => ParsingNamespace::MathML,
                    _ => ParsingNamespace::Svg,
                };
                if let Some(token) = self.state.current_token.as_mut() {
                    token.namespace = namespace;
                }

                self.insert_current_token();
                if self
                    .state
                    .current_token
                    .as_ref()
                    .is_some_and(|token| token.has_self_closing_flag)
                {
                    self.pop();
                }
                Ok(true)
            }

            Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::FRAME
                | TagName::HEAD
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            ) => Ok(true),

            // > Any other start tag
            Op::TagPush(_) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_current_token();
                Ok(true)
            }

            // > Any other end tag
            Op::TagPop(tag_name) => {
                // > Initialize node to be the current node (the bottommost node
                // > of the stack).
                // > Loop: If node is an HTML element with the same tag name as
                // > the token, then:
                // >   - Generate implied end tags, except for HTML elements with
                // >     the same tag name as the token.
                // >   - Pop all the nodes from the current node up to node,
                // >     including node, then stop these steps.
                // > Otherwise, if node is in the special category, then this is
                // > a parse error; ignore the token, and return.
                let mut matching_node = None;
                for node in self.state.stack_of_open_elements.walk_up() {
                    if node.is_html_element(std::slice::from_ref(tag_name)) {
                        matching_node = Some(node.clone());
                        break;
                    }

                    if Self::node_is_special(node) {
                        return Ok(true);
                    }
                }

                let Some(node) = matching_node else {
                    return Ok(true);
                };

                self.generate_implied_end_tags(Some(tag_name));
                self.pop_until_node(&node);
                Ok(true)
            }

            Op::Token(TokenType::Tag) => Ok(true),
        }
    }

    /// Opening LI, DD or DT closes the matching open list item.
    fn start_list_item(&mut self, tag_names: &[TagName]) -> StepResult {
        self.state.frameset_ok = false;

        let mut open_item = None;
        for node in self.state.stack_of_open_elements.walk_up() {
            if node.is_html_element(tag_names) {
                open_item = node.node_name.tag().cloned();
                break;
            }

            // > If node is in the special category, but is not an address,
            // > div, or p element, then jump to the step labeled done below.
            if Self::node_is_special(node)
                && !node.is_html_element(&[TagName::ADDRESS, TagName::DIV, TagName::P])
            {
                break;
            }
        }

        if let Some(tag_name) = open_item {
            self.generate_implied_end_tags(Some(&tag_name));
            self.pop_until(&tag_name);
        }

        if self.state.stack_of_open_elements.has_p_in_button_scope() {
            self.close_a_p_element();
        }

        self.insert_current_token();
        Ok(true)
    }

    fn is_hidden_input(&self) -> bool {
        matches!(
            self.get_attribute(b"type"),
            Some(AttributeValue::String(value)) if value.eq_ignore_ascii_case(b"hidden")
        )
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intable
    pub(super) fn step_in_table(&mut self, op: &Op) -> StepResult {
        match op {
            // > A character token, if the current node is table, tbody,
            // > template, tfoot, thead, or tr element
            Op::Token(TokenType::Text)
                if self
                    .state
                    .stack_of_open_elements
                    .current_node()
                    .is_some_and(|node| {
                        node.is_html_element(&[
                            TagName::TABLE,
                            TagName::TBODY,
                            TagName::TEMPLATE,
                            TagName::TFOOT,
                            TagName::THEAD,
                            TagName::TR,
                        ])
                    }) =>
            {
                self.state.insertion_mode = InsertionMode::IN_TABLE_TEXT;
                self.reprocess()
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::CAPTION) => {
                self.clear_to_table_context();
                self.state.active_formatting_elements.insert_marker();
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_CAPTION;
                Ok(true)
            }

            Op::TagPush(TagName::COLGROUP) => {
                self.clear_to_table_context();
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_COLUMN_GROUP;
                Ok(true)
            }

            Op::TagPush(TagName::COL) => {
                self.clear_to_table_context();
                self.insert_virtual_node(TagName::COLGROUP)?;
                self.state.insertion_mode = InsertionMode::IN_COLUMN_GROUP;
                self.reprocess()
            }

            Op::TagPush(TagName::TBODY | TagName::TFOOT | TagName::THEAD) => {
                self.clear_to_table_context();
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_TABLE_BODY;
                Ok(true)
            }

            Op::TagPush(TagName::TD | TagName::TH | TagName::TR) => {
                self.clear_to_table_context();
                self.insert_virtual_node(TagName::TBODY)?;
                self.state.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.reprocess()
            }

            Op::TagPush(TagName::TABLE) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(&TagName::TABLE)
                {
                    return Ok(true);
                }

                self.pop_until(&TagName::TABLE);
                self.reset_insertion_mode_appropriately();
                self.reprocess()
            }

            Op::TagPop(TagName::TABLE) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(&TagName::TABLE)
                {
                    return Ok(true);
                }

                self.pop_until(&TagName::TABLE);
                self.reset_insertion_mode_appropriately();
                Ok(true)
            }

            Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            ) => Ok(true),

            Op::TagPush(TagName::STYLE | TagName::SCRIPT | TagName::TEMPLATE)
            | Op::TagPop(TagName::TEMPLATE) => self.step_in_head(op),

            Op::TagPush(TagName::INPUT) if self.is_hidden_input() => {
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::FORM) => {
                if self.state.stack_of_open_elements.contains(&TagName::TEMPLATE)
                    || self.state.form_element.is_some()
                {
                    return Ok(true);
                }

                // This FORM closes immediately and cannot have children.
                self.insert_current_token();
                self.state.form_element = self.state.current_token.clone();
                self.pop();
                Ok(true)
            }

            // > Anything else
            // > Parse error. Enable foster parenting, process the token using
            // > the rules for the "in body" insertion mode, and then disable
            // > foster parenting.
            _ => bail(UnsupportedException::FosterParenting),
        }
    }

    /// Table text is processed as it arrives instead of being collected:
    /// whitespace is inserted and anything else would need foster parenting.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intabletext
    pub(super) fn step_in_table_text(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Text) => match self.text_node_classification() {
                TextNodeClassification::NullSequence => Ok(true),
                TextNodeClassification::Whitespace => {
                    self.insert_current_token();
                    Ok(true)
                }
                TextNodeClassification::Generic => bail(UnsupportedException::FosterParenting),
            },

            _ => {
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-incaption
    pub(super) fn step_in_caption(&mut self, op: &Op) -> StepResult {
        match op {
            Op::TagPop(TagName::CAPTION)
            | Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            )
            | Op::TagPop(TagName::TABLE) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(&TagName::CAPTION)
                {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);
                self.pop_until(&TagName::CAPTION);
                self.state
                    .active_formatting_elements
                    .clear_up_to_last_marker();
                self.state.insertion_mode = InsertionMode::IN_TABLE;

                if op == &Op::TagPop(TagName::CAPTION) {
                    Ok(true)
                } else {
                    self.reprocess()
                }
            }

            Op::TagPop(
                TagName::BODY
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            ) => Ok(true),

            _ => self.step_in_body(op),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-incolgroup
    pub(super) fn step_in_column_group(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::COL) => {
                self.insert_current_token();
                self.pop();
                Ok(true)
            }

            Op::TagPop(TagName::COLGROUP) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::COLGROUP)
                {
                    return Ok(true);
                }

                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                Ok(true)
            }

            Op::TagPop(TagName::COL) => Ok(true),

            Op::TagPush(TagName::TEMPLATE) | Op::TagPop(TagName::TEMPLATE) => {
                self.step_in_head(op)
            }

            _ => {
                if !self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::COLGROUP)
                {
                    return Ok(true);
                }

                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intbody
    pub(super) fn step_in_table_body(&mut self, op: &Op) -> StepResult {
        match op {
            Op::TagPush(TagName::TR) => {
                self.clear_to_table_body_context();
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_ROW;
                Ok(true)
            }

            Op::TagPush(TagName::TH | TagName::TD) => {
                self.clear_to_table_body_context();
                self.insert_virtual_node(TagName::TR)?;
                self.state.insertion_mode = InsertionMode::IN_ROW;
                self.reprocess()
            }

            Op::TagPop(tag_name @ (TagName::TBODY | TagName::TFOOT | TagName::THEAD)) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(tag_name)
                {
                    return Ok(true);
                }

                self.clear_to_table_body_context();
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                Ok(true)
            }

            Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD,
            )
            | Op::TagPop(TagName::TABLE) => {
                let stack = &self.state.stack_of_open_elements;
                if !stack.has_element_in_table_scope(&TagName::TBODY)
                    && !stack.has_element_in_table_scope(&TagName::THEAD)
                    && !stack.has_element_in_table_scope(&TagName::TFOOT)
                {
                    return Ok(true);
                }

                self.clear_to_table_body_context();
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE;
                self.reprocess()
            }

            Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TD
                | TagName::TH
                | TagName::TR,
            ) => Ok(true),

            _ => self.step_in_table(op),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intr
    pub(super) fn step_in_row(&mut self, op: &Op) -> StepResult {
        match op {
            Op::TagPush(TagName::TH | TagName::TD) => {
                self.clear_to_table_row_context();
                self.insert_current_token();
                self.state.insertion_mode = InsertionMode::IN_CELL;
                self.state.active_formatting_elements.insert_marker();
                Ok(true)
            }

            Op::TagPop(TagName::TR) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(&TagName::TR)
                {
                    return Ok(true);
                }

                self.clear_to_table_row_context();
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE_BODY;
                Ok(true)
            }

            Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR,
            )
            | Op::TagPop(TagName::TABLE) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(&TagName::TR)
                {
                    return Ok(true);
                }

                self.clear_to_table_row_context();
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.reprocess()
            }

            Op::TagPop(tag_name @ (TagName::TBODY | TagName::TFOOT | TagName::THEAD)) => {
                let stack = &self.state.stack_of_open_elements;
                if !stack.has_element_in_table_scope(tag_name)
                    || !stack.has_element_in_table_scope(&TagName::TR)
                {
                    return Ok(true);
                }

                self.clear_to_table_row_context();
                self.pop();
                self.state.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.reprocess()
            }

            Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TD
                | TagName::TH,
            ) => Ok(true),

            _ => self.step_in_table(op),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intd
    pub(super) fn step_in_cell(&mut self, op: &Op) -> StepResult {
        match op {
            Op::TagPop(tag_name @ (TagName::TD | TagName::TH)) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(tag_name)
                {
                    return Ok(true);
                }

                self.generate_implied_end_tags(None);
                self.pop_until(tag_name);
                self.state
                    .active_formatting_elements
                    .clear_up_to_last_marker();
                self.state.insertion_mode = InsertionMode::IN_ROW;
                Ok(true)
            }

            Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            ) => {
                let stack = &self.state.stack_of_open_elements;
                if !stack.has_element_in_table_scope(&TagName::TD)
                    && !stack.has_element_in_table_scope(&TagName::TH)
                {
                    return Ok(true);
                }

                self.close_cell();
                self.reprocess()
            }

            Op::TagPop(
                TagName::BODY | TagName::CAPTION | TagName::COL | TagName::COLGROUP | TagName::HTML,
            ) => Ok(true),

            Op::TagPop(
                tag_name @ (TagName::TABLE
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR),
            ) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(tag_name)
                {
                    return Ok(true);
                }

                self.close_cell();
                self.reprocess()
            }

            _ => self.step_in_body(op),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inselect
    pub(super) fn step_in_select(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Text) => {
                if self.text_node_classification() == TextNodeClassification::NullSequence {
                    return Ok(true);
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::OPTION) => {
                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTION)
                {
                    self.pop();
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPush(TagName::OPTGROUP | TagName::HR) => {
                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTION)
                {
                    self.pop();
                }

                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTGROUP)
                {
                    self.pop();
                }

                self.insert_current_token();
                Ok(true)
            }

            Op::TagPop(TagName::OPTGROUP) => {
                // > First, if the current node is an option element, and the
                // > node immediately before it in the stack of open elements is
                // > an optgroup element, then pop the current node from the
                // > stack of open elements.
                let stack = &self.state.stack_of_open_elements;
                let parent_is_optgroup = stack
                    .count()
                    .checked_sub(1)
                    .and_then(|nth| stack.at(nth))
                    .is_some_and(|node| node.is_html_element(&[TagName::OPTGROUP]));
                if stack.current_node_is(&TagName::OPTION) && parent_is_optgroup {
                    self.pop();
                }

                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTGROUP)
                {
                    self.pop();
                }
                Ok(true)
            }

            Op::TagPop(TagName::OPTION) => {
                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::OPTION)
                {
                    self.pop();
                }
                Ok(true)
            }

            Op::TagPop(TagName::SELECT) | Op::TagPush(TagName::SELECT) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_select_scope(&TagName::SELECT)
                {
                    return Ok(true);
                }

                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                Ok(true)
            }

            Op::TagPush(TagName::INPUT | TagName::KEYGEN | TagName::TEXTAREA) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_select_scope(&TagName::SELECT)
                {
                    return Ok(true);
                }

                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.reprocess()
            }

            Op::TagPush(TagName::SCRIPT | TagName::TEMPLATE) | Op::TagPop(TagName::TEMPLATE) => {
                self.step_in_head(op)
            }

            _ => Ok(true),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inselectintable
    pub(super) fn step_in_select_in_table(&mut self, op: &Op) -> StepResult {
        match op {
            Op::TagPush(
                TagName::CAPTION
                | TagName::TABLE
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR
                | TagName::TD
                | TagName::TH,
            ) => {
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.reprocess()
            }

            Op::TagPop(
                tag_name @ (TagName::CAPTION
                | TagName::TABLE
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR
                | TagName::TD
                | TagName::TH),
            ) => {
                if !self
                    .state
                    .stack_of_open_elements
                    .has_element_in_table_scope(tag_name)
                {
                    return Ok(true);
                }

                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.reprocess()
            }

            _ => self.step_in_select(op),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intemplate
    pub(super) fn step_in_template(&mut self, op: &Op) -> StepResult {
        let template_mode = match op {
            Op::Token(_) => return self.step_in_body(op),

            Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            )
            | Op::TagPop(TagName::TEMPLATE) => return self.step_in_head(op),

            Op::TagPush(
                TagName::CAPTION
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD,
            ) => InsertionMode::IN_TABLE,

            Op::TagPush(TagName::COL) => InsertionMode::IN_COLUMN_GROUP,

            Op::TagPush(TagName::TR) => InsertionMode::IN_TABLE_BODY,

            Op::TagPush(TagName::TD | TagName::TH) => InsertionMode::IN_ROW,

            Op::TagPush(_) => InsertionMode::IN_BODY,

            Op::TagPop(_) => return Ok(true),
        };

        // > Pop the current template insertion mode off the stack of template
        // > insertion modes. Push the new mode onto the stack of template
        // > insertion modes so that it is the new current template insertion
        // > mode. Switch the insertion mode to the new mode, and reprocess the
        // > token.
        self.state.stack_of_template_insertion_modes.pop();
        self.state
            .stack_of_template_insertion_modes
            .push(template_mode);
        self.state.insertion_mode = template_mode;
        self.reprocess()
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-afterbody
    pub(super) fn step_after_body(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => self.step_in_body(op),

            // > Insert a comment as the last child of the first element in the
            // > stack of open elements (the html element).
            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                bail(UnsupportedException::ContentOutsideOfBody)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPop(TagName::HTML) => {
                // > If the parser was created as part of the HTML fragment
                // > parsing algorithm, this is a parse error; ignore the token.
                if self.context_node.is_some() {
                    return Ok(true);
                }

                self.state.insertion_mode = InsertionMode::AFTER_AFTER_BODY;
                Ok(true)
            }

            _ => {
                self.state.insertion_mode = InsertionMode::IN_BODY;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inframeset
    pub(super) fn step_in_frameset(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => self.step_in_body(op),

            Op::Token(TokenType::Text) => bail(UnsupportedException::NonWhitespaceTextInFrameset),

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPush(TagName::FRAMESET) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::TagPop(TagName::FRAMESET) => {
                // > If the current node is the root html element, then this is
                // > a parse error; ignore the token. (fragment case)
                if self
                    .state
                    .stack_of_open_elements
                    .current_node_is(&TagName::HTML)
                {
                    return Ok(true);
                }

                self.pop();

                if self.context_node.is_none()
                    && !self
                        .state
                        .stack_of_open_elements
                        .current_node_is(&TagName::FRAMESET)
                {
                    self.state.insertion_mode = InsertionMode::AFTER_FRAMESET;
                }
                Ok(true)
            }

            Op::TagPush(TagName::FRAME) => {
                self.insert_current_token();
                self.pop();
                Ok(true)
            }

            Op::TagPush(TagName::NOFRAMES) => self.step_in_head(op),

            _ => Ok(true),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-afterframeset
    pub(super) fn step_after_frameset(&mut self, op: &Op) -> StepResult {
        match op {
            _ if self.is_whitespace_text(op) => self.step_in_body(op),

            Op::Token(TokenType::Text) => {
                bail(UnsupportedException::NonWhitespaceCharsAfterFrameset)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_current_token();
                Ok(true)
            }

            Op::Token(TokenType::Doctype) => Ok(true),

            Op::TagPush(TagName::HTML) => self.step_in_body(op),

            Op::TagPop(TagName::HTML) => {
                self.state.insertion_mode = InsertionMode::AFTER_AFTER_FRAMESET;
                Ok(true)
            }

            Op::TagPush(TagName::NOFRAMES) => self.step_in_head(op),

            _ => Ok(true),
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-after-body-insertion-mode
    pub(super) fn step_after_after_body(&mut self, op: &Op) -> StepResult {
        match op {
            // > Insert a comment as the last child of the Document object.
            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                bail(UnsupportedException::ContentOutsideOfHtml)
            }

            Op::Token(TokenType::Doctype) | Op::TagPush(TagName::HTML) => self.step_in_body(op),

            _ if self.is_whitespace_text(op) => self.step_in_body(op),

            _ => {
                self.state.insertion_mode = InsertionMode::IN_BODY;
                self.reprocess()
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-after-frameset-insertion-mode
    pub(super) fn step_after_after_frameset(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                bail(UnsupportedException::ContentOutsideOfHtml)
            }

            Op::Token(TokenType::Doctype) | Op::TagPush(TagName::HTML) => self.step_in_body(op),

            _ if self.is_whitespace_text(op) => self.step_in_body(op),

            Op::Token(TokenType::Text) => {
                bail(UnsupportedException::NonWhitespaceCharsAfterAfterFrameset)
            }

            Op::TagPush(TagName::NOFRAMES) => self.step_in_head(op),

            _ => Ok(true),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inforeign
    pub(super) fn step_in_foreign_content(&mut self, op: &Op) -> StepResult {
        match op {
            Op::Token(TokenType::Text) => {
                if self.text_node_classification() == TextNodeClassification::Generic {
                    self.state.frameset_ok = false;
                }

                self.insert_foreign_element();
                Ok(true)
            }

            Op::Token(TokenType::CdataSection) => {
                let is_blank = self
                    .tag_processor
                    .get_modifiable_text()
                    .iter()
                    .all(|byte| matches!(byte, b' ' | b'\t' | b'\n' | b'\x0c' | b'\r'));
                if !is_blank {
                    self.state.frameset_ok = false;
                }

                self.insert_foreign_element();
                Ok(true)
            }

            Op::Token(TokenType::Comment | TokenType::FunkyComment | TokenType::PresumptuousTag) => {
                self.insert_foreign_element();
                Ok(true)
            }

            Op::Token(TokenType::Doctype | TokenType::Tag) => Ok(true),

            // > A start tag whose tag name is one of: ... an end tag whose
            // > tag name is "br", "p"
            //
            // > While the current node is not a MathML text integration point,
            // > an HTML integration point, or an element in the HTML namespace,
            // > pop elements from the stack of open elements.
            // > Reprocess the token according to the rules given in the
            // > section corresponding to the current insertion mode in HTML
            // > content.
            Op::TagPush(
                TagName::B
                | TagName::BIG
                | TagName::BLOCKQUOTE
                | TagName::BODY
                | TagName::BR
                | TagName::CENTER
                | TagName::CODE
                | TagName::DD
                | TagName::DIV
                | TagName::DL
                | TagName::DT
                | TagName::EM
                | TagName::EMBED
                | TagName::H1
                | TagName::H2
                | TagName::H3
                | TagName::H4
                | TagName::H5
                | TagName::H6
                | TagName::HEAD
                | TagName::HR
                | TagName::I
                | TagName::IMG
                | TagName::LI
                | TagName::LISTING
                | TagName::MENU
                | TagName::META
                | TagName::NOBR
                | TagName::OL
                | TagName::P
                | TagName::PRE
                | TagName::RUBY
                | TagName::S
                | TagName::SMALL
                | TagName::SPAN
                | TagName::STRONG
                | TagName::STRIKE
                | TagName::SUB
                | TagName::SUP
                | TagName::TABLE
                | TagName::TT
                | TagName::U
                | TagName::UL
                | TagName::VAR,
            )
            | Op::TagPop(TagName::BR | TagName::P) => self.break_out_of_foreign_content(op),

            Op::TagPush(TagName::FONT)
                if [&b"color"[..], &b"face"[..], &b"size"[..]]
                    .iter()
                    .any(|name| self.tag_processor.get_attribute(name).is_some()) =>
            {
                self.break_out_of_foreign_content(op)
            }

            // > Any other start tag
            Op::TagPush(_) => {
                self.insert_foreign_element();

                // > If the token has its self-closing flag set, then run the
                // > appropriate steps from the following list: ... pop the
                // > current node off the stack of open elements and acknowledge
                // > the token's self-closing flag.
                if self
                    .state
                    .current_token
                    .as_ref()
                    .is_some_and(|token| token.has_self_closing_flag)
                {
                    self.pop();
                }
                Ok(true)
            }

            // > An end tag whose name is "script", if the current node is an
            // > SVG script element
            Op::TagPop(TagName::SCRIPT)
                if self
                    .state
                    .stack_of_open_elements
                    .current_node()
                    .is_some_and(|node| {
                        node.namespace == ParsingNamespace::Svg
                            && node.node_name.tag() == Some(&TagName::SCRIPT)
                    }) =>
            {
                self.pop();
                Ok(true)
            }

            // > Any other end tag
            Op::TagPop(tag_name) => {
                let count = self.state.stack_of_open_elements.count();

                for nth in (1..=count).rev() {
                    let Some(node) = self.state.stack_of_open_elements.at(nth).cloned() else {
                        break;
                    };

                    // > If node is not an element in the HTML namespace, return
                    // > to the step labeled loop. Otherwise, process the token
                    // > according to the rules given in the section
                    // > corresponding to the current insertion mode in HTML
                    // > content.
                    if nth != count && node.namespace == ParsingNamespace::Html {
                        return self.step_in_current_insertion_mode(op);
                    }

                    // > If node is the topmost element in the stack of open
                    // > elements, then return. (fragment case)
                    if nth == 1 {
                        return Ok(true);
                    }

                    // > If node's tag name, converted to ASCII lowercase, is the
                    // > same as the tag name of the token, pop elements from the
                    // > stack of open elements until node has been popped from
                    // > the stack, and then return.
                    if node.node_name.tag() == Some(tag_name) {
                        self.pop_until_node(&node);
                        return Ok(true);
                    }
                }

                Ok(true)
            }
        }
    }

    fn break_out_of_foreign_content(&mut self, op: &Op) -> StepResult {
        while let Some(node) = self.state.stack_of_open_elements.current_node() {
            if node.namespace == ParsingNamespace::Html || node.integration_node_type.is_some() {
                break;
            }
            self.pop();
        }

        self.step_in_current_insertion_mode(op)
    }
}
