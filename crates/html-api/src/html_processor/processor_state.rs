use super::{
    active_formatting_elements::ActiveFormattingElements, html_token::HTMLToken,
    insertion_mode::InsertionMode, stack_of_open_elements::StackOfOpenElements,
    EncodingConfidence,
};

/// Tree construction state of the HTML Processor.
///
/// @see https://html.spec.whatwg.org/#parse-state
#[derive(Debug, Clone)]
pub(super) struct ProcessorState {
    pub(super) stack_of_open_elements: StackOfOpenElements,
    pub(super) active_formatting_elements: ActiveFormattingElements,
    pub(super) stack_of_template_insertion_modes: Vec<InsertionMode>,
    pub(super) insertion_mode: InsertionMode,

    /// @see https://html.spec.whatwg.org/#head-element-pointer
    pub(super) head_element: Option<HTMLToken>,

    /// @see https://html.spec.whatwg.org/#form-element-pointer
    pub(super) form_element: Option<HTMLToken>,

    /// The token being processed, with its namespace adjusted for insertion.
    pub(super) current_token: Option<HTMLToken>,

    /// @see https://html.spec.whatwg.org/#frameset-ok-flag
    pub(super) frameset_ok: bool,

    pub(super) encoding: Box<str>,
    pub(super) encoding_confidence: EncodingConfidence,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self {
            stack_of_open_elements: StackOfOpenElements::default(),
            active_formatting_elements: ActiveFormattingElements::default(),
            stack_of_template_insertion_modes: Vec::new(),
            insertion_mode: InsertionMode::INITIAL,
            head_element: None,
            form_element: None,
            current_token: None,
            frameset_ok: true,
            encoding: "UTF-8".into(),
            encoding_confidence: EncodingConfidence::Tentative,
        }
    }
}
