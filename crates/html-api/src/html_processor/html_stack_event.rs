use super::html_token::HTMLToken;

/// A push or pop on the stack of open elements, queued for `next_token()`.
#[derive(Debug, Clone)]
pub(super) struct HTMLStackEvent {
    pub operation: StackOperation,
    pub token: HTMLToken,
    pub provenance: StackProvenance,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(super) enum StackOperation {
    Push,
    Pop,
}

/// Whether the event corresponds to a token in the input HTML.
///
/// Virtual events come from elements the tree rules imply, such as the
/// TBODY in `<table><tr>`, or from closing elements implicitly.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(super) enum StackProvenance {
    Real,
    Virtual,
}
