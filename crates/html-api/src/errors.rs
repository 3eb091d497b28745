use thiserror::Error;

/// Why the HTML Processor stopped.
///
/// Once a step fails, the error is kept as the processor's last error and
/// every later step refuses to run.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HtmlProcessorError {
    #[error("exceeded the maximum number of bookmarks")]
    ExceededMaxBookmarks,

    #[error("unsupported: {0}")]
    Unsupported(#[from] UnsupportedException),

    #[error("cannot bookmark the current token")]
    CannotBookmarkToken,
}

/// Markup the HTML Processor recognizes but cannot process.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsupportedException {
    #[error("Cannot yet process META tags with charset to determine encoding.")]
    MetaTagCharsetDetermineEncoding,

    #[error("Cannot yet process META tags with http-equiv Content-Type to determine encoding.")]
    MetaTagHttpEquivDetermineEncoding,

    #[error("Cannot process elements after HEAD which reopen the HEAD element.")]
    AfterHeadElementsReopenHead,

    #[error("Cannot process non-ignored FRAMESET tags.")]
    CannotProcessNonIgnoredFrameset,

    #[error("Cannot process PLAINTEXT elements.")]
    CannotProcessPlaintextElements,

    #[error("Foster parenting is not supported.")]
    FosterParenting,

    #[error("Content outside of BODY is unsupported.")]
    ContentOutsideOfBody,

    #[error("Content outside of HTML is unsupported.")]
    ContentOutsideOfHtml,

    #[error("Cannot reconstruct active formatting elements when advancing and rewinding is required.")]
    ActiveFormattingElementsWhenAdvancingAndRewindingIsRequired,

    #[error("Cannot run adoption agency when \"any other end tag\" is required.")]
    AdoptionAgencyWhenAnyOtherEndTagIsRequired,

    #[error("Cannot extract common ancestor in adoption agency algorithm.")]
    AdoptionAgencyCannotExtractCommonAncestor,

    #[error("Cannot run adoption agency when looping required.")]
    AdoptionAgencyWhenLoopingRequired,

    #[error("Non-whitespace characters cannot be handled in frameset.")]
    NonWhitespaceTextInFrameset,

    #[error("Non-whitespace characters cannot be handled in after frameset.")]
    NonWhitespaceCharsAfterFrameset,

    #[error("Non-whitespace characters cannot be handled in after after frameset.")]
    NonWhitespaceCharsAfterAfterFrameset,

    #[error("Cannot close a FORM when other elements remain open as this would throw off the breadcrumbs for the following tokens.")]
    CannotCloseFormWithOtherElementsOpen,
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookmarkError {
    #[error("no token to bookmark")]
    NoToken,

    #[error("too many bookmarks; release some before adding more")]
    Exhausted,

    #[error("unknown bookmark")]
    NotFound,

    #[error("virtual tokens cannot be bookmarked")]
    VirtualToken,
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializeError {
    #[error("cannot serialize a processor that has already started")]
    AlreadyStarted,

    #[error("cannot parse with the given fragment context")]
    InvalidContext,

    #[error(transparent)]
    Unsupported(#[from] HtmlProcessorError),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unsupported_errors_explain_the_construct() {
        let error: HtmlProcessorError = UnsupportedException::FosterParenting.into();
        assert_eq!(
            error.to_string(),
            "unsupported: Foster parenting is not supported."
        );

        let error: SerializeError = error.into();
        assert_eq!(
            error.to_string(),
            "unsupported: Foster parenting is not supported."
        );
    }
}
