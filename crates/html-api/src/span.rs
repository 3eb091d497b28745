/// A byte range into the processor's current HTML buffer.
///
/// Spans are plain offsets: they stay meaningful only until pending edits are
/// applied, at which point the owning processor remaps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HtmlSpan {
    pub start: usize,
    pub length: usize,
}

impl HtmlSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Byte offset just past the end of the span.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}
