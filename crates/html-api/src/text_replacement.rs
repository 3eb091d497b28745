//! Lexical updates: byte-range replacements and the pure functions that
//! apply them and remap positions through them.

use std::rc::Rc;

use crate::span::HtmlSpan;

/// Replace `length` bytes at `start` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTextReplacement {
    pub start: usize,
    pub length: usize,
    pub text: Rc<[u8]>,
}

impl HtmlTextReplacement {
    pub fn new(start: usize, length: usize, text: impl Into<Rc<[u8]>>) -> Self {
        Self {
            start,
            length,
            text: text.into(),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// How many bytes the document grows (or shrinks) by when applied.
    pub fn delta(&self) -> isize {
        self.text.len() as isize - self.length as isize
    }
}

/// Applies `replacements` to `html` in one pass and returns the new document.
///
/// Replacements are sorted by start, keeping enqueue order among equal starts.
/// Any replacement overlapping an earlier one is dropped. On return the
/// vector holds exactly the applied replacements in application order, ready
/// for [`shift_position`] and [`remap_span`].
pub fn apply_replacements(html: &[u8], replacements: &mut Vec<HtmlTextReplacement>) -> Vec<u8> {
    replacements.sort_by_key(|diff| diff.start);

    let mut copied_until = 0;
    replacements.retain(|diff| {
        if diff.start < copied_until || diff.end() > html.len() {
            log::warn!(
                target: "html_api::text_replacement",
                "Dropping overlapping replacement at {}..{}",
                diff.start,
                diff.end()
            );
            return false;
        }
        copied_until = diff.end();
        true
    });

    let grows_by: isize = replacements.iter().map(HtmlTextReplacement::delta).sum();
    let mut output = Vec::with_capacity(html.len().saturating_add_signed(grows_by));
    let mut bytes_already_copied = 0;

    for diff in replacements.iter() {
        output.extend_from_slice(&html[bytes_already_copied..diff.start]);
        output.extend_from_slice(&diff.text);
        bytes_already_copied = diff.end();
    }
    output.extend_from_slice(&html[bytes_already_copied..]);

    output
}

/// Moves a position by every applied replacement starting before it.
pub fn shift_position(applied: &[HtmlTextReplacement], position: usize) -> usize {
    let delta: isize = applied
        .iter()
        .take_while(|diff| diff.start < position)
        .map(HtmlTextReplacement::delta)
        .sum();
    position.saturating_add_signed(delta)
}

/// Remaps a span through applied replacements.
///
/// Returns `None` when a replacement swallowed the span, meaning the token it
/// referred to no longer exists.
pub fn remap_span(applied: &[HtmlTextReplacement], span: &HtmlSpan) -> Option<HtmlSpan> {
    let span_end = span.end();
    let mut head_delta = 0isize;
    let mut tail_delta = 0isize;

    for diff in applied {
        if span.start < diff.start && span_end < diff.start {
            break;
        }

        if span.start >= diff.start && span_end < diff.end() {
            return None;
        }

        if span.start >= diff.start {
            head_delta += diff.delta();
        }

        if span_end >= diff.end() {
            tail_delta += diff.delta();
        }
    }

    let start = span.start.saturating_add_signed(head_delta);
    let end = span_end.saturating_add_signed(tail_delta).max(start);
    Some(HtmlSpan::new(start, end - start))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn replace(start: usize, length: usize, text: &str) -> HtmlTextReplacement {
        HtmlTextReplacement::new(start, length, text.as_bytes())
    }

    #[test]
    fn applies_in_start_order() {
        let mut updates = vec![replace(5, 3, "there"), replace(0, 5, "Hi")];
        let output = apply_replacements(b"Hello you!", &mut updates);
        assert_eq!(String::from_utf8(output).unwrap(), "Hithereu!");
        assert_eq!(updates[0].start, 0);
    }

    #[test]
    fn equal_starts_keep_enqueue_order() {
        let mut updates = vec![replace(4, 0, " a"), replace(4, 0, " b")];
        let output = apply_replacements(b"<div>", &mut updates);
        assert_eq!(String::from_utf8(output).unwrap(), "<div a b>");
    }

    #[test]
    fn drops_overlapping_replacements() {
        let mut updates = vec![replace(0, 4, "x"), replace(2, 2, "y")];
        let output = apply_replacements(b"abcdef", &mut updates);
        assert_eq!(String::from_utf8(output).unwrap(), "xef");
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn remaps_spans_after_edits() {
        let mut updates = vec![replace(8, 21, ""), replace(30, 7, "")];
        let html = b"<button twenty_one_characters 7_chars></button><button></button>";
        let output = apply_replacements(html, &mut updates);
        let second_button = HtmlSpan::new(47, 8);
        let remapped = remap_span(&updates, &second_button).unwrap();
        assert_eq!(&output[remapped.start..remapped.end()], b"<button>");
        assert_eq!(shift_position(&updates, 47), 19);
    }

    #[test]
    fn swallowed_spans_are_released() {
        let updates = vec![replace(0, 20, "")];
        assert_eq!(remap_span(&updates, &HtmlSpan::new(5, 3)), None);
        assert_eq!(
            remap_span(&updates, &HtmlSpan::new(20, 3)),
            Some(HtmlSpan::new(0, 3))
        );
    }

    /// Splices edits from the back so earlier offsets never move.
    fn splice_from_the_back(html: &[u8], edits: &[HtmlTextReplacement]) -> Vec<u8> {
        let mut output = html.to_vec();
        for diff in edits.iter().rev() {
            output.splice(diff.start..diff.end(), diff.text.iter().copied());
        }
        output
    }

    #[quickcheck]
    fn apply_matches_back_to_front_splicing(html: String, raw_edits: Vec<(u8, u8, String)>) -> bool {
        let html = html.as_bytes();
        let mut edits: Vec<HtmlTextReplacement> = raw_edits
            .into_iter()
            .filter(|_| !html.is_empty())
            .map(|(start, length, text)| {
                let start = start as usize % (html.len() + 1);
                let length = (length as usize).min(html.len() - start);
                HtmlTextReplacement::new(start, length, text.into_bytes())
            })
            .collect();
        edits.sort_by_key(|diff| diff.start);
        let mut last_end = 0;
        edits.retain(|diff| {
            let keep = diff.start >= last_end;
            if keep {
                last_end = diff.end();
            }
            keep
        });

        let expected = splice_from_the_back(html, &edits);
        let mut applied = edits.clone();
        apply_replacements(html, &mut applied) == expected && applied == edits
    }

    #[quickcheck]
    fn no_edits_is_identity(html: Vec<u8>) -> bool {
        apply_replacements(&html, &mut Vec::new()) == html
    }
}
