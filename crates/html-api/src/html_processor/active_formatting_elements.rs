use super::html_token::HTMLToken;
use crate::tag_name::TagName;

/// The list of active formatting elements.
///
/// > The list contains elements in the formatting category, and markers.
/// > The markers are inserted when entering applet, object, marquee,
/// > template, td, th, and caption elements, and are used to prevent
/// > formatting from "leaking" into applet, object, marquee, template,
/// > td, th, and caption elements.
///
/// @see https://html.spec.whatwg.org/#list-of-active-formatting-elements
#[derive(Debug, Clone, Default)]
pub(super) struct ActiveFormattingElements {
    entries: Vec<ActiveFormattingElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ActiveFormattingElement {
    Token(HTMLToken),
    Marker,
}

impl ActiveFormattingElements {
    /// @see https://html.spec.whatwg.org/#concept-parser-marker
    pub fn insert_marker(&mut self) {
        self.entries.push(ActiveFormattingElement::Marker);
    }

    /// @see https://html.spec.whatwg.org/#push-onto-the-list-of-active-formatting-elements
    pub fn push(&mut self, token: HTMLToken) {
        self.entries.push(ActiveFormattingElement::Token(token));
    }

    /// Removes entries until a marker has been removed, or the list is empty.
    ///
    /// @see https://html.spec.whatwg.org/#clear-the-list-of-active-formatting-elements-up-to-the-last-marker
    pub fn clear_up_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if entry == ActiveFormattingElement::Marker {
                break;
            }
        }
    }

    /// Most recently added entry.
    pub fn current_node(&self) -> Option<&ActiveFormattingElement> {
        self.entries.last()
    }

    /// Entries from the most recently added back to the first, markers included.
    pub fn walk_up(&self) -> impl Iterator<Item = &ActiveFormattingElement> {
        self.entries.iter().rev()
    }

    /// Returns the latest element named `tag_name` added after the last marker.
    pub fn last_after_marker(&self, tag_name: &TagName) -> Option<&HTMLToken> {
        self.walk_up()
            .map_while(|entry| match entry {
                ActiveFormattingElement::Token(token) => Some(token),
                ActiveFormattingElement::Marker => None,
            })
            .find(|token| token.node_name.tag() == Some(tag_name))
    }

    pub fn remove_node(&mut self, token: &HTMLToken) -> bool {
        let position = self.entries.iter().rposition(|entry| {
            matches!(entry, ActiveFormattingElement::Token(node) if node.is_same_node(token))
        });

        match position {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains_node(&self, token: &HTMLToken) -> bool {
        self.entries.iter().any(
            |entry| matches!(entry, ActiveFormattingElement::Token(node) if node.is_same_node(token)),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::NodeName;
    use pretty_assertions::assert_eq;

    fn element(node_id: u32, tag_name: TagName) -> HTMLToken {
        HTMLToken::new(node_id, NodeName::Tag(tag_name), false)
    }

    #[test]
    fn clears_up_to_the_last_marker() {
        let mut list = ActiveFormattingElements::default();
        list.push(element(1, TagName::B));
        list.insert_marker();
        list.push(element(2, TagName::I));
        list.push(element(3, TagName::U));
        assert_eq!(list.entries.len(), 4);

        list.clear_up_to_last_marker();
        assert_eq!(list.entries.len(), 1);
        assert_eq!(
            list.current_node(),
            Some(&ActiveFormattingElement::Token(element(1, TagName::B)))
        );
    }

    #[test]
    fn lookups_stop_at_markers() {
        let mut list = ActiveFormattingElements::default();
        list.push(element(1, TagName::A));
        list.insert_marker();
        list.push(element(2, TagName::B));

        assert_eq!(list.last_after_marker(&TagName::A), None);
        assert_eq!(
            list.last_after_marker(&TagName::B).map(|token| token.node_id),
            Some(2)
        );
        assert!(list.contains_node(&element(1, TagName::A)));
    }

    #[test]
    fn removes_by_node_identity() {
        let mut list = ActiveFormattingElements::default();
        list.push(element(1, TagName::B));
        list.push(element(2, TagName::B));

        assert!(list.remove_node(&element(1, TagName::B)));
        assert!(!list.remove_node(&element(1, TagName::B)));
        assert!(list.contains_node(&element(2, TagName::B)));
        assert_eq!(list.entries.len(), 1);
    }
}
