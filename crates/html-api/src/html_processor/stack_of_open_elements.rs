//! The stack of open elements, root first.
//!
//! @see https://html.spec.whatwg.org/#stack-of-open-elements

use super::html_token::HTMLToken;
use crate::{tag_name::TagName, tag_processor::ParsingNamespace};

/// The element scopes from the tree construction rules.
///
/// A target element is "in scope" when it is found walking up from the
/// current node before any element that terminates the scope.
///
/// @see https://html.spec.whatwg.org/#has-an-element-in-the-specific-scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

impl Scope {
    fn is_terminated_by(self, node: &HTMLToken) -> bool {
        let Some(tag_name) = node.node_name.tag() else {
            return false;
        };

        match self {
            Scope::Default => is_default_scope_boundary(tag_name, node.namespace),
            Scope::ListItem => {
                is_default_scope_boundary(tag_name, node.namespace)
                    || node.is_html_element(&[TagName::OL, TagName::UL])
            }
            Scope::Button => {
                is_default_scope_boundary(tag_name, node.namespace)
                    || node.is_html_element(&[TagName::BUTTON])
            }
            Scope::Table => {
                node.is_html_element(&[TagName::HTML, TagName::TABLE, TagName::TEMPLATE])
            }
            Scope::Select => !node.is_html_element(&[TagName::OPTGROUP, TagName::OPTION]),
        }
    }
}

fn is_default_scope_boundary(tag_name: &TagName, namespace: ParsingNamespace) -> bool {
    match namespace {
        ParsingNamespace::Html => matches!(
            tag_name,
            TagName::APPLET
                | TagName::CAPTION
                | TagName::HTML
                | TagName::TABLE
                | TagName::TD
                | TagName::TH
                | TagName::MARQUEE
                | TagName::OBJECT
                | TagName::TEMPLATE
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
        ParsingNamespace::Svg => {
            matches!(tag_name, TagName::FOREIGNOBJECT | TagName::DESC | TagName::TITLE)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct StackOfOpenElements {
    stack: Vec<HTMLToken>,

    /// Whether a P element is in button scope once the node at the same
    /// index is the current node. Kept in step with `stack`.
    p_in_button_scope: Vec<bool>,
}

impl StackOfOpenElements {
    pub fn push(&mut self, token: HTMLToken) {
        let previous = self.p_in_button_scope.last().copied().unwrap_or(false);
        self.p_in_button_scope
            .push(Self::p_in_button_scope_after(previous, &token));
        self.stack.push(token);
    }

    pub fn pop(&mut self) -> Option<HTMLToken> {
        self.p_in_button_scope.pop();
        self.stack.pop()
    }

    /// Removes a node from anywhere in the stack.
    pub fn remove_node(&mut self, token: &HTMLToken) -> Option<HTMLToken> {
        let index = self.stack.iter().rposition(|node| node.is_same_node(token))?;
        let removed = self.stack.remove(index);

        self.p_in_button_scope.truncate(index);
        let mut previous = self.p_in_button_scope.last().copied().unwrap_or(false);
        for node in &self.stack[index..] {
            previous = Self::p_in_button_scope_after(previous, node);
            self.p_in_button_scope.push(previous);
        }

        Some(removed)
    }

    fn p_in_button_scope_after(previous: bool, pushed: &HTMLToken) -> bool {
        if pushed.is_html_element(&[TagName::P]) {
            true
        } else if Scope::Button.is_terminated_by(pushed) {
            false
        } else {
            previous
        }
    }

    pub fn current_node(&self) -> Option<&HTMLToken> {
        self.stack.last()
    }

    /// Whether the current node is an HTML element with the given name.
    pub fn current_node_is(&self, tag_name: &TagName) -> bool {
        self.current_node()
            .is_some_and(|node| node.is_html_element(std::slice::from_ref(tag_name)))
    }

    pub fn count(&self) -> usize {
        self.stack.len()
    }

    /// Returns the nth node from the root, counting from 1.
    pub fn at(&self, nth: usize) -> Option<&HTMLToken> {
        self.stack.get(nth.checked_sub(1)?)
    }

    /// Whether any HTML element with the given name is open.
    pub fn contains(&self, tag_name: &TagName) -> bool {
        self.stack
            .iter()
            .any(|node| node.is_html_element(std::slice::from_ref(tag_name)))
    }

    pub fn contains_node(&self, token: &HTMLToken) -> bool {
        self.stack.iter().any(|node| node.is_same_node(token))
    }

    /// Root first.
    pub fn walk_down(&self) -> impl DoubleEndedIterator<Item = &HTMLToken> {
        self.stack.iter()
    }

    /// Current node first.
    pub fn walk_up(&self) -> impl DoubleEndedIterator<Item = &HTMLToken> {
        self.stack.iter().rev()
    }

    pub fn has_element_in_specific_scope(&self, tag_name: &TagName, scope: Scope) -> bool {
        self.has_any_in_scope(std::slice::from_ref(tag_name), scope)
    }

    fn has_any_in_scope(&self, tag_names: &[TagName], scope: Scope) -> bool {
        for node in self.walk_up() {
            if node.is_html_element(tag_names) {
                return true;
            }
            if scope.is_terminated_by(node) {
                return false;
            }
        }
        false
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-scope
    pub fn has_element_in_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(tag_name, Scope::Default)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-list-item-scope
    pub fn has_element_in_list_item_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(tag_name, Scope::ListItem)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-table-scope
    pub fn has_element_in_table_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(tag_name, Scope::Table)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-select-scope
    pub fn has_element_in_select_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(tag_name, Scope::Select)
    }

    /// Cached; checked before nearly every block element.
    pub fn has_p_in_button_scope(&self) -> bool {
        self.p_in_button_scope.last().copied().unwrap_or(false)
    }

    pub fn has_any_h1_to_h6_element_in_scope(&self) -> bool {
        self.has_any_in_scope(
            &[
                TagName::H1,
                TagName::H2,
                TagName::H3,
                TagName::H4,
                TagName::H5,
                TagName::H6,
            ],
            Scope::Default,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::{NodeName, TokenType};
    use pretty_assertions::assert_eq;

    fn element(node_id: u32, tag_name: TagName) -> HTMLToken {
        HTMLToken::new(node_id, NodeName::Tag(tag_name), false)
    }

    fn foreign(node_id: u32, tag_name: TagName, namespace: ParsingNamespace) -> HTMLToken {
        let mut token = element(node_id, tag_name);
        token.namespace = namespace;
        token
    }

    fn stack_of(tag_names: &[TagName]) -> StackOfOpenElements {
        let mut stack = StackOfOpenElements::default();
        for (id, tag_name) in tag_names.iter().enumerate() {
            stack.push(element(id as u32, tag_name.clone()));
        }
        stack
    }

    #[test]
    fn p_in_button_scope_follows_pushes_and_pops() {
        let mut stack = stack_of(&[TagName::HTML, TagName::BODY]);
        assert!(!stack.has_p_in_button_scope());

        stack.push(element(2, TagName::P));
        assert!(stack.has_p_in_button_scope());

        stack.push(element(3, TagName::SPAN));
        stack.push(HTMLToken::new(4, NodeName::Token(TokenType::Text), false));
        assert!(stack.has_p_in_button_scope());

        stack.push(element(5, TagName::BUTTON));
        assert!(!stack.has_p_in_button_scope());
        assert!(stack.has_element_in_scope(&TagName::P));

        stack.pop();
        assert!(stack.has_p_in_button_scope());

        stack.pop();
        stack.pop();
        stack.pop();
        assert!(!stack.has_p_in_button_scope());
    }

    #[test]
    fn p_in_button_scope_recomputed_after_removal() {
        let mut stack = stack_of(&[TagName::HTML, TagName::BODY, TagName::P, TagName::FORM]);
        assert!(stack.has_p_in_button_scope());

        let p = element(2, TagName::P);
        assert_eq!(stack.remove_node(&p).map(|node| node.node_id), Some(2));
        assert!(!stack.has_p_in_button_scope());
        assert_eq!(stack.count(), 3);
        assert!(stack.current_node_is(&TagName::FORM));
    }

    #[test]
    fn scopes_stop_at_their_boundaries() {
        let stack = stack_of(&[
            TagName::HTML,
            TagName::BODY,
            TagName::UL,
            TagName::LI,
            TagName::OL,
            TagName::DIV,
        ]);
        assert!(stack.has_element_in_scope(&TagName::LI));
        assert!(!stack.has_element_in_list_item_scope(&TagName::LI));
        assert!(stack.has_element_in_table_scope(&TagName::LI));

        let stack = stack_of(&[TagName::HTML, TagName::BODY, TagName::TABLE, TagName::TD]);
        assert!(!stack.has_element_in_scope(&TagName::TABLE));
        assert!(stack.has_element_in_table_scope(&TagName::TABLE));
        assert!(stack.has_element_in_table_scope(&TagName::TD));

        let stack = stack_of(&[TagName::SELECT, TagName::OPTGROUP, TagName::OPTION]);
        assert!(stack.has_element_in_select_scope(&TagName::SELECT));
        let stack = stack_of(&[TagName::SELECT, TagName::DIV, TagName::OPTION]);
        assert!(!stack.has_element_in_select_scope(&TagName::SELECT));
    }

    #[test]
    fn foreign_elements_only_bound_in_their_namespace() {
        let mut stack = stack_of(&[TagName::HTML, TagName::BODY, TagName::H2]);
        stack.push(foreign(3, TagName::SVG, ParsingNamespace::Svg));
        stack.push(foreign(4, TagName::TITLE, ParsingNamespace::Svg));
        assert!(!stack.has_any_h1_to_h6_element_in_scope());

        let mut stack = stack_of(&[TagName::HTML, TagName::BODY, TagName::H2]);
        stack.push(foreign(3, TagName::MI, ParsingNamespace::Svg));
        assert!(stack.has_any_h1_to_h6_element_in_scope());

        // An SVG element named like an HTML element is not that element.
        let mut stack = stack_of(&[TagName::HTML]);
        stack.push(foreign(1, TagName::P, ParsingNamespace::Svg));
        assert!(!stack.has_p_in_button_scope());
        assert!(!stack.contains(&TagName::P));
    }

    #[test]
    fn positions_count_from_the_root() {
        let stack = stack_of(&[TagName::HTML, TagName::BODY]);
        assert_eq!(stack.at(2).and_then(|node| node.node_name.tag()), Some(&TagName::BODY));
        assert_eq!(stack.at(0), None);
        assert_eq!(stack.at(3), None);
    }
}
