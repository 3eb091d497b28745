use crate::{tag_name::TagName, tag_processor::ParsingNamespace, token::NodeName};

/// A node the HTML Processor tracks on its stacks.
///
/// Nodes are identified by `node_id`, the index of the internal bookmark
/// created for the token they came from. Two clones of a node compare equal
/// through `is_same_node()` regardless of later namespace adjustments.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HTMLToken {
    /// Internal bookmark index of the source token.
    ///
    /// Having an id does not imply the bookmark still exists; it is released
    /// once the node is popped, or when an edit replaces its token.
    pub(crate) node_id: u32,

    /// Set only on the synthetic HTML root of a fragment parser.
    pub(crate) is_root_node: bool,

    /// Uppercase tag name for elements, otherwise the token type.
    pub node_name: NodeName,

    /// Whether the source token carried the self-closing flag, valid or not.
    ///
    /// @see https://html.spec.whatwg.org/#self-closing-flag
    pub has_self_closing_flag: bool,

    pub namespace: ParsingNamespace,

    /// Which kind of integration point the element is, if any.
    pub integration_node_type: Option<IntegrationNodeType>,
}

impl HTMLToken {
    pub fn new(node_id: u32, node_name: NodeName, has_self_closing_flag: bool) -> Self {
        Self {
            node_id,
            is_root_node: false,
            node_name,
            has_self_closing_flag,
            namespace: ParsingNamespace::Html,
            integration_node_type: None,
        }
    }

    pub fn is_same_node(&self, other: &HTMLToken) -> bool {
        self.node_id == other.node_id
    }

    /// Whether this is an HTML element with one of the given names.
    pub fn is_html_element(&self, tag_names: &[TagName]) -> bool {
        self.namespace == ParsingNamespace::Html
            && self
                .node_name
                .tag()
                .is_some_and(|tag_name| tag_names.contains(tag_name))
    }
}

/// @see https://html.spec.whatwg.org/#html-integration-point
/// @see https://html.spec.whatwg.org/#mathml-text-integration-point
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IntegrationNodeType {
    HTML,
    MathML,
}
