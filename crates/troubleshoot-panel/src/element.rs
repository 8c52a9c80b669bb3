//! Element construction and the panel's element tree.
//!
//! [`Element`] is an owned, detached value built in one call (or with the
//! chaining builder). [`Document`] is the live tree the panel renders; it
//! stores nodes in an arena and hands out [`NodeId`] handles so owners can
//! keep explicit references to the regions they mutate.

/// Element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Body,
    Div,
    Section,
    Footer,
    Paragraph,
    Button,
    TextArea,
}

/// A detached element and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub classes: Vec<String>,
    pub id: Option<String>,
    /// Pre-rendered markup or label, inserted verbatim.
    pub content: Option<String>,
    /// Current value of an editable control.
    pub value: String,
    pub disabled: bool,
    pub hidden: bool,
    pub children: Vec<Element>,
}

/// Build an element with classes, an optional identifier and ordered children.
pub fn element(tag: Tag, classes: &[&str], id: Option<&str>, children: Vec<Element>) -> Element {
    Element {
        tag,
        classes: classes.iter().map(|c| (*c).to_string()).collect(),
        id: id.map(str::to_string),
        content: None,
        value: String::new(),
        disabled: false,
        hidden: false,
        children,
    }
}

impl Element {
    /// Create an element with no classes, identifier or children.
    pub fn new(tag: Tag) -> Self {
        element(tag, &[], None, Vec::new())
    }

    /// Add a class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set the identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the verbatim content.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// Handle to a node in a [`Document`].
///
/// Handles are never reused, so a handle to a removed node stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node attached to a [`Document`].
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: Tag,
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub content: Option<String>,
    pub value: String,
    pub disabled: bool,
    pub hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Parent handle, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Check whether the node carries a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Live element tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only an empty body.
    pub fn new() -> Self {
        let body = Node {
            tag: Tag::Body,
            classes: Vec::new(),
            id: None,
            content: None,
            value: String::new(),
            disabled: false,
            hidden: false,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(body)],
            root: NodeId(0),
        }
    }

    /// Create a document whose body contains one empty anchor with the given id.
    pub fn with_anchor(id: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.append(root, Element::new(Tag::Div).id(id));
        doc
    }

    /// The body node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node, `None` if it was removed.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Child handles of a node (empty for removed nodes).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Node::children)
    }

    /// Number of nodes currently attached, including the body.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Find the first attached node with the given identifier (depth-first).
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if node.id.as_deref() == Some(id) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Attach an element subtree as the last child of `parent`.
    ///
    /// Returns the handle of the new subtree root, or `None` if `parent`
    /// is no longer attached.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Option<NodeId> {
        self.get(parent)?;
        let Element {
            tag,
            classes,
            id,
            content,
            value,
            disabled,
            hidden,
            children,
        } = element;

        let handle = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            tag,
            classes,
            id,
            content,
            value,
            disabled,
            hidden,
            parent: Some(parent),
            children: Vec::with_capacity(children.len()),
        }));
        self.get_mut(parent)?.children.push(handle);

        for child in children {
            self.append(handle, child);
        }
        Some(handle)
    }

    /// Detach and drop every child of `parent`, recursively.
    pub fn clear_children(&mut self, parent: NodeId) {
        let Some(node) = self.get_mut(parent) else {
            return;
        };
        let mut stack = std::mem::take(&mut node.children);
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(removed.children);
            }
        }
    }

    /// Add a class to a node. No-op if already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    /// Remove a class from a node.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            node.classes.retain(|c| c != class);
        }
    }

    /// Check whether a node carries a class. False for removed nodes.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.has_class(class))
    }

    /// Enable or disable a control.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(node) = self.get_mut(id) {
            node.disabled = disabled;
        }
    }

    /// Show or hide a node.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.get_mut(id) {
            node.hidden = hidden;
        }
    }

    /// Set the value of an editable control.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.value = value.into();
        }
    }

    /// Concatenated content of a node and its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        if let Some(content) = &node.content {
            out.push_str(content);
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builds_classes_id_and_children_in_order() {
        let el = element(
            Tag::Div,
            &["turn", "feedback"],
            Some("t1"),
            vec![
                Element::new(Tag::Button).content("Yes"),
                Element::new(Tag::Button).content("No"),
            ],
        );
        assert_eq!(el.classes, vec!["turn", "feedback"]);
        assert_eq!(el.id.as_deref(), Some("t1"));
        assert_eq!(el.children[0].content.as_deref(), Some("Yes"));
        assert_eq!(el.children[1].content.as_deref(), Some("No"));
    }

    #[test]
    fn test_builder_dedupes_classes() {
        let el = Element::new(Tag::Div).class("a").class("a").class("b");
        assert_eq!(el.classes, vec!["a", "b"]);
    }

    #[test]
    fn test_append_and_find_by_id() {
        let mut doc = Document::with_anchor("root");
        let anchor = doc.find_by_id("root").unwrap();
        let region = doc
            .append(
                anchor,
                Element::new(Tag::Section)
                    .id("conversation")
                    .child(Element::new(Tag::Div).id("first")),
            )
            .unwrap();

        assert_eq!(doc.find_by_id("conversation"), Some(region));
        let first = doc.find_by_id("first").unwrap();
        assert_eq!(doc.get(first).unwrap().parent(), Some(region));
        assert_eq!(doc.children(region), &[first]);
    }

    #[test]
    fn test_node_count_includes_body() {
        assert_eq!(Document::new().node_count(), 1);
        assert_eq!(Document::with_anchor("root").node_count(), 2);
    }

    #[test]
    fn test_clear_children_drops_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let region = doc.append(root, Element::new(Tag::Div)).unwrap();
        let child = doc
            .append(
                region,
                Element::new(Tag::Div).child(Element::new(Tag::Button).id("deep")),
            )
            .unwrap();
        assert_eq!(doc.node_count(), 4);

        doc.clear_children(region);

        assert!(doc.children(region).is_empty());
        assert!(doc.get(child).is_none());
        assert!(doc.find_by_id("deep").is_none());
        assert_eq!(doc.node_count(), 2);
        // Stale handles are inert
        doc.add_class(child, "x");
        assert!(!doc.has_class(child, "x"));
        assert!(doc.append(child, Element::new(Tag::Div)).is_none());
    }

    #[test]
    fn test_class_and_flag_mutation() {
        let mut doc = Document::new();
        let root = doc.root();
        let button = doc.append(root, Element::new(Tag::Button)).unwrap();

        doc.add_class(button, "selected");
        doc.add_class(button, "selected");
        assert_eq!(doc.get(button).unwrap().classes, vec!["selected"]);
        doc.remove_class(button, "selected");
        assert!(!doc.has_class(button, "selected"));

        doc.set_disabled(button, true);
        doc.set_hidden(button, true);
        doc.set_value(button, "typed");
        let node = doc.get(button).unwrap();
        assert!(node.disabled);
        assert!(node.hidden);
        assert_eq!(node.value, "typed");
    }

    #[test]
    fn test_text_content_in_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let pair = doc
            .append(
                root,
                Element::new(Tag::Div)
                    .content("Q: ")
                    .child(Element::new(Tag::Button).content("Yes"))
                    .child(Element::new(Tag::Button).content("/No")),
            )
            .unwrap();
        assert_eq!(doc.text_content(pair), "Q: Yes/No");
    }
}
