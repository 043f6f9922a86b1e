//! Mutable element tree for a document part.
//!
//! Field transformation needs parent/sibling navigation, element identity and
//! removal, so the main document part is loaded into an arena of nodes
//! addressed by [`NodeId`]. Text and attribute values are kept in their
//! escaped source form and written back verbatim, so untouched markup
//! round-trips unchanged.
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Identity of a node within one [`XmlTree`].
///
/// Ids stay valid after a node is detached; a detached node simply no longer
/// has a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element's qualified name and attributes.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    /// `(qualified name, escaped value)` in source order
    attributes: SmallVec<[(String, String); 4]>,
}

impl Element {
    /// Qualified name, e.g. `w:fldChar`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix, e.g. `fldChar`.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Raw value of the first attribute whose local name matches.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local_name)
            .map(|(_, value)| value.as_str())
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = SmallVec::new();
        for attr in e.attributes() {
            let attr = attr?;
            attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ));
        }
        Ok(Self { name, attributes })
    }
}

#[inline]
fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// What a node holds. Text-like payloads are stored escaped, as in the source.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The synthetic root that owns the prolog and the document element
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position in the parent's `children` while attached
    slot: usize,
}

/// Arena-backed XML tree.
///
/// # Examples
///
/// ```
/// use mergefields::ooxml::docx::XmlTree;
///
/// let mut tree = XmlTree::parse(b"<w:p><w:r><w:t>a</w:t></w:r><w:r/></w:p>")?;
/// let p = tree.document_element().unwrap();
/// let first = tree.first_child_named(p, "r").unwrap();
/// let second = tree.next_element_sibling(first).unwrap();
/// tree.detach(first);
/// assert_eq!(tree.first_child_named(p, "r"), Some(second));
/// assert_eq!(tree.to_xml(), "<w:p><w:r/></w:p>");
/// # Ok::<(), mergefields::OoxmlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    modified: bool,
}

impl XmlTree {
    /// Parse a complete XML document.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut tree = Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                slot: 0,
            }],
            modified: false,
        };
        let root = tree.root();
        tree.parse_into(root, xml)?;
        Ok(tree)
    }

    /// Parse `xml` and append the resulting top-level nodes to `parent`.
    ///
    /// The fragment may use any namespace prefix; prefixes are not resolved.
    pub fn append_fragment(&mut self, parent: NodeId, xml: &str) -> Result<Vec<NodeId>> {
        let appended = self.parse_into(parent, xml.as_bytes())?;
        self.modified = true;
        Ok(appended)
    }

    fn parse_into(&mut self, parent: NodeId, xml: &[u8]) -> Result<Vec<NodeId>> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::with_capacity(1024);
        let mut stack: Vec<NodeId> = vec![parent];
        let mut top_level = Vec::new();

        loop {
            let current = *stack.last().unwrap_or(&parent);
            buf.clear();
            let event = reader.read_event_into(&mut buf)?;
            let kind = match event {
                Event::Start(e) => {
                    let id = self.push(current, NodeKind::Element(Element::from_start(&e)?));
                    if stack.len() == 1 {
                        top_level.push(id);
                    }
                    stack.push(id);
                    continue;
                },
                Event::End(_) => {
                    if stack.len() == 1 {
                        return Err(OoxmlError::Xml("unexpected closing tag".to_string()));
                    }
                    stack.pop();
                    continue;
                },
                Event::Empty(e) => NodeKind::Element(Element::from_start(&e)?),
                Event::Text(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.push_text(current, &text, &mut top_level, stack.len() == 1);
                    continue;
                },
                Event::GeneralRef(e) => {
                    let text = format!("&{};", String::from_utf8_lossy(&e));
                    self.push_text(current, &text, &mut top_level, stack.len() == 1);
                    continue;
                },
                Event::CData(e) => NodeKind::CData(String::from_utf8_lossy(&e).into_owned()),
                Event::Comment(e) => NodeKind::Comment(String::from_utf8_lossy(&e).into_owned()),
                Event::PI(e) => {
                    NodeKind::ProcessingInstruction(String::from_utf8_lossy(&e).into_owned())
                },
                Event::Decl(e) => NodeKind::Declaration(String::from_utf8_lossy(&e).into_owned()),
                Event::DocType(e) => NodeKind::DocType(String::from_utf8_lossy(&e).into_owned()),
                Event::Eof => break,
            };
            let id = self.push(current, kind);
            if stack.len() == 1 {
                top_level.push(id);
            }
        }

        if stack.len() != 1 {
            return Err(OoxmlError::Xml("unclosed element at end of input".to_string()));
        }
        Ok(top_level)
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let slot = self.nodes[parent.index()].children.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            slot,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Append text, merging into a preceding text node so entity references
    /// stay part of the surrounding text.
    fn push_text(&mut self, parent: NodeId, text: &str, top_level: &mut Vec<NodeId>, top: bool) {
        if let Some(&last) = self.nodes[parent.index()].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.index()].kind {
                existing.push_str(text);
                return;
            }
        }
        let id = self.push(parent, NodeKind::Text(text.to_string()));
        if top {
            top_level.push(id);
        }
    }

    /// The synthetic document node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The outermost element (e.g. `w:document`).
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).next()
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::local_name)
    }

    /// Whether `id` is an element with the given local name.
    #[inline]
    pub fn is_named(&self, id: NodeId, local_name: &str) -> bool {
        self.local_name(id) == Some(local_name)
    }

    pub fn attribute(&self, id: NodeId, local_name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute(local_name))
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        local_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.is_named(child, local_name))
    }

    pub fn first_child_named(&self, id: NodeId, local_name: &str) -> Option<NodeId> {
        self.children_named(id, local_name).next()
    }

    /// Next sibling that is an element; text, comments and PIs are skipped.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let slot = self.nodes[id.index()].slot;
        self.children(parent)[slot + 1..]
            .iter()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// All descendant elements with the given local name, in document order.
    pub fn descendants_named(&self, id: NodeId, local_name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_named(node, local_name) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    /// Unescaped text of all descendant text and CDATA nodes.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text(raw) => out.push_str(&unescape_lossy(raw)),
                NodeKind::CData(raw) => out.push_str(raw),
                NodeKind::Element(_) => self.collect_text(child, out),
                _ => {},
            }
        }
    }

    /// Remove `id` from its parent. Returns `false` if it was already detached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.index()].parent.take() else {
            return false;
        };
        let slot = self.nodes[id.index()].slot;
        self.nodes[parent.index()].children.remove(slot);
        for i in slot..self.nodes[parent.index()].children.len() {
            let sibling = self.nodes[parent.index()].children[i];
            self.nodes[sibling.index()].slot = i;
        }
        self.modified = true;
        true
    }

    /// Detach every child except elements whose local name is in `keep`.
    pub fn clear_children_except(&mut self, id: NodeId, keep: &[&str]) -> usize {
        let doomed: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&child| !self.local_name(child).is_some_and(|name| keep.contains(&name)))
            .collect();
        for &child in &doomed {
            self.detach(child);
        }
        doomed.len()
    }

    /// Whether any mutation happened since parsing.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Serialize the whole tree.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 32);
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize a single node and its subtree.
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            },
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in &element.attributes {
                    let quote = if value.contains('"') { '\'' } else { '"' };
                    out.push(' ');
                    out.push_str(key);
                    out.push('=');
                    out.push(quote);
                    out.push_str(value);
                    out.push(quote);
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            },
            NodeKind::Text(raw) => out.push_str(raw),
            NodeKind::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            },
            NodeKind::Comment(raw) => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            },
            NodeKind::ProcessingInstruction(raw) | NodeKind::Declaration(raw) => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            },
            NodeKind::DocType(raw) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(raw);
                out.push('>');
            },
        }
    }
}

fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    unescape(raw).unwrap_or(Cow::Borrowed(raw))
}
