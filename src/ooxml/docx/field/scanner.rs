//! Discovery of complex fields.
//!
//! A complex field is spread over sibling runs:
//!
//! ```xml
//! <w:r><w:fldChar w:fldCharType="begin"/></w:r>
//! <w:r><w:instrText> INCLUDEPICTURE "logo.png" </w:instrText></w:r>
//! <w:r><w:fldChar w:fldCharType="separate"/></w:r>
//! <w:r><w:t>cached result</w:t></w:r>
//! <w:r><w:fldChar w:fldCharType="end"/></w:r>
//! ```
//!
//! Fields nest, and a field may continue into following paragraphs. All
//! begin markers of the document go into one worklist in document order.
//! Scanning a field pops its own begin marker, and a nested field found
//! during the walk pops the next one from the same worklist, so the worklist
//! always holds exactly the markers not yet attached to a field.
use super::error::{FieldError, Result};
use crate::ooxml::docx::xml_tree::{NodeId, XmlTree};
use std::collections::VecDeque;
use tracing::trace;

/// Text standing in for a nested field inside an instruction.
pub const NESTED_FIELD_PLACEHOLDER: &str = "{FIELD}";

/// The kind of `w:fldChar` marker a run carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChar {
    Begin,
    Separate,
    End,
}

impl FieldChar {
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "begin" => Some(Self::Begin),
            "separate" => Some(Self::Separate),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

/// Marker carried by the first `w:fldChar` child of `element`.
pub fn field_char(tree: &XmlTree, element: NodeId) -> Option<FieldChar> {
    let fld_char = tree.first_child_named(element, "fldChar")?;
    FieldChar::from_attr(tree.attribute(fld_char, "fldCharType")?)
}

/// Runs under `root` that hold a begin marker, in document order.
pub fn begin_markers(tree: &XmlTree, root: NodeId) -> Vec<NodeId> {
    tree.descendants_named(root, "r")
        .into_iter()
        .filter(|&run| {
            tree.children_named(run, "fldChar")
                .any(|c| tree.attribute(c, "fldCharType") == Some("begin"))
        })
        .collect()
}

/// The element a field walk visits after `current`.
///
/// That is the next element sibling, or else the first run of the next
/// container after the parent that has one. Containers without direct runs,
/// such as tables, are stepped over.
pub fn next_field_element(tree: &XmlTree, current: NodeId) -> Option<NodeId> {
    if let Some(next) = tree.next_element_sibling(current) {
        return Some(next);
    }
    let mut container = tree.parent(current)?;
    loop {
        container = tree.next_element_sibling(container)?;
        if let Some(run) = tree.first_child_named(container, "r") {
            return Some(run);
        }
    }
}

/// Instruction text carried by `elements`.
///
/// Concatenates the `w:instrText` children of each element. The end marker
/// of a nested field contributes [`NESTED_FIELD_PLACEHOLDER`].
pub fn instruction_text(tree: &XmlTree, elements: &[NodeId]) -> String {
    let mut text = String::new();
    for &element in elements {
        if field_char(tree, element) == Some(FieldChar::End) {
            text.push_str(NESTED_FIELD_PLACEHOLDER);
            continue;
        }
        for instr in tree.children_named(element, "instrText") {
            text.push_str(&tree.text(instr));
        }
    }
    text
}

/// The elements making up one complex field.
///
/// `all_elements` starts with the begin marker and ends with the end marker.
/// `instr_elements` and `show_elements` are the disjoint parts before and
/// after the separator. Markers are in neither, except that a nested field
/// is represented in the enclosing part by its end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    parent: NodeId,
    is_nested: bool,
    contains_nested: bool,
    all_elements: Vec<NodeId>,
    instr_elements: Vec<NodeId>,
    show_elements: Vec<NodeId>,
}

impl FieldRecord {
    /// Parent of the begin marker, normally the paragraph.
    #[inline]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.is_nested
    }

    #[inline]
    pub fn contains_nested(&self) -> bool {
        self.contains_nested
    }

    #[inline]
    pub fn all_elements(&self) -> &[NodeId] {
        &self.all_elements
    }

    #[inline]
    pub fn instr_elements(&self) -> &[NodeId] {
        &self.instr_elements
    }

    #[inline]
    pub fn show_elements(&self) -> &[NodeId] {
        &self.show_elements
    }

    #[inline]
    pub fn begin(&self) -> NodeId {
        self.all_elements[0]
    }

    #[inline]
    pub fn end(&self) -> NodeId {
        self.all_elements[self.all_elements.len() - 1]
    }
}

/// Walks every complex field of a tree.
///
/// Records come out in begin-marker order, so an enclosing field precedes
/// the fields nested in it.
///
/// # Examples
///
/// ```
/// use mergefields::ooxml::docx::XmlTree;
/// use mergefields::FieldScanner;
///
/// let tree = XmlTree::parse(br#"<w:p>
///   <w:r><w:fldChar w:fldCharType="begin"/></w:r>
///   <w:r><w:instrText>PAGE</w:instrText></w:r>
///   <w:r><w:fldChar w:fldCharType="end"/></w:r>
/// </w:p>"#)?;
/// let records = FieldScanner::new(&tree, tree.root()).scan_all()?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].all_elements().len(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FieldScanner<'t> {
    tree: &'t XmlTree,
    pending: VecDeque<NodeId>,
    /// Reserved when a scan starts so nested records land after their parent
    records: Vec<Option<FieldRecord>>,
}

impl<'t> FieldScanner<'t> {
    /// Scanner over every begin marker below `root`.
    pub fn new(tree: &'t XmlTree, root: NodeId) -> Self {
        Self::with_begin_markers(tree, begin_markers(tree, root))
    }

    /// Scanner over an explicit worklist of begin-marker runs.
    pub fn with_begin_markers(tree: &'t XmlTree, markers: impl IntoIterator<Item = NodeId>) -> Self {
        let pending: VecDeque<NodeId> = markers.into_iter().collect();
        Self {
            tree,
            records: Vec::with_capacity(pending.len()),
            pending,
        }
    }

    /// Begin markers not yet attached to a field.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drain the worklist.
    pub fn scan_all(mut self) -> Result<Vec<FieldRecord>> {
        while !self.pending.is_empty() {
            self.scan(false)?;
        }
        Ok(self.records.into_iter().flatten().collect())
    }

    /// Scan the field at the front of the worklist and return its end marker.
    fn scan(&mut self, nested: bool) -> Result<NodeId> {
        let tree = self.tree;
        let begin = self.pending.pop_front().ok_or(FieldError::WorklistOutOfOrder)?;
        let slot = self.records.len();
        self.records.push(None);

        let parent = tree.parent(begin).unwrap_or_else(|| tree.root());
        let mut all_elements = vec![begin];
        let mut instr_elements = Vec::new();
        let mut show_elements = Vec::new();
        let mut in_show = false;
        let mut contains_nested = false;
        let mut current = begin;

        let end = loop {
            let Some(next) = next_field_element(tree, current) else {
                return Err(FieldError::Unterminated {
                    instruction: instruction_text(tree, &instr_elements),
                });
            };

            let visited = match field_char(tree, next) {
                Some(FieldChar::Begin) => {
                    if self.pending.front() != Some(&next) {
                        return Err(FieldError::WorklistOutOfOrder);
                    }
                    contains_nested = true;
                    self.scan(true)?
                },
                Some(FieldChar::Separate) => {
                    in_show = true;
                    all_elements.push(next);
                    current = next;
                    continue;
                },
                Some(FieldChar::End) => {
                    all_elements.push(next);
                    break next;
                },
                None if tree.is_named(next, "fldSimple") => {
                    return Err(FieldError::NestedSimpleField);
                },
                None => next,
            };

            if in_show {
                show_elements.push(visited);
            } else {
                instr_elements.push(visited);
            }
            all_elements.push(visited);
            current = visited;
        };

        trace!(
            begin = %begin,
            nested,
            contains_nested,
            elements = all_elements.len(),
            "scanned field"
        );
        self.records[slot] = Some(FieldRecord {
            parent,
            is_nested: nested,
            contains_nested,
            all_elements,
            instr_elements,
            show_elements,
        });
        Ok(end)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn scan(body: &str) -> (XmlTree, Result<Vec<FieldRecord>>) {
        let tree = XmlTree::parse(document(body).as_bytes()).unwrap();
        let records = FieldScanner::new(&tree, tree.root()).scan_all();
        (tree, records)
    }

    #[test]
    fn test_simple_field() {
        let body = format!("<w:p>{}{}</w:p>", text("before "), field(r#" INCLUDEPICTURE "a.png" "#, "old"));
        let (tree, records) = scan(&body);
        let records = records.unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert!(!record.is_nested());
        assert!(!record.contains_nested());
        assert!(tree.is_named(record.parent(), "p"));
        assert_eq!(record.all_elements().len(), 5);
        assert_eq!(record.instr_elements().len(), 1);
        assert_eq!(record.show_elements().len(), 1);
        assert_eq!(field_char(&tree, record.begin()), Some(FieldChar::Begin));
        assert_eq!(field_char(&tree, record.end()), Some(FieldChar::End));
        assert_eq!(
            instruction_text(&tree, record.instr_elements()),
            r#" INCLUDEPICTURE "a.png" "#
        );
        assert_eq!(tree.text(record.show_elements()[0]), "old");
    }

    #[test]
    fn test_field_without_separator() {
        let body = format!("<w:p>{}{}{}{}</w:p>", begin(), instr("PAGE"), instr(" \\* Arabic"), end());
        let (tree, records) = scan(&body);
        let record = &records.unwrap()[0];
        assert_eq!(record.instr_elements().len(), 2);
        assert!(record.show_elements().is_empty());
        assert_eq!(instruction_text(&tree, record.instr_elements()), "PAGE \\* Arabic");
    }

    #[test]
    fn test_nested_fields_in_document_order() {
        // A contains B contains C
        let body = format!(
            "<w:p>{b}{ia}{b}{ib}{b}{ic}{e}{e}{s}{t}{e}</w:p>",
            b = begin(),
            e = end(),
            s = separate(),
            t = text("shown"),
            ia = instr("IF "),
            ib = instr("IF "),
            ic = instr("MERGEFIELD x"),
        );
        let (tree, records) = scan(&body);
        let records = records.unwrap();
        assert_eq!(records.len(), 3);

        let (a, b, c) = (&records[0], &records[1], &records[2]);
        assert!(!a.is_nested() && a.contains_nested());
        assert!(b.is_nested() && b.contains_nested());
        assert!(c.is_nested() && !c.contains_nested());

        // The nested end marker stands in for B inside A's instruction
        assert_eq!(a.instr_elements().last(), Some(&b.end()));
        assert!(a.all_elements().contains(&b.end()));
        assert!(!a.all_elements().contains(&b.begin()));
        assert_eq!(instruction_text(&tree, a.instr_elements()), "IF {FIELD}");
        assert_eq!(instruction_text(&tree, b.instr_elements()), "IF {FIELD}");
        assert_eq!(instruction_text(&tree, c.instr_elements()), "MERGEFIELD x");
        assert_eq!(a.show_elements().len(), 1);
    }

    #[test]
    fn test_sibling_fields() {
        let body = format!(
            "<w:p>{}{}</w:p><w:p>{}</w:p>",
            field("PAGE", "1"),
            field("NUMPAGES", "2"),
            field("DATE", "today")
        );
        let (tree, records) = scan(&body);
        let records = records.unwrap();
        let texts: Vec<String> = records
            .iter()
            .map(|r| instruction_text(&tree, r.instr_elements()))
            .collect();
        assert_eq!(texts, ["PAGE", "NUMPAGES", "DATE"]);
        assert_ne!(records[0].parent(), records[2].parent());
    }

    #[test]
    fn test_field_spanning_paragraphs_and_tables() {
        let body = format!(
            "<w:p>{}{}</w:p><w:tbl><w:tr><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl><w:p><w:pPr/>{}{}</w:p>",
            begin(),
            instr("INCLUDEPICTURE "),
            text("in table"),
            instr("a.png"),
            end()
        );
        let (tree, records) = scan(&body);
        let record = &records.unwrap()[0];
        assert_eq!(instruction_text(&tree, record.instr_elements()), "INCLUDEPICTURE a.png");
        // Continuation starts at the first run, not at w:pPr
        assert!(record.all_elements().iter().all(|&e| tree.is_named(e, "r")));
    }

    #[test]
    fn test_unterminated_field() {
        let body = format!("<w:p>{}{}</w:p><w:p>{}</w:p>", begin(), instr(" INCLUDEPICTURE x.png"), text("tail"));
        let (_, records) = scan(&body);
        match records {
            Err(FieldError::Unterminated { instruction }) => {
                assert_eq!(instruction, " INCLUDEPICTURE x.png");
            },
            other => panic!("expected unterminated field, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_simple_field_fails() {
        let body = format!(
            r#"<w:p>{}{}<w:fldSimple w:instr="MERGEFIELD a">{}</w:fldSimple>{}</w:p>"#,
            begin(),
            instr("IF "),
            text("x"),
            end()
        );
        let (_, records) = scan(&body);
        assert!(matches!(records, Err(FieldError::NestedSimpleField)));
    }

    #[test]
    fn test_worklist_out_of_order() {
        let body = format!("<w:p>{b}{i}{b}{i}{e}{e}</w:p>", b = begin(), i = instr("IF"), e = end());
        let tree = XmlTree::parse(document(&body).as_bytes()).unwrap();
        let mut markers = begin_markers(&tree, tree.root());
        markers.reverse();
        let result = FieldScanner::with_begin_markers(&tree, markers).scan_all();
        assert!(matches!(result, Err(FieldError::WorklistOutOfOrder)));
    }

    #[test]
    fn test_no_fields() {
        let (_, records) = scan(&format!("<w:p>{}</w:p>", text("plain")));
        assert!(records.unwrap().is_empty());
    }

    #[test]
    fn test_begin_markers_and_pending() {
        let body = format!("<w:p>{}</w:p><w:p>{}</w:p>", field("A", "a"), field("B", "b"));
        let tree = XmlTree::parse(document(&body).as_bytes()).unwrap();
        let scanner = FieldScanner::new(&tree, tree.root());
        assert_eq!(scanner.pending(), 2);
        assert_eq!(scanner.scan_all().unwrap().len(), 2);
    }

    #[test]
    fn test_next_field_element() {
        let body = format!("<w:p>{}</w:p><w:p/><w:sectPr/><w:p>{}</w:p>", text("a"), text("b"));
        let tree = XmlTree::parse(document(&body).as_bytes()).unwrap();
        let runs = tree.descendants_named(tree.root(), "r");
        assert_eq!(next_field_element(&tree, runs[0]), Some(runs[1]));
        assert_eq!(next_field_element(&tree, runs[1]), None);
    }
}
