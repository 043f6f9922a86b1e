//! Locating a field's paragraph and run in the live document.
use super::error::{FieldError, Result};
use crate::ooxml::docx::xml_tree::{NodeId, XmlTree};
use std::collections::HashMap;

/// Outcome of an anchor lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Found { paragraph: NodeId, run: NodeId },
    /// `what` names the part that is missing, `"paragraph"` or `"run"`
    NotFound { what: &'static str },
}

/// Paragraphs of a document body and their runs, keyed by identity.
///
/// Paragraphs inside tables are included. Only direct `w:r` children count
/// as runs of a paragraph.
#[derive(Debug, Clone, Default)]
pub struct AnchorIndex {
    /// Paragraph to how often the body listing yielded it
    paragraphs: HashMap<NodeId, usize>,
    runs: HashMap<NodeId, Vec<NodeId>>,
}

impl AnchorIndex {
    pub fn build(tree: &XmlTree, body: NodeId) -> Self {
        let mut index = Self::default();
        for paragraph in tree.descendants_named(body, "p") {
            *index.paragraphs.entry(paragraph).or_default() += 1;
            index
                .runs
                .entry(paragraph)
                .or_insert_with(|| tree.children_named(paragraph, "r").collect());
        }
        index
    }

    #[inline]
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Find `paragraph` and `run` within it. Exactly one match of each is
    /// expected; more than one is an error.
    pub fn locate(&self, paragraph: NodeId, run: NodeId) -> Result<Anchor> {
        match self.paragraphs.get(&paragraph).copied().unwrap_or(0) {
            0 => return Ok(Anchor::NotFound { what: "paragraph" }),
            1 => {},
            count => {
                return Err(FieldError::AmbiguousAnchor {
                    what: "paragraph",
                    count,
                });
            },
        }

        let runs = self.runs.get(&paragraph).map(Vec::as_slice).unwrap_or_default();
        match runs.iter().filter(|&&r| r == run).count() {
            0 => Ok(Anchor::NotFound { what: "run" }),
            1 => Ok(Anchor::Found { paragraph, run }),
            count => Err(FieldError::AmbiguousAnchor { what: "run", count }),
        }
    }
}
