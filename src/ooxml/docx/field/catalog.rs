//! Discovery and classification of all fields in a document.
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::directive::{Directive, DirectiveKind, PictureDirective, field_type};
use super::error::Result;
use super::scanner::{FieldRecord, FieldScanner, instruction_text};
use crate::ooxml::docx::xml_tree::{NodeId, XmlTree};
use tracing::debug;

/// Scan every complex field below `root`.
pub fn discover(tree: &XmlTree, root: NodeId) -> Result<Vec<FieldRecord>> {
    FieldScanner::new(tree, root).scan_all()
}

/// Picture directive of `record`, if it is a picture field that can be
/// transformed.
///
/// Other field types are skipped without a diagnostic. Nested pictures and
/// pictures whose instruction contains fields are skipped with one.
pub fn classify(tree: &XmlTree, record: &FieldRecord, diagnostics: &mut Diagnostics) -> Option<PictureDirective> {
    let instruction = instruction_text(tree, record.instr_elements());
    let field_type = field_type(&instruction)?;
    if DirectiveKind::from_field_type(&field_type) != DirectiveKind::IncludePicture {
        return None;
    }

    if record.is_nested() {
        diagnostics.push(DiagnosticKind::NestedField, "nested fields are ignored", Some(&instruction));
        return None;
    }
    if record.contains_nested() {
        diagnostics.push(
            DiagnosticKind::ContainsNestedField,
            "fields containing nested fields are ignored",
            Some(&instruction),
        );
        return None;
    }

    let directive = Directive::parse(&instruction, diagnostics)?;
    PictureDirective::from_directive(directive, diagnostics)
}

/// All fields of a document and the picture fields among them.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    records: Vec<FieldRecord>,
    /// `(index into records, directive)` in document order
    pictures: Vec<(usize, PictureDirective)>,
}

impl FieldCatalog {
    pub fn build(tree: &XmlTree, root: NodeId, diagnostics: &mut Diagnostics) -> Result<Self> {
        let records = discover(tree, root)?;
        let pictures: Vec<(usize, PictureDirective)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| classify(tree, record, diagnostics).map(|d| (i, d)))
            .collect();
        debug!(fields = records.len(), pictures = pictures.len(), "classified fields");
        Ok(Self { records, pictures })
    }

    /// Every field, in begin-marker order.
    #[inline]
    pub fn records(&self) -> &[FieldRecord] {
        &self.records
    }

    /// Picture fields with their records.
    pub fn pictures(&self) -> impl Iterator<Item = (&FieldRecord, &PictureDirective)> {
        self.pictures.iter().map(|(i, directive)| (&self.records[*i], directive))
    }

    #[inline]
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }
}
