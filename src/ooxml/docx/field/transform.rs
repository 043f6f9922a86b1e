//! Replacing `INCLUDEPICTURE` fields with the pictures they name.
//!
//! Each matched field is embedded into its first instruction run, then all
//! other elements of the field are removed. Every field is embedded before
//! any field is pruned, as anchors are located in the unpruned document.
use super::anchor::{Anchor, AnchorIndex};
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::directive::PictureDirective;
use super::error::{FieldError, Result};
use super::scanner::FieldRecord;
use crate::common::unit::pt_to_emu;
use crate::ooxml::docx::image::{EmbeddedImage, InlinePicture};
use crate::ooxml::docx::package::Package;
use crate::ooxml::docx::xml_tree::{NodeId, XmlTree};
use tracing::debug;

/// A matched picture field and what happened to it.
#[derive(Debug, Clone)]
pub struct PictureField {
    record: FieldRecord,
    directive: PictureDirective,
    /// The run kept by `prune`, set once the picture is embedded
    survivor: Option<NodeId>,
    embedded: Option<EmbeddedImage>,
}

impl PictureField {
    pub fn new(record: FieldRecord, directive: PictureDirective) -> Self {
        Self {
            record,
            directive,
            survivor: None,
            embedded: None,
        }
    }

    #[inline]
    pub fn record(&self) -> &FieldRecord {
        &self.record
    }

    #[inline]
    pub fn directive(&self) -> &PictureDirective {
        &self.directive
    }

    /// Handle of the inserted picture.
    #[inline]
    pub fn embedded(&self) -> Option<&EmbeddedImage> {
        self.embedded.as_ref()
    }

    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    #[inline]
    pub fn survivor(&self) -> Option<NodeId> {
        self.survivor
    }

    fn instruction(&self) -> &str {
        self.directive.directive().raw_instruction()
    }

    /// Put the picture in `bytes` into the field's anchor run.
    ///
    /// Returns whether the picture was embedded. A missing anchor or an image
    /// that cannot be embedded is recorded in `diagnostics` and leaves the
    /// document untouched. Only an ambiguous anchor is an error. A field that
    /// is already embedded is left alone.
    pub fn embed(
        &mut self,
        package: &mut Package,
        index: &AnchorIndex,
        bytes: Vec<u8>,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool> {
        if self.is_embedded() {
            return Ok(false);
        }
        let run = match self.locate(index)? {
            Anchor::Found { run, .. } => run,
            Anchor::NotFound { what } => {
                diagnostics.push(
                    DiagnosticKind::AnchorNotFound,
                    format!("{} not found", what),
                    Some(self.instruction()),
                );
                return Ok(false);
            },
        };

        let width = self.directive.width_pt().map(pt_to_emu);
        let height = self.directive.height_pt().map(pt_to_emu);
        let inserted = InlinePicture::from_bytes(bytes, width, height).and_then(|mut picture| {
            picture.set_description(self.directive.source());
            package.insert_picture(run, picture)
        });
        match inserted {
            Ok(embedded) => {
                debug!(r_id = %embedded.r_id(), source = self.directive.source(), "embedded picture");
                self.survivor = Some(run);
                self.embedded = Some(embedded);
                Ok(true)
            },
            Err(e) => {
                diagnostics.push(
                    DiagnosticKind::ResolutionFailed,
                    format!("cannot embed {}: {}", self.directive.source(), e),
                    Some(self.instruction()),
                );
                Ok(false)
            },
        }
    }

    /// Anchor of this field: its parent paragraph and first instruction run.
    pub fn locate(&self, index: &AnchorIndex) -> Result<Anchor> {
        match self.record.instr_elements().first() {
            Some(&run) => index.locate(self.record.parent(), run),
            None => Ok(Anchor::NotFound { what: "run" }),
        }
    }

    /// Remove every element of the field except the picture run.
    ///
    /// Returns how many elements were removed. Nothing happens for a field
    /// that was never embedded, and pruning again removes nothing.
    pub fn prune(&self, tree: &mut XmlTree) -> usize {
        let Some(survivor) = self.survivor else {
            return 0;
        };
        let mut removed = 0;
        for &element in self.record.all_elements().iter().rev() {
            if element != survivor && tree.detach(element) {
                removed += 1;
            }
        }
        removed
    }

    /// Record a failed fetch for this field.
    pub(crate) fn report_failure(&self, error: &FieldError, diagnostics: &mut Diagnostics) {
        diagnostics.push(
            DiagnosticKind::ResolutionFailed,
            error.to_string(),
            Some(self.instruction()),
        );
    }
}
