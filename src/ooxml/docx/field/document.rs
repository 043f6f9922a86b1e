//! A Word document prepared for field transformation.
use super::anchor::AnchorIndex;
use super::catalog::FieldCatalog;
use super::diagnostics::Diagnostics;
use super::error::Result;
use super::fetch::{PictureSource, SourceFetcher, resolve_source};
use super::options::TransformOptions;
use super::scanner::FieldRecord;
use super::transform::PictureField;
use crate::ooxml::docx::package::Package;
use serde::Serialize;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::info;

/// Outcome of [`FieldDocument::transform`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// Picture fields replaced by their picture in this pass
    pub embedded: usize,
    /// Picture fields left as they were
    pub skipped: usize,
}

/// A .docx document whose `INCLUDEPICTURE` fields can be replaced by the
/// pictures they reference.
///
/// # Examples
///
/// ```rust,no_run
/// use mergefields::FieldDocument;
///
/// let mut doc = FieldDocument::open("invoice.docx")?;
/// doc.discover_and_classify()?;
/// for field in doc.pictures() {
///     println!("picture from {}", field.directive().source());
/// }
/// let report = doc.transform()?;
/// for diagnostic in doc.diagnostics() {
///     eprintln!("{}", diagnostic);
/// }
/// println!("embedded {}, skipped {}", report.embedded, report.skipped);
/// doc.save("invoice-out.docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FieldDocument {
    package: Package,
    options: TransformOptions,
    catalog: Option<FieldCatalog>,
    pictures: Vec<PictureField>,
    diagnostics: Diagnostics,
}

impl FieldDocument {
    /// Open a document. Relative picture paths resolve against its directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let package = Package::open(path)?;
        let options = TransformOptions::default().or_base_directory(path.parent());
        Ok(Self::from_package(package, options))
    }

    /// Load a document from bytes, resolving relative picture paths against
    /// `base_directory`.
    pub fn from_bytes(data: &[u8], base_directory: Option<&Path>) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        let options = TransformOptions::default().or_base_directory(base_directory);
        Ok(Self::from_package(package, options))
    }

    /// Load a document from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R, base_directory: Option<&Path>) -> Result<Self> {
        let package = Package::from_reader(reader)?;
        let options = TransformOptions::default().or_base_directory(base_directory);
        Ok(Self::from_package(package, options))
    }

    pub fn from_package(package: Package, options: TransformOptions) -> Self {
        Self {
            package,
            options,
            catalog: None,
            pictures: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Replace the options. The base directory taken from the document path
    /// is kept unless `options` sets one.
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        let base = self.options.base_directory.take();
        self.options = options.or_base_directory(base.as_deref());
        self
    }

    #[inline]
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    #[inline]
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Scan all complex fields and pick out the picture fields.
    ///
    /// Returns the number of picture fields to transform. A document that
    /// cannot be scanned safely is an error. Calling this again rescans.
    pub fn discover_and_classify(&mut self) -> Result<usize> {
        let body = self.package.body()?;
        let catalog = FieldCatalog::build(self.package.tree(), body, &mut self.diagnostics)?;
        self.pictures = catalog
            .pictures()
            .map(|(record, directive)| PictureField::new(record.clone(), directive.clone()))
            .collect();
        info!(
            fields = catalog.records().len(),
            pictures = self.pictures.len(),
            "discovered fields"
        );
        self.catalog = Some(catalog);
        Ok(self.pictures.len())
    }

    /// Every complex field found by the last scan, in document order.
    pub fn fields(&self) -> &[FieldRecord] {
        self.catalog.as_ref().map(FieldCatalog::records).unwrap_or_default()
    }

    /// The picture fields found by the last scan.
    #[inline]
    pub fn pictures(&self) -> &[PictureField] {
        &self.pictures
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Embed every picture field, then prune the embedded fields.
    ///
    /// Scans first if [`discover_and_classify`](Self::discover_and_classify)
    /// has not run. Pictures are fetched up front, in parallel unless
    /// disabled in the options, and embedded in document order. A field
    /// whose picture cannot be fetched or embedded is left exactly as it was
    /// and reported in [`diagnostics`](Self::diagnostics).
    pub fn transform(&mut self) -> Result<TransformReport> {
        if self.catalog.is_none() {
            self.discover_and_classify()?;
        }

        let pending: Vec<usize> = (0..self.pictures.len())
            .filter(|&i| !self.pictures[i].is_embedded())
            .collect();
        let base = self.options.base_directory.as_deref();
        let sources: Vec<PictureSource> = pending
            .iter()
            .map(|&i| resolve_source(self.pictures[i].directive().source(), base))
            .collect();
        let fetched = SourceFetcher::new(&self.options).fetch_all(&sources, self.options.parallel_fetch);

        let index = AnchorIndex::build(self.package.tree(), self.package.body()?);
        let mut report = TransformReport::default();
        for (&i, bytes) in pending.iter().zip(fetched) {
            let field = &mut self.pictures[i];
            let embedded = match bytes {
                Ok(bytes) => field.embed(&mut self.package, &index, bytes, &mut self.diagnostics)?,
                Err(e) => {
                    field.report_failure(&e, &mut self.diagnostics);
                    false
                },
            };
            if embedded {
                report.embedded += 1;
            } else {
                report.skipped += 1;
            }
        }

        for field in &self.pictures {
            field.prune(self.package.tree_mut());
        }

        info!(embedded = report.embedded, skipped = report.skipped, "transformed picture fields");
        Ok(report)
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.package.to_bytes()?)
    }

    /// Write the document to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(self.package.save(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::diagnostics::DiagnosticKind;
    use super::super::error::FieldError;
    use super::super::scanner::fixtures::*;
    use super::*;
    use crate::ooxml::docx::package::build_docx;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        image::RgbImage::new(width, height)
            .save_with_format(dir.join(name), image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_transform_embeds_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 8, 8);
        let body = format!(
            "<w:p>{}</w:p><w:p>{}</w:p>",
            field(r#" INCLUDEPICTURE "a.png" "#, ""),
            field(r#" INCLUDEPICTURE "missing.png" "#, "old")
        );
        let mut doc = FieldDocument::from_bytes(&build_docx(&body), Some(dir.path())).unwrap();
        assert_eq!(doc.discover_and_classify().unwrap(), 2);
        assert_eq!(doc.fields().len(), 2);

        let report = doc.transform().unwrap();
        assert_eq!(report, TransformReport { embedded: 1, skipped: 1 });
        assert!(doc.pictures()[0].is_embedded());
        assert!(!doc.pictures()[1].is_embedded());
        assert_eq!(doc.diagnostics().of_kind(DiagnosticKind::ResolutionFailed).count(), 1);

        // The failed field keeps all five of its runs
        let tree = doc.package().tree();
        let paragraphs = tree.descendants_named(tree.root(), "p");
        assert_eq!(tree.children_named(paragraphs[0], "r").count(), 1);
        assert_eq!(tree.children_named(paragraphs[1], "r").count(), 5);
    }

    #[test]
    fn test_transform_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 4, 4);
        let body = format!("<w:p>{}</w:p>", field("INCLUDEPICTURE a.png", ""));
        let mut doc = FieldDocument::from_bytes(&build_docx(&body), Some(dir.path())).unwrap();

        assert_eq!(doc.transform().unwrap().embedded, 1);
        let once = doc.package().tree().to_xml();
        assert_eq!(doc.transform().unwrap(), TransformReport::default());
        assert_eq!(doc.package().tree().to_xml(), once);
    }

    #[test]
    fn test_structural_error_propagates() {
        let body = format!("<w:p>{}{}</w:p>", begin(), instr("INCLUDEPICTURE a.png"));
        let mut doc = FieldDocument::from_bytes(&build_docx(&body), None).unwrap();
        let err = doc.discover_and_classify().unwrap_err();
        assert!(matches!(err, FieldError::Unterminated { .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_with_options_keeps_document_directory() {
        let doc = FieldDocument::from_bytes(&build_docx(""), Some(Path::new("/docs")))
            .unwrap()
            .with_options(TransformOptions::new().with_parallel_fetch(false));
        assert_eq!(doc.options().base_directory.as_deref(), Some(Path::new("/docs")));
        assert!(!doc.options().parallel_fetch);

        let doc = doc.with_options(TransformOptions::new().with_base_directory("/images"));
        assert_eq!(doc.options().base_directory.as_deref(), Some(Path::new("/images")));
    }

    #[test]
    fn test_fields_before_scan() {
        let doc = FieldDocument::from_bytes(&build_docx(""), None).unwrap();
        assert!(doc.fields().is_empty());
        assert!(doc.pictures().is_empty());
    }
}
