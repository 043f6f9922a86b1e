//! Package implementation for Word documents.
use crate::ooxml::docx::image::{EmbeddedImage, InlinePicture};
use crate::ooxml::docx::xml_tree::{NodeId, XmlTree};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{OpcPackage, PackURI};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

const MEDIA_PREFIX: &str = "/word/media/image";

/// A Word (.docx) package with its main document part loaded as a tree.
///
/// # Examples
///
/// ```rust,no_run
/// use mergefields::ooxml::docx::Package;
///
/// let pkg = Package::open("document.docx")?;
/// let body = pkg.body()?;
/// let paragraphs = pkg.tree().descendants_named(body, "p");
/// println!("{} paragraphs", paragraphs.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    opc: OpcPackage,
    main_partname: PackURI,
    tree: XmlTree,
}

impl Package {
    /// Open a .docx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Create a .docx package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_opc(OpcPackage::from_reader(reader)?)
    }

    /// Create a .docx package from in-memory bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main_partname = opc
            .main_document_partname()
            .map_err(|e| OoxmlError::PartNotFound(format!("main document part: {}", e)))?;

        // Verify it's a Word document by checking the main part's content type
        let types = opc.content_types()?;
        let content_type = types.content_type_of(&main_partname).unwrap_or("");
        if content_type != ct::WML_DOCUMENT_MAIN && content_type != ct::WML_TEMPLATE_MAIN {
            return Err(OoxmlError::InvalidContentType {
                expected: ct::WML_DOCUMENT_MAIN.to_string(),
                got: content_type.to_string(),
            });
        }

        let tree = XmlTree::parse(opc.blob(&main_partname)?)?;
        debug!(part = %main_partname, "loaded main document part");
        Ok(Self {
            opc,
            main_partname,
            tree,
        })
    }

    #[inline]
    pub fn main_partname(&self) -> &PackURI {
        &self.main_partname
    }

    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    /// The main document tree.
    #[inline]
    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    /// The `w:body` element.
    pub fn body(&self) -> Result<NodeId> {
        self.tree
            .document_element()
            .and_then(|doc| self.tree.first_child_named(doc, "body"))
            .ok_or_else(|| OoxmlError::InvalidFormat("document has no body".to_string()))
    }

    /// Replace the content of `run` with `picture`.
    ///
    /// Run properties (`w:rPr`) are kept. The image bytes become a new media
    /// part referenced from the main document part.
    pub fn insert_picture(&mut self, run: NodeId, picture: InlinePicture) -> Result<EmbeddedImage> {
        if !self.tree.is_named(run, "r") {
            return Err(OoxmlError::InvalidFormat(format!("{} is not a run", run)));
        }

        let format = picture.format();
        let partname = self.opc.next_partname(MEDIA_PREFIX, format.extension());
        let mut rels = self.opc.rels_for(&self.main_partname)?;
        let r_id = rels.get_or_add(rt::IMAGE, &partname);
        let mut types = self.opc.content_types()?;
        let drawing = picture.to_xml(&r_id, self.next_drawing_id());
        let extent = picture.extent();

        self.tree.clear_children_except(run, &["rPr"]);
        self.tree.append_fragment(run, &drawing)?;

        self.opc.set_blob(&partname, picture.into_data());
        self.opc.set_rels_for(&self.main_partname, &rels);
        if types.ensure_default(format.extension(), format.mime_type()) {
            self.opc.set_content_types(&types);
        }

        debug!(part = %partname, r_id = %r_id, "inserted picture");
        Ok(EmbeddedImage {
            r_id,
            partname,
            extent,
        })
    }

    /// Drawing object ids must be unique across the document.
    fn next_drawing_id(&self) -> u32 {
        let root = self.tree.root();
        ["docPr", "cNvPr"]
            .iter()
            .flat_map(|name| self.tree.descendants_named(root, name))
            .filter_map(|id| self.tree.attribute(id, "id")?.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Serialize the package. The main part is only rewritten when its tree changed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.tree.is_modified() {
            let xml = self.tree.to_xml();
            Ok(self.opc.to_bytes_with(&self.main_partname, xml.as_bytes())?)
        } else {
            Ok(self.opc.to_bytes()?)
        }
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Minimal `.docx` archive around a `w:body` fragment, for tests.
#[cfg(test)]
pub(crate) fn build_docx(body: &str) -> Vec<u8> {
    use crate::ooxml::opc::phys_pkg::PhysPkgWriter;

    let types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="{}"/></Types>"#,
        ct::OPC_RELATIONSHIPS,
        ct::WML_DOCUMENT_MAIN
    );
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="word/document.xml"/></Relationships>"#,
        rt::OFFICE_DOCUMENT
    );
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = PhysPkgWriter::new();
    writer.write("[Content_Types].xml", types.as_bytes()).unwrap();
    writer.write("_rels/.rels", rels.as_bytes()).unwrap();
    writer.write("word/document.xml", document.as_bytes()).unwrap();
    writer.finish().unwrap()
}
