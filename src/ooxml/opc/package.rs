//! In-memory OPC package.
//!
//! Holds every member of the archive as a blob, keyed by pack URI, and keeps
//! the original member order for writing.

use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{PhysMember, PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

/// An OPC package loaded into memory.
///
/// # Examples
///
/// ```rust,no_run
/// use mergefields::ooxml::opc::OpcPackage;
///
/// let pkg = OpcPackage::open("document.docx")?;
/// let main = pkg.main_document_partname()?;
/// println!("main part: {} ({} bytes)", main, pkg.blob(&main)?.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct OpcPackage {
    members: Vec<PhysMember>,
    /// Member name to index in `members`
    index: HashMap<String, usize>,
}

impl OpcPackage {
    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_members(PhysPkgReader::open(path)?))
    }

    /// Load a package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Ok(Self::from_members(PhysPkgReader::from_reader(reader)?))
    }

    /// Load a package from in-memory bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::from_members(PhysPkgReader::from_bytes(data)?))
    }

    fn from_members(members: Vec<PhysMember>) -> Self {
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Self { members, index }
    }

    #[inline]
    pub fn contains(&self, partname: &PackURI) -> bool {
        self.index.contains_key(partname.membername())
    }

    /// Content of a part.
    pub fn blob(&self, partname: &PackURI) -> Result<&[u8]> {
        self.index
            .get(partname.membername())
            .map(|&i| self.members[i].blob.as_slice())
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Replace the content of a part, appending it when new.
    pub fn set_blob(&mut self, partname: &PackURI, blob: Vec<u8>) {
        match self.index.get(partname.membername()) {
            Some(&i) => self.members[i].blob = blob,
            None => {
                let name = partname.membername().to_string();
                self.index.insert(name.clone(), self.members.len());
                self.members.push(PhysMember { name, blob });
            },
        }
    }

    /// Relationships of a part (or of the package for `/`); empty if it has none.
    pub fn rels_for(&self, source: &PackURI) -> Result<Relationships> {
        let rels_uri = source.rels_uri();
        match self.blob(&rels_uri) {
            Ok(xml) => Relationships::from_xml(source.base_uri(), xml),
            Err(OpcError::PartNotFound(_)) => Ok(Relationships::new(source.base_uri())),
            Err(e) => Err(e),
        }
    }

    /// Write the relationships of `source` back into the package.
    pub fn set_rels_for(&mut self, source: &PackURI, rels: &Relationships) {
        self.set_blob(&source.rels_uri(), rels.to_xml().into_bytes());
    }

    /// Parsed `[Content_Types].xml`.
    pub fn content_types(&self) -> Result<ContentTypes> {
        let uri = PackURI::from_membername(CONTENT_TYPES_URI);
        ContentTypes::from_xml(self.blob(&uri)?)
    }

    pub fn set_content_types(&mut self, types: &ContentTypes) {
        let uri = PackURI::from_membername(CONTENT_TYPES_URI);
        self.set_blob(&uri, types.to_xml().into_bytes());
    }

    /// Part name of the main document, found through the package relationships.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let package = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let rels = self.rels_for(&package)?;
        let rel = rels
            .first_of_type(rt::OFFICE_DOCUMENT)
            .ok_or_else(|| OpcError::RelationshipNotFound(rt::OFFICE_DOCUMENT.to_string()))?;
        rels.target_partname(rel)
    }

    /// First unused part name of the form `{prefix}{n}.{ext}`, counting from 1.
    ///
    /// ```
    /// # use mergefields::ooxml::opc::OpcPackage;
    /// # let pkg = OpcPackage::empty();
    /// let name = pkg.next_partname("/word/media/image", "png");
    /// assert_eq!(name.as_str(), "/word/media/image1.png");
    /// ```
    pub fn next_partname(&self, prefix: &str, ext: &str) -> PackURI {
        (1usize..)
            .map(|n| PackURI::from_membername(&format!("{}{}.{}", prefix, n, ext)))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| PackURI::from_membername(&format!("{}.{}", prefix, ext)))
    }

    /// A package without members.
    pub fn empty() -> Self {
        Self::from_members(Vec::new())
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        for member in &self.members {
            writer.write(&member.name, &member.blob)?;
        }
        writer.finish()
    }

    /// Serialize the package with the content of `partname` substituted.
    ///
    /// The stored blob is left alone, so a caller holding a parsed copy of a
    /// part can write it out without handing over ownership.
    pub fn to_bytes_with(&self, partname: &PackURI, blob: &[u8]) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        let mut written = false;
        for member in &self.members {
            if member.name == partname.membername() {
                writer.write(&member.name, blob)?;
                written = true;
            } else {
                writer.write(&member.name, &member.blob)?;
            }
        }
        if !written {
            writer.write(partname.membername(), blob)?;
        }
        writer.finish()
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
