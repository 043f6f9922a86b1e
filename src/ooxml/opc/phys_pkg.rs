//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! The reader loads every member eagerly and keeps archive order.

use crate::ooxml::opc::error::{OpcError, Result};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A single archive member.
#[derive(Debug, Clone)]
pub struct PhysMember {
    /// Member name without a leading slash, e.g. `word/document.xml`
    pub name: String,
    /// Decompressed content
    pub blob: Vec<u8>,
}

/// Physical package reader.
pub struct PhysPkgReader;

impl PhysPkgReader {
    /// Read all members of the package at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Vec<PhysMember>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Read all members from in-memory package bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Vec<PhysMember>> {
        Self::from_reader(Cursor::new(data))
    }

    /// Read all members from any seekable reader, skipping directory entries.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Vec<PhysMember>> {
        let mut archive = ZipArchive::new(reader)?;
        let mut members = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut blob = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut blob)?;
            members.push(PhysMember { name, blob });
        }

        Ok(members)
    }
}

/// Physical package writer for creating OPC packages.
///
/// Media members are stored, everything else is deflated.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write one member.
    pub fn write(&mut self, name: &str, blob: &[u8]) -> Result<()> {
        let method = if name.contains("/media/") {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.archive.start_file(name, options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.archive.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_order() {
        let mut writer = PhysPkgWriter::new();
        writer.write("[Content_Types].xml", b"<Types/>").unwrap();
        writer.write("word/document.xml", b"<document/>").unwrap();
        writer.write("word/media/image1.png", b"\x89PNG").unwrap();
        let data = writer.finish().unwrap();

        let members = PhysPkgReader::from_bytes(&data).unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["[Content_Types].xml", "word/document.xml", "word/media/image1.png"]
        );
        assert_eq!(members[1].blob, b"<document/>");
        assert_eq!(members[2].blob, b"\x89PNG");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(PhysPkgReader::from_bytes(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = PhysPkgReader::open("/nonexistent/input.docx").unwrap_err();
        assert!(matches!(err, OpcError::PackageNotFound(_)));
    }
}
