//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        WML_NS, body
    )
}

/// A minimal Word package with the given `w:body` content.
pub fn docx(body: &str) -> Vec<u8> {
    let types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", types.to_string()),
        ("_rels/.rels", rels.to_string()),
        ("word/document.xml", document_xml(body)),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Raw bytes of one archive member.
pub fn member(archive: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut file = zip.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    Some(out)
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    image::RgbImage::new(width, height)
        .save_with_format(dir.join(name), image::ImageFormat::Png)
        .unwrap();
}

pub fn begin() -> String {
    r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#.to_string()
}

pub fn separate() -> String {
    r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#.to_string()
}

pub fn end() -> String {
    r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#.to_string()
}

pub fn instr(text: &str) -> String {
    format!(r#"<w:r><w:instrText xml:space="preserve">{}</w:instrText></w:r>"#, text)
}

pub fn text(text: &str) -> String {
    format!("<w:r><w:t>{}</w:t></w:r>", text)
}

pub fn field(instruction: &str, shown: &str) -> String {
    format!("{}{}{}{}{}", begin(), instr(instruction), separate(), text(shown), end())
}
