//! The `[Content_Types].xml` stream.
//!
//! Maps part names to content types either by extension (`Default`) or by
//! explicit part name (`Override`).

use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// `(extension, content type)`, extension lowercased
    defaults: Vec<(String, String)>,
    /// `(partname, content type)`
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::with_capacity(256);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if matches!(e.local_name().as_ref(), b"Default" | b"Override") =>
                {
                    let is_default = e.local_name().as_ref() == b"Default";
                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        let raw = String::from_utf8_lossy(&attr.value);
                        let value = unescape(&raw)
                            .map_err(|e| OpcError::XmlError(e.to_string()))?
                            .into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Extension" | b"PartName" => key = Some(value),
                            b"ContentType" => content_type = Some(value),
                            _ => {},
                        }
                    }

                    if let (Some(key), Some(content_type)) = (key, content_type) {
                        if is_default {
                            types.defaults.push((key.to_ascii_lowercase(), content_type));
                        } else {
                            types.overrides.push((key, content_type));
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type of a part, override first, then by extension.
    pub fn content_type_of(&self, partname: &PackURI) -> Option<&str> {
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(partname.as_str()))
        {
            return Some(ct);
        }
        self.default_for(partname.ext())
    }

    pub fn default_for(&self, ext: &str) -> Option<&str> {
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Register a `Default` for `ext` unless one exists. Returns whether it was added.
    pub fn ensure_default(&mut self, ext: &str, content_type: &str) -> bool {
        if self.default_for(ext).is_some() {
            return false;
        }
        self.defaults
            .push((ext.to_ascii_lowercase(), content_type.to_string()));
        true
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 128 * (self.defaults.len() + self.overrides.len()));
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES);
        for (ext, ct) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext),
                escape(ct)
            );
        }
        for (partname, ct) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(partname),
                escape(ct)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}
