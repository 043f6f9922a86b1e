//! Relationship parts (`*.rels`) of an OPC package.
//!
//! A relationship links a source part to a target part (or an external URL)
//! through an rId that the source's XML refers to, e.g. `<a:blip r:embed="rId5"/>`.

use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target_ref: String,
    is_external: bool,
}

impl Relationship {
    /// Relationship ID (e.g., "rId1").
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Relationship type URI.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target reference, relative to the source's base URI unless external.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }
}

/// Ordered collection of relationships from a single source.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Base URI of the source part, for resolving relative targets
    base_uri: String,
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty collection for a source with the given base URI.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: Vec::new(),
        }
    }

    /// Parse a `.rels` part.
    pub fn from_xml(base_uri: impl Into<String>, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::with_capacity(256);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut is_external = false;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let raw = String::from_utf8_lossy(&attr.value);
                        let value = unescape(&raw)
                            .map_err(|e| OpcError::XmlError(e.to_string()))?
                            .into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Id" => r_id = Some(value),
                            b"Type" => reltype = Some(value),
                            b"Target" => target_ref = Some(value),
                            b"TargetMode" => is_external = value == target_mode::EXTERNAL,
                            _ => {},
                        }
                    }

                    match (r_id, reltype, target_ref) {
                        (Some(r_id), Some(reltype), Some(target_ref)) => {
                            rels.rels.push(Relationship {
                                r_id,
                                reltype,
                                target_ref,
                                is_external,
                            });
                        },
                        _ => {
                            return Err(OpcError::InvalidRelationship(
                                "relationship without Id, Type or Target".to_string(),
                            ));
                        },
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Look up a relationship by rId.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.reltype == reltype)
    }

    /// Resolve an internal relationship to the part it targets.
    pub fn target_partname(&self, rel: &Relationship) -> Result<PackURI> {
        if rel.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external",
                rel.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &rel.target_ref).map_err(OpcError::InvalidPackUri)
    }

    /// Return the rId of an existing internal relationship to `target`, or add one.
    pub fn get_or_add(&mut self, reltype: &str, target: &PackURI) -> String {
        let target_ref = target.relative_ref(&self.base_uri);
        if let Some(rel) = self
            .rels
            .iter()
            .find(|rel| !rel.is_external && rel.reltype == reltype && rel.target_ref == target_ref)
        {
            return rel.r_id.clone();
        }

        let r_id = self.next_r_id();
        self.rels.push(Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target_ref,
            is_external: false,
        });
        r_id
    }

    /// Lowest `rIdN` not yet in use.
    fn next_r_id(&self) -> String {
        (1..)
            .map(|n| format!("rId{}", n))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| format!("rId{}", self.rels.len() + 1))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Serialize back to a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS);
        for rel in &self.rels {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(&rel.r_id),
                escape(&rel.reltype),
                escape(&rel.target_ref)
            );
            if rel.is_external {
                let _ = write!(xml, r#" TargetMode="{}""#, target_mode::EXTERNAL);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}
