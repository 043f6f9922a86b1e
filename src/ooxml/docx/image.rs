//! Inline pictures for DOCX documents.
use crate::common::unit::{px_to_emu, scaled_extent};
use crate::ooxml::docx::density::Density;
use crate::ooxml::docx::format::ImageFormat;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::PackURI;
use crate::ooxml::opc::constants::namespace;
use image::ImageReader;
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;
use std::io::Cursor;

/// An image ready to be placed inline in a run.
///
/// The extent is settled at construction, so a picture that cannot be sized
/// is rejected before anything in the package changes.
#[derive(Debug, Clone)]
pub struct InlinePicture {
    data: Vec<u8>,
    format: ImageFormat,
    /// Width in EMUs
    cx: i64,
    /// Height in EMUs
    cy: i64,
    description: String,
}

impl InlinePicture {
    /// Create a picture from encoded image bytes.
    ///
    /// `cx`/`cy` are the requested extent in EMUs. A missing side is derived
    /// from the image's intrinsic size at its declared resolution (72 dpi when
    /// it declares none), keeping its aspect ratio. Metafiles have no
    /// intrinsic size and need both sides.
    pub fn from_bytes(data: Vec<u8>, cx: Option<i64>, cy: Option<i64>) -> Result<Self> {
        let format = ImageFormat::detect_from_bytes(&data)
            .ok_or_else(|| OoxmlError::InvalidFormat("unrecognized image data".to_string()))?;

        let (cx, cy) = match (cx, cy) {
            (Some(cx), Some(cy)) => (cx, cy),
            _ if format.is_metafile() => {
                return Err(OoxmlError::Image(format!(
                    "{} pictures need both width and height",
                    format.extension()
                )));
            },
            (cx, cy) => {
                let raster = format.raster().ok_or_else(|| {
                    OoxmlError::Image(format!("no decoder for {} pictures", format.extension()))
                })?;
                let (px_w, px_h) = ImageReader::with_format(Cursor::new(&data), raster)
                    .into_dimensions()?;
                let density = Density::detect(format, &data);
                scaled_extent(
                    px_to_emu(px_w, density.horizontal),
                    px_to_emu(px_h, density.vertical),
                    cx,
                    cy,
                )
            },
        };

        Ok(Self {
            data,
            format,
            cx,
            cy,
            description: String::new(),
        })
    }

    /// Set the alt text written to `wp:docPr` and `pic:cNvPr`.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Extent in EMUs as `(cx, cy)`.
    #[inline]
    pub fn extent(&self) -> (i64, i64) {
        (self.cx, self.cy)
    }

    pub(crate) fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// `w:drawing` markup for this picture, with the namespaces it needs
    /// declared locally so it can be spliced into any run.
    pub(crate) fn to_xml(&self, r_id: &str, doc_pr_id: u32) -> String {
        let desc = escape(self.description.as_str());
        let name = format!("Picture {}", doc_pr_id);
        let mut xml = String::with_capacity(1400);
        let _ = write!(
            xml,
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="{wp}" xmlns:r="{r}"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="{name}" descr="{desc}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{a}" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="{a}"><a:graphicData uri="{pic}"><pic:pic xmlns:pic="{pic}"><pic:nvPicPr><pic:cNvPr id="0" name="{name}" descr="{desc}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{r_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
            wp = namespace::DML_WORDPROCESSING_DRAWING,
            r = namespace::OFC_RELATIONSHIPS,
            a = namespace::DML_MAIN,
            pic = namespace::DML_PICTURE,
            cx = self.cx,
            cy = self.cy,
            id = doc_pr_id,
            name = name,
            desc = desc,
            r_id = escape(r_id),
        );
        xml
    }
}

/// Handle to a picture that has been added to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub(crate) r_id: String,
    pub(crate) partname: PackURI,
    pub(crate) extent: (i64, i64),
}

impl EmbeddedImage {
    /// Relationship id the drawing refers to.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Media part holding the image bytes.
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Extent in EMUs as `(cx, cy)`.
    #[inline]
    pub fn extent(&self) -> (i64, i64) {
        self.extent
    }
}
