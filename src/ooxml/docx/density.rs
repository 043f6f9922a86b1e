//! Resolution declared in raster image headers.
//!
//! Supported sources:
//! - PNG: the `pHYs` chunk, when its unit is the metre
//! - JPEG: the JFIF `APP0` density, or the EXIF `APP1` resolution tags
//! - BMP: `biXPelsPerMeter`/`biYPelsPerMeter` of the info header
//! - TIFF: `XResolution`/`YResolution` with `ResolutionUnit`
//!
//! Headers are walked without decoding pixel data. Anything truncated or
//! malformed counts as "no resolution".
use crate::common::unit::DEFAULT_IMAGE_DPI;
use crate::ooxml::docx::format::ImageFormat;
use zerocopy::FromBytes;
use zerocopy::byteorder::{BE, ByteOrder, LE, U16, U32};

const INCHES_PER_METRE: f64 = 39.370_078_740_157_48;
const CM_PER_INCH: f64 = 2.54;

const TIFF_X_RESOLUTION: u16 = 282;
const TIFF_Y_RESOLUTION: u16 = 283;
const TIFF_RESOLUTION_UNIT: u16 = 296;
const TIFF_TYPE_RATIONAL: u16 = 5;

/// Horizontal and vertical resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Default for Density {
    fn default() -> Self {
        Self {
            horizontal: DEFAULT_IMAGE_DPI,
            vertical: DEFAULT_IMAGE_DPI,
        }
    }
}

impl Density {
    /// Resolution declared by `data`, or 72 dpi on each axis it leaves unset.
    pub fn detect(format: ImageFormat, data: &[u8]) -> Self {
        let declared = match format {
            ImageFormat::Png => png_density(data),
            ImageFormat::Jpeg => jpeg_density(data),
            ImageFormat::Bmp => bmp_density(data),
            ImageFormat::Tiff => tiff_density(data),
            ImageFormat::Gif | ImageFormat::Emf | ImageFormat::Wmf => None,
        };
        let Some((horizontal, vertical)) = declared else {
            return Self::default();
        };
        Self {
            horizontal: to_dpi(horizontal),
            vertical: to_dpi(vertical),
        }
    }
}

fn to_dpi(value: f64) -> u32 {
    let dpi = value.round();
    if dpi.is_finite() && dpi >= 1.0 && dpi <= u32::MAX as f64 {
        dpi as u32
    } else {
        DEFAULT_IMAGE_DPI
    }
}

#[inline]
fn read_u16<O: ByteOrder>(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    U16::<O>::read_from_bytes(bytes).ok().map(|v| v.get())
}

#[inline]
fn read_u32<O: ByteOrder>(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    U32::<O>::read_from_bytes(bytes).ok().map(|v| v.get())
}

fn png_density(data: &[u8]) -> Option<(f64, f64)> {
    // Chunks start after the 8-byte signature: length, type, data, CRC
    let mut pos = 8;
    while let Some(length) = read_u32::<BE>(data, pos) {
        let kind = data.get(pos + 4..pos + 8)?;
        let body = pos + 8;
        match kind {
            b"pHYs" => {
                let x = read_u32::<BE>(data, body)?;
                let y = read_u32::<BE>(data, body + 4)?;
                // Unit 0 only gives an aspect ratio
                return match *data.get(body + 8)? {
                    1 => Some((x as f64 / INCHES_PER_METRE, y as f64 / INCHES_PER_METRE)),
                    _ => None,
                };
            },
            b"IDAT" | b"IEND" => return None,
            _ => {},
        }
        pos = body.checked_add(length as usize)?.checked_add(4)?;
    }
    None
}

fn jpeg_density(data: &[u8]) -> Option<(f64, f64)> {
    let mut pos = 2;
    while pos < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = *data.get(pos + 1)?;
        match marker {
            // Fill byte before a marker
            0xFF => {
                pos += 1;
                continue;
            },
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD8 => {
                pos += 2;
                continue;
            },
            // Start of scan or end of image: no more header segments
            0xD9 | 0xDA => return None,
            _ => {},
        }
        let length = read_u16::<BE>(data, pos + 2)? as usize;
        let segment = data.get(pos + 4..(pos + 2).checked_add(length)?)?;
        let found = match marker {
            0xE0 => jfif_density(segment),
            0xE1 => segment.strip_prefix(b"Exif\0\0").and_then(tiff_density),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
        pos += 2 + length;
    }
    None
}

fn jfif_density(segment: &[u8]) -> Option<(f64, f64)> {
    let payload = segment.strip_prefix(b"JFIF\0")?;
    // Two version bytes precede the unit
    let unit = *payload.get(2)?;
    let x = read_u16::<BE>(payload, 3)? as f64;
    let y = read_u16::<BE>(payload, 5)? as f64;
    match unit {
        1 => Some((x, y)),
        2 => Some((x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}

fn bmp_density(data: &[u8]) -> Option<(f64, f64)> {
    // BITMAPCOREHEADER (12 bytes) has no resolution fields
    if read_u32::<LE>(data, 14)? < 40 {
        return None;
    }
    let x = read_u32::<LE>(data, 38)? as i32;
    let y = read_u32::<LE>(data, 42)? as i32;
    if x <= 0 || y <= 0 {
        return None;
    }
    Some((x as f64 / INCHES_PER_METRE, y as f64 / INCHES_PER_METRE))
}

#[derive(Debug, Clone, Copy)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, data: &[u8], offset: usize) -> Option<u16> {
        match self {
            Self::Little => read_u16::<LE>(data, offset),
            Self::Big => read_u16::<BE>(data, offset),
        }
    }

    fn u32(self, data: &[u8], offset: usize) -> Option<u32> {
        match self {
            Self::Little => read_u32::<LE>(data, offset),
            Self::Big => read_u32::<BE>(data, offset),
        }
    }

    fn rational(self, data: &[u8], offset: usize) -> Option<f64> {
        let numerator = self.u32(data, offset)?;
        let denominator = self.u32(data, offset + 4)?;
        (denominator != 0).then(|| numerator as f64 / denominator as f64)
    }
}

/// Resolution from the first IFD of a TIFF structure, also used for EXIF.
fn tiff_density(data: &[u8]) -> Option<(f64, f64)> {
    let endian = match data.get(0..2)? {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        _ => return None,
    };
    if endian.u16(data, 2)? != 42 {
        return None;
    }
    let ifd = endian.u32(data, 4)? as usize;
    let count = endian.u16(data, ifd)? as usize;

    let (mut x, mut y) = (None, None);
    // Inches unless stated otherwise
    let mut unit = 2;
    for i in 0..count {
        let entry = ifd + 2 + i * 12;
        let tag = endian.u16(data, entry)?;
        let kind = endian.u16(data, entry + 2)?;
        match tag {
            TIFF_X_RESOLUTION | TIFF_Y_RESOLUTION if kind == TIFF_TYPE_RATIONAL => {
                let value = endian.rational(data, endian.u32(data, entry + 8)? as usize);
                if tag == TIFF_X_RESOLUTION {
                    x = value;
                } else {
                    y = value;
                }
            },
            TIFF_RESOLUTION_UNIT => unit = endian.u16(data, entry + 8)?,
            _ => {},
        }
    }

    let (x, y) = (x?, y.or(x)?);
    match unit {
        2 => Some((x, y)),
        3 => Some((x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}
