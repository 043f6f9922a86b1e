//! Word (.docx) document support.
//!
//! The main document part is loaded into an [`XmlTree`] so that complex fields
//! (`w:fldChar` begin/separate/end runs) can be discovered, classified and
//! rewritten in place.
//!
//! # Architecture
//!
//! - `Package`: the .docx package with its main part as a tree
//! - `XmlTree`: arena tree with identity handles, navigation and removal
//! - `InlinePicture`: image bytes sized for an inline `w:drawing`
//! - `Density`: resolution declared in raster image headers
//! - `field`: complex-field discovery and the INCLUDEPICTURE transformer
//!
//! # Example
//!
//! ```rust,no_run
//! use mergefields::ooxml::docx::FieldDocument;
//!
//! let mut doc = FieldDocument::open("letter.docx")?;
//! let matched = doc.discover_and_classify()?;
//! let report = doc.transform()?;
//! println!("{} of {} pictures embedded", report.embedded, matched);
//! doc.save("letter-out.docx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod density;
pub mod field;
pub mod format;
pub mod image;
pub mod package;
pub mod xml_tree;

pub use density::Density;
pub use field::{FieldDocument, TransformReport};
pub use format::ImageFormat;
pub use image::{EmbeddedImage, InlinePicture};
pub use package::Package;
pub use xml_tree::{Element, NodeId, NodeKind, XmlTree};
