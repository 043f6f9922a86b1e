//! Office Open XML (OOXML) package handling.
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships)
//! 2. **Word Layer** (`docx`): the main document part as a mutable XML tree,
//!    picture insertion, and complex field processing
//!
//! # Example: Replacing picture fields
//!
//! ```rust,no_run
//! use mergefields::ooxml::docx::FieldDocument;
//!
//! let mut doc = FieldDocument::open("letter.docx")?;
//! let report = doc.transform()?;
//! println!("{} pictures embedded", report.embedded);
//! doc.save("letter-out.docx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
