//! Open Packaging Conventions (OPC) implementation.
//!
//! The subset of OPC a Word document round-trip needs:
//!
//! - ZIP-based physical packaging, preserving member order
//! - Part names and relative reference resolution
//! - Relationship parts
//! - The content-types stream
pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use content_types::ContentTypes;
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
