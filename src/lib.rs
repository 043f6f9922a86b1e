//! Mergefields - complex field discovery and picture embedding for Word documents
//!
//! This library reads the main document part of a .docx package, finds every
//! complex field (`w:fldChar` begin/separate/end markers with `w:instrText`
//! instructions), and replaces `INCLUDEPICTURE` fields with the picture they
//! reference.
//!
//! # Features
//!
//! - **Field scanner**: Walks complex fields in document order, nested fields included
//! - **Instruction parsing**: Shell-like tokenizer and `\x` switch parser
//! - **Picture embedding**: Local files, `file:`, `data:` and (with the `remote`
//!   feature) HTTP(S) sources, sized by `\w` / `\h` in points
//! - **Diagnostics**: Skipped fields are reported instead of failing the document
//!
//! # Example - Transforming a document
//!
//! ```no_run
//! use mergefields::FieldDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = FieldDocument::open("report.docx")?;
//! let report = doc.transform()?;
//! println!("embedded {}, skipped {}", report.embedded, report.skipped);
//!
//! for diagnostic in doc.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! doc.save("report-out.docx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Parsing an instruction
//!
//! ```
//! use mergefields::{tokenize, Diagnostics, FlagSet};
//!
//! let tokens = tokenize(r#"INCLUDEPICTURE "logo.png" \w 120 \* MERGEFORMAT"#).unwrap();
//! assert_eq!(tokens[1], "logo.png");
//!
//! let flags = FlagSet::parse(&tokens[2..]);
//! let mut diagnostics = Diagnostics::new();
//! assert_eq!(flags.get_int('w', None, &mut diagnostics), Some(120));
//! assert!(flags.contains('*'));
//! ```

/// Shared units and conversions
pub mod common;

/// OOXML (Office Open XML) package and Word document handling
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::docx::field::{
    Diagnostic, DiagnosticKind, Diagnostics, FieldDocument, FieldError, FieldRecord,
    FieldScanner, FlagSet, TokenizeError, TransformOptions, TransformReport, tokenize,
    tokenize_lenient,
};
pub use ooxml::OoxmlError;
