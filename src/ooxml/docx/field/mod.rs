//! Complex fields and the `INCLUDEPICTURE` transformer.
//!
//! Processing runs in strict phases over one document:
//!
//! 1. **Scan** ([`scanner`]): every `w:fldChar` begin marker is collected in
//!    document order and each field is walked to its end marker, nested
//!    fields included.
//! 2. **Classify** ([`catalog`], [`directive`]): instruction text is
//!    tokenized ([`tokenize`]) and its switches parsed ([`flags`]). Only
//!    top-level `INCLUDEPICTURE` fields without nested fields are kept.
//! 3. **Embed** ([`transform`]): picture bytes are fetched ([`fetch`]) and
//!    put into the field's first instruction run.
//! 4. **Prune**: all other elements of embedded fields are removed.
//!
//! Findings that do not stop the pass are collected as [`Diagnostic`]s.
pub mod anchor;
pub mod catalog;
pub mod diagnostics;
pub mod directive;
pub mod document;
pub mod error;
pub mod fetch;
pub mod flags;
pub mod options;
pub mod scanner;
pub mod tokenize;
pub mod transform;

pub use anchor::{Anchor, AnchorIndex};
pub use catalog::{FieldCatalog, classify, discover};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use directive::{Directive, DirectiveKind, PictureDirective};
pub use document::{FieldDocument, TransformReport};
pub use error::{FieldError, Result, TokenizeError};
pub use fetch::{PictureSource, SourceFetcher, resolve_source};
pub use flags::FlagSet;
pub use options::TransformOptions;
pub use scanner::{FieldChar, FieldRecord, FieldScanner};
pub use tokenize::{tokenize, tokenize_lenient};
pub use transform::PictureField;
